pub mod db;
pub mod fixtures;
pub mod temp;

pub use db::TestDb;
pub use fixtures::{fixture_path, fixture_path_dir, fixtures_root, load_fixture, load_fixture_state};
pub use temp::TempDir;
