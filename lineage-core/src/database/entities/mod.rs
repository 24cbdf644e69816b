pub mod data_sets;
pub mod edges;
pub mod eras;
pub mod nodes;
