pub mod config;
pub mod errors;
pub mod geometry;
pub mod graph;
pub mod graph_io;
pub mod persistence;
pub mod store;

pub mod app_context;
pub use app_context::AppContext;

#[cfg(feature = "database")]
pub mod database;
#[cfg(feature = "database")]
pub mod services;

pub use config::LineageConfig;
pub use graph::{Edge, GraphState, Node, NodeData, NodeDataPatch, NodeKind, RelationType};
pub use store::GraphStore;
