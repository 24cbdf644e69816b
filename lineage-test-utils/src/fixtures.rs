use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lineage::graph::GraphState;
use lineage::graph_io::{parse_edges, parse_nodes};

pub fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("resources")
        .join("test-fixtures")
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Directory holding a `nodes.json`/`edges.json` pair.
pub fn fixture_path_dir(name: &str) -> PathBuf {
    fixtures_root().join(name)
}

pub fn load_fixture(relative_path: &str) -> io::Result<String> {
    fs::read_to_string(fixture_path(relative_path))
}

/// Parse `<name>/nodes.json` and `<name>/edges.json` from the fixtures directory.
pub fn load_fixture_state(name: &str) -> io::Result<GraphState> {
    let invalid = |e| io::Error::new(io::ErrorKind::InvalidData, e);

    let nodes = parse_nodes(&load_fixture(&format!("{}/nodes.json", name))?).map_err(invalid)?;
    let edges = parse_edges(&load_fixture(&format!("{}/edges.json", name))?).map_err(invalid)?;
    Ok(GraphState::new(nodes, edges))
}
