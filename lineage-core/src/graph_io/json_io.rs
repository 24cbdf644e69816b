//! JSON import/export for node and edge arrays

use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{EdgeRecord, ExportOptions, ExportResult, NodeRecord, EDGES_FILE, NODES_FILE};
use crate::errors::{ImportExportError, ImportExportResult};
use crate::graph::{Edge, GraphState, Node};

/// Parse and validate a node array. One bad element rejects the whole document.
pub fn parse_nodes(content: &str) -> ImportExportResult<Vec<Node>> {
    let elements = parse_array(content, "nodes")?;

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        require_string(&element, index, "id")?;
        require_position(&element, index)?;
        let data = element.get("data").filter(|d| d.is_object()).ok_or_else(|| {
            ImportExportError::MissingField {
                index,
                field: "data".to_string(),
            }
        })?;
        require_string(data, index, "label").map_err(|_| ImportExportError::MissingField {
            index,
            field: "data.label".to_string(),
        })?;

        let record: NodeRecord = serde_json::from_value(element)?;
        if !seen.insert(record.id.clone()) {
            return Err(ImportExportError::DuplicateId(record.id));
        }
        nodes.push(record.into_node(index)?);
    }

    debug!("Parsed {} nodes", nodes.len());
    Ok(nodes)
}

/// Parse and validate an edge array. One bad element rejects the whole document.
pub fn parse_edges(content: &str) -> ImportExportResult<Vec<Edge>> {
    let elements = parse_array(content, "edges")?;

    let mut seen = HashSet::new();
    let mut edges = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        for field in ["id", "source", "target"] {
            require_string(&element, index, field)?;
        }

        let record: EdgeRecord = serde_json::from_value(element)?;
        if !seen.insert(record.id.clone()) {
            return Err(ImportExportError::DuplicateId(record.id));
        }
        edges.push(record.into_edge());
    }

    debug!("Parsed {} edges", edges.len());
    Ok(edges)
}

pub fn nodes_to_json(nodes: &[Node], options: &ExportOptions) -> ImportExportResult<String> {
    let records: Vec<NodeRecord> = nodes.iter().map(NodeRecord::from).collect();
    to_json(&records, options)
}

pub fn edges_to_json(edges: &[Edge], options: &ExportOptions) -> ImportExportResult<String> {
    let records: Vec<EdgeRecord> = edges.iter().map(EdgeRecord::from).collect();
    to_json(&records, options)
}

pub fn read_nodes_file(path: &Path) -> ImportExportResult<Vec<Node>> {
    debug!("Importing nodes from: {}", path.display());
    parse_nodes(&read_file(path)?)
}

pub fn read_edges_file(path: &Path) -> ImportExportResult<Vec<Edge>> {
    debug!("Importing edges from: {}", path.display());
    parse_edges(&read_file(path)?)
}

/// Read `nodes.json` and `edges.json` from `dir`. Both must parse before
/// anything is returned.
pub fn import_snapshot(dir: &Path) -> ImportExportResult<GraphState> {
    let nodes = read_nodes_file(&dir.join(NODES_FILE))?;
    let edges = read_edges_file(&dir.join(EDGES_FILE))?;
    Ok(GraphState::new(nodes, edges))
}

/// Write `nodes.json` and `edges.json` into `dir`, creating it if needed.
pub fn export_snapshot(
    state: &GraphState,
    dir: &Path,
    options: &ExportOptions,
) -> ImportExportResult<ExportResult> {
    debug!("Exporting snapshot to: {}", dir.display());

    let nodes_json = nodes_to_json(&state.nodes, options)?;
    let edges_json = edges_to_json(&state.edges, options)?;

    fs::create_dir_all(dir)?;
    let nodes_path = dir.join(NODES_FILE);
    let edges_path = dir.join(EDGES_FILE);
    fs::write(&nodes_path, nodes_json)?;
    fs::write(&edges_path, edges_json)?;

    Ok(ExportResult {
        nodes_path: nodes_path.display().to_string(),
        edges_path: edges_path.display().to_string(),
        nodes_exported: state.nodes.len(),
        edges_exported: state.edges.len(),
    })
}

fn to_json<T: serde::Serialize>(value: &T, options: &ExportOptions) -> ImportExportResult<String> {
    let json = if options.prettify {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn read_file(path: &Path) -> ImportExportResult<String> {
    if !path.exists() {
        return Err(ImportExportError::FileNotFound(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

fn parse_array(content: &str, what: &str) -> ImportExportResult<Vec<Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(elements) => {
            if let Some(index) = elements.iter().position(|e| !e.is_object()) {
                return Err(ImportExportError::InvalidFormat(format!(
                    "{} element {} is not an object",
                    what, index
                )));
            }
            Ok(elements)
        }
        _ => Err(ImportExportError::InvalidFormat(format!(
            "expected a JSON array of {}",
            what
        ))),
    }
}

fn require_string(value: &Value, index: usize, field: &str) -> ImportExportResult<()> {
    match value.get(field) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(ImportExportError::MissingField {
            index,
            field: field.to_string(),
        }),
    }
}

fn require_position(value: &Value, index: usize) -> ImportExportResult<()> {
    let ok = value
        .get("position")
        .map(|p| p.get("x").is_some_and(Value::is_number) && p.get("y").is_some_and(Value::is_number))
        .unwrap_or(false);

    if ok {
        Ok(())
    } else {
        Err(ImportExportError::MissingField {
            index,
            field: "position".to_string(),
        })
    }
}
