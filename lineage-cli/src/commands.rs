use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};

use lineage::app_context::open_adapter;
use lineage::database::connection::open_database;
use lineage::graph::GraphState;
use lineage::graph_io::{export_snapshot, read_edges_file, read_nodes_file, ExportOptions};
use lineage::services::{GraphQueryService, ReconcileService};
use lineage::store::derived::edge_counts;
use lineage::store::validate_parent_links;
use lineage::LineageConfig;

pub async fn seed(nodes_path: &Path, edges_path: &Path, database: &str) -> Result<()> {
    info!("Start seeding {} ...", database);

    let state = read_pair(nodes_path, edges_path)?;
    let db = open_database(Some(database))
        .await
        .with_context(|| format!("Failed to open database {}", database))?;

    let summary = ReconcileService::new(db)
        .reconcile(&state.nodes, &state.edges)
        .await
        .context("Seeding failed; nothing was written")?;

    if summary.parents_skipped > 0 || summary.edges_skipped > 0 {
        warn!(
            "Skipped {} parent links and {} edges that point at missing nodes",
            summary.parents_skipped, summary.edges_skipped
        );
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("Seeding finished.");
    Ok(())
}

pub fn validate(nodes_path: &Path, edges_path: &Path, strict: bool) -> Result<()> {
    let state = read_pair(nodes_path, edges_path)?;
    validate_parent_links(&state.nodes).context("Parent links are invalid")?;

    match state.verify_graph_integrity() {
        Ok(()) => {
            println!("OK: {}", state.stats());
            Ok(())
        }
        Err(problems) => {
            for problem in &problems {
                println!("{}", problem);
            }
            if strict {
                bail!("{} integrity problems found", problems.len());
            }
            warn!(
                "{} integrity problems found; the editor tolerates these",
                problems.len()
            );
            println!("OK with warnings: {}", state.stats());
            Ok(())
        }
    }
}

pub async fn export(database: &str, out_dir: &Path, prettify: bool) -> Result<()> {
    let db = open_database(Some(database))
        .await
        .with_context(|| format!("Failed to open database {}", database))?;
    let state = GraphQueryService::new(db)
        .load_state()
        .await
        .context("Failed to read graph from database")?;

    let result = export_snapshot(&state, out_dir, &ExportOptions { prettify })
        .with_context(|| format!("Failed to export to {}", out_dir.display()))?;
    info!(
        "Exported {} nodes to {} and {} edges to {}",
        result.nodes_exported, result.nodes_path, result.edges_exported, result.edges_path
    );
    Ok(())
}

pub async fn stats(config: &LineageConfig) -> Result<()> {
    let adapter = open_adapter(&config.storage).await?;
    let state = adapter
        .load()
        .await
        .with_context(|| format!("Failed to load graph from {}", adapter.name()))?
        .unwrap_or_default();

    println!("{} ({})", state.stats(), adapter.name());

    let counts = edge_counts(&state);
    let mut busiest: Vec<(&String, &usize)> = counts.iter().filter(|(_, c)| **c > 0).collect();
    busiest.sort_by(|a, b| b.1.cmp(a.1));
    for (id, count) in busiest.into_iter().take(5) {
        let label = state
            .get_node_by_id(id)
            .map(|n| n.data.label.as_str())
            .unwrap_or_default();
        println!("  {:<24} {:>3} edges  {}", label, count, id);
    }

    if let Err(problems) = state.verify_graph_integrity() {
        for problem in problems {
            println!("  ! {}", problem);
        }
    }
    Ok(())
}

pub async fn init_database(database: &str) -> Result<()> {
    info!("Initializing database: {}", database);
    open_database(Some(database))
        .await
        .with_context(|| format!("Failed to initialize database {}", database))?;
    info!("Database ready");
    Ok(())
}

fn read_pair(nodes_path: &Path, edges_path: &Path) -> Result<GraphState> {
    let nodes = read_nodes_file(nodes_path)
        .with_context(|| format!("Invalid nodes file {}", nodes_path.display()))?;
    let edges = read_edges_file(edges_path)
        .with_context(|| format!("Invalid edges file {}", edges_path.display()))?;
    info!("Read {} nodes and {} edges", nodes.len(), edges.len());
    Ok(GraphState::new(nodes, edges))
}
