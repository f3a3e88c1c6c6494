use anyhow::{Context, Result};
use orgchart::layout::{
    Bounds, ChartLayout, EdgePath, PositionedKind, compute_cluster_layout, compute_layout_for_mode,
};
use orgchart::tree::build_tree;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct LayoutJsonOutput<'a> {
    #[serde(flatten)]
    layout: &'a ChartLayout,
    edge_paths: Vec<EdgePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<Bounds>,
}

pub fn run(dir: &Path, cluster: bool, json: bool) -> Result<()> {
    let config = super::load_config(dir)?;
    let snapshot = super::load_snapshot(dir)?;
    let built = build_tree(&snapshot, &config.tree.build_options())
        .context("Failed to build org tree")?;

    let layout = if cluster {
        compute_cluster_layout(&built.root, &config.layout, &config.cluster)?
    } else {
        compute_layout_for_mode(&built.root, &config.layout, &config.cluster)?
    };
    let edge_paths = layout.route_edges(config.layout.vertical_spacing, &config.routing);

    if json {
        let output = LayoutJsonOutput {
            layout: &layout,
            edge_paths,
            bounds: layout.bounds(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for node in &layout.nodes {
        let label = match &node.kind {
            PositionedKind::Person { team_size } => format!("team {}", team_size),
            PositionedKind::DepartmentGroup { name, member_count } => {
                format!("dept {} ({})", name, member_count)
            }
        };
        println!(
            "{:<20} x={:>8.1} y={:>8.1}  L{}  {}",
            node.node_id, node.x, node.y, node.level, label
        );
    }
    if let Some(bounds) = layout.bounds() {
        println!(
            "\n{} nodes, {} edges, {:.0} x {:.0}",
            layout.nodes.len(),
            layout.edges.len(),
            bounds.width(),
            bounds.height()
        );
    }
    Ok(())
}
