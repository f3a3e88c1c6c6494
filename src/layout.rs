//! Layout engine for the org tree.
//!
//! Two layouts are produced from the same `OrgNode` tree:
//!
//! - **Hybrid** (primary chart): classic top-down tree, except that a node whose
//!   children are all leaves lays them out as a grid of at most
//!   `max_leaf_nodes_per_row` columns. Horizontal space is reserved per
//!   subtree via [`subtree_width`].
//! - **Cluster** (secondary tree view): dendrogram-style placement with leaves
//!   aligned at the bottom, followed by a per-depth collision repair that
//!   pushes too-close neighbours apart without reordering them.
//!
//! Node positions are top-left corners; edge handles sit at the bottom center
//! of the source card and the top center of the target card. All iteration
//! follows child order, so the output is deterministic.

use crate::tree::OrgNode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),
}

/// Which layout the chart renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Hybrid,
    Cluster,
}

// ── Configuration ───────────────────────────────────────────────────────

/// Spacing and card geometry for the hybrid layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub mode: LayoutMode,

    /// Horizontal distance between grid columns, and the width of one subtree unit
    #[serde(default = "default_horizontal_spacing")]
    pub horizontal_spacing: f64,

    /// Vertical distance between levels and between grid rows
    #[serde(default = "default_vertical_spacing")]
    pub vertical_spacing: f64,

    /// Maximum columns when all children of a node are leaves
    #[serde(default = "default_max_leaf_nodes_per_row")]
    pub max_leaf_nodes_per_row: usize,

    #[serde(default = "default_node_width")]
    pub node_width: f64,

    #[serde(default = "default_node_height")]
    pub node_height: f64,

    /// Top of the root card
    #[serde(default = "default_origin_y")]
    pub origin_y: f64,

    /// The root is never placed left of this x, even for narrow trees
    #[serde(default = "default_min_root_x")]
    pub min_root_x: f64,
}

fn default_horizontal_spacing() -> f64 {
    240.0
}

fn default_vertical_spacing() -> f64 {
    200.0
}

fn default_max_leaf_nodes_per_row() -> usize {
    2
}

fn default_node_width() -> f64 {
    200.0
}

fn default_node_height() -> f64 {
    120.0
}

fn default_origin_y() -> f64 {
    50.0
}

fn default_min_root_x() -> f64 {
    500.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            horizontal_spacing: default_horizontal_spacing(),
            vertical_spacing: default_vertical_spacing(),
            max_leaf_nodes_per_row: default_max_leaf_nodes_per_row(),
            node_width: default_node_width(),
            node_height: default_node_height(),
            origin_y: default_origin_y(),
            min_root_x: default_min_root_x(),
        }
    }
}

fn check_dimension(name: &str, value: f64) -> Result<(), LayoutError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LayoutError::InvalidConfig(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        check_dimension("horizontal_spacing", self.horizontal_spacing)?;
        check_dimension("vertical_spacing", self.vertical_spacing)?;
        check_dimension("node_width", self.node_width)?;
        check_dimension("node_height", self.node_height)?;
        if !self.origin_y.is_finite() || !self.min_root_x.is_finite() {
            return Err(LayoutError::InvalidConfig(
                "origin_y and min_root_x must be finite".to_string(),
            ));
        }
        if self.max_leaf_nodes_per_row == 0 {
            return Err(LayoutError::InvalidConfig(
                "max_leaf_nodes_per_row must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Elbow routing constants for grid rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Height of a card including padding and margin
    pub card_height: f64,
    /// Gap kept between the first grid row and the routed elbow
    pub clearance: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            card_height: 120.0,
            clearance: 60.0,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        check_dimension("card_height", self.card_height)?;
        check_dimension("clearance", self.clearance)
    }
}

/// Canvas and spacing settings for the cluster layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    /// Minimum same-depth distance, as a multiple of the node width
    pub min_spacing_factor: f64,
    pub sibling_separation: f64,
    pub cousin_separation: f64,
    pub max_repair_sweeps: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            width: 4400.0,
            height: 2380.0,
            margin_left: 300.0,
            margin_top: 60.0,
            min_spacing_factor: 1.2,
            sibling_separation: 4.0,
            cousin_separation: 5.0,
            max_repair_sweeps: 10_000,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        check_dimension("cluster.width", self.width)?;
        check_dimension("cluster.height", self.height)?;
        check_dimension("cluster.min_spacing_factor", self.min_spacing_factor)?;
        if !(self.sibling_separation > 0.0 && self.cousin_separation > 0.0) {
            return Err(LayoutError::InvalidConfig(
                "cluster separations must be positive".to_string(),
            ));
        }
        if !self.margin_left.is_finite() || !self.margin_top.is_finite() {
            return Err(LayoutError::InvalidConfig(
                "cluster margins must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Output types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionedKind {
    Person {
        /// Real people anywhere below this person
        team_size: usize,
    },
    DepartmentGroup {
        name: String,
        member_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    /// Person id, or `dept-<anchor id>` for department groups
    pub node_id: String,
    pub kind: PositionedKind,
    pub level: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PositionedNode {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct RoutingHint {
    pub is_grid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
}

impl RoutingHint {
    pub fn tree() -> Self {
        Self::default()
    }

    pub fn grid(row_index: usize, total_rows: usize) -> Self {
        Self {
            is_grid: true,
            row_index: Some(row_index),
            total_rows: Some(total_rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// `<source>-<target>`
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub routing_hint: RoutingHint,
}

impl Edge {
    fn new(source_id: &str, target_id: String, routing_hint: RoutingHint) -> Self {
        Self {
            id: format!("{}-{}", source_id, target_id),
            source_id: source_id.to_string(),
            target_id,
            routing_hint,
        }
    }
}

/// Orthogonal elbow: source handle → (sx, mid_y) → (tx, mid_y) → target handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    pub edge_id: String,
    pub points: [(f64, f64); 4],
    pub mid_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Positioned nodes and edges, in emission order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

impl ChartLayout {
    pub fn node(&self, node_id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    pub fn edge(&self, source_id: &str, target_id: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source_id == source_id && e.target_id == target_id)
    }

    /// Bounding box of all cards, `None` for an empty layout.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x + first.width,
            max_y: first.bottom(),
        };
        for node in &self.nodes[1..] {
            bounds.min_x = bounds.min_x.min(node.x);
            bounds.min_y = bounds.min_y.min(node.y);
            bounds.max_x = bounds.max_x.max(node.x + node.width);
            bounds.max_y = bounds.max_y.max(node.bottom());
        }
        Some(bounds)
    }

    /// Elbow geometry for every edge whose endpoints are both positioned.
    pub fn route_edges(&self, vertical_spacing: f64, routing: &RoutingConfig) -> Vec<EdgePath> {
        let by_id: HashMap<&str, &PositionedNode> =
            self.nodes.iter().map(|n| (n.node_id.as_str(), n)).collect();
        self.edges
            .iter()
            .filter_map(|edge| {
                let source = by_id.get(edge.source_id.as_str())?;
                let target = by_id.get(edge.target_id.as_str())?;
                Some(route_edge(edge, source, target, vertical_spacing, routing))
            })
            .collect()
    }
}

// ── Hybrid layout ───────────────────────────────────────────────────────

fn all_children_are_leaves(node: &OrgNode) -> bool {
    node.children.iter().all(OrgNode::is_leaf)
}

/// Horizontal space reserved for a subtree, in units of `horizontal_spacing`.
///
/// Leaf groups are laid out as a grid, so their width is capped by the row
/// capacity rather than their count.
pub fn subtree_width(node: &OrgNode, max_leaf_nodes_per_row: usize) -> usize {
    if node.is_leaf() {
        return 1;
    }
    if all_children_are_leaves(node) {
        return node.children.len().min(max_leaf_nodes_per_row);
    }
    node.children
        .iter()
        .map(|child| subtree_width(child, max_leaf_nodes_per_row))
        .sum::<usize>()
        .max(1)
}

fn positioned(node: &OrgNode, x: f64, y: f64, width: f64, height: f64) -> PositionedNode {
    let kind = match node.department_name() {
        Some(name) => PositionedKind::DepartmentGroup {
            name: name.to_string(),
            member_count: node.total_members().unwrap_or(node.children.len()),
        },
        None => PositionedKind::Person {
            team_size: node.real_descendant_count(),
        },
    };
    PositionedNode {
        node_id: node.visual_id(),
        kind,
        level: node.level,
        x,
        y,
        width,
        height,
    }
}

/// Compute the hybrid tree/grid layout.
pub fn compute_layout(root: &OrgNode, config: &LayoutConfig) -> Result<ChartLayout, LayoutError> {
    config.validate()?;

    let total_width = subtree_width(root, config.max_leaf_nodes_per_row) as f64
        * config.horizontal_spacing;
    let start_x = (total_width / 2.0).max(config.min_root_x);

    let mut layout = ChartLayout::default();
    place(root, start_x, config.origin_y, config, &mut layout);
    debug!(
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        total_width,
        "computed hybrid layout"
    );
    Ok(layout)
}

fn place(node: &OrgNode, x: f64, y: f64, config: &LayoutConfig, out: &mut ChartLayout) {
    out.nodes
        .push(positioned(node, x, y, config.node_width, config.node_height));
    if node.is_leaf() {
        return;
    }

    let source_id = node.visual_id();
    let hs = config.horizontal_spacing;
    let child_y = y + config.vertical_spacing;

    if all_children_are_leaves(node) {
        let per_row = node.children.len().min(config.max_leaf_nodes_per_row);
        let total_rows = node.children.len().div_ceil(per_row);

        for (row, chunk) in node.children.chunks(per_row).enumerate() {
            let row_y = child_y + row as f64 * config.vertical_spacing;
            let row_width = (chunk.len() - 1) as f64 * hs;
            let start_x = x - row_width / 2.0;

            for (col, child) in chunk.iter().enumerate() {
                out.edges.push(Edge::new(
                    &source_id,
                    child.visual_id(),
                    RoutingHint::grid(row, total_rows),
                ));
                place(child, start_x + col as f64 * hs, row_y, config, out);
            }
        }
    } else {
        let widths: Vec<f64> = node
            .children
            .iter()
            .map(|c| subtree_width(c, config.max_leaf_nodes_per_row) as f64 * hs)
            .collect();
        let total_width: f64 = widths.iter().sum();
        let mut current_x = x - total_width / 2.0;

        for (child, width) in node.children.iter().zip(widths) {
            out.edges
                .push(Edge::new(&source_id, child.visual_id(), RoutingHint::tree()));
            place(child, current_x + width / 2.0, child_y, config, out);
            current_x += width;
        }
    }
}

// ── Edge routing ────────────────────────────────────────────────────────

/// Y of the horizontal elbow segment.
///
/// Edges into the second and later grid rows bend below the first row's cards
/// instead of halfway, so they do not cut through them.
pub fn elbow_mid_y(
    source_y: f64,
    target_y: f64,
    hint: &RoutingHint,
    vertical_spacing: f64,
    routing: &RoutingConfig,
) -> f64 {
    match hint.row_index {
        Some(row) if hint.is_grid && row > 0 => {
            let first_row_y = target_y - row as f64 * vertical_spacing;
            first_row_y + routing.card_height + routing.clearance
        }
        _ => (source_y + target_y) / 2.0,
    }
}

pub fn route_edge(
    edge: &Edge,
    source: &PositionedNode,
    target: &PositionedNode,
    vertical_spacing: f64,
    routing: &RoutingConfig,
) -> EdgePath {
    let (sx, sy) = (source.center_x(), source.bottom());
    let (tx, ty) = (target.center_x(), target.y);
    let mid_y = elbow_mid_y(sy, ty, &edge.routing_hint, vertical_spacing, routing);
    EdgePath {
        edge_id: edge.id.clone(),
        points: [(sx, sy), (sx, mid_y), (tx, mid_y), (tx, ty)],
        mid_y,
    }
}

// ── Cluster layout ──────────────────────────────────────────────────────

struct ClusterSlot<'a> {
    node: &'a OrgNode,
    parent: Option<usize>,
    depth: usize,
    children: Vec<usize>,
    x: f64,
    /// Height above the deepest leaf, before scaling
    height: f64,
}

/// Flatten breadth-first; within one depth, slots are left to right.
fn flatten_breadth_first(root: &OrgNode) -> Vec<ClusterSlot<'_>> {
    let mut slots = vec![ClusterSlot {
        node: root,
        parent: None,
        depth: 0,
        children: Vec::new(),
        x: 0.0,
        height: 0.0,
    }];
    let mut queue = VecDeque::from([0usize]);
    while let Some(i) = queue.pop_front() {
        let node = slots[i].node;
        let depth = slots[i].depth;
        for child in &node.children {
            let idx = slots.len();
            slots.push(ClusterSlot {
                node: child,
                parent: Some(i),
                depth: depth + 1,
                children: Vec::new(),
                x: 0.0,
                height: 0.0,
            });
            slots[i].children.push(idx);
            queue.push_back(idx);
        }
    }
    slots
}

fn separation(slots: &[ClusterSlot<'_>], a: usize, b: usize, config: &ClusterConfig) -> f64 {
    if slots[a].parent == slots[b].parent {
        config.sibling_separation
    } else {
        config.cousin_separation
    }
}

/// Post-order pass: leaves take consecutive slots, parents sit at the mean of
/// their children and one unit above the tallest child.
fn assign_cluster_units(
    slots: &mut [ClusterSlot<'_>],
    idx: usize,
    previous_leaf: &mut Option<usize>,
    config: &ClusterConfig,
) {
    let children = slots[idx].children.clone();
    for &child in &children {
        assign_cluster_units(slots, child, previous_leaf, config);
    }
    if children.is_empty() {
        slots[idx].x = match *previous_leaf {
            Some(prev) => slots[prev].x + separation(slots, idx, prev, config),
            None => 0.0,
        };
        slots[idx].height = 0.0;
        *previous_leaf = Some(idx);
    } else {
        let sum: f64 = children.iter().map(|&c| slots[c].x).sum();
        slots[idx].x = sum / children.len() as f64;
        slots[idx].height = 1.0
            + children
                .iter()
                .map(|&c| slots[c].height)
                .fold(0.0, f64::max);
    }
}

/// Push same-depth neighbours apart until every pair is at least `min_spacing`
/// apart. Each violating pair moves by half the deficit each way; left-to-right
/// order within a depth never changes. Returns the number of sweeps used.
fn repair_collisions(
    xs: &mut [f64],
    rows: &[Vec<usize>],
    min_spacing: f64,
    max_sweeps: usize,
) -> usize {
    const EPSILON: f64 = 1e-6;
    let mut sweeps = 0;
    while sweeps < max_sweeps {
        let mut changed = false;
        for row in rows {
            for pair in row.windows(2) {
                let (left, right) = (pair[0], pair[1]);
                let distance = xs[right] - xs[left];
                if distance < min_spacing - EPSILON {
                    let push = (min_spacing - distance) / 2.0;
                    xs[left] -= push;
                    xs[right] += push;
                    changed = true;
                }
            }
        }
        sweeps += 1;
        if !changed {
            return sweeps;
        }
    }
    warn!(
        max_sweeps,
        "cluster collision repair hit the sweep limit; some nodes may still overlap"
    );
    sweeps
}

/// Compute the cluster layout with per-depth collision repair.
pub fn compute_cluster_layout(
    root: &OrgNode,
    config: &LayoutConfig,
    cluster: &ClusterConfig,
) -> Result<ChartLayout, LayoutError> {
    config.validate()?;
    cluster.validate()?;

    let mut slots = flatten_breadth_first(root);
    let mut previous_leaf = None;
    assign_cluster_units(&mut slots, 0, &mut previous_leaf, cluster);

    // Normalize unit coordinates onto the canvas.
    let leaves: Vec<usize> = (0..slots.len())
        .filter(|&i| slots[i].children.is_empty())
        .collect();
    let leftmost = leaves
        .iter()
        .copied()
        .min_by(|&a, &b| slots[a].x.total_cmp(&slots[b].x))
        .unwrap_or(0);
    let rightmost = leaves
        .iter()
        .copied()
        .max_by(|&a, &b| slots[a].x.total_cmp(&slots[b].x))
        .unwrap_or(0);
    let x0 = slots[leftmost].x - separation(&slots, leftmost, rightmost, cluster) / 2.0;
    let x1 = slots[rightmost].x + separation(&slots, rightmost, leftmost, cluster) / 2.0;
    let root_height = slots[0].height;

    let mut xs: Vec<f64> = slots
        .iter()
        .map(|s| (s.x - x0) / (x1 - x0) * cluster.width)
        .collect();
    let ys: Vec<f64> = slots
        .iter()
        .map(|s| {
            let fraction = if root_height > 0.0 {
                s.height / root_height
            } else {
                1.0
            };
            (1.0 - fraction) * cluster.height
        })
        .collect();

    let max_depth = slots.iter().map(|s| s.depth).max().unwrap_or(0);
    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); max_depth + 1];
    for (i, slot) in slots.iter().enumerate() {
        rows[slot.depth].push(i);
    }
    let min_spacing = config.node_width * cluster.min_spacing_factor;
    let sweeps = repair_collisions(&mut xs, &rows, min_spacing, cluster.max_repair_sweeps);
    debug!(nodes = slots.len(), sweeps, "computed cluster layout");

    let mut layout = ChartLayout::default();
    for (i, slot) in slots.iter().enumerate() {
        layout.nodes.push(positioned(
            slot.node,
            cluster.margin_left + xs[i] - config.node_width / 2.0,
            cluster.margin_top + ys[i] - config.node_height / 2.0,
            config.node_width,
            config.node_height,
        ));
        if let Some(parent) = slot.parent {
            let source_id = slots[parent].node.visual_id();
            layout
                .edges
                .push(Edge::new(&source_id, slot.node.visual_id(), RoutingHint::tree()));
        }
    }
    Ok(layout)
}

/// Layout in the configured mode.
pub fn compute_layout_for_mode(
    root: &OrgNode,
    config: &LayoutConfig,
    cluster: &ClusterConfig,
) -> Result<ChartLayout, LayoutError> {
    match config.mode {
        LayoutMode::Hybrid => compute_layout(root, config),
        LayoutMode::Cluster => compute_cluster_layout(root, config, cluster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{directory_of, manager_with_leaves};
    use crate::tree::{BuildOptions, build_tree};

    fn tree_of(dir: &crate::directory::Directory) -> OrgNode {
        build_tree(dir, &BuildOptions::default()).unwrap().root
    }

    #[test]
    fn test_leaf_width_is_one() {
        let root = tree_of(&manager_with_leaves(0));
        assert_eq!(subtree_width(&root, 2), 1);
    }

    #[test]
    fn test_leaf_grid_width_is_capped_by_row_capacity() {
        let root = tree_of(&manager_with_leaves(5));
        assert_eq!(subtree_width(&root, 2), 2);
        assert_eq!(subtree_width(&root, 3), 3);
        assert_eq!(subtree_width(&tree_of(&manager_with_leaves(1)), 2), 1);
    }

    #[test]
    fn test_mixed_children_sum_widths() {
        // ceo -> [a -> (a1, a2, a3), b]
        let dir = directory_of(&[
            ("ceo", "X", None),
            ("a", "X", Some("ceo")),
            ("b", "X", Some("ceo")),
            ("a1", "X", Some("a")),
            ("a2", "X", Some("a")),
            ("a3", "X", Some("a")),
        ]);
        let root = tree_of(&dir);
        assert_eq!(subtree_width(&root, 2), 3);
    }

    #[test]
    fn test_grid_rows_centered_under_parent() {
        let root = tree_of(&manager_with_leaves(5));
        let layout = compute_layout(&root, &LayoutConfig::default()).unwrap();

        let m = layout.node("m").unwrap();
        assert_eq!((m.x, m.y), (500.0, 50.0));

        let row_of = |id: &str| layout.node(id).unwrap().y;
        assert_eq!(row_of("r1"), 250.0);
        assert_eq!(row_of("r3"), 450.0);
        assert_eq!(row_of("r5"), 650.0);

        assert_eq!(layout.node("r1").unwrap().x, 380.0);
        assert_eq!(layout.node("r2").unwrap().x, 620.0);
        // Last row holds one card, directly under the manager.
        assert_eq!(layout.node("r5").unwrap().x, 500.0);

        let hint = &layout.edge("m", "r5").unwrap().routing_hint;
        assert_eq!(hint, &RoutingHint::grid(2, 3));
    }

    #[test]
    fn test_tree_children_get_slots_by_subtree_width() {
        let dir = directory_of(&[
            ("ceo", "X", None),
            ("a", "X", Some("ceo")),
            ("b", "X", Some("ceo")),
            ("a1", "X", Some("a")),
            ("a2", "X", Some("a")),
        ]);
        let root = tree_of(&dir);
        let layout = compute_layout(&root, &LayoutConfig::default()).unwrap();

        // Total width 3 units = 720; root clamps to min_root_x.
        let ceo = layout.node("ceo").unwrap();
        assert_eq!(ceo.x, 500.0);
        // a spans 2 units starting at 500 - 360 = 140; b takes the last unit.
        assert_eq!(layout.node("a").unwrap().x, 380.0);
        assert_eq!(layout.node("b").unwrap().x, 740.0);
        assert_eq!(layout.node("a").unwrap().y, 250.0);
        assert!(!layout.edge("ceo", "a").unwrap().routing_hint.is_grid);
    }

    #[test]
    fn test_department_nodes_use_prefixed_ids() {
        let dir = directory_of(&[
            ("m", "Exec", None),
            ("s1", "Sales", Some("m")),
            ("e1", "Eng", Some("m")),
        ]);
        let layout = compute_layout(&tree_of(&dir), &LayoutConfig::default()).unwrap();
        let dept = layout.node("dept-s1").unwrap();
        assert_eq!(
            dept.kind,
            PositionedKind::DepartmentGroup {
                name: "Sales".to_string(),
                member_count: 1
            }
        );
        assert!(layout.edge("m", "dept-s1").is_some());
        let edge = layout.edge("dept-s1", "s1").unwrap();
        assert_eq!(edge.id, "dept-s1-s1");
        assert!(edge.routing_hint.is_grid);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let root = tree_of(&manager_with_leaves(2));
        let config = LayoutConfig {
            horizontal_spacing: -1.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            compute_layout(&root, &config),
            Err(LayoutError::InvalidConfig(_))
        ));
        let config = LayoutConfig {
            max_leaf_nodes_per_row: 0,
            ..LayoutConfig::default()
        };
        assert!(compute_layout(&root, &config).is_err());
        let config = LayoutConfig {
            vertical_spacing: f64::NAN,
            ..LayoutConfig::default()
        };
        assert!(compute_layout(&root, &config).is_err());
    }

    #[test]
    fn test_elbow_naive_for_first_row_and_tree_edges() {
        let routing = RoutingConfig::default();
        assert_eq!(
            elbow_mid_y(170.0, 250.0, &RoutingHint::tree(), 200.0, &routing),
            210.0
        );
        assert_eq!(
            elbow_mid_y(170.0, 250.0, &RoutingHint::grid(0, 2), 200.0, &routing),
            210.0
        );
    }

    #[test]
    fn test_elbow_routes_below_first_row() {
        let routing = RoutingConfig::default();
        // Rows at 250, 450, 650: every later row bends at 250 + 120 + 60.
        for (row, target_y) in [(1, 450.0), (2, 650.0)] {
            let mid = elbow_mid_y(170.0, target_y, &RoutingHint::grid(row, 3), 200.0, &routing);
            assert_eq!(mid, 430.0);
        }
        let custom = RoutingConfig {
            card_height: 80.0,
            clearance: 20.0,
        };
        assert_eq!(
            elbow_mid_y(170.0, 450.0, &RoutingHint::grid(1, 2), 200.0, &custom),
            350.0
        );
    }

    #[test]
    fn test_route_edges_uses_card_handles() {
        let root = tree_of(&manager_with_leaves(3));
        let config = LayoutConfig::default();
        let layout = compute_layout(&root, &config).unwrap();
        let paths = layout.route_edges(config.vertical_spacing, &RoutingConfig::default());
        assert_eq!(paths.len(), 3);

        let to_r3 = paths.iter().find(|p| p.edge_id == "m-r3").unwrap();
        // m at (500, 50), 200x120 → bottom center (600, 170); r3 at (500, 450).
        assert_eq!(to_r3.points[0], (600.0, 170.0));
        assert_eq!(to_r3.points[3], (600.0, 450.0));
        assert_eq!(to_r3.mid_y, 430.0);
    }

    #[test]
    fn test_bounds() {
        assert!(ChartLayout::default().bounds().is_none());
        let root = tree_of(&manager_with_leaves(2));
        let layout = compute_layout(&root, &LayoutConfig::default()).unwrap();
        let b = layout.bounds().unwrap();
        assert_eq!((b.min_x, b.min_y), (380.0, 50.0));
        assert_eq!((b.max_x, b.max_y), (820.0, 370.0));
    }

    #[test]
    fn test_cluster_single_node_centered() {
        let root = tree_of(&manager_with_leaves(0));
        let cluster = ClusterConfig::default();
        let layout = compute_cluster_layout(&root, &LayoutConfig::default(), &cluster).unwrap();
        let m = &layout.nodes[0];
        assert_eq!(m.center_x(), cluster.margin_left + cluster.width / 2.0);
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn test_cluster_leaves_at_bottom_and_spaced() {
        let dir = directory_of(&[
            ("ceo", "X", None),
            ("a", "X", Some("ceo")),
            ("b", "X", Some("ceo")),
            ("a1", "X", Some("a")),
        ]);
        let root = tree_of(&dir);
        let config = LayoutConfig::default();
        let cluster = ClusterConfig {
            width: 100.0,
            ..ClusterConfig::default()
        };
        let layout = compute_cluster_layout(&root, &config, &cluster).unwrap();

        // Leaves a1 and b share the bottom edge even though they sit at different depths.
        let a1 = layout.node("a1").unwrap();
        let b = layout.node("b").unwrap();
        assert_eq!(a1.y, b.y);

        // A narrow canvas forces repair: depth-1 nodes end up at least 1.2 * width apart.
        let a = layout.node("a").unwrap();
        assert!(b.center_x() - a.center_x() >= config.node_width * 1.2 - 1e-6);
        assert!(a.center_x() < b.center_x());
    }

    #[test]
    fn test_repair_preserves_order_and_reaches_minimum() {
        let mut xs = vec![0.0, 0.0, 1.0, 2.0];
        let rows = vec![vec![0, 1, 2, 3]];
        let sweeps = repair_collisions(&mut xs, &rows, 10.0, 10_000);
        assert!(sweeps < 10_000);
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= 10.0 - 1e-6);
        }
        // Symmetric pushes keep the centroid in place.
        let centroid: f64 = xs.iter().sum::<f64>() / 4.0;
        assert!((centroid - 0.75).abs() < 1e-6);
    }

    /// Every same-depth pair at once, pushed apart by distance alone.
    fn repair_all_pairs(xs: &mut [f64], min_spacing: f64) {
        for _ in 0..10_000 {
            let mut changed = false;
            for i in 0..xs.len() {
                for j in i + 1..xs.len() {
                    let distance = (xs[j] - xs[i]).abs();
                    if distance < min_spacing - 1e-6 {
                        let push = (min_spacing - distance) / 2.0;
                        let dir = if xs[i] <= xs[j] { 1.0 } else { -1.0 };
                        xs[i] -= dir * push;
                        xs[j] += dir * push;
                        changed = true;
                    }
                }
            }
            if !changed {
                return;
            }
        }
    }

    #[test]
    fn test_all_pairs_repair_would_reorder_siblings() {
        let close = [0.0, 1.0, 2.0, 3.0];

        let mut all_pairs = close.to_vec();
        repair_all_pairs(&mut all_pairs, 240.0);
        let expected = [-358.5, 361.5, -118.5, 121.5];
        for (got, want) in all_pairs.iter().zip(expected) {
            assert!((got - want).abs() < 1e-3, "{:?}", all_pairs);
        }
        // The second node jumped past the third and fourth.
        assert!(all_pairs[1] > all_pairs[3]);

        let mut adjacent = close.to_vec();
        repair_collisions(&mut adjacent, &[vec![0, 1, 2, 3]], 240.0, 10_000);
        let expected = [-358.5, -118.5, 121.5, 361.5];
        for (got, want) in adjacent.iter().zip(expected) {
            assert!((got - want).abs() < 1e-3, "{:?}", adjacent);
        }
    }

    #[test]
    fn test_layout_mode_dispatch() {
        let root = tree_of(&manager_with_leaves(3));
        let cluster = ClusterConfig::default();
        let hybrid = compute_layout_for_mode(&root, &LayoutConfig::default(), &cluster).unwrap();
        assert!(hybrid.edges.iter().any(|e| e.routing_hint.is_grid));
        let config = LayoutConfig {
            mode: LayoutMode::Cluster,
            ..LayoutConfig::default()
        };
        let clustered = compute_layout_for_mode(&root, &config, &cluster).unwrap();
        assert!(clustered.edges.iter().all(|e| !e.routing_hint.is_grid));
        assert_eq!(clustered.nodes.len(), 4);
    }
}
