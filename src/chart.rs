//! A built chart (snapshot, tree and layout together) and the session that
//! keeps the last good chart across failed rebuilds.

use crate::config::Config;
use crate::directory::Directory;
use crate::layout::{ChartLayout, EdgePath, LayoutError, compute_layout_for_mode};
use crate::query::OrgIndex;
use crate::tree::{BuildOptions, BuiltTree, TreeError, build_tree};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Clone)]
pub struct OrgChart {
    pub directory: Directory,
    pub tree: BuiltTree,
    pub layout: ChartLayout,
}

impl OrgChart {
    /// Build tree and layout from scratch.
    pub fn build(
        directory: Directory,
        options: &BuildOptions,
        config: &Config,
    ) -> Result<Self, ChartError> {
        let tree = build_tree(&directory, options)?;
        let layout = compute_layout_for_mode(&tree.root, &config.layout, &config.cluster)?;
        Ok(OrgChart {
            directory,
            tree,
            layout,
        })
    }

    pub fn index(&self) -> OrgIndex<'_> {
        OrgIndex::new(&self.directory, Some(&self.tree.root))
    }

    pub fn edge_paths(&self, config: &Config) -> Vec<EdgePath> {
        self.layout
            .route_edges(config.layout.vertical_spacing, &config.routing)
    }
}

/// Owns the current chart. Every rebuild starts from a fresh snapshot; a failed
/// rebuild leaves the previous chart in place.
#[derive(Debug)]
pub struct ChartSession {
    config: Config,
    options: BuildOptions,
    current: Option<OrgChart>,
    last_error: Option<ChartError>,
}

impl ChartSession {
    pub fn new(config: Config, options: BuildOptions) -> Self {
        Self {
            config,
            options,
            current: None,
            last_error: None,
        }
    }

    pub fn rebuild(&mut self, directory: Directory) -> Result<&OrgChart, ChartError> {
        match OrgChart::build(directory, &self.options, &self.config) {
            Ok(chart) => {
                info!(
                    people = chart.tree.root.person_count(),
                    nodes = chart.layout.nodes.len(),
                    "chart rebuilt"
                );
                self.last_error = None;
                Ok(&*self.current.insert(chart))
            }
            Err(e) => {
                warn!(error = %e, kept_previous = self.current.is_some(), "chart rebuild failed");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn chart(&self) -> Option<&OrgChart> {
        self.current.as_ref()
    }

    /// Error of the most recent rebuild, cleared by the next success.
    pub fn last_error(&self) -> Option<&ChartError> {
        self.last_error.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }
}
