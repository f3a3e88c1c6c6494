pub mod chart;
pub mod check;
pub mod config;
pub mod directory;
pub mod edit;
pub mod export;
pub mod layout;
pub mod mock;
pub mod query;
pub mod source;
pub mod store;
pub mod tree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;

pub use chart::{ChartError, ChartSession, OrgChart};
pub use check::{CheckResult, check_all};
pub use config::Config;
pub use directory::{Directory, ManagerLinks, Person, PersonId, RawPerson};
pub use edit::{EditError, ManagerChange, ManagerEditor};
pub use layout::{
    ChartLayout, ClusterConfig, Edge, EdgePath, LayoutConfig, LayoutError, LayoutMode,
    PositionedKind, PositionedNode, RoutingConfig, RoutingHint, compute_cluster_layout,
    compute_layout, subtree_width,
};
pub use query::{ManagerChain, OrgIndex};
pub use source::{DirectorySource, SourceError, assemble_snapshot};
pub use store::{DirectoryFile, StoreError, load_directory, save_directory};
pub use tree::{BuildOptions, BuildWarning, BuiltTree, NodeKind, OrgNode, OrphanPolicy, TreeError, build_tree};
