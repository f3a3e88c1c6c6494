pub mod check;
pub mod departments;
pub mod exclude;
pub mod export;
pub mod init;
pub mod layout;
pub mod manager;
pub mod search;
pub mod show;
pub mod tree;

use std::path::Path;

use anyhow::{Context, Result};
use orgchart::chart::OrgChart;
use orgchart::config::Config;
use orgchart::directory::Directory;
use orgchart::store;
use orgchart::tree::{BuildOptions, BuiltTree, OrphanPolicy};

/// Fail early with a hint when the data directory has no snapshot yet.
pub fn require_initialized(dir: &Path) -> Result<()> {
    if !store::directory_path(dir).exists() {
        anyhow::bail!("Org chart not initialized. Run 'orgchart init' first.");
    }
    Ok(())
}

pub fn load_config(dir: &Path) -> Result<Config> {
    let config = Config::load(dir)?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load the snapshot with excluded people filtered out.
pub fn load_snapshot(dir: &Path) -> Result<Directory> {
    require_initialized(dir)?;
    store::load_snapshot(dir).context("Failed to load directory")
}

/// Load the full snapshot, excluded people included.
pub fn load_full_directory(dir: &Path) -> Result<Directory> {
    require_initialized(dir)?;
    let file = store::load_directory(&store::directory_path(dir))
        .context("Failed to load directory")?;
    Ok(file.into_directory(&Default::default()))
}

pub fn load_chart(dir: &Path, options: &BuildOptions, config: &Config) -> Result<OrgChart> {
    let snapshot = load_snapshot(dir)?;
    OrgChart::build(snapshot, options, config).context("Failed to build org chart")
}

/// Print non-fatal build findings to stderr.
pub fn print_build_warnings(built: &BuiltTree, policy: OrphanPolicy) {
    let orphans = built.orphan_roots();
    if policy == OrphanPolicy::Report && !orphans.is_empty() {
        eprintln!(
            "Warning: {} other people have no manager (orphan roots): {}",
            orphans.len(),
            orphans.join(", ")
        );
    }
    let unreachable = built.unreachable();
    if !unreachable.is_empty() {
        eprintln!(
            "Warning: {} people are not reachable from the root: {}",
            unreachable.len(),
            unreachable.join(", ")
        );
    }
}
