use anyhow::{Context, Result};
use orgchart::config::Config;
use orgchart::mock::MockSource;
use orgchart::store::{self, DirectoryFile};
use std::fs;
use std::path::Path;

pub fn run(dir: &Path, mock: bool) -> Result<()> {
    let directory_path = store::directory_path(dir);
    if directory_path.exists() {
        anyhow::bail!("Org chart already initialized at {}", dir.display());
    }

    fs::create_dir_all(dir).context("Failed to create data directory")?;

    let file = if mock {
        MockSource::new()?.directory_file().clone()
    } else {
        DirectoryFile::default()
    };
    store::save_directory(&file, &directory_path).context("Failed to write directory.json")?;
    Config::init(dir)?;

    if mock {
        println!(
            "Initialized org chart at {} with {} sample people",
            dir.display(),
            file.people.len()
        );
    } else {
        println!("Initialized empty org chart at {}", dir.display());
    }
    Ok(())
}
