use anyhow::{Context, Result};
use orgchart::edit::ManagerEditor;
use orgchart::store;
use std::path::Path;

/// Hide a person from the chart (`exclude = true`) or bring them back.
pub fn run(dir: &Path, id: &str, exclude: bool) -> Result<()> {
    let config = super::load_config(dir)?;
    let directory = super::load_full_directory(dir)?;
    let excluded_path = store::excluded_path(dir);
    let excluded =
        store::load_excluded(&excluded_path).context("Failed to load excluded users")?;

    let mut editor = ManagerEditor::new(directory, excluded);
    editor.set_excluded(id, exclude)?;
    if !editor.exclusion_changed() {
        if exclude {
            println!("'{}' is already excluded", id);
        } else {
            println!("'{}' is not excluded", id);
        }
        return Ok(());
    }

    let committed = editor
        .commit(&config.tree.build_options())
        .with_context(|| format!("Cannot change exclusion of '{}'", id))?;
    store::save_excluded(&committed.excluded, &excluded_path)
        .context("Failed to save excluded users")?;

    if exclude {
        println!("Excluded '{}' from the chart", id);
    } else {
        println!("Included '{}' in the chart", id);
    }
    Ok(())
}
