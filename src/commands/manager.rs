use anyhow::{Context, Result};
use orgchart::edit::{ManagerChange, ManagerEditor};
use orgchart::store::{self, DirectoryFile};
use std::path::Path;

fn apply<F>(dir: &Path, json: bool, edit: F) -> Result<()>
where
    F: FnOnce(&mut ManagerEditor) -> Result<()>,
{
    let config = super::load_config(dir)?;
    let directory = super::load_full_directory(dir)?;
    let excluded = store::load_excluded(&store::excluded_path(dir))
        .context("Failed to load excluded users")?;

    let mut editor = ManagerEditor::new(directory, excluded);
    edit(&mut editor)?;
    let committed = editor.commit(&config.tree.build_options())?;

    if committed.changes.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No changes");
        }
        return Ok(());
    }

    store::save_directory(
        &DirectoryFile::from_directory(&committed.directory),
        &store::directory_path(dir),
    )
    .context("Failed to save directory")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&committed.changes)?);
        return Ok(());
    }
    for change in &committed.changes {
        match change {
            ManagerChange::Set {
                person_id,
                manager_id,
            } => println!("{} now reports to {}", person_id, manager_id),
            ManagerChange::Remove { person_id } => println!("{} no longer has a manager", person_id),
        }
    }
    super::print_build_warnings(&committed.tree, config.tree.orphan_policy);
    Ok(())
}

pub fn set(dir: &Path, id: &str, manager: &str, json: bool) -> Result<()> {
    apply(dir, json, |editor| Ok(editor.set_manager(id, manager)?))
}

pub fn remove(dir: &Path, id: &str, json: bool) -> Result<()> {
    apply(dir, json, |editor| Ok(editor.remove_manager(id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgchart::test_helpers::{directory_of, setup_orgchart};
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".orgchart");
        setup_orgchart(
            &dir,
            &directory_of(&[
                ("ceo", "Exec", None),
                ("vp", "Eng", Some("ceo")),
                ("dev", "Eng", Some("vp")),
            ]),
        );
        (tmp, dir)
    }

    #[test]
    fn test_set_manager_persists() {
        let (_tmp, dir) = setup();
        set(&dir, "dev", "ceo", false).unwrap();
        let directory = store::load_snapshot(&dir).unwrap();
        assert_eq!(directory.manager_of("dev"), Some("ceo"));
    }

    #[test]
    fn test_set_manager_rejects_cycle() {
        let (_tmp, dir) = setup();
        let err = set(&dir, "vp", "dev", false).unwrap_err();
        assert!(err.to_string().contains("cycle"));
        let directory = store::load_snapshot(&dir).unwrap();
        assert_eq!(directory.manager_of("vp"), Some("ceo"));
    }

    #[test]
    fn test_remove_manager_persists() {
        let (_tmp, dir) = setup();
        remove(&dir, "dev", true).unwrap();
        let directory = store::load_snapshot(&dir).unwrap();
        assert_eq!(directory.manager_of("dev"), None);
    }
}
