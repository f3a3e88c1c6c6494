//! Staged manager-link and exclusion edits.
//!
//! Edits are collected against a full (unfiltered) directory, checked as they
//! are made, and turned into a set of per-person changes on commit. Nothing is
//! applied until the edited directory builds into a valid tree.

use crate::directory::{Directory, ManagerLinks, PersonId};
use crate::tree::{BuildOptions, BuiltTree, TreeError, build_tree};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Person '{0}' not found in directory")]
    UnknownPerson(PersonId),
    #[error("'{0}' cannot be their own manager")]
    SelfManager(PersonId),
    #[error("Making '{manager_id}' the manager of '{person_id}' would create a cycle")]
    WouldCreateCycle {
        person_id: PersonId,
        manager_id: PersonId,
    },
    #[error("Edited directory does not build: {0}")]
    InvalidTree(#[from] TreeError),
}

/// One persisted change, as sent to the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManagerChange {
    Set {
        person_id: PersonId,
        manager_id: PersonId,
    },
    Remove {
        person_id: PersonId,
    },
}

impl ManagerChange {
    pub fn person_id(&self) -> &str {
        match self {
            ManagerChange::Set { person_id, .. } | ManagerChange::Remove { person_id } => person_id,
        }
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct CommittedEdits {
    /// Full directory with the new links, excluded people still included
    pub directory: Directory,
    pub excluded: BTreeSet<PersonId>,
    pub changes: Vec<ManagerChange>,
    /// The tree the committed state builds into
    pub tree: BuiltTree,
}

#[derive(Debug, Clone)]
pub struct ManagerEditor {
    directory: Directory,
    pending: ManagerLinks,
    original_excluded: BTreeSet<PersonId>,
    excluded: BTreeSet<PersonId>,
}

impl ManagerEditor {
    pub fn new(directory: Directory, excluded: BTreeSet<PersonId>) -> Self {
        let pending = directory.managers().clone();
        Self {
            directory,
            pending,
            original_excluded: excluded.clone(),
            excluded,
        }
    }

    fn require(&self, id: &str) -> Result<(), EditError> {
        if self.directory.contains(id) {
            Ok(())
        } else {
            Err(EditError::UnknownPerson(id.to_string()))
        }
    }

    pub fn set_manager(&mut self, person_id: &str, manager_id: &str) -> Result<(), EditError> {
        self.require(person_id)?;
        self.require(manager_id)?;
        if person_id == manager_id {
            return Err(EditError::SelfManager(person_id.to_string()));
        }

        // Walk up from the new manager; reaching the person means a loop.
        let mut current = Some(manager_id);
        for _ in 0..=self.directory.len() {
            match current {
                Some(id) if id == person_id => {
                    return Err(EditError::WouldCreateCycle {
                        person_id: person_id.to_string(),
                        manager_id: manager_id.to_string(),
                    });
                }
                Some(id) => current = self.pending.manager_of(id),
                None => break,
            }
        }

        self.pending
            .set(person_id.to_string(), manager_id.to_string());
        Ok(())
    }

    pub fn remove_manager(&mut self, person_id: &str) -> Result<(), EditError> {
        self.require(person_id)?;
        self.pending.remove(person_id);
        Ok(())
    }

    pub fn set_excluded(&mut self, person_id: &str, excluded: bool) -> Result<(), EditError> {
        self.require(person_id)?;
        if excluded {
            self.excluded.insert(person_id.to_string());
        } else {
            self.excluded.remove(person_id);
        }
        Ok(())
    }

    /// Flip a person's exclusion. Returns whether they are now excluded.
    pub fn toggle_exclusion(&mut self, person_id: &str) -> Result<bool, EditError> {
        let now_excluded = !self.excluded.contains(person_id);
        self.set_excluded(person_id, now_excluded)?;
        Ok(now_excluded)
    }

    pub fn pending_manager_of(&self, person_id: &str) -> Option<&str> {
        self.pending.manager_of(person_id)
    }

    pub fn excluded(&self) -> &BTreeSet<PersonId> {
        &self.excluded
    }

    pub fn exclusion_changed(&self) -> bool {
        self.excluded != self.original_excluded
    }

    /// Per-person link changes relative to the starting directory, in directory order.
    pub fn changes(&self) -> Vec<ManagerChange> {
        let original = self.directory.managers();
        self.directory
            .people()
            .iter()
            .filter_map(|p| {
                let before = original.manager_of(&p.id);
                let after = self.pending.manager_of(&p.id);
                if before == after {
                    return None;
                }
                Some(match after {
                    Some(manager) => ManagerChange::Set {
                        person_id: p.id.clone(),
                        manager_id: manager.to_string(),
                    },
                    None => ManagerChange::Remove {
                        person_id: p.id.clone(),
                    },
                })
            })
            .collect()
    }

    fn edited_directory(&self) -> Directory {
        self.directory.with_managers(self.pending.clone())
    }

    /// Build the tree the edits would produce, with excluded people left out.
    pub fn validate(&self, options: &BuildOptions) -> Result<BuiltTree, EditError> {
        let excluded: HashSet<PersonId> = self.excluded.iter().cloned().collect();
        let visible = self.edited_directory().excluding(&excluded);
        Ok(build_tree(&visible, options)?)
    }

    pub fn commit(self, options: &BuildOptions) -> Result<CommittedEdits, EditError> {
        let tree = self.validate(options)?;
        let changes = self.changes();
        info!(
            changes = changes.len(),
            excluded = self.excluded.len(),
            "committing manager edits"
        );
        Ok(CommittedEdits {
            directory: self.edited_directory(),
            excluded: self.excluded,
            changes,
            tree,
        })
    }
}
