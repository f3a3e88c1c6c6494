//! Directory sources: where people and manager links come from before a
//! snapshot is assembled.

use crate::directory::{Directory, ManagerLinks, PersonId, RawPerson};
use crate::store::{self, DirectoryFile, StoreError};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Directory source unavailable: {0}")]
    Unavailable(String),
    #[error("Person '{0}' not found in source")]
    NotFound(PersonId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A provider of directory data, such as a remote directory service, a stored
/// snapshot or the built-in sample organization.
pub trait DirectorySource {
    /// Every person, de-duplicated, in a stable order.
    fn fetch_all_persons(&self) -> Result<Vec<RawPerson>, SourceError>;

    /// Manager of one person; `Ok(None)` for the top of the organization.
    fn fetch_manager_of(&self, person_id: &str) -> Result<Option<PersonId>, SourceError>;
}

/// Fetch everything from `source` and assemble an immutable snapshot.
///
/// Excluded people are dropped before manager lookups. A failed lookup for one
/// person degrades to "no manager" instead of failing the whole snapshot.
pub fn assemble_snapshot(
    source: &dyn DirectorySource,
    excluded: &HashSet<PersonId>,
) -> Result<Directory, SourceError> {
    let people: Vec<RawPerson> = source
        .fetch_all_persons()?
        .into_iter()
        .filter(|p| !excluded.contains(&p.id))
        .collect();

    let mut managers = ManagerLinks::new();
    let mut degraded = 0usize;
    for person in &people {
        match source.fetch_manager_of(&person.id) {
            Ok(Some(manager)) => managers.set(person.id.clone(), manager),
            Ok(None) => {}
            Err(e) => {
                degraded += 1;
                warn!(id = %person.id, error = %e, "manager lookup failed; treating as no manager");
            }
        }
    }

    debug!(
        people = people.len(),
        links = managers.len(),
        degraded,
        "assembled directory snapshot"
    );
    Ok(Directory::from_raw(people, managers))
}

/// A source backed by a stored directory file.
#[derive(Debug, Clone)]
pub struct StoreSource {
    file: DirectoryFile,
    links: ManagerLinks,
}

impl StoreSource {
    pub fn new(file: DirectoryFile) -> Self {
        let links = ManagerLinks::from_map(file.managers.clone());
        Self { file, links }
    }

    /// Read `directory.json` from a data directory.
    pub fn open(dir: &Path) -> Result<Self, SourceError> {
        let file = store::load_directory(&store::directory_path(dir))?;
        Ok(Self::new(file))
    }
}

impl DirectorySource for StoreSource {
    fn fetch_all_persons(&self) -> Result<Vec<RawPerson>, SourceError> {
        Ok(self.file.people.clone())
    }

    fn fetch_manager_of(&self, person_id: &str) -> Result<Option<PersonId>, SourceError> {
        Ok(self.links.manager_of(person_id).map(str::to_string))
    }
}
