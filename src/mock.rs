//! Built-in sample organization: 45 people under a CEO, used for demos and
//! local development without a directory service.

use crate::directory::{ManagerLinks, PersonId, RawPerson};
use crate::source::{DirectorySource, SourceError};
use crate::store::DirectoryFile;

const MOCK_DIRECTORY: &str = include_str!("../data/mock_directory.json");

/// Id of the sample organization's CEO.
pub const MOCK_ROOT_ID: &str = "user-001";

#[derive(Debug, Clone)]
pub struct MockSource {
    file: DirectoryFile,
    links: ManagerLinks,
}

impl MockSource {
    pub fn new() -> Result<Self, SourceError> {
        let file: DirectoryFile = serde_json::from_str(MOCK_DIRECTORY)
            .map_err(|e| SourceError::Unavailable(format!("embedded sample data: {}", e)))?;
        let links = ManagerLinks::from_map(file.managers.clone());
        Ok(Self { file, links })
    }

    /// The sample data in stored-file form, for seeding a data directory.
    pub fn directory_file(&self) -> &DirectoryFile {
        &self.file
    }
}

impl DirectorySource for MockSource {
    fn fetch_all_persons(&self) -> Result<Vec<RawPerson>, SourceError> {
        Ok(self.file.people.clone())
    }

    fn fetch_manager_of(&self, person_id: &str) -> Result<Option<PersonId>, SourceError> {
        if !self.file.people.iter().any(|p| p.id == person_id) {
            return Err(SourceError::NotFound(person_id.to_string()));
        }
        Ok(self.links.manager_of(person_id).map(str::to_string))
    }
}
