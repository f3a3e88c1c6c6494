//! On-disk persistence for the directory snapshot and the excluded-users list.
//!
//! Both files are plain JSON inside the data directory. Reads and writes take an
//! advisory lock on `orgchart.lock`; writes go through a temp file and rename.

use crate::directory::{Directory, ManagerLinks, PersonId, RawPerson};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

pub const DIRECTORY_FILE: &str = "directory.json";
pub const EXCLUDED_FILE: &str = "excluded.json";
const LOCK_FILE: &str = "orgchart.lock";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Exclusive advisory lock, released on drop.
struct FileLock {
    #[cfg(unix)]
    file: File,
}

impl FileLock {
    #[cfg(unix)]
    fn acquire(lock_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if ret != 0 {
            return Err(StoreError::Lock(format!(
                "Failed to acquire lock on {:?}: {}",
                lock_path,
                std::io::Error::last_os_error()
            )));
        }
        Ok(FileLock { file })
    }

    // No flock off unix; access is unguarded there.
    #[cfg(not(unix))]
    fn acquire(_lock_path: &Path) -> Result<Self, StoreError> {
        Ok(FileLock {})
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            // Best effort; the fd closes right after anyway.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    path.parent()
        .unwrap_or(Path::new("."))
        .join(LOCK_FILE)
}

pub fn directory_path(dir: &Path) -> PathBuf {
    dir.join(DIRECTORY_FILE)
}

pub fn excluded_path(dir: &Path) -> PathBuf {
    dir.join(EXCLUDED_FILE)
}

/// Serialized snapshot: raw people in directory order plus the manager map.
///
/// An empty manager id in `managers` means "no manager", matching what the
/// directory service returns for the top of the organization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectoryFile {
    pub people: Vec<RawPerson>,
    #[serde(default)]
    pub managers: BTreeMap<PersonId, PersonId>,
}

impl DirectoryFile {
    pub fn from_directory(directory: &Directory) -> Self {
        let mut managers = directory.managers().to_map();
        // Keep an explicit empty entry for every manager-less person.
        for person in directory.people() {
            managers.entry(person.id.clone()).or_default();
        }
        DirectoryFile {
            people: directory.people().iter().map(|p| p.to_raw()).collect(),
            managers,
        }
    }

    pub fn into_directory(self, excluded: &HashSet<PersonId>) -> Directory {
        Directory::from_raw_excluding(self.people, ManagerLinks::from_map(self.managers), excluded)
    }
}

/// The excluded-users list, in the shape the settings API uses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExcludedFile {
    #[serde(default)]
    excluded_users: Vec<PersonId>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write JSON through a temp file in the same directory, then rename over
/// `path`. A crash mid-write leaves the previous file intact.
fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("orgchart");
    let tmp_path = parent.join(format!(".{}.tmp.{}", file_name, std::process::id()));

    let result = (|| -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writeln!(file, "{}", json)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            std::fs::rename(&tmp_path, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

pub fn load_directory(path: &Path) -> Result<DirectoryFile, StoreError> {
    let _lock = FileLock::acquire(&lock_path_for(path))?;
    let file: DirectoryFile = read_json(path)?;
    debug!(path = %path.display(), people = file.people.len(), "loaded directory");
    Ok(file)
}

pub fn save_directory(file: &DirectoryFile, path: &Path) -> Result<(), StoreError> {
    let _lock = FileLock::acquire(&lock_path_for(path))?;
    write_json_atomic(file, path)?;
    debug!(path = %path.display(), people = file.people.len(), "saved directory");
    Ok(())
}

/// Load excluded ids. A missing file means nobody is excluded.
pub fn load_excluded(path: &Path) -> Result<BTreeSet<PersonId>, StoreError> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let _lock = FileLock::acquire(&lock_path_for(path))?;
    let file: ExcludedFile = read_json(path)?;
    Ok(file.excluded_users.into_iter().collect())
}

pub fn save_excluded(excluded: &BTreeSet<PersonId>, path: &Path) -> Result<(), StoreError> {
    let _lock = FileLock::acquire(&lock_path_for(path))?;
    let file = ExcludedFile {
        excluded_users: excluded.iter().cloned().collect(),
    };
    write_json_atomic(&file, path)?;
    debug!(path = %path.display(), count = excluded.len(), "saved excluded users");
    Ok(())
}

/// Load the snapshot in `dir` with excluded people already filtered out.
pub fn load_snapshot(dir: &Path) -> Result<Directory, StoreError> {
    let file = load_directory(&directory_path(dir))?;
    let excluded: HashSet<PersonId> = load_excluded(&excluded_path(dir))?.into_iter().collect();
    Ok(file.into_directory(&excluded))
}
