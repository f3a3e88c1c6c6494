use crate::directory::{Directory, ManagerLinks, Person};
use crate::store::{DirectoryFile, save_directory};
use std::path::{Path, PathBuf};

/// Create a person with the given id and department, other fields defaulted.
pub fn make_person(id: &str, department: Option<&str>) -> Person {
    Person {
        id: id.to_string(),
        display_name: format!("Person {}", id),
        given_name: None,
        surname: None,
        user_principal_name: None,
        job_title: None,
        department: department.map(str::to_string),
        email: None,
        phones: vec![],
        mobile_phone: None,
        office_location: None,
        photo_ref: None,
    }
}

/// Build a directory from `(id, department, manager)` rows, in row order.
pub fn directory_of(rows: &[(&str, &str, Option<&str>)]) -> Directory {
    let people = rows
        .iter()
        .map(|(id, dept, _)| make_person(id, Some(dept)))
        .collect();
    let links = ManagerLinks::from_pairs(
        rows.iter()
            .filter_map(|(id, _, manager)| manager.map(|m| (id.to_string(), m.to_string()))),
    );
    Directory::new(people, links)
}

/// A manager `m` with `count` leaf reports `r1..rN`, all in one department.
pub fn manager_with_leaves(count: usize) -> Directory {
    let mut people = vec![make_person("m", Some("Team"))];
    let mut links = ManagerLinks::new();
    for i in 1..=count {
        let id = format!("r{}", i);
        people.push(make_person(&id, Some("Team")));
        links.set(id, "m".to_string());
    }
    Directory::new(people, links)
}

/// Create a data directory at `dir` holding the given snapshot, and return the
/// path to the directory file.
pub fn setup_orgchart(dir: &Path, directory: &Directory) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("directory.json");
    save_directory(&DirectoryFile::from_directory(directory), &path).unwrap();
    path
}
