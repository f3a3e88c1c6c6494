//! Employee list export (CSV).

use crate::directory::Person;
use crate::query::OrgIndex;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One exported row. Missing values export as empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Job Title")]
    pub job_title: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Office Location")]
    pub office_location: String,
    #[serde(rename = "Manager")]
    pub manager: String,
}

impl EmployeeRow {
    pub fn new(person: &Person, manager: Option<&Person>) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        EmployeeRow {
            name: person.display_name.clone(),
            job_title: text(&person.job_title),
            department: text(&person.department),
            email: text(&person.email),
            phone: person.phones.first().cloned().unwrap_or_default(),
            office_location: text(&person.office_location),
            manager: manager.map(|m| m.display_name.clone()).unwrap_or_default(),
        }
    }
}

/// Rows for `people`, in the given order, with manager names resolved through `index`.
pub fn employee_rows(people: &[&Person], index: &OrgIndex<'_>) -> Vec<EmployeeRow> {
    people
        .iter()
        .map(|p| EmployeeRow::new(p, index.manager(&p.id)))
        .collect()
}

pub fn write_employee_csv<W: Write>(writer: W, rows: &[EmployeeRow]) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // serde only emits headers with the first record.
        csv_writer.write_record([
            "Name",
            "Job Title",
            "Department",
            "Email",
            "Phone",
            "Office Location",
            "Manager",
        ])?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// `<prefix>-YYYY-MM-DD.csv`
pub fn default_export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", prefix, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::directory_of;
    use crate::tree::{BuildOptions, build_tree};

    #[test]
    fn test_rows_resolve_manager_names() {
        let dir = directory_of(&[("ceo", "Exec", None), ("a", "Eng", Some("ceo"))]);
        let built = build_tree(&dir, &BuildOptions::default()).unwrap();
        let index = OrgIndex::new(&dir, Some(&built.root));
        let people = index.filtered_users("", None);

        let rows = employee_rows(&people, &index);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].manager, "");
        assert_eq!(rows[1].manager, "Person ceo");
        assert_eq!(rows[1].department, "Eng");
    }

    #[test]
    fn test_csv_columns_and_quoting() {
        let mut dir = directory_of(&[("ceo", "Exec", None)]);
        let mut people = dir.people().to_vec();
        people[0].display_name = "Chen, Sarah".to_string();
        people[0].phones = vec!["+1 555".to_string(), "+1 556".to_string()];
        dir = crate::directory::Directory::new(people, dir.managers().clone());
        let index = OrgIndex::new(&dir, None);
        let rows = employee_rows(&index.filtered_users("", None), &index);

        let mut out = Vec::new();
        write_employee_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Job Title,Department,Email,Phone,Office Location,Manager")
        );
        assert_eq!(lines.next(), Some("\"Chen, Sarah\",,Exec,,+1 555,,"));
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let mut out = Vec::new();
        write_employee_csv(&mut out, &[]).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Name,Job Title"));
    }

    #[test]
    fn test_default_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            default_export_filename("employee-list", date),
            "employee-list-2024-03-07.csv"
        );
    }
}
