use anyhow::Result;
use orgchart::query::OrgIndex;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct DepartmentCount<'a> {
    name: &'a str,
    people: usize,
}

pub fn run(dir: &Path, json: bool) -> Result<()> {
    let snapshot = super::load_snapshot(dir)?;
    let index = OrgIndex::new(&snapshot, None);

    let counts: Vec<DepartmentCount> = index
        .all_departments()
        .into_iter()
        .map(|name| DepartmentCount {
            name,
            people: index.filtered_users("", Some(name)).len(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    for dept in &counts {
        println!("{:<28} {}", dept.name, dept.people);
    }
    Ok(())
}
