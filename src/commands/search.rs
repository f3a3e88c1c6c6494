use anyhow::Result;
use orgchart::query::OrgIndex;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SearchHit<'a> {
    id: &'a str,
    display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    department: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

pub fn run(dir: &Path, query: &str, department: Option<&str>, json: bool) -> Result<()> {
    let snapshot = super::load_snapshot(dir)?;
    let index = OrgIndex::new(&snapshot, None);
    let hits = index.filtered_users(query, department);

    if json {
        let output: Vec<SearchHit> = hits
            .iter()
            .map(|p| SearchHit {
                id: &p.id,
                display_name: &p.display_name,
                job_title: p.job_title.as_deref(),
                department: p.department.as_deref(),
                email: p.email.as_deref(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matching people");
        return Ok(());
    }
    for person in &hits {
        println!(
            "{:<12} {:<24} {:<32} {}",
            person.id,
            person.display_name,
            person.job_title.as_deref().unwrap_or("-"),
            person.department.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} of {} people", hits.len(), snapshot.len());
    Ok(())
}
