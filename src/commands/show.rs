use anyhow::Result;
use orgchart::directory::Person;
use orgchart::query::ChainError;
use serde::Serialize;
use std::path::Path;

/// Short reference to another person
#[derive(Debug, Serialize)]
struct PersonRef {
    id: String,
    display_name: String,
}

impl From<&Person> for PersonRef {
    fn from(person: &Person) -> Self {
        PersonRef {
            id: person.id.clone(),
            display_name: person.display_name.clone(),
        }
    }
}

/// JSON output structure for show command
#[derive(Debug, Serialize)]
struct PersonDetails<'a> {
    person: &'a Person,
    /// Whether the person is reachable from the chart root
    in_chart: bool,
    manager_chain: Vec<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain_error: Option<ChainError>,
    direct_reports: Vec<PersonRef>,
    team_size: usize,
}

pub fn run(dir: &Path, id: &str, json: bool) -> Result<()> {
    let config = super::load_config(dir)?;
    let chart = super::load_chart(dir, &config.tree.build_options(), &config)?;
    let index = chart.index();

    let Some(person) = index.user_by_id(id) else {
        anyhow::bail!("Person '{}' not found", id);
    };

    let chain = index.manager_chain(id);
    let details = PersonDetails {
        person,
        in_chart: chart.tree.root.find_person(id).is_some(),
        manager_chain: chain.managers.iter().map(|p| PersonRef::from(*p)).collect(),
        chain_error: chain.error.clone(),
        direct_reports: index
            .direct_reports(id)
            .into_iter()
            .map(PersonRef::from)
            .collect(),
        team_size: index.team_size(id),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    println!("{} ({})", person.display_name, person.id);
    if let Some(title) = &person.job_title {
        println!("Title: {}", title);
    }
    if let Some(department) = &person.department {
        println!("Department: {}", department);
    }
    if let Some(email) = &person.email {
        println!("Email: {}", email);
    }
    if let Some(phone) = person.primary_phone() {
        println!("Phone: {}", phone);
    }
    if let Some(office) = &person.office_location {
        println!("Office: {}", office);
    }

    if !details.in_chart {
        eprintln!("Warning: '{}' is not reachable from the chart root", id);
    }

    if details.manager_chain.is_empty() {
        println!("\nReports to: nobody");
    } else {
        let names: Vec<&str> = details
            .manager_chain
            .iter()
            .map(|m| m.display_name.as_str())
            .collect();
        println!("\nReports to: {}", names.join(" -> "));
    }
    if let Some(err) = &details.chain_error {
        eprintln!("Warning: {}", err);
    }

    println!("Direct reports ({}):", details.direct_reports.len());
    for report in &details.direct_reports {
        println!("  {} ({})", report.display_name, report.id);
    }
    println!("Team size: {}", details.team_size);
    Ok(())
}
