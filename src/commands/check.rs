use anyhow::Result;
use orgchart::check::{DanglingManager, check_all};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CheckJsonOutput {
    ok: bool,
    root: Option<String>,
    cycles: Vec<Vec<String>>,
    self_managed: Vec<String>,
    dangling_managers: Vec<DanglingManager>,
    orphan_roots: Vec<String>,
    unreachable: Vec<String>,
    person_count: usize,
    warnings: usize,
    errors: usize,
}

pub fn run(dir: &Path, json: bool) -> Result<()> {
    let snapshot = super::load_snapshot(dir)?;
    let result = check_all(&snapshot);

    let warnings =
        result.dangling_managers.len() + result.orphan_roots.len() + result.unreachable.len();
    let errors = result.cycles.len()
        + result.self_managed.len()
        + usize::from(result.root.is_none() && !snapshot.is_empty());
    // An empty directory has no root but nothing is wrong with it either
    let failed = !result.ok && !snapshot.is_empty();

    if json {
        let output = CheckJsonOutput {
            ok: !failed,
            root: result.root,
            cycles: result.cycles,
            self_managed: result.self_managed,
            dangling_managers: result.dangling_managers,
            orphan_roots: result.orphan_roots,
            unreachable: result.unreachable,
            person_count: snapshot.len(),
            warnings,
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        if failed {
            anyhow::bail!("Found {} error(s) and {} warning(s)", errors, warnings);
        }
        return Ok(());
    }

    // Dangling links and orphan roots only drop people from the chart
    if !result.dangling_managers.is_empty() {
        eprintln!("Warning: Managers not found in directory:");
        for dangling in &result.dangling_managers {
            eprintln!(
                "  {} --[manager]--> {} (not found)",
                dangling.person_id, dangling.manager_id
            );
        }
    }
    if !result.orphan_roots.is_empty() {
        eprintln!("Warning: People with no manager besides the root:");
        for id in &result.orphan_roots {
            eprintln!("  {}", id);
        }
    }
    if !result.unreachable.is_empty() {
        eprintln!("Warning: People not reachable from the root:");
        for id in &result.unreachable {
            eprintln!("  {}", id);
        }
    }

    if !result.self_managed.is_empty() {
        eprintln!("Error: People listed as their own manager:");
        for id in &result.self_managed {
            eprintln!("  {}", id);
        }
    }
    if !result.cycles.is_empty() {
        eprintln!("Error: Management loops:");
        for cycle in &result.cycles {
            eprintln!("  {} -> {}", cycle.join(" -> "), cycle[0]);
        }
    }

    if snapshot.is_empty() {
        println!("Directory is empty");
        return Ok(());
    }

    match &result.root {
        Some(root) => println!("Root: {}", root),
        None => eprintln!("Error: No person without a manager; the chart has no root"),
    }

    if failed {
        anyhow::bail!("Found {} error(s) and {} warning(s)", errors, warnings);
    } else if warnings > 0 {
        println!(
            "Directory OK: {} people, {} warning(s)",
            snapshot.len(),
            warnings
        );
    } else {
        println!("Directory OK: {} people, no issues found", snapshot.len());
    }

    Ok(())
}
