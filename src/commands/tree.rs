use anyhow::{Context, Result};
use orgchart::tree::{NodeKind, OrgNode, build_tree};
use std::path::Path;

fn describe(node: &OrgNode) -> String {
    match &node.kind {
        NodeKind::Person(p) => match &p.job_title {
            Some(title) => format!("{} ({}) - {}", p.display_name, p.id, title),
            None => format!("{} ({})", p.display_name, p.id),
        },
        NodeKind::DepartmentGroup {
            name,
            total_members,
            ..
        } => format!("[{}] {} member(s)", name, total_members),
    }
}

fn print_node(node: &OrgNode, depth: usize) {
    println!("{}{}", "  ".repeat(depth), describe(node));
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

pub fn run(dir: &Path, no_grouping: bool, root: Option<&str>, json: bool) -> Result<()> {
    let config = super::load_config(dir)?;
    let snapshot = super::load_snapshot(dir)?;

    let mut options = config.tree.build_options();
    if no_grouping {
        options.group_by_department = false;
    }
    options.root = root.map(str::to_string);

    let built = build_tree(&snapshot, &options).context("Failed to build org tree")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&built)?);
        return Ok(());
    }

    print_node(&built.root, 0);
    super::print_build_warnings(&built, options.orphan_policy);
    println!(
        "\n{} people, deepest reporting chain {}",
        built.root.person_count(),
        built.root.max_person_depth()
    );
    Ok(())
}
