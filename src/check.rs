use crate::directory::{Directory, PersonId};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of checking a directory's manager links for issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub cycles: Vec<Vec<PersonId>>,
    pub self_managed: Vec<PersonId>,
    pub dangling_managers: Vec<DanglingManager>,
    /// The person a tree build would use as root
    pub root: Option<PersonId>,
    pub orphan_roots: Vec<PersonId>,
    /// People not reachable from the root (orphan roots excluded)
    pub unreachable: Vec<PersonId>,
    pub ok: bool,
}

/// A manager link pointing at someone outside the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingManager {
    pub person_id: PersonId,
    pub manager_id: PersonId,
}

/// Find manager loops of two or more people.
///
/// Each person has at most one manager, so following links from any start either
/// ends or enters exactly one loop. Every loop is reported once, starting at the
/// member reached first in directory order.
pub fn check_cycles(directory: &Directory) -> Vec<Vec<PersonId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let people = directory.people();
    let mut marks = vec![Mark::Unvisited; people.len()];
    let mut cycles = Vec::new();

    for start in 0..people.len() {
        let mut path: Vec<usize> = Vec::new();
        let mut current = Some(start);

        while let Some(pos) = current {
            match marks[pos] {
                Mark::Done => break,
                Mark::OnPath => {
                    if let Some(at) = path.iter().position(|&p| p == pos) {
                        let cycle: Vec<PersonId> =
                            path[at..].iter().map(|&p| people[p].id.clone()).collect();
                        if cycle.len() > 1 {
                            cycles.push(cycle);
                        }
                    }
                    break;
                }
                Mark::Unvisited => {
                    marks[pos] = Mark::OnPath;
                    path.push(pos);
                    current = directory
                        .manager_of(&people[pos].id)
                        .and_then(|m| directory.position(m));
                }
            }
        }

        for pos in path {
            marks[pos] = Mark::Done;
        }
    }

    cycles
}

pub fn check_self_managed(directory: &Directory) -> Vec<PersonId> {
    directory
        .people()
        .iter()
        .filter(|p| directory.manager_of(&p.id) == Some(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect()
}

pub fn check_dangling_managers(directory: &Directory) -> Vec<DanglingManager> {
    directory
        .people()
        .iter()
        .filter_map(|p| {
            let manager = directory.manager_of(&p.id)?;
            (!directory.contains(manager)).then(|| DanglingManager {
                person_id: p.id.clone(),
                manager_id: manager.to_string(),
            })
        })
        .collect()
}

/// People without a manager, in directory order.
pub fn find_roots(directory: &Directory) -> Vec<PersonId> {
    directory
        .people()
        .iter()
        .filter(|p| directory.manager_of(&p.id).is_none())
        .map(|p| p.id.clone())
        .collect()
}

/// People not reachable by walking reports down from `root`.
pub fn check_unreachable(directory: &Directory, root: &str) -> Vec<PersonId> {
    let mut reports: HashMap<&str, Vec<&str>> = HashMap::new();
    for person in directory.people() {
        if let Some(manager) = directory.manager_of(&person.id) {
            reports.entry(manager).or_default().push(&person.id);
        }
    }

    let mut reached: HashSet<&str> = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for &report in reports.get(current).map(Vec::as_slice).unwrap_or(&[]) {
            if reached.insert(report) {
                queue.push_back(report);
            }
        }
    }

    directory
        .people()
        .iter()
        .filter(|p| !reached.contains(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect()
}

/// Run all checks.
///
/// A missing root, a loop or a self-managed person makes the directory not ok.
/// Dangling links and orphan roots are reported but tolerated: the tree simply
/// leaves those people out.
pub fn check_all(directory: &Directory) -> CheckResult {
    let cycles = check_cycles(directory);
    let self_managed = check_self_managed(directory);
    let dangling_managers = check_dangling_managers(directory);
    let mut roots = find_roots(directory).into_iter();
    let root = roots.next();
    let orphan_roots: Vec<PersonId> = roots.collect();

    let unreachable = match &root {
        Some(root) => check_unreachable(directory, root)
            .into_iter()
            .filter(|id| !orphan_roots.contains(id))
            .collect(),
        None => Vec::new(),
    };

    let ok = root.is_some() && cycles.is_empty() && self_managed.is_empty();

    CheckResult {
        cycles,
        self_managed,
        dangling_managers,
        root,
        orphan_roots,
        unreachable,
        ok,
    }
}
