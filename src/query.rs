//! Read-only lookups over a directory snapshot and, when available, its built tree.
//!
//! Missing ids never error: lookups return `None` or an empty list, since
//! callers routinely hold ids that were excluded or removed since.

use crate::directory::{Directory, Person, PersonId};
use crate::tree::OrgNode;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChainError {
    #[error("Manager chain of '{id}' did not end within {limit} steps; cycle suspected")]
    CycleSuspected { id: PersonId, limit: usize },
}

/// Managers from the immediate one up to the top, plus an error when the walk
/// had to be cut short.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerChain<'a> {
    pub managers: Vec<&'a Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ChainError>,
}

impl ManagerChain<'_> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.managers.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Borrowed query view. Tree-based answers (manager, reports, team size) come
/// from the tree when one is attached, otherwise from raw manager links.
#[derive(Debug, Clone, Copy)]
pub struct OrgIndex<'a> {
    directory: &'a Directory,
    tree: Option<&'a OrgNode>,
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

impl<'a> OrgIndex<'a> {
    pub fn new(directory: &'a Directory, tree: Option<&'a OrgNode>) -> Self {
        Self { directory, tree }
    }

    pub fn user_by_id(&self, id: &str) -> Option<&'a Person> {
        self.directory.get(id)
    }

    /// People matching a free-text query and an exact department, in directory order.
    ///
    /// The query is trimmed and matched case-insensitively as a substring of
    /// display name, job title, department or email.
    pub fn filtered_users(&self, query: &str, department: Option<&str>) -> Vec<&'a Person> {
        let needle = query.trim().to_lowercase();
        self.directory
            .people()
            .iter()
            .filter(|p| department.is_none_or(|d| p.department.as_deref() == Some(d)))
            .filter(|p| {
                needle.is_empty()
                    || contains_ci(Some(&p.display_name), &needle)
                    || contains_ci(p.job_title.as_deref(), &needle)
                    || contains_ci(p.department.as_deref(), &needle)
                    || contains_ci(p.email.as_deref(), &needle)
            })
            .collect()
    }

    fn manager_id_of(&self, user_id: &str) -> Option<&'a str> {
        match self.tree {
            Some(tree) => tree.find_person(user_id)?.manager_id.as_deref(),
            None => self.directory.manager_of(user_id),
        }
    }

    pub fn manager(&self, user_id: &str) -> Option<&'a Person> {
        self.directory.get(self.manager_id_of(user_id)?)
    }

    /// Walk up from `user_id`. The walk is capped at the directory size, so a
    /// looping manager relation yields a partial chain and `CycleSuspected`.
    pub fn manager_chain(&self, user_id: &str) -> ManagerChain<'a> {
        let limit = self.directory.len();
        let mut managers = Vec::new();
        let mut current = user_id;

        while let Some(manager) = self.manager(current) {
            if managers.len() == limit {
                warn!(id = %user_id, limit, "manager chain exceeded directory size");
                return ManagerChain {
                    managers,
                    error: Some(ChainError::CycleSuspected {
                        id: user_id.to_string(),
                        limit,
                    }),
                };
            }
            managers.push(manager);
            current = &manager.id;
        }

        ManagerChain {
            managers,
            error: None,
        }
    }

    /// Real people reporting directly to `manager_id`, in discovery order.
    /// Department groups are looked through.
    pub fn direct_reports(&self, manager_id: &str) -> Vec<&'a Person> {
        match self.tree {
            Some(tree) => {
                let Some(node) = tree.find_person(manager_id) else {
                    return Vec::new();
                };
                let mut reports = Vec::new();
                collect_through_groups(node, &mut reports);
                reports
            }
            None => self
                .directory
                .people()
                .iter()
                .filter(|p| self.directory.manager_of(&p.id) == Some(manager_id))
                .collect(),
        }
    }

    pub fn direct_reports_count(&self, user_id: &str) -> usize {
        self.direct_reports(user_id).len()
    }

    /// Everyone below `user_id`, at any depth.
    pub fn team_size(&self, user_id: &str) -> usize {
        if let Some(tree) = self.tree {
            return tree
                .find_person(user_id)
                .map_or(0, OrgNode::real_descendant_count);
        }

        // Link walk; the seen-set keeps loops finite.
        let mut seen: HashSet<&str> = HashSet::from([user_id]);
        let mut queue = VecDeque::from([user_id]);
        let mut count = 0;
        while let Some(current) = queue.pop_front() {
            for person in self.directory.people() {
                if self.directory.manager_of(&person.id) == Some(current)
                    && seen.insert(person.id.as_str())
                {
                    count += 1;
                    queue.push_back(person.id.as_str());
                }
            }
        }
        count
    }

    /// Distinct departments, sorted, blanks left out.
    pub fn all_departments(&self) -> Vec<&'a str> {
        self.directory
            .people()
            .iter()
            .filter_map(|p| p.department.as_deref())
            .filter(|d| !d.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn collect_through_groups<'a>(node: &'a OrgNode, out: &mut Vec<&'a Person>) {
    for child in &node.children {
        match child.person() {
            Some(person) => out.push(person),
            None => collect_through_groups(child, out),
        }
    }
}
