//! Tree builder: turns a directory snapshot into a rooted `OrgNode` hierarchy.
//!
//! Children follow directory input order. When a manager's direct reports
//! span two or more departments, a synthetic department node is inserted per
//! department (first-seen order) and the reports hang below it.

use crate::check::{check_cycles, check_self_managed};
use crate::directory::{Directory, Person, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Visual id prefix for department nodes, so they never collide with a person id.
pub const DEPARTMENT_ID_PREFIX: &str = "dept-";

/// Department key used for people without a department.
pub const UNASSIGNED_DEPARTMENT: &str = "Unassigned";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("No root found: every person in the directory has a manager")]
    NoRootFound,
    #[error("Manager cycle detected at '{0}'")]
    CycleDetected(PersonId),
    #[error("Person '{0}' not found in directory")]
    UnknownPerson(PersonId),
}

/// Non-fatal findings from a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum BuildWarning {
    /// People without a manager other than the chosen root.
    OrphanRoots(Vec<PersonId>),
    /// People left out of the tree because their manager chain never reaches
    /// the root (e.g. their manager is not in the directory). Orphan roots
    /// themselves are not repeated here.
    Unreachable(Vec<PersonId>),
}

/// What to do with manager-less people that were not chosen as root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Leave them out of the tree and report them as a warning.
    #[default]
    Report,
    /// Treat them as reports of the root, after the root's own reports.
    AttachToRoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub group_by_department: bool,
    pub orphan_policy: OrphanPolicy,
    /// Build the chart below this person instead of the detected root.
    pub root: Option<PersonId>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            group_by_department: true,
            orphan_policy: OrphanPolicy::Report,
            root: None,
        }
    }
}

/// Node payload: a real person or a synthetic department group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Person(Person),
    #[serde(rename_all = "camelCase")]
    DepartmentGroup {
        name: String,
        /// First member of the department; the group borrows its id.
        anchor_id: PersonId,
        /// Real people anywhere below the group.
        total_members: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    pub kind: NodeKind,
    pub manager_id: Option<PersonId>,
    /// Ids of immediate reports, before grouping.
    pub direct_report_ids: Vec<PersonId>,
    pub level: usize,
    pub children: Vec<OrgNode>,
}

impl OrgNode {
    /// Person id, or the anchor id for department groups.
    pub fn id(&self) -> &str {
        match &self.kind {
            NodeKind::Person(p) => &p.id,
            NodeKind::DepartmentGroup { anchor_id, .. } => anchor_id,
        }
    }

    /// Id used for rendering and edge ids (`dept-` prefixed for groups).
    pub fn visual_id(&self) -> String {
        match &self.kind {
            NodeKind::Person(p) => p.id.clone(),
            NodeKind::DepartmentGroup { anchor_id, .. } => {
                format!("{}{}", DEPARTMENT_ID_PREFIX, anchor_id)
            }
        }
    }

    pub fn person(&self) -> Option<&Person> {
        match &self.kind {
            NodeKind::Person(p) => Some(p),
            NodeKind::DepartmentGroup { .. } => None,
        }
    }

    pub fn is_department_group(&self) -> bool {
        matches!(self.kind, NodeKind::DepartmentGroup { .. })
    }

    pub fn department_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::DepartmentGroup { name, .. } => Some(name),
            NodeKind::Person(_) => None,
        }
    }

    pub fn total_members(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::DepartmentGroup { total_members, .. } => Some(*total_members),
            NodeKind::Person(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Real people strictly below this node.
    pub fn real_descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| usize::from(!c.is_department_group()) + c.real_descendant_count())
            .sum()
    }

    /// Pre-order traversal, children in order.
    pub fn iter(&self) -> OrgNodeIter<'_> {
        OrgNodeIter { stack: vec![self] }
    }

    /// Find the node of a person. Department groups never match.
    pub fn find_person(&self, id: &str) -> Option<&OrgNode> {
        self.iter()
            .find(|n| !n.is_department_group() && n.id() == id)
    }

    /// Real people in the tree, this node included.
    pub fn person_count(&self) -> usize {
        self.iter().filter(|n| !n.is_department_group()).count()
    }

    pub fn max_level(&self) -> usize {
        self.iter().map(|n| n.level).max().unwrap_or(self.level)
    }

    /// Deepest management chain below this node, counted in people (groups are
    /// transparent).
    pub fn max_person_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            for child in &node.children {
                let child_depth = if child.is_department_group() {
                    depth
                } else {
                    depth + 1
                };
                stack.push((child, child_depth));
            }
        }
        max
    }
}

pub struct OrgNodeIter<'a> {
    stack: Vec<&'a OrgNode>,
}

impl<'a> Iterator for OrgNodeIter<'a> {
    type Item = &'a OrgNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A built tree plus the non-fatal findings of the build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltTree {
    pub root: OrgNode,
    pub warnings: Vec<BuildWarning>,
}

impl BuiltTree {
    pub fn orphan_roots(&self) -> &[PersonId] {
        self.warnings
            .iter()
            .find_map(|w| match w {
                BuildWarning::OrphanRoots(ids) => Some(ids.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn unreachable(&self) -> &[PersonId] {
        self.warnings
            .iter()
            .find_map(|w| match w {
                BuildWarning::Unreachable(ids) => Some(ids.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Trimmed department key of a person.
pub fn department_key(person: &Person) -> String {
    person
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(UNASSIGNED_DEPARTMENT)
        .to_string()
}

/// Partition report positions by trimmed department, in first-seen order.
fn partition_by_department(people: &[Person], reports: &[usize]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for &pos in reports {
        let key = department_key(&people[pos]);
        match groups.iter_mut().find(|(name, _)| *name == key) {
            Some((_, members)) => members.push(pos),
            None => groups.push((key, vec![pos])),
        }
    }
    groups
}

struct Builder<'a> {
    directory: &'a Directory,
    children_of: HashMap<&'a str, Vec<usize>>,
    /// Manager-less people attached under the root, keyed by position
    adopted_by: HashMap<usize, &'a str>,
    group_by_department: bool,
    on_path: Vec<bool>,
}

impl<'a> Builder<'a> {
    fn build_person(&mut self, pos: usize, level: usize) -> Result<OrgNode, TreeError> {
        let directory = self.directory;
        let person = &directory.people()[pos];
        if self.on_path[pos] {
            return Err(TreeError::CycleDetected(person.id.clone()));
        }
        self.on_path[pos] = true;

        let reports = self
            .children_of
            .get(person.id.as_str())
            .cloned()
            .unwrap_or_default();
        let direct_report_ids = reports
            .iter()
            .map(|&i| directory.people()[i].id.clone())
            .collect();

        let groups = if self.group_by_department {
            partition_by_department(directory.people(), &reports)
        } else {
            Vec::new()
        };

        let children = if groups.len() >= 2 {
            debug!(
                manager = %person.id,
                departments = groups.len(),
                "grouping direct reports by department"
            );
            let mut children = Vec::with_capacity(groups.len());
            for (name, members) in groups {
                children.push(self.build_group(&person.id, name, &members, level)?);
            }
            children
        } else {
            let mut children = Vec::with_capacity(reports.len());
            for &report in &reports {
                children.push(self.build_person(report, level + 1)?);
            }
            children
        };

        self.on_path[pos] = false;

        Ok(OrgNode {
            kind: NodeKind::Person(person.clone()),
            manager_id: directory
                .manager_of(&person.id)
                .or_else(|| self.adopted_by.get(&pos).copied())
                .map(str::to_string),
            direct_report_ids,
            level,
            children,
        })
    }

    fn build_group(
        &mut self,
        manager_id: &str,
        name: String,
        members: &[usize],
        manager_level: usize,
    ) -> Result<OrgNode, TreeError> {
        let people = self.directory.people();
        let mut children = Vec::with_capacity(members.len());
        for &member in members {
            children.push(self.build_person(member, manager_level + 2)?);
        }
        let total_members = children
            .iter()
            .map(|c| 1 + c.real_descendant_count())
            .sum();

        Ok(OrgNode {
            kind: NodeKind::DepartmentGroup {
                name,
                anchor_id: people[members[0]].id.clone(),
                total_members,
            },
            manager_id: Some(manager_id.to_string()),
            direct_report_ids: members.iter().map(|&i| people[i].id.clone()).collect(),
            level: manager_level + 1,
            children,
        })
    }
}

/// Build the org tree from a directory snapshot.
///
/// The root is the first manager-less person in directory order (or
/// `options.root`). Other manager-less people are reported as orphan roots and
/// handled per `options.orphan_policy`.
pub fn build_tree(directory: &Directory, options: &BuildOptions) -> Result<BuiltTree, TreeError> {
    let people = directory.people();
    let mut children_of: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut candidates: Vec<usize> = Vec::new();

    for (pos, person) in people.iter().enumerate() {
        match directory.manager_of(&person.id) {
            Some(manager) => children_of.entry(manager).or_default().push(pos),
            None => candidates.push(pos),
        }
    }

    let mut builder = Builder {
        directory,
        children_of,
        adopted_by: HashMap::new(),
        group_by_department: options.group_by_department,
        on_path: vec![false; people.len()],
    };

    if let Some(root_id) = &options.root {
        let pos = directory
            .position(root_id)
            .ok_or_else(|| TreeError::UnknownPerson(root_id.clone()))?;
        let root = builder.build_person(pos, 0)?;
        return Ok(BuiltTree {
            root,
            warnings: Vec::new(),
        });
    }

    let (&root_pos, orphans) = candidates.split_first().ok_or(TreeError::NoRootFound)?;
    let orphan_ids: Vec<PersonId> = orphans.iter().map(|&i| people[i].id.clone()).collect();
    let mut warnings = Vec::new();

    if !orphans.is_empty() {
        warn!(
            root = %people[root_pos].id,
            orphans = ?orphan_ids,
            "multiple people without a manager; using the first as root"
        );
        if options.orphan_policy == OrphanPolicy::AttachToRoot {
            // Adopted orphans go through the same grouping as real reports.
            let root_id = people[root_pos].id.as_str();
            builder
                .children_of
                .entry(root_id)
                .or_default()
                .extend_from_slice(orphans);
            for &orphan in orphans {
                builder.adopted_by.insert(orphan, root_id);
            }
        }
        warnings.push(BuildWarning::OrphanRoots(orphan_ids.clone()));
    }

    let root = builder.build_person(root_pos, 0)?;

    let reached: HashSet<&str> = root
        .iter()
        .filter_map(OrgNode::person)
        .map(|p| p.id.as_str())
        .collect();
    if reached.len() < people.len() {
        // A loop can never hang below a manager-less root, so any loop in the
        // directory is one the walk above skipped.
        let looped = check_cycles(directory)
            .into_iter()
            .flatten()
            .next()
            .or_else(|| check_self_managed(directory).into_iter().next());
        if let Some(id) = looped {
            return Err(TreeError::CycleDetected(id));
        }

        let unreachable: Vec<PersonId> = people
            .iter()
            .filter(|p| !reached.contains(p.id.as_str()) && !orphan_ids.contains(&p.id))
            .map(|p| p.id.clone())
            .collect();
        if !unreachable.is_empty() {
            warn!(people = ?unreachable, "people not reachable from the root were left out");
            warnings.push(BuildWarning::Unreachable(unreachable));
        }
    }

    Ok(BuiltTree { root, warnings })
}
