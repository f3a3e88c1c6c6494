//! Directory model: the flat, immutable snapshot of people and manager links
//! that every tree build and query works from.
//!
//! People are stored in an arena (`Vec<Person>`) in input order, with an
//! id → position index. Input order matters: it decides root tie-breaks and
//! child ordering in the tree.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

/// Stable identifier of a person in the directory.
pub type PersonId = String;

/// A person record as delivered by the directory service (Graph field names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawPerson {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business_phones: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// A normalized person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    /// Kept as delivered (no trimming). Grouping trims; filtering matches exactly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
}

/// Trim and drop empty strings.
fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl Person {
    /// Normalize a raw record. Display name falls back to the principal name,
    /// then to the id.
    pub fn from_raw(raw: RawPerson) -> Self {
        let user_principal_name = clean(raw.user_principal_name);
        let display_name = match raw.display_name.trim() {
            "" => user_principal_name.clone().unwrap_or_else(|| raw.id.clone()),
            name => name.to_string(),
        };
        // Whitespace-only departments count as missing; otherwise the raw
        // value is kept so padding differences stay visible to callers.
        let department = raw.department.filter(|d| !d.trim().is_empty());

        Person {
            id: raw.id,
            display_name,
            given_name: clean(raw.given_name),
            surname: clean(raw.surname),
            user_principal_name,
            job_title: clean(raw.job_title),
            department,
            email: clean(raw.mail),
            phones: raw
                .business_phones
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            mobile_phone: clean(raw.mobile_phone),
            office_location: clean(raw.office_location),
            photo_ref: clean(raw.photo_url),
        }
    }

    /// Back to the wire shape, for persisting a snapshot.
    pub fn to_raw(&self) -> RawPerson {
        RawPerson {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            given_name: self.given_name.clone(),
            surname: self.surname.clone(),
            mail: self.email.clone(),
            user_principal_name: self.user_principal_name.clone(),
            job_title: self.job_title.clone(),
            department: self.department.clone(),
            office_location: self.office_location.clone(),
            mobile_phone: self.mobile_phone.clone(),
            business_phones: self.phones.clone(),
            photo_url: self.photo_ref.clone(),
        }
    }

    /// First business phone, falling back to the mobile number.
    pub fn primary_phone(&self) -> Option<&str> {
        self.phones
            .first()
            .map(String::as_str)
            .or(self.mobile_phone.as_deref())
    }
}

/// The manager relation: person id → manager id. Absent means "no manager".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagerLinks {
    links: BTreeMap<PersonId, PersonId>,
}

impl ManagerLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a map, treating empty or whitespace manager ids as "no manager".
    pub fn from_map(map: BTreeMap<PersonId, PersonId>) -> Self {
        let mut links = Self::new();
        for (person, manager) in map {
            links.set(person, manager);
        }
        links
    }

    pub fn from_pairs<I, P, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, M)>,
        P: Into<PersonId>,
        M: Into<PersonId>,
    {
        let mut links = Self::new();
        for (person, manager) in pairs {
            links.set(person.into(), manager.into());
        }
        links
    }

    /// Set a person's manager. An empty manager id removes the link.
    pub fn set(&mut self, person: PersonId, manager: PersonId) {
        let manager = manager.trim().to_string();
        if manager.is_empty() {
            self.links.remove(&person);
        } else {
            self.links.insert(person, manager);
        }
    }

    pub fn remove(&mut self, person: &str) -> Option<PersonId> {
        self.links.remove(person)
    }

    pub fn manager_of(&self, person: &str) -> Option<&str> {
        self.links.get(person).map(String::as_str)
    }

    /// Links in person-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(p, m)| (p.as_str(), m.as_str()))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<PersonId, PersonId> {
        self.links.clone()
    }
}

/// Immutable directory snapshot: people in input order plus manager links.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    people: Vec<Person>,
    index: HashMap<PersonId, usize>,
    managers: ManagerLinks,
}

impl Directory {
    /// Build from normalized people. Duplicate ids keep the first occurrence.
    pub fn new(people: Vec<Person>, managers: ManagerLinks) -> Self {
        let mut arena = Vec::with_capacity(people.len());
        let mut index = HashMap::with_capacity(people.len());
        for person in people {
            if index.contains_key(&person.id) {
                warn!(id = %person.id, "duplicate person id in directory, keeping first record");
                continue;
            }
            index.insert(person.id.clone(), arena.len());
            arena.push(person);
        }
        Directory {
            people: arena,
            index,
            managers,
        }
    }

    pub fn from_raw(raw: Vec<RawPerson>, managers: ManagerLinks) -> Self {
        Self::new(raw.into_iter().map(Person::from_raw).collect(), managers)
    }

    /// Build from raw records, dropping excluded ids before anything else sees them.
    pub fn from_raw_excluding(
        raw: Vec<RawPerson>,
        managers: ManagerLinks,
        excluded: &HashSet<PersonId>,
    ) -> Self {
        let kept = raw.into_iter().filter(|r| !excluded.contains(&r.id)).collect();
        Self::from_raw(kept, managers)
    }

    /// A copy of this snapshot without the excluded people.
    ///
    /// Links of the remaining people are kept as-is; someone whose manager was
    /// excluded keeps a dangling link and drops out of the tree.
    pub fn excluding(&self, excluded: &HashSet<PersonId>) -> Directory {
        let people = self
            .people
            .iter()
            .filter(|p| !excluded.contains(&p.id))
            .cloned()
            .collect();
        let mut managers = ManagerLinks::new();
        for (person, manager) in self.managers.iter() {
            if !excluded.contains(person) {
                managers.set(person.to_string(), manager.to_string());
            }
        }
        Directory::new(people, managers)
    }

    /// Same people, different manager links.
    pub fn with_managers(&self, managers: ManagerLinks) -> Directory {
        Directory {
            people: self.people.clone(),
            index: self.index.clone(),
            managers,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.index.get(id).map(|&i| &self.people[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn managers(&self) -> &ManagerLinks {
        &self.managers
    }

    /// Manager id of a person. The id may point outside the directory.
    pub fn manager_of(&self, id: &str) -> Option<&str> {
        self.managers.manager_of(id)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}
