//! Employees, group memberships, and the per-sync lookup collection.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::hashing::HashFunction;

/// Group category assigned to chat channels.
///
/// Channel groups are excluded from group pushes unless the connector opts
/// in via its properties bag.
pub const CHANNEL_GROUP_CATEGORY: &str = "Channel";

/// Classification of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeKind {
    /// A member of the synchronized organization.
    Internal,
    /// A counterparty outside the organization.
    External,
    /// An automation account (room systems, app bots, service accounts).
    Bot,
}

/// An organizational unit an employee belongs to (team, department, channel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    id: String,
    name: String,
    category: Option<String>,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Whether this group represents a chat channel.
    #[must_use]
    pub fn is_channel(&self) -> bool {
        self.category.as_deref() == Some(CHANNEL_GROUP_CATEGORY)
    }
}

/// A directory entry participating in interactions.
///
/// Equality and hashing use the case-insensitively normalized primary id
/// only, so an employee fetched from two vendors compares equal as long as
/// the primary ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    id: String,
    aliases: Vec<String>,
    groups: Vec<Group>,
    kind: EmployeeKind,
}

impl Employee {
    pub fn new(id: impl Into<String>, kind: EmployeeKind) -> Self {
        Self {
            id: id.into(),
            aliases: Vec::new(),
            groups: Vec::new(),
            kind,
        }
    }

    pub fn internal(id: impl Into<String>) -> Self {
        Self::new(id, EmployeeKind::Internal)
    }

    pub fn external(id: impl Into<String>) -> Self {
        Self::new(id, EmployeeKind::External)
    }

    pub fn bot(id: impl Into<String>) -> Self {
        Self::new(id, EmployeeKind::Bot)
    }

    /// Add alternative identifiers (secondary mail addresses, vendor ids).
    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn kind(&self) -> EmployeeKind {
        self.kind
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.kind == EmployeeKind::Internal
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        self.kind == EmployeeKind::External
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.kind == EmployeeKind::Bot
    }

    /// Pseudonymized copy: primary id and aliases run through the hash
    /// function, group memberships and kind carried over unchanged.
    #[must_use]
    pub fn hashed(&self, hash: &dyn HashFunction) -> Self {
        Self {
            id: hash.hash(&self.id),
            aliases: self.aliases.iter().map(|a| hash.hash(a)).collect(),
            groups: self.groups.clone(),
            kind: self.kind,
        }
    }
}

impl PartialEq for Employee {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id)
    }
}

impl Eq for Employee {}

impl Hash for Employee {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_ascii_lowercase().hash(state);
    }
}

/// Outcome of an [`EmployeeCollection::find`] lookup.
///
/// A lookup never fails: identifiers absent from the directory resolve to a
/// synthesized external employee carrying the (pseudonymized) identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeLookup {
    /// The identifier matched a directory entry.
    Known(Employee),
    /// The identifier was not in the directory; an external stand-in was
    /// synthesized from it.
    SynthesizedExternal(Employee),
}

impl EmployeeLookup {
    #[must_use]
    pub fn employee(&self) -> &Employee {
        match self {
            Self::Known(e) | Self::SynthesizedExternal(e) => e,
        }
    }

    #[must_use]
    pub fn into_employee(self) -> Employee {
        match self {
            Self::Known(e) | Self::SynthesizedExternal(e) => e,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Immutable employee directory built once per sync run.
///
/// Stored employees are pseudonymized at construction when a hash function
/// is supplied; the lookup index keeps the raw identifiers (lowercased) so
/// vendor payloads can be resolved without re-hashing.
pub struct EmployeeCollection {
    employees: Vec<Employee>,
    by_alias: HashMap<String, usize>,
    hasher: Option<Arc<dyn HashFunction>>,
}

impl EmployeeCollection {
    pub fn new(
        employees: impl IntoIterator<Item = Employee>,
        hasher: Option<Arc<dyn HashFunction>>,
    ) -> Self {
        let mut stored = Vec::new();
        let mut by_alias = HashMap::new();

        for raw in employees {
            // First registration of a primary id wins.
            if by_alias.contains_key(&raw.id().to_ascii_lowercase()) {
                continue;
            }
            let index = stored.len();
            for key in std::iter::once(raw.id()).chain(raw.aliases().iter().map(String::as_str)) {
                by_alias.entry(key.to_ascii_lowercase()).or_insert(index);
            }
            let entry = match &hasher {
                Some(h) => raw.hashed(h.as_ref()),
                None => raw,
            };
            stored.push(entry);
        }

        Self {
            employees: stored,
            by_alias,
            hasher,
        }
    }

    /// Resolve a raw identifier from a vendor payload.
    #[must_use]
    pub fn find(&self, id: &str) -> EmployeeLookup {
        if let Some(&index) = self.by_alias.get(&id.to_ascii_lowercase()) {
            return EmployeeLookup::Known(self.employees[index].clone());
        }

        let resolved = match &self.hasher {
            Some(h) => h.hash(id),
            None => id.to_string(),
        };
        EmployeeLookup::SynthesizedExternal(Employee::external(resolved))
    }

    /// All stored (pseudonymized) employees.
    #[must_use]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Distinct groups across all employees, in first-seen order.
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        for employee in &self.employees {
            for group in employee.groups() {
                if !groups.contains(group) {
                    groups.push(group.clone());
                }
            }
        }
        groups
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

impl fmt::Debug for EmployeeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeCollection")
            .field("employees", &self.employees.len())
            .field("aliases", &self.by_alias.len())
            .field("hashed", &self.hasher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReverseHash;

    impl HashFunction for ReverseHash {
        fn hash(&self, value: &str) -> String {
            value.chars().rev().collect()
        }
    }

    fn alice() -> Employee {
        Employee::internal("alice@corp.example")
            .with_aliases(vec!["alice.smith@corp.example".to_string()])
            .with_groups(vec![Group::new("g1", "Engineering")])
    }

    #[test]
    fn test_employee_equality_is_case_insensitive() {
        let a = Employee::internal("Alice@Corp.Example");
        let b = Employee::external("alice@corp.example");
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_find_by_primary_id_and_alias() {
        let collection = EmployeeCollection::new(vec![alice()], None);

        let by_id = collection.find("ALICE@corp.example");
        assert!(by_id.is_known());
        assert_eq!(by_id.employee().id(), "alice@corp.example");

        let by_alias = collection.find("alice.smith@corp.example");
        assert!(by_alias.is_known());
        assert_eq!(by_alias.employee().id(), "alice@corp.example");
    }

    #[test]
    fn test_find_unknown_synthesizes_external() {
        let collection = EmployeeCollection::new(vec![alice()], None);

        let lookup = collection.find("stranger@elsewhere.example");
        assert!(!lookup.is_known());
        let employee = lookup.into_employee();
        assert!(employee.is_external());
        assert_eq!(employee.id(), "stranger@elsewhere.example");
    }

    #[test]
    fn test_hasher_pseudonymizes_stored_employees_but_keeps_raw_index() {
        let collection = EmployeeCollection::new(vec![alice()], Some(Arc::new(ReverseHash)));

        let lookup = collection.find("alice@corp.example");
        assert!(lookup.is_known());
        // Stored copy is hashed; groups survive untouched.
        let employee = lookup.employee();
        assert_eq!(employee.id(), "elpmaxe.proc@ecila");
        assert_eq!(employee.groups()[0].name(), "Engineering");
    }

    #[test]
    fn test_hasher_applies_to_synthesized_externals() {
        let collection = EmployeeCollection::new(vec![alice()], Some(Arc::new(ReverseHash)));

        let lookup = collection.find("bob@other.example");
        assert!(!lookup.is_known());
        assert_eq!(lookup.employee().id(), "elpmaxe.rehto@bob");
    }

    #[test]
    fn test_groups_are_distinct_across_employees() {
        let shared = Group::new("g1", "Engineering");
        let employees = vec![
            Employee::internal("a@corp.example").with_groups(vec![shared.clone()]),
            Employee::internal("b@corp.example").with_groups(vec![
                shared,
                Group::new("c1", "general").with_category(CHANNEL_GROUP_CATEGORY),
            ]),
        ];
        let collection = EmployeeCollection::new(employees, None);

        let groups = collection.groups();
        assert_eq!(groups.len(), 2);
        assert!(groups[1].is_channel());
        assert!(!groups[0].is_channel());
    }

    #[test]
    fn test_bot_kind() {
        let bot = Employee::bot("room-4f@corp.example");
        assert!(bot.is_bot());
        assert!(!bot.is_external());
        assert!(!bot.is_internal());
    }
}
