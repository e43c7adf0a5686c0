//! Directed interaction events and their set-deduplication identity.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing::HashFunction;
use crate::model::Employee;

/// The communication medium an interaction was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    Email,
    Meeting,
    Chat,
}

/// Recurrence pattern of a repeating meeting series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// A single directed interaction between two employees.
///
/// Equality and hashing cover `(kind, event_id, source, target, timestamp)`
/// so that batches collected in a `HashSet` deduplicate events re-fetched
/// from overlapping vendor queries. Duration and recurrence are payload, not
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    kind: InteractionKind,
    timestamp: DateTime<Utc>,
    source: Employee,
    target: Employee,
    event_id: String,
    duration_minutes: Option<u32>,
    recurrence: Option<RecurrenceKind>,
}

impl Interaction {
    pub fn new(
        kind: InteractionKind,
        timestamp: DateTime<Utc>,
        source: Employee,
        target: Employee,
        event_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            timestamp,
            source,
            target,
            event_id: event_id.into(),
            duration_minutes: None,
            recurrence: None,
        }
    }

    #[must_use]
    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_recurrence(mut self, recurrence: RecurrenceKind) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    #[must_use]
    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn source(&self) -> &Employee {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &Employee {
        &self.target
    }

    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    #[must_use]
    pub fn recurrence(&self) -> Option<RecurrenceKind> {
        self.recurrence
    }

    /// Whether source and target resolve to the same employee.
    #[must_use]
    pub fn is_self_interaction(&self) -> bool {
        self.source == self.target
    }

    /// Pseudonymized copy with both parties run through the hash function.
    #[must_use]
    pub fn hashed(&self, hash: &dyn HashFunction) -> Self {
        Self {
            source: self.source.hashed(hash),
            target: self.target.hashed(hash),
            ..self.clone()
        }
    }
}

impl PartialEq for Interaction {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.event_id == other.event_id
            && self.timestamp == other.timestamp
            && self.source == other.source
            && self.target == other.target
    }
}

impl Eq for Interaction {}

impl Hash for Interaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.event_id.hash(state);
        self.timestamp.hash(state);
        self.source.hash(state);
        self.target.hash(state);
    }
}
