//! Interaction relevance filter applied before batches reach the backend.

use std::collections::HashSet;

use crate::model::{Interaction, TimeRange};

/// Stateless predicate deciding which interactions a sync run keeps.
///
/// An interaction survives iff its timestamp falls in the sync period
/// (half-open), it is not a self-interaction, and at least one party is not
/// external. Interactions targeting bot accounts are kept.
#[derive(Debug, Clone)]
pub struct InteractionsFilter {
    time_range: TimeRange,
}

impl InteractionsFilter {
    #[must_use]
    pub fn new(time_range: TimeRange) -> Self {
        Self { time_range }
    }

    /// Whether a single interaction survives the filter.
    #[must_use]
    pub fn keeps(&self, interaction: &Interaction) -> bool {
        if !self.time_range.is_in_range(interaction.timestamp()) {
            return false;
        }
        if interaction.is_self_interaction() {
            return false;
        }
        if interaction.source().is_external() && interaction.target().is_external() {
            return false;
        }
        true
    }

    /// Drop every interaction the filter rejects.
    #[must_use]
    pub fn filter(&self, batch: HashSet<Interaction>) -> HashSet<Interaction> {
        batch.into_iter().filter(|i| self.keeps(i)).collect()
    }
}

/// Factory used by the orchestrator; one filter per sync period.
#[must_use]
pub fn create_interactions_filter(time_range: TimeRange) -> InteractionsFilter {
    InteractionsFilter::new(time_range)
}
