use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// One past pairing as returned by the history source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryRecord {
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub match_date: NaiveDate,
}

/// Symmetric participant -> recent partners adjacency, rebuilt every run.
#[derive(Debug, Default, Clone)]
pub struct HistoryIndex {
    adjacency: HashMap<Uuid, HashSet<Uuid>>,
}

impl HistoryIndex {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Uuid)>,
    {
        let mut index = Self::default();
        for (a, b) in pairs {
            index.insert(a, b);
        }
        index
    }

    pub fn from_records(records: &[HistoryRecord]) -> Self {
        Self::from_pairs(records.iter().map(|r| (r.participant_a, r.participant_b)))
    }

    pub fn insert(&mut self, a: Uuid, b: Uuid) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn contains(&self, a: Uuid, b: Uuid) -> bool {
        self.adjacency.get(&a).is_some_and(|partners| partners.contains(&b))
    }

    pub fn partners_of(&self, participant: Uuid) -> impl Iterator<Item = &Uuid> {
        self.adjacency.get(&participant).into_iter().flatten()
    }

    /// Number of distinct unordered pairs.
    pub fn pair_count(&self) -> usize {
        let directed: usize = self.adjacency.values().map(HashSet::len).sum();
        let self_loops = self
            .adjacency
            .iter()
            .filter(|(id, partners)| partners.contains(id))
            .count();
        (directed + self_loops) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}
