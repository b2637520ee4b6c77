use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::stats::StatVector;

/// Entries kept in the stats history
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: StatVector,
}

/// Time-stamped stat snapshots, oldest first, for display only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsHistory {
    entries: Vec<StatsSnapshot>,
}

impl<'de> Deserialize<'de> for StatsHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older saves label entries with display strings ("1h ago", "3:45 PM")
        // instead of timestamps. Such entries are skipped.
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<StatsSnapshot>(entry).ok())
            .collect();
        Ok(StatsHistory { entries })
    }
}

impl StatsHistory {
    /// History holding a single snapshot of `stats`.
    pub fn starting_with(stats: &StatVector, now: DateTime<Utc>) -> Self {
        let mut history = StatsHistory::default();
        history.record(stats, now);
        history
    }

    pub fn record(&mut self, stats: &StatVector, now: DateTime<Utc>) {
        self.entries.push(StatsSnapshot {
            time: now,
            stats: stats.clone(),
        });
        self.truncate();
    }

    pub fn reset(&mut self, stats: &StatVector, now: DateTime<Utc>) {
        *self = StatsHistory::starting_with(stats, now);
    }

    /// Drop the oldest entries beyond the limit. Also applied after loading.
    pub fn truncate(&mut self) {
        if self.entries.len() > HISTORY_LIMIT {
            self.entries.drain(..self.entries.len() - HISTORY_LIMIT);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&StatsSnapshot> {
        self.entries.last()
    }

    /// The most recent `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> &[StatsSnapshot] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatsSnapshot> {
        self.entries.iter()
    }
}
