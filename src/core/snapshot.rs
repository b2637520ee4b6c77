use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::being::{Being, EvolutionState};
use super::chat::{Conversation, WELCOME_BACK};
use super::dropping::{Dropping, PendingDropping};
use super::engine::Creature;
use super::error::Result;
use super::history::StatsHistory;
use super::stats::StatVector;
use super::tasks::TaskList;

/// Everything that is saved for one being.
///
/// Older saves lack `health`, `actionsSinceFinalEvolution`, droppings and
/// pending spawns; every field except `being` may be missing and is filled
/// by [`Snapshot::fill_defaults`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub being: Being,
    #[serde(flatten)]
    pub evolution: EvolutionState,
    #[serde(default)]
    pub tasks: TaskList,
    #[serde(default)]
    pub conversation: Conversation,
    #[serde(default)]
    pub stats_history: StatsHistory,
    #[serde(default)]
    pub droppings: Vec<Dropping>,
    #[serde(default)]
    pub pending_droppings: Vec<PendingDropping>,
}

impl Snapshot {
    /// A newly hatched being with the default checklist.
    pub fn new(now: DateTime<Utc>) -> Self {
        let being = Being::default();
        Snapshot {
            conversation: Conversation::opened_with(being.greeting()),
            stats_history: StatsHistory::starting_with(&being.stats, now),
            being,
            evolution: EvolutionState::default(),
            tasks: TaskList::default(),
            droppings: Vec::new(),
            pending_droppings: Vec::new(),
        }
    }

    /// Parse a saved document and fill whatever an older revision left out.
    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self> {
        let mut document: serde_json::Value = serde_json::from_str(json)?;
        nest_flat_being(&mut document);
        let mut snapshot: Snapshot = serde_json::from_value(document)?;
        snapshot.fill_defaults(now);
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn fill_defaults(&mut self, now: DateTime<Utc>) {
        self.being.stats.fill_missing(&StatVector::initial());
        if self.conversation.is_empty() {
            self.conversation = Conversation::opened_with(WELCOME_BACK);
        }
        if self.stats_history.is_empty() {
            self.stats_history = StatsHistory::starting_with(&self.being.stats, now);
        }
        self.stats_history.truncate();
    }

    pub fn creature(&self) -> Creature {
        Creature {
            being: self.being.clone(),
            evolution: self.evolution,
            droppings: self.droppings.clone(),
        }
    }

    pub fn set_creature(&mut self, creature: Creature) {
        self.being = creature.being;
        self.evolution = creature.evolution;
        self.droppings = creature.droppings;
    }
}

/// Fields of [`Being`] as they appear in a saved document
const BEING_FIELDS: [&str; 6] = ["name", "personality", "color", "stats", "imageUrl", "actionsSinceFinalEvolution"];

/// Cloud saves spread the being's fields over the top level instead of
/// nesting them under `being`. Move them back into place.
fn nest_flat_being(document: &mut serde_json::Value) {
    let Some(fields) = document.as_object_mut() else {
        return;
    };
    if fields.contains_key("being") || !(fields.contains_key("name") || fields.contains_key("stats")) {
        return;
    }

    let being: serde_json::Map<String, serde_json::Value> = BEING_FIELDS
        .iter()
        .filter_map(|key| fields.remove(*key).map(|value| (key.to_string(), value)))
        .collect();
    fields.insert("being".to_string(), serde_json::Value::Object(being));
}
