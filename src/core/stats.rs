use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound for every bounded stat.
pub const STAT_MAX: i32 = 100;

/// A named numeric attribute of the being
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Hunger,
    Happiness,
    Energy,
    Strength,
    Health,
}

impl Stat {
    pub const ALL: [Stat; 5] = [
        Stat::Hunger,
        Stat::Happiness,
        Stat::Energy,
        Stat::Strength,
        Stat::Health,
    ];

    /// Strength and health only have a floor.
    pub fn is_unbounded(self) -> bool {
        matches!(self, Stat::Strength | Stat::Health)
    }

    pub fn clamp(self, value: i32) -> i32 {
        if self.is_unbounded() {
            value.max(0)
        } else {
            value.clamp(0, STAT_MAX)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stat::Hunger => "Hunger",
            Stat::Happiness => "Happiness",
            Stat::Energy => "Energy",
            Stat::Strength => "Strength",
            Stat::Health => "Health",
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stat::Hunger => write!(f, "hunger"),
            Stat::Happiness => write!(f, "happiness"),
            Stat::Energy => write!(f, "energy"),
            Stat::Strength => write!(f, "strength"),
            Stat::Health => write!(f, "health"),
        }
    }
}

/// Stat name to value. Stats that were never written read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatVector(BTreeMap<Stat, i32>);

impl StatVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values a freshly hatched being starts with
    pub fn initial() -> Self {
        Self::from_pairs([
            (Stat::Hunger, 70),
            (Stat::Happiness, 80),
            (Stat::Energy, 60),
            (Stat::Strength, 50),
            (Stat::Health, 100),
        ])
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Stat, i32)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, stat: Stat) -> i32 {
        self.0.get(&stat).copied().unwrap_or(0)
    }

    pub fn contains(&self, stat: Stat) -> bool {
        self.0.contains_key(&stat)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        self.0.iter().map(|(stat, value)| (*stat, *value))
    }

    /// Fill every stat absent from `self` with the value from `defaults`.
    pub fn fill_missing(&mut self, defaults: &StatVector) {
        for (stat, value) in defaults.iter() {
            self.0.entry(stat).or_insert(value);
        }
    }

    /// Add `delta` to the current values and clamp each touched stat.
    ///
    /// Only stats named in the delta are written; an empty delta returns an
    /// equal vector.
    pub fn apply(&self, delta: &StatDelta) -> StatVector {
        let mut next = self.clone();
        for (stat, change) in delta.iter() {
            let value = stat.clamp(self.get(stat).saturating_add(change));
            next.0.insert(stat, value);
        }
        next
    }
}

/// Signed per-stat change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatDelta(BTreeMap<Stat, i32>);

impl StatDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `change` for `stat`, summing with any change already present.
    pub fn with(mut self, stat: Stat, change: i32) -> Self {
        *self.0.entry(stat).or_insert(0) += change;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, stat: Stat) -> Option<i32> {
        self.0.get(&stat).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        self.0.iter().map(|(stat, change)| (*stat, *change))
    }
}

impl<const N: usize> From<[(Stat, i32); N]> for StatDelta {
    fn from(pairs: [(Stat, i32); N]) -> Self {
        pairs
            .into_iter()
            .fold(StatDelta::new(), |delta, (stat, change)| delta.with(stat, change))
    }
}

/// Free-function form of [`StatVector::apply`].
pub fn apply_stat_changes(current: &StatVector, delta: &StatDelta) -> StatVector {
    current.apply(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_stats_are_clamped() {
        let current = StatVector::from_pairs([(Stat::Hunger, 95), (Stat::Energy, 3)]);
        let delta = StatDelta::from([(Stat::Hunger, 20), (Stat::Energy, -15)]);

        let next = apply_stat_changes(&current, &delta);
        assert_eq!(next.get(Stat::Hunger), 100);
        assert_eq!(next.get(Stat::Energy), 0);
    }

    #[test]
    fn test_strength_and_health_have_no_ceiling() {
        let current = StatVector::from_pairs([(Stat::Strength, 95), (Stat::Health, 98)]);
        let delta = StatDelta::from([(Stat::Strength, 10), (Stat::Health, 25)]);

        let next = current.apply(&delta);
        assert_eq!(next.get(Stat::Strength), 105);
        assert_eq!(next.get(Stat::Health), 123);

        let drained = next.apply(&StatDelta::from([(Stat::Strength, -500), (Stat::Health, -500)]));
        assert_eq!(drained.get(Stat::Strength), 0);
        assert_eq!(drained.get(Stat::Health), 0);
    }

    #[test]
    fn test_missing_stat_reads_as_zero() {
        let current = StatVector::from_pairs([(Stat::Hunger, 40)]);
        assert_eq!(current.get(Stat::Health), 0);

        let next = current.apply(&StatDelta::from([(Stat::Health, 5)]));
        assert_eq!(next.get(Stat::Health), 5);
        assert_eq!(next.get(Stat::Hunger), 40);
    }

    #[test]
    fn test_empty_delta_is_identity() {
        let current = StatVector::initial();
        assert_eq!(current.apply(&StatDelta::new()), current);

        let sparse = StatVector::from_pairs([(Stat::Energy, 12)]);
        assert_eq!(sparse.apply(&StatDelta::new()), sparse);
    }

    #[test]
    fn test_untouched_stats_are_not_materialized() {
        let current = StatVector::from_pairs([(Stat::Hunger, 40)]);
        let next = current.apply(&StatDelta::from([(Stat::Energy, 1)]));
        assert!(!next.contains(Stat::Happiness));
    }

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut stats = StatVector::from_pairs([(Stat::Hunger, 10)]);
        stats.fill_missing(&StatVector::initial());

        assert_eq!(stats.get(Stat::Hunger), 10);
        assert_eq!(stats.get(Stat::Health), 100);
        assert_eq!(stats.get(Stat::Strength), 50);
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let stats = StatVector::from_pairs([(Stat::Hunger, 70), (Stat::Health, 100)]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({"hunger": 70, "health": 100}));
    }
}
