use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chance that a meal leaves a mess behind
pub const DROPPING_CHANCE: f64 = 0.4;

/// Health restored per dropping removed by cleaning
pub const HEALTH_PER_CLEANED_DROPPING: i32 = 5;

/// Health lost per uncleaned dropping on each decay tick
pub const HEALTH_LOST_PER_DROPPING: i32 = 5;

/// Where on the play area a dropping sits, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppingPosition {
    pub top: u8,
    pub left: u8,
}

impl DroppingPosition {
    /// Somewhere in the lower half, away from the edges.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        DroppingPosition {
            top: rng.gen_range(55..=85),
            left: rng.gen_range(10..=80),
        }
    }
}

/// A mess left behind after feeding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropping {
    pub id: Uuid,
    pub position: DroppingPosition,
}

impl Dropping {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Dropping {
            id: Uuid::new_v4(),
            position: DroppingPosition::random(rng),
        }
    }
}

/// A dropping that has been scheduled but has not appeared yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDropping {
    pub due_at: DateTime<Utc>,
}

impl PendingDropping {
    pub fn after(now: DateTime<Utc>, delay: Duration) -> Self {
        PendingDropping { due_at: now + delay }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}
