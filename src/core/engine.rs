//! Being lifecycle rules.
//!
//! Every function here is a total transition over a [`Creature`]: it reads
//! the old record, decides, and returns the new record together with the
//! follow-up [`Effect`]s the session has to carry out. Nothing in this
//! module touches history, conversation or the clock directly.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::being::{Being, EvolutionState, EvolutionType, Form, Stage};
use super::dropping::{Dropping, DROPPING_CHANCE, HEALTH_LOST_PER_DROPPING, HEALTH_PER_CLEANED_DROPPING};
use super::notification::{Notification, NotificationKind};
use super::stats::{Stat, StatDelta, StatVector, STAT_MAX};

/// Sleeps needed to grow from hatchling to adolescent
pub const ADOLESCENT_SLEEP_COUNT: u32 = 5;
/// Sleeps needed to reach the terminal stage
pub const TERMINAL_SLEEP_COUNT: u32 = 10;
/// Pre-sleep happiness above which the terminal form is a queen
pub const QUEEN_HAPPINESS_THRESHOLD: i32 = 80;
/// Non-clean actions in the terminal stage before reincarnation
pub const REINCARNATION_ACTION_COUNT: u32 = 10;
/// Actions performed by one debug batch
pub const DEBUG_BATCH_SIZE: usize = 10;

/// Something the user can do to the being
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Feed,
    Play,
    Sleep,
    Clean,
}

impl Action {
    pub fn delta(&self) -> StatDelta {
        match self {
            Action::Feed => StatDelta::from([
                (Stat::Hunger, 20),
                (Stat::Happiness, 5),
                (Stat::Energy, -5),
                (Stat::Strength, 10),
            ]),
            Action::Play => StatDelta::from([(Stat::Hunger, -10), (Stat::Happiness, 20), (Stat::Energy, -15)]),
            Action::Sleep => StatDelta::from([(Stat::Hunger, -5), (Stat::Happiness, 5), (Stat::Energy, 40)]),
            Action::Clean => StatDelta::new(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Feed => write!(f, "feed"),
            Action::Play => write!(f, "play"),
            Action::Sleep => write!(f, "sleep"),
            Action::Clean => write!(f, "clean"),
        }
    }
}

impl std::str::FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "feed" => Ok(Action::Feed),
            "play" => Ok(Action::Play),
            "sleep" => Ok(Action::Sleep),
            "clean" => Ok(Action::Clean),
            _ => Err(anyhow::anyhow!("Unknown action: {}", s)),
        }
    }
}

/// Passive decay applied once per period
pub fn decay_delta() -> StatDelta {
    StatDelta::from([(Stat::Hunger, -2), (Stat::Happiness, -1), (Stat::Energy, -1)])
}

/// The part of the session the lifecycle rules operate on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Creature {
    pub being: Being,
    pub evolution: EvolutionState,
    pub droppings: Vec<Dropping>,
}

impl Creature {
    pub fn form(&self) -> Form {
        self.evolution.form()
    }
}

/// Follow-up work a transition asks of its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stats changed; append this history snapshot
    RecordStats(StatVector),
    /// Replace the history with a single fresh snapshot
    ResetHistory(StatVector),
    /// Drop every scheduled dropping spawn
    CancelPendingDroppings,
    /// Append a being message to the conversation
    Greet(String),
    /// Spawn a dropping after the configured delay
    ScheduleDropping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub creature: Creature,
    pub effects: Vec<Effect>,
    pub notification: Option<Notification>,
}

impl Transition {
    fn unchanged(creature: &Creature, notification: Notification) -> Self {
        Transition {
            creature: creature.clone(),
            effects: Vec::new(),
            notification: Some(notification),
        }
    }
}

/// Apply `action` to `creature`.
///
/// The only randomness is the dropping roll on `feed`.
pub fn perform_action<R: Rng + ?Sized>(creature: &Creature, action: Action, rng: &mut R) -> Transition {
    let mut next = creature.clone();

    if next.evolution.is_terminal() && action != Action::Clean {
        next.being.actions_since_final_evolution += 1;
        if next.being.actions_since_final_evolution >= REINCARNATION_ACTION_COUNT {
            return reincarnate(creature);
        }
    }

    match action {
        Action::Feed => feed(next, rng),
        Action::Play => {
            next.being.stats = next.being.stats.apply(&action.delta());
            let description = format!("{}の様子が少し変わったよ。", next.being.name);
            Transition {
                effects: vec![Effect::RecordStats(next.being.stats.clone())],
                creature: next,
                notification: Some(Notification::new(NotificationKind::Played, "楽しかった！", description)),
            }
        }
        Action::Sleep => sleep(next),
        Action::Clean => clean(next),
    }
}

fn feed<R: Rng + ?Sized>(mut next: Creature, rng: &mut R) -> Transition {
    if next.being.stat(Stat::Hunger) >= STAT_MAX {
        let description = format!("{}はもうおなかがいっぱいのようだ。", next.being.name);
        return Transition::unchanged(&next, Notification::new(NotificationKind::Full, "おなかいっぱい！", description));
    }

    next.being.stats = next.being.stats.apply(&Action::Feed.delta());

    let mut effects = vec![Effect::RecordStats(next.being.stats.clone())];
    if rng.gen_bool(DROPPING_CHANCE) {
        debug!("feeding will leave a dropping behind");
        effects.push(Effect::ScheduleDropping);
    }

    let description = format!("{}の様子が少し変わったよ。", next.being.name);
    Transition {
        creature: next,
        effects,
        notification: Some(Notification::new(NotificationKind::Fed, "おいしい！", description)),
    }
}

fn sleep(mut next: Creature) -> Transition {
    // Decision inputs come from the record as it was before this sleep.
    let sleep_count = next.evolution.sleep_count + 1;
    let stage = next.evolution.stage;
    let happiness_before = next.being.stat(Stat::Happiness);
    let previous_name = next.being.name.clone();

    next.evolution.sleep_count = sleep_count;
    next.being.stats = next.being.stats.apply(&Action::Sleep.delta());

    let notification = if sleep_count >= TERMINAL_SLEEP_COUNT && stage < Stage::Terminal {
        let kind = if happiness_before > QUEEN_HAPPINESS_THRESHOLD {
            EvolutionType::Queen
        } else {
            EvolutionType::King
        };
        next.evolution.stage = Stage::Terminal;
        next.evolution.kind = Some(kind);
        next.being.assume_form(next.evolution.form());
        next.being.actions_since_final_evolution = 0;
        info!(%kind, happiness_before, "being reached its final form");

        let (title, description) = match kind {
            EvolutionType::Queen => (
                "究極の進化！",
                format!("{}が、気品あふれる{}に進化した！", previous_name, next.being.name),
            ),
            EvolutionType::King => (
                "さらなる進化！",
                format!("{}が、威厳ある{}に進化した！", previous_name, next.being.name),
            ),
        };
        Notification::new(
            NotificationKind::Evolved {
                stage: Stage::Terminal,
                kind: Some(kind),
            },
            title,
            description,
        )
    } else if sleep_count >= ADOLESCENT_SLEEP_COUNT && stage < Stage::Adolescent {
        next.evolution.stage = Stage::Adolescent;
        next.being.assume_form(next.evolution.form());
        info!(sleep_count, "being grew up");

        Notification::new(
            NotificationKind::Evolved {
                stage: Stage::Adolescent,
                kind: None,
            },
            "おめでとう！",
            format!("{}が、りっぱなニワトリに進化した！", previous_name),
        )
    } else {
        Notification::new(
            NotificationKind::WokeUp,
            "おはよう！",
            format!("{}の様子が少し変わったよ。", next.being.name),
        )
    };

    Transition {
        effects: vec![Effect::RecordStats(next.being.stats.clone())],
        creature: next,
        notification: Some(notification),
    }
}

fn clean(mut next: Creature) -> Transition {
    if next.droppings.is_empty() {
        let description = format!("{}のまわりはもうきれいだよ。", next.being.name);
        return Transition::unchanged(&next, Notification::new(NotificationKind::AlreadyClean, "きれいだよ！", description));
    }

    let count = next.droppings.len();
    let gain = HEALTH_PER_CLEANED_DROPPING * count as i32;
    next.being.stats = next.being.stats.apply(&StatDelta::from([(Stat::Health, gain)]));
    next.droppings.clear();

    let description = format!("{}個のうんちを片付けた。{}は元気になった！", count, next.being.name);
    Transition {
        effects: vec![Effect::RecordStats(next.being.stats.clone())],
        creature: next,
        notification: Some(Notification::new(NotificationKind::Cleaned { count }, "ピカピカ！", description)),
    }
}

/// Start a new life: defaults everywhere, keeping only the colour.
pub fn reincarnate(creature: &Creature) -> Transition {
    let being = Being::with_color(creature.being.color);
    info!(previous = %creature.being.name, "being reincarnated");

    let notification = Notification::new(
        NotificationKind::Reincarnated,
        "転生！",
        format!("{}は新しい命として生まれ変わった。", creature.being.name),
    );
    let greeting = being.greeting();
    let fresh_stats = being.stats.clone();

    Transition {
        creature: Creature {
            being,
            evolution: EvolutionState::default(),
            droppings: Vec::new(),
        },
        effects: vec![Effect::ResetHistory(fresh_stats), Effect::CancelPendingDroppings, Effect::Greet(greeting)],
        notification: Some(notification),
    }
}

/// One period of time passing. Uncleaned droppings hurt health in the same update.
pub fn apply_passive_decay(creature: &Creature) -> Transition {
    let mut delta = decay_delta();
    if !creature.droppings.is_empty() {
        delta = delta.with(Stat::Health, -HEALTH_LOST_PER_DROPPING * creature.droppings.len() as i32);
    }

    let mut next = creature.clone();
    next.being.stats = next.being.stats.apply(&delta);

    Transition {
        effects: vec![Effect::RecordStats(next.being.stats.clone())],
        creature: next,
        notification: None,
    }
}

/// Perform `count` random feed/play/sleep actions in a row.
pub fn run_debug_batch<R: Rng + ?Sized>(creature: &Creature, count: usize, rng: &mut R) -> Transition {
    const CHOICES: [Action; 3] = [Action::Feed, Action::Play, Action::Sleep];

    let mut current = creature.clone();
    let mut effects = Vec::new();
    for _ in 0..count {
        let action = *CHOICES.choose(rng).unwrap_or(&Action::Play);
        debug!(%action, "debug batch step");
        let transition = perform_action(&current, action, rng);
        effects.extend(transition.effects);
        current = transition.creature;
    }

    Transition {
        creature: current,
        effects,
        notification: Some(Notification::new(
            NotificationKind::DebugRun,
            "デバッグ実行！",
            format!("お世話を{}回ランダムで行いました。", count),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::being::BeingColor;
    use crate::core::stats::StatVector;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn creature_with(stats: &[(Stat, i32)]) -> Creature {
        let mut creature = Creature::default();
        creature.being.stats = StatVector::from_pairs(stats.iter().copied());
        creature
    }

    fn kind(transition: &Transition) -> NotificationKind {
        transition.notification.as_ref().map(|n| n.kind).unwrap()
    }

    #[test]
    fn test_feed_when_full_is_noop() {
        let creature = creature_with(&[(Stat::Hunger, 100), (Stat::Happiness, 50)]);
        let transition = perform_action(&creature, Action::Feed, &mut rng());

        assert_eq!(kind(&transition), NotificationKind::Full);
        assert_eq!(transition.creature, creature);
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_feed_applies_delta() {
        let creature = Creature::default();
        let transition = perform_action(&creature, Action::Feed, &mut rng());
        let stats = &transition.creature.being.stats;

        assert_eq!(kind(&transition), NotificationKind::Fed);
        assert_eq!(stats.get(Stat::Hunger), 90);
        assert_eq!(stats.get(Stat::Happiness), 85);
        assert_eq!(stats.get(Stat::Energy), 55);
        assert_eq!(stats.get(Stat::Strength), 60);
        assert_eq!(transition.effects[0], Effect::RecordStats(stats.clone()));
    }

    #[test]
    fn test_feed_dropping_rate_is_roughly_forty_percent() {
        let mut rng = rng();
        let creature = creature_with(&[(Stat::Hunger, 0)]);
        let scheduled = (0..2000)
            .map(|_| perform_action(&creature, Action::Feed, &mut rng))
            .filter(|t| t.effects.contains(&Effect::ScheduleDropping))
            .count();

        assert!((700..=900).contains(&scheduled), "scheduled {}", scheduled);
    }

    #[test]
    fn test_play_applies_delta() {
        let transition = perform_action(&Creature::default(), Action::Play, &mut rng());
        let stats = &transition.creature.being.stats;

        assert_eq!(stats.get(Stat::Hunger), 60);
        assert_eq!(stats.get(Stat::Happiness), 100);
        assert_eq!(stats.get(Stat::Energy), 45);
        assert_eq!(kind(&transition), NotificationKind::Played);
    }

    #[test]
    fn test_five_sleeps_grow_a_chicken() {
        let mut rng = rng();
        let mut creature = Creature::default();
        for _ in 0..4 {
            let transition = perform_action(&creature, Action::Sleep, &mut rng);
            assert_eq!(kind(&transition), NotificationKind::WokeUp);
            creature = transition.creature;
        }
        let energy_before = creature.being.stat(Stat::Energy);
        let hunger_before = creature.being.stat(Stat::Hunger);

        let transition = perform_action(&creature, Action::Sleep, &mut rng);
        let grown = &transition.creature;

        assert_eq!(grown.evolution.stage, Stage::Adolescent);
        assert_eq!(grown.evolution.sleep_count, 5);
        assert_eq!(grown.being.name, Form::Chicken.name());
        assert_eq!(grown.being.stat(Stat::Energy), (energy_before + 40).min(100));
        assert_eq!(grown.being.stat(Stat::Hunger), hunger_before - 5);
        assert!(matches!(
            kind(&transition),
            NotificationKind::Evolved { stage: Stage::Adolescent, kind: None }
        ));
    }

    #[test]
    fn test_evolution_clears_generated_image() {
        let mut creature = Creature::default();
        creature.evolution.sleep_count = 4;
        creature.being.image_url = Some("https://img.example/chick.png".to_string());

        let transition = perform_action(&creature, Action::Sleep, &mut rng());
        assert!(transition.creature.being.image_url.is_none());
    }

    fn adolescent_at_nine(happiness: i32) -> Creature {
        let mut creature = creature_with(&[(Stat::Hunger, 50), (Stat::Happiness, happiness), (Stat::Energy, 50)]);
        creature.evolution = EvolutionState {
            stage: Stage::Adolescent,
            kind: None,
            sleep_count: 9,
        };
        creature
    }

    #[test]
    fn test_happy_adolescent_becomes_queen() {
        let transition = perform_action(&adolescent_at_nine(81), Action::Sleep, &mut rng());
        let creature = &transition.creature;

        assert_eq!(creature.evolution.stage, Stage::Terminal);
        assert_eq!(creature.evolution.kind, Some(EvolutionType::Queen));
        assert_eq!(creature.being.name, Form::Queen.name());
        assert_eq!(creature.being.actions_since_final_evolution, 0);
    }

    #[test]
    fn test_queen_branch_reads_happiness_before_sleep() {
        // 78 + 5 would cross the threshold if read after the delta.
        let transition = perform_action(&adolescent_at_nine(78), Action::Sleep, &mut rng());
        assert_eq!(transition.creature.evolution.kind, Some(EvolutionType::King));
        assert_eq!(transition.creature.being.stat(Stat::Happiness), 83);
    }

    #[test]
    fn test_exactly_eighty_becomes_king() {
        let transition = perform_action(&adolescent_at_nine(80), Action::Sleep, &mut rng());
        assert_eq!(transition.creature.evolution.kind, Some(EvolutionType::King));
        assert_eq!(transition.creature.being.name, Form::King.name());
    }

    #[test]
    fn test_terminal_sleep_does_not_evolve_again() {
        let mut creature = adolescent_at_nine(90);
        creature.evolution.stage = Stage::Terminal;
        creature.evolution.kind = Some(EvolutionType::Queen);

        let transition = perform_action(&creature, Action::Sleep, &mut rng());
        assert_eq!(kind(&transition), NotificationKind::WokeUp);
        assert_eq!(transition.creature.evolution.kind, Some(EvolutionType::Queen));
        assert_eq!(transition.creature.being.actions_since_final_evolution, 1);
    }

    #[test]
    fn test_tenth_terminal_action_reincarnates() {
        let mut rng = rng();
        let mut creature = adolescent_at_nine(90);
        creature.being.color = BeingColor::Green;
        creature = perform_action(&creature, Action::Sleep, &mut rng).creature;
        assert!(creature.evolution.is_terminal());

        for _ in 0..9 {
            let transition = perform_action(&creature, Action::Play, &mut rng);
            assert_eq!(kind(&transition), NotificationKind::Played);
            creature = transition.creature;
        }
        assert_eq!(creature.being.actions_since_final_evolution, 9);

        let transition = perform_action(&creature, Action::Play, &mut rng);
        assert_eq!(kind(&transition), NotificationKind::Reincarnated);

        let reborn = &transition.creature;
        assert_eq!(reborn.evolution, EvolutionState::default());
        assert_eq!(reborn.being, Being::with_color(BeingColor::Green));
        assert!(transition.effects.contains(&Effect::ResetHistory(StatVector::initial())));
        assert!(transition.effects.contains(&Effect::CancelPendingDroppings));
        assert!(matches!(transition.effects.last(), Some(Effect::Greet(_))));
    }

    #[test]
    fn test_clean_does_not_count_toward_reincarnation() {
        let mut creature = adolescent_at_nine(50);
        creature.evolution.stage = Stage::Terminal;
        creature.being.actions_since_final_evolution = 9;

        let transition = perform_action(&creature, Action::Clean, &mut rng());
        assert_eq!(kind(&transition), NotificationKind::AlreadyClean);
        assert_eq!(transition.creature.being.actions_since_final_evolution, 9);
    }

    #[test]
    fn test_reincarnation_clears_droppings() {
        let mut rng = rng();
        let mut creature = adolescent_at_nine(50);
        creature.evolution.stage = Stage::Terminal;
        creature.being.actions_since_final_evolution = 9;
        creature.droppings.push(Dropping::new(&mut rng));

        let transition = perform_action(&creature, Action::Feed, &mut rng);
        assert!(transition.creature.droppings.is_empty());
    }

    #[test]
    fn test_clean_without_droppings() {
        let creature = Creature::default();
        let transition = perform_action(&creature, Action::Clean, &mut rng());

        assert_eq!(kind(&transition), NotificationKind::AlreadyClean);
        assert_eq!(transition.creature, creature);
    }

    #[test]
    fn test_clean_restores_health_per_dropping() {
        let mut rng = rng();
        let mut creature = creature_with(&[(Stat::Health, 98)]);
        for _ in 0..3 {
            creature.droppings.push(Dropping::new(&mut rng));
        }

        let transition = perform_action(&creature, Action::Clean, &mut rng);
        assert!(transition.creature.droppings.is_empty());
        assert_eq!(transition.creature.being.stat(Stat::Health), 113);
        assert_eq!(kind(&transition), NotificationKind::Cleaned { count: 3 });
    }

    #[test]
    fn test_passive_decay_without_droppings() {
        let creature = Creature::default();
        let transition = apply_passive_decay(&creature);
        let stats = &transition.creature.being.stats;

        assert_eq!(stats.get(Stat::Hunger), 68);
        assert_eq!(stats.get(Stat::Happiness), 79);
        assert_eq!(stats.get(Stat::Energy), 59);
        assert_eq!(stats.get(Stat::Strength), 50);
        assert_eq!(stats.get(Stat::Health), 100);
        assert!(transition.notification.is_none());
    }

    #[test]
    fn test_passive_decay_with_droppings_hurts_health() {
        let mut rng = rng();
        let mut creature = Creature::default();
        creature.droppings.push(Dropping::new(&mut rng));
        creature.droppings.push(Dropping::new(&mut rng));

        let transition = apply_passive_decay(&creature);
        let next = &transition.creature;

        assert_eq!(next.being.stat(Stat::Health), 90);
        assert_eq!(next.being.stat(Stat::Hunger), 68);
        assert_eq!(next.droppings.len(), 2);
        assert_eq!(next.evolution, creature.evolution);
    }

    #[test]
    fn test_debug_batch_runs_every_step() {
        // In the terminal stage every feed/play/sleep bumps the counter,
        // full or not, so the count shows how many steps actually ran.
        let mut creature = Creature::default();
        creature.evolution.stage = Stage::Terminal;
        creature.evolution.kind = Some(EvolutionType::King);

        let transition = run_debug_batch(&creature, DEBUG_BATCH_SIZE - 1, &mut rng());
        assert_eq!(transition.creature.evolution.stage, Stage::Terminal);
        assert_eq!(
            transition.creature.being.actions_since_final_evolution,
            DEBUG_BATCH_SIZE as u32 - 1
        );
        assert_eq!(kind(&transition), NotificationKind::DebugRun);

        let transition = run_debug_batch(&creature, DEBUG_BATCH_SIZE, &mut rng());
        assert_eq!(transition.creature, Creature {
            being: Being::with_color(creature.being.color),
            ..Creature::default()
        });
        assert!(matches!(
            transition.effects.as_slice(),
            [.., Effect::ResetHistory(_), Effect::CancelPendingDroppings, Effect::Greet(_)]
        ));
    }

    #[test]
    fn test_debug_batch_records_every_stat_change() {
        let mut rng = rng();
        let transition = run_debug_batch(&Creature::default(), DEBUG_BATCH_SIZE, &mut rng);
        let records: Vec<&StatVector> = transition
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::RecordStats(stats) => Some(stats),
                _ => None,
            })
            .collect();

        assert!(!records.is_empty());
        assert_eq!(records.last().copied(), Some(&transition.creature.being.stats));
    }

    #[test]
    fn test_debug_batch_from_ninth_terminal_action_reincarnates() {
        let mut creature = Creature::default();
        creature.evolution.stage = Stage::Terminal;
        creature.evolution.kind = Some(EvolutionType::Queen);
        creature.evolution.sleep_count = 10;
        creature.being.color = BeingColor::Accent;
        creature.being.actions_since_final_evolution = 9;

        let transition = run_debug_batch(&creature, DEBUG_BATCH_SIZE, &mut rng());

        // The first step reincarnates; the remaining nine cannot reach the terminal stage again.
        assert!(matches!(
            transition.effects.as_slice(),
            [Effect::ResetHistory(_), Effect::CancelPendingDroppings, Effect::Greet(_), ..]
        ));
        assert!(transition.creature.evolution.stage < Stage::Terminal);
        assert!(transition.creature.evolution.sleep_count <= DEBUG_BATCH_SIZE as u32 - 1);
        assert_eq!(transition.creature.evolution.kind, None);
        assert_eq!(transition.creature.being.color, BeingColor::Accent);
        assert_eq!(transition.creature.being.actions_since_final_evolution, 0);
    }
}
