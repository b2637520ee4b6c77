use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use crate::core::chat::{Message, MESSAGE_HAPPINESS_BONUS};
use crate::core::dropping::{Dropping, PendingDropping};
use crate::core::engine::{self, Action, Effect, Transition, DEBUG_BATCH_SIZE};
use crate::core::error::Result;
use crate::core::tasks::TASK_HAPPINESS_BONUS;
use crate::core::{BeingColor, Notification, NotificationKind, Snapshot, Stat, StatDelta, StatsSnapshot};

/// Default wait between a meal and the dropping it leaves
pub const DEFAULT_DROPPING_DELAY_MS: i64 = 1500;

/// Sole owner of a being's saved state.
///
/// Every trigger (user action, decay tick, due dropping) goes through
/// `&mut Session`, so transitions never interleave. Shared callers wrap it
/// in a single mutex.
#[derive(Debug, Clone)]
pub struct Session {
    snapshot: Snapshot,
    dropping_delay: Duration,
}

impl Session {
    pub fn new(snapshot: Snapshot, dropping_delay: Duration) -> Self {
        Session {
            snapshot,
            dropping_delay,
        }
    }

    pub fn fresh(now: DateTime<Utc>) -> Self {
        Session::new(Snapshot::new(now), Duration::milliseconds(DEFAULT_DROPPING_DELAY_MS))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn dropping_delay(&self) -> Duration {
        self.dropping_delay
    }

    /// Run a user action. Droppings that came due beforehand land first.
    pub fn perform<R: Rng + ?Sized>(&mut self, action: Action, now: DateTime<Utc>, rng: &mut R) -> Vec<Notification> {
        let mut notifications = self.settle(now, rng);
        let transition = engine::perform_action(&self.snapshot.creature(), action, rng);
        notifications.extend(self.apply(transition, now));
        notifications
    }

    /// One passive decay period.
    pub fn tick<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Vec<Notification> {
        let mut notifications = self.settle(now, rng);
        let transition = engine::apply_passive_decay(&self.snapshot.creature());
        notifications.extend(self.apply(transition, now));
        notifications
    }

    /// Turn every pending spawn whose time has come into a dropping.
    pub fn settle<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Vec<Notification> {
        let (due, waiting): (Vec<PendingDropping>, Vec<PendingDropping>) =
            std::mem::take(&mut self.snapshot.pending_droppings)
                .into_iter()
                .partition(|pending| pending.is_due(now));
        self.snapshot.pending_droppings = waiting;

        due.iter()
            .map(|_| {
                self.snapshot.droppings.push(Dropping::new(rng));
                debug!(count = self.snapshot.droppings.len(), "dropping appeared");
                Notification::new(
                    NotificationKind::Soiled,
                    "あっ！",
                    format!("{}がうんちをしたよ。きれいにしてあげよう。", self.snapshot.being.name),
                )
            })
            .collect()
    }

    /// Earliest time a scheduled dropping will land.
    pub fn next_dropping_due(&self) -> Option<DateTime<Utc>> {
        self.snapshot.pending_droppings.iter().map(|p| p.due_at).min()
    }

    /// Flip a task. Completing one makes the being proud.
    pub fn toggle_task(&mut self, id: u32, now: DateTime<Utc>) -> Result<Option<Notification>> {
        let completed = self.snapshot.tasks.toggle(id)?;
        if !completed {
            return Ok(None);
        }

        self.adjust_stats(&StatDelta::from([(Stat::Happiness, TASK_HAPPINESS_BONUS)]), now);
        Ok(Some(Notification::new(
            NotificationKind::TaskCompleted,
            "タスク完了！",
            format!("{}は達成して誇らしい気持ち！", self.snapshot.being.name),
        )))
    }

    /// Log a user message; being talked to cheers the being up.
    pub fn record_user_message(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.snapshot.conversation.push(Message::user(text));
        self.adjust_stats(&StatDelta::from([(Stat::Happiness, MESSAGE_HAPPINESS_BONUS)]), now);
    }

    pub fn record_reply(&mut self, text: impl Into<String>) {
        self.snapshot.conversation.push(Message::being(text));
    }

    pub fn customize(
        &mut self,
        name: Option<String>,
        personality: Option<String>,
        color: Option<BeingColor>,
    ) -> Notification {
        let previous_name = self.snapshot.being.name.clone();
        let being = &mut self.snapshot.being;
        if let Some(name) = name {
            being.name = name;
        }
        if let Some(personality) = personality {
            being.personality = personality;
        }
        if let Some(color) = color {
            being.color = color;
        }

        Notification::new(
            NotificationKind::Customized,
            "変更を保存しました！",
            format!("{}の見た目や性格が変わったよ！", previous_name),
        )
    }

    /// Store the result of an image request; `None` keeps the placeholder.
    pub fn set_image(&mut self, image_url: Option<String>) -> Notification {
        match image_url {
            Some(url) => {
                self.snapshot.being.image_url = Some(url);
                Notification::new(
                    NotificationKind::ImageGenerated,
                    "画像ができました！",
                    format!("{}の新しい姿を見てみよう！", self.snapshot.being.name),
                )
            }
            None => Notification::new(
                NotificationKind::ImageFailed,
                "画像の生成に失敗しました",
                "もう一度試してみてください。",
            ),
        }
    }

    /// Most recent `n` history entries, oldest first.
    pub fn history_tail(&self, n: usize) -> &[StatsSnapshot] {
        self.snapshot.stats_history.tail(n)
    }

    pub fn debug_run<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Vec<Notification> {
        let mut notifications = self.settle(now, rng);
        let transition = engine::run_debug_batch(&self.snapshot.creature(), DEBUG_BATCH_SIZE, rng);
        notifications.extend(self.apply(transition, now));
        notifications
    }

    fn adjust_stats(&mut self, delta: &StatDelta, now: DateTime<Utc>) {
        self.snapshot.being.stats = self.snapshot.being.stats.apply(delta);
        self.snapshot.stats_history.record(&self.snapshot.being.stats, now);
    }

    fn apply(&mut self, transition: Transition, now: DateTime<Utc>) -> Option<Notification> {
        let Transition {
            creature,
            effects,
            notification,
        } = transition;
        self.snapshot.set_creature(creature);

        for effect in effects {
            match effect {
                Effect::RecordStats(stats) => self.snapshot.stats_history.record(&stats, now),
                Effect::ResetHistory(stats) => self.snapshot.stats_history.reset(&stats, now),
                Effect::CancelPendingDroppings => self.snapshot.pending_droppings.clear(),
                Effect::Greet(text) => self.snapshot.conversation.push(Message::being(text)),
                Effect::ScheduleDropping => self
                    .snapshot
                    .pending_droppings
                    .push(PendingDropping::after(now, self.dropping_delay)),
            }
        }

        notification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Sender, Stage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    /// Feed until a dropping gets scheduled.
    fn feed_until_scheduled(session: &mut Session, now: DateTime<Utc>, rng: &mut StdRng) {
        for _ in 0..50 {
            if session.snapshot().being.stat(Stat::Hunger) >= 100 {
                session.tick(now, rng);
            }
            session.perform(Action::Feed, now, rng);
            if !session.snapshot().pending_droppings.is_empty() {
                return;
            }
        }
        panic!("no dropping scheduled after 50 meals");
    }

    #[test]
    fn test_actions_append_history() {
        let now = Utc::now();
        let mut session = Session::fresh(now);
        session.perform(Action::Play, now, &mut rng());

        assert_eq!(session.snapshot().stats_history.len(), 2);
        assert_eq!(
            session.snapshot().stats_history.latest().unwrap().stats,
            session.snapshot().being.stats
        );
    }

    #[test]
    fn test_scheduled_dropping_lands_after_delay() {
        let mut rng = rng();
        let now = Utc::now();
        let mut session = Session::fresh(now);
        feed_until_scheduled(&mut session, now, &mut rng);
        assert!(session.snapshot().droppings.is_empty());

        assert!(session.settle(now, &mut rng).is_empty());

        let later = now + session.dropping_delay();
        let notifications = session.settle(later, &mut rng);
        assert_eq!(notifications[0].kind, NotificationKind::Soiled);
        assert_eq!(session.snapshot().droppings.len(), 1);
        assert!(session.snapshot().pending_droppings.is_empty());
    }

    #[test]
    fn test_clean_leaves_pending_spawns_alone() {
        let mut rng = rng();
        let now = Utc::now();
        let mut session = Session::fresh(now);
        feed_until_scheduled(&mut session, now, &mut rng);

        let notifications = session.perform(Action::Clean, now, &mut rng);
        assert_eq!(notifications.last().unwrap().kind, NotificationKind::AlreadyClean);
        assert_eq!(session.snapshot().pending_droppings.len(), 1);

        session.settle(now + Duration::seconds(5), &mut rng);
        assert_eq!(session.snapshot().droppings.len(), 1);
    }

    #[test]
    fn test_decay_tick_settles_due_droppings_first() {
        let mut rng = rng();
        let now = Utc::now();
        let mut session = Session::fresh(now);
        feed_until_scheduled(&mut session, now, &mut rng);
        let health = session.snapshot().being.stat(Stat::Health);

        let notifications = session.tick(now + Duration::seconds(60), &mut rng);
        assert_eq!(notifications[0].kind, NotificationKind::Soiled);
        assert_eq!(session.snapshot().being.stat(Stat::Health), health - 5);
    }

    #[test]
    fn test_reincarnation_cancels_pending_spawns_and_greets() {
        let mut rng = rng();
        let now = Utc::now();
        let mut session = Session::fresh(now);
        feed_until_scheduled(&mut session, now, &mut rng);

        let mut snapshot = session.snapshot().clone();
        snapshot.evolution.stage = Stage::Terminal;
        snapshot.being.actions_since_final_evolution = 9;
        let mut session = Session::new(snapshot, session.dropping_delay());
        let before = session.snapshot().conversation.len();

        let notifications = session.perform(Action::Play, now, &mut rng);
        assert_eq!(notifications.last().unwrap().kind, NotificationKind::Reincarnated);

        let snapshot = session.snapshot();
        assert!(snapshot.pending_droppings.is_empty());
        assert_eq!(snapshot.stats_history.len(), 1);
        assert_eq!(snapshot.conversation.len(), before + 1);
        assert_eq!(snapshot.conversation.last().unwrap().sender, Sender::Being);
    }

    #[test]
    fn test_completing_task_grants_happiness_once() {
        let now = Utc::now();
        let mut session = Session::fresh(now);
        let happiness = session.snapshot().being.stat(Stat::Happiness);

        let notification = session.toggle_task(1, now).unwrap();
        assert_eq!(notification.unwrap().kind, NotificationKind::TaskCompleted);
        assert_eq!(session.snapshot().being.stat(Stat::Happiness), (happiness + 15).min(100));

        let happiness = session.snapshot().being.stat(Stat::Happiness);
        assert!(session.toggle_task(1, now).unwrap().is_none());
        assert_eq!(session.snapshot().being.stat(Stat::Happiness), happiness);
    }

    #[test]
    fn test_unknown_task_is_an_error() {
        let mut session = Session::fresh(Utc::now());
        assert!(session.toggle_task(42, Utc::now()).is_err());
    }

    #[test]
    fn test_user_message_cheers_up() {
        let now = Utc::now();
        let mut session = Session::fresh(now);
        session.perform(Action::Sleep, now, &mut rng());
        let happiness = session.snapshot().being.stat(Stat::Happiness);

        session.record_user_message("hello", now);
        session.record_reply("piyo!");

        assert_eq!(session.snapshot().being.stat(Stat::Happiness), (happiness + 5).min(100));
        assert_eq!(session.snapshot().conversation.last().unwrap().sender, Sender::Being);
    }

    #[test]
    fn test_customize_keeps_stats() {
        let mut session = Session::fresh(Utc::now());
        let stats = session.snapshot().being.stats.clone();

        let notification = session.customize(Some("ぴよ".to_string()), None, Some(BeingColor::Blue));
        assert_eq!(notification.kind, NotificationKind::Customized);
        assert_eq!(session.snapshot().being.name, "ぴよ");
        assert_eq!(session.snapshot().being.color, BeingColor::Blue);
        assert_eq!(session.snapshot().being.stats, stats);
    }

    #[test]
    fn test_failed_image_keeps_placeholder() {
        let mut session = Session::fresh(Utc::now());
        let notification = session.set_image(None);

        assert!(notification.is_failure());
        assert!(session.snapshot().being.image_url.is_none());
    }

    #[test]
    fn test_debug_run_records_every_step() {
        let now = Utc::now();
        let mut session = Session::fresh(now);
        let expected = engine::run_debug_batch(&session.snapshot().creature(), DEBUG_BATCH_SIZE, &mut rng());
        let recorded = expected
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::RecordStats(_)))
            .count();

        let notifications = session.debug_run(now, &mut rng());

        assert_eq!(notifications.last().unwrap().kind, NotificationKind::DebugRun);
        assert_eq!(session.snapshot().creature(), expected.creature);
        assert_eq!(session.snapshot().stats_history.len(), 1 + recorded);
    }

    #[test]
    fn test_debug_run_near_the_end_of_life_reincarnates() {
        let now = Utc::now();
        let mut snapshot = Snapshot::new(now);
        snapshot.evolution.stage = Stage::Terminal;
        snapshot.being.actions_since_final_evolution = 9;
        snapshot.pending_droppings.push(PendingDropping::after(now, Duration::seconds(5)));
        let mut session = Session::new(snapshot, Duration::milliseconds(DEFAULT_DROPPING_DELAY_MS));

        session.debug_run(now, &mut rng());

        let snapshot = session.snapshot();
        assert!(snapshot.evolution.stage < Stage::Terminal);
        assert_eq!(snapshot.being.actions_since_final_evolution, 0);
        // History restarted at the reincarnation, then every later step was recorded.
        assert!(snapshot.stats_history.len() <= DEBUG_BATCH_SIZE);
        assert!(snapshot.pending_droppings.iter().all(|p| p.due_at == now + session.dropping_delay()));
    }
}
