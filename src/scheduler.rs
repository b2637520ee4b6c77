//! Background timers for interactive mode.
//!
//! Two kinds of trigger feed the shared session besides user input: the
//! periodic passive-decay tick, and one-shot timers for droppings that were
//! scheduled by a meal. Each trigger locks the session for exactly one
//! transition and forwards the resulting notifications over a channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::Notification;
use crate::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

pub struct DecayScheduler {
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl DecayScheduler {
    /// Start ticking every `period`; the first tick fires one period from now.
    pub fn start(session: SharedSession, period: Duration, notices: NotificationSender) -> Self {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            decay_loop(session, signal, period, notices).await;
        });

        info!(period_secs = period.as_secs(), "decay scheduler started");
        DecayScheduler {
            shutdown,
            handle: Some(handle),
        }
    }

    pub async fn stop(&mut self) {
        self.shutdown.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("decay scheduler stopped");
    }
}

async fn decay_loop(session: SharedSession, shutdown: Arc<Notify>, period: Duration, notices: NotificationSender) {
    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    let mut rng = StdRng::from_entropy();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => break,

            _ = interval.tick() => {
                let notifications = session.lock().await.tick(Utc::now(), &mut rng);
                debug!("passive decay applied");
                for notification in notifications {
                    if notices.send(notification).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Fire-and-forget timer that lands a scheduled dropping when it comes due.
///
/// If the spawn was already settled by another trigger, or cancelled by a
/// reincarnation, the wake-up finds nothing due and does nothing.
pub fn schedule_dropping(session: SharedSession, due_at: DateTime<Utc>, notices: NotificationSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        let wait = (due_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;

        let mut rng = StdRng::from_entropy();
        let notifications = session.lock().await.settle(Utc::now(), &mut rng);
        for notification in notifications {
            let _ = notices.send(notification);
        }
    })
}

/// Arm a timer for every pending spawn in the session.
pub async fn arm_pending_droppings(session: &SharedSession, notices: &NotificationSender) {
    let due: Vec<DateTime<Utc>> = session
        .lock()
        .await
        .snapshot()
        .pending_droppings
        .iter()
        .map(|pending| pending.due_at)
        .collect();

    for due_at in due {
        schedule_dropping(Arc::clone(session), due_at, notices.clone());
    }
}
