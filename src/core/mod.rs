pub mod being;
pub mod chat;
pub mod dropping;
pub mod engine;
pub mod error;
pub mod history;
pub mod notification;
pub mod snapshot;
pub mod stats;
pub mod tasks;

pub use being::{Being, BeingColor, EvolutionState, EvolutionType, Form, Stage};
pub use chat::{Conversation, Message, Sender};
pub use dropping::{Dropping, DroppingPosition, PendingDropping};
pub use engine::{apply_passive_decay, perform_action, run_debug_batch, Action, Creature, Effect, Transition};
pub use error::{BeingError, Result};
pub use history::{StatsHistory, StatsSnapshot};
pub use notification::{Notification, NotificationKind};
pub use snapshot::Snapshot;
pub use stats::{apply_stat_changes, Stat, StatDelta, StatVector};
pub use tasks::{Task, TaskList};
