use serde::{Deserialize, Serialize};

use super::being::{EvolutionType, Stage};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Full,
    Fed,
    Soiled,
    Played,
    WokeUp,
    Evolved {
        stage: Stage,
        kind: Option<EvolutionType>,
    },
    Reincarnated,
    AlreadyClean,
    Cleaned {
        count: usize,
    },
    TaskCompleted,
    Customized,
    DebugRun,
    ImageGenerated,
    ImageFailed,
    ReplyFailed,
    Saved,
    SaveFailed,
    LoadFailed,
}

/// User-facing message produced by an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Notification {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Failures are shown in red by the CLI.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            NotificationKind::ImageFailed
                | NotificationKind::ReplyFailed
                | NotificationKind::SaveFailed
                | NotificationKind::LoadFailed
        )
    }
}
