use crate::transcript::PendingUtterance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one voice call
///
/// Legal transitions: `Idle → Connecting → Active → Ending → Idle`, plus
/// `Connecting → Idle` on immediate failure. Transitions are the only way
/// the state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    Idle,
    Connecting,
    Active,
    Ending,
}

/// Who is speaking right now, derived from speech boundary events
///
/// Tracked separately from transcript roles because speech boundaries and
/// transcript frames can race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentSpeaker {
    User,
    Assistant,
}

/// A single-line user-visible notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Config,
    ChannelError,
    ReportFailure,
}

/// Point-in-time snapshot of a consultation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStatus {
    pub session_id: String,
    pub state: CallState,

    /// A start or stop is in flight; re-entrant requests are ignored
    pub busy: bool,

    pub current_speaker: CurrentSpeaker,

    /// When the call reached `Active`, if it has
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since the call became active
    pub duration_secs: Option<f64>,

    /// Finalized utterances so far
    pub utterance_count: usize,

    /// The utterance currently being spoken
    pub in_progress: Option<PendingUtterance>,

    /// Most recent user-visible notification
    pub last_notice: Option<Notice>,
}
