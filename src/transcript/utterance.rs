use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is speaking in a transcript frame or utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Whether a transcript frame is an interim or a finalized result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Partial,
    Final,
}

/// One speech-recognition frame as received from the voice provider
///
/// Frames that fail to decode into this shape are dropped at the wire
/// boundary; the assembler only ever sees well-formed frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptFrame {
    pub kind: FrameKind,
    pub role: Role,
    pub text: String,
}

/// A finalized speaker turn, immutable once appended to the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Freshly generated on append
    pub id: Uuid,
    pub role: Role,
    pub text: String,
}

/// The utterance currently in progress, replaced on every partial frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUtterance {
    pub role: Role,
    pub text: String,
}
