use super::utterance::{FrameKind, PendingUtterance, TranscriptFrame, Utterance};
use uuid::Uuid;

/// Accumulates speech-recognition frames into a consultation transcript
///
/// A partial frame replaces the in-progress utterance and never touches the
/// finalized log. A final frame appends one immutable entry to the log and
/// clears the in-progress utterance. Insertion order is chronological order.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    in_progress: Option<PendingUtterance>,
    log: Vec<Utterance>,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded frame from the realtime channel
    pub fn apply(&mut self, frame: TranscriptFrame) {
        match frame.kind {
            FrameKind::Partial => {
                self.in_progress = Some(PendingUtterance {
                    role: frame.role,
                    text: frame.text,
                });
            }
            FrameKind::Final => {
                self.log.push(Utterance {
                    id: Uuid::new_v4(),
                    role: frame.role,
                    text: frame.text,
                });
                self.in_progress = None;
            }
        }
    }

    /// The utterance currently being spoken, if any
    pub fn in_progress(&self) -> Option<&PendingUtterance> {
        self.in_progress.as_ref()
    }

    /// Read-only view of the finalized log
    pub fn log(&self) -> &[Utterance] {
        &self.log
    }

    /// The last `n` finalized utterances, for display
    pub fn tail(&self, n: usize) -> &[Utterance] {
        let start = self.log.len().saturating_sub(n);
        &self.log[start..]
    }

    /// Drop the in-progress utterance, keeping the finalized log
    pub fn clear_in_progress(&mut self) {
        self.in_progress = None;
    }

    /// Clear everything for a fresh call
    pub fn reset(&mut self) {
        self.in_progress = None;
        self.log.clear();
    }
}
