//! Transcript assembly for a live voice consultation
//!
//! This module turns the stream of partial/final speech-recognition frames
//! coming off the realtime channel into:
//! - the utterance currently being spoken (replaced wholesale on every
//!   partial frame)
//! - an ordered, append-only log of finalized utterances

mod assembler;
mod utterance;

pub use assembler::TranscriptAssembler;
pub use utterance::{FrameKind, PendingUtterance, Role, TranscriptFrame, Utterance};
