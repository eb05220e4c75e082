//! The voice consultation session
//!
//! This module provides the `CallSession` abstraction that manages:
//! - the call lifecycle state machine (idle → connecting → active →
//!   ending → idle)
//! - transcript assembly from channel events
//! - the current-speaker indicator
//! - exactly-once report submission per completed call
//! - user-facing notices for configuration, channel, and report failures

mod descriptor;
mod directory;
mod machine;
mod status;

pub use descriptor::{Persona, SessionDescriptor};
pub use directory::{HttpSessionDirectory, SessionDirectory};
pub use machine::CallSession;
pub use status::{CallState, CallStatus, CurrentSpeaker, Notice, NoticeKind};
