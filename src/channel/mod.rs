//! The realtime voice channel
//!
//! This module owns everything that touches the provider link:
//! - `VoiceChannel`, the seam between the call state machine and the
//!   provider, plus the typed events it delivers
//! - the NATS-backed implementation (control publishing, one subscription
//!   per event kind, a pump task that merges them into one stream)
//! - the wire message shapes and their lenient decoders
//! - normalization of the provider's loosely shaped error payloads

mod client;
pub mod fault;
mod link;
pub mod messages;

pub use client::{NatsChannelFactory, NatsVoiceChannel};
pub use fault::{normalize, Fault};
pub use link::{CallSetup, ChannelEvent, ChannelFactory, VoiceChannel};
