use crate::consult::SessionDescriptor;
use crate::transcript::TranscriptFrame;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A typed event delivered by the realtime voice channel
///
/// One subscription exists per variant while a call is open; the channel
/// merges them into a single ordered stream for the state machine.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The provider accepted the call and audio is flowing
    Started,
    /// The provider closed the call (remote hangup)
    Ended,
    /// A decoded speech-recognition frame
    Transcript(TranscriptFrame),
    /// The assistant began speaking
    SpeechStarted,
    /// The assistant stopped speaking
    SpeechEnded,
    /// An error payload, passed through raw for normalization
    Fault(serde_json::Value),
}

/// Everything the channel needs to place one call
#[derive(Debug, Clone)]
pub struct CallSetup {
    pub api_key: String,
    /// Pre-provisioned assistant; absence selects the inline overlay path
    pub assistant_id: Option<String>,
    pub descriptor: SessionDescriptor,
}

/// The realtime voice channel seam
///
/// `open` places the call and returns the merged event stream; `close`
/// tears down every subscription and is safe to call repeatedly, including
/// after the channel force-closed on its own.
#[async_trait::async_trait]
pub trait VoiceChannel: Send + Sync {
    /// Place the call and start delivering events
    async fn open(&self, setup: &CallSetup) -> Result<mpsc::Receiver<ChannelEvent>>;

    /// Hang up and deregister all subscriptions (idempotent)
    async fn close(&self) -> Result<()>;

    /// Whether a call is currently open on this channel
    fn is_open(&self) -> bool;

    /// Channel name for logging
    fn name(&self) -> &str;
}

/// Creates one channel per consultation session
pub trait ChannelFactory: Send + Sync {
    fn create(&self, session_id: &str) -> Arc<dyn VoiceChannel>;
}
