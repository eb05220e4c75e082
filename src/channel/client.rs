use super::link::{CallSetup, ChannelEvent, ChannelFactory, VoiceChannel};
use super::messages::{self, CallStartMessage, CallStopMessage};
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// NATS-backed implementation of the voice channel
///
/// `open` publishes the call-start control message, registers one
/// subscription per event kind, and spawns a pump task that merges them
/// into a single typed stream. `close` publishes the stop message, signals
/// the pump, and waits for it to unsubscribe every slot on the way out.
pub struct NatsVoiceChannel {
    url: String,
    session_id: String,
    open: Mutex<Option<OpenChannel>>,
}

struct OpenChannel {
    client: Client,
    shutdown: watch::Sender<bool>,
    pump: JoinHandle<()>,
}

/// One subscription slot per event kind, torn down together
struct EventSubscriptions {
    started: Subscriber,
    ended: Subscriber,
    transcript: Subscriber,
    speech_started: Subscriber,
    speech_ended: Subscriber,
    error: Subscriber,
}

impl EventSubscriptions {
    async fn subscribe(client: &Client, session_id: &str) -> Result<Self> {
        Ok(Self {
            started: client
                .subscribe(messages::started_subject(session_id))
                .await
                .context("Failed to subscribe to call-started events")?,
            ended: client
                .subscribe(messages::ended_subject(session_id))
                .await
                .context("Failed to subscribe to call-ended events")?,
            transcript: client
                .subscribe(messages::transcript_subject(session_id))
                .await
                .context("Failed to subscribe to transcript events")?,
            speech_started: client
                .subscribe(messages::speech_started_subject(session_id))
                .await
                .context("Failed to subscribe to speech-started events")?,
            speech_ended: client
                .subscribe(messages::speech_ended_subject(session_id))
                .await
                .context("Failed to subscribe to speech-ended events")?,
            error: client
                .subscribe(messages::error_subject(session_id))
                .await
                .context("Failed to subscribe to error events")?,
        })
    }

    /// Deregister every slot; failures are logged, never raised
    async fn unsubscribe_all(self) {
        let slots = [
            ("started", self.started),
            ("ended", self.ended),
            ("transcript", self.transcript),
            ("speech-started", self.speech_started),
            ("speech-ended", self.speech_ended),
            ("error", self.error),
        ];

        for (kind, mut slot) in slots {
            if let Err(e) = slot.unsubscribe().await {
                warn!("Failed to unsubscribe {} events: {}", kind, e);
            }
        }
    }
}

impl NatsVoiceChannel {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            open: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl VoiceChannel for NatsVoiceChannel {
    async fn open(&self, setup: &CallSetup) -> Result<mpsc::Receiver<ChannelEvent>> {
        let mut slot = self.open.lock().await;
        if slot.is_some() {
            anyhow::bail!("channel already open for session {}", self.session_id);
        }

        info!("Opening voice channel for session {}", self.session_id);

        let client = async_nats::connect(&self.url)
            .await
            .context("Failed to connect to NATS")?;

        let start = CallStartMessage::new(&self.session_id, setup);
        let payload = serde_json::to_vec(&start)?;
        client
            .publish(messages::start_subject(&self.session_id), payload.into())
            .await
            .context("Failed to publish call start")?;

        let subs = EventSubscriptions::subscribe(&client, &self.session_id).await?;

        let (tx, rx) = mpsc::channel(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pump = tokio::spawn(pump_events(subs, tx, shutdown_rx));

        *slot = Some(OpenChannel {
            client,
            shutdown: shutdown_tx,
            pump,
        });

        info!("Voice channel open for session {}", self.session_id);

        Ok(rx)
    }

    async fn close(&self) -> Result<()> {
        let open = self.open.lock().await.take();
        let Some(open) = open else {
            // Already closed; teardown is idempotent
            return Ok(());
        };

        info!("Closing voice channel for session {}", self.session_id);

        let stop = CallStopMessage::new(&self.session_id);
        match serde_json::to_vec(&stop) {
            Ok(payload) => {
                if let Err(e) = open
                    .client
                    .publish(messages::stop_subject(&self.session_id), payload.into())
                    .await
                {
                    warn!("Failed to publish call stop: {}", e);
                }
            }
            Err(e) => warn!("Failed to encode call stop: {}", e),
        }

        let _ = open.shutdown.send(true);
        if let Err(e) = open.pump.await {
            warn!("Event pump task panicked: {}", e);
        }

        info!("Voice channel closed for session {}", self.session_id);

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.try_lock().map(|slot| slot.is_some()).unwrap_or(true)
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Merge the six subscription slots into one typed event stream
async fn pump_events(
    mut subs: EventSubscriptions,
    tx: mpsc::Sender<ChannelEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Channel event pump started");

    loop {
        let event = tokio::select! {
            _ = shutdown.changed() => break,
            Some(_) = subs.started.next() => Some(ChannelEvent::Started),
            Some(_) = subs.ended.next() => Some(ChannelEvent::Ended),
            Some(msg) = subs.transcript.next() => {
                // Undecodable frames are dropped here, silently
                messages::decode_transcript(&msg.payload).map(ChannelEvent::Transcript)
            }
            Some(_) = subs.speech_started.next() => Some(ChannelEvent::SpeechStarted),
            Some(_) = subs.speech_ended.next() => Some(ChannelEvent::SpeechEnded),
            Some(msg) = subs.error.next() => {
                Some(ChannelEvent::Fault(messages::decode_fault(&msg.payload)))
            }
            else => break,
        };

        if let Some(event) = event {
            if !forward_event(&tx, &mut shutdown, event).await {
                break;
            }
        }
    }

    subs.unsubscribe_all().await;

    info!("Channel event pump stopped");
}

/// Forward one event without ever stalling teardown
///
/// Teardown awaits the pump, and the pump's consumer may itself be the task
/// running teardown; a send that parks on a full buffer would wait on that
/// consumer forever. Racing the send against the shutdown signal keeps the
/// pump able to wind down, at the cost of dropping the event (late events
/// are state-guarded on the consumer side anyway). Returns `false` when the
/// pump should stop.
async fn forward_event(
    tx: &mpsc::Sender<ChannelEvent>,
    shutdown: &mut watch::Receiver<bool>,
    event: ChannelEvent,
) -> bool {
    tokio::select! {
        _ = shutdown.changed() => false,
        // Receiver gone means the session already tore down
        sent = tx.send(event) => sent.is_ok(),
    }
}


/// Builds one NATS channel per consultation session
pub struct NatsChannelFactory {
    url: String,
}

impl NatsChannelFactory {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl ChannelFactory for NatsChannelFactory {
    fn create(&self, session_id: &str) -> Arc<dyn VoiceChannel> {
        Arc::new(NatsVoiceChannel::new(self.url.clone(), session_id))
    }
}
