use super::descriptor::SessionDescriptor;
use super::status::{CallState, CallStatus, CurrentSpeaker, Notice, NoticeKind};
use crate::channel::{fault, CallSetup, ChannelEvent, VoiceChannel};
use crate::config::ChannelConfig;
use crate::error::SessionError;
use crate::report::{ReportReceipt, ReportRequest, ReportSink};
use crate::transcript::{TranscriptAssembler, Utterance};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

/// The lifecycle manager for one voice consultation
///
/// Owns the channel handle and its subscriptions for the duration of a
/// call, assembles the transcript from channel events, and guarantees
/// exactly one report submission per completed call. All channel events
/// for a session are handled by a single task; the state checks inside
/// each handler make late or out-of-order events harmless.
pub struct CallSession {
    inner: Arc<Inner>,
}

struct Inner {
    session_id: String,

    /// The realtime link; owned exclusively by this machine while a call
    /// is open
    channel: Arc<dyn VoiceChannel>,

    /// Report-generation collaborator, stateless per call
    reports: Arc<dyn ReportSink>,

    channel_cfg: ChannelConfig,

    state: Mutex<CallState>,

    /// A start or stop is awaiting an external operation
    busy: AtomicBool,

    /// Set when the report for the current call has been claimed (fired or
    /// forfeited); cleared on the next start
    report_fired: AtomicBool,

    descriptor: Mutex<Option<SessionDescriptor>>,

    assembler: Mutex<TranscriptAssembler>,

    speaker: Mutex<CurrentSpeaker>,

    /// Most recent user-visible notification
    notice: Mutex<Option<Notice>>,

    /// Most recent report receipt, kept for the report endpoint
    last_report: Mutex<Option<ReportReceipt>>,

    /// When the call reached `Active`
    started_at: Mutex<Option<DateTime<Utc>>>,

    /// Handle for the channel event loop task
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl CallSession {
    pub fn new(
        session_id: impl Into<String>,
        channel: Arc<dyn VoiceChannel>,
        reports: Arc<dyn ReportSink>,
        channel_cfg: ChannelConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session_id: session_id.into(),
                channel,
                reports,
                channel_cfg,
                state: Mutex::new(CallState::Idle),
                busy: AtomicBool::new(false),
                report_fired: AtomicBool::new(false),
                descriptor: Mutex::new(None),
                assembler: Mutex::new(TranscriptAssembler::new()),
                speaker: Mutex::new(CurrentSpeaker::User),
                notice: Mutex::new(None),
                last_report: Mutex::new(None),
                started_at: Mutex::new(None),
                event_task: Mutex::new(None),
            }),
        }
    }

    /// Start a call with the given descriptor
    ///
    /// Only acts from `Idle`; anything else (including a start already in
    /// flight) is a no-op. Requires the channel API key; without it the
    /// start fails immediately and no channel is opened.
    pub async fn start(&self, descriptor: SessionDescriptor) -> Result<(), SessionError> {
        let inner = &self.inner;

        if inner.busy.swap(true, Ordering::SeqCst) {
            warn!("start ignored: session {} is busy", inner.session_id);
            return Ok(());
        }

        let result = Inner::start(inner, descriptor).await;
        inner.busy.store(false, Ordering::SeqCst);
        result
    }

    /// End the call and submit the consultation report
    ///
    /// Only acts from `Connecting` or `Active`. The report runs against
    /// the transcript as it exists right now, before channel teardown, so
    /// it cannot lose entries to a teardown race.
    pub async fn stop(&self) -> Result<Option<ReportReceipt>> {
        let inner = &self.inner;

        if inner.busy.swap(true, Ordering::SeqCst) {
            warn!("stop ignored: session {} is busy", inner.session_id);
            return Ok(None);
        }

        let result = inner.stop().await;
        inner.busy.store(false, Ordering::SeqCst);
        result
    }

    /// Current snapshot of the session
    pub async fn status(&self) -> CallStatus {
        self.inner.status().await
    }

    /// Finalized transcript, optionally only the last `n` utterances
    pub async fn transcript(&self, last: Option<usize>) -> Vec<Utterance> {
        let assembler = self.inner.assembler.lock().await;
        match last {
            Some(n) => assembler.tail(n).to_vec(),
            None => assembler.log().to_vec(),
        }
    }

    /// Most recent report receipt, if a report has been generated
    pub async fn last_report(&self) -> Option<ReportReceipt> {
        self.inner.last_report.lock().await.clone()
    }
}

impl Inner {
    async fn start(this: &Arc<Self>, descriptor: SessionDescriptor) -> Result<(), SessionError> {
        {
            let state = this.state.lock().await;
            if *state != CallState::Idle {
                warn!(
                    "start ignored: session {} already in state {:?}",
                    this.session_id, *state
                );
                return Ok(());
            }
        }

        let Some(api_key) = this.channel_cfg.api_key.clone() else {
            this.set_notice(NoticeKind::Config, "Voice calling is not configured")
                .await;
            return Err(SessionError::Config(
                "channel api key is not set".to_string(),
            ));
        };

        info!("Starting call for session {}", this.session_id);

        *this.state.lock().await = CallState::Connecting;
        this.report_fired.store(false, Ordering::SeqCst);
        this.assembler.lock().await.reset();
        *this.speaker.lock().await = CurrentSpeaker::User;
        *this.notice.lock().await = None;
        *this.started_at.lock().await = None;
        *this.descriptor.lock().await = Some(descriptor.clone());

        let setup = CallSetup {
            api_key,
            assistant_id: this.channel_cfg.assistant_id.clone(),
            descriptor,
        };

        let events = match this.channel.open(&setup).await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to open voice channel: {:#}", e);
                *this.state.lock().await = CallState::Idle;
                this.set_notice(NoticeKind::ChannelError, "Could not reach the voice service")
                    .await;
                return Err(SessionError::Channel(format!("{e:#}")));
            }
        };

        // Bounded wait for call-started; expiry is handled like an
        // immediate connection failure
        let connect_deadline =
            Instant::now() + Duration::from_secs(this.channel_cfg.connect_timeout_secs);

        let task = tokio::spawn(Arc::clone(this).run_event_loop(events, connect_deadline));
        *this.event_task.lock().await = Some(task);

        info!("Call connecting for session {}", this.session_id);

        Ok(())
    }

    async fn stop(&self) -> Result<Option<ReportReceipt>> {
        {
            let mut state = self.state.lock().await;
            match *state {
                CallState::Connecting | CallState::Active => *state = CallState::Ending,
                _ => {
                    warn!(
                        "stop ignored: session {} has no call in progress",
                        self.session_id
                    );
                    return Ok(None);
                }
            }
        }

        info!("Stopping call for session {}", self.session_id);

        // Report before teardown; the swap makes this the only submission
        // for the call even if a remote call-ended races us
        let receipt = if !self.report_fired.swap(true, Ordering::SeqCst) {
            self.submit_report().await
        } else {
            None
        };

        if let Err(e) = self.channel.close().await {
            warn!("Channel teardown failed: {:#}", e);
        }

        if let Some(task) = self.event_task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Event loop task panicked: {}", e);
            }
        }

        *self.state.lock().await = CallState::Idle;
        self.assembler.lock().await.clear_in_progress();
        *self.speaker.lock().await = CurrentSpeaker::User;

        info!("Call stopped for session {}", self.session_id);

        Ok(receipt)
    }

    async fn status(&self) -> CallStatus {
        let state = *self.state.lock().await;
        let started_at = *self.started_at.lock().await;
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0);

        let assembler = self.assembler.lock().await;

        CallStatus {
            session_id: self.session_id.clone(),
            state,
            busy: self.busy.load(Ordering::SeqCst),
            current_speaker: *self.speaker.lock().await,
            started_at,
            duration_secs,
            utterance_count: assembler.log().len(),
            in_progress: assembler.in_progress().cloned(),
            last_notice: self.notice.lock().await.clone(),
        }
    }

    /// Handle channel events until the call ends or the channel closes
    async fn run_event_loop(
        self: Arc<Self>,
        mut events: mpsc::Receiver<ChannelEvent>,
        connect_deadline: Instant,
    ) {
        loop {
            let connecting = *self.state.lock().await == CallState::Connecting;

            let next = if connecting {
                match time::timeout_at(connect_deadline, events.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        error!(
                            "No call-started within the connect window for session {}",
                            self.session_id
                        );
                        self.fail_call("Call connection timed out").await;
                        break;
                    }
                }
            } else {
                events.recv().await
            };

            let Some(event) = next else { break };

            match event {
                ChannelEvent::Started => {
                    let mut state = self.state.lock().await;
                    if *state == CallState::Connecting {
                        *state = CallState::Active;
                        drop(state);
                        *self.started_at.lock().await = Some(Utc::now());
                        info!("Call active for session {}", self.session_id);
                    }
                }
                ChannelEvent::Transcript(frame) => {
                    if *self.state.lock().await != CallState::Idle {
                        self.assembler.lock().await.apply(frame);
                    }
                }
                ChannelEvent::SpeechStarted => {
                    if *self.state.lock().await != CallState::Idle {
                        *self.speaker.lock().await = CurrentSpeaker::Assistant;
                    }
                }
                ChannelEvent::SpeechEnded => {
                    if *self.state.lock().await != CallState::Idle {
                        *self.speaker.lock().await = CurrentSpeaker::User;
                    }
                }
                ChannelEvent::Fault(payload) => {
                    let fault = fault::normalize(&payload);
                    error!(
                        "Channel error for session {}: {}",
                        self.session_id, fault.message
                    );
                    self.fail_call(&fault.message).await;
                    if fault.ends_call {
                        break;
                    }
                }
                ChannelEvent::Ended => {
                    if *self.state.lock().await == CallState::Idle {
                        break;
                    }
                    self.finish_remote().await;
                    break;
                }
            }
        }

        debug!("Event loop finished for session {}", self.session_id);
    }

    /// Tear down after a channel error: the report is forfeited, the state
    /// goes straight to idle, and the normalized message becomes a notice
    async fn fail_call(&self, message: &str) {
        // Claim the report slot so a racing stop() cannot fire one for an
        // errored call
        self.report_fired.store(true, Ordering::SeqCst);

        *self.state.lock().await = CallState::Idle;
        self.assembler.lock().await.clear_in_progress();
        *self.speaker.lock().await = CurrentSpeaker::User;
        self.set_notice(NoticeKind::ChannelError, message).await;

        if let Err(e) = self.channel.close().await {
            warn!("Channel teardown after failure: {:#}", e);
        }
    }

    /// Handle a remote hangup: same as stop() but without a caller
    async fn finish_remote(&self) {
        info!("Call ended by remote for session {}", self.session_id);

        if !self.report_fired.swap(true, Ordering::SeqCst) {
            *self.state.lock().await = CallState::Ending;
            self.submit_report().await;
        }

        if let Err(e) = self.channel.close().await {
            warn!("Channel teardown failed: {:#}", e);
        }

        *self.state.lock().await = CallState::Idle;
        self.assembler.lock().await.clear_in_progress();
        *self.speaker.lock().await = CurrentSpeaker::User;
    }

    /// Submit the finalized transcript to the report collaborator
    ///
    /// Failure is soft: the call has already ended and the user is back at
    /// idle, so the error becomes a notice and nothing more.
    async fn submit_report(&self) -> Option<ReportReceipt> {
        let detail = self.descriptor.lock().await.clone()?;
        let messages = self.assembler.lock().await.log().to_vec();

        let request = ReportRequest {
            session_id: self.session_id.clone(),
            session_detail: detail,
            messages,
        };

        match self.reports.submit(&request).await {
            Ok(receipt) => {
                info!(
                    "Report generated for session {} ({} utterances)",
                    self.session_id,
                    request.messages.len()
                );
                *self.last_report.lock().await = Some(receipt.clone());
                Some(receipt)
            }
            Err(e) => {
                warn!("Report submission failed: {:#}", e);
                self.set_notice(
                    NoticeKind::ReportFailure,
                    "The consultation report could not be generated",
                )
                .await;
                None
            }
        }
    }

    async fn set_notice(&self, kind: NoticeKind, message: &str) {
        *self.notice.lock().await = Some(Notice {
            kind,
            message: message.to_string(),
            at: Utc::now(),
        });
    }
}
