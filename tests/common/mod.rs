//! Shared in-process fakes for integration tests

#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use sana_consult::channel::{CallSetup, ChannelEvent, ChannelFactory, VoiceChannel};
use sana_consult::config::ChannelConfig;
use sana_consult::consult::{Persona, SessionDescriptor, SessionDirectory};
use sana_consult::report::{ReportReceipt, ReportRequest, ReportSink};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub fn descriptor(session_id: &str) -> SessionDescriptor {
    SessionDescriptor {
        session_id: session_id.to_string(),
        created_at: Utc::now(),
        persona: Persona {
            name: "Dr. Osei".to_string(),
            specialty: Some("general medicine".to_string()),
            voice_id: "voice-1".to_string(),
            prompt: "You are a careful, empathetic physician.".to_string(),
            first_message: Some("Hello, what brings you in today?".to_string()),
        },
    }
}

pub fn channel_config(api_key: Option<&str>) -> ChannelConfig {
    ChannelConfig {
        nats_url: "nats://localhost:4222".to_string(),
        api_key: api_key.map(str::to_string),
        assistant_id: None,
        connect_timeout_secs: 5,
    }
}

/// A voice channel the test script drives directly
pub struct ScriptedChannel {
    tx: Mutex<Option<mpsc::Sender<ChannelEvent>>>,
    pub open_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tx: Mutex::new(None),
            open_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        })
    }

    /// Deliver one event as the provider would; events racing teardown are
    /// dropped, exactly like a closed real channel
    pub async fn emit(&self, event: ChannelEvent) {
        let tx = self.tx.lock().await.clone();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    pub fn opened(&self) -> bool {
        self.open_calls.load(Ordering::SeqCst) > 0
    }
}

#[async_trait::async_trait]
impl VoiceChannel for ScriptedChannel {
    async fn open(&self, _setup: &CallSetup) -> Result<mpsc::Receiver<ChannelEvent>> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(64);
        *self.tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        *self.tx.lock().await = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.tx.try_lock().map(|tx| tx.is_some()).unwrap_or(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedChannelFactory {
    pub channel: Arc<ScriptedChannel>,
}

impl ChannelFactory for ScriptedChannelFactory {
    fn create(&self, _session_id: &str) -> Arc<dyn VoiceChannel> {
        let channel: Arc<dyn VoiceChannel> = self.channel.clone();
        channel
    }
}

/// Records every submission; can be told to fail
pub struct RecordingSink {
    pub submissions: Mutex<Vec<ReportRequest>>,
    pub fail: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            submissions: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.lock().await.len()
    }
}

#[async_trait::async_trait]
impl ReportSink for RecordingSink {
    async fn submit(&self, request: &ReportRequest) -> Result<ReportReceipt> {
        self.submissions.lock().await.push(request.clone());

        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("report service unavailable");
        }

        Ok(ReportReceipt {
            session_id: request.session_id.clone(),
            received_at: Utc::now(),
            report: serde_json::json!({ "summary": "ok" }),
        })
    }
}

/// Directory that knows a fixed set of sessions
pub struct StaticDirectory {
    pub known: Vec<String>,
}

#[async_trait::async_trait]
impl SessionDirectory for StaticDirectory {
    async fn lookup(&self, session_id: &str) -> Result<Option<SessionDescriptor>> {
        Ok(self
            .known
            .iter()
            .any(|known| known == session_id)
            .then(|| descriptor(session_id)))
    }
}
