use crate::channel::ChannelFactory;
use crate::config::ChannelConfig;
use crate::consult::{CallSession, SessionDirectory};
use crate::report::ReportSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active consultation sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<CallSession>>>>,

    /// Session lookup collaborator
    pub directory: Arc<dyn SessionDirectory>,

    /// Report-generation collaborator
    pub reports: Arc<dyn ReportSink>,

    /// Builds one voice channel per session
    pub channels: Arc<dyn ChannelFactory>,

    pub channel_cfg: ChannelConfig,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn SessionDirectory>,
        reports: Arc<dyn ReportSink>,
        channels: Arc<dyn ChannelFactory>,
        channel_cfg: ChannelConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            directory,
            reports,
            channels,
            channel_cfg,
        }
    }
}
