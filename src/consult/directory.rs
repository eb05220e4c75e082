use super::descriptor::SessionDescriptor;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use tracing::info;

/// The session lookup collaborator
///
/// Looks up the descriptor a call needs before it can start. A lookup
/// failure must leave the caller unable to start a call.
#[async_trait::async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Fetch the descriptor for a session; `None` means unknown session
    async fn lookup(&self, session_id: &str) -> Result<Option<SessionDescriptor>>;
}

/// HTTP client for the session directory service
pub struct HttpSessionDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl SessionDirectory for HttpSessionDirectory {
    async fn lookup(&self, session_id: &str) -> Result<Option<SessionDescriptor>> {
        let url = format!(
            "{}/sessions/{}",
            self.base_url.trim_end_matches('/'),
            session_id
        );

        info!("Looking up session {}", session_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the session directory")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            anyhow::bail!("session lookup failed with status {}", response.status());
        }

        let descriptor = response
            .json::<SessionDescriptor>()
            .await
            .context("Failed to decode session descriptor")?;

        Ok(Some(descriptor))
    }
}
