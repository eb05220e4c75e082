use crate::consult::SessionDescriptor;
use crate::transcript::Utterance;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Submission payload for the report collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub session_id: String,
    pub session_detail: SessionDescriptor,
    /// The full finalized transcript, in chronological order
    pub messages: Vec<Utterance>,
}

/// Result of a successful submission
///
/// The report body itself is opaque to this service beyond existing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportReceipt {
    pub session_id: String,
    pub received_at: DateTime<Utc>,
    pub report: serde_json::Value,
}

/// The report-generation collaborator
///
/// Stateless per call; the state machine enforces the once-per-call
/// submission invariant.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, request: &ReportRequest) -> Result<ReportReceipt>;
}

/// HTTP client for the report service
pub struct HttpReportSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReportSink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl ReportSink for HttpReportSink {
    async fn submit(&self, request: &ReportRequest) -> Result<ReportReceipt> {
        let url = format!("{}/reports", self.base_url.trim_end_matches('/'));

        info!(
            "Submitting report for session {} ({} utterances)",
            request.session_id,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to reach the report service")?;

        if !response.status().is_success() {
            anyhow::bail!("report submission failed with status {}", response.status());
        }

        let report = response
            .json::<serde_json::Value>()
            .await
            .context("Failed to decode report payload")?;

        Ok(ReportReceipt {
            session_id: request.session_id.clone(),
            received_at: Utc::now(),
            report,
        })
    }
}
