use super::state::AppState;
use crate::consult::{CallSession, CallStatus};
use crate::error::SessionError;
use crate::report::ReportReceipt;
use crate::transcript::Utterance;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TranscriptQuery {
    /// Return only the last N utterances
    pub last: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StartCallResponse {
    pub session_id: String,
    pub status: CallStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopCallResponse {
    pub session_id: String,
    pub status: CallStatus,
    pub report: Option<ReportReceipt>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /consults/:session_id/start
/// Look up the session and start a voice call for it
pub async fn start_call(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Start requested for session: {}", session_id);

    let descriptor = match state.directory.lookup(&session_id).await {
        Ok(Some(descriptor)) => descriptor,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Session {} not found", session_id),
                }),
            )
                .into_response();
        }
        Err(e) => {
            error!("Session lookup failed: {:#}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Session directory is unreachable".to_string(),
                }),
            )
                .into_response();
        }
    };

    let session = get_or_create_session(&state, &session_id).await;

    match session.start(descriptor).await {
        Ok(()) => {
            info!("Call started for session: {}", session_id);
            (
                StatusCode::OK,
                Json(StartCallResponse {
                    session_id: session_id.clone(),
                    status: session.status().await,
                    message: format!("Call started for session {}", session_id),
                }),
            )
                .into_response()
        }
        Err(SessionError::Config(e)) => {
            error!("Call refused for session {}: {}", session_id, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Voice calling is not configured".to_string(),
                }),
            )
                .into_response()
        }
        Err(SessionError::Channel(e)) => {
            error!("Failed to start call for session {}: {}", session_id, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Could not reach the voice service".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /consults/:session_id/stop
/// End the call and return the final status plus the report receipt
pub async fn stop_call(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Stop requested for session: {}", session_id);

    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    let Some(session) = session else {
        return session_not_found(&session_id);
    };

    match session.stop().await {
        Ok(report) => (
            StatusCode::OK,
            Json(StopCallResponse {
                session_id: session_id.clone(),
                status: session.status().await,
                report,
                message: "Call stopped".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop call for session {}: {:#}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to stop call: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /consults/:session_id/status
pub async fn get_call_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    // Clone out so the registry lock is not held across the status read
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match session {
        Some(session) => (StatusCode::OK, Json(session.status().await)).into_response(),
        None => session_not_found(&session_id),
    }
}

/// GET /consults/:session_id/transcript?last=N
/// Finalized transcript so far; never mutates the log
pub async fn get_call_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<TranscriptQuery>,
) -> impl IntoResponse {
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match session {
        Some(session) => {
            let transcript: Vec<Utterance> = session.transcript(query.last).await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// GET /consults/:session_id/report
/// Most recent report receipt; 404 until one exists
pub async fn get_call_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    let Some(session) = session else {
        return session_not_found(&session_id);
    };

    match session.last_report().await {
        Some(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No report exists for session {}", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Helpers
// ============================================================================

/// Sessions are created on first start and reused across start/stop cycles
async fn get_or_create_session(state: &AppState, session_id: &str) -> Arc<CallSession> {
    {
        let sessions = state.sessions.read().await;
        if let Some(session) = sessions.get(session_id) {
            return Arc::clone(session);
        }
    }

    let mut sessions = state.sessions.write().await;
    Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
        Arc::new(CallSession::new(
            session_id.to_string(),
            state.channels.create(session_id),
            Arc::clone(&state.reports),
            state.channel_cfg.clone(),
        ))
    }))
}

fn session_not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}
