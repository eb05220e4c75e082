use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable per-call session description from the lookup collaborator
///
/// The lifecycle manager only reads it; ownership stays with the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub persona: Persona,
}

/// The configured AI specialist for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    pub voice_id: String,
    /// System prompt defining the persona's behavior
    pub prompt: String,
    /// Opening line spoken when the call connects
    #[serde(default)]
    pub first_message: Option<String>,
}
