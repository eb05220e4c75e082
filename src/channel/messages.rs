//! Wire shapes and subjects for the voice provider link
//!
//! Control messages are published by this service; event messages are
//! published by the provider. Event payload decoding is deliberately
//! lenient: the channel is a schema-loose boundary and undecodable frames
//! are dropped rather than surfaced.

use crate::channel::link::CallSetup;
use crate::consult::Persona;
use crate::transcript::TranscriptFrame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TRANSCRIBER_PROVIDER: &str = "deepgram";
const TRANSCRIBER_LANGUAGE: &str = "en";
const VOICE_PROVIDER: &str = "11labs";
const MODEL_PROVIDER: &str = "openai";
const MODEL_NAME: &str = "gpt-4o";

// Subjects: control is published by us, events by the provider.

pub fn start_subject(session_id: &str) -> String {
    format!("call.control.start.{}", session_id)
}

pub fn stop_subject(session_id: &str) -> String {
    format!("call.control.stop.{}", session_id)
}

pub fn started_subject(session_id: &str) -> String {
    format!("call.event.started.{}", session_id)
}

pub fn ended_subject(session_id: &str) -> String {
    format!("call.event.ended.{}", session_id)
}

pub fn transcript_subject(session_id: &str) -> String {
    format!("call.event.transcript.{}", session_id)
}

pub fn speech_started_subject(session_id: &str) -> String {
    format!("call.event.speech-started.{}", session_id)
}

pub fn speech_ended_subject(session_id: &str) -> String {
    format!("call.event.speech-ended.{}", session_id)
}

pub fn error_subject(session_id: &str) -> String {
    format!("call.event.error.{}", session_id)
}

/// Call start control message
///
/// Carries either a pre-provisioned assistant id or a full inline overlay
/// built from the session's persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStartMessage {
    pub session_id: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantOverlay>,
    pub timestamp: DateTime<Utc>,
}

impl CallStartMessage {
    pub fn new(session_id: &str, setup: &CallSetup) -> Self {
        let assistant = match setup.assistant_id {
            Some(_) => None,
            None => Some(AssistantOverlay::from_persona(&setup.descriptor.persona)),
        };

        Self {
            session_id: session_id.to_string(),
            api_key: setup.api_key.clone(),
            assistant_id: setup.assistant_id.clone(),
            assistant,
            timestamp: Utc::now(),
        }
    }
}

/// Inline assistant configuration for the no-preprovisioned-id start path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverlay {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
    pub transcriber: TranscriberConfig,
    pub voice: VoiceConfig,
    pub model: ModelConfig,
}

impl AssistantOverlay {
    pub fn from_persona(persona: &Persona) -> Self {
        Self {
            name: persona.name.clone(),
            first_message: persona.first_message.clone(),
            transcriber: TranscriberConfig {
                provider: TRANSCRIBER_PROVIDER.to_string(),
                language: TRANSCRIBER_LANGUAGE.to_string(),
            },
            voice: VoiceConfig {
                provider: VOICE_PROVIDER.to_string(),
                voice_id: persona.voice_id.clone(),
            },
            model: ModelConfig {
                provider: MODEL_PROVIDER.to_string(),
                model: MODEL_NAME.to_string(),
                messages: vec![PromptMessage {
                    role: "system".to_string(),
                    content: persona.prompt.clone(),
                }],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriberConfig {
    pub provider: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

/// Call stop control message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStopMessage {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl CallStopMessage {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Decode a transcript frame, dropping anything malformed
///
/// Missing or mistyped fields and unknown kind/role values yield `None`;
/// extra fields are tolerated.
pub fn decode_transcript(payload: &[u8]) -> Option<TranscriptFrame> {
    serde_json::from_slice(payload).ok()
}

/// Decode an error payload without ever failing
///
/// Non-JSON payloads are carried through as a raw string so the normalizer
/// can still surface them.
pub fn decode_fault(payload: &[u8]) -> Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(payload).into_owned()))
}
