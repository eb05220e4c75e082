pub mod channel;
pub mod config;
pub mod consult;
pub mod error;
pub mod http;
pub mod report;
pub mod transcript;

pub use channel::{
    CallSetup, ChannelEvent, ChannelFactory, NatsChannelFactory, NatsVoiceChannel, VoiceChannel,
};
pub use config::{ChannelConfig, Config};
pub use consult::{
    CallSession, CallState, CallStatus, HttpSessionDirectory, Persona, SessionDescriptor,
    SessionDirectory,
};
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use report::{HttpReportSink, ReportReceipt, ReportRequest, ReportSink};
pub use transcript::{Role, TranscriptAssembler, TranscriptFrame, Utterance};
