use thiserror::Error;

/// Failure classes for call lifecycle operations.
///
/// Every failure is handled inside the session manager; these classes exist
/// so the HTTP layer can map what went wrong to a distinct response instead
/// of a generic 500.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A required credential or setting is missing; the call never left idle
    #[error("configuration error: {0}")]
    Config(String),

    /// The realtime voice channel could not be opened
    #[error("voice channel error: {0}")]
    Channel(String),
}
