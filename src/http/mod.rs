//! HTTP control API for the consultation UI
//!
//! This module provides the REST surface where UI actions arrive:
//! - POST /consults/:id/start - Start a voice call
//! - POST /consults/:id/stop - End the call and generate the report
//! - GET /consults/:id/status - Query call state
//! - GET /consults/:id/transcript - Get the finalized transcript
//! - GET /consults/:id/report - Get the most recent report receipt
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
