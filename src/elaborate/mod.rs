//! AI elaborations of card fronts
//!
//! - `client`: the app side, calling the relay and caching results on cards
//! - `relay`: the relay server holding the completion API key
//! - `upstream`: the relay's completion API client

pub mod client;
pub mod relay;
pub mod upstream;

use thiserror::Error;

pub use client::{ElaborationError, ElaborationOutcome, Elaborator, RelayClient, FALLBACK_MESSAGE};
pub use relay::{start_server, RelayServer};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Completion API reply had no message content")]
    MalformedReply,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
