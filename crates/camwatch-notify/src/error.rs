//! Error types for notification sinks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sound playback failed: {0}")]
    Playback(String),

    #[error("remote push failed: HTTP {status}: {body}")]
    PushRejected { status: u16, body: String },

    #[error("remote push request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote push auth failed: {0}")]
    Auth(#[from] AuthError),

    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Service-account authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cannot read credentials {path}: {source}")]
    ReadCredentials {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credentials json: {0}")]
    ParseCredentials(#[from] serde_json::Error),

    #[error("invalid service account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    TokenRequest(#[from] reqwest::Error),

    #[error("token endpoint returned HTTP {status}: {body}")]
    TokenRejected { status: u16, body: String },
}
