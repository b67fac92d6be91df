//! Remote push sink (Firebase Realtime Database REST API).
//!
//! Optional: only constructed when the credentials file exists, a database
//! URL is configured and the service account key parses. Each event is
//! appended to `webcam_events` with a `POST`, so the server assigns the key
//! and earlier events are never overwritten.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use camwatch_core::types::EdgeEvent;
use chrono::Local;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{ServiceAccountAuth, ServiceAccountKey};
use crate::error::{AuthError, SinkError};
use crate::sink::Sink;

pub const EVENTS_COLLECTION: &str = "webcam_events";
pub const MAX_DETAIL_CHARS: usize = 500;
pub const DEFAULT_CREDENTIALS_FILE: &str = "firebase-service-account.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePushConfig {
    pub credentials_file: PathBuf,
    /// e.g. `https://<project>.firebaseio.com`; empty disables the sink.
    pub database_url: String,
    pub device_name: String,
    pub device_os: String,
}

/// Why the remote push sink is not available. Informational only: the
/// monitor runs local-only in every case.
#[derive(Debug, Error)]
pub enum RemotePushUnavailable {
    #[error("credentials not found ({0})")]
    MissingCredentials(String),

    #[error("database URL not set")]
    MissingDatabaseUrl,

    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("initialization failed: {0}")]
    Init(#[from] AuthError),
}

fn http_client(builder: ClientBuilder) -> Result<Client, RemotePushUnavailable> {
    builder.build().map_err(RemotePushUnavailable::Client)
}

/// Cap `detail` at [`MAX_DETAIL_CHARS`] characters.
pub fn truncate_detail(detail: &str) -> String {
    match detail.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((cut, _)) => detail[..cut].to_string(),
        None => detail.to_string(),
    }
}

/// One record in the remote `webcam_events` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEventRecord {
    /// `start` or `stop`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Local wall-clock time, ISO-8601 without offset.
    pub datetime: String,
    pub device_name: String,
    pub device_os: String,
    pub details: String,
}

impl RemoteEventRecord {
    pub fn from_event(event: &EdgeEvent, device_name: &str, device_os: &str) -> Self {
        Self {
            kind: event.kind.as_str().to_string(),
            timestamp: event.occurred_at_ms(),
            datetime: event
                .occurred_at
                .with_timezone(&Local)
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            device_name: device_name.to_string(),
            device_os: device_os.to_string(),
            details: event.detail.as_deref().map(truncate_detail).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

fn events_endpoint(database_url: &str) -> String {
    format!(
        "{}/{EVENTS_COLLECTION}.json",
        database_url.trim().trim_end_matches('/')
    )
}

pub struct RemotePushSink {
    endpoint: String,
    auth: ServiceAccountAuth,
    client: Client,
    device_name: String,
    device_os: String,
}

impl RemotePushSink {
    /// Check the three preconditions in order and build the sink.
    pub fn try_init(config: &RemotePushConfig) -> Result<Self, RemotePushUnavailable> {
        if !config.credentials_file.is_file() {
            return Err(RemotePushUnavailable::MissingCredentials(
                config.credentials_file.display().to_string(),
            ));
        }
        if config.database_url.trim().is_empty() {
            return Err(RemotePushUnavailable::MissingDatabaseUrl);
        }

        let client = http_client(Client::builder().timeout(REQUEST_TIMEOUT))?;
        let account = ServiceAccountKey::from_file(&config.credentials_file)?;
        let auth = ServiceAccountAuth::new(account, client.clone())?;
        tracing::debug!(account = auth.client_email(), "service account loaded");

        Ok(Self {
            endpoint: events_endpoint(&config.database_url),
            auth,
            client,
            device_name: config.device_name.clone(),
            device_os: config.device_os.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Append `record`; returns the key the server assigned.
    pub async fn push(&self, record: &RemoteEventRecord) -> Result<String, SinkError> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("access_token", token.as_str())])
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::PushRejected {
                status: status.as_u16(),
                body,
            });
        }

        let pushed: PushResponse = response.json().await?;
        Ok(pushed.name)
    }
}

#[async_trait]
impl Sink for RemotePushSink {
    fn name(&self) -> &'static str {
        "remote_push"
    }

    async fn notify(&self, event: &EdgeEvent) -> Result<(), SinkError> {
        let record = RemoteEventRecord::from_event(event, &self.device_name, &self.device_os);
        let key = self.push(&record).await?;
        tracing::info!(key = %key, "mobile notified: {}", record.kind);
        Ok(())
    }
}
