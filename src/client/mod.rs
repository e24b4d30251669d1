//! HTTP client for the notes API plus the debounced autosave
//! controller a UI shell embeds.

pub mod autosave;

use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::dto::HealthResponse;

const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Base URL of the notes API, from `NOTES_API_URL`.
pub fn api_base_url() -> String {
    env::var("NOTES_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned())
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("API base URL cannot carry path segments")]
    CannotBeABase,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// What the autosave controller needs back from a load or save.
/// `updated_at` is optional on the wire; callers fall back to the
/// local clock.
#[derive(Debug, Clone)]
pub struct NoteSnapshot {
    pub content: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Seam between the autosave controller and the network, so the
/// controller is testable without a live server.
#[async_trait]
pub trait NoteTransport: Send + Sync {
    /// `Ok(None)` means the note has never been saved.
    async fn load(&self, name: &str) -> Result<Option<NoteSnapshot>, ClientError>;
    async fn save(&self, name: &str, content: &str) -> Result<NoteSnapshot, ClientError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNote {
    #[serde(default)]
    content: String,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    message: Option<String>,
}

pub struct NoteApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NoteApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&api_base_url())
    }

    // The note name goes out as a single percent-encoded path segment;
    // the server decodes it back to the verbatim key.
    fn note_url(&self, name: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::CannotBeABase)?
            .push("notes")
            .push(name);
        Ok(url)
    }

    fn health_url(&self) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::CannotBeABase)?
            .push("health");
        Ok(url)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.http.get(self.health_url()?).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }
}

async fn status_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let message = response
        .json::<WireError>()
        .await
        .unwrap_or_default()
        .message
        .unwrap_or_else(|| "Unknown error".to_owned());

    ClientError::Status { status, message }
}

#[async_trait]
impl NoteTransport for NoteApiClient {
    async fn load(&self, name: &str) -> Result<Option<NoteSnapshot>, ClientError> {
        let response = self.http.get(self.note_url(name)?).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let note: WireNote = response.json().await?;
        Ok(Some(NoteSnapshot {
            content: note.content,
            updated_at: note.updated_at,
        }))
    }

    async fn save(&self, name: &str, content: &str) -> Result<NoteSnapshot, ClientError> {
        let response = self
            .http
            .put(self.note_url(name)?)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let note: WireNote = response.json().await?;
        Ok(NoteSnapshot {
            content: note.content,
            updated_at: note.updated_at,
        })
    }
}
