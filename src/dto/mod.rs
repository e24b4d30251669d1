use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// Note name (the lookup key, verbatim)
    pub note_name: String,
    /// Note content
    pub content: String,
    /// Time the write was accepted by the store
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /notes/{note_name}`. A missing or non-string `content`
/// is coerced to the empty string, never rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SaveNoteRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub content: Option<serde_json::Value>,
}

impl SaveNoteRequest {
    pub fn content_or_default(&self) -> String {
        self.content
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map_or_else(String::new, str::to_owned)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Process liveness, always "ok" when the server answers
    pub status: String,
    /// Store connectivity: "connected" or "disconnected"
    pub postgres: String,
    /// Reported database name
    pub db: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
