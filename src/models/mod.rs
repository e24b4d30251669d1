use chrono::{DateTime, Utc};

/// A stored note record. `created_at` is set once on first write;
/// `updated_at` advances on every write.
#[derive(Debug, Clone)]
pub struct Note {
    pub note_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
