//! In-memory `NoteStore` for tests and store-less local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{NoteStore, StoreError};
use crate::models::Note;

#[derive(Default)]
pub struct MemoryRepository {
    notes: Mutex<HashMap<String, Note>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryRepository {
    async fn get(&self, name: &str) -> Result<Option<Note>, StoreError> {
        Ok(self.notes.lock().await.get(name).cloned())
    }

    // The map lock makes the read-modify-write atomic, mirroring the
    // single-statement upsert of the Postgres store.
    async fn upsert(&self, name: &str, content: &str) -> Result<Note, StoreError> {
        let mut notes = self.notes.lock().await;
        let now = Utc::now();

        let note = notes
            .entry(name.to_owned())
            .and_modify(|note| {
                note.content = content.to_owned();
                note.updated_at = now;
            })
            .or_insert_with(|| Note {
                note_name: name.to_owned(),
                content: content.to_owned(),
                created_at: now,
                updated_at: now,
            });

        Ok(note.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
