use std::sync::Arc;

use crate::{
    dto::{HealthResponse, NoteResponse},
    repository::{NoteStore, StoreError},
};

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    db_name: String,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, db_name: String) -> Self {
        Self { store, db_name }
    }

    pub async fn load_note(&self, name: &str) -> Result<Option<NoteResponse>, StoreError> {
        self.store.get(name).await.map(|note| {
            note.map(|note| NoteResponse {
                note_name: note.note_name,
                content: note.content,
                updated_at: note.updated_at,
            })
        })
    }

    pub async fn save_note(&self, name: &str, content: &str) -> Result<NoteResponse, StoreError> {
        self.store
            .upsert(name, content)
            .await
            .map(|note| NoteResponse {
                note_name: note.note_name,
                content: note.content,
                updated_at: note.updated_at,
            })
    }

    /// Liveness plus store connectivity. A failed probe is reported in
    /// the payload, it does not fail the request.
    pub async fn health(&self) -> HealthResponse {
        let postgres = match self.store.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!("health probe failed to reach store: {}", e);
                "disconnected"
            }
        };

        HealthResponse {
            status: "ok".to_owned(),
            postgres: postgres.to_owned(),
            db: self.db_name.clone(),
        }
    }
}
