mod embedded;
pub mod memory;

use async_trait::async_trait;
use embedded::migrations;
use thiserror::Error;
use tokio_postgres::{Client, NoTls};

use crate::models::Note;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] tokio_postgres::Error),
}

/// Durable key-value persistence of notes keyed by name.
///
/// Absence of a record is a normal outcome (`Ok(None)`), not an error.
/// `upsert` must be atomic per name with respect to concurrent writers:
/// the stored state after two concurrent upserts is one of the two
/// inputs applied after the other, never a mix of fields from both.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Note>, StoreError>;
    async fn upsert(&self, name: &str, content: &str) -> Result<Note, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

pub struct Repository {
    client: Client,
}

impl Repository {
    pub async fn new(database_dsn: &str) -> Result<Self, StoreError> {
        let (client, con) = tokio_postgres::connect(database_dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = con.await {
                tracing::error!("connection error: {}", e);
            }
        });

        Ok(Self { client })
    }

    pub async fn migrate(&mut self) -> Result<(), refinery::Error> {
        let migrations_report = migrations::runner().run_async(&mut self.client).await?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }
}

fn note_from_row(row: &tokio_postgres::Row) -> Note {
    Note {
        note_name: row.get("note_name"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl NoteStore for Repository {
    async fn get(&self, name: &str) -> Result<Option<Note>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT note_name, content, created_at, updated_at \
                 FROM notes WHERE note_name = $1",
                &[&name],
            )
            .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    // A single ON CONFLICT statement so last-write-wins holds across
    // concurrent writers and across server instances.
    async fn upsert(&self, name: &str, content: &str) -> Result<Note, StoreError> {
        let row = self
            .client
            .query_one(
                "INSERT INTO notes (note_name, content, created_at, updated_at) \
                 VALUES ($1, $2, now(), now()) \
                 ON CONFLICT (note_name) DO UPDATE \
                 SET content = EXCLUDED.content, updated_at = now() \
                 RETURNING note_name, content, created_at, updated_at",
                &[&name, &content],
            )
            .await?;

        Ok(note_from_row(&row))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}
