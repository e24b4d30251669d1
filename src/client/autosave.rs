//! Debounced autosave over a [`NoteTransport`].
//!
//! Edits update the draft synchronously and restart a single
//! trailing-edge debounce timer; the timer slot is cancel-and-replace,
//! with a generation counter to discard a fire that raced the
//! replacement. Saves are not serialized against each other: the last
//! write wins server-side, and a sequence check keeps an out-of-order
//! response from regressing `last_saved`.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle};

use super::NoteTransport;

/// Quiet period after the last edit before a save goes out.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(1000);

/// User-visible notifications. Presentation is up to the embedding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveEvent {
    LoadFailed,
    SaveFailed,
}

#[derive(Debug, Clone)]
pub struct AutosaveStatus {
    pub content: String,
    pub is_saving: bool,
    pub is_connected: bool,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct DraftState {
    content: String,
    is_saving: bool,
    is_connected: bool,
    last_saved: Option<DateTime<Utc>>,
    applied_save_seq: u64,
}

pub struct AutosaveController {
    note_name: String,
    transport: Arc<dyn NoteTransport>,
    state: Arc<Mutex<DraftState>>,
    events: mpsc::UnboundedSender<AutosaveEvent>,
    pending: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    save_seq: Arc<AtomicU64>,
    debounce: Duration,
}

impl AutosaveController {
    pub fn new(
        note_name: impl Into<String>,
        transport: Arc<dyn NoteTransport>,
    ) -> (Self, mpsc::UnboundedReceiver<AutosaveEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let controller = Self {
            note_name: note_name.into(),
            transport,
            state: Arc::new(Mutex::new(DraftState {
                content: String::new(),
                is_saving: false,
                is_connected: true,
                last_saved: None,
                applied_save_seq: 0,
            })),
            events,
            pending: None,
            generation: Arc::new(AtomicU64::new(0)),
            save_seq: Arc::new(AtomicU64::new(0)),
            debounce: DEBOUNCE_WINDOW,
        };

        (controller, receiver)
    }

    /// Fetch the current server content once, on note-view mount.
    /// A never-saved note is a fresh empty draft, not an error.
    pub async fn load(&self) {
        match self.transport.load(&self.note_name).await {
            Ok(Some(snapshot)) => {
                let mut draft = lock(&self.state);
                draft.content = snapshot.content;
                draft.last_saved = snapshot.updated_at;
                draft.is_connected = true;
            }
            Ok(None) => {
                let mut draft = lock(&self.state);
                draft.content = String::new();
                draft.last_saved = None;
                draft.is_connected = true;
            }
            Err(e) => {
                tracing::warn!("failed to load note: {}", e);
                lock(&self.state).is_connected = false;
                let _ = self.events.send(AutosaveEvent::LoadFailed);
            }
        }
    }

    /// Apply a local text change. The draft updates synchronously; the
    /// save is deferred until [`DEBOUNCE_WINDOW`] passes without
    /// another edit.
    pub fn edit(&mut self, text: impl Into<String>) {
        let text = text.into();
        lock(&self.state).content = text.clone();

        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // the window starts at the edit, not at the task's first poll
        let deadline = tokio::time::Instant::now() + self.debounce;

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let generation_slot = Arc::clone(&self.generation);
        let save_seq = Arc::clone(&self.save_seq);
        let note_name = self.note_name.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // a fire that raced the replacing edit's abort
            if generation_slot.load(Ordering::SeqCst) != generation {
                return;
            }
            // the slot only covers the timer: once the window elapses
            // the save runs detached, so a later edit or teardown
            // aborting the slot can never cancel an in-flight request
            tokio::spawn(async move {
                save(&transport, &note_name, &text, &state, &events, &save_seq).await;
            });
        }));
    }

    pub fn status(&self) -> AutosaveStatus {
        let draft = lock(&self.state);
        AutosaveStatus {
            content: draft.content.clone(),
            is_saving: draft.is_saving,
            is_connected: draft.is_connected,
            last_saved: draft.last_saved,
        }
    }

    /// Cancel the pending, not-yet-sent timer. In-flight saves are
    /// left to settle.
    pub fn shutdown(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for AutosaveController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn save(
    transport: &Arc<dyn NoteTransport>,
    note_name: &str,
    text: &str,
    state: &Arc<Mutex<DraftState>>,
    events: &mpsc::UnboundedSender<AutosaveEvent>,
    save_seq: &Arc<AtomicU64>,
) {
    let seq = save_seq.fetch_add(1, Ordering::SeqCst) + 1;
    lock(state).is_saving = true;

    let result = transport.save(note_name, text).await;

    let mut draft = lock(state);
    draft.is_saving = false;
    match result {
        Ok(snapshot) => {
            draft.is_connected = true;
            // overlapping saves may settle out of send order; an older
            // save's timestamp must not win
            if seq > draft.applied_save_seq {
                draft.applied_save_seq = seq;
                draft.last_saved = Some(snapshot.updated_at.unwrap_or_else(Utc::now));
            }
        }
        Err(e) => {
            tracing::warn!("failed to save note: {}", e);
            draft.is_connected = false;
            let _ = events.send(AutosaveEvent::SaveFailed);
        }
    }
}

fn lock(state: &Mutex<DraftState>) -> MutexGuard<'_, DraftState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
