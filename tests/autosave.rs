//! Autosave controller tests under a paused tokio clock, against a
//! scripted transport.

use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::time::{Instant, advance};

use canvas_notes::client::{
    ClientError, NoteSnapshot, NoteTransport,
    autosave::{AutosaveController, AutosaveEvent, DEBOUNCE_WINDOW},
};

enum LoadBehavior {
    NotFound,
    Found(NoteSnapshot),
    Fail,
}

struct MockTransport {
    started: Instant,
    load_behavior: Mutex<LoadBehavior>,
    fail_saves: AtomicBool,
    /// Per-save artificial latency, consumed front to back.
    save_delays: Mutex<VecDeque<Duration>>,
    /// Per-save `updatedAt` to return, consumed front to back.
    save_timestamps: Mutex<VecDeque<DateTime<Utc>>>,
    /// (elapsed-at-send, payload) for every save request issued.
    saves: Mutex<Vec<(Duration, String)>>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            load_behavior: Mutex::new(LoadBehavior::NotFound),
            fail_saves: AtomicBool::new(false),
            save_delays: Mutex::new(VecDeque::new()),
            save_timestamps: Mutex::new(VecDeque::new()),
            saves: Mutex::new(Vec::new()),
        })
    }

    fn set_load(&self, behavior: LoadBehavior) {
        *self.load_behavior.lock().unwrap() = behavior;
    }

    fn push_save_delay(&self, delay: Duration) {
        self.save_delays.lock().unwrap().push_back(delay);
    }

    fn push_save_timestamp(&self, timestamp: DateTime<Utc>) {
        self.save_timestamps.lock().unwrap().push_back(timestamp);
    }

    fn saves(&self) -> Vec<(Duration, String)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteTransport for MockTransport {
    async fn load(&self, _name: &str) -> Result<Option<NoteSnapshot>, ClientError> {
        match &*self.load_behavior.lock().unwrap() {
            LoadBehavior::NotFound => Ok(None),
            LoadBehavior::Found(snapshot) => Ok(Some(snapshot.clone())),
            LoadBehavior::Fail => Err(ClientError::Status {
                status: 500,
                message: "Error loading note".to_owned(),
            }),
        }
    }

    async fn save(&self, _name: &str, content: &str) -> Result<NoteSnapshot, ClientError> {
        self.saves
            .lock()
            .unwrap()
            .push((self.started.elapsed(), content.to_owned()));

        // script entries pair with sends, not with settles
        let delay = self
            .save_delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Duration::ZERO);
        let updated_at = self.save_timestamps.lock().unwrap().pop_front();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                message: "Error saving note".to_owned(),
            });
        }
        Ok(NoteSnapshot {
            content: content.to_owned(),
            updated_at,
        })
    }
}

/// Let spawned tasks run without letting the paused clock auto-advance.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn trailing_edge_debounce_sends_one_save_with_final_text() {
    let transport = MockTransport::new();
    let saved_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    transport.push_save_timestamp(saved_at);

    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("a");
    advance(Duration::from_millis(200)).await;
    controller.edit("ab");
    advance(Duration::from_millis(200)).await;
    controller.edit("abc");

    // 999 ms into the final window: nothing may have been sent
    advance(Duration::from_millis(999)).await;
    settle().await;
    assert!(transport.saves().is_empty());

    advance(Duration::from_millis(1)).await;
    settle().await;

    let saves = transport.saves();
    assert_eq!(
        saves,
        vec![(Duration::from_millis(1400), "abc".to_owned())],
        "exactly one save, at the trailing edge, with the final text"
    );

    let status = controller.status();
    assert!(status.is_connected);
    assert!(!status.is_saving);
    assert_eq!(status.last_saved, Some(saved_at));
}

#[tokio::test(start_paused = true)]
async fn window_restarts_on_every_edit() {
    let transport = MockTransport::new();
    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("a");
    advance(Duration::from_millis(900)).await;
    controller.edit("ab");
    advance(Duration::from_millis(900)).await;
    settle().await;
    assert!(transport.saves().is_empty(), "window not yet elapsed");

    advance(Duration::from_millis(100)).await;
    settle().await;
    assert_eq!(
        transport.saves(),
        vec![(Duration::from_millis(1900), "ab".to_owned())]
    );
}

#[tokio::test(start_paused = true)]
async fn fresh_note_loads_as_empty_draft() {
    let transport = MockTransport::new();
    let (controller, mut events) = AutosaveController::new("n", transport.clone());

    controller.load().await;

    let status = controller.status();
    assert_eq!(status.content, "");
    assert_eq!(status.last_saved, None);
    assert!(status.is_connected);
    assert!(events.try_recv().is_err(), "a fresh note is not an error");
}

#[tokio::test(start_paused = true)]
async fn load_applies_server_content_and_timestamp() {
    let transport = MockTransport::new();
    let updated_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    transport.set_load(LoadBehavior::Found(NoteSnapshot {
        content: "from server".to_owned(),
        updated_at: Some(updated_at),
    }));

    let (controller, _events) = AutosaveController::new("n", transport.clone());
    controller.load().await;

    let status = controller.status();
    assert_eq!(status.content, "from server");
    assert_eq!(status.last_saved, Some(updated_at));
    assert!(status.is_connected);
}

#[tokio::test(start_paused = true)]
async fn load_failure_sets_disconnected_and_keeps_default_content() {
    let transport = MockTransport::new();
    transport.set_load(LoadBehavior::Fail);

    let (controller, mut events) = AutosaveController::new("n", transport.clone());
    controller.load().await;

    let status = controller.status();
    assert_eq!(status.content, "");
    assert!(!status.is_connected);
    assert_eq!(events.try_recv(), Ok(AutosaveEvent::LoadFailed));
}

#[tokio::test(start_paused = true)]
async fn save_failure_keeps_draft_and_notifies() {
    let transport = MockTransport::new();
    transport.fail_saves.store(true, Ordering::SeqCst);

    let (mut controller, mut events) = AutosaveController::new("n", transport.clone());

    controller.edit("draft");
    advance(DEBOUNCE_WINDOW).await;
    settle().await;

    let status = controller.status();
    assert_eq!(status.content, "draft", "a failed save never rolls back the draft");
    assert!(!status.is_connected);
    assert!(!status.is_saving);
    assert_eq!(status.last_saved, None);
    assert_eq!(events.try_recv(), Ok(AutosaveEvent::SaveFailed));

    // the next edit's debounce cycle is the implicit retry
    transport.fail_saves.store(false, Ordering::SeqCst);
    controller.edit("draft!");
    advance(DEBOUNCE_WINDOW).await;
    settle().await;
    assert!(controller.status().is_connected);
}

#[tokio::test(start_paused = true)]
async fn stale_save_response_never_regresses_last_saved() {
    let transport = MockTransport::new();
    let older = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let newer = Utc.with_ymd_and_hms(2026, 1, 1, 12, 1, 0).unwrap();
    // first save is slow and settles after the second one
    transport.push_save_delay(Duration::from_millis(5000));
    transport.push_save_delay(Duration::ZERO);
    transport.push_save_timestamp(older);
    transport.push_save_timestamp(newer);

    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("a");
    advance(Duration::from_millis(1000)).await;
    settle().await;
    assert!(controller.status().is_saving, "first save is in flight");

    controller.edit("ab");
    advance(Duration::from_millis(1000)).await;
    settle().await;
    assert_eq!(controller.status().last_saved, Some(newer));

    // let the slow first response settle; it must be discarded
    advance(Duration::from_millis(4000)).await;
    settle().await;

    let status = controller.status();
    assert_eq!(status.last_saved, Some(newer));
    assert!(status.is_connected);
    assert_eq!(transport.saves().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn edits_and_teardown_leave_in_flight_saves_to_settle() {
    let transport = MockTransport::new();
    let saved_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    transport.push_save_delay(Duration::from_millis(3000));
    transport.push_save_timestamp(saved_at);

    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("a");
    advance(Duration::from_millis(1000)).await;
    settle().await;
    assert!(controller.status().is_saving, "first save is in flight");

    // a new edit and a teardown while the save is in flight may only
    // cancel the not-yet-sent timer, never the request itself
    controller.edit("ab");
    controller.shutdown();

    advance(Duration::from_millis(3000)).await;
    settle().await;

    let status = controller.status();
    assert!(!status.is_saving, "in-flight save must settle");
    assert!(status.is_connected);
    assert_eq!(status.last_saved, Some(saved_at));
    assert_eq!(
        transport.saves(),
        vec![(Duration::from_millis(1000), "a".to_owned())],
        "the in-flight save completed; the cancelled timer sent nothing"
    );
}

#[tokio::test(start_paused = true)]
async fn missing_updated_at_falls_back_to_the_local_clock() {
    let transport = MockTransport::new();
    // no timestamp scripted: the transport answers updated_at: None
    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("a");
    advance(DEBOUNCE_WINDOW).await;
    settle().await;

    let status = controller.status();
    assert_eq!(transport.saves().len(), 1);
    assert!(
        status.last_saved.is_some(),
        "a response without updatedAt still stamps last_saved"
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_the_pending_timer() {
    let transport = MockTransport::new();
    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("never sent");
    controller.shutdown();

    advance(Duration::from_millis(3000)).await;
    settle().await;
    assert!(transport.saves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn drop_cancels_the_pending_timer() {
    let transport = MockTransport::new();
    let (mut controller, _events) = AutosaveController::new("n", transport.clone());

    controller.edit("never sent");
    drop(controller);

    advance(Duration::from_millis(3000)).await;
    settle().await;
    assert!(transport.saves().is_empty());
}
