use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::models::{Message, RelayError, Selection};

/// Outbound queue bound per viewer. A viewer that falls this far behind
/// the author's typing stream is dropped rather than allowed to stall it.
const VIEWER_QUEUE_CAPACITY: usize = 64;

/// One mirroring room: the author's last-known snapshot plus the outbound
/// queues of every attached viewer.
///
/// All state lives behind one mutex so that a viewer attaching mid-update
/// always sees a consistent `(last_data, last_selection)` pair, and so
/// that every viewer observes DATA/SELECTION in the author's emission
/// order. The lock is never held across an await; fan-out uses `try_send`
/// only.
pub struct Session {
    id: String,
    state: Mutex<SessionState>,
}

struct SessionState {
    last_data: String,
    last_selection: Option<Selection>,
    viewers: HashMap<u64, mpsc::Sender<Message>>,
    next_viewer_id: u64,
    closed: bool,
}

/// A registered viewer: its slot id plus the receiving end of its queue.
/// Dropping the session (or evicting the viewer) closes the channel, which
/// is how the viewer's connection task learns the session ended.
pub struct Viewer {
    pub id: u64,
    pub rx: mpsc::Receiver<Message>,
}

impl Session {
    pub(super) fn new(id: String) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState {
                last_data: String::new(),
                last_selection: None,
                viewers: HashMap::new(),
                next_viewer_id: 0,
                closed: false,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn viewer_count(&self) -> usize {
        self.state.lock().unwrap().viewers.len()
    }

    /// Register a viewer and immediately queue the current snapshot as a
    /// `DATA` frame followed by a `SELECTION` frame, so a late joiner sees
    /// the present state without waiting for the author's next edit.
    pub fn attach_viewer(&self) -> Result<Viewer, RelayError> {
        self.attach_viewer_with_capacity(VIEWER_QUEUE_CAPACITY)
    }

    fn attach_viewer_with_capacity(&self, capacity: usize) -> Result<Viewer, RelayError> {
        // The snapshot pair must always fit in a fresh queue.
        debug_assert!(capacity >= 2);

        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(RelayError::SessionNotFound(self.id.clone()));
        }

        let id = state.next_viewer_id;
        state.next_viewer_id += 1;

        let (tx, rx) = mpsc::channel(capacity);
        let _ = tx.try_send(Message::data(state.last_data.clone()));
        let _ = tx.try_send(Message::selection(state.last_selection));
        state.viewers.insert(id, tx);

        debug!(session = %self.id, viewer = id, "viewer attached");
        Ok(Viewer { id, rx })
    }

    /// Remove a viewer from the fan-out set. Idempotent; the session stays
    /// alive regardless of how many viewers remain.
    pub fn detach_viewer(&self, viewer_id: u64) {
        let mut state = self.state.lock().unwrap();
        if state.viewers.remove(&viewer_id).is_some() {
            debug!(session = %self.id, viewer = viewer_id, "viewer detached");
        }
    }

    /// Store the author's latest document text and fan it out.
    pub fn update_data(&self, text: String) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.last_data = text.clone();
        self.broadcast_locked(&mut state, Message::data(text));
    }

    /// Store the author's latest selection and fan it out. `None` clears
    /// the viewers' markers; a zero-length selection places a caret.
    pub fn update_selection(&self, selection: Option<Selection>) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.last_selection = selection;
        self.broadcast_locked(&mut state, Message::selection(selection));
    }

    /// Fan out a frame without caching it (legacy `CURSOR` passthrough).
    pub fn relay(&self, msg: Message) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        self.broadcast_locked(&mut state, msg);
    }

    /// End the session: no further broadcasts, and every viewer queue is
    /// dropped so the viewer tasks send their close notification.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.viewers.clear();
        debug!(session = %self.id, "session closed");
    }

    fn broadcast_locked(&self, state: &mut SessionState, msg: Message) {
        let mut dropped = Vec::new();
        for (&viewer_id, tx) in &state.viewers {
            match tx.try_send(msg.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        session = %self.id,
                        viewer = viewer_id,
                        "viewer queue full, dropping viewer"
                    );
                    dropped.push(viewer_id);
                }
                Err(TrySendError::Closed(_)) => dropped.push(viewer_id),
            }
        }
        for viewer_id in dropped {
            state.viewers.remove(&viewer_id);
        }
    }
}
