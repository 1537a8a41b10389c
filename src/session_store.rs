//! In-memory interview sessions.
//!
//! Each session owns one `DialogState` behind its own mutex, so turns for
//! one patient run one at a time while different patients proceed in
//! parallel. Nothing is persisted; idle sessions are evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::dialog::{DialogError, DialogState};

// ═══════════════════════════════════════════════════════════
// Session: one interview
// ═══════════════════════════════════════════════════════════

pub struct Session {
    id: Uuid,
    dialog: DialogState,
    last_activity: Instant,
    /// Set when the store drops the session; a holder must start over.
    closed: bool,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            dialog: DialogState::new(),
            last_activity: Instant::now(),
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    /// Mutable access counts as activity.
    pub fn dialog_mut(&mut self) -> &mut DialogState {
        self.last_activity = Instant::now();
        &mut self.dialog
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    #[cfg(test)]
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Lock a session, mapping poisoning to a dialog error.
pub fn lock_session(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>, DialogError> {
    handle.lock().map_err(|_| DialogError::LockPoisoned)
}

// ═══════════════════════════════════════════════════════════
// SessionStore: all live interviews
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh interview and return its identifier.
    pub fn begin(&self) -> Result<(Uuid, SessionHandle), DialogError> {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        self.sessions
            .write()
            .map_err(|_| DialogError::LockPoisoned)?
            .insert(id, Arc::clone(&handle));
        tracing::info!(session_id = %id, "Session started");
        Ok((id, handle))
    }

    /// Fetching counts as activity, so a session about to be used is not
    /// swept as idle before its turn takes the lock. Busy sessions are
    /// never swept and need no refresh.
    pub fn get(&self, id: &Uuid) -> Result<Option<SessionHandle>, DialogError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| DialogError::LockPoisoned)?;
        let handle = sessions.get(id).cloned();
        if let Some(handle) = &handle {
            if let Ok(mut session) = handle.try_lock() {
                session.touch();
            }
        }
        Ok(handle)
    }

    /// Existing session for `id`, or a new one when the id is missing or
    /// unknown (expired, reset, or never issued).
    pub fn resume_or_begin(
        &self,
        id: Option<Uuid>,
    ) -> Result<(Uuid, SessionHandle), DialogError> {
        if let Some(id) = id {
            if let Some(handle) = self.get(&id)? {
                return Ok((id, handle));
            }
            tracing::debug!(session_id = %id, "Unknown session, starting a new one");
        }
        self.begin()
    }

    /// Drop a session. Returns whether it existed.
    pub fn reset(&self, id: &Uuid) -> Result<bool, DialogError> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| DialogError::LockPoisoned)?
            .remove(id);
        if let Some(Ok(mut session)) = removed.as_ref().map(|handle| handle.try_lock()) {
            session.closed = true;
        }
        let removed = removed.is_some();
        if removed {
            tracing::info!(session_id = %id, "Session reset");
        }
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize, DialogError> {
        Ok(self
            .sessions
            .read()
            .map_err(|_| DialogError::LockPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, DialogError> {
        Ok(self.len()? == 0)
    }

    /// Remove sessions idle for longer than `max_idle`. Sessions locked by
    /// an in-flight turn are busy, not idle, and are kept.
    pub fn evict_idle(&self, max_idle: Duration) -> Result<usize, DialogError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| DialogError::LockPoisoned)?;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(mut session) if session.idle_for() > max_idle => {
                session.closed = true;
                false
            }
            Ok(_) => true,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Idle sessions evicted");
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::Slot;

    #[test]
    fn begin_creates_distinct_sessions() {
        let store = SessionStore::new();
        let (a, _) = store.begin().unwrap();
        let (b, _) = store.begin().unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn resume_returns_same_state() {
        let store = SessionStore::new();
        let (id, handle) = store.begin().unwrap();
        lock_session(&handle).unwrap().dialog_mut().leave_greeting();

        let (resumed_id, resumed) = store.resume_or_begin(Some(id)).unwrap();
        assert_eq!(resumed_id, id);
        assert_eq!(lock_session(&resumed).unwrap().dialog().current(), Slot::FullName);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn unknown_or_missing_id_begins_new_session() {
        let store = SessionStore::new();
        let stranger = Uuid::new_v4();
        let (id, _) = store.resume_or_begin(Some(stranger)).unwrap();
        assert_ne!(id, stranger);
        let (other, _) = store.resume_or_begin(None).unwrap();
        assert_ne!(other, id);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn reset_removes_once() {
        let store = SessionStore::new();
        let (id, _) = store.begin().unwrap();
        assert!(store.reset(&id).unwrap());
        assert!(!store.reset(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn evict_idle_keeps_recent_and_busy_sessions() {
        let store = SessionStore::new();
        let (_, idle) = store.begin().unwrap();
        let (busy_id, busy) = store.begin().unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let (fresh_id, _) = store.begin().unwrap();

        let _guard = lock_session(&busy).unwrap();
        let evicted = store.evict_idle(Duration::from_millis(20)).unwrap();
        assert_eq!(evicted, 1);
        assert!(store.get(&busy_id).unwrap().is_some());
        assert!(store.get(&fresh_id).unwrap().is_some());
        assert!(lock_session(&idle).unwrap().is_closed());
    }

    #[test]
    fn fetching_a_session_keeps_it_from_being_swept() {
        let store = SessionStore::new();
        let (id, _) = store.begin().unwrap();
        std::thread::sleep(Duration::from_millis(30));

        let handle = store.get(&id).unwrap().unwrap();
        assert_eq!(store.evict_idle(Duration::from_millis(20)).unwrap(), 0);
        assert!(!lock_session(&handle).unwrap().is_closed());
    }

    #[test]
    fn reset_closes_held_handles() {
        let store = SessionStore::new();
        let (id, handle) = store.begin().unwrap();
        store.reset(&id).unwrap();
        assert!(lock_session(&handle).unwrap().is_closed());
    }

    #[test]
    fn poisoned_map_is_an_error() {
        let store = Arc::new(SessionStore::new());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.sessions.write().unwrap();
            panic!("poison the session map");
        })
        .join();

        assert!(matches!(store.len(), Err(DialogError::LockPoisoned)));
        assert!(store.begin().is_err());
    }

    #[test]
    fn turns_on_one_session_run_one_at_a_time() {
        let store = Arc::new(SessionStore::new());
        let (id, handle) = store.begin().unwrap();
        let guard = lock_session(&handle).unwrap();

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let worker = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let (_, handle) = store.resume_or_begin(Some(id)).unwrap();
                let mut session = lock_session(&handle).unwrap();
                session.dialog_mut().leave_greeting();
                done_tx.send(session.dialog().current()).unwrap();
            })
        };

        // The second turn waits for the first to release the session.
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(guard.dialog().current(), Slot::Greeting);
        drop(guard);

        let seen = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(seen, Slot::FullName);
        worker.join().unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }
}
