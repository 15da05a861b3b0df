// SessionStore: per-session rep counting state
//
// The outer RwLock guards only the id -> entry map; each entry carries its
// own Mutex so that the read-modify-write of a rep transition is serialized
// per session id while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::analysis::{Stage, Transition};
use crate::error::TrackerError;

/// Counting state for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub reps: u32,
    pub stage: Option<Stage>,
}

impl SessionState {
    /// Apply a state machine transition. Reps only ever grow.
    pub fn apply(&mut self, transition: Transition) {
        self.stage = transition.stage;
        if transition.rep_completed {
            self.reps = self.reps.saturating_add(1);
        }
    }
}

/// Shared handle to one session's state
///
/// Obtained per processing call; do not hold it across calls.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exclusive access to the session state
    pub fn lock(&self) -> Result<MutexGuard<'_, SessionState>, TrackerError> {
        self.state.lock().map_err(|_| TrackerError::LockPoisoned {
            component: format!("session:{}", self.id),
        })
    }
}

/// Owns every session's state for the lifetime of the process
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session's state, creating `{reps: 0, stage: None}` if unseen.
    pub fn get_or_create(&self, session_id: &str) -> Result<SessionHandle, TrackerError> {
        if let Some(state) = self.read_sessions()?.get(session_id) {
            return Ok(self.handle(session_id, state));
        }

        // Re-check under the write lock; another caller may have inserted it.
        let mut sessions = self.write_sessions()?;
        let state = sessions.entry(session_id.to_string()).or_insert_with(|| {
            log::debug!("[SessionStore] Created session '{}'", session_id);
            Arc::new(Mutex::new(SessionState::default()))
        });
        Ok(self.handle(session_id, state))
    }

    /// Restore a known session to its initial state; unknown ids are ignored.
    pub fn reset(&self, session_id: &str) -> Result<bool, TrackerError> {
        let entry = self.read_sessions()?.get(session_id).cloned();
        match entry {
            Some(state) => {
                let handle = self.handle(session_id, &state);
                *handle.lock()? = SessionState::default();
                log::info!("[SessionStore] Reset session '{}'", session_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Copy of the session's state without creating it
    pub fn snapshot(&self, session_id: &str) -> Result<Option<SessionState>, TrackerError> {
        let entry = self.read_sessions()?.get(session_id).cloned();
        match entry {
            Some(state) => {
                let handle = self.handle(session_id, &state);
                let guard = handle.lock()?;
                Ok(Some(*guard))
            }
            None => Ok(None),
        }
    }

    pub fn len(&self) -> Result<usize, TrackerError> {
        Ok(self.read_sessions()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, TrackerError> {
        Ok(self.len()? == 0)
    }

    fn handle(&self, session_id: &str, state: &Arc<Mutex<SessionState>>) -> SessionHandle {
        SessionHandle {
            id: session_id.to_string(),
            state: Arc::clone(state),
        }
    }

    fn read_sessions(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<String, Arc<Mutex<SessionState>>>>, TrackerError> {
        self.sessions.read().map_err(|_| TrackerError::LockPoisoned {
            component: "session_store".to_string(),
        })
    }

    fn write_sessions(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, Arc<Mutex<SessionState>>>>, TrackerError>
    {
        self.sessions.write().map_err(|_| TrackerError::LockPoisoned {
            component: "session_store".to_string(),
        })
    }
}
