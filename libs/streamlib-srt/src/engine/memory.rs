// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-process reference engine.
//!
//! Models the parts of the engine the control surface observes: a session
//! table with per-session locks, the connect/accept exchange that carries the
//! caller's stream id to the accepting side, a per-thread error slot, and
//! level/area-filtered diagnostic records. No packets move.

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::{Mutex, RwLock};

use super::{EngineError, EngineLogHandler, TransportEngine, codes};
use crate::log_config::{EngineLogRecord, LogAreas, LogLevel};
use crate::session::{SessionHandle, SessionState};
use crate::stream_id::MAX_STREAM_ID_LENGTH;

thread_local! {
    // Shared by every engine instance on the thread, like the native engine's
    // per-thread error slot.
    static LAST_ENGINE_ERROR: RefCell<Option<EngineError>> = const { RefCell::new(None) };
}

const FIRST_HANDLE: i32 = 1;

#[derive(Debug)]
struct SessionEntry {
    state: SessionState,
    stream_id: Vec<u8>,
    peer: Option<SessionHandle>,
}

impl SessionEntry {
    fn new(state: SessionState) -> Self {
        Self {
            state,
            stream_id: Vec::new(),
            peer: None,
        }
    }
}

struct LogSettings {
    level: LogLevel,
    areas: LogAreas,
}

/// Reference [`TransportEngine`] that keeps all session state in memory.
pub struct InMemoryEngine {
    sessions: RwLock<HashMap<SessionHandle, Arc<Mutex<SessionEntry>>>>,
    next_handle: AtomicI32,
    log_handler: RwLock<Option<Arc<dyn EngineLogHandler>>>,
    log_settings: RwLock<LogSettings>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_handle: AtomicI32::new(FIRST_HANDLE),
            log_handler: RwLock::new(None),
            log_settings: RwLock::new(LogSettings {
                level: LogLevel::default(),
                areas: LogAreas::STANDARD,
            }),
        }
    }

    /// Create a session in the `Init` state.
    pub fn open_session(&self) -> SessionHandle {
        let handle =
            SessionHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.sessions.write().insert(
            handle,
            Arc::new(Mutex::new(SessionEntry::new(SessionState::Init))),
        );
        self.emit(
            LogLevel::Debug,
            LogAreas::CONTROL,
            &format!("{} created", handle),
        );
        handle
    }

    /// Put a fresh session into the `Listening` state.
    pub fn listen(&self, handle: SessionHandle) -> Result<(), EngineError> {
        let entry = self.entry(handle)?;
        let outcome = {
            let mut session = entry.lock();
            let state = session.state;
            match state {
                SessionState::Init | SessionState::Opened | SessionState::Listening => {
                    session.state = SessionState::Listening;
                    Ok(())
                }
                SessionState::Connecting | SessionState::Connected | SessionState::Broken => {
                    Err(EngineError::connected_socket())
                }
                _ => Err(EngineError::invalid_socket()),
            }
        };
        outcome.map_err(|e| self.fail(e))?;
        self.emit(
            LogLevel::Debug,
            LogAreas::CONTROL,
            &format!("{} listening", handle),
        );
        Ok(())
    }

    /// Connect `caller` to `listener`.
    ///
    /// Returns the accepting-side session, which carries a copy of the
    /// caller's stream id as exchanged during the handshake.
    pub fn connect(
        &self,
        caller: SessionHandle,
        listener: SessionHandle,
    ) -> Result<SessionHandle, EngineError> {
        if self.session_state(listener) != SessionState::Listening {
            return Err(self.fail(EngineError::new(
                codes::NO_SERVER,
                "Connection setup failure: no listener at the peer address.",
            )));
        }

        let caller_entry = self.entry(caller)?;
        let (accepted, stream_id) = {
            let mut session = caller_entry.lock();
            let state = session.state;
            match state {
                SessionState::Init | SessionState::Opened => {}
                SessionState::Listening => {
                    drop(session);
                    return Err(self.fail(EngineError::invalid_operation()));
                }
                SessionState::Connecting | SessionState::Connected | SessionState::Broken => {
                    drop(session);
                    return Err(self.fail(EngineError::connected_socket()));
                }
                _ => {
                    drop(session);
                    return Err(self.fail(EngineError::invalid_socket()));
                }
            }
            let accepted =
                SessionHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
            session.state = SessionState::Connected;
            session.peer = Some(accepted);
            (accepted, session.stream_id.clone())
        };

        let accepted_entry = SessionEntry {
            state: SessionState::Connected,
            stream_id: stream_id.clone(),
            peer: Some(caller),
        };
        self.sessions
            .write()
            .insert(accepted, Arc::new(Mutex::new(accepted_entry)));

        self.emit(
            LogLevel::Notice,
            LogAreas::CONTROL,
            &format!(
                "{} connected, accepted as {} for stream [{}]",
                caller,
                accepted,
                String::from_utf8_lossy(&stream_id)
            ),
        );
        Ok(accepted)
    }

    /// Mark a connected session and its peer as broken.
    pub fn break_session(&self, handle: SessionHandle) -> Result<(), EngineError> {
        let entry = self.entry(handle)?;
        let peer = {
            let mut session = entry.lock();
            let state = session.state;
            match state {
                SessionState::Connecting | SessionState::Connected => {
                    session.state = SessionState::Broken;
                    session.peer
                }
                SessionState::Broken => return Ok(()),
                _ => {
                    drop(session);
                    return Err(self.fail(EngineError::new(
                        codes::NO_CONNECTION,
                        "Connection does not exist.",
                    )));
                }
            }
        };
        if let Some(peer) = peer {
            self.mark_broken(peer);
        }
        self.emit(
            LogLevel::Warning,
            LogAreas::CONTROL,
            &format!("{} connection broken", handle),
        );
        Ok(())
    }

    /// Close a session. A connected peer observes the connection as broken.
    pub fn close(&self, handle: SessionHandle) -> Result<(), EngineError> {
        let entry = self.entry(handle)?;
        let peer = {
            let mut session = entry.lock();
            if session.state.is_gone() {
                drop(session);
                return Err(self.fail(EngineError::invalid_socket()));
            }
            let was_connected = session.state == SessionState::Connected;
            session.state = SessionState::Closed;
            session.peer.take().filter(|_| was_connected)
        };
        if let Some(peer) = peer {
            self.mark_broken(peer);
        }
        self.emit(
            LogLevel::Debug,
            LogAreas::CONTROL,
            &format!("{} closed", handle),
        );
        Ok(())
    }

    /// Record `code`/`message` as the calling thread's engine failure and
    /// emit it as an error-level diagnostic.
    pub fn inject_error(&self, code: i32, message: impl Into<String>) -> EngineError {
        self.fail(EngineError::new(code, message))
    }

    /// Emit a diagnostic record, subject to the configured level and areas.
    ///
    /// General-area records (`LogAreas::empty()`) pass any area mask.
    #[track_caller]
    pub fn emit(&self, level: LogLevel, area: LogAreas, message: &str) {
        {
            let settings = self.log_settings.read();
            if !settings.level.allows(level) {
                return;
            }
            if !area.is_empty() && !settings.areas.intersects(area) {
                return;
            }
        }
        let Some(handler) = self.log_handler.read().clone() else {
            return;
        };

        let location = Location::caller();
        let file = location
            .file()
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        let current = std::thread::current();
        let record = EngineLogRecord {
            level,
            area,
            file,
            line: location.line(),
            thread: current.name(),
            message,
        };
        handler.handle(&record);
    }

    fn mark_broken(&self, handle: SessionHandle) {
        if let Some(entry) = self.sessions.read().get(&handle).cloned() {
            let mut session = entry.lock();
            if session.state == SessionState::Connected {
                session.state = SessionState::Broken;
            }
        }
    }

    fn entry(&self, handle: SessionHandle) -> Result<Arc<Mutex<SessionEntry>>, EngineError> {
        let entry = self.sessions.read().get(&handle).cloned();
        entry.ok_or_else(|| self.fail(EngineError::invalid_socket()))
    }

    fn fail(&self, error: EngineError) -> EngineError {
        LAST_ENGINE_ERROR.with(|slot| *slot.borrow_mut() = Some(error.clone()));
        self.emit(LogLevel::Err, LogAreas::empty(), &error.message);
        error
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportEngine for InMemoryEngine {
    fn last_error(&self) -> Option<EngineError> {
        LAST_ENGINE_ERROR.with(|slot| slot.borrow().clone())
    }

    fn clear_last_error(&self) {
        LAST_ENGINE_ERROR.with(|slot| *slot.borrow_mut() = None);
    }

    fn session_state(&self, handle: SessionHandle) -> SessionState {
        match self.sessions.read().get(&handle) {
            Some(entry) => entry.lock().state,
            None => SessionState::NonExist,
        }
    }

    fn set_stream_id(&self, handle: SessionHandle, id: &[u8]) -> Result<(), EngineError> {
        if id.len() > MAX_STREAM_ID_LENGTH {
            return Err(self.fail(EngineError::invalid_param()));
        }
        let entry = self.entry(handle)?;
        let outcome = {
            let mut session = entry.lock();
            let state = session.state;
            match state {
                SessionState::Init | SessionState::Opened | SessionState::Listening => {
                    session.stream_id = id.to_vec();
                    Ok(())
                }
                SessionState::Connecting | SessionState::Connected | SessionState::Broken => {
                    Err(EngineError::connected_socket())
                }
                _ => Err(EngineError::invalid_socket()),
            }
        };
        outcome.map_err(|e| self.fail(e))
    }

    fn stream_id(&self, handle: SessionHandle) -> Result<Vec<u8>, EngineError> {
        let entry = self.entry(handle)?;
        let outcome = {
            let session = entry.lock();
            if session.state.is_gone() {
                Err(EngineError::invalid_socket())
            } else {
                Ok(session.stream_id.clone())
            }
        };
        outcome.map_err(|e| self.fail(e))
    }

    fn set_log_handler(&self, handler: Option<Arc<dyn EngineLogHandler>>) {
        *self.log_handler.write() = handler;
    }

    fn set_log_level(&self, level: LogLevel) {
        self.log_settings.write().level = level;
    }

    fn add_log_areas(&self, areas: LogAreas) {
        self.log_settings.write().areas.insert(areas);
    }

    fn remove_log_areas(&self, areas: LogAreas) {
        self.log_settings.write().areas.remove(areas);
    }
}
