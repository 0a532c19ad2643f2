// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Boundary API in front of the transport engine.
//!
//! Every operation validates its inputs before the engine sees them and
//! records any failure in the calling thread's [`ErrorState`] slot, so hosts
//! that only look at status codes can still fetch the reason afterwards with
//! [`SessionControlSurface::last_error`].

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::config::SrtControlConfig;
use crate::engine::{EngineLogHandler, TransportEngine};
use crate::error::{Result, SrtControlError};
use crate::error_state::{ErrorRecord, ErrorState};
use crate::log_config::{LogAreas, LogFlags, LogLevel};
use crate::log_sink::{BindOutcome, DiagnosticSink, SinkBinding, SinkTarget};
use crate::session::{SessionHandle, SessionState};
use crate::stream_id::{MAX_STREAM_ID_LENGTH, StreamId};

/// Session control surface: last error, stream ids and the diagnostic sink.
///
/// Holds no transport state. Sessions belong to the engine; the surface only
/// forwards handles.
pub struct SessionControlSurface {
    engine: Arc<dyn TransportEngine>,
    sink: Arc<DiagnosticSink>,
    max_stream_id_length: AtomicUsize,
}

impl SessionControlSurface {
    /// Surface over `engine` logging through the process-wide sink.
    pub fn new(engine: Arc<dyn TransportEngine>) -> Self {
        Self::with_sink(engine, DiagnosticSink::global())
    }

    /// Surface over `engine` logging through `sink`.
    pub fn with_sink(engine: Arc<dyn TransportEngine>, sink: Arc<DiagnosticSink>) -> Self {
        let handler: Arc<dyn EngineLogHandler> = sink.clone();
        engine.set_log_handler(Some(handler));
        Self {
            engine,
            sink,
            max_stream_id_length: AtomicUsize::new(MAX_STREAM_ID_LENGTH),
        }
    }

    pub fn engine(&self) -> &Arc<dyn TransportEngine> {
        &self.engine
    }

    pub fn sink(&self) -> &Arc<DiagnosticSink> {
        &self.sink
    }

    // =========================================================================
    // Last error
    // =========================================================================

    /// Take the calling thread's most recent failure.
    ///
    /// Returns the empty record when nothing failed since the last read.
    /// Clears both this surface's slot and the engine's.
    pub fn last_error(&self) -> ErrorRecord {
        let engine_error = self.engine.last_error();
        self.engine.clear_last_error();
        let local = ErrorState::take();

        // Recording a failure clears the engine slot, so anything left there
        // happened afterwards.
        match engine_error {
            Some(e) => ErrorRecord::from(&e),
            None => local.unwrap_or_default(),
        }
    }

    /// Record `err` as the calling thread's last error, attributed to `src`.
    pub fn record_failure(&self, src: &str, err: &SrtControlError) {
        let record = ErrorRecord::from(err);
        debug!("{}", record.describe(src));
        self.engine.clear_last_error();
        ErrorState::record(record);
    }

    // =========================================================================
    // Stream id
    // =========================================================================

    /// Attach `token` to `session`. A rejected token leaves the previous one
    /// in place.
    pub fn set_stream_id(&self, session: SessionHandle, token: &[u8]) -> Result<()> {
        self.track("set_stream_id", || {
            let id = StreamId::with_limit(token, self.max_stream_id_length())?;
            self.check_session(session)?;
            self.engine.set_stream_id(session, id.as_bytes())?;
            Ok(())
        })
    }

    /// Owned copy of the session's token; empty if none was set.
    pub fn stream_id(&self, session: SessionHandle) -> Result<StreamId> {
        self.track("stream_id", || {
            self.check_session(session)?;
            let bytes = self.engine.stream_id(session)?;
            Ok(StreamId::from_engine(bytes))
        })
    }

    pub fn max_stream_id_length(&self) -> usize {
        self.max_stream_id_length.load(Ordering::Relaxed)
    }

    /// Lower the accepted token length. Cannot exceed the engine limit.
    pub fn set_max_stream_id_length(&self, max: usize) -> Result<()> {
        self.track("set_max_stream_id_length", || {
            if max > MAX_STREAM_ID_LENGTH {
                return Err(SrtControlError::InvalidArgument(format!(
                    "stream id limit {} exceeds engine limit {}",
                    max, MAX_STREAM_ID_LENGTH
                )));
            }
            self.max_stream_id_length.store(max, Ordering::Relaxed);
            Ok(())
        })
    }

    // =========================================================================
    // Diagnostic sink
    // =========================================================================

    /// Send engine diagnostics to `path`, replacing the current destination.
    ///
    /// On failure the current destination stays bound.
    pub fn bind_log_sink(&self, path: impl AsRef<Path>) -> Result<BindOutcome> {
        self.track("bind_log_sink", || self.sink.bind_file(path))
    }

    /// Send engine diagnostics to the host's `tracing` subscriber.
    pub fn route_logs_to_tracing(&self) -> BindOutcome {
        self.sink.bind_tracing()
    }

    /// Flush and close the current destination.
    pub fn release_log_sink(&self) -> Result<Option<SinkTarget>> {
        self.track("release_log_sink", || self.sink.release())
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.engine.set_log_level(level);
    }

    pub fn add_log_areas(&self, areas: LogAreas) {
        self.engine.add_log_areas(areas);
    }

    pub fn remove_log_areas(&self, areas: LogAreas) {
        self.engine.remove_log_areas(areas);
    }

    pub fn set_log_flags(&self, flags: LogFlags) {
        self.sink.set_flags(flags);
    }

    // =========================================================================
    // Sessions and configuration
    // =========================================================================

    /// Engine-reported state; `NonExist` for invalid handles.
    pub fn session_state(&self, session: SessionHandle) -> SessionState {
        if !session.is_valid() {
            return SessionState::NonExist;
        }
        self.engine.session_state(session)
    }

    /// Apply log and stream id settings. `internal_log` wins over `log_file`.
    ///
    /// All or nothing: the destination is opened before any setting changes,
    /// so a failure leaves the surface exactly as it was.
    pub fn apply_config(&self, config: &SrtControlConfig) -> Result<()> {
        self.track("apply_config", || {
            config.validate()?;
            let areas = config.areas()?;
            let flags = config.flags()?;
            let destination = if config.internal_log {
                Some(SinkBinding::Tracing)
            } else {
                config
                    .log_file
                    .as_deref()
                    .map(SinkBinding::open_file)
                    .transpose()?
            };

            self.engine.set_log_level(config.log_level);
            self.engine.remove_log_areas(LogAreas::all());
            self.engine.add_log_areas(areas);
            self.sink.set_flags(flags);
            self.max_stream_id_length
                .store(config.max_stream_id_length, Ordering::Relaxed);

            if let Some(destination) = destination {
                self.sink.install(destination);
            }
            Ok(())
        })
    }

    fn check_session(&self, session: SessionHandle) -> Result<SessionState> {
        if !session.is_valid() {
            return Err(SrtControlError::InvalidSession { handle: session });
        }
        let state = self.engine.session_state(session);
        if state.is_gone() {
            return Err(SrtControlError::InvalidSession { handle: session });
        }
        Ok(state)
    }

    fn track<T>(&self, src: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let result = op();
        if let Err(err) = &result {
            self.record_failure(src, err);
        }
        result
    }
}
