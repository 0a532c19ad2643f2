// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Seam between the control surface and the transport engine.
//!
//! The engine owns sessions, the wire protocol and its own per-thread error
//! slot. The control surface reaches it only through [`TransportEngine`].

mod memory;

use std::sync::Arc;

use thiserror::Error;

use crate::log_config::{EngineLogRecord, LogAreas, LogLevel};
use crate::session::{SessionHandle, SessionState};

pub use memory::InMemoryEngine;

/// Engine error codes (SRT numbering).
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const UNKNOWN: i32 = -1;
    pub const CONNECTION_SETUP: i32 = 1000;
    pub const NO_SERVER: i32 = 1001;
    pub const CONNECTION_REJECTED: i32 = 1002;
    pub const CONNECTION_FAILURE: i32 = 2000;
    pub const CONNECTION_LOST: i32 = 2001;
    pub const NO_CONNECTION: i32 = 2002;
    pub const FILE_SYSTEM: i32 = 4000;
    pub const INVALID_OPERATION: i32 = 5000;
    pub const BOUND_SOCKET: i32 = 5001;
    pub const CONNECTED_SOCKET: i32 = 5002;
    pub const INVALID_PARAM: i32 = 5003;
    pub const INVALID_SOCKET: i32 = 5004;
    pub const UNBOUND_SOCKET: i32 = 5005;
    pub const NO_LISTEN: i32 = 5006;
}

/// Opaque failure reported by the engine: a code and its message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_socket() -> Self {
        Self::new(
            codes::INVALID_SOCKET,
            "Operation not supported: Invalid socket ID.",
        )
    }

    pub fn connected_socket() -> Self {
        Self::new(
            codes::CONNECTED_SOCKET,
            "Operation not supported: Cannot do this operation on a CONNECTED socket.",
        )
    }

    pub fn invalid_param() -> Self {
        Self::new(
            codes::INVALID_PARAM,
            "Operation not supported: Bad parameters.",
        )
    }

    pub fn invalid_operation() -> Self {
        Self::new(codes::INVALID_OPERATION, "Operation not supported.")
    }
}

/// Receiver for the engine's diagnostic records.
///
/// Called on whatever thread the engine logs from.
pub trait EngineLogHandler: Send + Sync {
    fn handle(&self, record: &EngineLogRecord<'_>);
}

/// Handle-based operations the control surface needs from the engine.
pub trait TransportEngine: Send + Sync {
    /// The calling thread's most recent engine failure, if any.
    fn last_error(&self) -> Option<EngineError>;

    /// Clear the calling thread's engine failure slot.
    fn clear_last_error(&self);

    /// State of `handle`; `NonExist` for handles the engine never issued.
    fn session_state(&self, handle: SessionHandle) -> SessionState;

    /// Store `id` on the session. The engine decides whether the session's
    /// current state permits it.
    fn set_stream_id(&self, handle: SessionHandle, id: &[u8]) -> Result<(), EngineError>;

    /// Copy of the session's stream id; empty if none was set.
    fn stream_id(&self, handle: SessionHandle) -> Result<Vec<u8>, EngineError>;

    /// Route diagnostic records to `handler`, or stop routing with `None`.
    fn set_log_handler(&self, handler: Option<Arc<dyn EngineLogHandler>>);

    fn set_log_level(&self, level: LogLevel);

    fn add_log_areas(&self, areas: LogAreas);

    fn remove_log_areas(&self, areas: LogAreas);
}
