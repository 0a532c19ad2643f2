// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session control surface for the SRT transport engine.
//!
//! The transport engine (handshake, congestion control, retransmission) is an
//! external collaborator reached through [`TransportEngine`]. This crate owns
//! the thin layer in front of it:
//! - Per-thread last-error state with read-once semantics ([`ErrorState`])
//! - Validated stream id tokens bound to a session ([`StreamId`])
//! - A process-wide, swappable destination for engine diagnostics ([`DiagnosticSink`])
//! - The composed boundary API ([`SessionControlSurface`])
//!
//! Everything crossing the boundary is plain data: handles, fixed-size
//! records and owned byte buffers. Nothing hands out references into engine
//! storage.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use streamlib_srt::{DiagnosticSink, InMemoryEngine, SessionControlSurface};
//!
//! let engine = Arc::new(InMemoryEngine::new());
//! let surface = SessionControlSurface::with_sink(engine.clone(), Arc::new(DiagnosticSink::new()));
//!
//! let session = engine.open_session();
//! surface.set_stream_id(session, b"cam-01").unwrap();
//! assert_eq!(surface.stream_id(session).unwrap().as_bytes(), b"cam-01");
//!
//! assert!(surface.set_stream_id(session, &[b'x'; 600]).is_err());
//! assert_ne!(surface.last_error().code(), 0);
//! assert!(surface.last_error().is_empty());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod error_state;
pub mod log_config;
pub mod log_sink;
pub mod logging;
pub mod session;
pub mod stream_id;
pub mod surface;
pub mod version;

pub use config::SrtControlConfig;
pub use engine::{EngineError, EngineLogHandler, InMemoryEngine, TransportEngine};
pub use error::{ErrorKind, Result, SrtControlError};
pub use error_state::{ERROR_MESSAGE_CAPACITY, ErrorRecord, ErrorState};
pub use log_config::{EngineLogRecord, LogAreas, LogFlags, LogLevel};
pub use log_sink::{BindOutcome, DiagnosticSink, SinkTarget};
pub use session::{SessionHandle, SessionState};
pub use stream_id::{MAX_STREAM_ID_LENGTH, StreamId};
pub use surface::SessionControlSurface;
pub use version::{SRT_VERSION_STRING, SRT_VERSION_VALUE, make_version};
