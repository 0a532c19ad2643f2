// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Error types for control surface operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::{EngineError, codes};
use crate::session::SessionHandle;

/// Broad category of a control surface failure.
///
/// Used when mapping errors onto boundary status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad handle, oversized token, null or malformed input.
    InvalidArgument,
    /// The log destination could not be opened or written.
    Io,
    /// Failure reported by the transport engine, surfaced verbatim.
    Engine,
}

/// Errors that can occur during control surface operations.
#[derive(Debug, Error)]
pub enum SrtControlError {
    /// Stream id exceeds the configured maximum length.
    #[error("stream id is {len} bytes, limit is {max}")]
    StreamIdTooLong { len: usize, max: usize },

    /// Session handle is invalid, unknown or closed.
    #[error("invalid session handle {handle}")]
    InvalidSession { handle: SessionHandle },

    /// Null, empty or otherwise malformed argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Log destination could not be opened for writing.
    #[error("failed to open log destination {path:?}: {source}")]
    LogDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by the transport engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Other IO failure (reading configuration, flushing the sink).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SrtControlError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StreamIdTooLong { .. }
            | Self::InvalidSession { .. }
            | Self::InvalidArgument(_)
            | Self::Configuration(_)
            | Self::ConfigParse(_) => ErrorKind::InvalidArgument,
            Self::LogDestination { .. } | Self::Io(_) => ErrorKind::Io,
            Self::Engine(_) => ErrorKind::Engine,
        }
    }

    /// Numeric code reported across the boundary.
    ///
    /// Engine codes pass through unchanged; local failures use the SRT
    /// numbering for the equivalent condition.
    pub fn code(&self) -> i32 {
        match self {
            Self::Engine(e) => e.code,
            Self::InvalidSession { .. } => codes::INVALID_SOCKET,
            Self::LogDestination { .. } | Self::Io(_) => codes::FILE_SYSTEM,
            Self::StreamIdTooLong { .. }
            | Self::InvalidArgument(_)
            | Self::Configuration(_)
            | Self::ConfigParse(_) => codes::INVALID_PARAM,
        }
    }
}

/// Result type alias for control surface operations.
pub type Result<T> = std::result::Result<T, SrtControlError>;
