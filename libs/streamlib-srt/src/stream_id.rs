// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Stream id tokens exchanged during session setup.

use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, SrtControlError};

/// Engine limit on stream id length in bytes.
pub const MAX_STREAM_ID_LENGTH: usize = 512;

/// Opaque, length-checked stream id token.
///
/// Owns its bytes. Values handed out by the control surface are copies and
/// stay valid regardless of what happens to the session afterwards.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct StreamId(Vec<u8>);

impl StreamId {
    /// Validate against [`MAX_STREAM_ID_LENGTH`].
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::with_limit(bytes, MAX_STREAM_ID_LENGTH)
    }

    /// Validate against `limit`, which is itself capped at the engine limit.
    pub fn with_limit(bytes: impl Into<Vec<u8>>, limit: usize) -> Result<Self> {
        let bytes = bytes.into();
        let max = limit.min(MAX_STREAM_ID_LENGTH);
        if bytes.len() > max {
            return Err(SrtControlError::StreamIdTooLong {
                len: bytes.len(),
                max,
            });
        }
        Ok(Self(bytes))
    }

    /// Wrap bytes returned by the engine, which already enforces its limit.
    pub(crate) fn from_engine(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamId").field(&self.to_string_lossy()).finish()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl AsRef<[u8]> for StreamId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&str> for StreamId {
    type Error = SrtControlError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value.as_bytes())
    }
}

impl TryFrom<&[u8]> for StreamId {
    type Error = SrtControlError;

    fn try_from(value: &[u8]) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<Vec<u8>> for StreamId {
    type Error = SrtControlError;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        Self::new(value)
    }
}
