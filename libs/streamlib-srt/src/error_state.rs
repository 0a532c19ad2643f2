// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-thread last-error state.
//!
//! Every failing control surface operation overwrites the calling thread's
//! slot. Reading it takes the record out, so a second read without an
//! intervening failure yields an empty record. Threads never see each other's
//! errors.

use std::cell::RefCell;
use std::fmt;

use crate::engine::EngineError;
use crate::error::SrtControlError;

/// Capacity of the boundary message buffer in bytes, terminator included.
pub const ERROR_MESSAGE_CAPACITY: usize = 1024;

/// Code and message of the most recent failure.
///
/// The message never exceeds `ERROR_MESSAGE_CAPACITY - 1` bytes so it always
/// fits a terminated boundary buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ErrorRecord {
    code: i32,
    message: String,
}

impl ErrorRecord {
    /// Create a record, truncating the message to the boundary capacity.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: truncate_message(message.into()),
        }
    }

    /// The empty record (code 0, no message).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.message.is_empty()
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Format as a failure line attributed to `src`, e.g.
    /// `FAILURE srt_connect:[1001] Connection setup failure: ...`.
    pub fn describe(&self, src: &str) -> String {
        format!("FAILURE {}:[{}] {}", src, self.code, self.message)
    }

    /// Copy the message into `buf` as a NUL-terminated C string.
    ///
    /// Truncates to `buf.len() - 1` bytes. Returns the number of message
    /// bytes written, terminator excluded. An empty `buf` receives nothing.
    pub fn copy_message_to(&self, buf: &mut [u8]) -> usize {
        let Some(room) = buf.len().checked_sub(1) else {
            return 0;
        };
        let bytes = self.message.as_bytes();
        let n = bytes.len().min(room);
        buf[..n].copy_from_slice(&bytes[..n]);
        buf[n] = 0;
        n
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&SrtControlError> for ErrorRecord {
    fn from(err: &SrtControlError) -> Self {
        match err {
            // Engine messages are surfaced verbatim, without the code suffix.
            SrtControlError::Engine(e) => Self::from(e),
            other => Self::new(other.code(), other.to_string()),
        }
    }
}

impl From<&EngineError> for ErrorRecord {
    fn from(err: &EngineError) -> Self {
        Self::new(err.code, err.message.clone())
    }
}

fn truncate_message(mut message: String) -> String {
    let max = ERROR_MESSAGE_CAPACITY - 1;
    if message.len() > max {
        let mut end = max;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    message
}

thread_local! {
    static LAST_ERROR: RefCell<Option<ErrorRecord>> = const { RefCell::new(None) };
}

/// Access to the calling thread's last-error slot.
pub struct ErrorState;

impl ErrorState {
    /// Overwrite the calling thread's slot.
    pub fn record(record: ErrorRecord) {
        LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(record));
    }

    /// Take the calling thread's record, leaving the slot empty.
    pub fn take() -> Option<ErrorRecord> {
        LAST_ERROR.with(|slot| slot.borrow_mut().take())
    }

    /// Copy of the calling thread's record without clearing it.
    pub fn peek() -> Option<ErrorRecord> {
        LAST_ERROR.with(|slot| slot.borrow().clone())
    }

    pub fn clear() {
        LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
    }
}
