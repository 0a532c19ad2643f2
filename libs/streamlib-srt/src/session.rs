// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session handles and engine-reported session states.

use std::fmt;

/// Opaque identifier of a transport session inside the engine.
///
/// The engine owns session lifetime. The control surface only forwards
/// handles and never interprets them beyond the sanity check in
/// [`SessionHandle::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SessionHandle(i32);

impl SessionHandle {
    /// The engine's "no socket" value.
    pub const INVALID: Self = Self(-1);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Negative handles are never issued by the engine.
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<i32> for SessionHandle {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

/// Session state as reported by the engine.
///
/// Discriminants match the engine's socket status numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum SessionState {
    Init = 1,
    Opened = 2,
    Listening = 3,
    Connecting = 4,
    Connected = 5,
    Broken = 6,
    Closing = 7,
    Closed = 8,
    NonExist = 9,
}

impl SessionState {
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            1 => Self::Init,
            2 => Self::Opened,
            3 => Self::Listening,
            4 => Self::Connecting,
            5 => Self::Connected,
            6 => Self::Broken,
            7 => Self::Closing,
            8 => Self::Closed,
            9 => Self::NonExist,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Past initialization and not yet broken.
    pub fn is_usable(self) -> bool {
        self > Self::Init && self < Self::Broken
    }

    /// Anything after `Connected`: broken, closing, closed or gone.
    pub fn is_broken(self) -> bool {
        self > Self::Connected
    }

    /// The handle no longer refers to a live session.
    pub fn is_gone(self) -> bool {
        matches!(self, Self::Closing | Self::Closed | Self::NonExist)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Opened => "opened",
            Self::Listening => "listening",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Broken => "broken",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::NonExist => "nonexist",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
