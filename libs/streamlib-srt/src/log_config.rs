// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Engine log severity, functional areas and line formatting flags.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::SrtControlError;

/// Syslog-style severity. Lower values are more severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum LogLevel {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    #[default]
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl LogLevel {
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => Self::Emerg,
            1 => Self::Alert,
            2 => Self::Crit,
            3 => Self::Err,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            7 => Self::Debug,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Whether a record at `severity` passes this threshold.
    pub fn allows(self, severity: LogLevel) -> bool {
        severity <= self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emerg => "EMERG",
            Self::Alert => "ALERT",
            Self::Crit => "CRIT",
            Self::Err => "ERR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = SrtControlError;

    fn from_str(s: &str) -> Result<Self, SrtControlError> {
        match s.to_ascii_lowercase().as_str() {
            "emerg" | "fatal" => Ok(Self::Emerg),
            "alert" => Ok(Self::Alert),
            "crit" | "critical" => Ok(Self::Crit),
            "err" | "error" => Ok(Self::Err),
            "warning" | "warn" => Ok(Self::Warning),
            "notice" => Ok(Self::Notice),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(SrtControlError::Configuration(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

bitflags! {
    /// Engine functional areas. A record with no area bit belongs to the
    /// general area, which is always enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LogAreas: u32 {
        const BSTATS = 1 << 0;
        const CONTROL = 1 << 1;
        const DATA = 1 << 2;
        const TSBPD = 1 << 3;
        const REXMIT = 1 << 4;
        const HAICRYPT = 1 << 5;
        const CONGEST = 1 << 6;
    }
}

impl LogAreas {
    /// The areas a stock deployment turns on. Congestion logging is
    /// excluded; it floods the sink at live bitrates.
    pub const STANDARD: Self = Self::BSTATS
        .union(Self::CONTROL)
        .union(Self::DATA)
        .union(Self::TSBPD)
        .union(Self::REXMIT)
        .union(Self::HAICRYPT);

    /// Parse a single area name, case-insensitive (`"control"`, `"REXMIT"`).
    pub fn parse_name(name: &str) -> Result<Self, SrtControlError> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "STANDARD" | "ALL" => Ok(Self::STANDARD),
            _ => Self::from_name(&upper).ok_or_else(|| {
                SrtControlError::Configuration(format!("unknown log area '{}'", name))
            }),
        }
    }

    /// Name of a record's area: the first set bit, or `general`.
    pub fn area_name(self) -> &'static str {
        self.iter_names()
            .next()
            .map(|(name, _)| area_label(name))
            .unwrap_or("general")
    }
}

fn area_label(name: &str) -> &'static str {
    match name {
        "BSTATS" => "bstats",
        "CONTROL" => "control",
        "DATA" => "data",
        "TSBPD" => "tsbpd",
        "REXMIT" => "rexmit",
        "HAICRYPT" => "haicrypt",
        "CONGEST" => "congest",
        _ => "general",
    }
}

bitflags! {
    /// Suppress parts of each line written to a file sink.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LogFlags: u32 {
        const DISABLE_TIME = 1 << 0;
        const DISABLE_THREADNAME = 1 << 1;
        const DISABLE_SEVERITY = 1 << 2;
        const DISABLE_EOL = 1 << 3;
    }
}

impl LogFlags {
    /// Parse a single flag name, case-insensitive (`"disable_time"`).
    pub fn parse_name(name: &str) -> Result<Self, SrtControlError> {
        let upper = name.trim().to_ascii_uppercase();
        Self::from_name(&upper).ok_or_else(|| {
            SrtControlError::Configuration(format!("unknown log flag '{}'", name))
        })
    }
}

/// One diagnostic record emitted by the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineLogRecord<'a> {
    pub level: LogLevel,
    pub area: LogAreas,
    pub file: &'a str,
    pub line: u32,
    pub thread: Option<&'a str>,
    pub message: &'a str,
}
