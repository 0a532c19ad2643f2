// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Process-wide destination for engine diagnostics.
//!
//! One binding is active at a time. Binding opens the new destination first,
//! then swaps it in and releases the old one under the same lock the engine's
//! logging path takes, so a record is always written to exactly one live
//! destination. A failed open leaves the current binding untouched.
//!
//! While nothing is bound, records are forwarded to the host's `tracing`
//! subscriber.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::Local;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::engine::EngineLogHandler;
use crate::error::{Result, SrtControlError};
use crate::log_config::{EngineLogRecord, LogFlags, LogLevel};

/// Where engine diagnostics currently go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    File(PathBuf),
    Tracing,
}

/// Result of a successful bind.
#[derive(Debug)]
pub struct BindOutcome {
    /// The destination that was replaced, if any.
    pub previous: Option<SinkTarget>,
    /// Failure flushing the replaced destination. The new binding is active
    /// regardless.
    pub close_error: Option<io::Error>,
}

/// A destination ready to be installed. Opening happens before the sink lock
/// is taken, so callers can prepare one and install it only once everything
/// else they change has been validated.
pub(crate) enum SinkBinding {
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
    Tracing,
}

impl SinkBinding {
    pub(crate) fn open_file(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(SrtControlError::InvalidArgument(
                "log destination path is empty".to_string(),
            ));
        }
        let file = File::create(path).map_err(|source| SrtControlError::LogDestination {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn target(&self) -> SinkTarget {
        match self {
            Self::File { path, .. } => SinkTarget::File(path.clone()),
            Self::Tracing => SinkTarget::Tracing,
        }
    }

    /// Flush and close.
    fn release(self) -> (SinkTarget, Option<io::Error>) {
        match self {
            Self::File { path, mut writer } => {
                let flushed = writer.flush().err();
                drop(writer);
                (SinkTarget::File(path), flushed)
            }
            Self::Tracing => (SinkTarget::Tracing, None),
        }
    }
}

struct SinkState {
    binding: Option<SinkBinding>,
    flags: LogFlags,
}

/// Swappable destination for engine log records.
pub struct DiagnosticSink {
    state: Mutex<SinkState>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SinkState {
                binding: None,
                flags: LogFlags::empty(),
            }),
        }
    }

    /// The process-wide sink.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<DiagnosticSink>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(DiagnosticSink::new())).clone()
    }

    /// Open `path` (truncate-or-create) and make it the destination.
    pub fn bind_file(&self, path: impl AsRef<Path>) -> Result<BindOutcome> {
        let opened = SinkBinding::open_file(path.as_ref())?;
        Ok(self.install(opened))
    }

    /// Forward records to the host's `tracing` subscriber.
    pub fn bind_tracing(&self) -> BindOutcome {
        self.install(SinkBinding::Tracing)
    }

    /// Flush and close the current destination, leaving nothing bound.
    pub fn release(&self) -> Result<Option<SinkTarget>> {
        let released = self.state.lock().binding.take().map(SinkBinding::release);
        match released {
            Some((_, Some(e))) => Err(SrtControlError::Io(e)),
            Some((target, None)) => Ok(Some(target)),
            None => Ok(None),
        }
    }

    pub fn target(&self) -> Option<SinkTarget> {
        self.state.lock().binding.as_ref().map(SinkBinding::target)
    }

    pub fn is_bound(&self) -> bool {
        self.state.lock().binding.is_some()
    }

    pub fn flags(&self) -> LogFlags {
        self.state.lock().flags
    }

    pub fn set_flags(&self, flags: LogFlags) {
        self.state.lock().flags = flags;
    }

    /// Make `next` the destination, then flush and close the replaced one.
    pub(crate) fn install(&self, next: SinkBinding) -> BindOutcome {
        let target = next.target();
        let (previous, close_error) = {
            let mut state = self.state.lock();
            match state.binding.replace(next) {
                Some(old) => {
                    let (replaced, err) = old.release();
                    (Some(replaced), err)
                }
                None => (None, None),
            }
        };

        match &target {
            SinkTarget::File(path) => {
                info!("[DiagnosticSink] Engine diagnostics bound to {}", path.display())
            }
            SinkTarget::Tracing => info!("[DiagnosticSink] Engine diagnostics routed to host logger"),
        }
        if let Some(e) = &close_error {
            warn!(
                "[DiagnosticSink] Failed to flush replaced destination {:?}: {}",
                previous, e
            );
        }
        BindOutcome {
            previous,
            close_error,
        }
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineLogHandler for DiagnosticSink {
    fn handle(&self, record: &EngineLogRecord<'_>) {
        let mut state = self.state.lock();
        let flags = state.flags;
        if let Some(SinkBinding::File { path, writer }) = state.binding.as_mut() {
            let line = format_line(record, flags);
            let written = writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.flush());
            if let Err(e) = written {
                warn!(
                    "[DiagnosticSink] Failed to write engine diagnostic to {}: {}",
                    path.display(),
                    e
                );
            }
            return;
        }
        drop(state);
        forward_to_tracing(record);
    }
}

fn format_line(record: &EngineLogRecord<'_>, flags: LogFlags) -> String {
    let mut line = String::with_capacity(record.message.len() + 64);
    if !flags.contains(LogFlags::DISABLE_TIME) {
        let _ = write!(line, "{} ", Local::now().format("%H:%M:%S%.6f"));
    }
    if !flags.contains(LogFlags::DISABLE_THREADNAME) {
        if let Some(thread) = record.thread {
            let _ = write!(line, "/{} ", thread);
        }
    }
    if !flags.contains(LogFlags::DISABLE_SEVERITY) {
        let _ = write!(line, "{} ", record.level);
    }
    let _ = write!(line, "{}: {}", record.area.area_name(), record.message);
    if !flags.contains(LogFlags::DISABLE_EOL) {
        line.push('\n');
    }
    line
}

fn forward_to_tracing(record: &EngineLogRecord<'_>) {
    let area = record.area.area_name();
    match record.level {
        LogLevel::Emerg | LogLevel::Alert | LogLevel::Crit | LogLevel::Err => error!(
            "[{}:{}({})]{{{}}} {}",
            record.file, record.line, area, record.level, record.message
        ),
        LogLevel::Warning => warn!(
            "[{}:{}({})]{{{}}} {}",
            record.file, record.line, area, record.level, record.message
        ),
        LogLevel::Notice | LogLevel::Info => info!(
            "[{}:{}({})]{{{}}} {}",
            record.file, record.line, area, record.level, record.message
        ),
        LogLevel::Debug => debug!(
            "[{}:{}({})]{{{}}} {}",
            record.file, record.line, area, record.level, record.message
        ),
    }
}
