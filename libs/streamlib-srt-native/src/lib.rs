// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// FFI cdylib: all public functions are unsafe extern "C" called from the host via dlopen.
#![allow(clippy::missing_safety_doc)]

//! FFI cdylib exposing the SRT session control surface.
//!
//! Provides C ABI functions prefixed with `slsrt_`. Status-returning calls
//! return 0 on success; the reason for a failure is fetched afterwards with
//! `slsrt_get_last_error` on the same thread.
//!
//! Nothing returned here points into engine storage: error records come back
//! by value and stream ids are copied into caller buffers.

use std::ffi::{CStr, c_char};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use libc::size_t;
use streamlib_srt::logging::init_logging;
use streamlib_srt::{
    ERROR_MESSAGE_CAPACITY, ErrorRecord, InMemoryEngine, LogAreas, LogFlags, LogLevel,
    SRT_VERSION_VALUE, SessionControlSurface, SessionHandle, SrtControlConfig, SrtControlError,
    TransportEngine,
};

// ============================================================================
// Surface
// ============================================================================

static SURFACE: OnceLock<SessionControlSurface> = OnceLock::new();

/// Install the engine the `slsrt_*` functions drive.
///
/// Must run before the first FFI call; otherwise the in-memory engine is
/// installed on first use and this fails.
pub fn install_engine(engine: Arc<dyn TransportEngine>) -> anyhow::Result<()> {
    init_logging();
    if SURFACE.get().is_some() {
        anyhow::bail!("SRT control surface already initialized");
    }
    SURFACE
        .set(SessionControlSurface::new(engine))
        .map_err(|_| anyhow::anyhow!("SRT control surface initialized concurrently"))?;
    tracing::info!("[slsrt] Transport engine installed");
    Ok(())
}

/// The surface behind the C ABI.
pub fn control_surface() -> &'static SessionControlSurface {
    SURFACE.get_or_init(|| {
        init_logging();
        tracing::debug!("[slsrt] No engine installed, using in-memory engine");
        SessionControlSurface::new(Arc::new(InMemoryEngine::new()))
    })
}

/// Record a failure detected at the boundary and return its code.
fn fail(src: &str, err: SrtControlError) -> i32 {
    control_surface().record_failure(src, &err);
    err.code()
}

// ============================================================================
// C ABI: Last error
// ============================================================================

/// Last error as returned across the boundary.
///
/// `message` is always NUL-terminated.
#[repr(C)]
pub struct SlsrtErrorInfo {
    pub code: i32,
    pub message: [c_char; ERROR_MESSAGE_CAPACITY],
}

impl SlsrtErrorInfo {
    fn from_record(record: &ErrorRecord) -> Self {
        let mut buf = [0u8; ERROR_MESSAGE_CAPACITY];
        record.copy_message_to(&mut buf);
        Self {
            code: record.code(),
            message: buf.map(|b| b as c_char),
        }
    }

    /// Message up to the terminator, lossily decoded.
    pub fn message(&self) -> String {
        let bytes: Vec<u8> = self
            .message
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Take the calling thread's last error. Code 0 and an empty message when
/// nothing failed since the previous call.
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_get_last_error() -> SlsrtErrorInfo {
    SlsrtErrorInfo::from_record(&control_surface().last_error())
}

// ============================================================================
// C ABI: Stream id
// ============================================================================

/// Set the stream id from a NUL-terminated string.
///
/// Returns 0 on success, otherwise the error code.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slsrt_set_stream_id(u: i32, sid: *const c_char) -> i32 {
    if sid.is_null() {
        return fail(
            "slsrt_set_stream_id",
            SrtControlError::InvalidArgument("stream id is null".to_string()),
        );
    }
    let token = unsafe { CStr::from_ptr(sid) }.to_bytes();
    set_stream_id(u, token)
}

/// Set the stream id from `len` bytes at `sid`. The token may contain NULs.
///
/// Returns 0 on success, otherwise the error code.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slsrt_set_stream_id_bytes(u: i32, sid: *const u8, len: size_t) -> i32 {
    let token: &[u8] = if len == 0 {
        &[]
    } else if sid.is_null() {
        return fail(
            "slsrt_set_stream_id_bytes",
            SrtControlError::InvalidArgument("stream id is null".to_string()),
        );
    } else {
        unsafe { std::slice::from_raw_parts(sid, len) }
    };
    set_stream_id(u, token)
}

fn set_stream_id(u: i32, token: &[u8]) -> i32 {
    match control_surface().set_stream_id(SessionHandle::from_raw(u), token) {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

/// Copy the session's stream id into `out_buf`.
///
/// `out_len` receives the token length. When `buf_len` is too small nothing
/// is copied, `out_len` still receives the required length and -1 is
/// returned. A terminating NUL is appended when there is room for it.
/// Returns 0 on success, -1 on failure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slsrt_get_stream_id(
    u: i32,
    out_buf: *mut u8,
    buf_len: size_t,
    out_len: *mut size_t,
) -> i32 {
    let id = match control_surface().stream_id(SessionHandle::from_raw(u)) {
        Ok(id) => id,
        Err(_) => return -1,
    };

    if !out_len.is_null() {
        unsafe { *out_len = id.len() };
    }
    if id.len() > buf_len || (out_buf.is_null() && !id.is_empty()) {
        fail(
            "slsrt_get_stream_id",
            SrtControlError::InvalidArgument(format!(
                "buffer of {} bytes cannot hold {}-byte stream id",
                buf_len,
                id.len()
            )),
        );
        return -1;
    }

    if !out_buf.is_null() {
        unsafe {
            std::ptr::copy_nonoverlapping(id.as_bytes().as_ptr(), out_buf, id.len());
            if id.len() < buf_len {
                *out_buf.add(id.len()) = 0;
            }
        }
    }
    0
}

// ============================================================================
// C ABI: Diagnostic sink
// ============================================================================

/// Send engine diagnostics to the file at `path` (truncated).
///
/// Returns 0 on success, -1 if the file cannot be opened; the previous
/// destination then stays bound.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slsrt_set_log_stream(path: *const c_char) -> i32 {
    let path = match unsafe { c_str_to_path(path) } {
        Some(p) => p,
        None => {
            fail(
                "slsrt_set_log_stream",
                SrtControlError::InvalidArgument("log path is null or not valid".to_string()),
            );
            return -1;
        }
    };
    match control_surface().bind_log_sink(path) {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Send engine diagnostics to the host's logger instead of a file.
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_route_log_to_host() -> i32 {
    control_surface().route_logs_to_tracing();
    0
}

/// Flush and close the current destination.
///
/// Returns 0 on success, -1 if flushing failed.
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_release_log_stream() -> i32 {
    match control_surface().release_log_sink() {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Set the engine log threshold (syslog severity 0..=7).
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_set_log_level(level: i32) -> i32 {
    match LogLevel::from_raw(level) {
        Some(level) => {
            control_surface().set_log_level(level);
            0
        }
        None => {
            fail(
                "slsrt_set_log_level",
                SrtControlError::InvalidArgument(format!("unknown log level {}", level)),
            );
            -1
        }
    }
}

/// Enable the functional areas in the `areas` bit mask.
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_add_log_fa(areas: u32) -> i32 {
    match log_areas("slsrt_add_log_fa", areas) {
        Some(areas) => {
            control_surface().add_log_areas(areas);
            0
        }
        None => -1,
    }
}

/// Disable the functional areas in the `areas` bit mask.
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_del_log_fa(areas: u32) -> i32 {
    match log_areas("slsrt_del_log_fa", areas) {
        Some(areas) => {
            control_surface().remove_log_areas(areas);
            0
        }
        None => -1,
    }
}

fn log_areas(src: &str, bits: u32) -> Option<LogAreas> {
    let areas = LogAreas::from_bits(bits);
    if areas.is_none() {
        fail(
            src,
            SrtControlError::InvalidArgument(format!("unknown log area bits {:#x}", bits)),
        );
    }
    areas
}

/// Set the file sink line flags.
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_set_log_flags(flags: u32) -> i32 {
    match LogFlags::from_bits(flags) {
        Some(flags) => {
            control_surface().set_log_flags(flags);
            0
        }
        None => {
            fail(
                "slsrt_set_log_flags",
                SrtControlError::InvalidArgument(format!("unknown log flag bits {:#x}", flags)),
            );
            -1
        }
    }
}

/// Apply a TOML configuration file.
///
/// Returns 0 on success, -1 on failure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slsrt_load_config(path: *const c_char) -> i32 {
    let Some(path) = (unsafe { c_str_to_path(path) }) else {
        fail(
            "slsrt_load_config",
            SrtControlError::InvalidArgument("config path is null or not valid".to_string()),
        );
        return -1;
    };
    let config = match SrtControlConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            fail("slsrt_load_config", e);
            return -1;
        }
    };
    match control_surface().apply_config(&config) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

// ============================================================================
// C ABI: Session and version
// ============================================================================

/// Session state as its numeric value (1 = init .. 9 = nonexistent).
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_get_sock_state(u: i32) -> i32 {
    control_surface()
        .session_state(SessionHandle::from_raw(u))
        .as_raw()
}

/// Packed SRT version (`0x00MMmmpp`).
#[unsafe(no_mangle)]
pub extern "C" fn slsrt_version() -> u32 {
    SRT_VERSION_VALUE
}

// ============================================================================
// Helpers
// ============================================================================

/// Borrow a NUL-terminated path. Unix paths are raw bytes; elsewhere they
/// must be UTF-8.
unsafe fn c_str_to_path<'a>(ptr: *const c_char) -> Option<&'a Path> {
    if ptr.is_null() {
        return None;
    }
    let raw = unsafe { CStr::from_ptr(ptr) };

    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        Some(Path::new(OsStr::from_bytes(raw.to_bytes())))
    }

    #[cfg(not(unix))]
    {
        raw.to_str().ok().map(Path::new)
    }
}
