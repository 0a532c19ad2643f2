//! Diagnostic Sink Integration Tests
//!
//! Verifies binding, replacement and failure handling of the engine log
//! destination, including the process-wide sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serial_test::serial;
use tempfile::TempDir;

use streamlib_srt::engine::codes;
use streamlib_srt::{
    DiagnosticSink, ErrorKind, InMemoryEngine, LogAreas, LogFlags, LogLevel,
    SessionControlSurface, SinkTarget,
};

// =============================================================================
// Helpers
// =============================================================================

fn setup() -> (Arc<InMemoryEngine>, SessionControlSurface) {
    let engine = Arc::new(InMemoryEngine::new());
    let surface =
        SessionControlSurface::with_sink(engine.clone(), Arc::new(DiagnosticSink::new()));
    (engine, surface)
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Binding
// =============================================================================

#[test]
fn test_forced_engine_error_reaches_bound_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.log");
    let (engine, surface) = setup();

    surface.bind_log_sink(&path).unwrap();
    let _ = engine.inject_error(codes::CONNECTION_LOST, "Connection was broken.");

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("ERR"));
    assert!(lines[0].ends_with("general: Connection was broken."));
}

#[test]
fn test_failed_bind_keeps_previous_destination() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.log");
    let (engine, surface) = setup();
    surface.bind_log_sink(&good).unwrap();

    // A directory cannot be opened as a log file.
    let err = surface.bind_log_sink(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(surface.last_error().code(), codes::FILE_SYSTEM);

    let _ = engine.inject_error(codes::NO_CONNECTION, "Connection does not exist.");
    let lines = read_lines(&good);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Connection does not exist."));
}

#[test]
fn test_rebind_moves_output() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.log");
    let second = dir.path().join("second.log");
    let (engine, surface) = setup();
    surface.set_log_flags(LogFlags::DISABLE_TIME | LogFlags::DISABLE_THREADNAME);

    surface.bind_log_sink(&first).unwrap();
    engine.emit(LogLevel::Warning, LogAreas::DATA, "before");

    let outcome = surface.bind_log_sink(&second).unwrap();
    assert_eq!(outcome.previous, Some(SinkTarget::File(first.clone())));
    assert!(outcome.close_error.is_none());
    engine.emit(LogLevel::Warning, LogAreas::DATA, "after");

    assert_eq!(read_lines(&first), vec!["WARNING data: before"]);
    assert_eq!(read_lines(&second), vec!["WARNING data: after"]);
}

#[test]
fn test_filtered_records_are_not_written() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.log");
    let (engine, surface) = setup();
    surface.bind_log_sink(&path).unwrap();

    engine.emit(LogLevel::Info, LogAreas::CONTROL, "too verbose");
    engine.emit(LogLevel::Warning, LogAreas::CONGEST, "area off by default");
    assert!(read_lines(&path).is_empty());

    surface.set_log_level(LogLevel::Info);
    surface.add_log_areas(LogAreas::CONGEST);
    engine.emit(LogLevel::Info, LogAreas::CONTROL, "now visible");
    engine.emit(LogLevel::Warning, LogAreas::CONGEST, "congest visible");

    surface.remove_log_areas(LogAreas::CONTROL);
    engine.emit(LogLevel::Warning, LogAreas::CONTROL, "control off");

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("control: now visible"));
    assert!(lines[1].ends_with("congest: congest visible"));
}

#[test]
fn test_route_to_tracing_stops_file_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.log");
    let (engine, surface) = setup();
    surface.bind_log_sink(&path).unwrap();

    let outcome = surface.route_logs_to_tracing();
    assert_eq!(outcome.previous, Some(SinkTarget::File(path.clone())));

    let _ = engine.inject_error(codes::CONNECTION_LOST, "Connection was broken.");
    assert!(read_lines(&path).is_empty());

    assert_eq!(surface.release_log_sink().unwrap(), Some(SinkTarget::Tracing));
}

#[test]
fn test_no_record_lost_or_split_during_rebinds() {
    const RECORDS: usize = 500;
    let dir = TempDir::new().unwrap();
    let (engine, surface) = setup();
    surface.set_log_flags(LogFlags::DISABLE_TIME);
    surface.bind_log_sink(dir.path().join("sink-0.log")).unwrap();

    let done = AtomicBool::new(false);
    let mut paths = vec![dir.path().join("sink-0.log")];

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..RECORDS {
                engine.emit(LogLevel::Warning, LogAreas::DATA, &format!("record {}", i));
            }
            done.store(true, Ordering::Release);
        });

        let mut n = 1;
        while !done.load(Ordering::Acquire) && n < 50 {
            let path = dir.path().join(format!("sink-{}.log", n));
            surface.bind_log_sink(&path).unwrap();
            paths.push(path);
            n += 1;
        }
    });
    surface.release_log_sink().unwrap();

    let lines: Vec<String> = paths.iter().flat_map(|p| read_lines(p)).collect();
    assert_eq!(lines.len(), RECORDS);
    assert!(lines.iter().all(|l| l.contains("data: record ")));
}

#[cfg(target_os = "linux")]
#[test]
fn test_unflushable_destination_reports_close_error() {
    let dir = TempDir::new().unwrap();
    let next = dir.path().join("next.log");
    let (engine, surface) = setup();

    // Every write to /dev/full fails, so the record stays buffered.
    surface.bind_log_sink("/dev/full").unwrap();
    let _ = engine.inject_error(codes::CONNECTION_LOST, "lost on a full device");

    let outcome = surface.bind_log_sink(&next).unwrap();
    assert_eq!(outcome.previous, Some(SinkTarget::File("/dev/full".into())));
    assert!(outcome.close_error.is_some());
    assert_eq!(surface.sink().target(), Some(SinkTarget::File(next.clone())));

    let _ = engine.inject_error(codes::NO_SERVER, "after the rebind");
    let lines = read_lines(&next);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("after the rebind"));
}

// =============================================================================
// Process-wide sink
// =============================================================================

#[test]
#[serial]
fn test_global_sink_shared_across_surfaces() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("global.log");

    let first_engine = Arc::new(InMemoryEngine::new());
    let second_engine = Arc::new(InMemoryEngine::new());
    let first = SessionControlSurface::new(first_engine.clone());
    let second = SessionControlSurface::new(second_engine.clone());
    assert!(Arc::ptr_eq(first.sink(), second.sink()));

    first.bind_log_sink(&path).unwrap();
    assert_eq!(second.sink().target(), Some(SinkTarget::File(path.clone())));

    let _ = first_engine.inject_error(codes::NO_SERVER, "first engine");
    let _ = second_engine.inject_error(codes::NO_SERVER, "second engine");

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("first engine"));
    assert!(lines[1].ends_with("second engine"));

    DiagnosticSink::global().release().unwrap();
}
