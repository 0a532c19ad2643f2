//! Session Control Surface Integration Tests
//!
//! Drives the public surface over the in-memory engine: stream id
//! round-trips, bounds, read-once last error and per-thread isolation.

use std::sync::Arc;
use std::sync::Barrier;

use streamlib_srt::engine::codes;
use streamlib_srt::{
    DiagnosticSink, ErrorKind, InMemoryEngine, MAX_STREAM_ID_LENGTH, SessionControlSurface,
    SessionHandle, SessionState, StreamId,
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

// =============================================================================
// Stream id
// =============================================================================

#[test]
fn test_cam01_round_trip() {
    let (engine, surface) = setup();
    let session = engine.open_session();

    surface.set_stream_id(session, b"cam-01").unwrap();

    let id = surface.stream_id(session).unwrap();
    assert_eq!(id, StreamId::try_from("cam-01").unwrap());
    assert_eq!(id.to_string(), "cam-01");
}

#[test]
fn test_round_trip_at_limit_and_opaque_bytes() {
    let (engine, surface) = setup();

    let at_limit = engine.open_session();
    let token: Vec<u8> = (0..MAX_STREAM_ID_LENGTH).map(|i| (i % 251) as u8).collect();
    surface.set_stream_id(at_limit, &token).unwrap();
    assert_eq!(surface.stream_id(at_limit).unwrap().as_bytes(), &token[..]);

    let access_control = engine.open_session();
    let token = b"#!::u=admin,r=live/cam-01,m=publish";
    surface.set_stream_id(access_control, token).unwrap();
    assert_eq!(surface.stream_id(access_control).unwrap().as_bytes(), token);
}

#[test]
fn test_600_byte_token_rejected() {
    let (engine, surface) = setup();
    let session = engine.open_session();
    surface.set_stream_id(session, b"cam-01").unwrap();

    let err = surface.set_stream_id(session, &[b'a'; 600]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let record = surface.last_error();
    assert_ne!(record.code(), 0);
    assert!(!record.message().is_empty());

    // Previous token untouched.
    assert_eq!(surface.stream_id(session).unwrap().as_bytes(), b"cam-01");
}

#[test]
fn test_copy_outlives_session() {
    let (engine, surface) = setup();
    let session = engine.open_session();
    surface.set_stream_id(session, b"cam-02").unwrap();

    let id = surface.stream_id(session).unwrap();
    engine.close(session).unwrap();

    assert_eq!(id.as_bytes(), b"cam-02");
    assert!(surface.stream_id(session).is_err());
}

#[test]
fn test_stream_id_reaches_accepting_side() {
    let (engine, surface) = setup();
    let listener = engine.open_session();
    engine.listen(listener).unwrap();

    let caller = engine.open_session();
    surface.set_stream_id(caller, b"cam-03").unwrap();
    let accepted = engine.connect(caller, listener).unwrap();

    assert_eq!(surface.session_state(accepted), SessionState::Connected);
    assert_eq!(surface.stream_id(accepted).unwrap().as_bytes(), b"cam-03");

    // Too late once connected.
    let err = surface.set_stream_id(caller, b"cam-04").unwrap_err();
    assert_eq!(err.code(), codes::CONNECTED_SOCKET);
    assert_eq!(surface.stream_id(caller).unwrap().as_bytes(), b"cam-03");
}

// =============================================================================
// Last error
// =============================================================================

#[test]
fn test_last_error_empty_without_failure() {
    let (engine, surface) = setup();
    let session = engine.open_session();
    surface.set_stream_id(session, b"ok").unwrap();

    let record = surface.last_error();
    assert!(record.is_empty());
    assert_eq!(record.code(), 0);
}

#[test]
fn test_read_once() {
    let (_engine, surface) = setup();
    assert!(surface.stream_id(SessionHandle::from_raw(7777)).is_err());

    let first = surface.last_error();
    assert_eq!(first.code(), codes::INVALID_SOCKET);
    assert!(surface.last_error().is_empty());
}

#[test]
fn test_latest_failure_overwrites() {
    let (engine, surface) = setup();
    let session = engine.open_session();

    assert!(surface.stream_id(SessionHandle::INVALID).is_err());
    assert!(surface.set_stream_id(session, &[0u8; 513]).is_err());

    assert_eq!(surface.last_error().code(), codes::INVALID_PARAM);
}

#[test]
fn test_engine_failure_outside_surface_is_visible() {
    let (engine, surface) = setup();
    let caller = engine.open_session();
    let not_listening = engine.open_session();

    assert!(engine.connect(caller, not_listening).is_err());

    let record = surface.last_error();
    assert_eq!(record.code(), codes::NO_SERVER);
    assert!(surface.last_error().is_empty());
}

#[test]
fn test_threads_see_only_their_own_error() {
    let (engine, surface) = setup();
    let session = engine.open_session();
    let barrier = Barrier::new(2);

    std::thread::scope(|s| {
        let oversized = s.spawn(|| {
            assert!(surface.set_stream_id(session, &[b'x'; 600]).is_err());
            barrier.wait();
            barrier.wait();
            surface.last_error()
        });
        let bad_handle = s.spawn(|| {
            assert!(surface.stream_id(SessionHandle::from_raw(-5)).is_err());
            barrier.wait();
            barrier.wait();
            surface.last_error()
        });

        let oversized = oversized.join().unwrap();
        let bad_handle = bad_handle.join().unwrap();
        assert_eq!(oversized.code(), codes::INVALID_PARAM);
        assert_eq!(bad_handle.code(), codes::INVALID_SOCKET);
    });

    // Main thread never failed.
    assert!(surface.last_error().is_empty());
}

#[test]
fn test_distinct_sessions_in_parallel() {
    let (engine, surface) = setup();
    let sessions: Vec<SessionHandle> = (0..8).map(|_| engine.open_session()).collect();

    std::thread::scope(|s| {
        for (i, session) in sessions.iter().enumerate() {
            let surface = &surface;
            s.spawn(move || {
                for round in 0..50 {
                    let token = format!("cam-{:02}-{}", i, round);
                    surface.set_stream_id(*session, token.as_bytes()).unwrap();
                    assert_eq!(
                        surface.stream_id(*session).unwrap().as_bytes(),
                        token.as_bytes()
                    );
                }
            });
        }
    });

    assert_eq!(surface.stream_id(sessions[3]).unwrap().to_string(), "cam-03-49");
}
