// Integration tests for the recording lifecycle
//
// These drive the recorder through scripted capture devices, so every
// transition of the permission → record → stop → blob state machine is
// exercised deterministically, without real hardware.

mod common;

use common::{ManualClock, ScriptedDevice, ScriptedFactory};
use std::sync::Arc;
use std::time::Duration;
use voice_relay::{
    AudioRecorder, CaptureError, RecorderError, RecorderState, SystemClock, FALLBACK_MIME_TYPE,
};

fn recorder_with(devices: Vec<ScriptedDevice>) -> (AudioRecorder, ScriptedFactory) {
    let factory = ScriptedFactory::new(devices);
    let recorder = AudioRecorder::new(Box::new(factory.clone()), Arc::new(SystemClock));
    (recorder, factory)
}

#[tokio::test]
async fn blob_concatenates_chunks_in_arrival_order() {
    let device = ScriptedDevice::new()
        .with_immediate(&[b"A"])
        .with_buffered(&[b"B"])
        .with_mime("audio/test");
    let (recorder, _) = recorder_with(vec![device]);

    recorder.start_recording().await.expect("start");
    let blob = recorder.stop_recording().await.expect("stop");

    assert_eq!(blob.data, b"AB".to_vec());
    assert_eq!(blob.mime_type, "audio/test");
}

#[tokio::test]
async fn elapsed_duration_matches_clock() {
    let clock = ManualClock::new();
    let factory = ScriptedFactory::new(vec![ScriptedDevice::new()
        .with_immediate(&[b"A", b"B"])
        .with_mime("audio/test")]);
    let recorder = AudioRecorder::new(Box::new(factory), clock.clone());

    recorder.start_recording().await.expect("start");
    clock.advance(Duration::from_millis(500));
    let blob = recorder.stop_recording().await.expect("stop");

    assert_eq!(blob.data, b"AB".to_vec());
    assert_eq!(recorder.stats().last_duration_ms, Some(500));
}

#[tokio::test]
async fn second_start_is_rejected_and_first_session_unaffected() {
    let device = ScriptedDevice::new().with_immediate(&[b"hello"]);
    let (recorder, factory) = recorder_with(vec![device]);

    recorder.start_recording().await.expect("first start");

    let err = recorder.start_recording().await.unwrap_err();
    assert!(matches!(err, RecorderError::AlreadyRecording));
    assert!(err.to_string().contains("already in progress"));
    assert_eq!(factory.created(), 1, "no second device acquired");

    let blob = recorder.stop_recording().await.expect("stop");
    assert_eq!(blob.data, b"hello".to_vec());
}

#[tokio::test]
async fn stop_without_start_is_rejected() {
    let (recorder, factory) = recorder_with(vec![]);

    let err = recorder.stop_recording().await.unwrap_err();
    assert!(matches!(err, RecorderError::NoActiveRecording));
    assert!(err.to_string().contains("currently in progress"));
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn mime_type_falls_back_when_device_reports_none() {
    let device = ScriptedDevice::new().with_immediate(&[b"x"]);
    let (recorder, _) = recorder_with(vec![device]);

    recorder.start_recording().await.expect("start");
    let blob = recorder.stop_recording().await.expect("stop");

    assert_eq!(blob.mime_type, FALLBACK_MIME_TYPE);
}

#[tokio::test]
async fn device_is_released_and_recorder_restartable() {
    let first = ScriptedDevice::new().with_immediate(&[b"one"]);
    let second = ScriptedDevice::new().with_immediate(&[b"two"]);
    let (recorder, factory) = recorder_with(vec![first, second]);

    recorder.start_recording().await.expect("start 1");
    let blob = recorder.stop_recording().await.expect("stop 1");
    assert_eq!(blob.data, b"one".to_vec());

    // A fresh session acquires a fresh device rather than failing on an
    // already-initialized one
    recorder.start_recording().await.expect("start 2");
    let blob = recorder.stop_recording().await.expect("stop 2");
    assert_eq!(blob.data, b"two".to_vec());

    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn permission_denial_leaves_no_session_state() {
    let denied =
        ScriptedDevice::failing_start(CaptureError::PermissionDenied("mic denied".to_string()));
    let good = ScriptedDevice::new().with_immediate(&[b"ok"]);
    let (recorder, _) = recorder_with(vec![denied, good]);

    let err = recorder.start_recording().await.unwrap_err();
    match err {
        RecorderError::PermissionDenied(msg) => assert!(msg.contains("mic denied")),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    let stats = recorder.stats();
    assert_eq!(stats.state, RecorderState::Idle);
    assert_eq!(stats.started_at, None);
    assert_eq!(stats.chunks_received, 0);

    // No partial chunk sequence carries into the next session
    recorder.start_recording().await.expect("retry start");
    let blob = recorder.stop_recording().await.expect("stop");
    assert_eq!(blob.data, b"ok".to_vec());
}

#[tokio::test]
async fn unsupported_host_surfaces_as_unsupported() {
    let device =
        ScriptedDevice::failing_start(CaptureError::Unsupported("no capture stack".to_string()));
    let (recorder, _) = recorder_with(vec![device]);

    let err = recorder.start_recording().await.unwrap_err();
    assert!(matches!(err, RecorderError::Unsupported(_)));
    assert_eq!(recorder.stats().state, RecorderState::Idle);
}

#[tokio::test]
async fn stop_failure_still_releases_the_device() {
    let failing = ScriptedDevice::new().with_immediate(&[b"junk"]).failing_stop();
    let good = ScriptedDevice::new().with_immediate(&[b"fine"]);
    let (recorder, factory) = recorder_with(vec![failing, good]);

    recorder.start_recording().await.expect("start");
    let err = recorder.stop_recording().await.unwrap_err();
    assert!(matches!(err, RecorderError::StopFailed(_)));
    assert_eq!(recorder.stats().state, RecorderState::Idle);

    // The failed session released its device; a new session works
    recorder.start_recording().await.expect("restart");
    let blob = recorder.stop_recording().await.expect("stop");
    assert_eq!(blob.data, b"fine".to_vec());
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn status_reflects_active_recording() {
    let device = ScriptedDevice::new().with_immediate(&[b"x", b"y"]);
    let (recorder, _) = recorder_with(vec![device]);

    assert_eq!(recorder.stats().state, RecorderState::Idle);

    recorder.start_recording().await.expect("start");

    // Give the collector a moment to drain the delivered chunks
    tokio::time::sleep(Duration::from_millis(20)).await;

    let stats = recorder.stats();
    assert_eq!(stats.state, RecorderState::Recording);
    assert!(stats.started_at.is_some());
    assert_eq!(stats.chunks_received, 2);

    recorder.stop_recording().await.expect("stop");
    assert_eq!(recorder.stats().state, RecorderState::Idle);
}
