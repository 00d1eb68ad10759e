// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use photobooth::constants::{countdown, permission, pipeline, timing, ui};

#[test]
fn test_countdown_has_capture_tick_before_expiry() {
    // The capture fires one tick before the run ends
    assert!(countdown::TOTAL_MS > countdown::TICK_MS);
    assert_eq!(countdown::TOTAL_MS / countdown::TICK_MS, 6);
    assert!(!countdown::DONE_LABEL.is_empty());
}

#[test]
fn test_camera_request_code() {
    assert_eq!(permission::CAMERA_REQUEST_CODE, 10);
    assert_eq!(permission::RESPONSE_SUCCESS, 0);
}

#[test]
fn test_portal_names_are_consistent() {
    assert!(permission::CAMERA_INTERFACE.starts_with(permission::PORTAL_DESTINATION));
    assert!(permission::REQUEST_INTERFACE.starts_with("org.freedesktop.portal."));
    assert!(permission::PORTAL_PATH.starts_with('/'));
}

#[test]
fn test_pipeline_output_is_rgba() {
    assert_eq!(pipeline::OUTPUT_FORMAT, "RGBA");
    assert!(pipeline::MAX_BUFFERS >= 1);
    assert!(pipeline::PREVIEW_CHANNEL_CAPACITY >= 1);
}

#[test]
fn test_toast_outlasts_a_tick() {
    assert!(timing::TOAST_LONG_MS > countdown::TICK_MS);
    assert!(timing::UI_POLL_INTERVAL.as_millis() < countdown::TICK_MS as u128);
    assert!(timing::SNAP_WARMUP < timing::SNAP_TIMEOUT);
}

#[test]
fn test_status_hint_mentions_quit() {
    assert!(ui::STATUS_HINT.contains("quit"));
    assert_ne!(ui::WAITING_FOR_CAMERA, ui::CAMERA_UNAVAILABLE);
}
