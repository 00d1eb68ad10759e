// SPDX-License-Identifier: GPL-3.0-only

//! The booth screen
//!
//! All screen state lives here and only changes through
//! [`BoothScreen::update`], which runs on the UI-owning thread. Work the
//! screen cannot do itself (permission prompts, camera binding, captures)
//! is returned as [`Effect`]s for the runtime to execute; the results come
//! back as [`Message`]s.

use super::countdown::{Countdown, CountdownStep};
use super::notifier::{self, PERMISSIONS_NOT_GRANTED, Toast, ToastQueue};
use crate::backends::camera::types::CaptureResult;
use crate::config::Config;
use crate::errors::CameraError;
use crate::permission::{PermissionRequest, PermissionResult, PermissionStatus};
use std::time::Instant;
use tracing::{error, info, warn};

/// Lifecycle of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Created, waiting for the permission result
    AwaitingPermission,
    /// Permission held, camera provider being acquired and bound
    StartingCamera,
    /// Preview running, capture endpoint bound
    Ready,
    /// Camera could not be started; nothing recovers from here
    CameraUnavailable,
    /// Screen ended (permission denied or torn down)
    Finished,
}

/// Inputs to the screen
#[derive(Debug)]
pub enum Message {
    /// Answer to a [`Effect::RequestPermissions`]
    PermissionResult(PermissionResult),
    /// Outcome of [`Effect::StartCamera`], carrying the bound camera's name
    CameraStarted(Result<String, CameraError>),
    /// The preview area was tapped
    PreviewTapped(Instant),
    /// Periodic UI tick
    Tick(Instant),
    /// Outcome of [`Effect::Capture`]
    CaptureFinished(CaptureResult),
    /// The screen is being torn down
    Destroy,
}

/// Work for the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestPermissions(PermissionRequest),
    StartCamera,
    Capture,
    /// End the screen
    Finish,
}

pub struct BoothScreen {
    state: ScreenState,
    countdown: Countdown,
    toasts: ToastQueue,
    camera_name: Option<String>,
    pending_request: Option<i32>,
}

impl BoothScreen {
    pub fn new(config: &Config) -> Self {
        Self {
            state: ScreenState::AwaitingPermission,
            countdown: Countdown::new(config.countdown.clone()),
            toasts: ToastQueue::new(config.toast_duration()),
            camera_name: None,
            pending_request: None,
        }
    }

    /// Screen creation: start the camera or ask for permission first
    pub fn create(&mut self, camera_permission: PermissionStatus) -> Vec<Effect> {
        match camera_permission {
            PermissionStatus::Granted => {
                info!("Camera permission already granted");
                self.start_camera()
            }
            PermissionStatus::Denied => {
                let request = PermissionRequest::camera();
                info!(request_code = request.request_code, "Requesting camera permission");
                self.pending_request = Some(request.request_code);
                vec![Effect::RequestPermissions(request)]
            }
        }
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        if self.state == ScreenState::Finished {
            return Vec::new();
        }

        match message {
            Message::PermissionResult(result) => self.handle_permission_result(result),
            Message::CameraStarted(result) => self.handle_camera_started(result),
            Message::PreviewTapped(now) => self.handle_tap(now),
            Message::Tick(now) => self.handle_tick(now),
            Message::CaptureFinished(result) => self.handle_capture_finished(result),
            Message::Destroy => self.handle_destroy(),
        }
    }

    fn start_camera(&mut self) -> Vec<Effect> {
        self.state = ScreenState::StartingCamera;
        vec![Effect::StartCamera]
    }

    fn handle_permission_result(&mut self, result: PermissionResult) -> Vec<Effect> {
        if self.pending_request != Some(result.request_code) {
            warn!(request_code = result.request_code, "Ignoring unexpected permission result");
            return Vec::new();
        }
        self.pending_request = None;

        if result.all_granted() {
            info!("Camera permission granted");
            self.start_camera()
        } else {
            warn!("Camera permission denied, closing screen");
            self.toasts.push(PERMISSIONS_NOT_GRANTED);
            self.state = ScreenState::Finished;
            vec![Effect::Finish]
        }
    }

    fn handle_camera_started(&mut self, result: Result<String, CameraError>) -> Vec<Effect> {
        match result {
            Ok(name) => {
                info!(camera = %name, "Camera session started");
                self.camera_name = Some(name);
                self.state = ScreenState::Ready;
            }
            Err(err) => {
                // No user-visible recovery: the screen stays without a camera
                error!(error = %err, "Camera provider unavailable");
                self.state = ScreenState::CameraUnavailable;
            }
        }
        Vec::new()
    }

    fn handle_tap(&mut self, now: Instant) -> Vec<Effect> {
        if self.state == ScreenState::AwaitingPermission {
            return Vec::new();
        }
        if !self.countdown.start(now) {
            return Vec::new();
        }
        self.advance_countdown(now)
    }

    fn handle_tick(&mut self, now: Instant) -> Vec<Effect> {
        self.toasts.tick(now);
        self.advance_countdown(now)
    }

    fn advance_countdown(&mut self, now: Instant) -> Vec<Effect> {
        match self.countdown.poll(now) {
            Some(CountdownStep::Capture(_)) => vec![Effect::Capture],
            Some(CountdownStep::Tick(_)) | Some(CountdownStep::Finished) | None => Vec::new(),
        }
    }

    fn handle_capture_finished(&mut self, result: CaptureResult) -> Vec<Effect> {
        match &result {
            Ok(image) => info!(
                width = image.width,
                height = image.height,
                timestamp = %image.timestamp.format("%Y-%m-%d %H:%M:%S"),
                "Capture finished"
            ),
            Err(err) => warn!(error = %err, "Capture failed"),
        }
        self.toasts.push(notifier::capture_outcome_message(&result));
        Vec::new()
    }

    fn handle_destroy(&mut self) -> Vec<Effect> {
        info!("Booth screen destroyed");
        self.countdown.cancel();
        self.state = ScreenState::Finished;
        Vec::new()
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ScreenState::Finished
    }

    pub fn is_countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// When the countdown next needs a tick, if one is running
    pub fn next_tick_due(&self) -> Option<Instant> {
        self.countdown.next_due()
    }

    /// Countdown label text ("" when idle)
    pub fn label(&self) -> &str {
        self.countdown.label()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toasts.current()
    }

    /// Visible and queued notification texts
    pub fn notifications(&self) -> impl Iterator<Item = &str> {
        self.toasts.messages()
    }

    pub fn camera_name(&self) -> Option<&str> {
        self.camera_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::CapturedImage;
    use crate::errors::{CaptureError, CaptureErrorCode};
    use crate::permission::Permission;
    use std::time::Duration;

    fn ready_screen() -> BoothScreen {
        let mut screen = BoothScreen::new(&Config::default());
        assert_eq!(screen.create(PermissionStatus::Granted), vec![Effect::StartCamera]);
        screen.update(Message::CameraStarted(Ok("Back".to_string())));
        screen
    }

    fn camera_result(status: PermissionStatus) -> PermissionResult {
        PermissionResult {
            request_code: 10,
            permissions: vec![Permission::Camera],
            grant_results: vec![status],
        }
    }

    #[test]
    fn test_missing_permission_is_requested() {
        let mut screen = BoothScreen::new(&Config::default());
        let effects = screen.create(PermissionStatus::Denied);
        assert_eq!(
            effects,
            vec![Effect::RequestPermissions(PermissionRequest::camera())]
        );
        assert_eq!(screen.state(), ScreenState::AwaitingPermission);
    }

    #[test]
    fn test_granted_request_starts_camera() {
        let mut screen = BoothScreen::new(&Config::default());
        screen.create(PermissionStatus::Denied);
        let effects = screen.update(Message::PermissionResult(camera_result(
            PermissionStatus::Granted,
        )));
        assert_eq!(effects, vec![Effect::StartCamera]);
        assert_eq!(screen.state(), ScreenState::StartingCamera);
    }

    #[test]
    fn test_result_for_other_request_code_is_ignored() {
        let mut screen = BoothScreen::new(&Config::default());
        screen.create(PermissionStatus::Denied);
        let mut result = camera_result(PermissionStatus::Granted);
        result.request_code = 99;
        assert!(screen.update(Message::PermissionResult(result)).is_empty());
        assert_eq!(screen.state(), ScreenState::AwaitingPermission);
    }

    #[test]
    fn test_tap_before_permission_is_ignored() {
        let mut screen = BoothScreen::new(&Config::default());
        screen.create(PermissionStatus::Denied);
        screen.update(Message::PreviewTapped(Instant::now()));
        assert!(!screen.is_countdown_running());
    }

    #[test]
    fn test_tap_shows_first_label_immediately() {
        let mut screen = ready_screen();
        let effects = screen.update(Message::PreviewTapped(Instant::now()));
        assert!(effects.is_empty());
        assert!(screen.is_countdown_running());
        assert_eq!(screen.label(), "5");
    }

    #[test]
    fn test_camera_failure_is_silent() {
        let mut screen = BoothScreen::new(&Config::default());
        screen.create(PermissionStatus::Granted);
        let effects = screen.update(Message::CameraStarted(Err(CameraError::NoCameraFound)));
        assert!(effects.is_empty());
        assert_eq!(screen.state(), ScreenState::CameraUnavailable);
        assert_eq!(screen.notifications().count(), 0);
    }

    #[test]
    fn test_capture_failure_keeps_screen_usable() {
        let mut screen = ready_screen();
        let err = CaptureError::new(CaptureErrorCode::CameraClosed, "closed");
        screen.update(Message::CaptureFinished(Err(err)));
        assert_eq!(screen.notifications().collect::<Vec<_>>(), vec!["Error 3"]);
        assert_eq!(screen.state(), ScreenState::Ready);

        let t0 = Instant::now();
        screen.update(Message::PreviewTapped(t0));
        assert!(screen.is_countdown_running());
    }

    #[test]
    fn test_toast_appears_on_next_tick_and_expires() {
        let mut screen = ready_screen();
        screen.update(Message::CaptureFinished(Ok(CapturedImage {
            width: 640,
            height: 480,
            timestamp: chrono::Local::now(),
        })));
        assert!(screen.toast().is_none());

        let t0 = Instant::now();
        screen.update(Message::Tick(t0));
        assert_eq!(screen.toast().unwrap().text, "Captured a 640x480 image!");

        screen.update(Message::Tick(t0 + Duration::from_millis(3500)));
        assert!(screen.toast().is_none());
    }

    #[test]
    fn test_destroy_cancels_countdown_and_ignores_late_results() {
        let mut screen = ready_screen();
        let t0 = Instant::now();
        screen.update(Message::PreviewTapped(t0));
        screen.update(Message::Destroy);

        assert!(screen.is_finished());
        assert!(!screen.is_countdown_running());
        assert!(screen.update(Message::Tick(t0 + Duration::from_secs(5))).is_empty());
        screen.update(Message::CaptureFinished(Err(CaptureError::camera_closed())));
        assert_eq!(screen.notifications().count(), 0);
    }
}
