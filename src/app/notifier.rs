// SPDX-License-Identifier: GPL-3.0-only

//! Transient notifications
//!
//! Toasts are queued and shown one at a time, each for a fixed duration.

use crate::backends::camera::types::{CaptureResult, CapturedImage};
use crate::errors::CaptureErrorCode;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Shown when the camera permission is refused
pub const PERMISSIONS_NOT_GRANTED: &str = "Permissions not granted";

pub fn capture_success_message(image: &CapturedImage) -> String {
    format!("Captured a {}x{} image!", image.width, image.height)
}

pub fn capture_error_message(code: CaptureErrorCode) -> String {
    format!("Error {}", code.code())
}

/// Toast text for a capture outcome
pub fn capture_outcome_message(result: &CaptureResult) -> String {
    match result {
        Ok(image) => capture_success_message(image),
        Err(err) => capture_error_message(err.code),
    }
}

/// A toast currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ToastQueue {
    duration: Duration,
    current: Option<Toast>,
    pending: VecDeque<String>,
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
            pending: VecDeque::new(),
        }
    }

    /// Queue a toast; it appears on the next [`ToastQueue::tick`]
    pub fn push(&mut self, text: impl Into<String>) {
        self.pending.push_back(text.into());
    }

    /// Expire the current toast and show the next one
    pub fn tick(&mut self, now: Instant) {
        if let Some(toast) = &self.current
            && now.saturating_duration_since(toast.shown_at) >= self.duration
        {
            self.current = None;
        }
        if self.current.is_none()
            && let Some(text) = self.pending.pop_front()
        {
            self.current = Some(Toast {
                text,
                shown_at: now,
            });
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    /// Texts of the visible toast followed by the queued ones
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.current
            .iter()
            .map(|toast| toast.text.as_str())
            .chain(self.pending.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CaptureError;

    #[test]
    fn test_success_message_has_dimensions() {
        let image = CapturedImage {
            width: 4032,
            height: 3024,
            timestamp: chrono::Local::now(),
        };
        let text = capture_outcome_message(&Ok(image));
        assert_eq!(text, "Captured a 4032x3024 image!");
    }

    #[test]
    fn test_error_message_has_code() {
        let err = CaptureError::new(CaptureErrorCode::CaptureFailed, "boom");
        assert_eq!(capture_outcome_message(&Err(err)), "Error 2");
    }

    #[test]
    fn test_toasts_show_one_at_a_time() {
        let t0 = Instant::now();
        let mut toasts = ToastQueue::new(Duration::from_millis(3500));
        toasts.push("first");
        toasts.push("second");

        toasts.tick(t0);
        assert_eq!(toasts.current().map(|t| t.text.as_str()), Some("first"));

        toasts.tick(t0 + Duration::from_millis(3499));
        assert_eq!(toasts.current().map(|t| t.text.as_str()), Some("first"));

        toasts.tick(t0 + Duration::from_millis(3500));
        assert_eq!(toasts.current().map(|t| t.text.as_str()), Some("second"));

        toasts.tick(t0 + Duration::from_millis(7000));
        assert!(toasts.current().is_none());
        assert_eq!(toasts.messages().count(), 0);
    }

    #[test]
    fn test_messages_lists_visible_then_pending() {
        let mut toasts = ToastQueue::new(Duration::from_secs(1));
        toasts.push("a");
        toasts.tick(Instant::now());
        toasts.push("b");
        assert_eq!(toasts.messages().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
