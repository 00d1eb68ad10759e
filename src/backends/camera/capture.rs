// SPDX-License-Identifier: GPL-3.0-only

//! Still capture and preview use cases
//!
//! The capture endpoint shares a "latest frame" slot with the pipeline's
//! streaming thread. Taking a picture copies out whatever full-resolution
//! frame is current, so the preview is never interrupted. Once the pipeline
//! stops (unbound, errored or end of stream) the slot is closed and every
//! capture reports `CameraClosed`.

use super::types::{CameraFrame, CaptureResult, CapturedImage, FlashMode};
use crate::constants::pipeline;
use crate::errors::{CaptureError, CaptureErrorCode};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Most recent frame from the pipeline, and whether the pipeline is gone
#[derive(Debug, Default)]
pub struct FrameSlot {
    frame: Option<CameraFrame>,
    closed: bool,
}

impl FrameSlot {
    /// Replace the current frame; ignored once closed
    pub fn store(&mut self, frame: CameraFrame) {
        if !self.closed {
            self.frame = Some(frame);
        }
    }

    /// Mark the source as stopped and drop the last frame
    pub fn close(&mut self) {
        self.closed = true;
        self.frame = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Slot shared between the streaming thread and the capture endpoint
pub type LatestFrame = Arc<Mutex<FrameSlot>>;

/// Configuration of the still capture endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageCaptureConfig {
    pub flash_mode: FlashMode,
}

impl ImageCaptureConfig {
    pub fn builder() -> ImageCaptureBuilder {
        ImageCaptureBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ImageCaptureBuilder {
    flash_mode: FlashMode,
}

impl ImageCaptureBuilder {
    pub fn flash_mode(mut self, flash_mode: FlashMode) -> Self {
        self.flash_mode = flash_mode;
        self
    }

    pub fn build(self) -> ImageCaptureConfig {
        ImageCaptureConfig {
            flash_mode: self.flash_mode,
        }
    }
}

/// Configuration of the live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Requested resolution; the camera default when unset
    pub target_resolution: Option<(u32, u32)>,
    /// Frames buffered between the pipeline and the UI
    pub channel_capacity: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            target_resolution: None,
            channel_capacity: pipeline::PREVIEW_CHANNEL_CAPACITY,
        }
    }
}

/// Bound still capture endpoint
///
/// Cheap to clone; clones share the same frame slot and can be moved to the
/// camera executor.
#[derive(Debug, Clone)]
pub struct ImageCapture {
    latest: LatestFrame,
    config: ImageCaptureConfig,
}

impl ImageCapture {
    pub fn new(latest: LatestFrame, config: ImageCaptureConfig) -> Self {
        if config.flash_mode != FlashMode::Off {
            warn!(flash_mode = ?config.flash_mode, "No flash unit available, capturing without flash");
        }
        Self { latest, config }
    }

    /// Capture a still image from the current frame
    pub fn take_picture(&self) -> CaptureResult {
        let frame = {
            let slot = self
                .latest
                .lock()
                .map_err(|_| CaptureError::new(CaptureErrorCode::Unknown, "Frame slot poisoned"))?;
            if slot.is_closed() {
                debug!("Capture requested after the camera closed");
                return Err(CaptureError::camera_closed());
            }
            slot.frame.clone()
        };

        let Some(frame) = frame else {
            debug!("Capture requested before the first frame arrived");
            return Err(CaptureError::new(
                CaptureErrorCode::CaptureFailed,
                "No frame available for capture",
            ));
        };

        info!(
            width = frame.width,
            height = frame.height,
            flash_mode = ?self.config.flash_mode,
            frame_age_ms = frame.captured_at.elapsed().as_millis() as u64,
            "Captured still image"
        );

        Ok(CapturedImage {
            width: frame.width,
            height: frame.height,
            timestamp: chrono::Local::now(),
        })
    }
}
