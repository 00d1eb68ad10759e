// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backend

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Physical placement of a camera relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    /// Faces away from the user
    #[default]
    Back,
    /// Faces the user
    Front,
    /// Attached externally (USB webcams and similar)
    External,
}

impl LensFacing {
    /// Parse a libcamera location string ("back", "front", "external")
    pub fn from_location(location: &str) -> Option<Self> {
        match location.trim().to_ascii_lowercase().as_str() {
            "back" => Some(LensFacing::Back),
            "front" => Some(LensFacing::Front),
            "external" => Some(LensFacing::External),
            _ => None,
        }
    }
}

impl std::fmt::Display for LensFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LensFacing::Back => write!(f, "back"),
            LensFacing::Front => write!(f, "front"),
            LensFacing::External => write!(f, "external"),
        }
    }
}

/// Flash behaviour of the still capture endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Fire the flash when the scene is dark
    Auto,
    /// Always fire the flash
    On,
    /// Never fire the flash
    #[default]
    Off,
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Source selector understood by the pipeline (`pipewire-serial-N`,
    /// `pipewire-N`, `/dev/videoN`, or empty for PipeWire auto-selection)
    pub path: String,
    /// PipeWire node ID, used to query extra node properties
    pub node_id: Option<String>,
    /// V4L2 device behind the node (e.g. `/dev/video0`)
    pub v4l2_path: Option<String>,
    /// Where the camera sits, when the platform reports it
    pub location: Option<LensFacing>,
}

/// Chooses one camera out of the enumerated devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSelector {
    pub facing: LensFacing,
    pub device_path: Option<String>,
}

impl CameraSelector {
    /// Back-facing camera, falling back to cameras with unknown placement
    pub const DEFAULT_BACK_CAMERA: CameraSelector = CameraSelector {
        facing: LensFacing::Back,
        device_path: None,
    };

    pub fn facing(facing: LensFacing) -> Self {
        Self {
            facing,
            device_path: None,
        }
    }

    /// Select an exact device by path, ignoring placement
    pub fn with_device_path(mut self, path: impl Into<String>) -> Self {
        self.device_path = Some(path.into());
        self
    }

    /// Pick a device
    ///
    /// An explicit path must match exactly. Otherwise a device at the
    /// requested facing wins, then the first device whose placement is
    /// unknown or external. Cameras known to face the other way are never
    /// picked.
    pub fn select<'a>(&self, devices: &'a [CameraDevice]) -> Option<&'a CameraDevice> {
        if let Some(path) = &self.device_path {
            return devices
                .iter()
                .find(|d| &d.path == path || d.v4l2_path.as_ref() == Some(path));
        }

        devices
            .iter()
            .find(|d| d.location == Some(self.facing))
            .or_else(|| {
                devices
                    .iter()
                    .find(|d| matches!(d.location, None | Some(LensFacing::External)))
            })
    }
}

impl Default for CameraSelector {
    fn default() -> Self {
        Self::DEFAULT_BACK_CAMERA
    }
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// When the frame left the pipeline
    pub captured_at: Instant,
}

impl CameraFrame {
    /// RGB value at a pixel, clamped to the frame bounds
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 4) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

/// Descriptor of a captured still image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    /// Wall-clock capture time
    pub timestamp: chrono::DateTime<chrono::Local>,
}

/// Result of a still capture, as handed back to the screen
pub type CaptureResult = Result<CapturedImage, crate::errors::CaptureError>;

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
