// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photobooth

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera permission errors
    Permission(PermissionError),
    /// Camera provider and session errors
    Camera(CameraError),
    /// Still capture errors
    Capture(CaptureError),
    /// Configuration errors
    Config(String),
    /// Terminal or filesystem I/O errors
    Io(String),
}

/// Permission gate errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The desktop portal could not be reached
    PortalUnavailable(String),
    /// The portal request failed midway
    RequestFailed(String),
}

/// Camera provider and session errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Provider acquisition was interrupted before it completed
    Interrupted(String),
    /// Provider acquisition failed while executing
    ExecutionFailed(String),
    /// No device matched the camera selector
    NoMatchingCamera(String),
    /// Binding the preview and capture use cases failed
    BindFailed(String),
}

/// Capture error codes reported to the user
///
/// The numeric values are stable and appear in the capture error toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureErrorCode {
    /// Unknown failure
    Unknown,
    /// Writing or reading the image failed
    FileIo,
    /// The capture itself failed (for example no frame was available)
    CaptureFailed,
    /// The camera was closed or never bound
    CameraClosed,
    /// The selected camera is not valid
    InvalidCamera,
}

impl CaptureErrorCode {
    /// Numeric code shown to the user
    pub fn code(self) -> i32 {
        match self {
            CaptureErrorCode::Unknown => 0,
            CaptureErrorCode::FileIo => 1,
            CaptureErrorCode::CaptureFailed => 2,
            CaptureErrorCode::CameraClosed => 3,
            CaptureErrorCode::InvalidCamera => 4,
        }
    }
}

impl fmt::Display for CaptureErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Still capture error carrying a user-facing code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureError {
    pub code: CaptureErrorCode,
    pub message: String,
}

impl CaptureError {
    pub fn new(code: CaptureErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The camera endpoint is closed or was never bound
    pub fn camera_closed() -> Self {
        Self::new(CaptureErrorCode::CameraClosed, "Camera is not bound")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Permission(e) => write!(f, "Permission error: {}", e),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::PortalUnavailable(msg) => write!(f, "Portal unavailable: {}", msg),
            PermissionError::RequestFailed(msg) => write!(f, "Permission request failed: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::Interrupted(msg) => write!(f, "Provider acquisition interrupted: {}", msg),
            CameraError::ExecutionFailed(msg) => write!(f, "Provider acquisition failed: {}", msg),
            CameraError::NoMatchingCamera(msg) => write!(f, "No matching camera: {}", msg),
            CameraError::BindFailed(msg) => write!(f, "Failed to bind camera: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PermissionError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}

// Conversions from sub-errors to AppError
impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        AppError::Permission(err)
    }
}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
