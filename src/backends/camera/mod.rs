// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Screen runtime (UI) │
//! └──────────┬───────────┘
//!            │ acquire (on CameraExecutor), then bind
//!            ▼
//! ┌──────────────────────┐
//! │ CameraProvider trait │  ← enumeration, bind/unbind
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ PipeWirePipeline     │  ← preview frames + latest-frame slot
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ ImageCapture         │  ← still capture on the executor
//! └──────────────────────┘
//! ```

pub mod capture;
pub mod executor;
pub mod pipewire;
pub mod types;

pub use capture::{FrameSlot, ImageCapture, ImageCaptureConfig, LatestFrame, PreviewConfig};
pub use executor::CameraExecutor;
pub use types::*;

use crate::config::Config;
use crate::errors::CameraError;
use tracing::{error, info};

/// Use cases bound to one camera
pub struct BoundCamera {
    pub device: CameraDevice,
    pub image_capture: ImageCapture,
    pub preview: FrameReceiver,
}

/// Access to the device's cameras
///
/// A provider owns whatever it binds: unbinding (or dropping the provider)
/// stops the preview and closes the capture endpoint.
pub trait CameraProvider: Send {
    /// Cameras discovered during acquisition
    fn cameras(&self) -> &[CameraDevice];

    /// Release every bound use case
    fn unbind_all(&mut self);

    /// Bind a preview and a still capture endpoint to the selected camera
    fn bind_to_lifecycle(
        &mut self,
        selector: &CameraSelector,
        image_capture: ImageCaptureConfig,
        preview: PreviewConfig,
    ) -> Result<BoundCamera, CameraError>;
}

/// Camera provider backed by PipeWire
pub struct ProcessCameraProvider {
    cameras: Vec<CameraDevice>,
    bound: Option<pipewire::PipeWirePipeline>,
}

impl ProcessCameraProvider {
    /// One-time asynchronous acquisition
    ///
    /// Enumeration shells out to `pw-cli`, so it runs on the executor's
    /// blocking thread.
    pub async fn acquire() -> Result<Self, CameraError> {
        let cameras = tokio::task::spawn_blocking(pipewire::enumerate_pipewire_cameras)
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    CameraError::Interrupted(e.to_string())
                } else {
                    CameraError::ExecutionFailed(e.to_string())
                }
            })?
            .ok_or_else(|| {
                CameraError::ExecutionFailed("PipeWire camera source not available".to_string())
            })?;

        if cameras.is_empty() {
            return Err(CameraError::NoCameraFound);
        }

        info!(count = cameras.len(), "Camera provider acquired");
        Ok(Self {
            cameras,
            bound: None,
        })
    }
}

impl CameraProvider for ProcessCameraProvider {
    fn cameras(&self) -> &[CameraDevice] {
        &self.cameras
    }

    fn unbind_all(&mut self) {
        if self.bound.take().is_some() {
            info!("Unbound camera use cases");
        }
    }

    fn bind_to_lifecycle(
        &mut self,
        selector: &CameraSelector,
        image_capture: ImageCaptureConfig,
        preview: PreviewConfig,
    ) -> Result<BoundCamera, CameraError> {
        let device = selector
            .select(&self.cameras)
            .cloned()
            .ok_or_else(|| CameraError::NoMatchingCamera(format!("{} camera", selector.facing)))?;

        let latest = LatestFrame::default();
        let (sender, receiver) = futures::channel::mpsc::channel(preview.channel_capacity);
        let pipeline =
            pipewire::PipeWirePipeline::new(&device, &preview, latest.clone(), sender)
                .map_err(|e| {
                    error!(device = %device.name, error = %e, "Failed to bind camera");
                    CameraError::BindFailed(e.to_string())
                })?;

        self.bound = Some(pipeline);
        info!(device = %device.name, "Camera bound");

        Ok(BoundCamera {
            device,
            image_capture: ImageCapture::new(latest, image_capture),
            preview: receiver,
        })
    }
}

/// Selector, capture and preview configuration derived from user settings
pub fn use_case_configs(config: &Config) -> (CameraSelector, ImageCaptureConfig, PreviewConfig) {
    let mut selector = CameraSelector::facing(config.camera.facing);
    if let Some(path) = &config.camera.device_path {
        selector = selector.with_device_path(path.clone());
    }
    let image_capture = ImageCaptureConfig::builder()
        .flash_mode(config.flash_mode)
        .build();
    let preview = PreviewConfig {
        target_resolution: config.camera.preview_resolution,
        ..PreviewConfig::default()
    };
    (selector, image_capture, preview)
}

/// Unbind any previous session and bind a fresh one
pub fn start_session(
    provider: &mut dyn CameraProvider,
    config: &Config,
) -> Result<BoundCamera, CameraError> {
    let (selector, image_capture, preview) = use_case_configs(config);
    provider.unbind_all();
    provider.bind_to_lifecycle(&selector, image_capture, preview)
}
