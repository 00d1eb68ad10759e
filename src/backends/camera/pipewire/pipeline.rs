// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire GStreamer pipeline for preview and still capture

use super::super::capture::{LatestFrame, PreviewConfig};
use super::super::types::*;
use super::enumeration::is_pipewire_available;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// PipeWire camera pipeline
///
/// Decodes the camera into RGBA, publishes every frame to the latest-frame
/// slot used by still capture, and offers it to the preview channel without
/// blocking the streaming thread.
pub struct PipeWirePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    latest: LatestFrame,
}

impl PipeWirePipeline {
    /// Build and start a pipeline for `device`
    pub fn new(
        device: &CameraDevice,
        preview: &PreviewConfig,
        latest: LatestFrame,
        frame_sender: FrameSender,
    ) -> BackendResult<Self> {
        info!(device = %device.name, path = %device.path, "Creating PipeWire pipeline");

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        if !is_pipewire_available() {
            return Err(BackendError::NotAvailable(
                "pipewiresrc not available: factory not found".to_string(),
            ));
        }

        let description = build_pipeline_string(&device.path, preview.target_resolution);
        debug!(pipeline = %description, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast to pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name(pipeline::SINK_NAME)
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);

        let sample_slot = latest.clone();
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;

                    let frame = match frame_from_sample(&sample) {
                        Ok(frame) => frame,
                        Err(e) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                warn!(frame = frame_num, error = %e, "Dropping unreadable sample");
                            }
                            return Ok(gstreamer::FlowSuccess::Ok);
                        }
                    };

                    if let Ok(mut slot) = sample_slot.lock() {
                        slot.store(frame.clone());
                    }

                    // Preview is best effort: drop the frame if the UI is behind
                    let mut sender = frame_sender.clone();
                    if let Err(e) = sender.try_send(frame)
                        && frame_num % timing::FRAME_LOG_INTERVAL == 0
                    {
                        debug!(frame = frame_num, error = ?e, "Preview frame dropped");
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        // A source error or end of stream closes the capture endpoint
        if let Some(bus) = pipeline.bus() {
            let bus_slot = latest.clone();
            bus.set_sync_handler(move |_, msg| {
                match msg.view() {
                    gstreamer::MessageView::Error(err) => {
                        error!(
                            error = %err.error(),
                            debug = ?err.debug(),
                            source = ?err.src().map(|s| s.name()),
                            "Camera pipeline error"
                        );
                        close_slot(&bus_slot);
                    }
                    gstreamer::MessageView::Eos(_) => {
                        warn!("Camera stream ended");
                        close_slot(&bus_slot);
                    }
                    _ => {}
                }
                gstreamer::BusSyncReply::Drop
            });
        }

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if result.is_err() {
            error!("Pipeline failed to reach PLAYING");
            let _ = pipeline.set_state(gstreamer::State::Null);
            if let Some(bus) = pipeline.bus() {
                bus.unset_sync_handler();
            }
            close_slot(&latest);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline failed to start (state: {:?})",
                state
            )));
        }

        info!("PipeWire camera pipeline running");
        Ok(Self {
            pipeline,
            appsink,
            latest,
        })
    }
}

fn close_slot(latest: &LatestFrame) {
    if let Ok(mut slot) = latest.lock() {
        slot.close();
    }
}

/// Copy an RGBA sample into an owned frame
fn frame_from_sample(sample: &gstreamer::Sample) -> Result<CameraFrame, String> {
    let buffer = sample.buffer().ok_or("No buffer in sample")?;
    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        return Err("Buffer marked as corrupted".to_string());
    }
    let caps = sample.caps().ok_or("No caps in sample")?;
    let video_info = VideoInfo::from_caps(caps).map_err(|e| e.to_string())?;
    let map = buffer.map_readable().map_err(|e| e.to_string())?;

    Ok(CameraFrame {
        width: video_info.width(),
        height: video_info.height(),
        data: Arc::from(map.as_slice()),
        stride: video_info.stride()[0] as u32,
        captured_at: Instant::now(),
    })
}

/// Translate a device path into `pipewiresrc` properties
fn source_properties(device_path: &str) -> String {
    if device_path.is_empty() {
        String::new()
    } else if let Some(serial) = device_path.strip_prefix("pipewire-serial-") {
        format!("target-object={} ", serial)
    } else if let Some(node_id) = device_path.strip_prefix("pipewire-") {
        format!("target-object={} ", node_id)
    } else if device_path.starts_with("/dev/video") {
        format!("path=v4l2:{} ", device_path)
    } else {
        warn!(device_path, "Unknown device path format, using path property");
        format!("path={} ", device_path)
    }
}

/// Launch string producing RGBA frames at an optional resolution
pub fn build_pipeline_string(device_path: &str, resolution: Option<(u32, u32)>) -> String {
    let scale = match resolution {
        Some((width, height)) => format!(
            "videoscale ! video/x-raw,width=(int){},height=(int){} ! ",
            width, height
        ),
        None => String::new(),
    };
    format!(
        "pipewiresrc {}do-timestamp=true ! \
         queue max-size-buffers={} leaky=downstream ! \
         videoconvert ! {}video/x-raw,format={} ! \
         appsink name={}",
        source_properties(device_path),
        pipeline::MAX_BUFFERS,
        scale,
        pipeline::OUTPUT_FORMAT,
        pipeline::SINK_NAME,
    )
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        info!("Stopping PipeWire pipeline");
        // Release callback captures before tearing the pipeline down
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
        let _ = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        if let Some(bus) = self.pipeline.bus() {
            bus.unset_sync_handler();
        }
        close_slot(&self.latest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_properties() {
        assert_eq!(source_properties(""), "");
        assert_eq!(source_properties("pipewire-serial-2146"), "target-object=2146 ");
        assert_eq!(source_properties("pipewire-58"), "target-object=58 ");
        assert_eq!(source_properties("/dev/video0"), "path=v4l2:/dev/video0 ");
    }

    #[test]
    fn test_pipeline_string_outputs_rgba_to_sink() {
        let description = build_pipeline_string("pipewire-58", None);
        assert!(description.starts_with("pipewiresrc target-object=58 "));
        assert!(description.contains("video/x-raw,format=RGBA"));
        assert!(description.ends_with("appsink name=sink"));
        assert!(!description.contains("videoscale"));
    }

    #[test]
    fn test_pipeline_string_scales_to_requested_resolution() {
        let description = build_pipeline_string("", Some((640, 480)));
        assert!(description.contains("width=(int)640,height=(int)480"));
    }
}
