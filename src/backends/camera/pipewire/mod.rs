// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera backend
//!
//! Uses PipeWire (through GStreamer's `pipewiresrc`) for camera enumeration
//! and capture.

mod enumeration;
mod pipeline;

pub use enumeration::{
    DEFAULT_CAMERA_NAME, enumerate_pipewire_cameras, is_pipewire_available, parse_location,
    parse_node_listing,
};
pub use pipeline::{PipeWirePipeline, build_pipeline_string};
