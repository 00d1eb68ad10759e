// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration
//!
//! Cameras are discovered by parsing `pw-cli ls Node`. Lens placement is not
//! part of that listing, so it is read per node from `pw-cli info`.

use super::super::types::{CameraDevice, LensFacing};
use tracing::{debug, info, warn};

/// Name given to the auto-selected camera when pw-cli is unavailable
pub const DEFAULT_CAMERA_NAME: &str = "Default Camera (PipeWire)";

/// Enumerate cameras using PipeWire
///
/// Returns `None` when GStreamer or `pipewiresrc` is unavailable. When
/// `pw-cli` is missing, a single auto-selecting default camera is returned.
pub fn enumerate_pipewire_cameras() -> Option<Vec<CameraDevice>> {
    debug!("Attempting to enumerate cameras via PipeWire");

    if let Err(err) = gstreamer::init() {
        warn!(error = %err, "GStreamer init failed");
        return None;
    }

    if !is_pipewire_available() {
        debug!("pipewiresrc not available");
        return None;
    }

    if let Some(listing) = run_pw_cli(&["ls", "Node"]) {
        let mut cameras = parse_node_listing(&listing);
        if !cameras.is_empty() {
            for camera in &mut cameras {
                if let Some(id) = camera.node_id.clone() {
                    camera.location = query_node_location(&id);
                }
            }
            info!(count = cameras.len(), "Enumerated cameras via pw-cli");
            return Some(cameras);
        }
        debug!("No cameras found via pw-cli");
    }

    info!("Using PipeWire auto-selection (default camera)");
    Some(vec![CameraDevice {
        name: DEFAULT_CAMERA_NAME.to_string(),
        path: String::new(),
        node_id: None,
        v4l2_path: None,
        location: None,
    }])
}

/// Check whether the `pipewiresrc` element can be created
pub fn is_pipewire_available() -> bool {
    gstreamer::ElementFactory::find("pipewiresrc").is_some()
}

fn run_pw_cli(args: &[&str]) -> Option<String> {
    let output = std::process::Command::new("pw-cli").args(args).output().ok()?;
    if !output.status.success() {
        debug!(?args, "pw-cli command failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Properties collected for one node while scanning the listing
#[derive(Default)]
struct NodeBlock {
    id: Option<String>,
    serial: Option<String>,
    description: Option<String>,
    nick: Option<String>,
    object_path: Option<String>,
    location: Option<LensFacing>,
    is_video_source: bool,
}

impl NodeBlock {
    fn into_device(self) -> Option<CameraDevice> {
        if !self.is_video_source {
            return None;
        }
        let id = self.id?;
        let name = self.description.or(self.nick)?;

        // Prefer object.serial for target-object, fall back to the node ID
        let path = match &self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", id),
        };
        let v4l2_path = self
            .object_path
            .as_deref()
            .and_then(|p| p.strip_prefix("v4l2:"))
            .map(str::to_string);

        debug!(id = %id, name = %name, path = %path, "Found video camera");
        Some(CameraDevice {
            name,
            path,
            node_id: Some(id),
            v4l2_path,
            location: self.location,
        })
    }
}

/// Parse `pw-cli ls Node` output into camera devices
///
/// Only nodes whose `media.class` is `Video/Source` are kept.
pub fn parse_node_listing(listing: &str) -> Vec<CameraDevice> {
    let mut cameras = Vec::new();
    let mut current: Option<NodeBlock> = None;

    for line in listing.lines() {
        let trimmed = line.trim();

        // Node header: "id 76, type PipeWire:Interface:Node/3"
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            if let Some(device) = current.take().and_then(NodeBlock::into_device) {
                cameras.push(device);
            }
            let id = rest.split(',').next().unwrap_or_default().trim().to_string();
            current = Some(NodeBlock {
                id: Some(id),
                ..NodeBlock::default()
            });
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = parse_property(trimmed) else {
            continue;
        };
        match key {
            "media.class" => block.is_video_source = value == "Video/Source",
            "object.serial" => block.serial = Some(value),
            "object.path" => block.object_path = Some(value),
            "node.nick" => block.nick = Some(value),
            "node.description" => block.description = Some(value),
            "api.libcamera.location" => block.location = LensFacing::from_location(&value),
            _ => {}
        }
    }

    if let Some(device) = current.and_then(NodeBlock::into_device) {
        cameras.push(device);
    }

    cameras
}

/// Read the libcamera location from `pw-cli info <id>`
fn query_node_location(node_id: &str) -> Option<LensFacing> {
    let info = run_pw_cli(&["info", node_id])?;
    let location = parse_location(&info);
    debug!(node_id, location = ?location, "Queried camera location");
    location
}

/// Find `api.libcamera.location` in a `pw-cli info` dump
pub fn parse_location(info: &str) -> Option<LensFacing> {
    info.lines()
        .filter_map(|line| parse_property(line.trim()))
        .find(|(key, _)| *key == "api.libcamera.location")
        .and_then(|(_, value)| LensFacing::from_location(&value))
}

/// Split a `key = "value"` line; pw-cli marks changed props with a leading `*`
fn parse_property(line: &str) -> Option<(&str, String)> {
    let line = line.trim_start_matches('*').trim();
    let (key, rest) = line.split_once('=')?;
    let start = rest.find('"')?;
    let end = rest[start + 1..].find('"')?;
    Some((key.trim(), rest[start + 1..start + 1 + end].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
	id 31, type PipeWire:Interface:Node/3
 		object.serial = "31"
 		node.name = "alsa_output.pci"
 		media.class = "Audio/Sink"
	id 58, type PipeWire:Interface:Node/3
 		object.serial = "2146"
 		object.path = "v4l2:/dev/video0"
 		node.description = "Integrated Camera (V4L2)"
 		node.nick = "Integrated Camera"
 		media.class = "Video/Source"
	id 60, type PipeWire:Interface:Node/3
 		node.nick = "imx371"
 		media.class = "Video/Source"
 		api.libcamera.location = "front"
"#;

    #[test]
    fn test_only_video_sources_are_listed() {
        let cameras = parse_node_listing(LISTING);
        assert_eq!(cameras.len(), 2);
    }

    #[test]
    fn test_serial_and_v4l2_path_are_used() {
        let cameras = parse_node_listing(LISTING);
        let webcam = &cameras[0];
        assert_eq!(webcam.name, "Integrated Camera (V4L2)");
        assert_eq!(webcam.path, "pipewire-serial-2146");
        assert_eq!(webcam.node_id.as_deref(), Some("58"));
        assert_eq!(webcam.v4l2_path.as_deref(), Some("/dev/video0"));
        assert_eq!(webcam.location, None);
    }

    #[test]
    fn test_node_id_fallback_and_nick_name() {
        let cameras = parse_node_listing(LISTING);
        let sensor = &cameras[1];
        assert_eq!(sensor.name, "imx371");
        assert_eq!(sensor.path, "pipewire-60");
        assert_eq!(sensor.location, Some(LensFacing::Front));
    }

    #[test]
    fn test_location_from_info_dump() {
        let info = "id: 60\n*\tprops:\n*\t\tapi.libcamera.location = \"back\"\n";
        assert_eq!(parse_location(info), Some(LensFacing::Back));
        assert_eq!(parse_location("id: 61\n"), None);
    }
}
