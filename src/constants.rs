// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Countdown defaults
pub mod countdown {
    /// Total countdown length in milliseconds
    pub const TOTAL_MS: u64 = 6_000;

    /// Interval between ticks in milliseconds
    pub const TICK_MS: u64 = 1_000;

    /// Label shown on the tick that triggers the capture
    pub const DONE_LABEL: &str = ":)";
}

/// Runtime permission request parameters
pub mod permission {
    /// Request code attached to the camera permission request
    pub const CAMERA_REQUEST_CODE: i32 = 10;

    /// D-Bus destination of the desktop portal
    pub const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";

    /// Object path of the desktop portal
    pub const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";

    /// Camera portal interface
    pub const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";

    /// Request object interface carrying the `Response` signal
    pub const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

    /// Portal response code for a granted request
    pub const RESPONSE_SUCCESS: u32 = 0;
}

/// Pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Capacity of the preview frame channel
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 4;

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Name of the appsink element inside the launch string
    pub const SINK_NAME: &str = "sink";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// How long a long toast stays on screen
    pub const TOAST_LONG_MS: u64 = 3_500;

    /// Input poll timeout of the terminal loop (roughly one frame at 60 Hz)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// How long `snap` waits for the first preview frame
    pub const SNAP_WARMUP: Duration = Duration::from_millis(500);

    /// Upper bound for `snap` to get any frame at all
    pub const SNAP_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Terminal UI constants
pub mod ui {
    /// Placeholder shown before the first preview frame arrives
    pub const WAITING_FOR_CAMERA: &str = "Waiting for camera...";

    /// Placeholder shown when no camera could be bound
    pub const CAMERA_UNAVAILABLE: &str = "Camera unavailable";

    /// Status bar hint
    pub const STATUS_HINT: &str = "click / space: countdown | q: quit";
}

/// Application information utilities
pub mod app_info {
    use std::path::Path;

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Check if the application is running inside a Flatpak sandbox
    pub fn is_flatpak() -> bool {
        Path::new("/.flatpak-info").exists()
    }

    /// Get the runtime environment string (e.g., "Flatpak" or "Native")
    pub fn runtime_environment() -> &'static str {
        if is_flatpak() { "Flatpak" } else { "Native" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_tick_precedes_expiry() {
        assert!(countdown::TICK_MS < countdown::TOTAL_MS);
        assert_eq!(countdown::TOTAL_MS % countdown::TICK_MS, 0);
    }

    #[test]
    fn test_runtime_environment_label() {
        let env = app_info::runtime_environment();
        assert!(env == "Flatpak" || env == "Native");
    }
}
