// SPDX-License-Identifier: GPL-3.0-only

//! Runtime camera permission
//!
//! Mirrors a request/result handshake: a request carries a request code and
//! a list of permissions, the result carries the same code plus parallel
//! arrays of permissions and grant results.

pub mod portal;

use crate::constants::{app_info, permission};
use tracing::{info, warn};

/// Permissions the booth can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
}

/// Outcome of a permission check or request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// A pending permission request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequest {
    pub request_code: i32,
    pub permissions: Vec<Permission>,
}

impl PermissionRequest {
    /// The booth's only request: camera access
    pub fn camera() -> Self {
        Self {
            request_code: permission::CAMERA_REQUEST_CODE,
            permissions: vec![Permission::Camera],
        }
    }
}

/// Result delivered for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionResult {
    pub request_code: i32,
    pub permissions: Vec<Permission>,
    pub grant_results: Vec<PermissionStatus>,
}

impl PermissionResult {
    /// True when every requested permission was granted
    ///
    /// An empty result (request cancelled) or arrays of different lengths
    /// count as not granted.
    pub fn all_granted(&self) -> bool {
        !self.permissions.is_empty()
            && self.permissions.len() == self.grant_results.len()
            && self
                .grant_results
                .iter()
                .all(|status| *status == PermissionStatus::Granted)
    }
}

/// Check whether a permission is already held
///
/// Outside a Flatpak sandbox camera nodes are reachable directly. Inside
/// one the portal decides, so the check reports `Denied` and a request
/// follows.
pub fn check_self_permission(permission: Permission) -> PermissionStatus {
    match permission {
        Permission::Camera if !app_info::is_flatpak() => PermissionStatus::Granted,
        Permission::Camera => PermissionStatus::Denied,
    }
}

/// Ask for every permission in `request`
///
/// Failures to reach the portal are logged and reported as denials.
pub async fn request_permissions(request: PermissionRequest) -> PermissionResult {
    let mut grant_results = Vec::with_capacity(request.permissions.len());

    for permission in &request.permissions {
        let status = match permission {
            Permission::Camera => match portal::access_camera().await {
                Ok(status) => status,
                Err(err) => {
                    warn!(error = %err, "Camera permission request failed");
                    PermissionStatus::Denied
                }
            },
        };
        info!(?permission, ?status, "Permission request answered");
        grant_results.push(status);
    }

    PermissionResult {
        request_code: request.request_code,
        permissions: request.permissions,
        grant_results,
    }
}
