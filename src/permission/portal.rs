// SPDX-License-Identifier: GPL-3.0-only

//! Camera access through xdg-desktop-portal
//!
//! `AccessCamera` returns a request object; the answer arrives later as that
//! object's `Response` signal. The request path is predictable from the
//! handle token, so the signal subscription is set up before the call.

use super::PermissionStatus;
use crate::constants::permission::{
    CAMERA_INTERFACE, PORTAL_DESTINATION, PORTAL_PATH, REQUEST_INTERFACE, RESPONSE_SUCCESS,
};
use crate::errors::PermissionError;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

/// Ask the portal for camera access and wait for the user's answer
pub async fn access_camera() -> Result<PermissionStatus, PermissionError> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| PermissionError::PortalUnavailable(e.to_string()))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DESTINATION, PORTAL_PATH, CAMERA_INTERFACE)
        .await
        .map_err(|e| PermissionError::PortalUnavailable(e.to_string()))?;

    let present: bool = camera
        .get_property("IsCameraPresent")
        .await
        .map_err(|e| PermissionError::PortalUnavailable(e.to_string()))?;
    if !present {
        warn!("Portal reports no camera present");
        return Ok(PermissionStatus::Denied);
    }

    let token = format!("photobooth_{}", uuid::Uuid::new_v4().simple());
    let sender = connection
        .unique_name()
        .ok_or_else(|| PermissionError::RequestFailed("No unique bus name".to_string()))?
        .as_str()
        .to_string();
    let request_path = request_path(&sender, &token);
    debug!(request_path = %request_path, "Subscribing to portal response");

    let request = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        request_path.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(|e| PermissionError::RequestFailed(e.to_string()))?;
    let mut responses = request
        .receive_signal("Response")
        .await
        .map_err(|e| PermissionError::RequestFailed(e.to_string()))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));
    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| PermissionError::RequestFailed(e.to_string()))?;
    info!(handle = %handle, "Camera access requested");

    let message = responses.next().await.ok_or_else(|| {
        PermissionError::RequestFailed("Portal closed the request without answering".to_string())
    })?;
    let (response, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| PermissionError::RequestFailed(e.to_string()))?;

    debug!(response, "Portal answered camera request");
    Ok(status_from_response(response))
}

/// Object path of the request the portal creates for `sender` and `token`
pub fn request_path(sender: &str, token: &str) -> String {
    let sender = sender.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_PATH, sender, token)
}

/// Map a portal response code to a permission status
pub fn status_from_response(response: u32) -> PermissionStatus {
    if response == RESPONSE_SUCCESS {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    }
}
