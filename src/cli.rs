// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a single headless capture

use futures::StreamExt;
use photobooth::Config;
use photobooth::app::notifier::{PERMISSIONS_NOT_GRANTED, capture_outcome_message};
use photobooth::backends::camera::{
    CameraProvider, ProcessCameraProvider, start_session, use_case_configs,
};
use photobooth::constants::timing;
use photobooth::permission::{
    self, Permission, PermissionRequest, PermissionStatus, check_self_permission,
};

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize GStreamer
    gstreamer::init()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let provider = match runtime.block_on(ProcessCameraProvider::acquire()) {
        Ok(provider) => provider,
        Err(err) => {
            println!("No cameras found ({}).", err);
            return Ok(());
        }
    };

    let (selector, _, _) = use_case_configs(config);
    let selected = selector.select(provider.cameras());

    println!("Available cameras:");
    println!();
    for (index, camera) in provider.cameras().iter().enumerate() {
        let marker = if selected == Some(camera) { "*" } else { " " };
        let facing = camera
            .location
            .map(|facing| facing.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{} [{}] {}", marker, index, camera.name);
        println!("      Facing: {}", facing);
        if !camera.path.is_empty() {
            println!("      Path: {}", camera.path);
        }
        if let Some(v4l2_path) = &camera.v4l2_path {
            println!("      Device: {}", v4l2_path);
        }
        println!();
    }

    if selected.is_none() {
        println!("No {} camera available.", config.camera.facing);
    }

    Ok(())
}

/// Run the permission gate and a camera session, then capture once
pub fn snap(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize GStreamer
    gstreamer::init()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(snap_once(config))
}

async fn snap_once(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if check_self_permission(Permission::Camera) == PermissionStatus::Denied {
        let result = permission::request_permissions(PermissionRequest::camera()).await;
        if !result.all_granted() {
            return Err(PERMISSIONS_NOT_GRANTED.into());
        }
    }

    let mut provider = ProcessCameraProvider::acquire().await?;
    let mut bound = start_session(&mut provider, config)?;
    println!("Using camera: {}", bound.device.name);

    // Wait for the first frame, then let exposure settle
    match tokio::time::timeout(timing::SNAP_TIMEOUT, bound.preview.next()).await {
        Ok(Some(_)) => tokio::time::sleep(timing::SNAP_WARMUP).await,
        Ok(None) | Err(_) => {
            provider.unbind_all();
            return Err("Failed to capture frame from camera".into());
        }
    }

    println!("Capturing...");
    let result = bound.image_capture.take_picture();
    println!("{}", capture_outcome_message(&result));
    provider.unbind_all();

    result?;
    Ok(())
}
