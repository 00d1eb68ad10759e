// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - live camera preview, countdown on tap, still capture
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Booth screen state machine, countdown and notifications
//! - [`backends`]: Camera provider, PipeWire pipeline and capture endpoint
//! - [`permission`]: Runtime camera permission through the desktop portal
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal runtime that owns the UI thread
//!
//! # Example
//!
//! ```ignore
//! // The booth is a terminal application, typically run via:
//! // photobooth
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod permission;
pub mod terminal;

// Re-export commonly used types
pub use app::{BoothScreen, Effect, Message, ScreenState};
pub use config::Config;
pub use errors::{AppError, AppResult};
