// SPDX-License-Identifier: GPL-3.0-only

//! Booth screen logic
//!
//! - [`countdown`]: polled count-down timer and the label/capture controller
//! - [`notifier`]: capture outcome messages and the toast queue
//! - [`screen`]: the screen state machine driven by [`Message`]s

pub mod countdown;
pub mod notifier;
pub mod screen;

pub use countdown::{Countdown, CountdownState, CountdownStep};
pub use notifier::{Toast, ToastQueue};
pub use screen::{BoothScreen, Effect, Message, ScreenState};
