// SPDX-License-Identifier: GPL-3.0-only

//! Platform backends

pub mod camera;
