// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! This module provides reusable building blocks for closed-loop motor control.
//!
//! ## Modules
//!
//! - [`pid`] - PID controller with feed-forward, time-weighted integral and anti-windup.

pub mod pid;

pub use pid::{Controller, Gains};
