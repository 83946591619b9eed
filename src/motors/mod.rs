// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! Motor-level wrappers that fuse actuation and sensing on top of the raw primitives in `hw`.
//!
//! ## Modules
//!
//! - [`motor`] - Brushed DC motor on a PH/EN bridge with encoder, current sense and current limit.

pub mod motor;

pub use motor::{Motor, MotorConfig, MotorParts, MotorState, QuadratureCounter};
