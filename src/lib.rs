// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # motorctl
//!
//! Closed-loop motor-control core for a brushed DC motor on a PH/EN H-bridge, written in Rust,
//! targeting STM32F7 MCUs.
//!
//! The core is hardware-independent: it consumes `embedded-hal` traits, a wrapping 16-bit
//! microsecond [`time::Clock`], and plain closures for the ADC/DAC. The `stm32f7` feature adds the
//! board adapters and the firmware binary.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`time`] | Wrapping microsecond clock and wrap-correct durations |
//! | [`control`] | PID + feed-forward controller |
//! | [`motors`] | Motor with encoder, PWM actuation, current sense and current limit |
//! | `hw` | STM32F7 wrappers for timers, ADC, DAC, GPIO, PWM and USART (feature `stm32f7`) |
//! | `logger` | `log` backend over the debug USART (feature `stm32f7`) |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features stm32f7 --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![no_std]

pub mod control;
pub mod motors;
pub mod time;

#[cfg(feature = "stm32f7")]
pub mod hw;
#[cfg(feature = "stm32f7")]
pub mod logger;
