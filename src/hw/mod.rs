// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # STM32F7 Board Layer
//!
//! MCU-level wrappers that implement the primitives consumed by [`motors`](crate::motors) and
//! [`control`](crate::control).
//!
//! | Wrapper | Peripheral | Provides |
//! | ------- | ---------- | -------- |
//! | [`MicrosTimer`] | TIM2 | [`Clock`](crate::time::Clock) |
//! | [`Encoder`] | TIM3 | [`QuadratureCounter`](crate::motors::QuadratureCounter) |
//! | [`Pwm`] / [`PwmOut`] | TIM4 | `SetDutyCycle` per channel |
//! | [`OutPin`] | any GPIO | `OutputPin` |
//! | [`Adc`] | ADC1 | current-sense reader closure |
//! | [`Dac`] | DAC | current-limit writer closure |
//! | [`Usart`] | any USART | debug output for the logger |

pub mod adc;
pub mod dac;
pub mod encoder;
pub mod gpio;
pub mod pwm;
pub mod timer;
pub mod usart;

pub use adc::Adc;
pub use dac::{Dac, DacChannel};
pub use encoder::Encoder;
pub use gpio::OutPin;
pub use pwm::{Channel as PwmChannel, Pwm, PwmOut};
pub use timer::MicrosTimer;
pub use usart::Usart;
