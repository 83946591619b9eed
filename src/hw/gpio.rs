// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Push-pull GPIO outputs exposed through `embedded_hal::digital::OutputPin`.
//!
//! Used for the bridge PH and nSLEEP lines.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use stm32f7xx_hal::gpio::{self, Output, PinState, PushPull};

/// Push-pull output line, generic over any GPIO pin.
pub struct OutPin<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> OutPin<P, N> {
    /// Configure the pin as a push-pull output driven to `initial`.
    pub fn new<MODE>(pin: gpio::Pin<P, N, MODE>, initial: PinState) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_state(initial);
        Self { pin }
    }

    pub fn free(self) -> gpio::Pin<P, N, Output<PushPull>> {
        self.pin
    }
}

impl<const P: char, const N: u8> ErrorType for OutPin<P, N> {
    type Error = Infallible;
}

impl<const P: char, const N: u8> OutputPin for OutPin<P, N> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.pin.set_low();
        Ok(())
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.pin.set_high();
        Ok(())
    }
}
