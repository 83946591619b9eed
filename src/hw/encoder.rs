// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder support via the STM32F7 TIM3 timer in encoder mode.
//!
//! TIM3 is a 16-bit counter. It wraps freely; [`Motor`](crate::motors::Motor) resolves the wraps
//! into a 32-bit position.

use stm32f7xx_hal::pac;

use crate::motors::QuadratureCounter;

pub struct Encoder<TIM> {
    tim: TIM,
}

impl<TIM> Encoder<TIM> {
    /// Consume the wrapper and return the underlying timer peripheral.
    #[inline]
    pub fn free(self) -> TIM {
        self.tim
    }
}

impl Encoder<pac::TIM3> {
    /// Configure TIM3 as a quadrature encoder with full 16-bit range.
    ///
    /// The CH1/CH2 pins must already be in their TIM3 alternate function.
    pub fn tim3(tim3: pac::TIM3) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim3en().set_bit());

        let tim = tim3;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        // Auto-reload: max 16-bit
        tim.arr.write(|w| unsafe { w.bits(0xFFFF) });

        // Slave mode: encoder mode 3 (count on both TI1 and TI2)
        tim.smcr.modify(|_, w| w.sms().bits(0b011));

        // Configure CH1/CH2 as inputs from TI1/TI2
        tim.ccmr1_input().modify(|_, w| w.cc1s().ti1().cc2s().ti2());

        // Polarity and enable for both channels.
        tim.ccer.modify(|_, w| {
            w.cc1p()
                .clear_bit()
                .cc2p()
                .clear_bit()
                .cc1e()
                .set_bit()
                .cc2e()
                .set_bit()
        });

        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    /// Read the raw 16-bit counter value.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.tim.cnt.read().cnt().bits()
    }
}

impl QuadratureCounter for Encoder<pac::TIM3> {
    #[inline]
    fn count(&mut self) -> u16 {
        self.raw()
    }
}
