// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Free-running 1 MHz time base on TIM2.
//!
//! TIM2 is a 32-bit timer; only its low 16 bits are exposed, which gives the wrapping
//! microsecond counter expected by [`Clock`].

use stm32f7xx_hal::pac;

use crate::time::{Clock, Time16};

/// TIM2 ticking once per microsecond.
pub struct MicrosTimer {
    tim: pac::TIM2,
}

impl MicrosTimer {
    /// Configure TIM2 as a free-running up-counter at 1 MHz.
    ///
    /// `timer_clk_hz` is the TIM2 kernel clock (APB1 timer clock), which must be a whole number of
    /// MHz. Slower clocks run the counter undivided.
    pub fn tim2(tim2: pac::TIM2, timer_clk_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());

        let tim = tim2;
        let psc = micros_prescaler(timer_clk_hz);

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        tim.psc.write(|w| unsafe { w.bits(psc) });
        tim.arr.write(|w| w.bits(0xFFFF_FFFF));

        // Load the prescaler now instead of at the first overflow
        tim.egr.write(|w| w.ug().set_bit());

        tim.cnt.write(|w| w.bits(0));
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    #[inline]
    pub fn free(self) -> pac::TIM2 {
        self.tim
    }
}

/// PSC value dividing `timer_clk_hz` down to 1 MHz.
fn micros_prescaler(timer_clk_hz: u32) -> u32 {
    (timer_clk_hz / 1_000_000).saturating_sub(1)
}

impl Clock for MicrosTimer {
    #[inline]
    fn now(&self) -> Time16 {
        self.tim.cnt.read().bits() as Time16
    }
}
