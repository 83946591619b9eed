// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Edge-aligned PWM on TIM4 using direct PAC register access, exposed through
//! `embedded_hal::pwm::SetDutyCycle`.
//!
//! One timer drives up to four channels at the same frequency; each [`PwmOut`] owns one channel.
//! The channel pin must already be in its TIM4 alternate function (AF2).

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use stm32f7xx_hal::pac;

/// TIM4 output compare channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    C1,
    C2,
    C3,
    C4,
}

/// Configured TIM4 time base, split into channels with [`Pwm::channel`].
pub struct Pwm {
    tim: pac::TIM4,
    period: u16,
}

impl Pwm {
    /// Configure TIM4 as an up-counting PWM time base at `freq_hz`.
    ///
    /// `timer_clk_hz` is the TIM4 kernel clock (APB1 timer clock). A `freq_hz` above it (or zero)
    /// falls back to the fastest and slowest rates the timer can produce.
    pub fn tim4(tim4: pac::TIM4, timer_clk_hz: u32, freq_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim4en().set_bit());

        let tim = tim4;

        let (psc, period) = pwm_timing(timer_clk_hz, freq_hz);

        tim.cr1.modify(|_, w| w.cen().clear_bit());

        tim.psc.write(|w| unsafe { w.bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(period as u32) });

        // Auto-reload preload so period changes land on an update event
        tim.cr1.modify(|r, w| unsafe { w.bits(r.bits() | (1 << 7)) });
        tim.egr.write(|w| w.ug().set_bit());

        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim, period }
    }

    /// Enable one output channel in PWM mode 1 at zero duty.
    pub fn channel(&self, ch: Channel) -> PwmOut {
        let tim = &self.tim;

        // OCxM = 110 (PWM mode 1), OCxPE = 1 (preload)
        let mode = (0b110 << 4) | (1 << 3);
        match ch {
            Channel::C1 => tim
                .ccmr1_output()
                .modify(|r, w| unsafe { w.bits(r.bits() | mode) }),
            Channel::C2 => tim
                .ccmr1_output()
                .modify(|r, w| unsafe { w.bits(r.bits() | (mode << 8)) }),
            Channel::C3 => tim
                .ccmr2_output()
                .modify(|r, w| unsafe { w.bits(r.bits() | mode) }),
            Channel::C4 => tim
                .ccmr2_output()
                .modify(|r, w| unsafe { w.bits(r.bits() | (mode << 8)) }),
        }

        let mut out = PwmOut {
            ch,
            period: self.period,
        };
        let _ = out.set_duty_cycle_fully_off();

        // CCxE
        let enable = 1 << (4 * ch as u32);
        tim.ccer.modify(|r, w| unsafe { w.bits(r.bits() | enable) });

        out
    }

    #[inline]
    pub fn free(self) -> pac::TIM4 {
        self.tim
    }
}

/// Prescaler and auto-reload for `freq_hz`, using the largest 16-bit period the prescaler allows
/// for the best duty resolution.
fn pwm_timing(timer_clk_hz: u32, freq_hz: u32) -> (u32, u16) {
    let ticks = timer_clk_hz.checked_div(freq_hz).unwrap_or(u32::MAX).max(2);
    let psc = (ticks - 1) / 0x1_0000;
    let period = (ticks / (psc + 1) - 1) as u16;
    (psc, period)
}

/// One enabled TIM4 PWM channel.
pub struct PwmOut {
    ch: Channel,
    period: u16,
}

impl ErrorType for PwmOut {
    type Error = Infallible;
}

impl SetDutyCycle for PwmOut {
    #[inline]
    fn max_duty_cycle(&self) -> u16 {
        self.period
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        // Each channel only touches its own compare register
        let tim = unsafe { &*pac::TIM4::ptr() };
        let duty = duty.min(self.period) as u32;
        match self.ch {
            Channel::C1 => tim.ccr1.write(|w| unsafe { w.bits(duty) }),
            Channel::C2 => tim.ccr2.write(|w| unsafe { w.bits(duty) }),
            Channel::C3 => tim.ccr3.write(|w| unsafe { w.bits(duty) }),
            Channel::C4 => tim.ccr4.write(|w| unsafe { w.bits(duty) }),
        }
        Ok(())
    }
}
