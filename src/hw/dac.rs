// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 12-bit DAC used as the analog current-limit reference.
//!
//! The DAC output drives the bridge's current-regulation threshold, so once a code is written the
//! limit is enforced by hardware with no further software involvement.
//!
//! Example:
//! ```ignore
//! let dac = RefCell::new(Dac::new(dp.DAC));
//! let write_limit = Dac::make_writer(&dac, DacChannel::Two);
//! ```

use core::cell::RefCell;

use stm32f7xx_hal::pac;

/// DAC output channel (DAC_OUT1 = PA4, DAC_OUT2 = PA5).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DacChannel {
    One,
    Two,
}

impl DacChannel {
    /// ENx bit in DAC_CR.
    const fn enable_mask(self) -> u32 {
        match self {
            DacChannel::One => 1 << 0,
            DacChannel::Two => 1 << 16,
        }
    }
}

/// Wrapper around the DAC peripheral.
///
/// Channels start disabled. An enabled channel takes over its pin, so only enable the ones that
/// are wired as analog outputs.
pub struct Dac {
    dac: pac::DAC,
}

impl Dac {
    /// Enable the DAC clock. No output channel is connected yet.
    pub fn new(dac: pac::DAC) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.dacen().set_bit());

        Self { dac }
    }

    /// Connect one channel's buffered output to its pin (no trigger).
    pub fn enable(&mut self, channel: DacChannel) {
        let mask = channel.enable_mask();
        self.dac.cr.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
    }

    /// Write a right-aligned 12-bit code. Upper bits are ignored.
    pub fn write(&mut self, channel: DacChannel, code: u16) {
        let code = code & 0x0FFF;
        match channel {
            DacChannel::One => self.dac.dhr12r1.write(|w| unsafe { w.bits(code as u32) }),
            DacChannel::Two => self.dac.dhr12r2.write(|w| unsafe { w.bits(code as u32) }),
        }
    }

    #[inline]
    pub fn free(self) -> pac::DAC {
        self.dac
    }

    /// Enable `channel` and create a closure that writes it through the DAC reference.
    pub fn make_writer<'a>(dac_ref: &'a RefCell<Self>, channel: DacChannel) -> impl FnMut(u16) + 'a {
        dac_ref.borrow_mut().enable(channel);
        move |code| dac_ref.borrow_mut().write(channel, code)
    }
}
