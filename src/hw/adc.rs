// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Current-sense ADC support for STM32F7 using direct PAC register access.
//!
//! Thin wrapper around ADC1 with blocking single-channel reads. The DRV8873 IPROPI output is an
//! analog current proportional to the load current, read here as a raw 12-bit code.
//!
//! Example:
//! ```ignore
//! let adc = RefCell::new(Adc::adc1(dp.ADC1));
//! let read_current = Adc::make_reader(&adc, 14);
//! ```

use core::cell::RefCell;

use stm32f7xx_hal::pac;

/// Generic ADC wrapper over a PAC ADCx peripheral.
pub struct Adc<ADC> {
    adc: ADC,
}

impl<ADC> Adc<ADC> {
    #[inline]
    pub fn free(self) -> ADC {
        self.adc
    }
}

/// Trait for reading a single channel from an ADC peripheral.
pub trait AdcRead {
    fn read_channel(&mut self, ch: u8) -> u16;
}

impl Adc<pac::ADC1> {
    /// Create and initialize ADC1: 12-bit, right-aligned, software trigger.
    pub fn adc1(adc1: pac::ADC1) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

        let common = unsafe { &*pac::ADC_COMMON::ptr() };
        // ADC prescaler: PCLK2 / 4
        common.ccr.modify(|_, w| w.adcpre().div4());

        let adc = &adc1;

        // Power off to configure
        adc.cr2.modify(|_, w| w.adon().clear_bit());

        adc.cr1.modify(|_, w| w.res().bits(0b00));
        adc.cr2.modify(|_, w| {
            w.cont().clear_bit();
            w.align().right();
            w.exten().disabled();
            w
        });

        // Longest sample time on every channel; IPROPI is a high-impedance source.
        adc.smpr1.write(|w| unsafe { w.bits(0x07FF_FFFF) });
        adc.smpr2.write(|w| unsafe { w.bits(0x3FFF_FFFF) });

        // Sequence length = 1 conversion
        adc.sqr1.modify(|_, w| w.l().bits(0));

        // Power on
        adc.cr2.modify(|_, w| w.adon().set_bit());

        Self { adc: adc1 }
    }

    /// Read a single channel.
    pub fn read(&self, channel: u8) -> u16 {
        let adc = &self.adc;

        adc.sqr3
            .modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });

        adc.cr2.modify(|_, w| w.swstart().set_bit());
        while adc.sr.read().eoc().bit_is_clear() {}

        adc.dr.read().data().bits() as u16
    }
}

impl AdcRead for Adc<pac::ADC1> {
    fn read_channel(&mut self, ch: u8) -> u16 {
        self.read(ch)
    }
}

impl<ADC> Adc<ADC>
where
    Adc<ADC>: AdcRead,
{
    /// Create a closure that reads the given channel from the ADC reference.
    ///
    /// Several motors can sample different channels of one shared ADC this way.
    pub fn make_reader<'a>(adc_ref: &'a RefCell<Self>, channel: u8) -> impl FnMut() -> u16 + 'a {
        move || adc_ref.borrow_mut().read_channel(channel)
    }
}
