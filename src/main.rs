// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Single-motor velocity loop on the STM32F777 board.
//!
//! Pin map:
//! - PD12 TIM4_CH1: bridge EN (PWM), PD13: bridge PH, PD14: bridge nSLEEP
//! - PA6/PA7 TIM3_CH1/CH2: quadrature encoder
//! - PC4 ADC1_IN14: IPROPI current sense, PA5 DAC_OUT2: current-limit reference
//! - PA9/PA10 USART1: debug log

#![no_main]
#![no_std]

use core::cell::RefCell;

use cortex_m::delay::Delay;
use cortex_m_rt::entry;
use log::{info, LevelFilter};
use panic_halt as _;

use hal::{
    gpio::PinState,
    pac,
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use motorctl::{
    control::{Controller, Gains},
    hw::{Adc, Dac, DacChannel, Encoder, MicrosTimer, OutPin, Pwm, PwmChannel, Usart},
    logger,
    motors::{Motor, MotorConfig, MotorParts},
};

const LOOP_PERIOD_US: u32 = 1_000;
const PWM_FREQ_HZ: u32 = 20_000;
const IPROPI_CHANNEL: u8 = 14;

/// Velocity setpoint, encoder counts per second.
const TARGET_VELOCITY: i32 = 2_000;
/// Current limit, DAC codes.
const CURRENT_LIMIT: u16 = 2_048;

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let timclk = clocks.timclk1().raw();

    // GPIO
    let gpioa = dp.GPIOA.split();
    let gpioc = dp.GPIOC.split();
    let gpiod = dp.GPIOD.split();

    // USART1 (DBG)
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (tx, rx), &clocks, usart_cfg);
    logger::init(Usart::new(serial), LevelFilter::Info).ok();

    // Time base
    let clock = MicrosTimer::tim2(dp.TIM2, timclk);

    // Encoder
    let _enc_a = gpioa.pa6.into_alternate::<2>();
    let _enc_b = gpioa.pa7.into_alternate::<2>();
    let encoder = Encoder::tim3(dp.TIM3);

    // Bridge
    let _en = gpiod.pd12.into_alternate::<2>();
    let pwm = Pwm::tim4(dp.TIM4, timclk, PWM_FREQ_HZ);
    let phase = OutPin::new(gpiod.pd13, PinState::Low);
    let nsleep = OutPin::new(gpiod.pd14, PinState::Low);

    // Current sense / limit
    let _iprop = gpioc.pc4.into_analog();
    let _vref = gpioa.pa5.into_analog();
    let adc = RefCell::new(Adc::adc1(dp.ADC1));
    let dac = RefCell::new(Dac::new(dp.DAC));

    let parts = MotorParts {
        pwm: pwm.channel(PwmChannel::C1),
        nsleep,
        phase,
        encoder,
        current_sense: Adc::make_reader(&adc, IPROPI_CHANNEL),
        current_limit: Dac::make_writer(&dac, DacChannel::Two),
    };
    let config = MotorConfig {
        current_limit: CURRENT_LIMIT,
        ..MotorConfig::default()
    };
    let mut motor = Motor::new(parts, &clock, config);
    let mut pid = Controller::new(Gains::new(0.02, 0.03, 0.000_002, 0.0), &clock);

    let mut delay = Delay::new(cp.SYST, clocks.sysclk().raw());

    motor.start();
    motor.set_zero();
    motor.enable();
    info!(
        "velocity loop: period {} us, target {} counts/s",
        LOOP_PERIOD_US, TARGET_VELOCITY
    );

    let mut ticks: u32 = 0;
    loop {
        motor.update_enc();
        motor.update_current();

        let u = pid.update(TARGET_VELOCITY, motor.velocity());
        motor.set_effort(u);

        ticks = ticks.wrapping_add(1);
        if ticks % 1_000 == 0 {
            info!(
                "pos={} vel={} effort={} current={}",
                motor.position(),
                motor.velocity(),
                motor.effort(),
                motor.current()
            );
        }

        delay.delay_us(LOOP_PERIOD_US);
    }
}
