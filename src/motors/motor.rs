// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Brushed DC motor on a PH/EN H-bridge with quadrature encoder, current sensing and current
//! limiting.
//!
//! The motor owns its peripherals for its whole lifetime:
//! - a PWM channel on the bridge EN input (duty = |effort|),
//! - the PH (phase/direction) and nSLEEP GPIO lines,
//! - a 16-bit quadrature counter,
//! - a current-sense ADC reader (`FnMut() -> u16`, e.g. from `hw::Adc::make_reader`),
//! - a current-limit DAC writer (`FnMut(u16)`, e.g. from `hw::Dac::make_writer`),
//! - the shared microsecond [`Clock`].
//!
//! Sampling (`update_enc`, `update_current`) is meant to be called from one periodic context. The
//! encoder delta is decoded with 16-bit modular arithmetic, which is only correct while the shaft
//! moves less than 32768 counts between two updates and the updates are less than 65.536 ms apart.
//! Sampling slower than that silently corrupts position and velocity.

use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};
use log::{debug, trace, warn};

use crate::time::{elapsed, Clock, Time16};

/// Largest effort magnitude accepted by [`Motor::set_effort`].
pub const EFFORT_MAX: i8 = 100;

/// Full-scale code of the 12-bit current-limit DAC.
pub const CURRENT_FULL_SCALE: u16 = 4095;

/// Raw hardware quadrature counter.
pub trait QuadratureCounter {
    /// Current counter value. Wraps modulo 2^16.
    fn count(&mut self) -> u16;
}

/// Peripheral bundle bound to one motor.
pub struct MotorParts<PWM, SLP, PH, ENC, ISNS, ILIM> {
    /// PWM output on the bridge EN input
    pub pwm: PWM,
    /// Active-low sleep line
    pub nsleep: SLP,
    /// Phase (direction) line
    pub phase: PH,
    pub encoder: ENC,
    /// Current-sense ADC reader
    pub current_sense: ISNS,
    /// Current-limit DAC writer
    pub current_limit: ILIM,
}

/// Construction-time motor settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MotorConfig {
    /// Initial current limit, in DAC codes
    pub current_limit: u16,
    /// Swap the PH polarity so that positive effort counts the encoder up
    pub invert_direction: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            current_limit: CURRENT_FULL_SCALE,
            invert_direction: false,
        }
    }
}

/// Power state of the motor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotorState {
    /// Driver asleep, no output.
    Stopped,
    /// Driver awake, bridge held at zero duty.
    Disabled,
    /// Driver awake, bridge follows the commanded effort.
    Enabled,
}

/// Closed-loop capable brushed DC motor.
///
/// Position is in encoder counts since the last [`set_zero`](Self::set_zero), velocity in counts
/// per second, current and current limit in raw ADC/DAC codes.
pub struct Motor<PWM, SLP, PH, ENC, ISNS, ILIM, CLK> {
    pwm: PWM,
    nsleep: SLP,
    phase: PH,
    encoder: ENC,
    current_sense: ISNS,
    current_limit: ILIM,
    clock: CLK,
    invert_direction: bool,

    started: bool,
    enabled: bool,

    effort: i8,
    position: i32,
    velocity: i32,
    current: u16,
    current_lim: u16,

    /// Encoder count from most recent update
    prev_cnt: u16,
    /// Time from most recent update
    prev_time: Time16,
    /// Change in count between last 2 updates
    delta: i32,
    /// Change in time between last 2 updates (us)
    dt: i32,
}

impl<PWM, SLP, PH, ENC, ISNS, ILIM, CLK> Motor<PWM, SLP, PH, ENC, ISNS, ILIM, CLK>
where
    PWM: SetDutyCycle,
    SLP: OutputPin,
    PH: OutputPin,
    ENC: QuadratureCounter,
    ISNS: FnMut() -> u16,
    ILIM: FnMut(u16),
    CLK: Clock,
{
    /// Bind a motor to its peripherals. The motor starts in [`MotorState::Stopped`] with the
    /// bridge at zero duty and the driver asleep.
    pub fn new(
        parts: MotorParts<PWM, SLP, PH, ENC, ISNS, ILIM>,
        clock: CLK,
        config: MotorConfig,
    ) -> Self {
        let MotorParts {
            pwm,
            nsleep,
            phase,
            mut encoder,
            current_sense,
            current_limit,
        } = parts;

        let prev_cnt = encoder.count();
        let prev_time = clock.now();

        let mut motor = Self {
            pwm,
            nsleep,
            phase,
            encoder,
            current_sense,
            current_limit,
            clock,
            invert_direction: config.invert_direction,

            started: false,
            enabled: false,

            effort: 0,
            position: 0,
            velocity: 0,
            current: 0,
            current_lim: config.current_limit.min(CURRENT_FULL_SCALE),

            prev_cnt,
            prev_time,
            delta: 0,
            dt: 0,
        };

        motor.write_duty_off();
        let res = motor.nsleep.set_low();
        report(res, "nSLEEP low");

        motor
    }

    /// Tear down this motor and return its peripherals.
    pub fn free(self) -> (MotorParts<PWM, SLP, PH, ENC, ISNS, ILIM>, CLK) {
        (
            MotorParts {
                pwm: self.pwm,
                nsleep: self.nsleep,
                phase: self.phase,
                encoder: self.encoder,
                current_sense: self.current_sense,
                current_limit: self.current_limit,
            },
            self.clock,
        )
    }

    /// Wake the driver and arm the sensing peripherals.
    ///
    /// The encoder reference is re-seeded so counts accumulated while stopped are not reported as
    /// motion, and the stored current limit is written to the DAC.
    pub fn start(&mut self) {
        if self.started {
            return;
        }

        let res = self.nsleep.set_high();
        report(res, "nSLEEP high");

        self.prev_cnt = self.encoder.count();
        self.prev_time = self.clock.now();
        self.delta = 0;
        self.dt = 0;
        self.velocity = 0;

        (self.current_limit)(self.current_lim);

        self.started = true;
        self.apply_effort();
        debug!("motor: started ({:?})", self.state());
    }

    /// Zero the bridge and put the driver to sleep.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }

        self.write_duty_off();
        let res = self.nsleep.set_low();
        report(res, "nSLEEP low");

        self.started = false;
        debug!("motor: stopped");
    }

    /// Let the bridge follow the commanded effort. Takes effect once started.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.apply_effort();
        debug!("motor: enabled ({:?})", self.state());
    }

    /// Hold the bridge at zero duty. The stored effort is kept.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.apply_effort();
        debug!("motor: disabled ({:?})", self.state());
    }

    /// Set motor effort between -100 and 100. Out-of-range values are clamped.
    ///
    /// The effort is always stored; the bridge only follows it while [`MotorState::Enabled`].
    pub fn set_effort(&mut self, duty: i32) {
        self.effort = duty.clamp(-(EFFORT_MAX as i32), EFFORT_MAX as i32) as i8;
        self.apply_effort();
    }

    /// Sample the encoder and clock, accumulating position and recomputing velocity.
    pub fn update_enc(&mut self) {
        let cnt = self.encoder.count();
        let now = self.clock.now();

        self.delta = cnt.wrapping_sub(self.prev_cnt) as i16 as i32;
        self.dt = elapsed(self.prev_time, now) as i32;
        self.position = self.position.saturating_add(self.delta);

        // Two samples inside one clock tick keep the previous velocity.
        if self.dt != 0 {
            let cps = self.delta as i64 * 1_000_000 / self.dt as i64;
            self.velocity = cps.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        }

        self.prev_cnt = cnt;
        self.prev_time = now;
        trace!(
            "motor: cnt={} delta={} dt={} pos={}",
            cnt,
            self.delta,
            self.dt,
            self.position
        );
    }

    /// Flush pending encoder motion, then make the current position zero.
    pub fn set_zero(&mut self) {
        self.update_enc();
        self.position = 0;
    }

    /// Sample the current-sense ADC.
    #[inline]
    pub fn update_current(&mut self) {
        self.current = (self.current_sense)();
    }

    /// Set the hardware current limit, in DAC codes (clamped to full scale).
    pub fn set_current(&mut self, limit: u16) {
        let limit = limit.min(CURRENT_FULL_SCALE);
        (self.current_limit)(limit);
        self.current_lim = limit;
        debug!("motor: current limit {}", limit);
    }

    #[inline]
    pub fn effort(&self) -> i8 {
        self.effort
    }

    /// Accumulated position in encoder counts.
    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Velocity over the last update, in counts per second.
    #[inline]
    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    /// Most recent current-sense sample.
    #[inline]
    pub fn current(&self) -> u16 {
        self.current
    }

    #[inline]
    pub fn current_limit(&self) -> u16 {
        self.current_lim
    }

    /// Encoder counts between the last two updates.
    #[inline]
    pub fn delta(&self) -> i32 {
        self.delta
    }

    /// Microseconds between the last two updates.
    #[inline]
    pub fn dt(&self) -> i32 {
        self.dt
    }

    pub fn state(&self) -> MotorState {
        match (self.started, self.enabled) {
            (false, _) => MotorState::Stopped,
            (true, false) => MotorState::Disabled,
            (true, true) => MotorState::Enabled,
        }
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drive the bridge from the stored effort, or hold it off outside `Enabled`.
    fn apply_effort(&mut self) {
        if self.state() != MotorState::Enabled {
            self.write_duty_off();
            return;
        }

        let forward = (self.effort >= 0) != self.invert_direction;
        let res = if forward {
            self.phase.set_high()
        } else {
            self.phase.set_low()
        };
        report(res, "PH");

        let res = self.pwm.set_duty_cycle_percent(self.effort.unsigned_abs());
        report(res, "PWM duty");
    }

    fn write_duty_off(&mut self) {
        let res = self.pwm.set_duty_cycle_fully_off();
        report(res, "PWM off");
    }
}

/// HAL write failures are not recoverable here; log them and carry on.
#[inline]
fn report<E: core::fmt::Debug>(res: Result<(), E>, what: &str) {
    if let Err(e) = res {
        warn!("motor: {} write failed: {:?}", what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;

    const MAX_DUTY: u16 = 1000;

    struct FakeClock {
        now: Cell<Time16>,
    }

    impl Clock for FakeClock {
        fn now(&self) -> Time16 {
            self.now.get()
        }
    }

    struct FakePwm<'a> {
        duty: &'a Cell<u16>,
    }

    impl embedded_hal::pwm::ErrorType for FakePwm<'_> {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm<'_> {
        fn max_duty_cycle(&self) -> u16 {
            MAX_DUTY
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty.set(duty);
            Ok(())
        }
    }

    struct FakePin<'a> {
        high: &'a Cell<bool>,
    }

    impl embedded_hal::digital::ErrorType for FakePin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for FakePin<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high.set(true);
            Ok(())
        }
    }

    struct FakeEncoder<'a> {
        count: &'a Cell<u16>,
    }

    impl QuadratureCounter for FakeEncoder<'_> {
        fn count(&mut self) -> u16 {
            self.count.get()
        }
    }

    /// Shared hardware state observed by the fakes.
    struct Rig {
        clock: FakeClock,
        duty: Cell<u16>,
        nsleep: Cell<bool>,
        phase: Cell<bool>,
        count: Cell<u16>,
        adc: Cell<u16>,
        dac: Cell<Option<u16>>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                clock: FakeClock { now: Cell::new(0) },
                duty: Cell::new(0xFFFF),
                nsleep: Cell::new(true),
                phase: Cell::new(false),
                count: Cell::new(0),
                adc: Cell::new(0),
                dac: Cell::new(None),
            }
        }

        fn motor(
            &self,
            config: MotorConfig,
        ) -> Motor<
            FakePwm<'_>,
            FakePin<'_>,
            FakePin<'_>,
            FakeEncoder<'_>,
            impl FnMut() -> u16 + '_,
            impl FnMut(u16) + '_,
            &FakeClock,
        > {
            let parts = MotorParts {
                pwm: FakePwm { duty: &self.duty },
                nsleep: FakePin { high: &self.nsleep },
                phase: FakePin { high: &self.phase },
                encoder: FakeEncoder { count: &self.count },
                current_sense: move || self.adc.get(),
                current_limit: move |code| self.dac.set(Some(code)),
            };
            Motor::new(parts, &self.clock, config)
        }

        /// Move the shaft by `counts` over `us` microseconds.
        fn turn(&self, counts: i32, us: u16) {
            self.count.set(self.count.get().wrapping_add(counts as u16));
            self.clock.now.set(self.clock.now.get().wrapping_add(us));
        }
    }

    #[test]
    fn constructed_stopped_and_safe() {
        let rig = Rig::new();
        let motor = rig.motor(MotorConfig::default());

        assert_eq!(motor.state(), MotorState::Stopped);
        assert_eq!(rig.duty.get(), 0);
        assert!(!rig.nsleep.get());
        assert_eq!(motor.current_limit(), CURRENT_FULL_SCALE);
        assert_eq!(rig.dac.get(), None);
    }

    #[test]
    fn effort_is_clamped() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());

        for (cmd, expected) in [
            (0, 0),
            (42, 42),
            (-42, -42),
            (100, 100),
            (101, 100),
            (-101, -100),
            (i32::MAX, 100),
            (i32::MIN, -100),
        ] {
            motor.set_effort(cmd);
            assert_eq!(motor.effort(), expected);
        }
    }

    #[test]
    fn effort_drives_bridge_only_when_enabled() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());

        motor.set_effort(50);
        assert_eq!(rig.duty.get(), 0);

        motor.start();
        assert_eq!(motor.state(), MotorState::Disabled);
        assert!(rig.nsleep.get());
        assert_eq!(rig.duty.get(), 0);

        motor.enable();
        assert_eq!(motor.state(), MotorState::Enabled);
        assert_eq!(rig.duty.get(), 500);
        assert!(rig.phase.get());

        motor.set_effort(-25);
        assert_eq!(rig.duty.get(), 250);
        assert!(!rig.phase.get());

        motor.disable();
        assert_eq!(rig.duty.get(), 0);
        assert_eq!(motor.effort(), -25);

        motor.enable();
        assert_eq!(rig.duty.get(), 250);

        motor.stop();
        assert_eq!(motor.state(), MotorState::Stopped);
        assert_eq!(rig.duty.get(), 0);
        assert!(!rig.nsleep.get());
        assert_eq!(motor.effort(), -25);
    }

    #[test]
    fn enable_before_start_takes_effect_on_start() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());

        motor.enable();
        motor.set_effort(80);
        assert_eq!(motor.state(), MotorState::Stopped);
        assert_eq!(rig.duty.get(), 0);

        motor.start();
        assert_eq!(motor.state(), MotorState::Enabled);
        assert_eq!(rig.duty.get(), 800);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());

        motor.start();
        rig.turn(10, 100);
        motor.start();
        motor.update_enc();
        assert_eq!(motor.position(), 10);

        motor.stop();
        motor.stop();
        assert_eq!(motor.state(), MotorState::Stopped);
    }

    #[test]
    fn inverted_direction_flips_phase() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig {
            invert_direction: true,
            ..MotorConfig::default()
        });
        motor.start();
        motor.enable();

        motor.set_effort(30);
        assert!(!rig.phase.get());
        assert_eq!(motor.effort(), 30);

        motor.set_effort(-30);
        assert!(rig.phase.get());
    }

    #[test]
    fn encoder_accumulates_position_and_velocity() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());
        motor.start();

        rig.turn(50, 1000);
        motor.update_enc();
        assert_eq!(motor.delta(), 50);
        assert_eq!(motor.dt(), 1000);
        assert_eq!(motor.position(), 50);
        assert_eq!(motor.velocity(), 50_000);

        rig.turn(-20, 500);
        motor.update_enc();
        assert_eq!(motor.position(), 30);
        assert_eq!(motor.velocity(), -40_000);
    }

    #[test]
    fn encoder_counter_wraparound() {
        let rig = Rig::new();
        rig.count.set(0xFFF0);
        let mut motor = rig.motor(MotorConfig::default());
        motor.start();

        rig.count.set(0x0010);
        rig.clock.now.set(64);
        motor.update_enc();
        assert_eq!(motor.delta(), 32);
        assert_eq!(motor.position(), 32);

        rig.count.set(0xFFF0);
        rig.clock.now.set(128);
        motor.update_enc();
        assert_eq!(motor.delta(), -32);
        assert_eq!(motor.position(), 0);
    }

    #[test]
    fn clock_wraparound() {
        let rig = Rig::new();
        rig.clock.now.set(0xFF00);
        let mut motor = rig.motor(MotorConfig::default());
        motor.start();

        rig.turn(10, 0x200);
        motor.update_enc();
        assert_eq!(motor.dt(), 0x200);
        assert_eq!(motor.velocity(), 10 * 1_000_000 / 0x200);
    }

    #[test]
    fn position_survives_many_counter_wraps() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());
        motor.start();

        for _ in 0..100 {
            rig.turn(30_000, 10_000);
            motor.update_enc();
        }
        assert_eq!(motor.position(), 3_000_000);
    }

    #[test]
    fn zero_dt_keeps_velocity() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());
        motor.start();

        rig.turn(10, 100);
        motor.update_enc();
        let v = motor.velocity();

        rig.turn(5, 0);
        motor.update_enc();
        assert_eq!(motor.dt(), 0);
        assert_eq!(motor.velocity(), v);
        assert_eq!(motor.position(), 15);
    }

    #[test]
    fn set_zero_without_phantom_delta() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());
        motor.start();

        rig.turn(1234, 1000);
        motor.set_zero();
        assert_eq!(motor.position(), 0);

        rig.turn(0, 1000);
        motor.update_enc();
        assert_eq!(motor.position(), 0);

        rig.turn(7, 1000);
        motor.update_enc();
        assert_eq!(motor.position(), 7);
    }

    #[test]
    fn start_reseeds_encoder_reference() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());

        rig.turn(500, 30_000);
        motor.start();
        rig.turn(0, 1000);
        motor.update_enc();
        assert_eq!(motor.position(), 0);
        assert_eq!(motor.velocity(), 0);
    }

    #[test]
    fn current_reads_latest_sample() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig::default());

        for sample in [0, 4095, 17, 2048] {
            rig.adc.set(sample);
            motor.update_current();
            assert_eq!(motor.current(), sample);
        }
    }

    #[test]
    fn current_limit_written_to_dac() {
        let rig = Rig::new();
        let mut motor = rig.motor(MotorConfig {
            current_limit: 1500,
            ..MotorConfig::default()
        });

        motor.start();
        assert_eq!(rig.dac.get(), Some(1500));

        motor.set_current(800);
        assert_eq!(rig.dac.get(), Some(800));
        assert_eq!(motor.current_limit(), 800);

        motor.set_current(u16::MAX);
        assert_eq!(rig.dac.get(), Some(CURRENT_FULL_SCALE));
        assert_eq!(motor.current_limit(), CURRENT_FULL_SCALE);
    }

    #[test]
    fn free_returns_parts() {
        let rig = Rig::new();
        let motor = rig.motor(MotorConfig::default());
        let (mut parts, _clock) = motor.free();

        rig.count.set(99);
        assert_eq!(parts.encoder.count(), 99);
        rig.adc.set(7);
        assert_eq!((parts.current_sense)(), 7);
    }
}
