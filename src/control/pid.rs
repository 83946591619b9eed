// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Generic PID controller with feed-forward for closed-loop motor control.
//!
//! Works in `no_std` and does not allocate memory.
//!
//! The controller samples its own clock, so the loop rate does not need to be fixed: the integral
//! is weighted by the elapsed time and the derivative is divided by it. All gains are expressed
//! per microsecond.
//!
//! ```ignore
//! let mut pid = Controller::new(Gains::new(0.8, 0.0, 0.0005, 20.0), &clock);
//!
//! loop {
//!     motor.update_enc();
//!     let u = pid.update(target, motor.position());
//!     motor.set_effort(u);
//! }
//! ```

use log::{debug, trace};
use micromath::F32Ext;

use crate::time::{elapsed, Clock, Time16};

/// Gain set for [`Controller`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gains {
    /// Proportional gain
    pub kp: f32,
    /// Feed-forward gain, applied to the setpoint
    pub kf: f32,
    /// Integral gain, per count-microsecond of accumulated error
    pub ki: f32,
    /// Derivative gain, applied to the measurement rate in counts per microsecond
    pub kd: f32,
}

impl Gains {
    pub const fn new(kp: f32, kf: f32, ki: f32, kd: f32) -> Self {
        Self { kp, kf, ki, kd }
    }

    /// Pure proportional control.
    pub const fn p(kp: f32) -> Self {
        Self::new(kp, 0.0, 0.0, 0.0)
    }
}

impl Default for Gains {
    fn default() -> Self {
        Self::p(1.0)
    }
}

/// PID + feed-forward controller with integral anti-windup.
///
/// The output is not clamped. `out_min`/`out_max` only describe the actuator range so the
/// integrator can stop accumulating once the output saturates it; clamping the command is left to
/// the actuator (see [`Motor::set_effort`](crate::motors::Motor::set_effort)).
pub struct Controller<C> {
    clock: C,
    gains: Gains,

    /// Last process variable (for derivative term)
    prev_pv: i32,
    /// Time-weighted error sum, in count-microseconds
    sum_err: i32,
    prev_time: Time16,

    /// Actuator range used for anti-windup
    out_min: i32,
    out_max: i32,

    first_update: bool,
}

impl<C: Clock> Controller<C> {
    /// Create a new controller. The anti-windup range defaults to the motor effort range.
    pub fn new(gains: Gains, clock: C) -> Self {
        let prev_time = clock.now();
        Self {
            clock,
            gains,

            prev_pv: 0,
            sum_err: 0,
            prev_time,

            out_min: -100,
            out_max: 100,

            first_update: true,
        }
    }

    /// Set the actuator range used by the anti-windup policy.
    pub fn with_output_limits(mut self, min: i32, max: i32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.sum_err = 0;
        self.prev_pv = 0;
        self.prev_time = self.clock.now();
        self.first_update = true;
        debug!("pid: reset");
    }

    #[inline]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Replace all gains. History is kept, so retuning a running loop does not bump the output.
    pub fn set_gains(&mut self, gains: Gains) {
        self.gains = gains;
        debug!(
            "pid: gains kp={} kf={} ki={} kd={}",
            gains.kp, gains.kf, gains.ki, gains.kd
        );
    }

    #[inline]
    pub fn set_kp(&mut self, kp: f32) {
        self.gains.kp = kp;
    }

    #[inline]
    pub fn set_kf(&mut self, kf: f32) {
        self.gains.kf = kf;
    }

    #[inline]
    pub fn set_ki(&mut self, ki: f32) {
        self.gains.ki = ki;
    }

    #[inline]
    pub fn set_kd(&mut self, kd: f32) {
        self.gains.kd = kd;
    }

    /// Current integrator state in count-microseconds.
    #[inline]
    pub fn integral(&self) -> i32 {
        self.sum_err
    }

    /// Run one loop of PID control.
    ///
    /// `input` is the setpoint and `feedback` the measured process value, in the same units.
    ///
    /// Returns the unclamped command.
    #[doc(alias = "PID")]
    pub fn update(&mut self, input: i32, feedback: i32) -> i32 {
        let now = self.clock.now();
        let dt = elapsed(self.prev_time, now);

        let err = input.saturating_sub(feedback);

        // ----- P and F terms -----
        let p = self.gains.kp * err as f32;
        let f = self.gains.kf * input as f32;

        // ----- D term (on measurement, no kick on setpoint changes) -----
        let d = if self.first_update || dt == 0 {
            0.0
        } else {
            let dpv = feedback.saturating_sub(self.prev_pv);
            -self.gains.kd * (dpv as f32 / dt as f32)
        };

        // ----- I term -----
        if dt != 0 {
            let step = (err as i64 * dt as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            let candidate = self.sum_err.saturating_add(step);

            // Anti-windup: integrate freely inside the actuator range or while unwinding. Otherwise
            // advance only as far as the output limit, never back past the current value.
            let base = p + f + d;
            let u = base + self.gains.ki * candidate as f32;
            let limit = if u > self.out_max as f32 {
                Some(self.out_max)
            } else if u < self.out_min as f32 {
                Some(self.out_min)
            } else {
                None
            };
            let unwinding = candidate.unsigned_abs() < self.sum_err.unsigned_abs();

            self.sum_err = match limit {
                None => candidate,
                Some(_) if unwinding => candidate,
                Some(_) if self.gains.ki == 0.0 => self.sum_err,
                Some(limit) => {
                    let fill = ((limit as f32 - base) / self.gains.ki) as i32;
                    let (lo, hi) = if candidate < self.sum_err {
                        (candidate, self.sum_err)
                    } else {
                        (self.sum_err, candidate)
                    };
                    fill.clamp(lo, hi)
                }
            };
        }
        let i = self.gains.ki * self.sum_err as f32;

        self.prev_pv = feedback;
        self.prev_time = now;
        self.first_update = false;

        let out = (p + f + i + d).round() as i32;
        trace!("pid: err={} dt={} sum={} out={}", err, dt, self.sum_err, out);
        out
    }
}
