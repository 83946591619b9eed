// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wrapping microsecond time base shared by the motor and the controllers.
//!
//! Time is a 16-bit free-running microsecond counter that rolls over every 65.536 ms. Durations are
//! computed with modular subtraction, so a single rollover between two samples is handled
//! transparently. Intervals of 65536 us or longer alias and cannot be recovered.

/// Raw reading of the 16-bit microsecond counter.
pub type Time16 = u16;

/// Source of the current time in microseconds.
///
/// Implemented by the board layer (e.g. a timer running at 1 MHz). The clock is only read, so one
/// instance can be shared by reference between several motors and controllers.
pub trait Clock {
    /// Current value of the microsecond counter.
    fn now(&self) -> Time16;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Time16 {
        (**self).now()
    }
}

/// Microseconds elapsed from `start` to `end`, correct across one counter rollover.
#[inline]
pub fn elapsed(start: Time16, end: Time16) -> Time16 {
    end.wrapping_sub(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_without_wrap() {
        assert_eq!(elapsed(100, 350), 250);
        assert_eq!(elapsed(0, 0), 0);
        assert_eq!(elapsed(0, u16::MAX), u16::MAX);
    }

    #[test]
    fn elapsed_across_rollover() {
        assert_eq!(elapsed(0xFFF0, 0x0010), 0x20);
        assert_eq!(elapsed(u16::MAX, 0), 1);
        assert_eq!(elapsed(40_000, 39_999), u16::MAX);
    }

    #[test]
    fn elapsed_matches_true_interval() {
        for start in (0..=u16::MAX as u32).step_by(997) {
            for interval in [0u32, 1, 500, 32_767, 32_768, 65_535] {
                let end = ((start + interval) % 65_536) as u16;
                assert_eq!(elapsed(start as u16, end) as u32, interval);
            }
        }
    }

    #[test]
    fn clock_by_reference() {
        struct Fixed(Time16);
        impl Clock for Fixed {
            fn now(&self) -> Time16 {
                self.0
            }
        }

        let clock = Fixed(1234);
        let shared = &clock;
        assert_eq!(shared.now(), 1234);
        assert_eq!((&shared).now(), 1234);
    }
}
