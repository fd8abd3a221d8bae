//! SysTick frame timer.
//!
//! Counts 1 ms master ticks. Firmware arms it with the frame interval at
//! the end of each frame and spins on `wait_remaining` at the end of the
//! next, so a frame never finishes early.

use emu_core::{Tickable, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SysTimer {
    now: Ticks,
    started: Ticks,
    deadline: Ticks,
}

impl SysTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Ticks::ZERO,
            started: Ticks::ZERO,
            deadline: Ticks::ZERO,
        }
    }

    /// Arm the timer to expire `ms` milliseconds from now.
    pub fn start(&mut self, ms: u32) {
        self.started = self.now;
        self.deadline = self.now + Ticks::new(u64::from(ms));
    }

    /// Milliseconds since the timer was armed.
    #[must_use]
    pub fn elapsed_ms(&self) -> u32 {
        u32::try_from((self.now - self.started).get()).unwrap_or(u32::MAX)
    }

    /// Spin until the deadline, calling `poll` once per tick waited.
    ///
    /// Returns the milliseconds that had already elapsed when called: the
    /// frame's working time. A value above the interval is a dropped frame.
    pub fn wait_remaining<F: FnMut()>(&mut self, mut poll: F) -> u32 {
        let worked = self.elapsed_ms();
        while self.now < self.deadline {
            poll();
            self.tick();
        }
        worked
    }

    /// Master ticks since power-on.
    #[must_use]
    pub const fn now(&self) -> Ticks {
        self.now
    }
}

impl Tickable for SysTimer {
    fn tick(&mut self) {
        self.now += Ticks::new(1);
    }
}
