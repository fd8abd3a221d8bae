//! Watchdog timer, doubling as the sleep wake-up source.
//!
//! Awake, firmware feeds it every frame; a missed deadline would reset the
//! device. Asleep, the same counter is the periodic wake-up alarm.

use emu_core::{Tickable, Ticks};

/// Watchdog periods the hardware supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchdogTimeout {
    Millis64,
    Millis128,
    Millis256,
    Millis512,
    Seconds1,
    Seconds2,
    Seconds4,
    Seconds8,
    Seconds16,
    Seconds32,
    Seconds64,
    Seconds128,
}

impl WatchdogTimeout {
    #[must_use]
    pub const fn millis(self) -> u64 {
        match self {
            Self::Millis64 => 64,
            Self::Millis128 => 128,
            Self::Millis256 => 256,
            Self::Millis512 => 512,
            Self::Seconds1 => 1_000,
            Self::Seconds2 => 2_000,
            Self::Seconds4 => 4_000,
            Self::Seconds8 => 8_000,
            Self::Seconds16 => 16_000,
            Self::Seconds32 => 32_000,
            Self::Seconds64 => 64_000,
            Self::Seconds128 => 128_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Disabled,
    Timeout(WatchdogTimeout),
    Sleep(WatchdogTimeout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchdog {
    mode: Mode,
    elapsed: Ticks,
    feeds: u64,
    expirations: u64,
}

impl Watchdog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: Mode::Disabled,
            elapsed: Ticks::ZERO,
            feeds: 0,
            expirations: 0,
        }
    }

    pub fn feed(&mut self) {
        self.elapsed = Ticks::ZERO;
        self.feeds += 1;
    }

    /// Arm as a reset watchdog.
    pub fn start_timeout(&mut self, period: WatchdogTimeout) {
        self.mode = Mode::Timeout(period);
        self.elapsed = Ticks::ZERO;
    }

    /// Arm as the wake-up alarm for a sleep of `period`.
    pub fn sleep(&mut self, period: WatchdogTimeout) {
        self.mode = Mode::Sleep(period);
        self.elapsed = Ticks::ZERO;
    }

    /// Leave sleep and go back to guarding the frame loop.
    pub fn wake(&mut self) {
        self.start_timeout(WatchdogTimeout::Seconds2);
    }

    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        matches!(self.mode, Mode::Sleep(_))
    }

    /// Whether the armed period has run out.
    #[must_use]
    pub const fn expired(&self) -> bool {
        match self.mode {
            Mode::Disabled => false,
            Mode::Timeout(p) | Mode::Sleep(p) => self.elapsed.get() >= p.millis(),
        }
    }

    #[must_use]
    pub const fn feeds(&self) -> u64 {
        self.feeds
    }

    /// Times the armed period has run out.
    #[must_use]
    pub const fn expirations(&self) -> u64 {
        self.expirations
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for Watchdog {
    fn tick(&mut self) {
        if self.mode == Mode::Disabled {
            return;
        }
        let was_expired = self.expired();
        self.elapsed += Ticks::new(1);
        if !was_expired && self.expired() {
            self.expirations += 1;
        }
    }
}
