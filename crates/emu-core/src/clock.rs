//! Master clock configuration.

use crate::Ticks;

/// Master clock configuration for a device.
///
/// Every timer on the device derives from this frequency. A handheld with
/// a 1 kHz SysTick has one master tick per millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Clock frequency in Hz.
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Ticks covering `ms` milliseconds, rounded down.
    #[must_use]
    pub const fn ticks_for_millis(&self, ms: u64) -> Ticks {
        Ticks::new(ms.saturating_mul(self.frequency_hz) / 1000)
    }

    /// Whole milliseconds covered by `ticks`.
    #[must_use]
    pub const fn millis_for_ticks(&self, ticks: Ticks) -> u64 {
        ticks.get().saturating_mul(1000) / self.frequency_hz
    }
}
