//! Battery monitor.
//!
//! Two AA cells feed the ADC through a divider; firmware reads centivolts.
//! The host sets a 0-100 level which maps linearly onto 2.00 V (empty) to
//! 2.70 V (fresh cells).

const EMPTY_CENTIVOLTS: u16 = 200;
const SPAN_CENTIVOLTS: u16 = 70;

/// Icon frame thresholds, highest first. Readings at or below the last
/// threshold show the empty icon.
const ICON_THRESHOLDS: [u16; 4] = [260, 240, 230, 220];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryMonitor {
    level: u8,
}

impl BatteryMonitor {
    #[must_use]
    pub const fn new(level: u8) -> Self {
        Self { level }
    }

    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
    }

    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// ADC reading in centivolts.
    #[must_use]
    pub const fn read(&self) -> u16 {
        EMPTY_CENTIVOLTS + self.level as u16 * SPAN_CENTIVOLTS / 100
    }

    /// Frame of the battery sheet for the current reading: 0 is full, 4 is
    /// empty.
    #[must_use]
    pub fn icon_frame(&self) -> usize {
        let reading = self.read();
        ICON_THRESHOLDS
            .iter()
            .position(|&t| reading > t)
            .unwrap_or(ICON_THRESHOLDS.len())
    }
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new(100)
    }
}
