//! Trait for components advanced by master clock ticks.

use crate::Ticks;

/// A component that advances with the master clock.
///
/// Timers, watchdogs and the clock itself implement this. A component that
/// only cares about coarse deadlines counts ticks and acts when its own
/// deadline passes.
pub trait Tickable {
    /// Advance the component by one master clock tick.
    fn tick(&mut self);

    /// Advance the component by `count` ticks.
    ///
    /// Overrides must behave exactly like calling `tick()` `count` times.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u64);

    impl Tickable for Counter {
        fn tick(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn tick_n_defaults_to_repeated_ticks() {
        let mut c = Counter(0);
        c.tick_n(Ticks::new(33));
        assert_eq!(c.0, 33);
    }
}
