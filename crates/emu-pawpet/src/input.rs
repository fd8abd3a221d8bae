//! Input handling for the PawPet.
//!
//! Three layers:
//! 1. `InputLatch` holds what the host last wrote: an absolute button mask
//!    and a battery level. The core samples it once per tick.
//! 2. `ButtonState` turns successive samples into pressed/released/held
//!    edges for the firmware.
//! 3. `InputQueue` replays timed button events for scripted runs.

use std::collections::VecDeque;

/// Physical button, with its bit in the input mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PawButton {
    A,
    B,
    C,
    /// Power/select. The only button that wakes a sleeping device.
    P,
    Up,
    Right,
    Down,
    Left,
}

impl PawButton {
    pub const ALL: [Self; 8] = [
        Self::A,
        Self::B,
        Self::C,
        Self::P,
        Self::Up,
        Self::Right,
        Self::Down,
        Self::Left,
    ];

    /// Bit for this button in the input mask.
    #[must_use]
    pub const fn mask(self) -> u8 {
        match self {
            Self::A => 0x01,
            Self::B => 0x02,
            Self::C => 0x04,
            Self::P => 0x08,
            Self::Up => 0x10,
            Self::Right => 0x20,
            Self::Down => 0x40,
            Self::Left => 0x80,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::P => "p",
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        }
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|b| b.name() == lower)
    }
}

/// One sample of the latch, taken at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSnapshot {
    pub buttons: u8,
    pub battery: u8,
}

/// Host-written input state.
///
/// Writes are absolute and persist until overwritten; a tick never clears
/// them. The last write before a tick wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLatch {
    buttons: u8,
    battery: u8,
}

impl InputLatch {
    #[must_use]
    pub fn new(battery: u8) -> Self {
        Self {
            buttons: 0,
            battery: battery.min(100),
        }
    }

    /// Replace the button mask.
    pub fn set_buttons(&mut self, mask: u8) {
        self.buttons = mask;
    }

    /// Set the battery level, clamped to 0..=100. Non-finite input reads
    /// as empty.
    pub fn set_battery(&mut self, level: impl Into<f64>) {
        let level: f64 = level.into();
        self.battery = if level.is_finite() {
            level.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };
    }

    #[must_use]
    pub const fn buttons(&self) -> u8 {
        self.buttons
    }

    #[must_use]
    pub const fn battery(&self) -> u8 {
        self.battery
    }

    #[must_use]
    pub const fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            buttons: self.buttons,
            battery: self.battery,
        }
    }
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Edge detector over successive button samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    current: u8,
    pressed: u8,
    released: u8,
    held: u8,
}

impl ButtonState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: 0,
            pressed: 0,
            released: 0,
            held: 0,
        }
    }

    /// Take a new sample.
    pub fn update(&mut self, mask: u8) {
        let prev = self.current;
        self.pressed = !prev & mask;
        self.released = prev & !mask;
        self.held = prev & mask;
        self.current = mask;
    }

    /// Down this sample but not the last.
    #[must_use]
    pub const fn is_pressed(&self, button: PawButton) -> bool {
        self.pressed & button.mask() != 0
    }

    /// Down last sample, up this one.
    #[must_use]
    pub const fn is_released(&self, button: PawButton) -> bool {
        self.released & button.mask() != 0
    }

    /// Down for at least two samples.
    #[must_use]
    pub const fn is_held(&self, button: PawButton) -> bool {
        self.held & button.mask() != 0
    }

    /// Down this sample.
    #[must_use]
    pub const fn is_down(&self, button: PawButton) -> bool {
        self.current & button.mask() != 0
    }

    /// The most recent sample.
    #[must_use]
    pub const fn state(&self) -> u8 {
        self.current
    }
}

/// What a scripted event does to the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Press(PawButton),
    Release(PawButton),
    /// Replace the whole mask.
    Mask(u8),
    Battery(u8),
}

/// A timed latch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// Frame number at which this event fires.
    pub frame: u64,
    pub action: InputAction,
}

/// Timed input queue for scripted button sequences.
///
/// Events are sorted by frame and applied to the latch before the tick
/// that runs that frame.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Enqueue a raw event. Events for the same frame keep insertion order.
    pub fn push(&mut self, event: InputEvent) {
        let pos = self
            .events
            .iter()
            .position(|e| e.frame > event.frame)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    /// Enqueue a button press and its release `hold_frames` later.
    pub fn enqueue_button(&mut self, button: PawButton, at_frame: u64, hold_frames: u64) {
        self.push(InputEvent {
            frame: at_frame,
            action: InputAction::Press(button),
        });
        self.push(InputEvent {
            frame: at_frame + hold_frames,
            action: InputAction::Release(button),
        });
    }

    /// Apply every event due at or before `frame`.
    pub fn process(&mut self, frame: u64, latch: &mut InputLatch) {
        while self.events.front().is_some_and(|e| e.frame <= frame) {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            match event.action {
                InputAction::Press(b) => latch.set_buttons(latch.buttons() | b.mask()),
                InputAction::Release(b) => latch.set_buttons(latch.buttons() & !b.mask()),
                InputAction::Mask(mask) => latch.set_buttons(mask),
                InputAction::Battery(level) => latch.set_battery(level),
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
