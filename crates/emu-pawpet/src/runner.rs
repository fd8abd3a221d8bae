//! Firmware main loop.
//!
//! One call to [`Runner::frame`] is one pass of the device's frame loop:
//! feed the watchdog, sample buttons, run and draw the active scene, draw
//! the status overlay, present, then spin out the rest of the frame
//! interval on the SysTick timer.

use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use emu_core::Tickable;
use tracing::debug;

use crate::battery::BatteryMonitor;
use crate::config::{Framerate, PawPetConfig};
use crate::display::Screen;
use crate::error::PawPetError;
use crate::input::{ButtonState, PawButton};
use crate::save::SaveData;
use crate::scene::{ActiveScene, Scene, SceneKind};
use crate::sprite::Sprite;
use crate::storage::VirtualFileStore;
use crate::timer::SysTimer;
use crate::watchdog::{Watchdog, WatchdogTimeout};

/// Frame times kept for the peak readout.
const FRAME_HISTORY: usize = 8;

/// Milliseconds of firmware work clocked through the peripherals per frame.
const WORK_MS: u32 = 1;

const SLEEP_PERIOD: WatchdogTimeout = WatchdogTimeout::Seconds64;

const BATTERY_ORIGIN: Point = Point::new(48, 0);
const STATS_ORIGIN: Point = Point::new(0, 6);

/// On-board peripherals the firmware drives.
#[derive(Debug, Clone)]
pub struct Hardware {
    pub timer: SysTimer,
    pub watchdog: Watchdog,
    pub buttons: ButtonState,
    pub battery: BatteryMonitor,
    pub screen: Screen,
}

impl Hardware {
    #[must_use]
    pub fn new(battery_level: u8) -> Self {
        let mut watchdog = Watchdog::new();
        watchdog.wake();
        Self {
            timer: SysTimer::new(),
            watchdog,
            buttons: ButtonState::new(),
            battery: BatteryMonitor::new(battery_level),
            screen: Screen::new(),
        }
    }

    /// Clock `ms` milliseconds through the timer and watchdog.
    pub fn advance(&mut self, ms: u32) {
        for _ in 0..ms {
            self.timer.tick();
            self.watchdog.tick();
        }
    }
}

/// What a frame asks of the device around it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// The save blob should be rewritten.
    pub save_due: bool,
    /// The firmware wants to sleep for this period.
    pub sleep_request: Option<WatchdogTimeout>,
}

#[derive(Debug, Clone)]
pub struct Runner {
    scene: ActiveScene,
    framerate: Framerate,
    inactivity_sleep_secs: u32,
    idle_frames: u32,
    frames_to_sleep: u32,
    sleep_request: Option<WatchdogTimeout>,
    debug: bool,
    frametimes: [u32; FRAME_HISTORY],
    frametime_index: usize,
    last_frametime: u32,
    dropped_frames: u32,
    blocked_updates: u32,
    battery_icon: Sprite,
    save: SaveData,
}

impl Runner {
    #[must_use]
    pub fn new(config: &PawPetConfig, store: &VirtualFileStore) -> Self {
        let save = SaveData::new(config.hatch_frames);
        let scene = ActiveScene::enter(SceneKind::Menu, store, &save);
        let framerate = scene.framerate();
        Self {
            scene,
            framerate,
            inactivity_sleep_secs: config.inactivity_sleep_secs,
            idle_frames: 0,
            frames_to_sleep: frames_for(config.inactivity_sleep_secs, framerate),
            sleep_request: None,
            debug: false,
            frametimes: [0; FRAME_HISTORY],
            frametime_index: 0,
            last_frametime: 0,
            dropped_frames: 0,
            blocked_updates: 0,
            battery_icon: Sprite::new("battery"),
            save,
        }
    }

    /// Continue from a stored save.
    pub fn restore(&mut self, save: SaveData) {
        self.debug = save.debug;
        self.save = save;
    }

    /// Run one pass of the frame loop.
    pub fn frame(
        &mut self,
        hw: &mut Hardware,
        store: &VirtualFileStore,
        mask: u8,
    ) -> Result<FrameReport, PawPetError> {
        let mut report = FrameReport::default();

        hw.watchdog.feed();
        hw.buttons.update(mask);
        if hw.buttons.state() != 0 {
            self.idle_frames = 0;
            self.sleep_request = None;
        }

        self.scene.resolve(store);
        self.battery_icon.resolve(store);

        let next = self.scene.tick(&hw.buttons, &mut self.save);
        self.scene.draw(&mut hw.screen)?;

        if next != self.scene.kind() {
            debug!(from = self.scene.kind().name(), to = next.name(), "scene change");
            self.scene = ActiveScene::enter(next, store, &self.save);
            self.framerate = self.scene.framerate();
            self.frames_to_sleep = frames_for(self.inactivity_sleep_secs, self.framerate);
            report.save_due = true;
        }

        if hw.buttons.is_held(PawButton::P) {
            if hw.buttons.is_held(PawButton::Left) {
                self.debug = true;
            } else if hw.buttons.is_held(PawButton::Right) {
                self.debug = false;
            }
        }
        self.save.debug = self.debug;

        self.idle_frames = self.idle_frames.saturating_add(1);
        if self.idle_frames > self.frames_to_sleep && self.sleep_request.is_none() {
            debug!(idle_frames = self.idle_frames, "inactive, requesting sleep");
            self.sleep_request = Some(SLEEP_PERIOD);
        }
        self.save.frames_alive += 1;

        self.draw_stats(hw);
        self.battery_icon.set_frame(hw.battery.icon_frame());
        self.battery_icon.draw(&mut hw.screen, BATTERY_ORIGIN)?;

        if !hw.screen.update() {
            self.blocked_updates += 1;
        }

        hw.advance(WORK_MS);
        let Hardware {
            timer, watchdog, ..
        } = hw;
        self.last_frametime = timer.wait_remaining(|| watchdog.tick());
        timer.start(self.framerate.millis());
        if self.last_frametime > self.framerate.millis() {
            self.dropped_frames += 1;
        }

        report.sleep_request = self.sleep_request;
        Ok(report)
    }

    fn draw_stats(&mut self, hw: &mut Hardware) {
        let peak = self.frametimes.iter().copied().max().unwrap_or(0);
        self.frametime_index = (self.frametime_index + 1) % FRAME_HISTORY;
        self.frametimes[self.frametime_index] = self.last_frametime;

        let text = if self.debug {
            let mut text = format!(
                "pkms:{peak:3}\n{:08b}\ndrop:{} {}\n{}",
                hw.buttons.state(),
                self.dropped_frames,
                self.blocked_updates,
                hw.battery.read(),
            );
            if self.sleep_request.is_some() {
                text.push_str("\nSLEEP");
            }
            text
        } else {
            format!("{peak:3}")
        };

        let style = MonoTextStyleBuilder::new()
            .font(&FONT_5X8)
            .text_color(BinaryColor::Off)
            .background_color(BinaryColor::On)
            .build();
        let Ok(_) = Text::new(&text, STATS_ORIGIN, style).draw(&mut hw.screen);
    }

    #[must_use]
    pub const fn scene(&self) -> &ActiveScene {
        &self.scene
    }

    #[must_use]
    pub const fn framerate(&self) -> Framerate {
        self.framerate
    }

    #[must_use]
    pub const fn sleep_request(&self) -> Option<WatchdogTimeout> {
        self.sleep_request
    }

    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub const fn save(&self) -> &SaveData {
        &self.save
    }

    #[must_use]
    pub const fn idle_frames(&self) -> u32 {
        self.idle_frames
    }

    #[must_use]
    pub const fn dropped_frames(&self) -> u32 {
        self.dropped_frames
    }

    /// Milliseconds the last frame spent working before its wait.
    #[must_use]
    pub const fn last_frametime(&self) -> u32 {
        self.last_frametime
    }
}

/// Frames covering `secs` seconds at `framerate`.
fn frames_for(secs: u32, framerate: Framerate) -> u32 {
    secs.saturating_mul(1000) / framerate.millis()
}
