//! Top-level PawPet system.
//!
//! Owns the file store, the input latch and the device. A tick steps a
//! copy of the device and commits it only if the whole frame succeeded, so
//! a corrupt sheet found mid-frame leaves the last good frame on screen.

use emu_core::{Machine, MasterClock, Observable, Ticks, Value, VideoConfig};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, Point};
use tracing::{debug, info, warn};

use crate::config::PawPetConfig;
use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Screen};
use crate::error::PawPetError;
use crate::input::{InputLatch, InputQueue, InputSnapshot, PawButton};
use crate::runner::{Hardware, Runner};
use crate::save::SaveData;
use crate::scene::SceneKind;
use crate::sprite::Sprite;
use crate::storage::VirtualFileStore;

/// SysTick rate: one master tick per millisecond.
pub const MASTER_CLOCK_HZ: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Waiting for boot assets.
    Uninitialized,
    /// Every boot asset is loaded; no frame has run yet.
    Ready,
    /// At least one frame has run.
    Running,
}

impl Lifecycle {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Running => "running",
        }
    }
}

/// Result of stepping the device once.
#[derive(Debug, Clone, Copy)]
struct Step {
    ticks: u64,
    save_due: bool,
}

/// Everything a tick may change.
#[derive(Debug, Clone)]
struct Device {
    hw: Hardware,
    runner: Runner,
    sleep_screen: Sprite,
    sleeping: bool,
    frame_count: u64,
}

impl Device {
    fn new(config: &PawPetConfig, store: &VirtualFileStore) -> Self {
        let runner = Runner::new(config, store);
        let mut hw = Hardware::new(config.initial_battery.min(100));
        hw.timer.start(runner.framerate().millis());
        Self {
            hw,
            runner,
            sleep_screen: Sprite::new("sleeptest"),
            sleeping: false,
            frame_count: 0,
        }
    }

    fn step(
        &mut self,
        input: InputSnapshot,
        store: &VirtualFileStore,
    ) -> Result<Step, PawPetError> {
        let start = self.hw.timer.now();
        self.hw.battery.set_level(input.battery);
        self.frame_count += 1;

        if self.sleeping {
            let interval = self.runner.framerate().millis();
            if input.buttons & PawButton::P.mask() != 0 {
                debug!("woken by button");
                self.wake(interval);
            } else {
                self.hw.advance(interval);
                if self.hw.watchdog.expired() {
                    debug!("woken by watchdog");
                    self.wake(interval);
                }
                return Ok(Step {
                    ticks: (self.hw.timer.now() - start).get(),
                    save_due: false,
                });
            }
        }

        let report = self.runner.frame(&mut self.hw, store, input.buttons)?;
        let mut save_due = report.save_due;
        if let Some(period) = report.sleep_request {
            debug!(?period, "entering sleep");
            self.sleeping = true;
            self.hw.watchdog.sleep(period);
            self.draw_sleep_screen(store)?;
            save_due = true;
        }

        Ok(Step {
            ticks: (self.hw.timer.now() - start).get(),
            save_due,
        })
    }

    fn wake(&mut self, interval: u32) {
        self.sleeping = false;
        self.hw.watchdog.wake();
        self.hw.timer.start(interval);
    }

    fn draw_sleep_screen(&mut self, store: &VirtualFileStore) -> Result<(), PawPetError> {
        self.sleep_screen.resolve(store);
        let screen = &mut self.hw.screen;
        let Ok(()) = screen.clear(BinaryColor::Off);
        if let Some((w, h)) = self.sleep_screen.size() {
            let origin = Point::new(
                (DISPLAY_WIDTH as i32 - i32::from(w)) / 2,
                (DISPLAY_HEIGHT as i32 - i32::from(h)) / 2,
            );
            self.sleep_screen.draw(screen, origin)?;
        }
        screen.update();
        Ok(())
    }
}

/// The PawPet handheld.
#[derive(Debug)]
pub struct PawPet {
    config: PawPetConfig,
    clock: MasterClock,
    lifecycle: Lifecycle,
    store: VirtualFileStore,
    latch: InputLatch,
    input_queue: InputQueue,
    device: Device,
}

impl PawPet {
    /// A device with the stock configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PawPetConfig::default())
    }

    #[must_use]
    pub fn with_config(config: PawPetConfig) -> Self {
        let store = VirtualFileStore::new(&config);
        let device = Device::new(&config, &store);
        let latch = InputLatch::new(config.initial_battery);
        let mut pet = Self {
            config,
            clock: MasterClock::new(MASTER_CLOCK_HZ),
            lifecycle: Lifecycle::Uninitialized,
            store,
            latch,
            input_queue: InputQueue::new(),
            device,
        };
        // an empty boot set needs nothing before the first frame
        pet.check_ready();
        pet
    }

    /// Store a file. May complete the boot set and make the device ready.
    ///
    /// # Errors
    ///
    /// `InvalidAsset` if a sprite sheet or save blob fails validation. The
    /// store is unchanged in that case.
    pub fn load_file(&mut self, bytes: &[u8], name: &str) -> Result<(), PawPetError> {
        self.store.put(name, bytes)?;
        self.check_ready();
        Ok(())
    }

    fn check_ready(&mut self) {
        if self.lifecycle != Lifecycle::Uninitialized || !self.missing_assets().is_empty() {
            return;
        }
        if let Ok(bytes) = self.store.get(&self.config.save_name) {
            match SaveData::from_bytes(bytes) {
                Ok(save) => {
                    info!(
                        frames_alive = save.frames_alive,
                        hatch_remaining = save.hatch_remaining,
                        "restored save"
                    );
                    self.device.runner.restore(save);
                }
                Err(e) => warn!(error = %e, "ignoring unreadable save"),
            }
        }
        self.lifecycle = Lifecycle::Ready;
        info!(assets = self.store.len(), "boot assets loaded, device ready");
    }

    /// Boot assets not yet loaded, in configuration order.
    #[must_use]
    pub fn missing_assets(&self) -> Vec<String> {
        self.config
            .required_assets
            .iter()
            .filter(|name| !self.store.contains(name))
            .cloned()
            .collect()
    }

    /// Replace the held-button mask.
    pub fn set_buttons(&mut self, mask: u8) {
        self.latch.set_buttons(mask);
    }

    /// Set the battery level, clamped to 0..=100.
    pub fn set_battery(&mut self, level: impl Into<f64>) {
        self.latch.set_battery(level);
    }

    /// Run one frame. Returns the master ticks it took.
    ///
    /// # Errors
    ///
    /// `NotReady` before the boot set is loaded, `CorruptAsset` if a sheet
    /// could not be drawn. Either way nothing changes.
    ///
    /// A corrupt sheet in the active scene fails every tick, including one
    /// whose input would leave the scene, since the input is discarded with
    /// the rest of the frame. Replacing the sheet with `load_file` is the
    /// only way out.
    pub fn tick(&mut self) -> Result<u64, PawPetError> {
        if self.lifecycle == Lifecycle::Uninitialized {
            return Err(PawPetError::NotReady {
                missing: self.missing_assets(),
            });
        }

        let mut latch = self.latch;
        let mut queue = self.input_queue.clone();
        queue.process(self.device.frame_count, &mut latch);

        let mut next = self.device.clone();
        let step = match next.step(latch.snapshot(), &self.store) {
            Ok(step) => step,
            Err(e) => {
                warn!(error = %e, frame = self.device.frame_count, "frame failed, state kept");
                return Err(e);
            }
        };

        self.device = next;
        self.latch = latch;
        self.input_queue = queue;
        if self.lifecycle == Lifecycle::Ready {
            self.lifecycle = Lifecycle::Running;
            info!("first frame");
        }
        if step.save_due {
            self.persist();
        }
        Ok(step.ticks)
    }

    fn persist(&mut self) {
        let bytes = self.device.runner.save().to_bytes();
        if let Err(e) = self.store.put(&self.config.save_name, &bytes) {
            warn!(error = %e, "could not write save");
        }
    }

    /// Frame interval of the active scene.
    #[must_use]
    pub const fn framerate_ms(&self) -> u32 {
        self.device.runner.framerate().millis()
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lifecycle != Lifecycle::Uninitialized
    }

    #[must_use]
    pub const fn config(&self) -> &PawPetConfig {
        &self.config
    }

    #[must_use]
    pub const fn screen(&self) -> &Screen {
        &self.device.hw.screen
    }

    /// Frame buffer, one byte per pixel, `1` = set.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.device.hw.screen.pixels()
    }

    #[must_use]
    pub const fn store(&self) -> &VirtualFileStore {
        &self.store
    }

    /// Bytes of a stored file.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is stored under `name`.
    pub fn get(&self, name: &str) -> Result<&[u8], PawPetError> {
        self.store.get(name)
    }

    /// The persisted save blob, once one exists.
    #[must_use]
    pub fn save_data(&self) -> Option<&[u8]> {
        self.store.get(&self.config.save_name).ok()
    }

    #[must_use]
    pub const fn latch(&self) -> &InputLatch {
        &self.latch
    }

    /// Scripted input applied at the start of the matching frames.
    pub fn input_queue(&mut self) -> &mut InputQueue {
        &mut self.input_queue
    }

    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.device.frame_count
    }

    /// Master ticks since power-on.
    #[must_use]
    pub const fn master_ticks(&self) -> Ticks {
        self.device.hw.timer.now()
    }

    #[must_use]
    pub const fn scene(&self) -> SceneKind {
        self.device.runner.scene().kind()
    }

    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        self.device.sleeping
    }
}

impl Default for PawPet {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine for PawPet {
    type Error = PawPetError;

    #[allow(clippy::cast_precision_loss)]
    fn video_config(&self) -> VideoConfig {
        VideoConfig {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            fps: 1000.0 / self.framerate_ms() as f32,
        }
    }

    fn run_frame(&mut self) -> Result<u64, PawPetError> {
        self.tick()
    }

    fn render_rgba(&self, buffer: &mut [u8]) {
        self.screen().write_rgba(buffer);
    }

    fn load_file(&mut self, data: &[u8], name: &str) -> Result<(), PawPetError> {
        PawPet::load_file(self, data, name)
    }

    fn frame_count(&self) -> u64 {
        self.device.frame_count
    }
}

impl Observable for PawPet {
    fn query(&self, path: &str) -> Option<Value> {
        let hw = &self.device.hw;
        let runner = &self.device.runner;
        match path {
            "lifecycle" => Some(self.lifecycle.name().into()),
            "frame_count" => Some(self.device.frame_count.into()),
            "clock.ticks" => Some(hw.timer.now().get().into()),
            "clock.ms" => Some(self.clock.millis_for_ticks(hw.timer.now()).into()),
            "scene" => Some(runner.scene().kind().name().into()),
            "framerate_ms" => Some(self.framerate_ms().into()),
            "buttons" => Some(hw.buttons.state().into()),
            "battery.level" => Some(hw.battery.level().into()),
            "battery.centivolts" => Some(hw.battery.read().into()),
            "battery.icon" => Some((hw.battery.icon_frame() as u64).into()),
            "sleeping" => Some(self.device.sleeping.into()),
            "debug" => Some(runner.debug().into()),
            "idle_frames" => Some(runner.idle_frames().into()),
            "frames.dropped" => Some(runner.dropped_frames().into()),
            "frames.work_ms" => Some(runner.last_frametime().into()),
            "watchdog.feeds" => Some(hw.watchdog.feeds().into()),
            "watchdog.expirations" => Some(hw.watchdog.expirations().into()),
            "display.updates" => Some(hw.screen.updates().into()),
            "display.lit" => Some((hw.screen.lit() as u64).into()),
            "assets.count" => Some((self.store.len() as u64).into()),
            "assets.names" => Some(
                self.store
                    .names()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
                    .into(),
            ),
            "assets.missing" => Some(self.missing_assets().into()),
            "egg.hatch_remaining" => Some(runner.save().hatch_remaining.into()),
            "menu.selection" => runner
                .scene()
                .menu_selection()
                .map(|s| (s as u64).into()),
            "save.frames_alive" => Some(runner.save().frames_alive.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "lifecycle",
            "frame_count",
            "clock.ticks",
            "clock.ms",
            "scene",
            "framerate_ms",
            "buttons",
            "battery.level",
            "battery.centivolts",
            "battery.icon",
            "sleeping",
            "debug",
            "idle_frames",
            "frames.dropped",
            "frames.work_ms",
            "watchdog.feeds",
            "watchdog.expirations",
            "display.updates",
            "display.lit",
            "assets.count",
            "assets.names",
            "assets.missing",
            "egg.hatch_remaining",
            "menu.selection",
            "save.frames_alive",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format_paw::{Frame, Texel};

    fn sheet(frames: usize, w: u16, h: u16) -> Vec<u8> {
        let frames = vec![Frame::new(w, h, vec![Texel::On; usize::from(w * h)]); frames];
        format_paw::encode(&frames).expect("encode")
    }

    fn booted() -> PawPet {
        let mut pet = PawPet::new();
        pet.load_file(&sheet(5, 16, 8), "battery").expect("battery");
        pet.load_file(&sheet(5, 16, 16), "petsit").expect("petsit");
        pet.load_file(&sheet(5, 8, 8), "icons").expect("icons");
        pet.load_file(&sheet(1, 32, 16), "sleeptest").expect("sleeptest");
        pet
    }

    #[test]
    fn becomes_ready_once_boot_set_is_loaded() {
        let mut pet = PawPet::new();
        assert_eq!(pet.lifecycle(), Lifecycle::Uninitialized);
        pet.load_file(&sheet(5, 16, 8), "battery").expect("battery");
        assert_eq!(pet.missing_assets(), vec!["petsit", "icons", "sleeptest"]);

        let pet = booted();
        assert_eq!(pet.lifecycle(), Lifecycle::Ready);
        assert!(pet.is_ready());
    }

    #[test]
    fn first_tick_moves_to_running() {
        let mut pet = booted();
        assert_eq!(pet.tick().expect("tick"), 33);
        assert_eq!(pet.lifecycle(), Lifecycle::Running);
        assert_eq!(pet.frame_count(), 1);
    }

    #[test]
    fn empty_boot_set_is_ready_at_once() {
        let pet = PawPet::with_config(PawPetConfig {
            required_assets: Vec::new(),
            ..PawPetConfig::default()
        });
        assert_eq!(pet.lifecycle(), Lifecycle::Ready);
    }

    #[test]
    fn framerate_needs_no_frame() {
        assert_eq!(PawPet::new().framerate_ms(), 33);
    }

    #[test]
    fn query_reports_scene_and_assets() {
        let mut pet = booted();
        pet.tick().expect("tick");
        assert_eq!(pet.query("scene"), Some(Value::String("menu".into())));
        assert_eq!(pet.query("menu.selection"), Some(Value::U64(0)));
        assert_eq!(pet.query("assets.count"), Some(Value::U64(4)));
        assert_eq!(pet.query("egg.hatch_remaining"), Some(Value::U16(200)));
        assert_eq!(pet.query("nope"), None);
    }

    #[test]
    fn battery_icon_follows_level() {
        let mut pet = booted();
        pet.set_battery(0);
        pet.tick().expect("tick");
        assert_eq!(pet.query("battery.icon"), Some(Value::U64(4)));
        assert_eq!(pet.query("battery.centivolts"), Some(Value::U16(200)));
    }

    #[test]
    fn scene_change_writes_save() {
        let mut pet = booted();
        pet.tick().expect("tick");
        assert!(pet.save_data().is_none());

        pet.set_buttons(PawButton::P.mask());
        pet.tick().expect("tick");
        assert_eq!(pet.scene(), SceneKind::Egg);
        let save = SaveData::from_bytes(pet.save_data().expect("saved")).expect("valid");
        assert_eq!(save.frames_alive, 2);
    }

    #[test]
    fn machine_trait_drives_the_device() {
        fn run<M: Machine>(m: &mut M) -> u64 {
            assert!(m.run_frame().is_ok());
            assert!(m.run_frame().is_ok());
            m.frame_count()
        }
        let mut pet = booted();
        assert_eq!(run(&mut pet), 2);
        assert_eq!(pet.video_config().rgba_len(), 64 * 64 * 4);
    }
}
