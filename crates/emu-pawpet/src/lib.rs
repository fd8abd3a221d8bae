//! PawPet handheld emulator.
//!
//! The PawPet is a 64x64 monochrome virtual pet with eight buttons, a
//! battery monitor, a sleep-capable watchdog and a small flash filesystem.
//! Time is driven by the 1 kHz SysTick: one master tick is one millisecond.
//!
//! The host pushes a button mask and battery level into the input latch,
//! streams named asset files into the virtual file store, and calls
//! [`PawPet::tick`] once per frame. Each tick runs one firmware frame,
//! clocks the peripherals through the frame interval and leaves the result
//! on the [`Screen`].

mod battery;
#[cfg(feature = "native")]
pub mod capture;
mod config;
mod display;
mod error;
#[cfg(feature = "native")]
pub mod host;
pub mod input;
#[cfg(feature = "native")]
pub mod mcp;
mod pawpet;
mod runner;
mod save;
mod scene;
mod sprite;
mod storage;
mod timer;
mod watchdog;

pub use battery::BatteryMonitor;
pub use config::{Framerate, PawPetConfig};
pub use display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Screen};
pub use error::PawPetError;
pub use input::{ButtonState, InputLatch, InputQueue, InputSnapshot, PawButton};
pub use pawpet::{Lifecycle, MASTER_CLOCK_HZ, PawPet};
pub use runner::{FrameReport, Hardware, Runner};
pub use save::{SaveData, SaveError};
pub use scene::{ActiveScene, EggScene, EmptyScene, MenuScene, Scene, SceneKind};
pub use sprite::{Animation, Sprite};
pub use storage::{AssetKind, SpriteSheet, VirtualFileStore};
pub use timer::SysTimer;
pub use watchdog::{Watchdog, WatchdogTimeout};
