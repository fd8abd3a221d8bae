//! Browser binding for the PawPet emulator.
//!
//! Exposes `PawPetSim` with the call surface the web shim expects: stream
//! files in with `load_file`, push input with `set_buttons`/`set_battery`,
//! call `tick` every `get_framerate_ms` milliseconds and blit the frame
//! buffer. A tick that cannot run leaves the previous frame on screen.

use emu_pawpet::{DISPLAY_HEIGHT, DISPLAY_WIDTH, PawPet, PawPetError};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct PawPetSim {
    pet: PawPet,
}

#[wasm_bindgen]
impl PawPetSim {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self { pet: PawPet::new() }
    }

    /// Store a file under `name`. Rejected sprite sheets and saves leave
    /// the store unchanged.
    pub fn load_file(&mut self, value: &[u8], name: String) -> Result<(), JsValue> {
        self.pet
            .load_file(value, &name)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_buttons(&mut self, state: u8) {
        self.pet.set_buttons(state);
    }

    /// Battery level in percent; clamped to 0-100.
    pub fn set_battery(&mut self, value: f64) {
        self.pet.set_battery(value);
    }

    /// Advance one frame.
    pub fn tick(&mut self) {
        match self.pet.tick() {
            Ok(_) => {}
            Err(PawPetError::NotReady { missing }) => {
                debug!(?missing, "tick before boot assets");
            }
            Err(e) => warn!(error = %e, "frame skipped"),
        }
    }

    /// Interval the host should wait between ticks.
    #[must_use]
    pub fn get_framerate_ms(&self) -> u32 {
        self.pet.framerate_ms()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pet.is_ready()
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        DISPLAY_WIDTH
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        DISPLAY_HEIGHT
    }

    /// One byte per pixel, row-major, `1` = set.
    #[must_use]
    pub fn framebuffer(&self) -> Vec<u8> {
        self.pet.framebuffer().to_vec()
    }

    /// The frame as RGBA, set pixels black.
    #[must_use]
    pub fn framebuffer_rgba(&self) -> Vec<u8> {
        let mut rgba = vec![0u8; (DISPLAY_WIDTH * DISPLAY_HEIGHT * 4) as usize];
        self.pet.screen().write_rgba(&mut rgba);
        rgba
    }

    /// Latest persisted save blob, if the firmware has written one.
    #[must_use]
    pub fn save_data(&self) -> Option<Vec<u8>> {
        self.pet.save_data().map(<[u8]>::to_vec)
    }

    /// Frames run so far. JS numbers are doubles.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_count(&self) -> f64 {
        self.pet.frame_count() as f64
    }
}

impl Default for PawPetSim {
    fn default() -> Self {
        Self::new()
    }
}
