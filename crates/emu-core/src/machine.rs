//! Host-facing abstraction for an emulated device.
//!
//! Capture helpers and the control server drive a device through this trait
//! without knowing its internals.

/// Video output configuration for a machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoConfig {
    /// Native display width in pixels.
    pub width: u32,
    /// Native display height in pixels.
    pub height: u32,
    /// Nominal frame rate in frames per second.
    pub fps: f32,
}

impl VideoConfig {
    /// Size in bytes of an RGBA buffer for one frame.
    #[must_use]
    pub const fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// An emulated device a host can drive one frame at a time.
pub trait Machine {
    /// Error raised by loading or stepping the machine.
    type Error: std::error::Error;

    /// Video output configuration.
    fn video_config(&self) -> VideoConfig;

    /// Execute one frame of emulation. Returns the master ticks it consumed.
    fn run_frame(&mut self) -> Result<u64, Self::Error>;

    /// Render the current frame into an RGBA buffer of
    /// `video_config().rgba_len()` bytes.
    fn render_rgba(&self, buffer: &mut [u8]);

    /// Load a named file into the machine.
    fn load_file(&mut self, data: &[u8], name: &str) -> Result<(), Self::Error>;

    /// Number of frames run since construction.
    fn frame_count(&self) -> u64;
}
