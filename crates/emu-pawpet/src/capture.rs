//! Headless capture: PNG screenshots and frame dumps.
//!
//! Works on any [`Machine`], reading the frame back through
//! `render_rgba`.

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

use emu_core::Machine;

/// Encode the current frame as PNG into `out`.
///
/// # Errors
///
/// Returns an error if the PNG encoder fails.
pub fn write_png<M: Machine, W: Write>(machine: &M, out: W) -> Result<(), Box<dyn Error>> {
    let video = machine.video_config();
    let mut rgba = vec![0u8; video.rgba_len()];
    machine.render_rgba(&mut rgba);

    let mut encoder = png::Encoder::new(out, video.width, video.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    Ok(())
}

/// The current frame as PNG bytes.
///
/// # Errors
///
/// Returns an error if the PNG encoder fails.
pub fn encode_png<M: Machine>(machine: &M) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut buf = Vec::new();
    write_png(machine, &mut buf)?;
    Ok(buf)
}

/// Save the current frame as a PNG file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot<M: Machine>(machine: &M, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    write_png(machine, std::io::BufWriter::new(file))
}

/// Run `num_frames` frames, dumping each as a numbered PNG under
/// `dir/frames`.
///
/// # Errors
///
/// Returns an error if a frame fails to run or cannot be saved.
pub fn record<M>(machine: &mut M, dir: &Path, num_frames: u32) -> Result<(), Box<dyn Error>>
where
    M: Machine,
    M::Error: 'static,
{
    let frames_dir = dir.join("frames");
    fs::create_dir_all(&frames_dir)?;

    for i in 1..=num_frames {
        machine.run_frame()?;
        let filename = frames_dir.join(format!("{i:06}.png"));
        save_screenshot(machine, &filename)?;
    }

    tracing::info!(frames = num_frames, dir = %frames_dir.display(), "captured frames");
    Ok(())
}
