//! Persistent save blob.
//!
//! Layout (little-endian):
//!
//! | Offset | Size | Field            |
//! |--------|------|------------------|
//! | 0      | 4    | magic `PAWS`     |
//! | 4      | 1    | version          |
//! | 5      | 8    | frames alive     |
//! | 13     | 2    | hatch countdown  |
//! | 15     | 1    | debug overlay    |
//! | 16     | 4    | CRC-32 of 0..16  |
//!
//! The checksum is the flash filesystem's CRC-32 (BZIP2 parameters).

use crc::{CRC_32_BZIP2, Crc};

const MAGIC: &[u8; 4] = b"PAWS";
const VERSION: u8 = 1;
const BODY_LEN: usize = 16;

/// Size of an encoded save blob.
pub const SAVE_LEN: usize = BODY_LEN + 4;

const CHECKSUM: Crc<u32> = Crc::<u32>::new(&CRC_32_BZIP2);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("save is {0} bytes, expected {expected}", expected = SAVE_LEN)]
    Length(usize),
    #[error("bad save magic")]
    Magic,
    #[error("unsupported save version {0}")]
    Version(u8),
    #[error("save checksum {stored:#010x} does not match {computed:#010x}")]
    Checksum { stored: u32, computed: u32 },
}

/// State that survives a power cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveData {
    /// Firmware frames run across all sessions.
    pub frames_alive: u64,
    /// Frames until the egg hatches; 0 once hatched.
    pub hatch_remaining: u16,
    /// Debug overlay enabled.
    pub debug: bool,
}

impl SaveData {
    #[must_use]
    pub const fn new(hatch_frames: u16) -> Self {
        Self {
            frames_alive: 0,
            hatch_remaining: hatch_frames,
            debug: false,
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SAVE_LEN);
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&self.frames_alive.to_le_bytes());
        buf.extend_from_slice(&self.hatch_remaining.to_le_bytes());
        buf.push(u8::from(self.debug));
        let crc = CHECKSUM.checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveError> {
        if data.len() != SAVE_LEN {
            return Err(SaveError::Length(data.len()));
        }
        if &data[0..4] != MAGIC {
            return Err(SaveError::Magic);
        }
        if data[4] != VERSION {
            return Err(SaveError::Version(data[4]));
        }

        let stored = u32::from_le_bytes([data[16], data[17], data[18], data[19]]);
        let computed = CHECKSUM.checksum(&data[..BODY_LEN]);
        if stored != computed {
            return Err(SaveError::Checksum { stored, computed });
        }

        let mut frames = [0u8; 8];
        frames.copy_from_slice(&data[5..13]);
        Ok(Self {
            frames_alive: u64::from_le_bytes(frames),
            hatch_remaining: u16::from_le_bytes([data[13], data[14]]),
            debug: data[15] != 0,
        })
    }
}
