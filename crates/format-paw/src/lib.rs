//! PawPet sprite-sheet (`.paw`) parser and decoder.
//!
//! A `.paw` file is a little-endian 8-byte header (width, height, encoding,
//! tile count), a table of one `u16` offset per frame, then the pixel data.
//! Offsets are relative to the first byte after the table. Each frame is
//! either a packed bitmap or a run-length span stream; either form may carry
//! alpha.
//!
//! Single images written by the asset converter have no offset table: their
//! pixel data starts right after the header. Sprite maps, even one-tile ones,
//! always carry the table.
//!
//! Parsing validates the header and offset table only. Frames are decoded
//! on request, so a malformed pixel stream surfaces when that frame is
//! first drawn rather than at load time.

#![allow(clippy::cast_possible_truncation)]

mod encode;

pub use encode::{encode, encode_as};

/// Header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Largest width or height a sheet may declare.
pub const MAX_DIMENSION: u16 = 255;

/// Longest run in a binary span byte.
pub const MAX_SPAN: u8 = 0x7F;

/// Longest run in an alpha span byte.
pub const MAX_SPAN_ALPHA: u8 = 0x3F;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PawError {
    #[error("sheet is {len} bytes, header and offset table need {needed}")]
    Truncated { len: usize, needed: usize },
    #[error("dimensions {width}x{height} outside 1..=255")]
    BadDimensions { width: u16, height: u16 },
    #[error("unknown encoding {0}")]
    UnknownEncoding(u16),
    #[error("sheet declares no frames")]
    NoFrames,
    #[error("frame {frame} offset {offset} is outside the {data_len}-byte pixel data")]
    OffsetOutOfRange {
        frame: usize,
        offset: u16,
        data_len: usize,
    },
    #[error("frame {frame} requested from a sheet of {tile_count}")]
    FrameOutOfRange { frame: usize, tile_count: usize },
    #[error("frame {frame} pixel data ends after {decoded} of {expected} pixels")]
    FrameTruncated {
        frame: usize,
        decoded: usize,
        expected: usize,
    },
    #[error("frame {frame} has a zero-length span at byte {at}")]
    ZeroSpan { frame: usize, at: usize },
    #[error("frame {frame} spans run {excess} pixels past the frame")]
    SpanOverrun { frame: usize, excess: usize },
    #[error("frame {frame} is {width}x{height}, sheet is {expected_width}x{expected_height}")]
    FrameSize {
        frame: usize,
        width: u16,
        height: u16,
        expected_width: u16,
        expected_height: u16,
    },
    #[error("{texel:?} cannot be stored without alpha")]
    NeedsAlpha { texel: Texel },
    #[error("encoded sheet exceeds the 64 KiB offset range")]
    TooLarge,
}

/// Pixel data layout of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 1 bit per pixel, LSB first.
    Bitmap,
    /// 2 bits per pixel, LSB first.
    BitmapAlpha,
    /// `color << 7 | run` bytes.
    Span,
    /// `color << 6 | run` bytes.
    SpanAlpha,
}

impl Encoding {
    /// Decode the header's encoding field: bit 1 selects spans, bit 0 alpha.
    pub const fn from_id(id: u16) -> Result<Self, PawError> {
        match id {
            0 => Ok(Self::Bitmap),
            1 => Ok(Self::BitmapAlpha),
            2 => Ok(Self::Span),
            3 => Ok(Self::SpanAlpha),
            other => Err(PawError::UnknownEncoding(other)),
        }
    }

    #[must_use]
    pub const fn id(self) -> u16 {
        match self {
            Self::Bitmap => 0,
            Self::BitmapAlpha => 1,
            Self::Span => 2,
            Self::SpanAlpha => 3,
        }
    }

    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::BitmapAlpha | Self::SpanAlpha)
    }

    #[must_use]
    pub const fn is_span(self) -> bool {
        matches!(self, Self::Span | Self::SpanAlpha)
    }

    /// Bits per pixel of the packed encodings; `None` for spans.
    #[must_use]
    pub const fn bits_per_pixel(self) -> Option<usize> {
        match self {
            Self::Bitmap => Some(1),
            Self::BitmapAlpha => Some(2),
            Self::Span | Self::SpanAlpha => None,
        }
    }
}

/// One decoded pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Texel {
    /// Drawn in the sprite's off colour (white on the panel).
    #[default]
    Off,
    /// Drawn in the sprite's on colour (black on the panel).
    On,
    /// Transparent. Packed sheets draw it in the sprite's alpha colour when
    /// one is set; span sheets never draw it.
    Clear,
    /// Never drawn.
    Skip,
}

impl Texel {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::Off,
            1 => Self::On,
            2 => Self::Clear,
            _ => Self::Skip,
        }
    }

    const fn bits(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Clear => 2,
            Self::Skip => 3,
        }
    }

    /// Whether the texel can be stored in a non-alpha encoding.
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        matches!(self, Self::Off | Self::On)
    }
}

/// A single decoded frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    texels: Vec<Texel>,
}

impl Frame {
    /// Build a frame from row-major texels. Short input is padded with
    /// `Texel::Off`; extra texels are dropped.
    #[must_use]
    pub fn new(width: u16, height: u16, mut texels: Vec<Texel>) -> Self {
        texels.resize(width as usize * height as usize, Texel::Off);
        Self {
            width,
            height,
            texels,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    /// Texel at `(x, y)`, or `None` outside the frame.
    #[must_use]
    pub fn texel(&self, x: u16, y: u16) -> Option<Texel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterate `(x, y, texel)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u16, u16, Texel)> + '_ {
        let w = self.width.max(1) as usize;
        self.texels
            .iter()
            .enumerate()
            .map(move |(i, &t)| ((i % w) as u16, (i / w) as u16, t))
    }
}

/// A parsed sprite sheet.
///
/// Holds the raw pixel data; frames are decoded on demand by
/// [`PawImage::decode_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PawImage {
    width: u16,
    height: u16,
    encoding: Encoding,
    offsets: Vec<u16>,
    has_table: bool,
    data: Vec<u8>,
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

impl PawImage {
    /// Parse and validate a sheet's header and offset table.
    pub fn parse(bytes: &[u8]) -> Result<Self, PawError> {
        if bytes.len() < HEADER_LEN {
            return Err(PawError::Truncated {
                len: bytes.len(),
                needed: HEADER_LEN,
            });
        }

        let width = read_u16(bytes, 0);
        let height = read_u16(bytes, 2);
        let encoding = Encoding::from_id(read_u16(bytes, 4))?;
        let tile_count = read_u16(bytes, 6) as usize;

        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PawError::BadDimensions { width, height });
        }
        if tile_count == 0 {
            return Err(PawError::NoFrames);
        }

        let has_table = tile_count > 1 || !is_bare_image(bytes, width, height, encoding);
        let data_start = if has_table {
            HEADER_LEN + tile_count * 2
        } else {
            HEADER_LEN
        };
        if bytes.len() < data_start {
            return Err(PawError::Truncated {
                len: bytes.len(),
                needed: data_start,
            });
        }

        let offsets: Vec<u16> = if has_table {
            (0..tile_count)
                .map(|i| read_u16(bytes, HEADER_LEN + i * 2))
                .collect()
        } else {
            vec![0]
        };
        let data = bytes[data_start..].to_vec();

        for (frame, &offset) in offsets.iter().enumerate() {
            if offset as usize >= data.len() {
                return Err(PawError::OffsetOutOfRange {
                    frame,
                    offset,
                    data_len: data.len(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            encoding,
            offsets,
            has_table,
            data,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the file carried an offset table.
    #[must_use]
    pub const fn has_offset_table(&self) -> bool {
        self.has_table
    }

    /// Raw pixel data following the header and offset table.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Decode one frame.
    pub fn decode_frame(&self, index: usize) -> Result<Frame, PawError> {
        let offset = *self
            .offsets
            .get(index)
            .ok_or(PawError::FrameOutOfRange {
                frame: index,
                tile_count: self.offsets.len(),
            })? as usize;
        let stream = &self.data[offset..];

        let texels = match self.encoding {
            Encoding::Bitmap => self.decode_packed(index, stream, 1)?,
            Encoding::BitmapAlpha => self.decode_packed(index, stream, 2)?,
            Encoding::Span => self.decode_spans(index, stream, false)?,
            Encoding::SpanAlpha => self.decode_spans(index, stream, true)?,
        };

        Ok(Frame {
            width: self.width,
            height: self.height,
            texels,
        })
    }

    fn decode_packed(
        &self,
        frame: usize,
        stream: &[u8],
        bits: usize,
    ) -> Result<Vec<Texel>, PawError> {
        let expected = self.pixel_count();
        let per_byte = 8 / bits;
        let needed = expected.div_ceil(per_byte);
        if stream.len() < needed {
            return Err(PawError::FrameTruncated {
                frame,
                decoded: stream.len() * per_byte,
                expected,
            });
        }

        let mask = (1u8 << bits) - 1;
        Ok((0..expected)
            .map(|i| {
                let byte = stream[i / per_byte];
                Texel::from_bits((byte >> ((i % per_byte) * bits)) & mask)
            })
            .collect())
    }

    fn decode_spans(
        &self,
        frame: usize,
        stream: &[u8],
        alpha: bool,
    ) -> Result<Vec<Texel>, PawError> {
        let expected = self.pixel_count();
        let mut texels = Vec::with_capacity(expected);

        for (at, &byte) in stream.iter().enumerate() {
            if texels.len() >= expected {
                break;
            }
            let (run, texel) = if alpha {
                (byte & MAX_SPAN_ALPHA, Texel::from_bits(byte >> 6))
            } else {
                let t = if byte >> 7 == 1 { Texel::On } else { Texel::Off };
                (byte & MAX_SPAN, t)
            };
            if run == 0 {
                return Err(PawError::ZeroSpan { frame, at });
            }
            let run = run as usize;
            if texels.len() + run > expected {
                return Err(PawError::SpanOverrun {
                    frame,
                    excess: texels.len() + run - expected,
                });
            }
            texels.extend(std::iter::repeat_n(texel, run));
        }

        if texels.len() < expected {
            return Err(PawError::FrameTruncated {
                frame,
                decoded: texels.len(),
                expected,
            });
        }
        Ok(texels)
    }

    /// Serialise back to `.paw` bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.offsets.len() * 2 + self.data.len());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.encoding.id().to_le_bytes());
        out.extend_from_slice(&(self.offsets.len() as u16).to_le_bytes());
        if self.has_table {
            for offset in &self.offsets {
                out.extend_from_slice(&offset.to_le_bytes());
            }
        }
        out.extend_from_slice(&self.data);
        out
    }
}

/// Whether a one-frame sheet is a bare image with no offset table.
///
/// A table for one frame is the single word `0`. A bare span stream can never
/// start with a zero byte, and a bare bitmap is exactly one frame long.
fn is_bare_image(bytes: &[u8], width: u16, height: u16, encoding: Encoding) -> bool {
    let payload = &bytes[HEADER_LEN..];
    if payload.len() < 3 || read_u16(bytes, HEADER_LEN) != 0 {
        return true;
    }
    match encoding.bits_per_pixel() {
        Some(bits) => {
            let pixels = width as usize * height as usize;
            payload.len() == pixels.div_ceil(8 / bits)
        }
        None => false,
    }
}
