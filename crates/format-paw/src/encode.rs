//! `.paw` encoder.
//!
//! Frames are written back to back after the offset table. Each frame
//! starts on a byte boundary. Automatic encoding picks alpha only when a
//! texel needs it, then keeps whichever of bitmap or span is smaller.

use crate::{Encoding, Frame, HEADER_LEN, MAX_SPAN, MAX_SPAN_ALPHA, PawError, Texel};

/// Encode frames, choosing the smallest suitable encoding.
pub fn encode(frames: &[Frame]) -> Result<Vec<u8>, PawError> {
    let alpha = frames
        .iter()
        .flat_map(Frame::texels)
        .any(|t| !t.is_opaque());
    let (bitmap, span) = if alpha {
        (Encoding::BitmapAlpha, Encoding::SpanAlpha)
    } else {
        (Encoding::Bitmap, Encoding::Span)
    };

    let packed = encode_as(frames, bitmap)?;
    let spans = encode_as(frames, span)?;
    Ok(if spans.len() < packed.len() { spans } else { packed })
}

/// Encode frames with a fixed encoding.
pub fn encode_as(frames: &[Frame], encoding: Encoding) -> Result<Vec<u8>, PawError> {
    let first = frames.first().ok_or(PawError::NoFrames)?;
    let (width, height) = (first.width(), first.height());
    if width == 0 || height == 0 || width > crate::MAX_DIMENSION || height > crate::MAX_DIMENSION {
        return Err(PawError::BadDimensions { width, height });
    }
    if frames.len() > usize::from(u16::MAX) {
        return Err(PawError::TooLarge);
    }

    let mut offsets = Vec::with_capacity(frames.len());
    let mut data = Vec::new();

    for (index, frame) in frames.iter().enumerate() {
        if frame.width() != width || frame.height() != height {
            return Err(PawError::FrameSize {
                frame: index,
                width: frame.width(),
                height: frame.height(),
                expected_width: width,
                expected_height: height,
            });
        }
        if !encoding.has_alpha() {
            if let Some(&texel) = frame.texels().iter().find(|t| !t.is_opaque()) {
                return Err(PawError::NeedsAlpha { texel });
            }
        }

        let offset = u16::try_from(data.len()).map_err(|_| PawError::TooLarge)?;
        offsets.push(offset);

        match encoding {
            Encoding::Bitmap => pack(frame.texels(), 1, &mut data),
            Encoding::BitmapAlpha => pack(frame.texels(), 2, &mut data),
            Encoding::Span => spans(frame.texels(), false, &mut data),
            Encoding::SpanAlpha => spans(frame.texels(), true, &mut data),
        }
    }

    let mut out = Vec::with_capacity(HEADER_LEN + offsets.len() * 2 + data.len());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&encoding.id().to_le_bytes());
    out.extend_from_slice(&(offsets.len() as u16).to_le_bytes());
    for offset in offsets {
        out.extend_from_slice(&offset.to_le_bytes());
    }
    out.extend_from_slice(&data);
    Ok(out)
}

fn pack(texels: &[Texel], bits: usize, out: &mut Vec<u8>) {
    let per_byte = 8 / bits;
    for chunk in texels.chunks(per_byte) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, t)| acc | (t.bits() << (i * bits)));
        out.push(byte);
    }
}

fn spans(texels: &[Texel], alpha: bool, out: &mut Vec<u8>) {
    let (max, shift) = if alpha {
        (MAX_SPAN_ALPHA, 6)
    } else {
        (MAX_SPAN, 7)
    };

    let mut iter = texels.iter().copied().peekable();
    while let Some(texel) = iter.next() {
        let mut run = 1u8;
        while run < max && iter.peek() == Some(&texel) {
            iter.next();
            run += 1;
        }
        out.push((texel.bits() << shift) | run);
    }
}
