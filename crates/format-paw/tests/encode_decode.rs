//! Property tests: anything the encoder writes, the parser reads back.

use format_paw::{Encoding, Frame, PawImage, Texel, encode, encode_as};
use proptest::prelude::*;

fn texel() -> impl Strategy<Value = Texel> + Clone {
    prop_oneof![
        Just(Texel::Off),
        Just(Texel::On),
        Just(Texel::Clear),
        Just(Texel::Skip),
    ]
}

fn opaque_texel() -> impl Strategy<Value = Texel> + Clone {
    prop_oneof![Just(Texel::Off), Just(Texel::On)]
}

fn sheet(texel: impl Strategy<Value = Texel> + Clone) -> impl Strategy<Value = Vec<Frame>> {
    (1u16..=24, 1u16..=24, 1usize..=4).prop_flat_map(move |(w, h, n)| {
        let len = w as usize * h as usize;
        prop::collection::vec(prop::collection::vec(texel.clone(), len), n)
            .prop_map(move |frames| frames.into_iter().map(|t| Frame::new(w, h, t)).collect())
    })
}

fn decode_all(bytes: &[u8]) -> Vec<Frame> {
    let img = PawImage::parse(bytes).expect("encoder output parses");
    (0..img.tile_count())
        .map(|i| img.decode_frame(i).expect("encoder output decodes"))
        .collect()
}

proptest! {
    #[test]
    fn auto_encoding_preserves_alpha_sheets(frames in sheet(texel())) {
        let bytes = encode(&frames).expect("encode");
        prop_assert_eq!(decode_all(&bytes), frames);
    }

    #[test]
    fn auto_encoding_preserves_opaque_sheets(frames in sheet(opaque_texel())) {
        let bytes = encode(&frames).expect("encode");
        let img = PawImage::parse(&bytes).expect("parse");
        prop_assert!(!img.encoding().has_alpha());
        prop_assert_eq!(decode_all(&bytes), frames);
    }

    #[test]
    fn auto_encoding_is_never_larger_than_either_choice(frames in sheet(opaque_texel())) {
        let auto = encode(&frames).expect("encode").len();
        let bitmap = encode_as(&frames, Encoding::Bitmap).expect("bitmap").len();
        let span = encode_as(&frames, Encoding::Span).expect("span").len();
        prop_assert_eq!(auto, bitmap.min(span));
    }

    #[test]
    fn parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        if let Ok(img) = PawImage::parse(&bytes) {
            for i in 0..img.tile_count() {
                let _ = img.decode_frame(i);
            }
        }
    }
}
