//! Shared fixtures for the PawPet integration tests.

#![allow(dead_code)]

use emu_pawpet::{PawPet, PawPetConfig};
use format_paw::{Frame, Texel};

/// Sheet of `count` frames, all set.
pub fn solid_sheet(count: usize, width: u16, height: u16) -> Vec<u8> {
    let texels = vec![Texel::On; usize::from(width) * usize::from(height)];
    let frames = vec![Frame::new(width, height, texels); count];
    format_paw::encode(&frames).expect("encode")
}

/// 8x8 sheet of `count` frames where frame `i` sets only pixel `(i, 0)`.
pub fn marker_sheet(count: usize) -> Vec<u8> {
    let frames: Vec<Frame> = (0..count)
        .map(|i| {
            let mut texels = vec![Texel::Off; 64];
            texels[i] = Texel::On;
            Frame::new(8, 8, texels)
        })
        .collect();
    format_paw::encode(&frames).expect("encode")
}

/// Load the four boot sheets.
pub fn load_boot_set(pet: &mut PawPet) {
    pet.load_file(&solid_sheet(5, 16, 8), "battery")
        .expect("battery");
    pet.load_file(&marker_sheet(5), "petsit").expect("petsit");
    pet.load_file(&solid_sheet(5, 8, 8), "icons").expect("icons");
    pet.load_file(&solid_sheet(1, 32, 16), "sleeptest")
        .expect("sleeptest");
}

pub fn booted() -> PawPet {
    booted_with(PawPetConfig::default())
}

pub fn booted_with(config: PawPetConfig) -> PawPet {
    let mut pet = PawPet::with_config(config);
    load_boot_set(&mut pet);
    pet
}

pub fn tick_n(pet: &mut PawPet, n: usize) {
    for _ in 0..n {
        pet.tick().expect("tick");
    }
}
