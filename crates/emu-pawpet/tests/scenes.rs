//! Scene behaviour as seen on the frame buffer.

mod common;

use emu_core::{Observable, Value};
use emu_pawpet::{PawButton, PawPetError, SceneKind};

use common::{booted, marker_sheet, solid_sheet, tick_n};

const PET_X: u32 = 44;
const PET_Y: u32 = 44;

fn pet_frame_shown(pet: &emu_pawpet::PawPet) -> Option<u32> {
    (0..5).find(|&i| pet.screen().pixel(PET_X + i, PET_Y) == Some(true))
}

#[test]
fn pet_faces_the_held_direction() {
    let mut pet = booted();
    pet.tick().expect("tick");
    assert_eq!(pet_frame_shown(&pet), Some(0));

    pet.set_buttons(PawButton::Up.mask());
    pet.tick().expect("tick");
    assert_eq!(pet_frame_shown(&pet), Some(1));

    pet.set_buttons(0);
    pet.tick().expect("tick");
    assert_eq!(pet_frame_shown(&pet), Some(0));

    for (button, frame) in [
        (PawButton::Right, 2),
        (PawButton::Down, 3),
        (PawButton::Left, 4),
    ] {
        pet.set_buttons(button.mask());
        pet.tick().expect("tick");
        assert_eq!(pet_frame_shown(&pet), Some(frame), "{button:?}");
    }
}

#[test]
fn single_frame_pet_never_turns() {
    let mut pet = booted();
    pet.load_file(&marker_sheet(1), "petsit").expect("petsit");
    pet.set_buttons(PawButton::Up.mask());
    pet.tick().expect("tick");
    assert_eq!(pet_frame_shown(&pet), Some(0));
}

#[test]
fn menu_walks_into_egg_and_back() {
    let mut pet = booted();
    pet.tick().expect("tick");
    assert_eq!(pet.scene(), SceneKind::Menu);

    pet.set_buttons(PawButton::P.mask());
    pet.tick().expect("tick");
    assert_eq!(pet.scene(), SceneKind::Egg);

    pet.set_buttons(0);
    tick_n(&mut pet, 2);
    // ground line
    assert_eq!(pet.screen().pixel(40, 40), Some(true));

    pet.set_buttons(PawButton::A.mask());
    pet.tick().expect("tick");
    assert_eq!(pet.scene(), SceneKind::Menu);
    assert_eq!(pet.query("menu.selection"), Some(Value::U64(0)));
}

#[test]
fn empty_scene_is_blank_apart_from_overlay() {
    let mut pet = booted();
    pet.set_buttons(PawButton::Down.mask());
    pet.tick().expect("tick");
    pet.set_buttons(PawButton::P.mask());
    pet.tick().expect("tick");
    assert_eq!(pet.scene(), SceneKind::Empty);

    pet.set_buttons(0);
    pet.tick().expect("tick");
    for y in 20..64 {
        for x in 0..64 {
            assert_eq!(pet.screen().pixel(x, y), Some(false), "({x}, {y})");
        }
    }
}

#[test]
fn egg_hatches_after_countdown() {
    let mut pet = booted();
    pet.load_file(&solid_sheet(4, 16, 12), "egg_wobble")
        .expect("egg");
    pet.load_file(&marker_sheet(2), "pet1_idle").expect("creature");

    pet.set_buttons(PawButton::P.mask());
    pet.tick().expect("tick");
    pet.set_buttons(0);
    tick_n(&mut pet, 199);
    assert_eq!(pet.query("egg.hatch_remaining"), Some(Value::U16(1)));
    // egg drawn solid at (16, 28)
    assert_eq!(pet.screen().pixel(20, 35), Some(true));

    pet.tick().expect("tick");
    assert_eq!(pet.query("egg.hatch_remaining"), Some(Value::U16(0)));
    // creature frames only set their top-left marker
    assert_eq!(pet.screen().pixel(20, 35), Some(false));
}

#[test]
fn corrupt_sheet_keeps_last_good_frame() {
    let mut pet = booted();
    // the wobble asks for four frames; this sheet only has one
    pet.load_file(&solid_sheet(1, 16, 12), "egg_wobble")
        .expect("egg");

    pet.set_buttons(PawButton::P.mask());
    pet.tick().expect("enter egg");
    pet.set_buttons(0);
    tick_n(&mut pet, 8);

    let frame = pet.framebuffer().to_vec();
    let count = pet.frame_count();
    let ticks = pet.master_ticks();
    let save = pet.save_data().map(<[u8]>::to_vec);

    let err = pet.tick().expect_err("frame 1 missing");
    assert!(matches!(err, PawPetError::CorruptAsset { ref name, .. } if name == "egg_wobble"));
    assert_eq!(pet.framebuffer(), frame.as_slice());
    assert_eq!(pet.frame_count(), count);
    assert_eq!(pet.master_ticks(), ticks);
    assert_eq!(pet.save_data().map(<[u8]>::to_vec), save);

    // the A press that would leave the egg is lost with the frame
    pet.set_buttons(PawButton::A.mask());
    assert!(pet.tick().is_err());
    assert_eq!(pet.scene(), SceneKind::Egg);
    pet.set_buttons(0);

    pet.load_file(&solid_sheet(4, 16, 12), "egg_wobble")
        .expect("fixed egg");
    pet.tick().expect("recovered");
    assert_eq!(pet.frame_count(), count + 1);
}

#[test]
fn debug_overlay_toggles_with_p_and_left() {
    let mut pet = booted();
    pet.tick().expect("tick");
    let lit_plain = pet.screen().lit();

    // the P press also opens the egg
    pet.set_buttons(PawButton::P.mask() | PawButton::Left.mask());
    tick_n(&mut pet, 2);
    assert_eq!(pet.query("debug"), Some(Value::Bool(true)));
    assert_eq!(pet.scene(), SceneKind::Egg);

    pet.set_buttons(PawButton::A.mask());
    pet.tick().expect("tick");
    pet.set_buttons(0);
    pet.tick().expect("tick");
    assert_eq!(pet.scene(), SceneKind::Menu);
    assert!(pet.screen().lit() > lit_plain);

    pet.set_buttons(PawButton::P.mask() | PawButton::Right.mask());
    tick_n(&mut pet, 2);
    assert_eq!(pet.query("debug"), Some(Value::Bool(false)));
}
