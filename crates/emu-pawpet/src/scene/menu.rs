//! Main menu: a list of entries, the selected item's icon and the pet
//! sitting in the corner looking where the d-pad points.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use super::{Scene, SceneKind};
use crate::display::Screen;
use crate::error::PawPetError;
use crate::input::{ButtonState, PawButton};
use crate::save::SaveData;
use crate::sprite::Sprite;
use crate::storage::VirtualFileStore;

const ITEMS: [&str; 5] = ["Egg", "Empty", "Item 3", "Item 4", "Item 5"];

const PET_ORIGIN: Point = Point::new(44, 44);

/// Direction the pet faces. Sheet frames 1..=4 hold the four facings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facing {
    Front,
    Up,
    Right,
    Down,
    Left,
}

impl Facing {
    fn from_mask(mask: u8) -> Self {
        [
            (PawButton::Up, Self::Up),
            (PawButton::Right, Self::Right),
            (PawButton::Down, Self::Down),
            (PawButton::Left, Self::Left),
        ]
        .into_iter()
        .find(|(b, _)| mask & b.mask() != 0)
        .map_or(Self::Front, |(_, facing)| facing)
    }

    const fn frame(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Up => 1,
            Self::Right => 2,
            Self::Down => 3,
            Self::Left => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuScene {
    selection: usize,
    facing: Facing,
    pet: Sprite,
    icons: Sprite,
}

impl MenuScene {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selection: 0,
            facing: Facing::Front,
            pet: Sprite::new("petsit"),
            icons: Sprite::new("icons"),
        }
    }

    #[must_use]
    pub const fn selection(&self) -> usize {
        self.selection
    }

    fn sync_frames(&mut self) {
        let wanted = self.facing.frame();
        let frame = match self.pet.tile_count() {
            Some(n) if wanted < n => wanted,
            _ => 0,
        };
        self.pet.set_frame(frame);
        self.icons.set_frame(self.selection);
    }
}

impl Default for MenuScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for MenuScene {
    fn tick(&mut self, buttons: &ButtonState, _save: &mut SaveData) -> SceneKind {
        self.facing = Facing::from_mask(buttons.state());

        let mut next = SceneKind::Menu;
        if buttons.is_pressed(PawButton::Up) {
            self.selection = self.selection.saturating_sub(1);
        } else if buttons.is_pressed(PawButton::Down) {
            self.selection = (self.selection + 1).min(ITEMS.len() - 1);
        } else if buttons.is_pressed(PawButton::P) {
            next = match self.selection {
                0 => SceneKind::Egg,
                1 => SceneKind::Empty,
                _ => SceneKind::Menu,
            };
        }
        self.sync_frames();
        next
    }

    fn draw(&self, screen: &mut Screen) -> Result<(), PawPetError> {
        let Ok(()) = screen.clear(BinaryColor::Off);

        let normal = MonoTextStyleBuilder::new()
            .font(&FONT_6X10)
            .text_color(BinaryColor::On)
            .background_color(BinaryColor::Off)
            .build();
        let selected = MonoTextStyleBuilder::new()
            .font(&FONT_6X10)
            .text_color(BinaryColor::Off)
            .background_color(BinaryColor::On)
            .build();

        for (i, item) in ITEMS.iter().enumerate() {
            let style = if i == self.selection { selected } else { normal };
            let y = 10 * i as i32 + 15;
            let Ok(_) = Text::new(item, Point::new(0, y), style).draw(screen);
        }

        if self.icons.tile_count().is_some_and(|n| self.selection < n) {
            let y = 10 * self.selection as i32 + 8;
            self.icons.draw(screen, Point::new(56, y))?;
        }
        self.pet.draw(screen, PET_ORIGIN)
    }

    fn resolve(&mut self, store: &VirtualFileStore) {
        self.pet.resolve(store);
        self.icons.resolve(store);
        self.sync_frames();
    }
}
