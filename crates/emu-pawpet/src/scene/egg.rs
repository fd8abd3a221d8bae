//! The egg in its window. It wobbles until the hatch countdown runs out,
//! then the creature idles in its place.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};

use super::{Scene, SceneKind};
use crate::display::Screen;
use crate::error::PawPetError;
use crate::input::{ButtonState, PawButton};
use crate::save::SaveData;
use crate::sprite::{Animation, Sprite};
use crate::storage::VirtualFileStore;

const WINDOW_ORIGIN: Point = Point::new(2, 8);
const PET_ORIGIN: Point = Point::new(16, 28);
const GROUND_Y: i32 = 40;

#[derive(Debug, Clone)]
pub struct EggScene {
    egg: Animation,
    creature: Animation,
    window: Sprite,
    hatched: bool,
}

impl EggScene {
    #[must_use]
    pub fn new(save: &SaveData) -> Self {
        Self {
            egg: Animation::new("egg_wobble", (0, 4), 8),
            creature: Animation::new("pet1_idle", (0, 2), 8),
            window: Sprite::new("window"),
            hatched: save.hatch_remaining == 0,
        }
    }

    #[must_use]
    pub const fn hatched(&self) -> bool {
        self.hatched
    }
}

impl Scene for EggScene {
    fn tick(&mut self, buttons: &ButtonState, save: &mut SaveData) -> SceneKind {
        self.egg.tick();
        self.creature.tick();

        if buttons.is_pressed(PawButton::A) {
            return SceneKind::Menu;
        }
        save.hatch_remaining = save.hatch_remaining.saturating_sub(1);
        self.hatched = save.hatch_remaining == 0;
        SceneKind::Egg
    }

    fn draw(&self, screen: &mut Screen) -> Result<(), PawPetError> {
        let Ok(()) = screen.clear(BinaryColor::Off);
        self.window.draw(screen, WINDOW_ORIGIN)?;

        let Ok(()) = Line::new(Point::new(0, GROUND_Y), Point::new(64, GROUND_Y))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(screen);

        if self.hatched {
            self.creature.draw(screen, PET_ORIGIN)
        } else {
            self.egg.draw(screen, PET_ORIGIN)
        }
    }

    fn resolve(&mut self, store: &VirtualFileStore) {
        self.egg.resolve(store);
        self.creature.resolve(store);
        self.window.resolve(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_hatches_the_egg() {
        let mut save = SaveData::new(3);
        let mut scene = EggScene::new(&save);
        let buttons = ButtonState::new();
        assert!(!scene.hatched());

        for _ in 0..3 {
            assert_eq!(scene.tick(&buttons, &mut save), SceneKind::Egg);
        }
        assert_eq!(save.hatch_remaining, 0);
        assert!(scene.hatched());

        scene.tick(&buttons, &mut save);
        assert_eq!(save.hatch_remaining, 0);
    }

    #[test]
    fn a_returns_to_menu_without_counting() {
        let mut save = SaveData::new(3);
        let mut scene = EggScene::new(&save);
        let mut buttons = ButtonState::new();
        buttons.update(PawButton::A.mask());
        assert_eq!(scene.tick(&buttons, &mut save), SceneKind::Menu);
        assert_eq!(save.hatch_remaining, 3);
    }

    #[test]
    fn restored_save_starts_hatched() {
        let save = SaveData::new(0);
        assert!(EggScene::new(&save).hatched());
    }

    #[test]
    fn ground_line_is_drawn_without_art() {
        let scene = EggScene::new(&SaveData::new(5));
        let mut screen = Screen::new();
        scene.draw(&mut screen).expect("draw");
        assert_eq!(screen.lit(), 64);
        assert_eq!(screen.pixel(0, 40), Some(true));
    }
}
