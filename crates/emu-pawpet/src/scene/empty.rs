//! Blank placeholder scene.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::DrawTarget;

use super::{Scene, SceneKind};
use crate::display::Screen;
use crate::error::PawPetError;
use crate::input::{ButtonState, PawButton};
use crate::save::SaveData;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScene;

impl Scene for EmptyScene {
    fn tick(&mut self, buttons: &ButtonState, _save: &mut SaveData) -> SceneKind {
        if buttons.is_pressed(PawButton::A) {
            SceneKind::Menu
        } else {
            SceneKind::Empty
        }
    }

    fn draw(&self, screen: &mut Screen) -> Result<(), PawPetError> {
        let Ok(()) = screen.clear(BinaryColor::Off);
        Ok(())
    }
}
