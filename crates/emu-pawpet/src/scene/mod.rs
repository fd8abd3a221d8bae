//! Firmware scenes.
//!
//! Exactly one scene is active. Each frame it sees the button edges,
//! returns the scene to run next and draws itself. A change of scene
//! builds the new one fresh, as the device does.

mod egg;
mod empty;
mod menu;

use crate::config::Framerate;
use crate::display::Screen;
use crate::error::PawPetError;
use crate::input::ButtonState;
use crate::save::SaveData;
use crate::storage::VirtualFileStore;

pub use egg::EggScene;
pub use empty::EmptyScene;
pub use menu::MenuScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Menu,
    Egg,
    Empty,
}

impl SceneKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Egg => "egg",
            Self::Empty => "empty",
        }
    }
}

pub trait Scene {
    /// Advance one frame and pick the next scene.
    fn tick(&mut self, buttons: &ButtonState, save: &mut SaveData) -> SceneKind;

    /// Draw the current frame.
    fn draw(&self, screen: &mut Screen) -> Result<(), PawPetError>;

    /// Re-resolve sprites against the store.
    fn resolve(&mut self, _store: &VirtualFileStore) {}

    fn framerate(&self) -> Framerate {
        Framerate::Fps30
    }
}

#[derive(Debug, Clone)]
pub enum ActiveScene {
    Menu(MenuScene),
    Egg(EggScene),
    Empty(EmptyScene),
}

impl ActiveScene {
    /// Build a scene and bind its art.
    #[must_use]
    pub fn enter(kind: SceneKind, store: &VirtualFileStore, save: &SaveData) -> Self {
        let mut scene = match kind {
            SceneKind::Menu => Self::Menu(MenuScene::new()),
            SceneKind::Egg => Self::Egg(EggScene::new(save)),
            SceneKind::Empty => Self::Empty(EmptyScene),
        };
        scene.resolve(store);
        scene
    }

    #[must_use]
    pub const fn kind(&self) -> SceneKind {
        match self {
            Self::Menu(_) => SceneKind::Menu,
            Self::Egg(_) => SceneKind::Egg,
            Self::Empty(_) => SceneKind::Empty,
        }
    }

    /// Highlighted menu row, when the menu is up.
    #[must_use]
    pub const fn menu_selection(&self) -> Option<usize> {
        match self {
            Self::Menu(menu) => Some(menu.selection()),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Scene {
        match self {
            Self::Menu(s) => s,
            Self::Egg(s) => s,
            Self::Empty(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Scene {
        match self {
            Self::Menu(s) => s,
            Self::Egg(s) => s,
            Self::Empty(s) => s,
        }
    }
}

impl Scene for ActiveScene {
    fn tick(&mut self, buttons: &ButtonState, save: &mut SaveData) -> SceneKind {
        self.inner_mut().tick(buttons, save)
    }

    fn draw(&self, screen: &mut Screen) -> Result<(), PawPetError> {
        self.inner().draw(screen)
    }

    fn resolve(&mut self, store: &VirtualFileStore) {
        self.inner_mut().resolve(store);
    }

    fn framerate(&self) -> Framerate {
        self.inner().framerate()
    }
}
