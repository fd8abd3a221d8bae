//! Sprites and animations drawn from sheets in the file store.
//!
//! A sprite names its sheet rather than owning it. Each frame it
//! re-resolves against the store, so art that arrives late, or is replaced,
//! shows up without reloading the scene. Until the sheet exists the sprite
//! draws nothing.

use std::rc::Rc;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, Point};
use format_paw::Texel;

use crate::display::Screen;
use crate::error::PawPetError;
use crate::storage::{SpriteSheet, VirtualFileStore};

#[derive(Debug, Clone)]
pub struct Sprite {
    name: &'static str,
    sheet: Option<(u64, Rc<SpriteSheet>)>,
    frame: usize,
    on_color: BinaryColor,
    off_color: BinaryColor,
    alpha_color: Option<BinaryColor>,
}

impl Sprite {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            sheet: None,
            frame: 0,
            on_color: BinaryColor::On,
            off_color: BinaryColor::Off,
            alpha_color: None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Pick up the current sheet for this sprite's name.
    pub fn resolve(&mut self, store: &VirtualFileStore) {
        let revision = store.revision(self.name);
        let held = self.sheet.as_ref().map(|(rev, _)| *rev);
        if revision == held {
            return;
        }
        self.sheet = match (revision, store.sheet(self.name)) {
            (Some(rev), Ok(sheet)) => Some((rev, sheet)),
            _ => None,
        };
    }

    /// Frames in the resolved sheet.
    #[must_use]
    pub fn tile_count(&self) -> Option<usize> {
        self.sheet.as_ref().map(|(_, s)| s.tile_count())
    }

    /// `(width, height)` of the resolved sheet.
    #[must_use]
    pub fn size(&self) -> Option<(u16, u16)> {
        self.sheet.as_ref().map(|(_, s)| (s.width(), s.height()))
    }

    #[must_use]
    pub const fn frame(&self) -> usize {
        self.frame
    }

    pub fn set_frame(&mut self, frame: usize) {
        self.frame = frame;
    }

    #[cfg(test)]
    pub fn set_colors(
        &mut self,
        on_color: BinaryColor,
        off_color: BinaryColor,
        alpha_color: Option<BinaryColor>,
    ) {
        self.on_color = on_color;
        self.off_color = off_color;
        self.alpha_color = alpha_color;
    }

    /// Draw the current frame with its top-left corner at `origin`.
    ///
    /// A missing sheet draws nothing. A sheet that cannot produce the
    /// frame is corrupt. Clear texels take the alpha colour only in packed
    /// sheets.
    pub fn draw(&self, screen: &mut Screen, origin: Point) -> Result<(), PawPetError> {
        let Some((_, sheet)) = &self.sheet else {
            return Ok(());
        };
        let frame = sheet
            .frame(self.frame)
            .map_err(|e| PawPetError::corrupt(self.name, e))?;
        let alpha_color = if sheet.image().encoding().is_span() {
            None
        } else {
            self.alpha_color
        };

        let pixels = frame.pixels().filter_map(|(x, y, texel)| {
            let color = match texel {
                Texel::On => self.on_color,
                Texel::Off => self.off_color,
                Texel::Clear => alpha_color?,
                Texel::Skip => return None,
            };
            Some(Pixel(origin + Point::new(i32::from(x), i32::from(y)), color))
        });
        let Ok(()) = screen.draw_iter(pixels);
        Ok(())
    }
}

/// A sprite stepping through a frame range.
#[derive(Debug, Clone)]
pub struct Animation {
    sprite: Sprite,
    bounds: (usize, usize),
    ticks_per_frame: u16,
    tick: u16,
}

impl Animation {
    /// Loop over frames `bounds.0..bounds.1`, holding each for
    /// `ticks_per_frame + 1` ticks.
    #[must_use]
    pub fn new(name: &'static str, bounds: (usize, usize), ticks_per_frame: u16) -> Self {
        let mut sprite = Sprite::new(name);
        sprite.frame = bounds.0;
        Self {
            sprite,
            bounds,
            ticks_per_frame,
            tick: 0,
        }
    }

    pub fn tick(&mut self) {
        self.tick += 1;
        if self.tick > self.ticks_per_frame {
            self.tick = 0;
            let next = self.sprite.frame + 1;
            self.sprite.frame = if next >= self.bounds.1 {
                self.bounds.0
            } else {
                next
            };
        }
    }

    pub fn resolve(&mut self, store: &VirtualFileStore) {
        self.sprite.resolve(store);
    }

    #[must_use]
    pub const fn frame(&self) -> usize {
        self.sprite.frame
    }

    pub fn draw(&self, screen: &mut Screen, origin: Point) -> Result<(), PawPetError> {
        self.sprite.draw(screen, origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PawPetConfig;
    use format_paw::{Encoding, Frame};

    fn store_with(name: &str, frames: &[Vec<Texel>], w: u16, h: u16) -> VirtualFileStore {
        let frames: Vec<Frame> = frames
            .iter()
            .map(|t| Frame::new(w, h, t.clone()))
            .collect();
        let mut store = VirtualFileStore::new(&PawPetConfig::default());
        let bytes = format_paw::encode_as(&frames, Encoding::BitmapAlpha).expect("encode");
        store.put(name, &bytes).expect("valid sheet");
        store
    }

    #[test]
    fn missing_sheet_draws_nothing() {
        let store = VirtualFileStore::new(&PawPetConfig::default());
        let mut sprite = Sprite::new("window");
        sprite.resolve(&store);
        let mut screen = Screen::new();
        sprite.draw(&mut screen, Point::zero()).expect("no-op");
        assert_eq!(screen.lit(), 0);
    }

    #[test]
    fn texels_map_to_colors() {
        let store = store_with(
            "window",
            &[vec![Texel::On, Texel::Off, Texel::Clear, Texel::Skip]],
            4,
            1,
        );
        let mut screen = Screen::new();
        screen.set_pixel(11, 5, true);
        screen.set_pixel(12, 5, true);
        screen.set_pixel(13, 5, true);

        let mut sprite = Sprite::new("window");
        sprite.resolve(&store);
        sprite.draw(&mut screen, Point::new(10, 5)).expect("draw");

        assert_eq!(screen.pixel(10, 5), Some(true));
        assert_eq!(screen.pixel(11, 5), Some(false));
        // no alpha color: clear and skip both leave the background
        assert_eq!(screen.pixel(12, 5), Some(true));
        assert_eq!(screen.pixel(13, 5), Some(true));

        sprite.set_colors(BinaryColor::On, BinaryColor::Off, Some(BinaryColor::Off));
        sprite.draw(&mut screen, Point::new(10, 5)).expect("draw");
        assert_eq!(screen.pixel(12, 5), Some(false));
        assert_eq!(screen.pixel(13, 5), Some(true));
    }

    #[test]
    fn span_sheets_never_draw_clear_texels() {
        let mut store = VirtualFileStore::new(&PawPetConfig::default());
        let frame = Frame::new(3, 1, vec![Texel::On, Texel::Clear, Texel::Off]);
        let bytes = format_paw::encode_as(&[frame], Encoding::SpanAlpha).expect("encode");
        store.put("window", &bytes).expect("valid sheet");

        let mut screen = Screen::new();
        screen.set_pixel(1, 0, true);
        let mut sprite = Sprite::new("window");
        sprite.resolve(&store);
        sprite.set_colors(BinaryColor::On, BinaryColor::Off, Some(BinaryColor::Off));
        sprite.draw(&mut screen, Point::zero()).expect("draw");

        assert_eq!(screen.pixel(0, 0), Some(true));
        assert_eq!(screen.pixel(1, 0), Some(true));
        assert_eq!(screen.pixel(2, 0), Some(false));
    }

    #[test]
    fn missing_frame_is_corrupt() {
        let store = store_with("egg_wobble", &[vec![Texel::On; 4]], 2, 2);
        let mut sprite = Sprite::new("egg_wobble");
        sprite.resolve(&store);
        sprite.set_frame(3);
        let err = sprite
            .draw(&mut Screen::new(), Point::zero())
            .expect_err("frame 3 missing");
        assert!(matches!(err, PawPetError::CorruptAsset { ref name, .. } if name == "egg_wobble"));
    }

    #[test]
    fn animation_holds_then_wraps() {
        let mut anim = Animation::new("egg_wobble", (0, 4), 8);
        let mut seen = Vec::new();
        for _ in 0..40 {
            anim.tick();
            seen.push(anim.frame());
        }
        // nine ticks per frame
        assert_eq!(seen[7], 0);
        assert_eq!(seen[8], 1);
        assert_eq!(seen[17], 2);
        assert_eq!(seen[35], 0);
    }

    #[test]
    fn replaced_sheet_is_picked_up() {
        let mut store = store_with("petsit", &[vec![Texel::On; 4]], 2, 2);
        let mut sprite = Sprite::new("petsit");
        sprite.resolve(&store);
        assert_eq!(sprite.tile_count(), Some(1));

        let frames = vec![Frame::new(2, 2, vec![Texel::Off; 4]); 5];
        let bytes = format_paw::encode(&frames).expect("encode");
        store.put("petsit", &bytes).expect("valid");
        sprite.resolve(&store);
        assert_eq!(sprite.tile_count(), Some(5));
    }
}
