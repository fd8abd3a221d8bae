//! Virtual file store.
//!
//! The device reads its art and save data from flash by name. Here the
//! flash is an in-memory map of immutable blobs the host streams in. Files
//! the firmware understands are validated when stored; sprite sheets keep a
//! per-frame decode cache filled on first draw.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use format_paw::{Frame, PawImage};
use tracing::{info, warn};

use crate::config::PawPetConfig;
use crate::error::PawPetError;
use crate::save::SaveData;

/// How the store treats a file, decided by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// A `.paw` sprite sheet.
    Sprite,
    /// The persisted save blob.
    Save,
    /// Anything else, stored untouched.
    Opaque,
}

/// A sprite sheet with lazily decoded frames.
#[derive(Debug)]
pub struct SpriteSheet {
    image: PawImage,
    frames: Vec<OnceCell<Result<Rc<Frame>, format_paw::PawError>>>,
}

impl SpriteSheet {
    #[must_use]
    pub fn new(image: PawImage) -> Self {
        let frames = (0..image.tile_count()).map(|_| OnceCell::new()).collect();
        Self { image, frames }
    }

    #[must_use]
    pub fn image(&self) -> &PawImage {
        &self.image
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.image.tile_count()
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.image.width()
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.image.height()
    }

    /// Decoded frame, decoding on first access.
    pub fn frame(&self, index: usize) -> Result<Rc<Frame>, format_paw::PawError> {
        let Some(cell) = self.frames.get(index) else {
            return Err(format_paw::PawError::FrameOutOfRange {
                frame: index,
                tile_count: self.frames.len(),
            });
        };
        cell.get_or_init(|| self.image.decode_frame(index).map(Rc::new))
            .clone()
    }

    /// Number of frames decoded so far.
    #[must_use]
    pub fn decoded(&self) -> usize {
        self.frames.iter().filter(|c| c.get().is_some()).count()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Rc<[u8]>,
    kind: AssetKind,
    revision: u64,
    sheet: Option<Rc<SpriteSheet>>,
}

/// Named-blob store backing the device's flash.
///
/// Names are unique; storing under an existing name replaces the blob and
/// bumps its revision so sprites holding the old sheet re-resolve.
#[derive(Debug, Clone)]
pub struct VirtualFileStore {
    entries: BTreeMap<String, Entry>,
    image_names: BTreeSet<String>,
    save_name: String,
    next_revision: u64,
}

impl VirtualFileStore {
    #[must_use]
    pub fn new(config: &PawPetConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            image_names: config.image_assets.iter().cloned().collect(),
            save_name: config.save_name.clone(),
            next_revision: 1,
        }
    }

    /// How a file with this name is validated.
    #[must_use]
    pub fn classify(&self, name: &str) -> AssetKind {
        if name == self.save_name {
            AssetKind::Save
        } else if name.ends_with(".paw") || self.image_names.contains(name) {
            AssetKind::Sprite
        } else {
            AssetKind::Opaque
        }
    }

    /// Store or replace a blob.
    pub fn put(&mut self, name: &str, bytes: &[u8]) -> Result<AssetKind, PawPetError> {
        let kind = self.classify(name);
        let sheet = match kind {
            AssetKind::Sprite => match PawImage::parse(bytes) {
                Ok(image) => Some(Rc::new(SpriteSheet::new(image))),
                Err(e) => {
                    warn!(name, error = %e, "rejected sprite sheet");
                    return Err(PawPetError::invalid(name, e));
                }
            },
            AssetKind::Save => {
                if let Err(e) = SaveData::from_bytes(bytes) {
                    warn!(name, error = %e, "rejected save data");
                    return Err(PawPetError::invalid(name, e));
                }
                None
            }
            AssetKind::Opaque => None,
        };

        let revision = self.next_revision;
        self.next_revision += 1;
        let replaced = self
            .entries
            .insert(
                name.to_string(),
                Entry {
                    bytes: Rc::from(bytes),
                    kind,
                    revision,
                    sheet,
                },
            )
            .is_some();
        info!(name, ?kind, len = bytes.len(), replaced, "stored file");
        Ok(kind)
    }

    /// Bytes of a stored file.
    pub fn get(&self, name: &str) -> Result<&[u8], PawPetError> {
        self.entries
            .get(name)
            .map(|e| &*e.bytes)
            .ok_or_else(|| PawPetError::NotFound(name.to_string()))
    }

    /// Parsed sprite sheet stored under `name`.
    pub fn sheet(&self, name: &str) -> Result<Rc<SpriteSheet>, PawPetError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| PawPetError::NotFound(name.to_string()))?;
        entry
            .sheet
            .clone()
            .ok_or_else(|| PawPetError::invalid(name, "not a sprite sheet"))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Revision of the blob under `name`; changes on every replacement.
    #[must_use]
    pub fn revision(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|e| e.revision)
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<AssetKind> {
        self.entries.get(name).map(|e| e.kind)
    }

    /// Stored names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every decoded frame. Blobs stay.
    pub fn clear_cache(&mut self) {
        for entry in self.entries.values_mut() {
            let fresh = entry
                .sheet
                .as_ref()
                .map(|sheet| Rc::new(SpriteSheet::new(sheet.image().clone())));
            if fresh.is_some() {
                entry.sheet = fresh;
                entry.revision = self.next_revision;
                self.next_revision += 1;
            }
        }
    }

    /// Erase everything.
    pub fn format(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format_paw::{Encoding, Texel};

    fn sheet_bytes(frames: usize) -> Vec<u8> {
        let frames: Vec<Frame> = (0..frames)
            .map(|i| {
                let t = if i % 2 == 0 { Texel::On } else { Texel::Off };
                Frame::new(8, 2, vec![t; 16])
            })
            .collect();
        format_paw::encode_as(&frames, Encoding::Bitmap).expect("encode")
    }

    fn store() -> VirtualFileStore {
        VirtualFileStore::new(&PawPetConfig::default())
    }

    #[test]
    fn get_returns_stored_bytes() {
        let mut s = store();
        s.put("notes.txt", b"hello").expect("opaque");
        assert_eq!(s.get("notes.txt").expect("present"), b"hello");
        assert_eq!(
            s.get("missing"),
            Err(PawPetError::NotFound("missing".into()))
        );
    }

    #[test]
    fn known_images_are_validated() {
        let mut s = store();
        let err = s.put("battery", &[1, 2, 3]).expect_err("too short");
        assert!(matches!(err, PawPetError::InvalidAsset { .. }));
        assert!(!s.contains("battery"));

        s.put("battery", &sheet_bytes(5)).expect("valid");
        assert_eq!(s.kind("battery"), Some(AssetKind::Sprite));
        assert_eq!(s.sheet("battery").expect("sheet").tile_count(), 5);
    }

    #[test]
    fn paw_extension_marks_a_sprite() {
        let s = store();
        assert_eq!(s.classify("extra.paw"), AssetKind::Sprite);
        assert_eq!(s.classify("save"), AssetKind::Save);
        assert_eq!(s.classify("readme"), AssetKind::Opaque);
    }

    #[test]
    fn replacing_bumps_revision_and_sheet() {
        let mut s = store();
        s.put("petsit", &sheet_bytes(1)).expect("valid");
        let first = s.revision("petsit");
        s.put("petsit", &sheet_bytes(5)).expect("valid");
        assert_ne!(s.revision("petsit"), first);
        assert_eq!(s.sheet("petsit").expect("sheet").tile_count(), 5);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn frames_decode_once_on_demand() {
        let mut s = store();
        s.put("icons", &sheet_bytes(3)).expect("valid");
        let sheet = s.sheet("icons").expect("sheet");
        assert_eq!(sheet.decoded(), 0);
        let a = sheet.frame(1).expect("frame");
        let b = sheet.frame(1).expect("frame");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(sheet.decoded(), 1);
        assert!(sheet.frame(3).is_err());
    }

    #[test]
    fn clear_cache_keeps_blobs() {
        let mut s = store();
        s.put("icons", &sheet_bytes(2)).expect("valid");
        let _ = s.sheet("icons").map(|sh| sh.frame(0));
        s.clear_cache();
        assert_eq!(s.sheet("icons").expect("sheet").decoded(), 0);
        assert!(s.contains("icons"));

        s.format();
        assert!(s.is_empty());
    }

    #[test]
    fn opaque_files_are_not_sheets() {
        let mut s = store();
        s.put("readme", b"x").expect("opaque");
        assert!(matches!(
            s.sheet("readme"),
            Err(PawPetError::InvalidAsset { .. })
        ));
    }
}
