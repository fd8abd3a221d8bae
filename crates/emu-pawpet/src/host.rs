//! Loading a directory of asset files into a device.

use std::fs;
use std::io;
use std::path::Path;

use crate::PawPet;

/// File in an asset directory that holds the save blob.
pub const SAVE_FILE: &str = "save.bin";

/// Load every `*.paw` sheet in `dir` under its file stem, plus `save.bin`
/// as the save blob. Other files are skipped. Returns the names loaded,
/// in load order.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a file is rejected.
pub fn load_asset_dir(pet: &mut PawPet, dir: &Path) -> io::Result<Vec<String>> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut loaded = Vec::new();
    for path in paths {
        let is_save = path.file_name().is_some_and(|n| n == SAVE_FILE);
        let is_sheet = path.extension().is_some_and(|ext| ext == "paw");
        let name = if is_save {
            pet.config().save_name.clone()
        } else if is_sheet {
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            }
        } else {
            continue;
        };

        let bytes = fs::read(&path)?;
        pet.load_file(&bytes, &name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        loaded.push(name);
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SaveData;
    use format_paw::{Frame, Texel};

    fn sheet() -> Vec<u8> {
        format_paw::encode(&[Frame::new(8, 8, vec![Texel::On; 64])]).expect("encode")
    }

    #[test]
    fn loads_sheets_by_stem_and_save_blob() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["battery", "petsit", "icons", "sleeptest"] {
            fs::write(dir.path().join(format!("{name}.paw")), sheet()).expect("write");
        }
        fs::write(dir.path().join(SAVE_FILE), SaveData::new(7).to_bytes()).expect("write");
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");

        let mut pet = PawPet::new();
        let loaded = load_asset_dir(&mut pet, dir.path()).expect("load");
        assert_eq!(loaded.len(), 5);
        assert!(loaded.contains(&"save".to_string()));
        assert!(pet.is_ready());
        assert!(!pet.store().contains("notes"));
    }

    #[test]
    fn rejected_sheet_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("battery.paw"), [0u8; 3]).expect("write");
        let mut pet = PawPet::new();
        let err = load_asset_dir(&mut pet, dir.path()).expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
