//! PawPet configuration.

/// Frame interval a scene runs at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framerate {
    /// 33 ms per frame.
    #[default]
    Fps30,
    /// 66 ms per frame.
    Fps15,
    /// 200 ms per frame.
    Fps5,
}

impl Framerate {
    /// Frame interval in milliseconds.
    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            Self::Fps30 => 33,
            Self::Fps15 => 66,
            Self::Fps5 => 200,
        }
    }
}

/// Names of the sprite sheets the stock firmware reads.
pub const STOCK_IMAGES: [&str; 7] = [
    "battery",
    "petsit",
    "icons",
    "sleeptest",
    "egg_wobble",
    "pet1_idle",
    "window",
];

/// Device configuration.
///
/// Defaults match the browser host: it boots once the first four sheets
/// arrive and streams the scene art afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "native", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "native", serde(default))]
pub struct PawPetConfig {
    /// Files that must be loaded before the device can run.
    pub required_assets: Vec<String>,
    /// Names validated as `.paw` sprite sheets on load, in addition to any
    /// name ending in `.paw`.
    pub image_assets: Vec<String>,
    /// Name of the persisted save blob.
    pub save_name: String,
    /// Battery level (0-100) before the host sets one.
    pub initial_battery: u8,
    /// Seconds without input before the device sleeps.
    pub inactivity_sleep_secs: u32,
    /// Frames an egg takes to hatch.
    pub hatch_frames: u16,
}

impl Default for PawPetConfig {
    fn default() -> Self {
        Self {
            required_assets: STOCK_IMAGES[..4].iter().map(|s| (*s).to_string()).collect(),
            image_assets: STOCK_IMAGES.iter().map(|s| (*s).to_string()).collect(),
            save_name: "save".to_string(),
            initial_battery: 100,
            inactivity_sleep_secs: 60,
            hatch_frames: 200,
        }
    }
}

impl PawPetConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    #[cfg(feature = "native")]
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_boot_set_is_first_four_stock_images() {
        let cfg = PawPetConfig::default();
        assert_eq!(
            cfg.required_assets,
            vec!["battery", "petsit", "icons", "sleeptest"]
        );
        assert_eq!(cfg.image_assets.len(), STOCK_IMAGES.len());
        assert_eq!(cfg.save_name, "save");
    }

    #[test]
    fn framerates_match_device_intervals() {
        assert_eq!(Framerate::Fps30.millis(), 33);
        assert_eq!(Framerate::Fps15.millis(), 66);
        assert_eq!(Framerate::Fps5.millis(), 200);
    }

    #[cfg(feature = "native")]
    #[test]
    fn json_overrides_only_named_fields() {
        let cfg = PawPetConfig::from_json(r#"{"required_assets": ["battery"], "hatch_frames": 5}"#)
            .expect("valid json");
        assert_eq!(cfg.required_assets, vec!["battery"]);
        assert_eq!(cfg.hatch_frames, 5);
        assert_eq!(cfg.initial_battery, 100);
    }
}
