use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

const CONFIG_FILE: &str = "cosmetics.toml";

/// User-facing cosmetic behavior plus the persisted texture choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticSettings {
    /// Spin the costume roulette when the local avatar spawns with no saved
    /// texture.
    pub random_texture_on_spawn: bool,
    /// Remember the chosen texture across sessions.
    pub save_texture_setting: bool,
    /// Catalogue index of the remembered texture, if any.
    pub saved_texture_index: Option<usize>,
}

impl Default for CosmeticSettings {
    fn default() -> Self {
        Self {
            random_texture_on_spawn: true,
            save_texture_setting: false,
            saved_texture_index: None,
        }
    }
}

impl CosmeticSettings {
    /// Texture index a freshly spawned local avatar should wear, given a
    /// catalogue of `len` entries: the remembered one when enabled and still
    /// in bounds, otherwise a random one when roulette is on, otherwise
    /// nothing.
    pub fn initial_texture_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if self.save_texture_setting {
            if let Some(saved) = self.saved_texture_index {
                if saved < len {
                    return Some(saved);
                }
                warn!(saved, len, "saved texture index out of range, ignoring");
            }
        }
        if self.random_texture_on_spawn {
            return Some(rand::rng().random_range(0..len));
        }
        None
    }

    /// Record a texture choice for the next session. No-op unless saving is
    /// enabled.
    pub fn remember_texture(&mut self, index: usize) {
        if self.save_texture_setting {
            self.saved_texture_index = Some(index);
        }
    }

    pub fn clear_saved_texture(&mut self) {
        self.saved_texture_index = None;
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "roomprops", "roomprops")
        .map(|proj| proj.config_dir().join(CONFIG_FILE))
}

pub fn save_settings(settings: &CosmeticSettings) -> std::io::Result<()> {
    if let Some(path) = config_path() {
        save_settings_to(settings, &path)?;
    }
    Ok(())
}

pub fn load_settings() -> Option<CosmeticSettings> {
    config_path().and_then(|path| load_settings_from(&path))
}

pub fn save_settings_to(settings: &CosmeticSettings, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml = toml::to_string_pretty(settings)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, toml)
}

pub fn load_settings_from(path: &Path) -> Option<CosmeticSettings> {
    let data = fs::read_to_string(path).ok()?;
    match toml::from_str::<CosmeticSettings>(&data) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable cosmetics config, using defaults");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_toml_roundtrip() {
        let settings = CosmeticSettings {
            random_texture_on_spawn: false,
            save_texture_setting: true,
            saved_texture_index: Some(4),
        };
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: CosmeticSettings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_save_and_load_from_explicit_path() {
        let dir = std::env::temp_dir().join(format!("roomprops-test-{}", std::process::id()));
        let path = dir.join("cosmetics.toml");

        let mut settings = CosmeticSettings {
            save_texture_setting: true,
            ..CosmeticSettings::default()
        };
        settings.remember_texture(2);

        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded, settings);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_saved_texture_wins_over_roulette() {
        let settings = CosmeticSettings {
            random_texture_on_spawn: true,
            save_texture_setting: true,
            saved_texture_index: Some(1),
        };
        assert_eq!(settings.initial_texture_index(5), Some(1));
    }

    #[test]
    fn test_out_of_range_saved_texture_falls_back() {
        let settings = CosmeticSettings {
            random_texture_on_spawn: false,
            save_texture_setting: true,
            saved_texture_index: Some(9),
        };
        assert_eq!(settings.initial_texture_index(3), None);
    }

    #[test]
    fn test_remember_texture_requires_opt_in() {
        let mut settings = CosmeticSettings::default();
        settings.remember_texture(3);
        assert_eq!(settings.saved_texture_index, None);

        settings.save_texture_setting = true;
        settings.remember_texture(3);
        assert_eq!(settings.saved_texture_index, Some(3));

        settings.clear_saved_texture();
        assert_eq!(settings.saved_texture_index, None);
    }

    #[test]
    fn test_roulette_stays_in_bounds() {
        let settings = CosmeticSettings::default();
        for _ in 0..20 {
            let index = settings.initial_texture_index(4).unwrap();
            assert!(index < 4);
        }
        assert_eq!(settings.initial_texture_index(0), None);
    }
}
