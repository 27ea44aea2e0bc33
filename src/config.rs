use crate::settings::{Keymaps, ScrollTunables, Settings};
use eyre::Result;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub keymaps: Keymaps,
    filepath: PathBuf,
}

impl Config {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        Self::load_from(prefix.join("configuration.json"))
    }

    /// Load configuration from a specific path. Missing files and malformed
    /// JSON fall back to defaults field by field; a valid fragment of the
    /// configuration is honored even when the rest is broken.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();
        let mut keymaps = Keymaps::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            if let Ok(user_config) = serde_json::from_str::<serde_json::Value>(&config_str) {
                if let Some(value) = user_config.get("Setting") {
                    apply_settings(&mut settings, value);
                }
                if let Some(value) = user_config.get("Keymap")
                    && let Ok(user_keymaps) = serde_json::from_value::<Keymaps>(value.clone())
                {
                    keymaps = user_keymaps;
                }
            }
        }

        Ok(Self {
            settings,
            keymaps,
            filepath,
        })
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({
            "Setting": self.settings,
            "Keymap": self.keymaps,
        });

        let config_str = serde_json::to_string_pretty(&config_json)?;

        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.filepath, config_str)?;
        Ok(())
    }
}

fn apply_settings(settings: &mut Settings, value: &serde_json::Value) {
    let Some(map) = value.as_object() else {
        return;
    };
    if let Some(font) = map.get("font")
        && let Ok(font) = serde_json::from_value(font.clone())
    {
        settings.font = font;
    }
    if let Some(theme) = map.get("theme")
        && let Ok(theme) = serde_json::from_value(theme.clone())
    {
        settings.theme = theme;
    }
    if let Some(val) = map.get("text_width").and_then(|v| v.as_u64()) {
        settings.text_width = Some(val as usize);
    }
    if let Some(val) = map.get("mouse_support").and_then(|v| v.as_bool()) {
        settings.mouse_support = val;
    }
    if let Some(val) = map.get("show_top_bar").and_then(|v| v.as_bool()) {
        settings.show_top_bar = val;
    }
    if let Some(scroll) = map.get("scroll") {
        apply_scroll_tunables(&mut settings.scroll, scroll);
    }
}

fn apply_scroll_tunables(scroll: &mut ScrollTunables, value: &serde_json::Value) {
    let Some(map) = value.as_object() else {
        return;
    };
    if let Some(val) = map.get("low_watermark").and_then(|v| v.as_f64()) {
        scroll.low_watermark = val;
    }
    if let Some(val) = map.get("high_watermark").and_then(|v| v.as_f64()) {
        scroll.high_watermark = val;
    }
    if let Some(val) = map.get("scroll_preload").and_then(|v| v.as_u64()) {
        scroll.scroll_preload = val as usize;
    }
    if let Some(val) = map.get("jump_preload_before").and_then(|v| v.as_u64()) {
        scroll.jump_preload_before = val as usize;
    }
    if let Some(val) = map.get("jump_preload_after").and_then(|v| v.as_u64()) {
        scroll.jump_preload_after = val as usize;
    }
    if let Some(val) = map.get("keep_threshold").and_then(|v| v.as_u64()) {
        scroll.keep_threshold = val as usize;
    }
    if let Some(val) = map.get("max_remove_per_pass").and_then(|v| v.as_u64()) {
        scroll.max_remove_per_pass = val as usize;
    }
    if let Some(val) = map.get("removal_viewports").and_then(|v| v.as_u64()) {
        scroll.removal_viewports = val as usize;
    }
    if let Some(val) = map.get("persist_debounce_ms").and_then(|v| v.as_u64()) {
        scroll.persist_debounce_ms = val;
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(config_home).join("litebible");
        return Ok(path);
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join("litebible");
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(".litebible"));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".litebible"));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Font, Theme};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(dir.path().join("configuration.json")).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.keymaps, Keymaps::default());
    }

    #[test]
    fn test_partial_settings_are_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configuration.json");
        fs::write(
            &path,
            r#"{"Setting": {"theme": "dark", "scroll": {"keep_threshold": 9}}}"#,
        )
        .unwrap();

        let config = Config::load_from(path).unwrap();
        assert_eq!(config.settings.theme, Theme::Dark);
        assert_eq!(config.settings.font, Font::SystemSerif);
        assert_eq!(config.settings.scroll.keep_threshold, 9);
        assert_eq!(
            config.settings.scroll.max_remove_per_pass,
            ScrollTunables::default().max_remove_per_pass
        );
    }

    #[test]
    fn test_malformed_json_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configuration.json");
        fs::write(&path, "{not json").unwrap();

        let config = Config::load_from(path).unwrap();
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configuration.json");

        let mut config = Config::load_from(path.clone()).unwrap();
        config.settings.theme = Theme::Light;
        config.settings.text_width = Some(66);
        config.settings.scroll.persist_debounce_ms = 500;
        config.save().unwrap();

        let reloaded = Config::load_from(path).unwrap();
        assert_eq!(reloaded.settings.theme, Theme::Light);
        assert_eq!(reloaded.settings.text_width, Some(66));
        assert_eq!(reloaded.settings.scroll.persist_debounce_ms, 500);
    }
}
