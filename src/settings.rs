use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Font {
    #[default]
    SystemSerif,
    SystemSans,
    Serif,
    Sans,
    Slab,
}

impl Font {
    pub fn all() -> &'static [Font] {
        &[
            Font::SystemSerif,
            Font::SystemSans,
            Font::Serif,
            Font::Sans,
            Font::Slab,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Font::SystemSerif => "System serif",
            Font::SystemSans => "System sans",
            Font::Serif => "Crimson Text",
            Font::Sans => "Source Sans",
            Font::Slab => "Zilla Slab",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    pub fn all() -> &'static [Theme] {
        &[Theme::Light, Theme::Dark, Theme::Auto]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Auto => "Auto",
        }
    }
}

/// Scroll-loading policy. The original app shipped several inconsistent
/// variants of these numbers; this is the one policy used everywhere, and
/// every value can be overridden from configuration.json.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollTunables {
    /// Scroll fraction below which chapters load toward the start.
    pub low_watermark: f64,
    /// Scroll fraction above which chapters load toward the end.
    pub high_watermark: f64,
    /// Chapters loaded per direction on a watermark hit.
    pub scroll_preload: usize,
    /// Chapters loaded before/after the target on an explicit jump.
    pub jump_preload_before: usize,
    pub jump_preload_after: usize,
    /// Loaded-chapter count above which eviction starts.
    pub keep_threshold: usize,
    /// Chapters evicted per cleanup pass, farthest first.
    pub max_remove_per_pass: usize,
    /// Eviction distance, in multiples of the viewport height.
    pub removal_viewports: usize,
    /// Debounce window for reading-position writes.
    pub persist_debounce_ms: u64,
}

impl Default for ScrollTunables {
    fn default() -> Self {
        Self {
            low_watermark: 0.2,
            high_watermark: 0.8,
            scroll_preload: 2,
            jump_preload_before: 2,
            jump_preload_after: 3,
            keep_threshold: 15,
            max_remove_per_pass: 3,
            removal_viewports: 5,
            persist_debounce_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub font: Font,
    pub theme: Theme,
    pub text_width: Option<usize>,
    pub mouse_support: bool,
    pub show_top_bar: bool,
    pub scroll: ScrollTunables,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: Font::default(),
            theme: Theme::default(),
            text_width: None,
            mouse_support: true,
            show_top_bar: true,
            scroll: ScrollTunables::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keymaps {
    pub scroll_up: String,
    pub scroll_down: String,
    pub page_up: String,
    pub page_down: String,
    pub next_chapter: String,
    pub prev_chapter: String,
    pub beginning: String,
    pub picker: String,
    pub settings: String,
    pub help: String,
    pub quit: String,
}

impl Default for Keymaps {
    fn default() -> Self {
        Self {
            scroll_up: "k".to_string(),
            scroll_down: "j".to_string(),
            page_up: "h".to_string(),
            page_down: "l".to_string(),
            next_chapter: "L".to_string(),
            prev_chapter: "H".to_string(),
            beginning: "g".to_string(),
            picker: "t".to_string(),
            settings: "s".to_string(),
            help: "?".to_string(),
            quit: "q".to_string(),
        }
    }
}

impl Keymaps {
    pub fn matches(binding: &str, ch: char) -> bool {
        binding.chars().next() == Some(ch)
    }
}
