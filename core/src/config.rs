//! Switching configuration and the settings collaborator trait.
//!
//! `Config` is the serde-backed settings document (TOML on disk):
//! - global enable switch
//! - per-scene enablement (`[scenes]`)
//! - cursor colours per input method (`[cursor_colors]`, display only)
//! - custom override rules (`[[rules]]`)
//!
//! # Example
//!
//! ```rust
//! use imeswitch_core::{Config, SceneKind, SwitchSettings};
//!
//! let config = Config::from_toml_str("[scenes]\nstring_literal = true\n").unwrap();
//! assert!(config.scene_enabled(SceneKind::StringLiteral));
//! assert!(config.scene_enabled(SceneKind::Comment));
//! ```

use crate::model::{CustomRule, InputLanguage, InputMethodKind, Rgb, SceneKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read access to the switching settings.
///
/// Implemented by `Config`; hosts with their own settings store implement it
/// directly. All reads happen on the event thread.
pub trait SwitchSettings {
    /// Whether automatic switching is on at all.
    fn is_enabled(&self) -> bool;

    /// Whether switching is enabled for `scene`.
    fn scene_enabled(&self, scene: SceneKind) -> bool;

    /// User override rules, in declared order.
    fn custom_rules(&self) -> &[CustomRule];

    /// Cursor colour to show while `method` is active. Display only.
    fn cursor_color(&self, method: InputMethodKind) -> Option<Rgb>;
}

/// Per-scene enablement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneToggles {
    pub default: bool,
    pub comment: bool,
    pub string_literal: bool,
    pub git_commit: bool,
    pub tool_window: bool,
    pub vim_normal: bool,
    pub vim_insert: bool,
}

impl Default for SceneToggles {
    fn default() -> Self {
        Self {
            default: true,
            comment: true,
            string_literal: false,
            git_commit: true,
            tool_window: false,
            vim_normal: false,
            vim_insert: false,
        }
    }
}

impl SceneToggles {
    pub fn get(&self, scene: SceneKind) -> bool {
        match scene {
            SceneKind::Default => self.default,
            SceneKind::Comment => self.comment,
            SceneKind::StringLiteral => self.string_literal,
            SceneKind::GitCommit => self.git_commit,
            SceneKind::ToolWindow => self.tool_window,
            SceneKind::VimNormal => self.vim_normal,
            SceneKind::VimInsert => self.vim_insert,
        }
    }

    pub fn set(&mut self, scene: SceneKind, enabled: bool) {
        let slot = match scene {
            SceneKind::Default => &mut self.default,
            SceneKind::Comment => &mut self.comment,
            SceneKind::StringLiteral => &mut self.string_literal,
            SceneKind::GitCommit => &mut self.git_commit,
            SceneKind::ToolWindow => &mut self.tool_window,
            SceneKind::VimNormal => &mut self.vim_normal,
            SceneKind::VimInsert => &mut self.vim_insert,
        };
        *slot = enabled;
    }
}

/// Cursor colours keyed by display language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CursorColors {
    pub english: Option<Rgb>,
    pub chinese: Option<Rgb>,
    pub japanese: Option<Rgb>,
    pub korean: Option<Rgb>,
}

impl Default for CursorColors {
    fn default() -> Self {
        Self {
            english: Some(Rgb::new(0x4C, 0xAF, 0x50)),  // green
            chinese: Some(Rgb::new(0xF4, 0x43, 0x36)),  // red
            japanese: Some(Rgb::new(0x21, 0x96, 0xF3)), // blue
            korean: None,
        }
    }
}

impl CursorColors {
    pub fn for_language(&self, language: InputLanguage) -> Option<Rgb> {
        match language {
            InputLanguage::English => self.english,
            InputLanguage::Chinese => self.chinese,
            InputLanguage::Japanese => self.japanese,
            InputLanguage::Korean => self.korean,
        }
    }

    /// Colour for an input method class. Native resolves to the first
    /// configured CJK colour.
    pub fn for_method(&self, method: InputMethodKind) -> Option<Rgb> {
        match method {
            InputMethodKind::Latin => self.english,
            InputMethodKind::Native => self.chinese.or(self.japanese).or(self.korean),
        }
    }
}

/// Complete switching configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Global on/off switch
    pub enabled: bool,
    pub scenes: SceneToggles,
    pub cursor_colors: CursorColors,
    pub rules: Vec<CustomRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            scenes: SceneToggles::default(),
            cursor_colors: CursorColors::default(),
            rules: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    // ========== Rule Management ==========

    /// Add a rule, replacing any existing rule with the same id.
    pub fn upsert_rule(&mut self, rule: CustomRule) {
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Remove a rule by id. Returns whether a rule was removed.
    pub fn remove_rule(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }

    pub fn set_scene_enabled(&mut self, scene: SceneKind, enabled: bool) {
        self.scenes.set(scene, enabled);
    }
}

impl SwitchSettings for Config {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn scene_enabled(&self, scene: SceneKind) -> bool {
        self.scenes.get(scene)
    }

    fn custom_rules(&self) -> &[CustomRule] {
        &self.rules
    }

    fn cursor_color(&self, method: InputMethodKind) -> Option<Rgb> {
        self.cursor_colors.for_method(method)
    }
}
