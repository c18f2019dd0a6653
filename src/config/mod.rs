//! Configuration for keymode.
//!
//! Settings load from ~/.config/keymode/config.toml. A missing or unparsable
//! file falls back to the built-in defaults, and the host re-invokes
//! `Engine::reload` whenever the document changes.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::host::CursorStyle;

/// Main settings structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cursor: CursorSettings,
    /// Raw keybinding document, one entry per key. Entries that fail
    /// validation are dropped when the keymap tree is built.
    pub keybindings: toml::Table,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cursor: CursorSettings::default(),
            keybindings: default_keybindings(),
        }
    }
}

/// Cursor shapes per mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    /// Shape in normal mode: "block", "underline", or "line" (default: "block")
    pub normal: String,
    /// Shape in insert mode (default: "line")
    pub insert: String,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            normal: "block".to_string(),
            insert: "line".to_string(),
        }
    }
}

impl CursorSettings {
    /// Unrecognized style names fall back to the built-in shape.
    pub fn normal_style(&self) -> CursorStyle {
        CursorStyle::parse(&self.normal).unwrap_or(CursorStyle::Block)
    }

    pub fn insert_style(&self) -> CursorStyle {
        CursorStyle::parse(&self.insert).unwrap_or(CursorStyle::Line)
    }
}

/// Returns the path to the config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut path| {
        path.push(".config");
        path.push("keymode");
        path.push("config.toml");
        path
    })
}

/// Load configuration from the default config file, falling back to the
/// defaults if it is missing or malformed.
pub fn load_config() -> Settings {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Settings::default(),
    }
}

pub fn load_config_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            debug!("config parse error in {}: {err}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// The shipped keybinding table: selection-aware movement on the home row,
/// line-wise clipboard operations, and the built-in mode and selection
/// commands. Users replace the whole table by providing `[keybindings]`.
const DEFAULT_KEYBINDINGS: &str = r#"
j = { selecting = "cursorDownSelect", default = "cursorDown" }
k = { selecting = "cursorUpSelect", default = "cursorUp" }
l = { selecting = "cursorLeftSelect", default = "cursorLeft" }
";" = { selecting = "cursorRightSelect", default = "cursorRight" }
m = { selecting = "cursorWordStartLeftSelect", default = "cursorWordStartLeft" }
"," = { selecting = "cursorWordEndRightSelect", default = "cursorWordEndRight" }
o = { selecting = "cursorLineStartSelect", default = "cursorLineStart" }
p = { selecting = "cursorLineEndSelect", default = "cursorLineEnd" }
e = "deleteLeft"
d = "deleteWordLeft"
s = "clipboardPasteAction"
t = "toggleSelection"
x = "copyWord"
"=" = "swapActiveAndAnchor"
f = "enterInsert"
a = { selecting = ["clipboardCopyAction", "cancelSelection"], default = ["cursorLineStart", "cursorLineEndSelect", "cursorRightSelect", "clipboardCopyAction", "cancelSelection"] }
w = { selecting = "clipboardCutAction", default = ["cursorLineStart", "cursorLineEndSelect", "cursorRightSelect", "clipboardCutAction"] }

[g]
g = { selecting = "cursorTopSelect", default = "cursorTop" }
e = { selecting = "cursorBottomSelect", default = "cursorBottom" }
"#;

fn default_keybindings() -> toml::Table {
    DEFAULT_KEYBINDINGS.parse().unwrap_or_default()
}
