use image::Rgba;
use log::warn;
use std::path::PathBuf;

use crate::canvas::{color_to_hex, hex_to_color, SelectionColor, SelectionMode};
use crate::components::tools::{SelectionSettings, SelectionTool};
use crate::ops::text::TypesetOptions;

/// Settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub selection: SelectionSettings,
    pub typeset: TypesetOptions,
    /// Overlay colour of the layer being edited
    pub active_color: Rgba<u8>,
    /// Overlay colour of every other layer
    pub inactive_color: Rgba<u8>,
    /// Colour used to draw placed text
    pub text_color: Rgba<u8>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            selection: SelectionSettings::default(),
            typeset: TypesetOptions::default(),
            active_color: SelectionColor::MASK,
            inactive_color: SelectionColor::INACTIVE,
            text_color: Rgba([0, 0, 0, 255]),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/typesetfe/typesetfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\TypesetFE\typesetfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/TypesetFE/typesetfe_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("TypesetFE").join("typesetfe_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("TypesetFE")
                    .join("typesetfe_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("typesetfe").join("typesetfe_settings.cfg"))
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "selection.active_tool={}\n\
             selection.active_mode={}\n\
             selection.brush_radius={}\n\
             selection.flood_threshold={}\n\
             typeset.margin={}\n\
             typeset.line_gap={}\n\
             typeset.font_size={}\n\
             overlay.active_color={}\n\
             overlay.inactive_color={}\n\
             overlay.text_color={}\n",
            self.selection.active_tool.key(),
            self.selection.active_mode.key(),
            self.selection.brush_radius,
            self.selection.flood_threshold,
            self.typeset.margin,
            self.typeset.line_gap,
            self.typeset.font_size,
            color_to_hex(self.active_color),
            color_to_hex(self.inactive_color),
            color_to_hex(self.text_color),
        )
    }

    /// Parse `key=value` lines. Unknown keys are skipped and bad values keep
    /// their defaults.
    pub fn from_config_string(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "selection.active_tool" => {
                    s.selection.active_tool = SelectionTool::from_key(val).unwrap_or_default();
                }
                "selection.active_mode" => {
                    s.selection.active_mode = SelectionMode::from_key(val).unwrap_or_default();
                }
                "selection.brush_radius" => {
                    if let Ok(r) = val.parse() {
                        s.selection.set_brush_radius(r);
                    }
                }
                "selection.flood_threshold" => {
                    if let Ok(t) = val.parse() {
                        s.selection.set_flood_threshold(t);
                    }
                }
                "typeset.margin" => {
                    s.typeset.margin = val.parse().unwrap_or(s.typeset.margin);
                }
                "typeset.line_gap" => {
                    s.typeset.line_gap = val.parse().unwrap_or(s.typeset.line_gap);
                }
                "typeset.font_size" => {
                    s.typeset.font_size = val.parse().unwrap_or(s.typeset.font_size);
                }
                "overlay.active_color" => {
                    if let Some(c) = hex_to_color(val) {
                        s.active_color = c;
                    }
                }
                "overlay.inactive_color" => {
                    if let Some(c) = hex_to_color(val) {
                        s.inactive_color = c;
                    }
                }
                "overlay.text_color" => {
                    if let Some(c) = hex_to_color(val) {
                        s.text_color = c;
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::settings_path() else { return Ok(()) };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Load settings from disk (returns default if file missing)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_string(&content),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("could not read settings {}: {e}", path.display());
                }
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_round_trips() {
        let mut s = AppSettings::default();
        s.selection.active_tool = SelectionTool::FloodFill;
        s.selection.active_mode = SelectionMode::Intersect;
        s.selection.set_brush_radius(42);
        s.selection.set_flood_threshold(0.25);
        s.typeset.line_gap = 3.0;
        s.text_color = Rgba([10, 20, 30, 255]);
        assert_eq!(AppSettings::from_config_string(&s.to_config_string()), s);
    }

    #[test]
    fn overlay_colours_parse_and_reject_junk() {
        let s = AppSettings::from_config_string(
            "overlay.active_color=#01020304\noverlay.inactive_color=nothex\noverlay.text_color=#ff000080\n",
        );
        assert_eq!(s.active_color, Rgba([1, 2, 3, 4]));
        assert_eq!(s.inactive_color, SelectionColor::INACTIVE);
        assert_eq!(s.text_color, Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn bad_lines_fall_back_to_defaults() {
        let s = AppSettings::from_config_string(
            "# comment\nselection.active_tool=lasso\nselection.brush_radius=900\nselection.flood_threshold=abc\nnonsense\ntypeset.font_size=18\nunknown.key=1\n",
        );
        assert_eq!(s.selection.active_tool, SelectionTool::Rectangle);
        assert_eq!(s.selection.brush_radius, 100);
        assert_eq!(s.selection.flood_threshold, 0.08);
        assert_eq!(s.typeset.font_size, 18.0);
        assert_eq!(s.typeset.margin, 10);
    }
}
