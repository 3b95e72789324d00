use std::path::{Path, PathBuf};

use crate::canvas::{BLACK, Color, WHITE};
use crate::components::tools::{DEFAULT_STAMP_GLYPH, MAX_BRUSH_SIZE, Tool, ToolState, color_to_str, parse_color};
use crate::error::PaintResult;
use crate::log_warn;
use crate::ops::shapes::CapStyle;
use crate::ops::text::FontLibrary;

/// Engine defaults, read from a `key=value` file.  Unknown keys and
/// malformed values fall back to the defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub brush_size: u32,
    pub opacity: f32,
    pub foreground: Color,
    pub background: Color,
    pub font_family: String,
    /// Extra font directories; empty means the platform defaults.
    pub font_dirs: Vec<PathBuf>,
    pub stamp_glyph: char,
    pub line_cap: CapStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            brush_size: 2,
            opacity: 1.0,
            foreground: BLACK,
            background: WHITE,
            font_family: "DejaVu Sans".to_string(),
            font_dirs: Vec::new(),
            stamp_glyph: DEFAULT_STAMP_GLYPH,
            line_cap: CapStyle::Round,
        }
    }
}

impl Settings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/rasterpad/rasterpad_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\rasterpad\rasterpad_settings.cfg
    /// On macOS:   ~/Library/Application Support/rasterpad/rasterpad_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("rasterpad");
            return Some(config_dir.join("rasterpad_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("rasterpad").join("rasterpad_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("rasterpad")
                    .join("rasterpad_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("rasterpad_settings.cfg")))
        }
    }

    /// Load from the platform settings file (defaults if missing or corrupt).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> PaintResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "canvas_width" => {
                    s.canvas_width = val.parse().ok().filter(|w| *w > 0).unwrap_or(s.canvas_width);
                }
                "canvas_height" => {
                    s.canvas_height = val.parse().ok().filter(|h| *h > 0).unwrap_or(s.canvas_height);
                }
                "brush_size" => {
                    s.brush_size = val
                        .parse::<u32>()
                        .map(|v| v.clamp(1, MAX_BRUSH_SIZE))
                        .unwrap_or(s.brush_size);
                }
                "opacity" => {
                    s.opacity = val
                        .parse::<f32>()
                        .ok()
                        .filter(|o| o.is_finite())
                        .map(|o| o.clamp(0.0, 1.0))
                        .unwrap_or(s.opacity);
                }
                "foreground" => {
                    if let Some(c) = parse_color(val) {
                        s.foreground = c;
                    }
                }
                "background" => {
                    if let Some(c) = parse_color(val) {
                        s.background = c;
                    }
                }
                "font_family" => {
                    if !val.is_empty() {
                        s.font_family = val.to_string();
                    }
                }
                "font_dirs" => {
                    s.font_dirs = val
                        .split(';')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(PathBuf::from)
                        .collect();
                }
                "stamp_glyph" => {
                    if let Some(ch) = val.chars().next() {
                        s.stamp_glyph = ch;
                    }
                }
                "line_cap" => {
                    if let Some(cap) = CapStyle::from_name(val) {
                        s.line_cap = cap;
                    }
                }
                _ => log_warn!("Ignoring unknown setting '{}'", key),
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        let dirs = self
            .font_dirs
            .iter()
            .map(|d| d.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "canvas_width={}\n\
             canvas_height={}\n\
             brush_size={}\n\
             opacity={}\n\
             foreground={}\n\
             background={}\n\
             font_family={}\n\
             font_dirs={}\n\
             stamp_glyph={}\n\
             line_cap={}\n",
            self.canvas_width,
            self.canvas_height,
            self.brush_size,
            self.opacity,
            color_to_str(self.foreground),
            color_to_str(self.background),
            self.font_family,
            dirs,
            self.stamp_glyph,
            self.line_cap.label().to_ascii_lowercase(),
        )
    }

    /// Save to the platform settings file.
    pub fn save(&self) -> PaintResult<()> {
        match Self::settings_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> PaintResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())?;
        Ok(())
    }

    /// Initial tool selection built from these defaults.
    pub fn tool_state(&self) -> ToolState {
        ToolState {
            tool: Tool::default(),
            size: self.brush_size.clamp(1, MAX_BRUSH_SIZE),
            opacity: self.opacity,
            foreground: self.foreground,
            background: self.background,
            font_family: self.font_family.clone(),
            bold: false,
            italic: false,
            line_cap: self.line_cap,
            stamp_glyph: self.stamp_glyph,
        }
    }

    pub fn font_library(&self) -> FontLibrary {
        if self.font_dirs.is_empty() {
            FontLibrary::new(FontLibrary::default_dirs())
        } else {
            FontLibrary::new(self.font_dirs.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn parses_known_keys_and_ignores_noise() {
        let s = Settings::parse(
            "# defaults\n\
             canvas_width = 320\n\
             canvas_height=0\n\
             brush_size=12\n\
             opacity=2.5\n\
             foreground=255,0,0\n\
             background=garbage\n\
             font_dirs=/a; /b ;\n\
             line_cap=square\n\
             mystery=1\n\
             not a pair\n",
        );
        assert_eq!(s.canvas_width, 320);
        assert_eq!(s.canvas_height, 600);
        assert_eq!(s.brush_size, 12);
        assert_eq!(s.opacity, 1.0);
        assert_eq!(s.foreground, Rgba([255, 0, 0, 255]));
        assert_eq!(s.background, WHITE);
        assert_eq!(s.font_dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(s.line_cap, CapStyle::Square);
    }

    #[test]
    fn oversized_brush_is_capped() {
        let s = Settings::parse("brush_size=4000000000\n");
        assert_eq!(s.brush_size, MAX_BRUSH_SIZE);
        let s = Settings {
            brush_size: u32::MAX,
            ..Settings::default()
        };
        assert_eq!(s.tool_state().size, MAX_BRUSH_SIZE);
    }

    #[test]
    fn config_string_reparses_to_same_settings() {
        let s = Settings {
            canvas_width: 64,
            brush_size: 7,
            opacity: 0.25,
            stamp_glyph: '★',
            font_dirs: vec![PathBuf::from("/fonts")],
            line_cap: CapStyle::Flat,
            ..Settings::default()
        };
        assert_eq!(Settings::parse(&s.to_config_string()), s);
    }

    #[test]
    fn save_and_load_through_a_file() {
        let path = std::env::temp_dir()
            .join(format!("rasterpad-settings-{}", uuid::Uuid::new_v4()))
            .join("rasterpad_settings.cfg");
        let s = Settings {
            brush_size: 9,
            ..Settings::default()
        };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), s);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn tool_state_uses_configured_defaults() {
        let s = Settings {
            brush_size: 5,
            opacity: 0.5,
            ..Settings::default()
        };
        let state = s.tool_state();
        assert_eq!(state.size, 5);
        assert_eq!(state.opacity, 0.5);
        assert_eq!(state.tool, Tool::Brush);
    }
}
