//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Board and sprite colours, loadable from a btop-style theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Player icon.
    pub player: Color,
    /// Objects to dodge.
    pub obstacle: Color,
    /// Objects to collect.
    pub reward: Color,
    /// Cell background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, status).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults: hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            player: parse_hex("#56B6C2").unwrap(),   // hi_fg / cyan
            obstacle: parse_hex("#E06C75").unwrap(), // cpu_end / red
            reward: parse_hex("#E5C07B").unwrap(),   // title / yellow
            bg: parse_hex("#31353F").unwrap(),       // meter_bg
            div_line: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"`.
    /// Falls back to One Dark defaults if path is None or file is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        Ok(Self::from_map(&map))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let defaults = Self::onedark_default();
        Self {
            player: get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(defaults.player),
            obstacle: get("cpu_end").or_else(|| get("temp_end")).unwrap_or(defaults.obstacle),
            reward: get("cpu_mid").or_else(|| get("title")).unwrap_or(defaults.reward),
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
        }
    }

    /// Sprite colour for an occupant kind; `None` for empty cells.
    pub fn occupant_color(&self, occupant: crate::game::Occupant) -> Option<Color> {
        match occupant {
            crate::game::Occupant::Player => Some(self.player),
            crate::game::Occupant::Obstacle => Some(self.obstacle),
            crate::game::Occupant::Reward => Some(self.reward),
            crate::game::Occupant::Empty => None,
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let component = |part: &str| {
        u8::from_str_radix(part, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = if s.len() == 6 {
        (component(&s[0..2])?, component(&s[2..4])?, component(&s[4..6])?)
    } else if s.len() == 3 {
        (
            component(&s[0..1])? * 17,
            component(&s[1..2])? * 17,
            component(&s[2..3])? * 17,
        )
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}
