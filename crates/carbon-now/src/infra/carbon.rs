//! Carbon rendering settings and the URLs that carry them.

use std::borrow::Cow;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::DomainError;

pub const DEFAULT_BASE_URL: &str = "https://carbon.now.sh";

/// Approximate glyph width of a monospace font relative to its size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;
/// Height taken by the window controls bar.
const WINDOW_CONTROLS_HEIGHT: u32 = 36;
/// Room around the card so drop shadows and rounding are not cut off.
const VIEWPORT_MARGIN: u32 = 64;
const MIN_VIEWPORT_WIDTH: u32 = 480;
const MAX_VIEWPORT_WIDTH: u32 = 4096;
const MAX_VIEWPORT_HEIGHT: u32 = 16384;

/// Visual settings understood by carbon, named as in the JSON presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub background_color: String,
    pub theme: String,
    pub window_theme: String,
    pub language: String,
    pub drop_shadow: bool,
    pub drop_shadow_offset_y: String,
    pub drop_shadow_blur_radius: String,
    pub window_controls: bool,
    pub width_adjustment: bool,
    pub padding_vertical: String,
    pub padding_horizontal: String,
    pub line_numbers: bool,
    pub first_line_number: usize,
    pub font_family: String,
    pub font_size: String,
    pub line_height: String,
    pub squared_image: bool,
    pub export_size: String,
    pub watermark: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_color: "#ADB7C1".into(),
            theme: "seti".into(),
            window_theme: "none".into(),
            language: "auto".into(),
            drop_shadow: false,
            drop_shadow_offset_y: "20px".into(),
            drop_shadow_blur_radius: "68px".into(),
            window_controls: true,
            width_adjustment: true,
            padding_vertical: "48px".into(),
            padding_horizontal: "32px".into(),
            line_numbers: false,
            first_line_number: 1,
            font_family: "Hack".into(),
            font_size: "18px".into(),
            line_height: "133%".into(),
            squared_image: false,
            export_size: "2x".into(),
            watermark: false,
        }
    }
}

impl Settings {
    /// Overlay a partial JSON object on top of these settings.
    ///
    /// Unknown keys are ignored so presets written by newer versions still load.
    pub fn merged_with(self, overlay: &Map<String, Value>) -> Result<Self> {
        let Value::Object(mut base) =
            serde_json::to_value(&self).context("failed to serialize settings")?
        else {
            return Err(DomainError::InvalidSettings("settings are not an object".into()).into());
        };
        for (key, value) in overlay {
            base.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(base))
            .map_err(|err| DomainError::InvalidSettings(err.to_string()).into())
    }

    /// Parse inline `--settings` JSON into an overlay object.
    pub fn parse_overlay(raw: &str) -> Result<Map<String, Value>> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DomainError::InvalidSettings("expected a JSON object".into()).into()),
            Err(err) => Err(DomainError::InvalidSettings(err.to_string()).into()),
        }
    }

    /// Device scale factor matching the export size.
    pub fn scale_factor(&self) -> u32 {
        match self.export_size.trim().to_ascii_lowercase().as_str() {
            "1x" => 1,
            "2x" => 2,
            "4x" => 4,
            other => {
                tracing::warn!(export_size = other, "unknown export size, using 2x");
                2
            }
        }
    }

    /// Estimate the CSS pixel viewport needed to show `code` without clipping.
    pub fn viewport(&self, code: &str) -> (u32, u32) {
        let font_size = css_length(&self.font_size, 18.0);
        let line_height = font_size * css_ratio(&self.line_height, 1.33);
        let padding_x = css_length(&self.padding_horizontal, 32.0);
        let padding_y = css_length(&self.padding_vertical, 48.0);

        let gutter = if self.line_numbers {
            let last = self
                .first_line_number
                .saturating_add(code.lines().count().max(1));
            last.to_string().len() + 2
        } else {
            0
        };
        let columns = code
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            + gutter;
        let rows = code.lines().count().max(1);

        let card_width =
            columns as f64 * font_size * GLYPH_WIDTH_RATIO + 2.0 * (padding_x + font_size);
        let mut card_height = rows as f64 * line_height + 2.0 * (padding_y + font_size);
        if self.window_controls {
            card_height += f64::from(WINDOW_CONTROLS_HEIGHT);
        }

        // Float-to-int casts saturate, so only the margin can overflow.
        let width = (card_width.ceil() as u32)
            .saturating_add(VIEWPORT_MARGIN)
            .clamp(MIN_VIEWPORT_WIDTH, MAX_VIEWPORT_WIDTH);
        let height = (card_height.ceil() as u32)
            .saturating_add(VIEWPORT_MARGIN)
            .min(MAX_VIEWPORT_HEIGHT);
        if self.squared_image {
            let side = width.max(height).min(MAX_VIEWPORT_WIDTH);
            return (side, side);
        }
        (width, height)
    }

    fn query_pairs(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        vec![
            ("bg", Cow::Borrowed(self.background_color.as_str())),
            ("t", Cow::Borrowed(self.theme.as_str())),
            ("wt", Cow::Borrowed(self.window_theme.as_str())),
            ("l", Cow::Borrowed(self.language.as_str())),
            ("ds", flag(self.drop_shadow)),
            ("dsyoff", Cow::Borrowed(self.drop_shadow_offset_y.as_str())),
            ("dsblur", Cow::Borrowed(self.drop_shadow_blur_radius.as_str())),
            ("wc", flag(self.window_controls)),
            ("wa", flag(self.width_adjustment)),
            ("pv", Cow::Borrowed(self.padding_vertical.as_str())),
            ("ph", Cow::Borrowed(self.padding_horizontal.as_str())),
            ("ln", flag(self.line_numbers)),
            ("fl", Cow::Owned(self.first_line_number.to_string())),
            ("fm", Cow::Borrowed(self.font_family.as_str())),
            ("fs", Cow::Borrowed(self.font_size.as_str())),
            ("lh", Cow::Borrowed(self.line_height.as_str())),
            ("si", flag(self.squared_image)),
            ("es", Cow::Borrowed(self.export_size.as_str())),
            ("wm", flag(self.watermark)),
        ]
    }
}

fn flag(value: bool) -> Cow<'static, str> {
    Cow::Borrowed(if value { "true" } else { "false" })
}

/// Parse a CSS pixel length such as `18px`, falling back when unparsable.
fn css_length(value: &str, fallback: f64) -> f64 {
    value
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite() && *parsed >= 0.0)
        .unwrap_or(fallback)
}

/// Parse a line-height ratio given as `133%` or `1.33`.
fn css_ratio(value: &str, fallback: f64) -> f64 {
    let trimmed = value.trim();
    let parsed = match trimmed.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok().map(|p| p / 100.0),
        None => trimmed.parse::<f64>().ok(),
    };
    parsed
        .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
        .unwrap_or(fallback)
}

/// Builds links into a carbon instance.
#[derive(Debug, Clone)]
pub struct CarbonUrl {
    base: String,
}

impl Default for CarbonUrl {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl CarbonUrl {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Link to the interactive editor.
    pub fn editor(&self, settings: &Settings, code: &str) -> String {
        self.build("/", settings, code)
    }

    /// Link to the chrome-less embed page that only shows the card.
    pub fn embed(&self, settings: &Settings, code: &str) -> String {
        self.build("/embed", settings, code)
    }

    fn build(&self, route: &str, settings: &Settings, code: &str) -> String {
        let mut url = format!("{}{route}?", self.base);
        for (key, value) in settings.query_pairs() {
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(&value));
            url.push('&');
        }
        url.push_str("code=");
        url.push_str(&urlencoding::encode(code));
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_replaces_only_given_keys() -> Result<()> {
        let overlay =
            Settings::parse_overlay(r#"{"theme":"dracula","lineNumbers":true,"unknown":1}"#)?;
        let settings = Settings::default().merged_with(&overlay)?;
        assert_eq!(settings.theme, "dracula");
        assert!(settings.line_numbers);
        assert_eq!(settings.font_family, "Hack");
        Ok(())
    }

    #[test]
    fn overlay_with_wrong_type_is_rejected() {
        let overlay = json!({ "lineNumbers": "yes" });
        let Value::Object(map) = overlay else { unreachable!() };
        assert!(Settings::default().merged_with(&map).is_err());
    }

    #[test]
    fn non_object_overlay_is_rejected() {
        assert!(Settings::parse_overlay("[1, 2]").is_err());
        assert!(Settings::parse_overlay("{ not json").is_err());
    }

    #[test]
    fn code_and_values_are_percent_encoded() {
        let url = CarbonUrl::new("https://example.test/").editor(&Settings::default(), "a b&c");
        assert!(url.starts_with("https://example.test/?bg=%23ADB7C1&t=seti&"));
        assert!(url.contains("&lh=133%25&"));
        assert!(url.ends_with("&code=a%20b%26c"));
    }

    #[test]
    fn default_editor_url() {
        let url = CarbonUrl::default().editor(&Settings::default(), "fn main() {}");
        insta::assert_snapshot!(url, @"https://carbon.now.sh/?bg=%23ADB7C1&t=seti&wt=none&l=auto&ds=false&dsyoff=20px&dsblur=68px&wc=true&wa=true&pv=48px&ph=32px&ln=false&fl=1&fm=Hack&fs=18px&lh=133%25&si=false&es=2x&wm=false&code=fn%20main%28%29%20%7B%7D");
    }

    #[test]
    fn embed_url_uses_embed_route() {
        let url = CarbonUrl::default().embed(&Settings::default(), "fn main() {}");
        assert!(url.starts_with("https://carbon.now.sh/embed?"));
    }

    #[test]
    fn export_size_maps_to_scale() {
        let mut settings = Settings::default();
        assert_eq!(settings.scale_factor(), 2);
        settings.export_size = "4x".into();
        assert_eq!(settings.scale_factor(), 4);
        settings.export_size = "huge".into();
        assert_eq!(settings.scale_factor(), 2);
    }

    #[test]
    fn viewport_grows_with_code() {
        let settings = Settings::default();
        let (small_w, small_h) = settings.viewport("x");
        let long_line = "x".repeat(200);
        let many_lines = "x\n".repeat(80);
        assert!(settings.viewport(&long_line).0 > small_w);
        assert!(settings.viewport(&many_lines).1 > small_h);
        assert!(small_w >= MIN_VIEWPORT_WIDTH);
    }

    #[test]
    fn squared_image_has_equal_sides() {
        let settings = Settings {
            squared_image: true,
            ..Settings::default()
        };
        let (width, height) = settings.viewport("fn main() {}\n");
        assert_eq!(width, height);
    }

    #[test]
    fn huge_sizes_clamp_instead_of_overflowing() {
        let settings = Settings {
            font_size: "1e9px".into(),
            line_numbers: true,
            first_line_number: usize::MAX,
            ..Settings::default()
        };
        assert_eq!(
            settings.viewport("fn main() {}\n"),
            (MAX_VIEWPORT_WIDTH, MAX_VIEWPORT_HEIGHT)
        );
    }
}
