//! Color validation and palette normalization
//!
//! User-supplied colors are checked here before they reach a generation
//! request. Accepted forms are `#RGB`, `#RRGGBB` (with or without the
//! leading `#`, any case) and CSS color names. Every accepted value is
//! normalized to uppercase `#RRGGBB`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern is valid")
});

/// CSS color names accepted by the validator (lowercase name, canonical hex)
const NAMED_COLORS: &[(&str, &str)] = &[
    ("aqua", "#00FFFF"),
    ("beige", "#F5F5DC"),
    ("black", "#000000"),
    ("blue", "#0000FF"),
    ("brown", "#A52A2A"),
    ("coral", "#FF7F50"),
    ("crimson", "#DC143C"),
    ("cyan", "#00FFFF"),
    ("fuchsia", "#FF00FF"),
    ("gold", "#FFD700"),
    ("gray", "#808080"),
    ("green", "#008000"),
    ("grey", "#808080"),
    ("indigo", "#4B0082"),
    ("ivory", "#FFFFF0"),
    ("khaki", "#F0E68C"),
    ("lavender", "#E6E6FA"),
    ("lime", "#00FF00"),
    ("magenta", "#FF00FF"),
    ("maroon", "#800000"),
    ("mint", "#98FF98"),
    ("navy", "#000080"),
    ("olive", "#808000"),
    ("orange", "#FFA500"),
    ("orchid", "#DA70D6"),
    ("pink", "#FFC0CB"),
    ("plum", "#DDA0DD"),
    ("purple", "#800080"),
    ("red", "#FF0000"),
    ("salmon", "#FA8072"),
    ("silver", "#C0C0C0"),
    ("skyblue", "#87CEEB"),
    ("tan", "#D2B48C"),
    ("teal", "#008080"),
    ("tomato", "#FF6347"),
    ("turquoise", "#40E0D0"),
    ("violet", "#EE82EE"),
    ("white", "#FFFFFF"),
    ("yellow", "#FFFF00"),
];

/// Weight floor for the last colors of a long palette
const MIN_COLOR_WEIGHT: f64 = 0.05;

/// Rejected color input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color code: {value}. Use #RRGGBB, #RGB or a color name")]
pub struct InvalidFormat {
    /// The value as the user typed it
    pub value: String,
}

/// Canonical `#RRGGBB` color (always uppercase)
///
/// Deserializing goes through [`validate_color`], so a stored or posted
/// value is normalized the same way as typed input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedColor(String);

impl NormalizedColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NormalizedColor {
    type Error = InvalidFormat;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_color(&value)
    }
}

impl From<NormalizedColor> for String {
    fn from(color: NormalizedColor) -> Self {
        color.0
    }
}

impl fmt::Display for NormalizedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a single color value and normalize it
pub fn validate_color(value: &str) -> Result<NormalizedColor, InvalidFormat> {
    let trimmed = value.trim();

    if let Some(caps) = HEX_COLOR.captures(trimmed) {
        let digits = caps[1].to_ascii_uppercase();
        let expanded = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect::<String>()
        } else {
            digits
        };
        return Ok(NormalizedColor(format!("#{}", expanded)));
    }

    let lowered = trimmed.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, hex)| NormalizedColor((*hex).to_string()))
        .ok_or_else(|| InvalidFormat {
            value: value.to_string(),
        })
}

/// One entry of the palette payload sent to the image API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteMember {
    pub color_hex: String,
    pub color_weight: f64,
}

/// Ordered, duplicate-free list of validated colors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PaletteColors")]
pub struct ColorPalette {
    colors: Vec<NormalizedColor>,
}

/// Wire shape of a palette before duplicates are dropped
#[derive(Deserialize)]
struct PaletteColors {
    colors: Vec<NormalizedColor>,
}

impl From<PaletteColors> for ColorPalette {
    fn from(raw: PaletteColors) -> Self {
        let mut palette = Self::new();
        for color in raw.colors {
            palette.push(color);
        }
        palette
    }
}

impl ColorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a free-form list separated by commas, whitespace or newlines
    ///
    /// Fails on the first entry that is not a recognized color.
    pub fn parse(text: &str) -> Result<Self, InvalidFormat> {
        let mut palette = Self::new();
        for entry in text
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            palette.push(validate_color(entry)?);
        }
        Ok(palette)
    }

    /// Append a color; returns false if it was already present
    pub fn push(&mut self, color: NormalizedColor) -> bool {
        if self.colors.contains(&color) {
            return false;
        }
        self.colors.push(color);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn colors(&self) -> &[NormalizedColor] {
        &self.colors
    }

    /// Palette members with weights decreasing linearly from 1.0
    ///
    /// The i-th of n colors gets `max(0.05, 1.0 - i * 0.95 / max(1, n - 1))`,
    /// rounded to two decimals.
    pub fn weighted_members(&self) -> Vec<PaletteMember> {
        let n = self.colors.len();
        let step = (1.0 - MIN_COLOR_WEIGHT) / (n.saturating_sub(1).max(1) as f64);

        self.colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let weight = (1.0 - i as f64 * step).max(MIN_COLOR_WEIGHT);
                PaletteMember {
                    color_hex: color.to_string(),
                    color_weight: (weight * 100.0).round() / 100.0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms_normalize_to_same_value() {
        for input in ["#ff5733", "#FF5733", "ff5733", "FF5733", "  #Ff5733 "] {
            assert_eq!(validate_color(input).unwrap().as_str(), "#FF5733", "input {:?}", input);
        }
    }

    #[test]
    fn test_shorthand_expands() {
        assert_eq!(validate_color("#fff").unwrap().as_str(), "#FFFFFF");
        assert_eq!(validate_color("abc").unwrap().as_str(), "#AABBCC");
        assert_eq!(validate_color("#AbC").unwrap().as_str(), "#AABBCC");
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(validate_color("white").unwrap().as_str(), "#FFFFFF");
        assert_eq!(validate_color("Navy").unwrap().as_str(), "#000080");
        assert_eq!(validate_color("GREY").unwrap(), validate_color("gray").unwrap());
        assert_eq!(validate_color("white").unwrap(), validate_color("#fff").unwrap());
    }

    #[test]
    fn test_rejects_unrecognized_values() {
        for input in ["", "#", "#ff", "#ffff", "#fffff", "#fffffff", "#ggg", "rgb(1,2,3)", "notacolor", "##fff"] {
            let err = validate_color(input).unwrap_err();
            assert_eq!(err.value, input);
        }
    }

    #[test]
    fn test_palette_parse_dedupes_and_keeps_order() {
        let palette = ColorPalette::parse("#fff, red\n#FF0000 navy;white").unwrap();
        let colors: Vec<&str> = palette.colors().iter().map(|c| c.as_str()).collect();
        assert_eq!(colors, vec!["#FFFFFF", "#FF0000", "#000080"]);
    }

    #[test]
    fn test_palette_parse_fails_on_first_invalid() {
        let err = ColorPalette::parse("#fff, bogus, #zzz").unwrap_err();
        assert_eq!(err.value, "bogus");
    }

    #[test]
    fn test_palette_parse_empty_is_empty() {
        assert!(ColorPalette::parse("  , \n").unwrap().is_empty());
    }

    #[test]
    fn test_weighted_members() {
        let single = ColorPalette::parse("#000").unwrap().weighted_members();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].color_weight, 1.0);

        let pair = ColorPalette::parse("#000 #fff").unwrap().weighted_members();
        assert_eq!(pair[0].color_weight, 1.0);
        assert_eq!(pair[1].color_weight, 0.05);
        assert_eq!(pair[1].color_hex, "#FFFFFF");

        let five = ColorPalette::parse("red green blue navy teal").unwrap().weighted_members();
        for window in five.windows(2) {
            assert!(window[0].color_weight > window[1].color_weight);
        }
        assert_eq!(five[4].color_weight, 0.05);
    }

    #[test]
    fn test_palette_deserialize_normalizes_and_dedupes() {
        let palette: ColorPalette =
            serde_json::from_str(r##"{"colors":["red","#fff","#FFF","#FFF"]}"##).unwrap();
        let colors: Vec<&str> = palette.colors().iter().map(|c| c.as_str()).collect();
        assert_eq!(colors, vec!["#FF0000", "#FFFFFF"]);

        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(json, r##"{"colors":["#FF0000","#FFFFFF"]}"##);
    }

    #[test]
    fn test_palette_deserialize_rejects_unknown_color() {
        let err = serde_json::from_str::<ColorPalette>(r#"{"colors":["navy","bogus"]}"#).unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(serde_json::from_str::<NormalizedColor>("\"#12\"").is_err());
    }
}
