//! Point styles: the built-in default, the table merged from an optional
//! JSON style file, and the lookup with its fallback to `"Default"`.
//!
//! A style file maps style names to partial attribute sets:
//!
//! ```json
//! {
//!     "Default": { "icon_scale": 0.8 },
//!     "Tower":   { "icon_color": "ff0000ff", "icon_image": "icons/tower.png" }
//! }
//! ```
//!
//! Attributes left out are taken from the built-in default.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ConvertError, Result};

pub const DEFAULT_STYLE: &str = "Default";
pub const DEFAULT_ICON_IMAGE: &str = "http://maps.google.com/mapfiles/kml/pushpin/ylw-pushpin.png";
pub const DEFAULT_ICON_COLOR: &str = "ffffffff";

/// Fully specified visual attributes of a placemark.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub icon_image: String,
    /// Eight hex digits, alpha first.
    pub icon_color: String,
    pub icon_scale: f64,
    pub text_scale: f64,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            icon_image: DEFAULT_ICON_IMAGE.to_string(),
            icon_color: DEFAULT_ICON_COLOR.to_string(),
            icon_scale: 1.0,
            text_scale: 1.0,
        }
    }
}

/// A style as written in the style file, any attribute may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartialStyle {
    #[serde(default, alias = "iconImage")]
    pub icon_image: Option<String>,
    #[serde(default, alias = "iconColor")]
    pub icon_color: Option<String>,
    #[serde(default, alias = "iconScale")]
    pub icon_scale: Option<f64>,
    #[serde(default, alias = "textScale")]
    pub text_scale: Option<f64>,
}

impl PartialStyle {
    /// Fill every missing attribute from `base`.
    pub fn complete(self, base: &Style) -> Style {
        Style {
            icon_image: self.icon_image.unwrap_or_else(|| base.icon_image.clone()),
            icon_color: self.icon_color.unwrap_or_else(|| base.icon_color.clone()),
            icon_scale: self.icon_scale.unwrap_or(base.icon_scale),
            text_scale: self.text_scale.unwrap_or(base.text_scale),
        }
    }
}

/// Style file contents in file order, duplicates included.
///
/// Deserializing into a map would silently keep only the last of two
/// entries with the same name, so entries are collected as a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleConfig {
    pub entries: Vec<(String, PartialStyle)>,
}

impl<'de> Deserialize<'de> for StyleConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = StyleConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from style name to style attributes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<StyleConfig, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, PartialStyle>()? {
                    entries.push(entry);
                }
                Ok(StyleConfig { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl StyleConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Read the style file at `path`.
///
/// `Ok(None)` when no path was given or nothing exists there; a missing file
/// is reported through `diagnostics` rather than failing.
pub fn load_style_config(path: Option<&Path>, diagnostics: &mut Diagnostics) -> Result<Option<StyleConfig>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.is_file() {
        diagnostics.warn(Warning::MissingStyleConfig { path: path.to_path_buf() });
        return Ok(None);
    }

    log::debug!("Loading styles from {}", path.display());
    let text = fs::read_to_string(path)?;
    let config = StyleConfig::from_json(&text).map_err(|e| ConvertError::StyleConfigFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if let Some((name, color)) = config.entries.iter().find_map(|(name, style)| {
        style
            .icon_color
            .as_deref()
            .filter(|color| !is_argb(color))
            .map(|color| (name, color))
    }) {
        return Err(ConvertError::StyleConfigFormat {
            path: path.to_path_buf(),
            reason: format!("style {name} has icon_color {color:?}, expected 8 hex digits"),
        });
    }

    Ok(Some(config))
}

fn is_argb(color: &str) -> bool {
    color.len() == 8 && color.chars().all(|c| c.is_ascii_hexdigit())
}

/// Every known style by name. Always holds `"Default"`.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    styles: BTreeMap<String, Style>,
}

impl Default for StyleTable {
    fn default() -> Self {
        let mut styles = BTreeMap::new();
        styles.insert(DEFAULT_STYLE.to_string(), Style::default());
        StyleTable { styles }
    }
}

impl StyleTable {
    /// Merge `config` over the built-in default.
    ///
    /// A `"Default"` entry in the config replaces the built-in one. A name
    /// seen twice keeps its first definition and records a warning.
    pub fn build(config: Option<StyleConfig>, diagnostics: &mut Diagnostics) -> Self {
        let mut table = StyleTable::default();
        let Some(config) = config else {
            return table;
        };

        let builtin = Style::default();
        let mut seen = HashSet::new();
        for (name, partial) in config.entries {
            if !seen.insert(name.clone()) {
                diagnostics.warn(Warning::DuplicateStyle { name });
                continue;
            }
            table.styles.insert(name, partial.complete(&builtin));
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    pub fn default_style(&self) -> &Style {
        // `build` and `default` both seed the "Default" entry and nothing removes it
        &self.styles[DEFAULT_STYLE]
    }

    /// Style for a record, falling back to `"Default"` for unknown keys.
    pub fn resolve(&self, title: &str, style_key: &str, diagnostics: &mut Diagnostics) -> &Style {
        match self.styles.get(style_key) {
            Some(style) => style,
            None => {
                diagnostics.warn(Warning::UnknownStyle {
                    title: title.to_string(),
                    style_key: style_key.to_string(),
                });
                self.default_style()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Style)> {
        self.styles.iter().map(|(name, style)| (name.as_str(), style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(json: &str) -> StyleConfig {
        StyleConfig::from_json(json).unwrap()
    }

    #[test]
    fn builtin_table_has_only_default() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(None, &mut diagnostics);

        assert_eq!(table.len(), 1);
        assert_eq!(table.default_style(), &Style::default());
        assert_eq!(table.default_style().icon_color, "ffffffff");
        assert_eq!(table.default_style().icon_scale, 1.0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn partial_style_is_completed_from_builtin() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(Some(config(r#"{"Tower": {"icon_color": "ff00ff00"}}"#)), &mut diagnostics);

        let tower = table.get("Tower").unwrap();
        assert_eq!(tower.icon_color, "ff00ff00");
        assert_eq!(tower.icon_image, DEFAULT_ICON_IMAGE);
        assert_eq!(tower.icon_scale, 1.0);
        assert_eq!(tower.text_scale, 1.0);
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(
            Some(config(r#"{"Tower": {"iconScale": 2, "textScale": 0.5, "iconImage": "a.png"}}"#)),
            &mut diagnostics,
        );

        let tower = table.get("Tower").unwrap();
        assert_eq!(tower.icon_scale, 2.0);
        assert_eq!(tower.text_scale, 0.5);
        assert_eq!(tower.icon_image, "a.png");
    }

    #[test]
    fn configured_default_overrides_builtin() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(Some(config(r#"{"Default": {"icon_scale": 0.7}}"#)), &mut diagnostics);

        assert_eq!(table.len(), 1);
        assert_eq!(table.default_style().icon_scale, 0.7);
        assert_eq!(table.default_style().icon_color, DEFAULT_ICON_COLOR);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn duplicate_keeps_first_and_warns() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(
            Some(config(r#"{"Tower": {"icon_scale": 2.0}, "Tower": {"icon_scale": 3.0}}"#)),
            &mut diagnostics,
        );

        assert_eq!(table.get("Tower").unwrap().icon_scale, 2.0);
        assert_eq!(diagnostics.warnings(), &[Warning::DuplicateStyle { name: "Tower".into() }]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(
            Some(config(r#"{"tower": {"icon_scale": 2.0}, "Tower": {"icon_scale": 3.0}}"#)),
            &mut diagnostics,
        );

        assert_eq!(table.len(), 3);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_key_resolves_to_default() {
        let mut diagnostics = Diagnostics::new();
        let table = StyleTable::build(
            Some(config(r#"{"Default": {"icon_color": "ff0000ff"}, "Tower": {"icon_scale": 3.0}}"#)),
            &mut diagnostics,
        );

        assert_eq!(table.resolve("Tower A", "Tower", &mut diagnostics).icon_scale, 3.0);
        assert!(diagnostics.is_empty());

        let style = table.resolve("Mast B", "Mast", &mut diagnostics);
        assert_eq!(style, table.default_style());
        assert_eq!(style.icon_color, "ff0000ff");
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnknownStyle {
                title: "Mast B".into(),
                style_key: "Mast".into()
            }]
        );
    }

    #[test]
    fn wrong_shape_is_a_format_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Tower", "Default"]"#).unwrap();
        let mut diagnostics = Diagnostics::new();

        let err = load_style_config(Some(file.path()), &mut diagnostics).unwrap_err();
        assert!(matches!(err, ConvertError::StyleConfigFormat { .. }));
    }

    #[test]
    fn malformed_color_is_a_format_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Tower": {{"icon_color": "red"}}}}"#).unwrap();
        let mut diagnostics = Diagnostics::new();

        let err = load_style_config(Some(file.path()), &mut diagnostics).unwrap_err();
        match err {
            ConvertError::StyleConfigFormat { reason, .. } => assert!(reason.contains("Tower")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_file_falls_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.json");
        let mut diagnostics = Diagnostics::new();

        let loaded = load_style_config(Some(&path), &mut diagnostics).unwrap();

        assert!(loaded.is_none());
        assert_eq!(diagnostics.warnings(), &[Warning::MissingStyleConfig { path }]);
    }

    #[test]
    fn no_path_is_silent() {
        let mut diagnostics = Diagnostics::new();
        assert!(load_style_config(None, &mut diagnostics).unwrap().is_none());
        assert!(diagnostics.is_empty());
    }
}
