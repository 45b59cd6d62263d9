//! Non-fatal conditions met during a conversion.
//!
//! The pipeline never logs these itself. Every stage pushes onto a
//! [`Diagnostics`] collector handed in by the caller, and the command line
//! decides how to render them.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Latitude or longitude is not a usable number. The record is kept but
    /// never becomes a placemark.
    Coordinate {
        row: usize,
        title: String,
        latitude: String,
        longitude: String,
    },
    /// No style with this key, `"Default"` was applied instead.
    UnknownStyle { title: String, style_key: String },
    /// The style config names the same style twice; the first one is kept.
    DuplicateStyle { name: String },
    /// A style config path was given but nothing is there.
    MissingStyleConfig { path: PathBuf },
    /// A local icon could not be found and was not embedded.
    MissingIconAsset { href: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Coordinate { row, title, latitude, longitude } => write!(
                f,
                "Co-ordinates not in correct format for point {title} (row {row}: latitude {latitude:?}, longitude {longitude:?})"
            ),
            Warning::UnknownStyle { title, style_key } => {
                write!(f, "Style {style_key} not found for point {title}, using Default")
            }
            Warning::DuplicateStyle { name } => {
                write!(f, "Style {name} is defined more than once, keeping the first definition")
            }
            Warning::MissingStyleConfig { path } => write!(
                f,
                "The style settings could not be loaded from {}, using built-in defaults",
                path.display()
            ),
            Warning::MissingIconAsset { href } => {
                write!(f, "Icon {href} could not be found and was not embedded")
            }
        }
    }
}

/// Collector for the warnings of a single conversion.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }
}
