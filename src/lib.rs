//! Convert CSV point tables into KMZ overlays for Google Earth.
//!
//! Each input row is `folder, title, latitude, longitude, style` followed by
//! any number of extra columns, which end up in the placemark description.

use std::fs;
use std::path::{Path, PathBuf};

use geo::Rect;

pub mod diagnostics;
pub mod error;
pub mod folders;
pub mod kmz;
pub mod overlay;
pub mod records;
pub mod styles;

pub use diagnostics::{Diagnostics, Warning};
pub use error::{ConvertError, Result};

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output_dir: PathBuf,
    /// JSON style file. Built-in defaults apply when absent.
    pub style_config: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            style_config: None,
        }
    }
}

/// What a successful conversion produced.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub output_path: PathBuf,
    pub records: usize,
    pub folders: usize,
    pub placemarks: usize,
    pub extent: Option<Rect<f64>>,
    pub diagnostics: Diagnostics,
}

/// Convert the CSV file at `input` into a KMZ in `options.output_dir`.
///
/// Fatal problems return an error and leave no archive behind. Everything
/// else is collected in [`Conversion::diagnostics`].
pub fn convert_file(input: &Path, options: &ConvertOptions) -> Result<Conversion> {
    if !input.is_file() {
        return Err(ConvertError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    let mut diagnostics = Diagnostics::new();
    let config = styles::load_style_config(options.style_config.as_deref(), &mut diagnostics)?;
    let style_table = styles::StyleTable::build(config, &mut diagnostics);

    log::debug!("Loading file: {}", input.display());
    let bytes = fs::read(input)?;
    let (header, rows) = records::read_table(&bytes)?;
    let records = records::parse_records(&header, &rows, &mut diagnostics)?;
    log::debug!("Parsed {} records", records.len());

    let folders = folders::group_by_folder(&records);
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let document = overlay::build_overlay(&name, &folders, &style_table, &mut diagnostics);
    log::debug!(
        "Built {} placemarks in {} folders",
        document.placemark_count(),
        document.folders.len()
    );

    let icon_base = options
        .style_config
        .as_deref()
        .and_then(Path::parent);
    let output_path = kmz::write_kmz(&document, input, &options.output_dir, icon_base, &mut diagnostics)?;

    Ok(Conversion {
        output_path,
        records: records.len(),
        folders: document.folders.len(),
        placemarks: document.placemark_count(),
        extent: document.extent(),
        diagnostics,
    })
}
