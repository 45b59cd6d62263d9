use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a conversion. No artifact is written when one of
/// these is returned.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("The input file could not be found at {}", path.display())]
    InputNotFound { path: PathBuf },

    /// A data row is missing one of folder, title, latitude, longitude or style.
    #[error("Row {row} has {found} columns, at least 5 are required (folder, title, latitude, longitude, style)")]
    MalformedRow { row: usize, found: usize },

    #[error("The styles file {} is not in the correct format: {reason}", path.display())]
    StyleConfigFormat { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("KML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("KMZ archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
