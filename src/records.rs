use csv::{ByteRecord, ReaderBuilder};
use geo::Point;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ConvertError, Result};

/// Columns before this index are fixed (folder, title, latitude, longitude,
/// style). Everything from here on is an additional attribute.
pub const FIRST_ATTRIBUTE_COLUMN: usize = 5;

const UNKNOWN_HEADING: &str = "Unknown Heading";

/// One input row, trimmed and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub folder: String,
    pub title: String,
    /// `x` is longitude and `y` is latitude. Absent when either could not be
    /// read, so there is never a lone latitude or longitude.
    pub location: Option<Point<f64>>,
    pub style_key: String,
    pub description_html: String,
}

impl PointRecord {
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|p| p.y())
    }

    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|p| p.x())
    }
}

/// Split CSV bytes into their header row and data rows.
///
/// Rows may have any number of cells; blank lines are skipped. Cells that are
/// not valid UTF-8 are decoded lossily. Empty input gives an empty header and
/// no rows.
pub fn read_table(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'"')
        .from_reader(bytes);

    let mut rows = reader.byte_records();
    let header = match rows.next() {
        Some(record) => decode(&record?),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let mut data = Vec::new();
    for record in rows {
        data.push(decode(&record?));
    }
    Ok((header, data))
}

fn decode(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|cell| String::from_utf8_lossy(cell).into_owned())
        .collect()
}

/// Trim a cell and drop control characters that XML 1.0 cannot carry.
fn clean(cell: &str) -> String {
    cell.trim()
        .chars()
        .filter(|&c| !c.is_ascii_control() || matches!(c, '\t' | '\n' | '\r') || c == '\u{7f}')
        .collect()
}

/// Turn data rows into point records, in row order.
///
/// A row with fewer than five cells aborts everything. Bad coordinates only
/// produce a warning and a record without a location.
pub fn parse_records<R: AsRef<[String]>>(
    header: &[String],
    rows: &[R],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<PointRecord>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| parse_row(header, row.as_ref(), index + 1, diagnostics))
        .collect()
}

fn parse_row(
    header: &[String],
    row: &[String],
    row_number: usize,
    diagnostics: &mut Diagnostics,
) -> Result<PointRecord> {
    if row.len() < FIRST_ATTRIBUTE_COLUMN {
        return Err(ConvertError::MalformedRow {
            row: row_number,
            found: row.len(),
        });
    }

    let folder = clean(&row[0]);
    let title = clean(&row[1]);
    let style_key = clean(&row[4]);

    let location = match (parse_coordinate(&row[2]), parse_coordinate(&row[3])) {
        (Some(latitude), Some(longitude)) => Some(Point::new(longitude, latitude)),
        _ => {
            diagnostics.warn(Warning::Coordinate {
                row: row_number,
                title: title.clone(),
                latitude: clean(&row[2]),
                longitude: clean(&row[3]),
            });
            None
        }
    };

    Ok(PointRecord {
        folder,
        title,
        location,
        style_key,
        description_html: attributes_html(header, row),
    })
}

// NaN and infinities parse as floats but cannot be placed on a map
fn parse_coordinate(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Render the additional columns of a row as an HTML definition list.
///
/// Cell `i` is labelled with header `i`. Returns an empty string when the row
/// has no additional columns.
pub fn attributes_html(header: &[String], row: &[String]) -> String {
    if row.len() <= FIRST_ATTRIBUTE_COLUMN {
        return String::new();
    }

    let mut html = String::from("<dl>");
    for (i, cell) in row.iter().enumerate().skip(FIRST_ATTRIBUTE_COLUMN) {
        let heading = header.get(i).map_or_else(|| UNKNOWN_HEADING.to_string(), |h| clean(h));
        html.push_str("<dt>");
        html.push_str(&heading);
        html.push_str("</dt><dd>");
        html.push_str(&clean(cell));
        html.push_str("</dd>");
    }
    html.push_str("</dl>");
    html
}
