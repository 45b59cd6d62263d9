use geo::algorithm::bounding_rect::BoundingRect;
use geo::{MultiPoint, Point, Rect};

use crate::diagnostics::Diagnostics;
use crate::folders::Folder;
use crate::styles::{Style, StyleTable};

/// A labelled point ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    /// `x` is longitude, `y` is latitude.
    pub point: Point<f64>,
    pub description: String,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFolder {
    pub name: String,
    pub placemarks: Vec<Placemark>,
}

/// Root of the overlay: document, folders, placemarks.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDocument {
    pub name: String,
    pub folders: Vec<OverlayFolder>,
}

impl OverlayDocument {
    pub fn placemarks(&self) -> impl Iterator<Item = &Placemark> {
        self.folders.iter().flat_map(|folder| folder.placemarks.iter())
    }

    pub fn placemark_count(&self) -> usize {
        self.folders.iter().map(|folder| folder.placemarks.len()).sum()
    }

    /// Bounding box of every placemark, `None` when there are none.
    pub fn extent(&self) -> Option<Rect<f64>> {
        let points: MultiPoint<f64> = self.placemarks().map(|p| p.point).collect();
        points.bounding_rect()
    }
}

/// Build the overlay tree from grouped records.
///
/// Records without a location were already reported while parsing and are
/// skipped here. Every placemark receives a complete style.
pub fn build_overlay(
    name: &str,
    folders: &[Folder<'_>],
    styles: &StyleTable,
    diagnostics: &mut Diagnostics,
) -> OverlayDocument {
    let folders = folders
        .iter()
        .map(|folder| {
            let placemarks = folder
                .records
                .iter()
                .filter_map(|record| {
                    let point = record.location?;
                    let style = styles.resolve(&record.title, &record.style_key, diagnostics);
                    Some(Placemark {
                        name: record.title.clone(),
                        point,
                        description: record.description_html.clone(),
                        style: style.clone(),
                    })
                })
                .collect();

            OverlayFolder {
                name: folder.name.to_string(),
                placemarks,
            }
        })
        .collect();

    OverlayDocument {
        name: name.to_string(),
        folders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Warning;
    use crate::folders::group_by_folder;
    use crate::records::PointRecord;
    use crate::styles::StyleConfig;

    fn record(folder: &str, title: &str, location: Option<(f64, f64)>, style_key: &str) -> PointRecord {
        PointRecord {
            folder: folder.to_string(),
            title: title.to_string(),
            location: location.map(|(lat, lon)| Point::new(lon, lat)),
            style_key: style_key.to_string(),
            description_html: format!("<dl><dt>id</dt><dd>{title}</dd></dl>"),
        }
    }

    #[test]
    fn builds_placemarks_with_resolved_styles() {
        let mut diagnostics = Diagnostics::new();
        let config = StyleConfig::from_json(r#"{"Tower": {"icon_scale": 2.5}}"#).unwrap();
        let styles = StyleTable::build(Some(config), &mut diagnostics);
        let records = vec![
            record("Sites", "Tower A", Some((-33.87, 151.21)), "Tower"),
            record("Sites", "Hut", Some((-33.0, 151.0)), "Hut"),
        ];

        let folders = group_by_folder(&records);
        let document = build_overlay("Example", &folders, &styles, &mut diagnostics);

        assert_eq!(document.name, "Example");
        assert_eq!(document.folders.len(), 1);
        let placemarks = &document.folders[0].placemarks;
        assert_eq!(placemarks[0].name, "Tower A");
        assert_eq!(placemarks[0].point.x(), 151.21);
        assert_eq!(placemarks[0].point.y(), -33.87);
        assert_eq!(placemarks[0].style.icon_scale, 2.5);
        assert_eq!(placemarks[0].description, "<dl><dt>id</dt><dd>Tower A</dd></dl>");
        assert_eq!(&placemarks[1].style, styles.default_style());
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnknownStyle {
                title: "Hut".into(),
                style_key: "Hut".into()
            }]
        );
    }

    #[test]
    fn unlocated_records_leave_an_empty_folder() {
        let mut diagnostics = Diagnostics::new();
        let styles = StyleTable::build(None, &mut diagnostics);
        let records = vec![
            record("Lost", "Nowhere", None, "Missing"),
            record("Sites", "Here", Some((1.0, 2.0)), "Default"),
        ];

        let folders = group_by_folder(&records);
        let document = build_overlay("doc", &folders, &styles, &mut diagnostics);

        assert_eq!(document.folders[0].name, "Lost");
        assert!(document.folders[0].placemarks.is_empty());
        assert_eq!(document.placemark_count(), 1);
        // style lookups only happen for emitted placemarks
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn extent_covers_all_placemarks() {
        let mut diagnostics = Diagnostics::new();
        let styles = StyleTable::build(None, &mut diagnostics);
        let records = vec![
            record("a", "1", Some((-10.0, 100.0)), "Default"),
            record("b", "2", Some((20.0, 140.0)), "Default"),
        ];

        let folders = group_by_folder(&records);
        let document = build_overlay("doc", &folders, &styles, &mut diagnostics);
        let extent = document.extent().unwrap();

        assert_eq!(extent.min().x, 100.0);
        assert_eq!(extent.min().y, -10.0);
        assert_eq!(extent.max().x, 140.0);
        assert_eq!(extent.max().y, 20.0);
    }

    #[test]
    fn empty_document_has_no_extent() {
        let document = OverlayDocument {
            name: "empty".into(),
            folders: Vec::new(),
        };
        assert!(document.extent().is_none());
    }
}
