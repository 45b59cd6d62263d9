//! KML serialization and KMZ packaging.
//!
//! The archive holds `doc.kml` first, followed by any local icon files under
//! `files/`. Entries carry a fixed timestamp so the same overlay always
//! produces the same bytes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, create_dir_all};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::overlay::{OverlayDocument, Placemark};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const KML_ENTRY: &str = "doc.kml";
pub const KMZ_EXTENSION: &str = "kmz";
const ASSET_DIR: &str = "files";

/// `<output_dir>/<input stem>.kmz`
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let file_stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "overlay".to_string());

    output_dir.join(format!("{}.{}", file_stem, KMZ_EXTENSION))
}

/// Serialize the overlay to KML.
///
/// `icon_hrefs` rewrites icon references, used to point placemarks at icons
/// embedded in the archive. Icons not in the map are written unchanged.
pub fn to_kml(document: &OverlayDocument, icon_hrefs: &BTreeMap<String, String>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element("kml")
        .with_attribute(("xmlns", KML_NAMESPACE))
        .write_inner_content(|writer| {
            writer.create_element("Document").write_inner_content(|writer| {
                writer
                    .create_element("name")
                    .write_text_content(BytesText::new(&document.name))?;

                for folder in &document.folders {
                    writer.create_element("Folder").write_inner_content(|writer| {
                        writer
                            .create_element("name")
                            .write_text_content(BytesText::new(&folder.name))?;
                        for placemark in &folder.placemarks {
                            write_placemark(writer, placemark, icon_hrefs)?;
                        }
                        Ok::<(), quick_xml::Error>(())
                    })?;
                }
                Ok::<(), quick_xml::Error>(())
            })?;
            Ok::<(), quick_xml::Error>(())
        })?;

    // only &str content was written
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_placemark<W: Write>(
    writer: &mut Writer<W>,
    placemark: &Placemark,
    icon_hrefs: &BTreeMap<String, String>,
) -> quick_xml::Result<()> {
    let style = &placemark.style;
    let href = icon_hrefs
        .get(&style.icon_image)
        .unwrap_or(&style.icon_image);

    writer.create_element("Placemark").write_inner_content(|writer| {
        writer
            .create_element("name")
            .write_text_content(BytesText::new(&placemark.name))?;
        writer
            .create_element("description")
            .write_text_content(BytesText::new(&placemark.description))?;

        writer.create_element("Style").write_inner_content(|writer| {
            writer.create_element("IconStyle").write_inner_content(|writer| {
                writer
                    .create_element("color")
                    .write_text_content(BytesText::new(&style.icon_color))?;
                writer
                    .create_element("scale")
                    .write_text_content(BytesText::new(&style.icon_scale.to_string()))?;
                writer.create_element("Icon").write_inner_content(|writer| {
                    writer
                        .create_element("href")
                        .write_text_content(BytesText::new(href))?;
                    Ok::<(), quick_xml::Error>(())
                })?;
                Ok::<(), quick_xml::Error>(())
            })?;
            writer.create_element("LabelStyle").write_inner_content(|writer| {
                writer
                    .create_element("scale")
                    .write_text_content(BytesText::new(&style.text_scale.to_string()))?;
                Ok::<(), quick_xml::Error>(())
            })?;
            Ok::<(), quick_xml::Error>(())
        })?;

        // KML puts longitude first
        let coordinates = format!("{},{}", placemark.point.x(), placemark.point.y());
        writer.create_element("Point").write_inner_content(|writer| {
            writer
                .create_element("coordinates")
                .write_text_content(BytesText::new(&coordinates))?;
            Ok::<(), quick_xml::Error>(())
        })?;
        Ok::<(), quick_xml::Error>(())
    })?;
    Ok(())
}

fn is_remote(href: &str) -> bool {
    href.contains("://")
}

/// Local icon files referenced by the overlay, keyed by their href.
///
/// Relative hrefs are resolved against `icon_base`. Hrefs that name nothing
/// on disk are reported once and left out.
fn collect_icon_assets(
    document: &OverlayDocument,
    icon_base: Option<&Path>,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, (String, PathBuf)> {
    let mut seen = BTreeSet::new();
    let mut assets: BTreeMap<String, (String, PathBuf)> = BTreeMap::new();
    let mut entries: BTreeMap<String, PathBuf> = BTreeMap::new();

    for placemark in document.placemarks() {
        let href = &placemark.style.icon_image;
        if is_remote(href) || !seen.insert(href.as_str()) {
            continue;
        }

        let relative = Path::new(href);
        let source = match icon_base {
            Some(base) if relative.is_relative() => base.join(relative),
            _ => relative.to_path_buf(),
        };
        if !source.is_file() {
            diagnostics.warn(Warning::MissingIconAsset { href: href.clone() });
            continue;
        }

        let file_name = source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "icon".to_string());
        // two different files may share a name
        let mut entry = format!("{}/{}", ASSET_DIR, file_name);
        let mut n = 1;
        while entries.get(&entry).is_some_and(|p| p != &source) {
            entry = format!("{}/{}_{}", ASSET_DIR, n, file_name);
            n += 1;
        }
        entries.insert(entry.clone(), source.clone());
        assets.insert(href.clone(), (entry, source));
    }

    assets
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

/// Build the complete KMZ archive in memory.
pub fn package(
    document: &OverlayDocument,
    icon_base: Option<&Path>,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<u8>> {
    let assets = collect_icon_assets(document, icon_base, diagnostics);
    let icon_hrefs: BTreeMap<String, String> = assets
        .iter()
        .map(|(href, (entry, _))| (href.clone(), entry.clone()))
        .collect();
    let kml = to_kml(document, &icon_hrefs)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(KML_ENTRY, entry_options())?;
    zip.write_all(kml.as_bytes())?;

    let mut entries: Vec<_> = assets.into_values().collect();
    entries.sort();
    entries.dedup();
    for (entry, source) in entries {
        log::debug!("Embedding {} as {}", source.display(), entry);
        let bytes = fs::read(&source)?;
        zip.start_file(entry, entry_options())?;
        zip.write_all(&bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Package the overlay and write it next to other outputs in `output_dir`.
///
/// The directory is created when missing. Nothing is written unless the whole
/// archive was built. Returns the absolute path of the archive.
pub fn write_kmz(
    document: &OverlayDocument,
    input: &Path,
    output_dir: &Path,
    icon_base: Option<&Path>,
    diagnostics: &mut Diagnostics,
) -> Result<PathBuf> {
    let archive = package(document, icon_base, diagnostics)?;

    create_dir_all(output_dir)?;
    let path = output_path(input, output_dir);
    fs::write(&path, &archive)?;
    log::debug!("Wrote {} bytes to {}", archive.len(), path.display());

    Ok(fs::canonicalize(&path)?)
}
