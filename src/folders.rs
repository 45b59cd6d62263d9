use std::collections::BTreeMap;

use crate::records::PointRecord;

/// Records sharing one folder name, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Folder<'a> {
    pub name: &'a str,
    pub records: Vec<&'a PointRecord>,
}

/// Partition records by folder name.
///
/// Folders come out sorted by name (byte order), whatever the row order was.
/// Records without a location still count towards folder membership, so a
/// folder holding only such records exists and renders empty.
pub fn group_by_folder(records: &[PointRecord]) -> Vec<Folder<'_>> {
    let mut folders: BTreeMap<&str, Vec<&PointRecord>> = BTreeMap::new();
    for record in records {
        folders.entry(record.folder.as_str()).or_default().push(record);
    }

    folders
        .into_iter()
        .map(|(name, records)| Folder { name, records })
        .collect()
}
