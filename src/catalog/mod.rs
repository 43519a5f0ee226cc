use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One input catalog entry. Extra CSV columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl CatalogRow {
    pub fn new(
        id: impl Into<String>,
        item_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            item_type: item_type.into(),
            url: url.into(),
        }
    }

    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// A catalog entry with its blue shade summary. `rgb_color` is empty when the
/// row had no URL, the image could not be fetched, or no blue was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentedRow {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub rgb_color: String,
}

impl AugmentedRow {
    pub fn new(row: CatalogRow, rgb_color: impl Into<String>) -> Self {
        Self {
            id: row.id,
            item_type: row.item_type,
            url: row.url,
            rgb_color: rgb_color.into(),
        }
    }

    pub fn without_color(row: CatalogRow) -> Self {
        Self::new(row, String::new())
    }
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<CatalogRow>, CatalogError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize::<CatalogRow>() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn write_rows<W: Write>(writer: W, rows: &[AugmentedRow]) -> Result<(), CatalogError> {
    let mut writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        writer.write_record(["id", "type", "URL", "rgb_color"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<CatalogRow>, CatalogError> {
    read_rows(File::open(path)?)
}

pub fn write_csv(path: &Path, rows: &[AugmentedRow]) -> Result<(), CatalogError> {
    write_rows(File::create(path)?, rows)
}
