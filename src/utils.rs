// Copyright (C) 2017 Hove and/or its affiliates.
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, version 3.

// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.

// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>

//! Archive and flat-file helpers shared by the merge engine and the
//! corrective processors.

use crate::{objects::Calendar, tabular::Row, Result};
use anyhow::Context;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Zips the contents of `source_path` into the `zip_file` archive.
pub fn zip_to<P, R>(source_path: P, zip_file: R) -> Result<()>
where
    P: AsRef<Path>,
    R: AsRef<Path>,
{
    let source_path = source_path.as_ref();
    let file = File::create(zip_file.as_ref())?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let mut buffer = Vec::new();
    for entry in WalkDir::new(source_path) {
        let path = entry?.path().to_owned();
        if path.is_file() {
            let name = path.strip_prefix(source_path)?.to_owned();
            if let Some(name) = name.to_str() {
                debug!("adding {:?} as {:?} ...", path, name);
                zip.start_file(name, options)?;
                let mut f = File::open(path)?;

                f.read_to_end(&mut buffer)?;
                zip.write_all(&buffer)?;
                buffer.clear();
            }
        }
    }
    zip.finish()?;
    Ok(())
}

/// Extracts every file of the `archive_path` zip archive into `target_dir`.
///
/// Entries are extracted by file name, wherever they sit in the archive, so
/// feeds zipped with an extra top-level directory work too.
pub fn unzip_to<P, R>(archive_path: P, target_dir: R) -> Result<()>
where
    P: AsRef<Path>,
    R: AsRef<Path>,
{
    let archive_path = archive_path.as_ref();
    let target_dir = target_dir.as_ref();
    let file =
        File::open(archive_path).with_context(|| format!("Error reading {:?}", archive_path))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Error reading {:?}", archive_path))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.is_file() {
            continue;
        }
        let name = match Path::new(entry.name()).file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_owned(),
            None => continue,
        };
        debug!("extracting {:?} as {:?} ...", entry.name(), name);
        let mut output = File::create(target_dir.join(&name))?;
        io::copy(&mut entry, &mut output)?;
    }
    Ok(())
}

/// Reads every row of a flat table file, the header included, without
/// interpreting any of them.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Error reading {:?}", path))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Error reading {:?}", path))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Writes rows to a flat table file, one record per line, without adding
/// or reordering anything.
pub fn write_rows<P: AsRef<Path>>(path: P, rows: &[Row]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Error writing {:?}", path))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("Error writing {:?}", path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Error writing {:?}", path))?;
    Ok(())
}

/// Reads the typed rows of a `calendar.txt` file, skipping rows that
/// cannot be parsed (missing columns, invalid dates) with a warning.
pub fn read_calendars<P: AsRef<Path>>(path: P) -> Result<Vec<Calendar>> {
    let path = path.as_ref();
    info!("Reading {:?}", path);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Error reading {:?}", path))?;
    let mut calendars = Vec::new();
    for calendar in reader.deserialize() {
        match calendar {
            Ok(calendar) => calendars.push(calendar),
            Err(e) => warn!("skipping invalid calendar row: {}", e),
        }
    }
    Ok(calendars)
}
