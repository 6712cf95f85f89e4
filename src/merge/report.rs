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

//! Provenance records of the loaded feeds and the `merge_log.txt` report
//! built from them.

use super::MERGE_LOG_FILE;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

fn format_timestamp(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok()
        .map(|time| DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Filesystem metadata of one table file found inside a feed.
#[derive(Debug)]
pub struct TableFileMetadata {
    /// File name inside the feed, e.g. `stops.txt`
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation timestamp, when the platform records one
    pub created: Option<String>,
    /// Last modification timestamp, when the platform records one
    pub modified: Option<String>,
}

/// Filesystem metadata of one loaded feed and of the table files it
/// contained, in processing order.
#[derive(Debug)]
pub struct FeedMetadata {
    /// Path of the feed as given to the loader
    pub path: PathBuf,
    /// Size in bytes (of the archive, or of the directory entry)
    pub size: u64,
    /// Creation timestamp, when the platform records one
    pub created: Option<String>,
    /// Last modification timestamp, when the platform records one
    pub modified: Option<String>,
    /// The table files processed from this feed
    pub table_files: Vec<TableFileMetadata>,
}

impl FeedMetadata {
    pub(crate) fn capture(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            created: format_timestamp(metadata.created()),
            modified: format_timestamp(metadata.modified()),
            table_files: Vec::new(),
        })
    }

    pub(crate) fn add_table_file(&mut self, path: &Path) -> Result<()> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Error reading {:?}", path))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.table_files.push(TableFileMetadata {
            name,
            size: metadata.len(),
            created: format_timestamp(metadata.created()),
            modified: format_timestamp(metadata.modified()),
        });
        Ok(())
    }
}

fn unavailable(timestamp: &Option<String>) -> &str {
    timestamp.as_deref().unwrap_or("unavailable")
}

/// Writes the `merge_log.txt` audit report into `out_dir`.
pub(crate) fn write_audit_log(
    feeds: &[FeedMetadata],
    out_dir: &Path,
    generated_at: &str,
) -> Result<()> {
    let log_path = out_dir.join(MERGE_LOG_FILE);
    info!("Writing {:?}", log_path);
    let mut log = String::new();
    writeln!(log, "GTFS Merge Log")?;
    writeln!(log, "Generated on {}", generated_at)?;
    writeln!(log, "================================================\n")?;
    for feed in feeds {
        writeln!(log, "Feed: {}", feed.path.display())?;
        writeln!(log, "   Size:    {} bytes", feed.size)?;
        writeln!(log, "   Created: {}", unavailable(&feed.created))?;
        writeln!(log, "   Modified:{}", unavailable(&feed.modified))?;
        writeln!(log, "   Contains {} file(s) unzipped:\n", feed.table_files.len())?;
        for table_file in &feed.table_files {
            writeln!(log, "     - {}", table_file.name)?;
            writeln!(log, "        Size:    {} bytes", table_file.size)?;
            writeln!(log, "        Created: {}", unavailable(&table_file.created))?;
            writeln!(log, "        Modified:{}\n", unavailable(&table_file.modified))?;
        }
        writeln!(log, "------------------------------------------------\n")?;
    }
    std::fs::write(&log_path, log).with_context(|| format!("Error writing {:?}", log_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn audit_log_lists_each_feed_and_its_files() {
        test_in_tmp_dir(|path| {
            let feed = path.join("feed");
            std::fs::create_dir(&feed).unwrap();
            create_file_with_content(&feed, "stops.txt", "stop_id\nS1\n");

            let mut metadata = FeedMetadata::capture(&feed).unwrap();
            metadata.add_table_file(&feed.join("stops.txt")).unwrap();
            write_audit_log(&[metadata], path, "2024-01-01 00:00:00").unwrap();

            let log = get_file_content(path.join(MERGE_LOG_FILE));
            assert!(log.starts_with("GTFS Merge Log\nGenerated on 2024-01-01 00:00:00\n"));
            assert!(log.contains("Contains 1 file(s) unzipped:"));
            assert!(log.contains("     - stops.txt"));
            assert!(log.contains("        Size:    11 bytes"));
        });
    }

    #[test]
    fn capture_of_missing_path_fails() {
        test_in_tmp_dir(|path| {
            assert!(FeedMetadata::capture(&path.join("nope.zip")).is_err());
        });
    }
}
