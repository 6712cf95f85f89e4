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

//! Feed ingestion: extraction, table ordering and dispatch.

use super::{identity, rewrite, FeedMetadata, MergeSession, RenameMaps};
use crate::tabular::Row;
use crate::{utils, Result};
use anyhow::Context;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub(crate) fn load_feed(session: &mut MergeSession, feed_path: &Path, feed_index: usize) -> Result<()> {
    info!("Loading feed #{} from {:?}", feed_index, feed_path);
    let mut metadata = FeedMetadata::capture(feed_path)
        .with_context(|| format!("Error reading {:?}", feed_path))?;
    let result = if feed_path.is_dir() {
        process_tables(session, feed_path, feed_index, &mut metadata)
    } else {
        let input_tmp_dir = tempfile::tempdir()?;
        match utils::unzip_to(feed_path, input_tmp_dir.path()) {
            Ok(()) => process_tables(session, input_tmp_dir.path(), feed_index, &mut metadata),
            Err(e) => Err(e),
        }
    };
    // the feed appears in the audit log even when its tables failed
    session.feeds.push(metadata);
    result
}

/// Dependencies flow from identity tables to referencing tables, so
/// resolution order is fixed: stops, then the two calendar files, then
/// shapes before trips before stop_times, then routes. The remaining
/// files sort alphabetically after those.
fn table_order(file_name: &str) -> usize {
    match file_name {
        "stops.txt" => 0,
        "calendar.txt" => 1,
        "calendar_dates.txt" => 2,
        "shapes.txt" => 3,
        "trips.txt" => 4,
        "stop_times.txt" => 5,
        "routes.txt" => 6,
        _ => 7,
    }
}

fn process_tables(
    session: &mut MergeSession,
    dir: &Path,
    feed_index: usize,
    metadata: &mut FeedMetadata,
) -> Result<()> {
    let mut table_paths: Vec<(String, PathBuf)> = std::fs::read_dir(dir)
        .with_context(|| format!("Error reading {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new("txt")))
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_lowercase();
            Some((name, path))
        })
        .collect();
    table_paths.sort_by(|(a, _), (b, _)| table_order(a).cmp(&table_order(b)).then(a.cmp(b)));

    let mut renames = RenameMaps::default();
    for (file_name, path) in table_paths {
        metadata.add_table_file(&path)?;
        let rows = utils::read_rows(&path)?;
        debug!("feed #{}: merging {} ({} rows)", feed_index, file_name, rows.len());
        let first = session.store.is_empty_table(&file_name);
        match file_name.as_str() {
            "agency.txt" | "feed_info.txt" => keep_first_feed(session, &file_name, rows, first),
            "stops.txt" => {
                identity::process_stops(session, &mut renames, &file_name, rows, first, feed_index)
            }
            "calendar.txt" => {
                identity::process_calendar(session, &mut renames, &file_name, rows, first, feed_index)
            }
            "calendar_dates.txt" => identity::process_calendar_dates(
                session,
                &mut renames,
                &file_name,
                rows,
                first,
                feed_index,
            ),
            "shapes.txt" => {
                identity::process_shapes(session, &mut renames, &file_name, rows, first, feed_index)
            }
            "trips.txt" => {
                rewrite::process_trips(session, &mut renames, &file_name, rows, first, feed_index)
            }
            "stop_times.txt" => {
                rewrite::process_stop_times(session, &renames, &file_name, rows, first)
            }
            "routes.txt" => identity::process_routes(session, &file_name, rows, first),
            _ => append_fallback(session, &file_name, rows, first),
        }
    }
    Ok(())
}

/// `agency.txt` and `feed_info.txt` describe the publisher, not the
/// network: the merged feed keeps exactly one record, the first feed's.
fn keep_first_feed(session: &mut MergeSession, file_name: &str, rows: Vec<Row>, first: bool) {
    if !first {
        debug!("{}: keeping the first feed's record", file_name);
        return;
    }
    for row in rows.into_iter().take(2) {
        session.store.append_row(file_name, row);
    }
}

/// Tables without identity handling are concatenated as they come.
fn append_fallback(session: &mut MergeSession, file_name: &str, rows: Vec<Row>, first: bool) {
    let skip = usize::from(!first);
    for row in rows.into_iter().skip(skip) {
        session.store.append_row(file_name, row);
    }
}
