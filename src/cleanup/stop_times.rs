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

//! `stop_times.txt` cleanup: standard columns, distance de-duplication
//! and removal of an all-empty `timepoint` column. Row order is
//! preserved.

use super::{recommended, required, restrict_columns, Column, Table};
use crate::report::{CleanupCategory, Report};
use crate::{utils, Result};
use std::path::Path;
use tracing::info;

/// Roughly 1.12 meters expressed in miles; the smallest nudge that keeps
/// consecutive distances strictly increasing for downstream consumers.
const DISTANCE_NUDGE: f64 = 0.000696221;

const COLUMNS: [Column; 10] = [
    required("trip_id"),
    required("arrival_time"),
    required("departure_time"),
    required("stop_id"),
    required("stop_sequence"),
    recommended("stop_headsign"),
    recommended("pickup_type"),
    recommended("drop_off_type"),
    recommended("shape_dist_traveled"),
    recommended("timepoint"),
];

/// Restricts `stop_times.txt` to its standard columns, nudges repeated
/// `shape_dist_traveled` values apart and drops an all-empty `timepoint`
/// column.
pub fn process<P: AsRef<Path>>(dir: P, report: &mut Report<CleanupCategory>) -> Result<()> {
    let path = dir.as_ref().join("stop_times.txt");
    if !path.is_file() {
        info!("skipping stop_times cleanup: no stop_times.txt");
        return Ok(());
    }
    let rows = utils::read_rows(&path)?;
    if rows.is_empty() {
        return Ok(());
    }
    let mut table = restrict_columns("stop_times.txt", rows, &COLUMNS, report);
    adjust_repeated_distances(&mut table, report);
    drop_empty_timepoint(&mut table, report);
    table.save(&path)
}

/// A stop_time repeating its predecessor's distance (same trip) gets the
/// predecessor's value plus [`DISTANCE_NUDGE`], formatted to 6 decimals.
fn adjust_repeated_distances(table: &mut Table, report: &mut Report<CleanupCategory>) {
    let (trip_pos, distance_pos) = match (table.column("trip_id"), table.column("shape_dist_traveled")) {
        (Some(trip_pos), Some(distance_pos)) => (trip_pos, distance_pos),
        _ => return,
    };
    let sequence_pos = table.column("stop_sequence");
    for i in 1..table.rows.len() {
        if table.rows[i][trip_pos] != table.rows[i - 1][trip_pos] {
            continue;
        }
        let previous = &table.rows[i - 1][distance_pos];
        let current = &table.rows[i][distance_pos];
        if previous.is_empty() || current.is_empty() {
            continue;
        }
        let previous: f64 = match previous.parse() {
            Ok(value) => value,
            Err(_) => continue,
        };
        let current: f64 = match current.parse() {
            Ok(value) => value,
            Err(_) => continue,
        };
        #[allow(clippy::float_cmp)]
        if current == previous {
            let nudged = format!("{:.6}", previous + DISTANCE_NUDGE);
            let sequence = sequence_pos.map(|pos| table.rows[i][pos].as_str()).unwrap_or("?");
            report.add_warning(
                format!(
                    "Adjusted shape_dist_traveled of trip {} at sequence {}: {} -> {}",
                    table.rows[i][trip_pos], sequence, current, nudged
                ),
                CleanupCategory::DistanceAdjusted,
            );
            table.rows[i][distance_pos] = nudged;
        }
    }
}

fn drop_empty_timepoint(table: &mut Table, report: &mut Report<CleanupCategory>) {
    let pos = match table.column("timepoint") {
        Some(pos) => pos,
        None => return,
    };
    if table.rows.iter().any(|row| !row[pos].is_empty()) {
        return;
    }
    report.add_warning(
        "Removed 'timepoint' column from stop_times.txt as it is empty".to_string(),
        CleanupCategory::EmptyColumnRemoved,
    );
    table.header.remove(pos);
    for row in &mut table.rows {
        row.remove(pos);
    }
}
