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

//! Dependent tables: trips and stop_times reference the identities
//! resolved before them and consume the feed's rename maps.

use super::identity::{begin_table, translate};
use super::{merged_id, MergeSession, RenameMaps};
use crate::tabular::Row;
use tracing::info;

/// `trips.txt`: rewrites `service_id` and `shape_id` through the feed's
/// rename maps, then resolves the trip's own identity. Trips carry no
/// comparable content, so any reuse of a `trip_id` by a later feed is
/// treated as a collision and renamed.
pub(crate) fn process_trips(
    session: &mut MergeSession,
    renames: &mut RenameMaps,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
    feed_index: usize,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let trip_pos = session.store.column_index(file_name, "trip_id");
    let service_pos = session.store.column_index(file_name, "service_id");
    let shape_pos = session.store.column_index(file_name, "shape_id");

    for mut row in data_rows {
        translate(&mut row, service_pos, &renames.services);
        translate(&mut row, shape_pos, &renames.shapes);
        if let Some(pos) = trip_pos {
            let id = row.get(pos).filter(|id| !id.is_empty()).cloned();
            if let Some(id) = id {
                if !session.seen_trip_ids.insert(id.clone()) && feed_index > 1 {
                    let new_id = merged_id(&id, feed_index);
                    info!("trips: renaming {} into {}", id, new_id);
                    row[pos] = new_id.clone();
                    session.seen_trip_ids.insert(new_id.clone());
                    renames.trips.insert(id, new_id);
                }
            }
        }
        session.store.append_row(file_name, row);
    }
}

/// `stop_times.txt`: pure reference rewriting, no identity of its own.
/// Every row is kept, in order, with `trip_id` and `stop_id` translated
/// through the feed's rename maps.
pub(crate) fn process_stop_times(
    session: &mut MergeSession,
    renames: &RenameMaps,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let trip_pos = session.store.column_index(file_name, "trip_id");
    let stop_pos = session.store.column_index(file_name, "stop_id");

    for mut row in data_rows {
        translate(&mut row, trip_pos, &renames.trips);
        translate(&mut row, stop_pos, &renames.stops);
        session.store.append_row(file_name, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn rows(rows: &[&[&str]]) -> Vec<Row> {
        rows.iter().map(|fields| row(fields)).collect()
    }

    #[test]
    fn reused_trip_id_is_renamed_in_later_feeds() {
        let header = &["trip_id", "service_id"];
        let mut session = MergeSession::new();
        let mut renames = RenameMaps::default();
        process_trips(
            &mut session,
            &mut renames,
            "trips.txt",
            rows(&[header, &["T1", "WEEK"]]),
            true,
            1,
        );
        let mut renames = RenameMaps::default();
        process_trips(
            &mut session,
            &mut renames,
            "trips.txt",
            rows(&[header, &["T1", "WEEK"]]),
            false,
            2,
        );
        let stored = session.store.rows("trips.txt").unwrap();
        assert_eq!(row(&["T1_Merged_2", "WEEK"]), stored[2]);
        assert_eq!(Some(&"T1_Merged_2".to_string()), renames.trips.get("T1"));
    }

    #[test]
    fn duplicate_trip_in_first_feed_is_kept_verbatim() {
        let header = &["trip_id"];
        let mut session = MergeSession::new();
        let mut renames = RenameMaps::default();
        process_trips(
            &mut session,
            &mut renames,
            "trips.txt",
            rows(&[header, &["T1"], &["T1"]]),
            true,
            1,
        );
        let stored = session.store.rows("trips.txt").unwrap();
        assert_eq!(row(&["T1"]), stored[1]);
        assert_eq!(row(&["T1"]), stored[2]);
        assert!(renames.trips.is_empty());
    }

    #[test]
    fn trips_follow_service_and_shape_renames() {
        let header = &["trip_id", "service_id", "shape_id"];
        let mut session = MergeSession::new();
        let mut renames = RenameMaps::default();
        renames
            .services
            .insert("WEEK".to_string(), "WEEK_Merged_2".to_string());
        renames
            .shapes
            .insert("SH".to_string(), "SH_Merged_2".to_string());
        process_trips(
            &mut session,
            &mut renames,
            "trips.txt",
            rows(&[header, &["T1", "WEEK", "SH"], &["T2", "OTHER", ""]]),
            true,
            2,
        );
        let stored = session.store.rows("trips.txt").unwrap();
        assert_eq!(row(&["T1", "WEEK_Merged_2", "SH_Merged_2"]), stored[1]);
        assert_eq!(row(&["T2", "OTHER", ""]), stored[2]);
    }

    #[test]
    fn stop_times_follow_trip_and_stop_renames() {
        let header = &["trip_id", "stop_id", "stop_sequence"];
        let mut session = MergeSession::new();
        let mut renames = RenameMaps::default();
        renames
            .trips
            .insert("T1".to_string(), "T1_Merged_2".to_string());
        renames
            .stops
            .insert("S1".to_string(), "S1_Merged_2".to_string());
        process_stop_times(
            &mut session,
            &renames,
            "stop_times.txt",
            rows(&[header, &["T1", "S1", "1"], &["T1", "S2", "2"]]),
            true,
        );
        let stored = session.store.rows("stop_times.txt").unwrap();
        assert_eq!(row(&["T1_Merged_2", "S1_Merged_2", "1"]), stored[1]);
        assert_eq!(row(&["T1_Merged_2", "S2", "2"]), stored[2]);
    }

    #[test]
    fn stop_times_without_trip_column_pass_through() {
        let mut session = MergeSession::new();
        let renames = RenameMaps::default();
        process_stop_times(
            &mut session,
            &renames,
            "stop_times.txt",
            rows(&[&["stop_id"], &["S1"]]),
            true,
        );
        assert_eq!(2, session.store.rows("stop_times.txt").unwrap().len());
    }
}
