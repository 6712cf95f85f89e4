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

//! `trips.txt` cleanup: standard columns and headsign casing. Row order
//! is preserved.

use super::{proper_case, recommended, required, restrict_columns, Column};
use crate::report::{CleanupCategory, Report};
use crate::{utils, Result};
use std::path::Path;
use tracing::info;

const COLUMNS: [Column; 10] = [
    required("route_id"),
    required("service_id"),
    required("trip_id"),
    recommended("trip_headsign"),
    recommended("trip_short_name"),
    recommended("direction_id"),
    recommended("block_id"),
    recommended("shape_id"),
    recommended("wheelchair_accessible"),
    recommended("bikes_allowed"),
];

/// Restricts `trips.txt` to its standard columns and proper-cases the
/// headsigns.
pub fn process<P: AsRef<Path>>(dir: P, report: &mut Report<CleanupCategory>) -> Result<()> {
    let path = dir.as_ref().join("trips.txt");
    if !path.is_file() {
        info!("skipping trips cleanup: no trips.txt");
        return Ok(());
    }
    let rows = utils::read_rows(&path)?;
    if rows.is_empty() {
        return Ok(());
    }
    let mut table = restrict_columns("trips.txt", rows, &COLUMNS, report);
    if let Some(pos) = table.column("trip_headsign") {
        for row in &mut table.rows {
            let cased = proper_case(&row[pos]);
            if cased != row[pos] {
                report.add_warning(
                    format!("Trip headsign updated: {} -> {}", row[pos], cased),
                    CleanupCategory::ProperCased,
                );
                row[pos] = cased;
            }
        }
    }
    table.save(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headsigns_are_cased_and_order_preserved() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "trips.txt",
                "route_id,service_id,trip_id,trip_headsign,shape_id\n\
                 R1,WEEK,T2,AIRPORT VIA DOWNTOWN,SH1\n\
                 R1,WEEK,T1,Airport Via Downtown,SH1\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "route_id,service_id,trip_id,trip_headsign,shape_id\n\
                 R1,WEEK,T2,Airport Via Downtown,SH1\n\
                 R1,WEEK,T1,Airport Via Downtown,SH1\n",
                get_file_content(path.join("trips.txt"))
            );
        });
    }
}
