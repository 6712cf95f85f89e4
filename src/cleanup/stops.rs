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

//! `stops.txt` cleanup: standard columns, rows sorted by identifier.

use super::{recommended, required, restrict_columns, Column};
use crate::report::{CleanupCategory, Report};
use crate::{utils, Result};
use std::path::Path;
use tracing::info;

const COLUMNS: [Column; 11] = [
    required("stop_id"),
    recommended("stop_code"),
    required("stop_name"),
    recommended("stop_desc"),
    required("stop_lat"),
    required("stop_lon"),
    recommended("zone_id"),
    recommended("stop_url"),
    recommended("location_type"),
    recommended("parent_station"),
    recommended("wheelchair_boarding"),
];

/// Restricts `stops.txt` to its standard columns and sorts the data rows
/// by `stop_id`.
pub fn process<P: AsRef<Path>>(dir: P, report: &mut Report<CleanupCategory>) -> Result<()> {
    let path = dir.as_ref().join("stops.txt");
    if !path.is_file() {
        info!("skipping stops cleanup: no stops.txt");
        return Ok(());
    }
    let rows = utils::read_rows(&path)?;
    if rows.is_empty() {
        return Ok(());
    }
    let mut table = restrict_columns("stops.txt", rows, &COLUMNS, report);
    if let Some(id_pos) = table.column("stop_id") {
        table.rows.sort_by(|a, b| a[id_pos].cmp(&b[id_pos]));
    }
    table.save(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rows_are_sorted_by_stop_id() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "stops.txt",
                "stop_id,stop_name,stop_lat,stop_lon,stop_code\n\
                 S2,Second,26.1,-80.1,0002\n\
                 S1,First,26.2,-80.2,0001\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "stop_id,stop_code,stop_name,stop_lat,stop_lon\n\
                 S1,0001,First,26.2,-80.2\n\
                 S2,0002,Second,26.1,-80.1\n",
                get_file_content(path.join("stops.txt"))
            );
        });
    }

    #[test]
    fn unrecognized_columns_are_reported() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "stops.txt",
                "stop_id,stop_name,stop_lat,stop_lon,avl_trigger_radius\nS1,Main St,26.1,-80.1,30\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "stop_id,stop_name,stop_lat,stop_lon\nS1,Main St,26.1,-80.1\n",
                get_file_content(path.join("stops.txt"))
            );
            let json = serde_json::to_value(&report).unwrap();
            assert_eq!(
                "Removed columns from stops.txt: avl_trigger_radius",
                json["warnings"][0]["message"]
            );
        });
    }
}
