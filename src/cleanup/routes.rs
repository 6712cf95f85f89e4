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

//! `routes.txt` cleanup: standard columns, agency attribution and label
//! casing.

use super::{proper_case, recommended, required, restrict_columns, Column};
use crate::report::{CleanupCategory, Report};
use crate::{utils, Result};
use std::path::Path;
use tracing::info;

const COLUMNS: [Column; 10] = [
    required("route_id"),
    required("agency_id"),
    required("route_short_name"),
    required("route_long_name"),
    recommended("route_desc"),
    required("route_type"),
    recommended("route_url"),
    recommended("route_color"),
    recommended("route_text_color"),
    recommended("route_sort_order"),
];

/// Restricts `routes.txt` to its standard columns, attributes
/// agency-less routes to the feed's first agency and proper-cases the
/// long names.
pub fn process<P: AsRef<Path>>(dir: P, report: &mut Report<CleanupCategory>) -> Result<()> {
    let dir = dir.as_ref();
    let path = dir.join("routes.txt");
    if !path.is_file() {
        info!("skipping routes cleanup: no routes.txt");
        return Ok(());
    }
    let rows = utils::read_rows(&path)?;
    if rows.is_empty() {
        return Ok(());
    }
    let default_agency_id = first_agency_id(dir)?;
    let mut table = restrict_columns("routes.txt", rows, &COLUMNS, report);
    let agency_pos = table.column("agency_id");
    let long_name_pos = table.column("route_long_name");

    for row in &mut table.rows {
        if let Some(pos) = agency_pos {
            if row[pos].is_empty() {
                report.add_warning(
                    format!("Filled empty agency_id with {}", default_agency_id),
                    CleanupCategory::ValueFilled,
                );
                row[pos] = default_agency_id.clone();
            }
        }
        if let Some(pos) = long_name_pos {
            let cased = proper_case(&row[pos]);
            if cased != row[pos] {
                report.add_warning(
                    format!("Route long name updated: {} -> {}", row[pos], cased),
                    CleanupCategory::ProperCased,
                );
                row[pos] = cased;
            }
        }
    }
    table.save(&path)
}

/// The `agency_id` of the feed's first agency, `UNKNOWN` when none is
/// usable.
fn first_agency_id(dir: &Path) -> Result<String> {
    let path = dir.join("agency.txt");
    if !path.is_file() {
        return Ok("UNKNOWN".to_string());
    }
    let rows = utils::read_rows(&path)?;
    let id = rows
        .first()
        .and_then(|header| header.iter().position(|c| c == "agency_id"))
        .and_then(|pos| rows.get(1).and_then(|row| row.get(pos)))
        .filter(|id| !id.is_empty())
        .cloned();
    Ok(id.unwrap_or_else(|| "UNKNOWN".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_agency_is_filled_and_long_name_cased() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "agency.txt",
                "agency_id,agency_name\nBCT,Broward County Transit\n",
            );
            create_file_with_content(
                path,
                "routes.txt",
                "route_id,agency_id,route_short_name,route_long_name,route_type\n\
                 R1,,1,UNIVERSITY DRIVE,3\n\
                 R2,OTHER,2,Main Street,3\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "route_id,agency_id,route_short_name,route_long_name,route_type\n\
                 R1,BCT,1,University Drive,3\n\
                 R2,OTHER,2,Main Street,3\n",
                get_file_content(path.join("routes.txt"))
            );
        });
    }

    #[test]
    fn missing_agency_file_falls_back_to_unknown() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "routes.txt",
                "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,,1,Airport,3\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,UNKNOWN,1,Airport,3\n",
                get_file_content(path.join("routes.txt"))
            );
        });
    }

    #[test]
    fn unrecognized_columns_are_dropped() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "routes.txt",
                "route_id,agency_id,route_short_name,route_long_name,route_type,internal\n\
                 R1,A,1,Airport,3,x\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,A,1,Airport,3\n",
                get_file_content(path.join("routes.txt"))
            );
        });
    }
}
