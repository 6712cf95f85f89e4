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

//! `agency.txt` cleanup: standard columns and guaranteed identifiers.

use super::{recommended, required, restrict_columns, Column};
use crate::report::{CleanupCategory, Report};
use crate::{utils, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

const COLUMNS: [Column; 8] = [
    // agency_id is optional in the reference but every agency gets one here
    required("agency_id"),
    required("agency_name"),
    required("agency_url"),
    required("agency_timezone"),
    recommended("agency_lang"),
    recommended("agency_phone"),
    recommended("agency_fare_url"),
    recommended("agency_email"),
];

/// Restricts `agency.txt` to its standard columns and generates an
/// acronym identifier for every agency without one.
pub fn process<P: AsRef<Path>>(dir: P, report: &mut Report<CleanupCategory>) -> Result<()> {
    let path = dir.as_ref().join("agency.txt");
    if !path.is_file() {
        info!("skipping agency cleanup: no agency.txt");
        return Ok(());
    }
    let rows = utils::read_rows(&path)?;
    if rows.is_empty() {
        return Ok(());
    }
    let mut table = restrict_columns("agency.txt", rows, &COLUMNS, report);
    let id_pos = table.column("agency_id").unwrap_or(0);
    let name_pos = table.column("agency_name");

    let mut existing_ids: HashSet<String> = table
        .rows
        .iter()
        .filter_map(|row| row.get(id_pos))
        .filter(|id| !id.is_empty())
        .cloned()
        .collect();
    for row in &mut table.rows {
        if !row[id_pos].is_empty() {
            continue;
        }
        let name = name_pos.and_then(|pos| row.get(pos)).cloned().unwrap_or_default();
        let id = generate_agency_id(&name, &existing_ids);
        report.add_warning(
            format!("Generated agency_id {} for agency {}", id, name),
            CleanupCategory::IdentifierGenerated,
        );
        existing_ids.insert(id.clone());
        row[id_pos] = id;
    }
    table.save(&path)
}

/// Acronym of the name's space/hyphen-separated words, with a numeric
/// suffix when already taken.
fn generate_agency_id(agency_name: &str, existing_ids: &HashSet<String>) -> String {
    let base: String = agency_name
        .split([' ', '-'])
        .filter_map(|word| word.chars().next())
        .collect::<String>()
        .to_uppercase();
    let mut id = base.clone();
    let mut suffix = 1;
    while existing_ids.contains(&id) {
        id = format!("{}{}", base, suffix);
        suffix += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn acronym_from_spaces_and_hyphens() {
        let ids = HashSet::new();
        assert_eq!("BCT", generate_agency_id("Broward County-Transit", &ids));
    }

    #[test]
    fn acronym_gets_numeric_suffix_until_unique() {
        let mut ids = HashSet::new();
        ids.insert("BCT".to_string());
        ids.insert("BCT1".to_string());
        assert_eq!("BCT2", generate_agency_id("Broward County Transit", &ids));
    }

    #[test]
    fn missing_ids_are_generated_and_columns_cleaned() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "agency.txt",
                "agency_name,agency_url,agency_timezone,internal_code\n\
                 Broward County Transit,https://bct.example,America/New_York,77\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "agency_id,agency_name,agency_url,agency_timezone\n\
                 BCT,Broward County Transit,https://bct.example,America/New_York\n",
                get_file_content(path.join("agency.txt"))
            );
        });
    }

    #[test]
    fn existing_ids_are_kept() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "agency.txt",
                "agency_id,agency_name,agency_url,agency_timezone\n\
                 A7,Some Agency,https://a.example,UTC\n",
            );
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert_eq!(
                "agency_id,agency_name,agency_url,agency_timezone\n\
                 A7,Some Agency,https://a.example,UTC\n",
                get_file_content(path.join("agency.txt"))
            );
        });
    }

    #[test]
    fn absent_file_is_skipped() {
        test_in_tmp_dir(|path| {
            let mut report = Report::default();
            process(path, &mut report).unwrap();
            assert!(!path.join("agency.txt").exists());
        });
    }
}
