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

//! Single-table cleanup processors.
//!
//! Each processor rewrites one table file of an extracted feed directory
//! in place: unrecognized columns go away, missing standard columns are
//! added empty, and a few field-level fixes are applied. Every change is
//! recorded in the caller's [`Report`](crate::report::Report).

pub mod agency;
pub mod routes;
pub mod stop_times;
pub mod stops;
pub mod trips;

use crate::report::{CleanupCategory, Report};
use crate::tabular::Row;
use crate::{utils, Result};
use std::path::Path;

/// One standard column of a table, in GTFS reference order. Required
/// columns always appear in the output; the others only when the input
/// carried them.
pub(crate) struct Column {
    pub(crate) name: &'static str,
    pub(crate) required: bool,
}

pub(crate) const fn required(name: &'static str) -> Column {
    Column { name, required: true }
}

pub(crate) const fn recommended(name: &'static str) -> Column {
    Column { name, required: false }
}

/// A table re-projected onto its standard columns.
pub(crate) struct Table {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    pub(crate) fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|c| c == name)
    }

    pub(crate) fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.header.clone());
        rows.extend(self.rows.iter().cloned());
        utils::write_rows(path, &rows)
    }
}

/// Re-projects `rows` onto the standard `columns`: unrecognized input
/// columns are dropped and reported, required columns absent from the
/// input are added with empty cells.
pub(crate) fn restrict_columns(
    file_name: &str,
    rows: Vec<Row>,
    columns: &[Column],
    report: &mut Report<CleanupCategory>,
) -> Table {
    let mut rows = rows.into_iter();
    let input_header: Row = rows.next().unwrap_or_default();

    let header: Vec<String> = columns
        .iter()
        .filter(|column| column.required || input_header.iter().any(|c| c == column.name))
        .map(|column| column.name.to_string())
        .collect();
    let removed: Vec<&str> = input_header
        .iter()
        .filter(|c| !header.iter().any(|kept| kept == *c))
        .map(String::as_str)
        .collect();
    if !removed.is_empty() {
        report.add_warning(
            format!("Removed columns from {}: {}", file_name, removed.join(", ")),
            CleanupCategory::UnrecognizedColumnRemoved,
        );
    }

    let rows = rows
        .map(|row| {
            header
                .iter()
                .map(|column| {
                    input_header
                        .iter()
                        .position(|c| c == column)
                        .and_then(|pos| row.get(pos))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Table { header, rows }
}

/// Rewrites a label word by word: first letter upper and the rest lower,
/// single-letter words upper.
pub(crate) fn proper_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) if word.chars().count() > 1 => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                Some(first) => first.to_uppercase().collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn proper_case_word_wise() {
        assert_eq!("Downtown Via Main St", proper_case("DOWNTOWN via MAIN st"));
        assert_eq!("A B", proper_case("a b"));
        assert_eq!("", proper_case(""));
    }

    #[test]
    fn unrecognized_columns_are_removed_and_reported() {
        let columns = [required("stop_id"), required("stop_name"), recommended("stop_code")];
        let mut report = Report::default();
        let table = restrict_columns(
            "stops.txt",
            vec![
                row(&["stop_id", "internal_ref", "stop_name"]),
                row(&["S1", "xyz", "Main St"]),
            ],
            &columns,
            &mut report,
        );
        assert_eq!(vec!["stop_id".to_string(), "stop_name".to_string()], table.header);
        assert_eq!(vec![row(&["S1", "Main St"])], table.rows);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            "Removed columns from stops.txt: internal_ref",
            json["warnings"][0]["message"]
        );
    }

    #[test]
    fn missing_required_columns_are_added_empty() {
        let columns = [required("stop_id"), required("stop_name")];
        let mut report = Report::default();
        let table = restrict_columns(
            "stops.txt",
            vec![row(&["stop_id"]), row(&["S1"])],
            &columns,
            &mut report,
        );
        assert_eq!(vec![row(&["S1", ""])], table.rows);
    }
}
