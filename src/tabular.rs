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

//! In-memory tabular storage backing the merge engine.

use std::collections::BTreeMap;

/// An ordered sequence of string fields; position is meaningful only
/// through the owning table's header.
pub type Row = Vec<String>;

/// Error raised when a table is queried before any row was stored.
#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    /// The table has no rows yet, so it has no header either.
    #[error("table '{0}' has no rows")]
    NoHeader(String),
}

/// Mapping from table name (e.g. `stops.txt`) to its ordered rows, the
/// first row being the header. Row insertion order is the output order and
/// is never reordered; shapes and stop_times correctness depend on it.
#[derive(Debug, Default)]
pub struct TableSet {
    tables: BTreeMap<String, Vec<Row>>,
}

impl TableSet {
    /// Returns the rows of `name`, creating an empty table if absent.
    pub fn ensure_table(&mut self, name: &str) -> &mut Vec<Row> {
        self.tables.entry(name.to_string()).or_default()
    }

    /// Appends `row` at the end of `name`, creating the table if absent.
    pub fn append_row(&mut self, name: &str, row: Row) {
        self.ensure_table(name).push(row);
    }

    /// Returns the header (row zero) of `name`.
    pub fn header(&self, name: &str) -> Result<&Row, TabularError> {
        self.tables
            .get(name)
            .and_then(|rows| rows.first())
            .ok_or_else(|| TabularError::NoHeader(name.to_string()))
    }

    /// Returns the position of `column` in the accumulated header of
    /// `name`. `None` covers an absent table, an absent header and an
    /// absent column alike; callers must degrade to passing the affected
    /// fields through untouched.
    pub fn column_index(&self, name: &str, column: &str) -> Option<usize> {
        self.tables
            .get(name)?
            .first()?
            .iter()
            .position(|c| c == column)
    }

    /// Returns the rows of `name`, if the table exists.
    pub fn rows(&self, name: &str) -> Option<&[Row]> {
        self.tables.get(name).map(|rows| rows.as_slice())
    }

    /// `true` when `name` holds no rows yet (including when the table was
    /// never created).
    pub fn is_empty_table(&self, name: &str) -> bool {
        self.tables.get(name).map_or(true, |rows| rows.is_empty())
    }

    /// Iterates over `(name, rows)` pairs in table-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables.iter().map(|(n, r)| (n.as_str(), r.as_slice()))
    }
}
