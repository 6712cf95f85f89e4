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

//! The `gtfs_mend` crate cleans and merges [GTFS](https://gtfs.org/)
//! datasets. It can merge several independently produced feeds into a
//! single consistent feed, resolving identifier collisions while
//! preserving the references between tables, and it can apply corrective
//! single-table processing (column normalization, feed_info synthesis,
//! shape/trip distance discrepancy detection, calendar-exception
//! injection) to a feed before redistribution.

#![deny(missing_docs)]

pub mod calendar_exceptions;
pub mod cleanup;
pub mod configuration;
pub mod discrepancy;
pub mod feed_info;
pub mod merge;
pub mod objects;
pub mod report;
pub(crate) mod serde_utils;
pub mod tabular;
#[doc(hidden)]
pub mod test_utils;
pub mod utils;
mod version_utils;

pub use crate::version_utils::binary_full_version;

lazy_static::lazy_static! {
    /// Current datetime
    pub static ref CURRENT_DATETIME: String = chrono::Local::now().format("%FT%T").to_string();
}

/// The error type used by the crate.
pub type Error = anyhow::Error;

/// The corresponding result type used by the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
