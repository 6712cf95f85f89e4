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

//! The multi-feed merge engine.
//!
//! A [`MergeSession`] accumulates any number of GTFS feeds, loaded one at
//! a time in caller-supplied order, into a single in-memory
//! [`TableSet`](crate::tabular::TableSet). Identifier collisions between
//! feeds are resolved per entity type: a colliding-but-different record
//! gets the deterministic `<id>_Merged_<feedIndex>` suffix and every
//! reference to it from the same feed's dependent tables is rewritten,
//! while a true duplicate is kept once. The accumulated tables are then
//! written back to flat files and packaged into a distributable archive.

mod identity;
mod loader;
mod report;
mod rewrite;
mod writer;

pub use report::{FeedMetadata, TableFileMetadata};

use crate::{tabular::TableSet, Result};
use identity::KnownService;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// The canonical GTFS table files kept in a packaged merged feed.
pub const CANONICAL_FILES: [&str; 9] = [
    "agency.txt",
    "calendar.txt",
    "calendar_dates.txt",
    "feed_info.txt",
    "routes.txt",
    "shapes.txt",
    "stop_times.txt",
    "stops.txt",
    "trips.txt",
];

/// Name of the audit report written next to the merged tables.
pub const MERGE_LOG_FILE: &str = "merge_log.txt";

/// Identifier rename maps of the feed currently being loaded.
///
/// They are created empty at the start of each feed's load, consumed by
/// the dependent-table rewrites of the same feed, and dropped at its end:
/// a rename decided for one feed never leaks into the resolution of the
/// next one.
#[derive(Debug, Default)]
pub(crate) struct RenameMaps {
    pub(crate) stops: HashMap<String, String>,
    pub(crate) services: HashMap<String, String>,
    pub(crate) shapes: HashMap<String, String>,
    pub(crate) trips: HashMap<String, String>,
}

/// State of one whole merge run.
///
/// Owns the accumulated tables, the session-wide identity maps and the
/// per-feed audit records. Feeds must be loaded strictly sequentially;
/// this sequencing is what makes "introduced in an earlier feed" and
/// "the first feed is authoritative" well defined.
#[derive(Debug, Default)]
pub struct MergeSession {
    pub(crate) store: TableSet,
    /// stop_id -> (stop_lat, stop_lon) as raw strings
    pub(crate) known_stops: HashMap<String, (String, String)>,
    /// service_id -> content fingerprint and introducing/confirming feed
    pub(crate) known_services: HashMap<String, KnownService>,
    /// shape_id -> feed index that introduced it
    pub(crate) shape_introduced_at: HashMap<String, usize>,
    pub(crate) seen_trip_ids: HashSet<String>,
    pub(crate) seen_route_ids: HashSet<String>,
    /// calendar_dates rows already appended, for session-wide deduplication
    pub(crate) seen_calendar_dates: HashSet<crate::tabular::Row>,
    pub(crate) feeds: Vec<FeedMetadata>,
}

impl MergeSession {
    /// Creates an empty merge session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads one feed (a zip archive or an already-extracted directory)
    /// into the session, resolving identifier collisions against every
    /// feed loaded before it. `feed_index` is 1-based and must follow the
    /// load order.
    ///
    /// A missing, unreadable or corrupt archive fails the whole load; no
    /// partial data of such a feed is merged.
    pub fn load_feed<P: AsRef<Path>>(&mut self, feed_path: P, feed_index: usize) -> Result<()> {
        loader::load_feed(self, feed_path.as_ref(), feed_index)
    }

    /// Writes every accumulated table to a same-named flat file in
    /// `out_dir`, in insertion order, header row first.
    pub fn write<P: AsRef<Path>>(&self, out_dir: P) -> Result<()> {
        writer::write(&self.store, out_dir.as_ref())
    }

    /// Writes the human-readable audit report (`merge_log.txt`) listing
    /// the metadata of every loaded feed and of the table files each one
    /// contained.
    pub fn audit_log<P: AsRef<Path>>(&self, out_dir: P, generated_at: &str) -> Result<()> {
        report::write_audit_log(&self.feeds, out_dir.as_ref(), generated_at)
    }

    /// Packages the canonical table files of `out_dir` into a fresh zip
    /// archive, then removes the loose files from `out_dir`, keeping only
    /// the audit log and the archive itself.
    pub fn package<P: AsRef<Path>, R: AsRef<Path>>(&self, out_dir: P, zip_path: R) -> Result<()> {
        writer::package(out_dir.as_ref(), zip_path.as_ref())
    }

    /// The accumulated tables.
    pub fn store(&self) -> &TableSet {
        &self.store
    }

    /// Metadata of the feeds loaded so far, in load order.
    pub fn feeds(&self) -> &[FeedMetadata] {
        &self.feeds
    }
}

/// The deterministic identifier given to the colliding record of a feed.
pub(crate) fn merged_id(id: &str, feed_index: usize) -> String {
    format!("{}_Merged_{}", id, feed_index)
}
