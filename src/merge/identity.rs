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

//! Per-entity-type collision resolution.
//!
//! Each handler decides, for every incoming record's natural key, whether
//! it is new, a true duplicate, or a colliding-but-different record that
//! must be renamed. Resolution never fails on malformed data: a row whose
//! id cannot be read passes through unmodified, and a missing column
//! disables the table's special handling altogether.

use super::{merged_id, MergeSession, RenameMaps};
use crate::tabular::{Row, TableSet};
use tracing::{debug, info};

/// What the session knows about a service identifier: the md5 fingerprint
/// of its `calendar.txt` row content (when it came from one) and the feed
/// that introduced or last confirmed it.
#[derive(Debug)]
pub(crate) struct KnownService {
    pub(crate) fingerprint: Option<String>,
    pub(crate) feed_index: usize,
}

/// Appends the incoming header when this feed is the table's first
/// contributor, and returns the data rows.
pub(super) fn begin_table(store: &mut TableSet, file_name: &str, rows: Vec<Row>, first: bool) -> Vec<Row> {
    let mut rows = rows.into_iter();
    if let Some(header) = rows.next() {
        if first {
            store.append_row(file_name, header);
        }
    }
    rows.collect()
}

/// Rewrites the field at `pos` through a rename map, when both exist.
pub(super) fn translate(row: &mut Row, pos: Option<usize>, renames: &std::collections::HashMap<String, String>) {
    if let Some(pos) = pos {
        if let Some(new_id) = row.get(pos).and_then(|field| renames.get(field)) {
            row[pos] = new_id.clone();
        }
    }
}

/// md5 digest of a row's content, the id column excluded.
fn service_fingerprint(row: &Row, id_pos: usize) -> String {
    let content = row
        .iter()
        .enumerate()
        .filter(|(pos, _)| *pos != id_pos)
        .map(|(_, field)| field.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("{:x}", md5::compute(content))
}

/// `stops.txt`: stop identity is the `stop_id` plus the exact string
/// representation of its coordinates. Same id with the same lat/lon is a
/// true duplicate (kept once); same id with different lat/lon is a
/// collision (renamed).
pub(crate) fn process_stops(
    session: &mut MergeSession,
    renames: &mut RenameMaps,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
    feed_index: usize,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let id_pos = match session.store.column_index(file_name, "stop_id") {
        Some(pos) => pos,
        None => {
            for row in data_rows {
                session.store.append_row(file_name, row);
            }
            return;
        }
    };
    let lat_pos = session.store.column_index(file_name, "stop_lat");
    let lon_pos = session.store.column_index(file_name, "stop_lon");

    for mut row in data_rows {
        let id = match row.get(id_pos) {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                session.store.append_row(file_name, row);
                continue;
            }
        };
        let lat = lat_pos.and_then(|pos| row.get(pos)).cloned().unwrap_or_default();
        let lon = lon_pos.and_then(|pos| row.get(pos)).cloned().unwrap_or_default();

        match session.known_stops.get(&id) {
            None => {
                session.known_stops.insert(id, (lat, lon));
                session.store.append_row(file_name, row);
            }
            // the first feed is authoritative, its duplicates pass through
            Some(_) if feed_index == 1 => session.store.append_row(file_name, row),
            Some((known_lat, known_lon)) if *known_lat == lat && *known_lon == lon => {
                debug!("stops: dropping duplicate of {}", id);
            }
            Some(_) => {
                let new_id = merged_id(&id, feed_index);
                info!("stops: renaming {} into {}", id, new_id);
                row[id_pos] = new_id.clone();
                session.store.append_row(file_name, row);
                session.known_stops.insert(new_id.clone(), (lat, lon));
                renames.stops.insert(id, new_id);
            }
        }
    }
}

/// `calendar.txt`: service identity is the `service_id` plus the md5
/// fingerprint of the rest of the row. A fingerprint match is a true
/// duplicate: the row is dropped and the known record is re-attributed to
/// the current feed so the same feed's `calendar_dates.txt` resolves
/// against it.
pub(crate) fn process_calendar(
    session: &mut MergeSession,
    renames: &mut RenameMaps,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
    feed_index: usize,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let id_pos = match session.store.column_index(file_name, "service_id") {
        Some(pos) => pos,
        None => {
            for row in data_rows {
                session.store.append_row(file_name, row);
            }
            return;
        }
    };

    for mut row in data_rows {
        let id = match row.get(id_pos) {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                session.store.append_row(file_name, row);
                continue;
            }
        };
        let fingerprint = service_fingerprint(&row, id_pos);
        let known = session
            .known_services
            .get(&id)
            .map(|known| known.fingerprint.clone());
        match known {
            None => {
                session.known_services.insert(
                    id,
                    KnownService {
                        fingerprint: Some(fingerprint),
                        feed_index,
                    },
                );
                session.store.append_row(file_name, row);
            }
            Some(_) if feed_index == 1 => session.store.append_row(file_name, row),
            Some(known_fingerprint) if known_fingerprint.as_deref() == Some(fingerprint.as_str()) => {
                debug!("calendar: dropping duplicate of service {}", id);
                if let Some(known) = session.known_services.get_mut(&id) {
                    known.feed_index = feed_index;
                }
            }
            Some(_) => {
                let new_id = merged_id(&id, feed_index);
                info!("calendar: renaming service {} into {}", id, new_id);
                row[id_pos] = new_id.clone();
                session.store.append_row(file_name, row);
                session.known_services.insert(
                    new_id.clone(),
                    KnownService {
                        fingerprint: Some(fingerprint),
                        feed_index,
                    },
                );
                renames.services.insert(id, new_id);
            }
        }
    }
}

/// `calendar_dates.txt`: consults the service renames decided earlier in
/// the same feed's `calendar.txt` pass before resolving identity on its
/// own (by introducing feed, there is no one-row-per-service content to
/// fingerprint here). Exact duplicate rows are suppressed session-wide,
/// since downstream consumers reject duplicate (service, date) pairs.
pub(crate) fn process_calendar_dates(
    session: &mut MergeSession,
    renames: &mut RenameMaps,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
    feed_index: usize,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let id_pos = match session.store.column_index(file_name, "service_id") {
        Some(pos) => pos,
        None => {
            for row in data_rows {
                session.store.append_row(file_name, row);
            }
            return;
        }
    };

    for mut row in data_rows {
        let id = match row.get(id_pos) {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                session.store.append_row(file_name, row);
                continue;
            }
        };
        if let Some(new_id) = renames.services.get(&id) {
            info!("calendar_dates: updating {} into {}", id, new_id);
            row[id_pos] = new_id.clone();
        } else {
            match session.known_services.get(&id).map(|known| known.feed_index) {
                None => {
                    session.known_services.insert(
                        id,
                        KnownService {
                            fingerprint: None,
                            feed_index,
                        },
                    );
                }
                // a same-feed reference, not a cross-feed collision
                Some(introduced) if introduced == feed_index => {}
                Some(_) => {
                    let new_id = merged_id(&id, feed_index);
                    info!("calendar_dates: renaming service {} into {}", id, new_id);
                    row[id_pos] = new_id.clone();
                    session.known_services.insert(
                        new_id.clone(),
                        KnownService {
                            fingerprint: None,
                            feed_index,
                        },
                    );
                    renames.services.insert(id, new_id);
                }
            }
        }
        if !session.seen_calendar_dates.insert(row.clone()) {
            debug!("calendar_dates: dropping duplicate row");
            continue;
        }
        session.store.append_row(file_name, row);
    }
}

/// `shapes.txt`: a shape naturally spans many rows, so only a `shape_id`
/// introduced by a strictly earlier feed is a collision. Row order is
/// preserved verbatim; the points are geometrically ordered.
pub(crate) fn process_shapes(
    session: &mut MergeSession,
    renames: &mut RenameMaps,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
    feed_index: usize,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let id_pos = match session.store.column_index(file_name, "shape_id") {
        Some(pos) => pos,
        None => {
            for row in data_rows {
                session.store.append_row(file_name, row);
            }
            return;
        }
    };

    for mut row in data_rows {
        let id = match row.get(id_pos) {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                session.store.append_row(file_name, row);
                continue;
            }
        };
        match session.shape_introduced_at.get(&id).copied() {
            None => {
                session.shape_introduced_at.insert(id, feed_index);
                session.store.append_row(file_name, row);
            }
            Some(introduced) if introduced < feed_index => {
                let new_id = merged_id(&id, feed_index);
                info!(
                    "shapes: renaming {} into {} (introduced by feed #{})",
                    id, new_id, introduced
                );
                row[id_pos] = new_id.clone();
                session.store.append_row(file_name, row);
                session.shape_introduced_at.insert(new_id.clone(), feed_index);
                renames.shapes.insert(id, new_id);
            }
            Some(_) => session.store.append_row(file_name, row),
        }
    }
}

/// `routes.txt`: routes are assumed identical across feeds, so a repeated
/// `route_id` is dropped wherever it comes from, never renamed.
pub(crate) fn process_routes(
    session: &mut MergeSession,
    file_name: &str,
    rows: Vec<Row>,
    first: bool,
) {
    let data_rows = begin_table(&mut session.store, file_name, rows, first);
    let id_pos = match session.store.column_index(file_name, "route_id") {
        Some(pos) => pos,
        None => {
            for row in data_rows {
                session.store.append_row(file_name, row);
            }
            return;
        }
    };

    for row in data_rows {
        let id = match row.get(id_pos) {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                session.store.append_row(file_name, row);
                continue;
            }
        };
        if session.seen_route_ids.insert(id.clone()) {
            session.store.append_row(file_name, row);
        } else {
            info!("routes: dropping duplicate of {}", id);
        }
    }
}
