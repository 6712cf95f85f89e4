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

//! Detection of trips whose travelled distance exceeds their shape.
//!
//! For each trip, the last stop_time (by `stop_sequence`) is compared
//! with the last point of the trip's shape (by `shape_pt_sequence`). A
//! stop further along than the shape's end means the shape was cut short
//! or the distances were entered against the wrong geometry; the trip is
//! reported to `discrepancies.txt` together with the haversine distance
//! between the two end points.

use crate::serde_utils::de_with_empty_default;
use crate::{utils, Result};
use anyhow::Context;
use geo::{HaversineDistance, Point};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Name of the report file written next to the feed's tables.
pub const DISCREPANCY_FILE: &str = "discrepancies.txt";

#[derive(Debug, Deserialize)]
struct Stop {
    stop_id: String,
    stop_lat: f64,
    stop_lon: f64,
}

#[derive(Debug, Deserialize)]
struct StopTime {
    trip_id: String,
    stop_id: String,
    stop_sequence: u32,
    #[serde(default, deserialize_with = "de_with_empty_default")]
    shape_dist_traveled: f64,
}

#[derive(Debug, Deserialize)]
struct ShapePoint {
    shape_id: String,
    shape_pt_lat: f64,
    shape_pt_lon: f64,
    shape_pt_sequence: u32,
    #[serde(default, deserialize_with = "de_with_empty_default")]
    shape_dist_traveled: f64,
}

#[derive(Debug, Deserialize)]
struct Trip {
    trip_id: String,
    #[serde(default)]
    shape_id: String,
}

/// One detected discrepancy, serialized as a `discrepancies.txt` row.
#[derive(Debug, Serialize)]
struct Discrepancy {
    trip_id: String,
    shape_id: String,
    max_trip_distance_traveled: f64,
    max_shape_distance_traveled: f64,
    geo_distance_to_shape: f64,
    stop_lat: f64,
    stop_lon: f64,
    shape_lat: f64,
    shape_lon: f64,
}

fn read_typed<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    info!("Reading {:?}", path);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Error reading {:?}", path))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        match record {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping invalid row of {:?}: {}", path, e),
        }
    }
    Ok(records)
}

/// Scans a feed directory and writes `discrepancies.txt` (header always
/// included). Trips without a shape or without stop_times are skipped.
pub fn detect<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    for name in ["trips.txt", "stop_times.txt", "stops.txt", "shapes.txt"] {
        if !dir.join(name).is_file() {
            info!("skipping discrepancy detection: no {}", name);
            return Ok(());
        }
    }
    let stops: HashMap<String, (f64, f64)> = read_typed::<Stop>(&dir.join("stops.txt"))?
        .into_iter()
        .map(|stop| (stop.stop_id, (stop.stop_lat, stop.stop_lon)))
        .collect();

    let mut last_stop_times: HashMap<String, StopTime> = HashMap::new();
    for stop_time in read_typed::<StopTime>(&dir.join("stop_times.txt"))? {
        match last_stop_times.get(&stop_time.trip_id) {
            Some(last) if last.stop_sequence >= stop_time.stop_sequence => {}
            _ => {
                last_stop_times.insert(stop_time.trip_id.clone(), stop_time);
            }
        }
    }

    let mut last_shape_points: HashMap<String, ShapePoint> = HashMap::new();
    for point in read_typed::<ShapePoint>(&dir.join("shapes.txt"))? {
        match last_shape_points.get(&point.shape_id) {
            Some(last) if last.shape_pt_sequence >= point.shape_pt_sequence => {}
            _ => {
                last_shape_points.insert(point.shape_id.clone(), point);
            }
        }
    }

    let mut discrepancies = Vec::new();
    for trip in read_typed::<Trip>(&dir.join("trips.txt"))? {
        if trip.shape_id.is_empty() {
            continue;
        }
        let (last_stop_time, last_point) = match (
            last_stop_times.get(&trip.trip_id),
            last_shape_points.get(&trip.shape_id),
        ) {
            (Some(last_stop_time), Some(last_point)) => (last_stop_time, last_point),
            _ => continue,
        };
        if last_stop_time.shape_dist_traveled <= last_point.shape_dist_traveled {
            continue;
        }
        let (stop_lat, stop_lon) = match stops.get(&last_stop_time.stop_id) {
            Some(coords) => *coords,
            None => {
                warn!("unknown stop {} on trip {}", last_stop_time.stop_id, trip.trip_id);
                continue;
            }
        };
        let stop_point = Point::new(stop_lon, stop_lat);
        let shape_point = Point::new(last_point.shape_pt_lon, last_point.shape_pt_lat);
        discrepancies.push(Discrepancy {
            trip_id: trip.trip_id,
            shape_id: trip.shape_id,
            max_trip_distance_traveled: last_stop_time.shape_dist_traveled,
            max_shape_distance_traveled: last_point.shape_dist_traveled,
            geo_distance_to_shape: stop_point.haversine_distance(&shape_point),
            stop_lat,
            stop_lon,
            shape_lat: last_point.shape_pt_lat,
            shape_lon: last_point.shape_pt_lon,
        });
    }

    let output_path = dir.join(DISCREPANCY_FILE);
    info!(
        "Writing {:?} ({} discrepancy(ies))",
        output_path,
        discrepancies.len()
    );
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("Error writing {:?}", output_path))?;
    for discrepancy in &discrepancies {
        writer
            .serialize(discrepancy)
            .with_context(|| format!("Error writing {:?}", output_path))?;
    }
    if discrepancies.is_empty() {
        writer.write_record([
            "trip_id",
            "shape_id",
            "max_trip_distance_traveled",
            "max_shape_distance_traveled",
            "geo_distance_to_shape",
            "stop_lat",
            "stop_lon",
            "shape_lat",
            "shape_lon",
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Error writing {:?}", output_path))?;
    Ok(())
}
