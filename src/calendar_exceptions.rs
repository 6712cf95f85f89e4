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

//! Injection of service exceptions into `calendar_dates.txt`.
//!
//! A rules file lists dated exceptions (holidays, detours, special
//! schedules) per municipality and route. Each applicable rule turns
//! into one `calendar_dates.txt` row per service active on the rule's
//! date; "No Service" rules remove the day (exception type 2), any other
//! reason adds it (type 1).

use crate::serde_utils::de_from_rule_date_string;
use crate::tabular::Row;
use crate::{objects::Date, utils, Result};
use anyhow::Context;
use chrono::Datelike;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// One row of the exception rules file.
#[derive(Debug, Deserialize)]
pub struct ExceptionRule {
    /// Municipality the exception was announced for (informational)
    pub municipality: String,
    /// Route the exception applies to; used by "Sunday Service" rules
    pub route_id: String,
    /// Human-readable reason, e.g. "Independence Day"
    pub reason: String,
    /// Date of the exception, `M/D/YYYY` in the rules file
    #[serde(deserialize_with = "de_from_rule_date_string")]
    pub date: Date,
    /// "No Service", "Sunday Service", or any added-service label
    pub exception_type: String,
}

/// Reads the rules file, skipping rows that cannot be parsed.
pub fn read_rules<P: AsRef<Path>>(rules_path: P) -> Result<Vec<ExceptionRule>> {
    let rules_path = rules_path.as_ref();
    info!("Reading {:?}", rules_path);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(rules_path)
        .with_context(|| format!("Error reading {:?}", rules_path))?;
    let mut rules = Vec::new();
    for rule in reader.deserialize() {
        match rule {
            Ok(rule) => rules.push(rule),
            Err(e) => warn!("skipping invalid exception rule: {}", e),
        }
    }
    Ok(rules)
}

/// `(route_id, service_id)` of every trip, in file order.
fn read_trip_services(dir: &Path) -> Result<Vec<(String, String)>> {
    let path = dir.join("trips.txt");
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let rows = utils::read_rows(&path)?;
    let (route_pos, service_pos) = match rows.first().map(|header| {
        (
            header.iter().position(|c| c == "route_id"),
            header.iter().position(|c| c == "service_id"),
        )
    }) {
        Some((Some(route_pos), Some(service_pos))) => (route_pos, service_pos),
        _ => return Ok(Vec::new()),
    };
    Ok(rows
        .iter()
        .skip(1)
        .filter_map(|row| Some((row.get(route_pos)?.clone(), row.get(service_pos)?.clone())))
        .collect())
}

/// Applies the rules of `rules_path` to the feed in `dir`, rewriting
/// `calendar_dates.txt`. Rules dated outside the calendar's year range
/// are ignored; duplicate rows are never added.
pub fn apply_rules<P: AsRef<Path>, R: AsRef<Path>>(dir: P, rules_path: R) -> Result<()> {
    let dir = dir.as_ref();
    let calendar_path = dir.join("calendar.txt");
    if !calendar_path.is_file() {
        info!("skipping calendar exceptions: no calendar.txt");
        return Ok(());
    }
    let calendars = utils::read_calendars(&calendar_path)?;
    let min_year = match calendars.iter().map(|c| c.start_date.year()).min() {
        Some(year) => year,
        None => {
            warn!("skipping calendar exceptions: no valid calendar rows");
            return Ok(());
        }
    };
    let max_year = calendars.iter().map(|c| c.end_date.year()).max().unwrap_or(min_year);

    let rules = read_rules(rules_path)?;
    let trip_services = read_trip_services(dir)?;

    let calendar_dates_path = dir.join("calendar_dates.txt");
    let mut rows: Vec<Row> = if calendar_dates_path.is_file() {
        utils::read_rows(&calendar_dates_path)?
    } else {
        Vec::new()
    };
    if rows.is_empty() {
        rows.push(
            ["service_id", "date", "exception_type"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
    }
    let mut seen: HashSet<Row> = rows.iter().skip(1).cloned().collect();

    for year in min_year..=max_year {
        for rule in rules.iter().filter(|rule| rule.date.year() == year) {
            let date = rule.date.format("%Y%m%d").to_string();
            let exception_type = if rule.exception_type == "No Service" { "2" } else { "1" };

            let mut active_services: Vec<&str> = calendars
                .iter()
                .filter(|calendar| calendar.is_active_on(rule.date))
                .map(|calendar| calendar.id.as_str())
                .collect();
            active_services.dedup();
            for service_id in active_services {
                let row = vec![service_id.to_string(), date.clone(), exception_type.to_string()];
                if seen.insert(row.clone()) {
                    info!(
                        "calendar exception ({}): service {} on {} type {}",
                        rule.reason, service_id, date, exception_type
                    );
                    rows.push(row);
                }
            }

            // a "Sunday Service" day also runs the route's sunday services
            if rule.exception_type == "Sunday Service" {
                let mut replacement_services: Vec<&str> = trip_services
                    .iter()
                    .filter(|(route_id, service_id)| {
                        *route_id == rule.route_id && service_id.contains("sunday")
                    })
                    .map(|(_, service_id)| service_id.as_str())
                    .collect();
                replacement_services.sort_unstable();
                replacement_services.dedup();
                for service_id in replacement_services {
                    let row = vec![service_id.to_string(), date.clone(), "1".to_string()];
                    if seen.insert(row.clone()) {
                        rows.push(row);
                    }
                }
            }
        }
    }
    utils::write_rows(&calendar_dates_path, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    fn write_calendar(path: &Path) {
        create_file_with_content(
            path,
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WEEK,1,1,1,1,1,0,0,20240101,20241231\n\
             SAT,0,0,0,0,0,1,0,20240101,20241231\n\
             sunday_R1,0,0,0,0,0,0,1,20240101,20241231\n",
        );
    }

    #[test]
    fn no_service_rule_suspends_active_services() {
        test_in_tmp_dir(|path| {
            write_calendar(path);
            create_file_with_content(
                path,
                "rules.csv",
                "municipality,route_id,reason,date,exception_type\n\
                 Plantation,R1,Independence Day,7/4/2024,No Service\n",
            );
            // 2024-07-04 is a Thursday: only WEEK is active
            apply_rules(path, path.join("rules.csv")).unwrap();
            assert_eq!(
                "service_id,date,exception_type\nWEEK,20240704,2\n",
                get_file_content(path.join("calendar_dates.txt"))
            );
        });
    }

    #[test]
    fn sunday_service_rule_adds_replacement_services() {
        test_in_tmp_dir(|path| {
            write_calendar(path);
            create_file_with_content(
                path,
                "trips.txt",
                "route_id,service_id,trip_id\n\
                 R1,sunday_R1,T1\n\
                 R1,sunday_R1,T2\n\
                 R2,sunday_R2,T3\n",
            );
            create_file_with_content(
                path,
                "rules.csv",
                "municipality,route_id,reason,date,exception_type\n\
                 Plantation,R1,Thanksgiving,11/28/2024,Sunday Service\n",
            );
            // 2024-11-28 is a Thursday: WEEK is active, and R1's sunday
            // service is added as a replacement
            apply_rules(path, path.join("rules.csv")).unwrap();
            assert_eq!(
                "service_id,date,exception_type\n\
                 WEEK,20241128,1\n\
                 sunday_R1,20241128,1\n",
                get_file_content(path.join("calendar_dates.txt"))
            );
        });
    }

    #[test]
    fn out_of_range_rules_are_ignored() {
        test_in_tmp_dir(|path| {
            write_calendar(path);
            create_file_with_content(
                path,
                "rules.csv",
                "municipality,route_id,reason,date,exception_type\n\
                 Plantation,R1,Old Holiday,7/4/2019,No Service\n",
            );
            apply_rules(path, path.join("rules.csv")).unwrap();
            assert_eq!(
                "service_id,date,exception_type\n",
                get_file_content(path.join("calendar_dates.txt"))
            );
        });
    }

    #[test]
    fn existing_rows_are_not_duplicated() {
        test_in_tmp_dir(|path| {
            write_calendar(path);
            create_file_with_content(
                path,
                "calendar_dates.txt",
                "service_id,date,exception_type\nWEEK,20240704,2\n",
            );
            create_file_with_content(
                path,
                "rules.csv",
                "municipality,route_id,reason,date,exception_type\n\
                 Plantation,R1,Independence Day,7/4/2024,No Service\n",
            );
            apply_rules(path, path.join("rules.csv")).unwrap();
            assert_eq!(
                "service_id,date,exception_type\nWEEK,20240704,2\n",
                get_file_content(path.join("calendar_dates.txt"))
            );
        });
    }
}
