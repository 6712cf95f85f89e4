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

//! `feed_info.txt` synthesis and refresh.
//!
//! The validity window always comes from `calendar.txt`: earliest
//! `start_date`, latest `end_date`. The version string encodes that
//! window plus a generation timestamp, so two runs over the same data are
//! distinguishable.

use crate::cleanup::{required, restrict_columns, Column};
use crate::configuration::FeedContact;
use crate::objects::Date;
use crate::report::{CleanupCategory, Report};
use crate::{utils, Result};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{info, warn};

/// The eight standard columns of `feed_info.txt`, in reference order.
pub const FEED_INFO_COLUMNS: [&str; 8] = [
    "feed_publisher_name",
    "feed_publisher_url",
    "feed_lang",
    "feed_start_date",
    "feed_end_date",
    "feed_version",
    "feed_contact_email",
    "feed_contact_url",
];

const COLUMNS: [Column; 8] = [
    required("feed_publisher_name"),
    required("feed_publisher_url"),
    required("feed_lang"),
    required("feed_start_date"),
    required("feed_end_date"),
    required("feed_version"),
    required("feed_contact_email"),
    required("feed_contact_url"),
];

fn feed_version(start: Date, end: Date, now: NaiveDateTime) -> String {
    format!(
        "S{}_E{}_TS{}",
        start.format("%Y%m%d"),
        end.format("%Y%m%d"),
        now.format("%Y%m%d%H%M%S")
    )
}

/// Earliest start and latest end over the valid `calendar.txt` rows.
fn calendar_range(dir: &Path) -> Result<Option<(Date, Date)>> {
    let path = dir.join("calendar.txt");
    if !path.is_file() {
        return Ok(None);
    }
    let calendars = utils::read_calendars(&path)?;
    let start = calendars.iter().map(|c| c.start_date).min();
    let end = calendars.iter().map(|c| c.end_date).max();
    Ok(start.zip(end))
}

/// Publisher name and url from the first data row of `agency.txt`.
fn agency_publisher(dir: &Path) -> Result<(String, String)> {
    let path = dir.join("agency.txt");
    if !path.is_file() {
        return Ok((String::new(), String::new()));
    }
    let rows = utils::read_rows(&path)?;
    let field = |name: &str| {
        rows.first()
            .and_then(|header| header.iter().position(|c| c == name))
            .and_then(|pos| rows.get(1).and_then(|row| row.get(pos)))
            .cloned()
            .unwrap_or_default()
    };
    Ok((field("agency_name"), field("agency_url")))
}

fn create(dir: &Path, contact: &FeedContact, start: Date, end: Date, now: NaiveDateTime) -> Result<()> {
    let (publisher_name, publisher_url) = agency_publisher(dir)?;
    let rows = vec![
        FEED_INFO_COLUMNS.iter().map(|c| c.to_string()).collect(),
        vec![
            publisher_name,
            publisher_url,
            "en".to_string(),
            start.format("%Y%m%d").to_string(),
            end.format("%Y%m%d").to_string(),
            feed_version(start, end, now),
            contact.feed_contact_email.clone(),
            contact.feed_contact_url.clone(),
        ],
    ];
    utils::write_rows(dir.join("feed_info.txt"), &rows)
}

/// Creates `feed_info.txt` from the feed's agency, calendar and contact
/// configuration when it is missing; otherwise restricts it to the eight
/// standard columns, all guaranteed present.
pub fn process<P: AsRef<Path>>(
    dir: P,
    contact: &FeedContact,
    report: &mut Report<CleanupCategory>,
    now: NaiveDateTime,
) -> Result<()> {
    let dir = dir.as_ref();
    let path = dir.join("feed_info.txt");
    if path.is_file() {
        let rows = utils::read_rows(&path)?;
        if rows.is_empty() {
            return Ok(());
        }
        let table = restrict_columns("feed_info.txt", rows, &COLUMNS, report);
        return table.save(&path);
    }

    info!("feed_info.txt does not exist, creating it");
    match calendar_range(dir)? {
        Some((start, end)) => {
            create(dir, contact, start, end, now)?;
            report.add_warning(
                "Created feed_info.txt from agency and calendar data".to_string(),
                CleanupCategory::FeedInfoCreated,
            );
            Ok(())
        }
        None => {
            warn!("no valid dates in calendar.txt, feed_info.txt not created");
            report.add_error(
                "Could not create feed_info.txt: no valid dates in calendar.txt".to_string(),
                CleanupCategory::MissingFile,
            );
            Ok(())
        }
    }
}

/// Refreshes the validity window of a merged feed: recomputes the range
/// from the merged `calendar.txt` and rewrites `feed_start_date`,
/// `feed_end_date` and `feed_version` in the existing `feed_info.txt`
/// (the file is created when missing or header-only).
pub fn update_from_calendar<P: AsRef<Path>>(dir: P, now: NaiveDateTime) -> Result<()> {
    let dir = dir.as_ref();
    let (start, end) = match calendar_range(dir)? {
        Some(range) => range,
        None => {
            warn!("no valid dates in merged calendar.txt, feed_info.txt not updated");
            return Ok(());
        }
    };
    let path = dir.join("feed_info.txt");
    let mut rows = if path.is_file() {
        utils::read_rows(&path)?
    } else {
        Vec::new()
    };
    if rows.len() < 2 {
        info!("feed_info.txt missing or header-only, creating it");
        return create(dir, &FeedContact::default(), start, end, now);
    }

    let position = |name: &str| rows[0].iter().position(|c| c == name);
    let updates = [
        (position("feed_start_date"), start.format("%Y%m%d").to_string()),
        (position("feed_end_date"), end.format("%Y%m%d").to_string()),
        (position("feed_version"), feed_version(start, end, now)),
    ];
    for (pos, value) in updates {
        if let Some(pos) = pos {
            if let Some(field) = rows[1].get_mut(pos) {
                *field = value;
            }
        }
    }
    utils::write_rows(&path, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        "2024-06-01T10:30:00".parse().unwrap()
    }

    fn write_calendar(path: &Path) {
        create_file_with_content(
            path,
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WEEK,1,1,1,1,1,0,0,20240115,20240820\n\
             SAT,0,0,0,0,0,1,0,20240101,20240630\n",
        );
    }

    #[test]
    fn missing_feed_info_is_created_from_feed_data() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "agency.txt",
                "agency_id,agency_name,agency_url\nBCT,Broward County Transit,https://bct.example\n",
            );
            write_calendar(path);
            let contact = FeedContact {
                feed_contact_email: "gtfs@example.com".to_string(),
                feed_contact_url: "https://example.com".to_string(),
            };
            let mut report = Report::default();
            process(path, &contact, &mut report, now()).unwrap();
            assert_eq!(
                "feed_publisher_name,feed_publisher_url,feed_lang,feed_start_date,feed_end_date,feed_version,feed_contact_email,feed_contact_url\n\
                 Broward County Transit,https://bct.example,en,20240101,20240820,S20240101_E20240820_TS20240601103000,gtfs@example.com,https://example.com\n",
                get_file_content(path.join("feed_info.txt"))
            );
        });
    }

    #[test]
    fn existing_feed_info_is_restricted_and_completed() {
        test_in_tmp_dir(|path| {
            create_file_with_content(
                path,
                "feed_info.txt",
                "feed_publisher_name,feed_publisher_url,internal_flag\nBCT,https://bct.example,1\n",
            );
            let mut report = Report::default();
            process(path, &FeedContact::default(), &mut report, now()).unwrap();
            assert_eq!(
                "feed_publisher_name,feed_publisher_url,feed_lang,feed_start_date,feed_end_date,feed_version,feed_contact_email,feed_contact_url\n\
                 BCT,https://bct.example,,,,,,\n",
                get_file_content(path.join("feed_info.txt"))
            );
        });
    }

    #[test]
    fn update_rewrites_window_and_version() {
        test_in_tmp_dir(|path| {
            write_calendar(path);
            create_file_with_content(
                path,
                "feed_info.txt",
                "feed_publisher_name,feed_start_date,feed_end_date,feed_version\n\
                 BCT,19990101,19990101,old\n",
            );
            update_from_calendar(path, now()).unwrap();
            assert_eq!(
                "feed_publisher_name,feed_start_date,feed_end_date,feed_version\n\
                 BCT,20240101,20240820,S20240101_E20240820_TS20240601103000\n",
                get_file_content(path.join("feed_info.txt"))
            );
        });
    }

    #[test]
    fn update_creates_the_file_when_header_only() {
        test_in_tmp_dir(|path| {
            write_calendar(path);
            create_file_with_content(path, "feed_info.txt", "feed_publisher_name\n");
            update_from_calendar(path, now()).unwrap();
            let content = get_file_content(path.join("feed_info.txt"));
            assert!(content.contains("S20240101_E20240820_TS20240601103000"));
        });
    }

    #[test]
    fn update_without_calendar_leaves_the_file_alone() {
        test_in_tmp_dir(|path| {
            create_file_with_content(path, "feed_info.txt", "feed_publisher_name\nBCT\n");
            update_from_calendar(path, now()).unwrap();
            assert_eq!("feed_publisher_name\nBCT\n", get_file_content(path.join("feed_info.txt")));
        });
    }
}
