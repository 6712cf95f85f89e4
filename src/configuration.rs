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
//! Optional JSON configuration of the corrective processors.

use crate::Result;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Publisher contact details injected into a synthesized `feed_info.txt`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedContact {
    /// Value for the `feed_contact_email` field
    #[serde(default)]
    pub feed_contact_email: String,
    /// Value for the `feed_contact_url` field
    #[serde(default)]
    pub feed_contact_url: String,
}

/// Read a JSON configuration file to facilitate the creation of
/// `feed_info.txt`. When no path is given, defaults (empty contact
/// fields) are used.
///
/// Below is an example of this file
/// ```text
/// {
///     "feed_contact_email": "contact@transit-agency.example",
///     "feed_contact_url": "https://www.transit-agency.example/contact"
/// }
/// ```
pub fn read_config<P: AsRef<Path>>(config_path: Option<P>) -> Result<FeedContact> {
    match config_path {
        Some(config_path) => {
            let config_path = config_path.as_ref();
            info!("Reading feed contact details from {:?}", config_path);
            let json_config_file = File::open(config_path)?;
            let contact = serde_json::from_reader(json_config_file)?;
            Ok(contact)
        }
        None => Ok(FeedContact::default()),
    }
}
