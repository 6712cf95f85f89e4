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

//! Materialization of the merged tables: flat files, then the archive.

use super::{CANONICAL_FILES, MERGE_LOG_FILE};
use crate::tabular::TableSet;
use crate::{utils, Result};
use anyhow::Context;
use std::path::Path;
use tracing::info;

pub(crate) fn write(store: &TableSet, out_dir: &Path) -> Result<()> {
    for (name, rows) in store.iter() {
        info!("Writing {:?}", out_dir.join(name));
        utils::write_rows(out_dir.join(name), rows)?;
    }
    Ok(())
}

/// Zips the canonical table files of `out_dir` into `zip_path`, staged
/// through a scratch directory so stray files never leak into the
/// archive, then removes every loose file of `out_dir` other than the
/// audit log and the archive itself.
pub(crate) fn package(out_dir: &Path, zip_path: &Path) -> Result<()> {
    let staging = tempfile::tempdir()?;
    for name in CANONICAL_FILES {
        let source = out_dir.join(name);
        if source.is_file() {
            std::fs::copy(&source, staging.path().join(name))
                .with_context(|| format!("Error reading {:?}", source))?;
        }
    }
    info!("Packaging merged feed into {:?}", zip_path);
    utils::zip_to(staging.path(), zip_path)?;

    let zip_path = zip_path.canonicalize()?;
    for entry in std::fs::read_dir(out_dir).with_context(|| format!("Error reading {:?}", out_dir))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name == MERGE_LOG_FILE {
            continue;
        }
        if path.canonicalize()? == zip_path {
            continue;
        }
        std::fs::remove_file(&path).with_context(|| format!("Error removing {:?}", path))?;
    }
    Ok(())
}
