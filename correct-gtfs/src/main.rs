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

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use gtfs_mend::{
    calendar_exceptions, cleanup, configuration, discrepancy, feed_info, report::Report, utils,
    Result,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

lazy_static::lazy_static! {
    pub static ref GIT_VERSION: String = gtfs_mend::binary_full_version(env!("CARGO_PKG_VERSION"));
}

fn get_version() -> &'static str {
    &GIT_VERSION
}

#[derive(Debug, Parser)]
#[clap(name = "correct-gtfs", about = "Apply corrective processing to a GTFS feed.", version = get_version())]
struct Opt {
    /// Input feed (zip archive or extracted directory).
    #[clap(short, long, parse(from_os_str))]
    input: PathBuf,

    /// Output zip archive of the corrected feed.
    #[clap(short, long, parse(from_os_str))]
    output: PathBuf,

    /// JSON file with the publisher contact details used when
    /// feed_info.txt has to be created.
    #[clap(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// CSV file of calendar-exception rules to inject into
    /// calendar_dates.txt.
    #[clap(short, long, parse(from_os_str))]
    rules: Option<PathBuf>,

    /// Write the JSON cleanup report to this file.
    #[clap(long, parse(from_os_str))]
    report: Option<PathBuf>,

    /// Current datetime.
    #[clap(
        short = 'x',
        long,
        parse(try_from_str),
        default_value = &gtfs_mend::CURRENT_DATETIME
    )]
    current_datetime: NaiveDateTime,
}

/// Copies or extracts the input feed into the scratch directory the
/// processors rewrite in place.
fn stage_input(input: &Path, work_dir: &Path) -> Result<()> {
    if input.is_dir() {
        for entry in
            std::fs::read_dir(input).with_context(|| format!("Error reading {:?}", input))?
        {
            let path = entry?.path();
            if let (true, Some(name)) = (path.is_file(), path.file_name()) {
                std::fs::copy(&path, work_dir.join(name))
                    .with_context(|| format!("Error reading {:?}", path))?;
            }
        }
        Ok(())
    } else {
        utils::unzip_to(input, work_dir)
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("Launching correct-gtfs...");

    let work_dir = tempfile::tempdir()?;
    stage_input(&opt.input, work_dir.path())?;

    let contact = configuration::read_config(opt.config)?;
    let mut report = Report::default();
    feed_info::process(work_dir.path(), &contact, &mut report, opt.current_datetime)?;
    cleanup::agency::process(work_dir.path(), &mut report)?;
    cleanup::routes::process(work_dir.path(), &mut report)?;
    cleanup::stops::process(work_dir.path(), &mut report)?;
    cleanup::stop_times::process(work_dir.path(), &mut report)?;
    cleanup::trips::process(work_dir.path(), &mut report)?;
    discrepancy::detect(work_dir.path())?;
    if let Some(rules_path) = opt.rules {
        calendar_exceptions::apply_rules(work_dir.path(), rules_path)?;
    }

    utils::zip_to(work_dir.path(), &opt.output)?;
    info!("Corrected feed written to {:?}", opt.output);

    if let Some(report_path) = opt.report {
        info!("Writing report {:?}", report_path);
        let file = File::create(&report_path)
            .with_context(|| format!("Error writing {:?}", report_path))?;
        serde_json::to_writer_pretty(file, &report)?;
    }
    Ok(())
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter_subscriber = EnvFilter::try_new(rust_log).unwrap_or_else(|e| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            e,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter_subscriber)
        .init();
}

fn main() {
    init_logger();
    if let Err(err) = run(Opt::parse()) {
        for cause in err.chain() {
            eprintln!("{}", cause);
        }
        std::process::exit(1);
    }
}
