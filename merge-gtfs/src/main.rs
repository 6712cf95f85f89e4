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

use chrono::NaiveDateTime;
use clap::Parser;
use gtfs_mend::{feed_info, merge::MergeSession, Result};
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
#[clap(name = "merge-gtfs", about = "Merge several GTFS feeds into one.", version = get_version())]
struct Opt {
    /// Input feeds (zip archives or extracted directories), merged in the
    /// given order. The first feed is authoritative on collisions.
    #[clap(short, long, parse(from_os_str), required = true)]
    input: Vec<PathBuf>,

    /// Output directory; the merged feed is created in a uniquely-named
    /// subdirectory of it.
    #[clap(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Name prefix of the merged subdirectory and archive.
    #[clap(short, long, default_value = "GTFS_Merged")]
    name: String,

    /// Recompute the feed_info validity window from the merged calendar.
    #[clap(long)]
    update_feed_info: bool,

    /// Current datetime.
    #[clap(
        short = 'x',
        long,
        parse(try_from_str),
        default_value = &gtfs_mend::CURRENT_DATETIME
    )]
    current_datetime: NaiveDateTime,
}

/// Creates `<output>/<name>_<timestamp>`, suffixed with a counter when a
/// previous run already used the name.
fn create_output_dir(output: &Path, name: &str, now: NaiveDateTime) -> Result<PathBuf> {
    let base = format!("{}_{}", name, now.format("%Y%m%d_%H%M%S"));
    let mut dir = output.join(&base);
    let mut suffix = 1;
    while dir.exists() {
        dir = output.join(format!("{}_{}", base, suffix));
        suffix += 1;
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn run(opt: Opt) -> Result<()> {
    info!("Launching merge-gtfs...");

    let out_dir = create_output_dir(&opt.output, &opt.name, opt.current_datetime)?;
    let mut session = MergeSession::new();
    for (index, feed_path) in opt.input.iter().enumerate() {
        session.load_feed(feed_path, index + 1)?;
    }
    session.write(&out_dir)?;
    session.audit_log(
        &out_dir,
        &opt.current_datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
    )?;
    if opt.update_feed_info {
        feed_info::update_from_calendar(&out_dir, opt.current_datetime)?;
    }

    let zip_path = out_dir.join(format!(
        "{}_{}.zip",
        opt.name,
        opt.current_datetime.format("%Y%m%d_%H%M%S")
    ));
    session.package(&out_dir, &zip_path)?;
    info!("Merged feed available in {:?}", out_dir);
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
