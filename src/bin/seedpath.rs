//! # Seedpath CLI - Point your BitTorrent client at files you already have
//!
//! Reads a torrent, searches the potential download locations for its files,
//! hard links every verified file into place and prints the download
//! location on stdout.
//!
//! ## Usage
//! ```bash
//! # Search two locations
//! seedpath Some.Album.torrent -l /srv/music -l /mnt/archive
//!
//! # Locations from a file, fall back to a default
//! seedpath Some.Album.torrent --lf ~/.config/seedpath/locations --default /srv/incoming
//!
//! # Machine-readable report
//! seedpath Some.Album.torrent -l /srv/music --json
//! ```
//!
//! ## Locations File
//!
//! Without `--locations-file`, `<config dir>/seedpath/locations` is read if
//! it exists. Locations given with `--location` are searched first.

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use seedpath::types::{FindReport, SearchProgress};
use seedpath::{LocationFinder, Locations};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Seedpath CLI - Find the download location of a torrent
#[derive(Parser, Debug)]
#[command(name = "seedpath")]
#[command(version)]
#[command(about = "Find the download location of a torrent and link existing files into it")]
#[command(long_about = None)]
struct Cli {
    /// Path to torrent file
    #[arg(value_name = "TORRENT")]
    torrent: PathBuf,

    /// Potential download locations of existing files in TORRENT (may be
    /// given multiple times)
    #[arg(short = 'l', long = "location", value_name = "PATH", num_args = 1..)]
    locations: Vec<String>,

    /// File containing newline-separated list of download locations
    #[arg(long, visible_alias = "lf", value_name = "PATH")]
    locations_file: Option<PathBuf>,

    /// Default location if no existing files are found
    #[arg(long = "default", value_name = "PATH")]
    default: Option<PathBuf>,

    /// Where to write debugging messages
    #[arg(long, value_name = "PATH")]
    debug_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the full report as JSON instead of the location
    #[arg(long)]
    json: bool,

    /// Show a spinner while candidates are verified
    #[arg(long)]
    progress: bool,
}

fn main() {
    let cli = Cli::parse();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let result = init_logging(&cli).and_then(|()| run(cli));
    if let Err(e) = result {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` overrides the level chosen by `--verbose` and `--debug-file`.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose || cli.debug_file.is_some() {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match &cli.debug_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create debug file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<()> {
    let locations = read_locations(&cli)?;

    let mut builder = LocationFinder::builder().locations(locations.into_vec());
    if let Some(default) = &cli.default {
        builder = builder.default_location(default);
    }

    let spinner = if cli.progress {
        Some(spinner()?)
    } else {
        None
    };
    if let Some(pb) = &spinner {
        let pb = pb.clone();
        builder = builder.on_progress(move |progress: &SearchProgress| {
            pb.set_message(format!(
                "Assignment {}: {}/{} files verified",
                progress.assignment, progress.confirmed, progress.total
            ));
        });
    }

    let finder = builder.build(&cli.torrent)?;
    debug!("{:?}", finder);

    let start = Instant::now();
    let result = finder.find_with_report();
    let elapsed = Duration::from_millis(start.elapsed().as_millis() as u64);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result.map_err(|e| anyhow!(e.user_message()))?;
    info!("Search finished in {}", format_duration(elapsed));

    if cli.progress {
        print_summary(&report, elapsed);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{}", report.location.display());
    }
    Ok(())
}

/// Locations from `--location` followed by those of the locations file
fn read_locations(cli: &Cli) -> anyhow::Result<Locations> {
    let mut locations = match &cli.locations_file {
        Some(path) => Locations::from_file(path)?,
        None => Locations::from_default_file()?,
    };
    locations.prepend(&cli.locations)?;

    if locations.is_empty() {
        bail!("No locations specified. See: {} --help", env!("CARGO_PKG_NAME"));
    }
    if let Some(path) = locations.filepath() {
        debug!("Locations file: {}", path.display());
    }
    Ok(locations)
}

fn spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Collecting candidates...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Summary on stderr, so stdout stays machine-readable
fn print_summary(report: &FindReport, elapsed: Duration) {
    let total = report.confirmed.len() + report.unmatched.len();
    let mark = if report.is_complete() {
        "✓".green().bold()
    } else if report.confirmed.is_empty() {
        "✗".red().bold()
    } else {
        "!".yellow().bold()
    };

    eprintln!(
        "{} {}/{} files verified after {} assignment(s) in {}",
        mark,
        report.confirmed.len().to_string().cyan(),
        total,
        report.assignments_tried,
        format_duration(elapsed).to_string().cyan()
    );
    for path in &report.unmatched {
        eprintln!("  {} {}", "missing".yellow(), path.display());
    }
}
