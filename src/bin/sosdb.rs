//! sosdb - prints the engine inventory held in a sosreport's database export.
//!
//! Accepts either a report directory (the export bundle and the engine
//! version are found inside it) or an export bundle file.

use std::path::PathBuf;

use clap::Parser;
use tracing::{Level, debug, trace};
use tracing_subscriber::EnvFilter;

use sosdb::database::{Database, VersionBand};
use sosdb::fs::RealFs;
use sosdb::render::{self, Section};
use sosdb::sos;

/// Engine database viewer for sosreports.
#[derive(Parser)]
#[command(name = "sosdb", about = "Show the engine inventory from a sosreport database export", version)]
struct Args {
    /// sosreport / log-collector directory, or a database export bundle.
    path: PathBuf,

    /// Engine version the export was taken from (e.g. "3.6.9.2").
    /// Read from installed-rpms when not given.
    #[arg(long, value_name = "VERSION")]
    db_version: Option<String>,

    /// Unpack the bundle into this directory and keep it.
    /// A temporary directory is used otherwise.
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    json: bool,

    /// Only show these sections (repeatable). Default is all.
    #[arg(long, value_enum)]
    section: Vec<Section>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber. Logs go to stderr so that output
/// stays clean for `--json`.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter =
        EnvFilter::from_default_env().add_directive(format!("sosdb={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(cause: impl std::fmt::Display) -> ! {
    eprintln!("no database information available: {}", cause);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let source = sos::resolve_source(&RealFs::new(), &args.path, args.db_version.as_deref())
        .unwrap_or_else(|e| fail(e));
    debug!(bundle = %source.bundle.display(), version = %source.version, "opening export");

    let result = match &args.workdir {
        Some(workdir) => Database::open_in(&source.bundle, workdir, &source.version),
        None => Database::open(&source.bundle, &source.version),
    };
    let db = result.unwrap_or_else(|e| fail(e));

    for d in &db.directives {
        trace!(table = %d.table, file = ?d.data_file, "dump directive");
    }

    for t in &db.tables {
        debug!(
            kind = %t.kind,
            band = ?t.band.map(VersionBand::as_str),
            table = ?t.table,
            file = ?t.data_file,
            rows = t.rows,
            misses = t.field_misses,
            "table"
        );
    }

    if args.json {
        match render::render_json(&db, &args.section) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", render::render_text(&db, &args.section));
    }
}
