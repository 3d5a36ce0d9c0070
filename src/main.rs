//! # toki-reki CLI
//!
//! Thin command-line wrapper around the calendrical core: resolves a
//! date or date range, acquires the ephemeris handle, and prints the
//! public JSON record to stdout.


use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;

use toki_reki::config::{Config, RequestOverrides};
use toki_reki::oracle;
use toki_reki::record::{build_day, build_range};

/// Print the Japanese lunisolar calendar and solar-term record for a date
/// or date range.
#[derive(Parser, Debug)]
#[command(name = "toki-reki", version, about)]
struct Cli {
    /// Civil date to resolve, YYYY-MM-DD. Mutually exclusive with --start/--end.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Start of a date range, YYYY-MM-DD. Requires --end.
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,

    /// End of a date range, YYYY-MM-DD. Requires --start.
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Explicit ephemeris file path, overriding TOKI_EPHEMERIS_PATH and the default.
    #[arg(long)]
    ephemeris_path: Option<String>,

    /// Explicit ephemeris filename (resolved under data/), overriding TOKI_EPHEMERIS.
    #[arg(long)]
    ephemeris: Option<String>,

    /// Observer latitude in degrees, default Tokyo.
    #[arg(long)]
    lat: Option<f64>,

    /// Observer longitude in degrees, default Tokyo.
    #[arg(long)]
    lon: Option<f64>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let overrides = RequestOverrides {
        ephemeris_path: cli.ephemeris_path,
        ephemeris_name: cli.ephemeris,
        lat: cli.lat,
        lon: cli.lon,
    };
    let cfg = Config::resolve(&overrides)?;
    let handle = oracle::acquire(&cfg)?;

    let record = if let (Some(start), Some(end)) = (cli.start, cli.end) {
        let range = build_range(handle.oracle(), &handle.ephemeris_name, &cfg, start, end, None)?;
        if cli.pretty {
            serde_json::to_string_pretty(&range)?
        } else {
            serde_json::to_string(&range)?
        }
    } else {
        let date = cli.date.unwrap_or_else(|| {
            toki_reki::attribution::attribute_jst(chrono::Utc::now())
        });
        let day = build_day(handle.oracle(), &handle.ephemeris_name, &cfg, date, None)?;
        if cli.pretty {
            serde_json::to_string_pretty(&day)?
        } else {
            serde_json::to_string(&day)?
        }
    };

    Ok(record)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("toki-reki: {err}");
            ExitCode::FAILURE
        }
    }
}
