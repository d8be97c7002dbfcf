//! `bazi` - four-pillar calendar lookups and batch enrichment.
//!
//! ```text
//! bazi pillars 1969-11-24T09:00
//! bazi lunar 2024-02-10
//! bazi terms 2024
//! bazi enrich --base 1969-11-24T09:00 --input stamps.txt --format csv
//! ```
//!
//! Logs go to stderr (filter with `RUST_LOG`); stdout carries the result.
//! Settings come from the config file and are overridden by flags.

mod export;
mod input;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bazi_config::{BaziConfig, OutputFormat, check_utc_offset};
use bazi_core::calendar::DEFAULT_UTC_OFFSET_MINUTES;
use bazi_core::{CalendarConverter, PillarCalculator, SolarTermCache};
use bazi_engine::{BatchEnricher, TIMESTAMP_FORMAT, WorkerConfig};
use bazi_types::PillarKind;

#[derive(Parser)]
#[command(name = "bazi")]
#[command(version)]
#[command(about = "Four-pillar calendar lookups and batch feature enrichment")]
struct Cli {
    /// Config file (defaults to $BAZI_CONFIG or ~/.bazi/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Civil offset in minutes east of UTC used for days and solar terms
    #[arg(long, global = true, allow_hyphen_values = true, value_parser = parse_utc_offset)]
    utc_offset: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the eight pillars of one local instant
    Pillars {
        #[arg(value_parser = input::parse_datetime)]
        datetime: NaiveDateTime,
    },
    /// Print the lunisolar date of a Gregorian date
    Lunar {
        #[arg(value_parser = input::parse_date)]
        date: NaiveDate,
    },
    /// Print the 24 solar-term instants of a Gregorian year
    Terms { year: i32 },
    /// Enrich a list of timestamps against a reference instant
    Enrich(EnrichArgs),
}

#[derive(clap::Args)]
struct EnrichArgs {
    /// Reference instant of the entity (falls back to `[reference] base`)
    #[arg(long, value_parser = input::parse_datetime)]
    base: Option<NaiveDateTime>,

    /// Timestamps, one per line (stdin when omitted)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Upper bound on worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// jsonl or csv
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Add `encoded_` integer columns for life-cycle stages
    #[arg(long)]
    encode_life_cycle: bool,

    /// Stop dispatching rows after this many seconds
    #[arg(long)]
    deadline: Option<u64>,
}

fn parse_format(raw: &str) -> Result<OutputFormat, String> {
    raw.parse()
}

fn parse_utc_offset(raw: &str) -> Result<i32, String> {
    let minutes = raw
        .trim()
        .parse::<i32>()
        .map_err(|err| format!("'{raw}' is not a number of minutes: {err}"))?;
    check_utc_offset(minutes)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<BaziConfig> {
    let loaded = match explicit {
        Some(path) => {
            let loaded = BaziConfig::load_from(path)?;
            if loaded.is_none() {
                return Err(anyhow!("config file {} does not exist", path.display()));
            }
            loaded
        }
        None => BaziConfig::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let offset = cli
        .utc_offset
        .or(config.utc_offset_minutes())
        .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);
    let calendar = CalendarConverter::new(Arc::new(SolarTermCache::new(offset)));
    tracing::debug!(utc_offset_minutes = offset, "calendar ready");

    match cli.command {
        Command::Pillars { datetime } => print_pillars(&calendar, datetime, io::stdout().lock()),
        Command::Lunar { date } => {
            let lunar = calendar.lunar_of(date)?;
            println!("{lunar}");
            Ok(())
        }
        Command::Terms { year } => {
            let mut out = io::stdout().lock();
            for (term, instant) in calendar.solar_terms(year)? {
                writeln!(out, "{term}\t{}", instant.format(TIMESTAMP_FORMAT))?;
            }
            Ok(())
        }
        Command::Enrich(args) => enrich(calendar, &config, args),
    }
}

fn print_pillars(
    calendar: &CalendarConverter,
    datetime: NaiveDateTime,
    mut out: impl Write,
) -> Result<()> {
    let calculator = PillarCalculator::new(calendar.clone())?;
    let pillars = calculator.four_pillars_at(datetime)?;
    writeln!(out, "{pillars}")?;
    for kind in PillarKind::ALL {
        let pair = pillars.pair(kind);
        writeln!(out, "{:<6}{}  minus {}", kind.name(), pair.main, pair.minus)?;
    }
    writeln!(out, "term  {}", calendar.solar_term_at(datetime)?)?;
    writeln!(out, "lunar {}", calendar.lunar_of(datetime.date())?)?;
    Ok(())
}

fn enrich(calendar: CalendarConverter, config: &BaziConfig, args: EnrichArgs) -> Result<()> {
    let base_instant = match args.base {
        Some(base) => base,
        None => {
            let raw = config
                .reference_base()
                .ok_or_else(|| anyhow!("--base is required when the config has no [reference] base"))?;
            input::parse_datetime(raw).map_err(|err| anyhow!("[reference] base: {err}"))?
        }
    };

    let (timestamps, rejected) = match &args.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            input::read_timestamps(BufReader::new(file))?
        }
        None => input::read_timestamps(io::stdin().lock())?,
    };
    for line in &rejected {
        tracing::warn!(line = line.line, content = %line.content, "{}", line.reason);
    }

    let mut workers = WorkerConfig::default();
    if let Some(max) = args.workers.or(config.max_workers()) {
        workers = workers.with_max_workers(max);
    }
    if let Some(secs) = args.deadline.or(config.deadline_secs()) {
        workers = workers.with_deadline(Duration::from_secs(secs));
    }
    let format = args
        .format
        .or(config.output_format())
        .unwrap_or_default();
    let encode_life_cycle = args.encode_life_cycle || config.encode_life_cycle();

    let enricher = BatchEnricher::new(calendar)?;
    let base = enricher
        .base_pillars(base_instant)
        .with_context(|| format!("reference instant {base_instant}"))?;
    let (table, report) = enricher.enrich(&timestamps, &base, &workers)?;

    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            export::write_table(&table, format, encode_life_cycle, BufWriter::new(file))?;
        }
        None => export::write_table(&table, format, encode_life_cycle, io::stdout().lock())?,
    }

    eprintln!("{}", serde_json::to_string(&report)?);
    if !rejected.is_empty() {
        eprintln!("{} input line(s) rejected", rejected.len());
    }
    Ok(())
}
