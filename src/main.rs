//! Command-line front end for the comparison engine.
//!
//! Usage:
//!   sensorcompare sensors --data dump.json
//!   sensorcompare compare --data dump.json <SENSOR_A> <SENSOR_B> --window 7d
//!   sensorcompare compare --data dump.csv a b --json --export-data out.csv

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use sensorcompare::data::loader;
use sensorcompare::export::tabular;
use sensorcompare::{AnalyticsConfig, ComparisonSession, Metric, SampleSource, TimeWindow};

#[derive(Parser)]
#[command(name = "sensorcompare")]
#[command(about = "Compare two temperature/humidity sensors")]
struct Cli {
    /// Sensor dump to read (.json or .csv)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List sensor descriptors
    Sensors,
    /// Compare two sensors
    Compare(CompareArgs),
}

#[derive(Args)]
struct CompareArgs {
    sensor_a: String,
    sensor_b: String,

    /// Time window: 1h, 24h, 7d or 30d
    #[arg(short, long)]
    window: Option<TimeWindow>,

    /// JSON config file with analytics defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Metric to forecast (avgT, avgH, ...)
    #[arg(long, value_parser = parse_metric)]
    metric: Option<Metric>,

    /// Number of forecast steps
    #[arg(long)]
    steps: Option<usize>,

    /// Minutes between forecast steps
    #[arg(long)]
    step_minutes: Option<f64>,

    /// Rows per sensor in the recent-samples table
    #[arg(long)]
    recent: Option<usize>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Write raw samples as CSV
    #[arg(long)]
    export_data: Option<PathBuf>,

    /// Write per-sensor statistics as CSV
    #[arg(long)]
    export_stats: Option<PathBuf>,
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    Metric::from_key(s).ok_or_else(|| format!("Unknown metric '{s}'"))
}

impl CompareArgs {
    fn config(&self) -> Result<AnalyticsConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyticsConfig::load(path)?,
            None => AnalyticsConfig::default(),
        };
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(metric) = self.metric {
            config.forecast_metric = metric;
        }
        if let Some(steps) = self.steps {
            config.forecast.steps = steps;
        }
        if let Some(minutes) = self.step_minutes {
            config.forecast.step_minutes = minutes;
        }
        if let Some(recent) = self.recent {
            config.recent_rows = recent;
        }
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Reports go to stdout; keep logs off it.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let data = cli.data.context("--data <FILE> is required")?;
    let source = loader::load_file(&data)?;

    match cli.command {
        Command::Sensors => {
            for s in source.sensors()? {
                println!("{}\t{}", s.sensor_id, s.label());
            }
        }
        Command::Compare(args) => {
            let config = args.config()?;
            let session = ComparisonSession::new();
            let Some(report) = session.run(&source, &args.sensor_a, &args.sensor_b, &config)? else {
                bail!("comparison superseded by a newer run");
            };

            if args.json {
                println!("{}", serde_json::to_string_pretty(&*report)?);
            } else {
                print!("{}", report.render(config.recent_rows));
            }

            if let Some(path) = &args.export_data {
                tabular::export_data(&report.bundle, path)
                    .with_context(|| format!("Failed to export data to {}", path.display()))?;
            }
            if let Some(path) = &args.export_stats {
                tabular::export_stats(&report.bundle, path)
                    .with_context(|| format!("Failed to export stats to {}", path.display()))?;
            }
        }
    }
    Ok(())
}
