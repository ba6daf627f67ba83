use std::path::PathBuf;

use anyhow::Context;
use beatline_core::{
    BeatlineConfig, Chart, KeyTable,
    diagnostics::init_tracing_with_config,
    fixtures::demo_chart,
    lanes::lanes_in_window,
    persistence::{autosave_chart, load_chart, save_chart},
    playback::schedule_playback,
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "beatline-cli")]
#[command(about = "Headless tools for inspecting beatline charts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides the configured log directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Writes the built-in demo chart.
    DemoChart {
        /// Defaults to `demo.beatline.json` in the configured charts directory.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also writes an autosave copy to the configured autosave directory.
        #[arg(long)]
        autosave: bool,
    },
    /// Prints the playback schedule for a beat window as JSON.
    Schedule {
        /// Chart file; the demo chart when omitted.
        #[arg(long)]
        chart: Option<PathBuf>,
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        #[arg(long)]
        end: Option<f64>,
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Prints the lane partition for a beat window as JSON.
    Lanes {
        #[arg(long)]
        chart: Option<PathBuf>,
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        #[arg(long)]
        end: Option<f64>,
    },
}

fn open_chart(path: Option<&PathBuf>) -> anyhow::Result<Chart> {
    match path {
        Some(path) => load_chart(path),
        None => Ok(demo_chart()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = BeatlineConfig::load_or_default()?;
    let log_dir = cli.log_dir.unwrap_or_else(|| config.paths.logs_dir.clone());
    let telemetry = init_tracing_with_config(&log_dir, &config.diagnostics)?;

    match cli.command {
        Commands::DemoChart { output, autosave } => {
            let output =
                output.unwrap_or_else(|| config.paths.charts_dir.join("demo.beatline.json"));
            let chart = demo_chart();
            let _span = telemetry.chart_span(&chart).entered();
            save_chart(&output, &chart)?;
            tracing::info!(path = %output.display(), "demo chart written");
            if autosave {
                autosave_chart(&chart, &config.paths.autosave_dir)?;
            }
        }
        Commands::Schedule {
            chart,
            start,
            end,
            speed,
        } => {
            let chart = open_chart(chart.as_ref())?;
            let _span = telemetry.chart_span(&chart).entered();
            let end = end.unwrap_or_else(|| chart.timeline.extent_beats());
            let speed = speed.unwrap_or(config.playback.speed);
            let keys =
                KeyTable::chromatic(config.playback.first_key_note, config.playback.key_count);
            let schedule = schedule_playback(&chart.timeline, start, end, speed, &keys)
                .with_context(|| format!("nothing to play between beats {start} and {end}"))?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        Commands::Lanes { chart, start, end } => {
            let chart = open_chart(chart.as_ref())?;
            let _span = telemetry.chart_span(&chart).entered();
            let end = end.unwrap_or_else(|| chart.timeline.extent_beats());
            let lanes = lanes_in_window(chart.timeline.lanes(), start, end);
            println!("{}", serde_json::to_string_pretty(&lanes)?);
        }
    }

    Ok(())
}
