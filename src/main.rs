//! Tracker shading CLI

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tracker_shading::raster_io::RasterIO;
use tracker_shading::{
    instantaneous_state, report, sweep_row_spacing, AnnualSimulation, SimulationResult,
    TrackerConfig,
};

#[derive(Parser)]
#[command(name = "tracker-shading")]
#[command(author, version, about = "Annual inter-row shading for single-axis trackers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for parallel sweeps (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the annual simulation and export the results
    Simulate {
        #[command(flatten)]
        tracker: TrackerArgs,
        /// Output directory (defaults to Documents/TrackerShading_Exports)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Print the summary only, write nothing
        #[arg(long)]
        no_export: bool,
    },
    /// Sun and tracker state at one moment
    Instant {
        #[command(flatten)]
        tracker: TrackerArgs,
        /// Day of year (1-365)
        #[arg(short, long)]
        day: i32,
        /// Clock hour, fractional hours allowed
        #[arg(short = 'H', long)]
        hour: f64,
    },
    /// Shading loss across a range of row spacings
    Sweep {
        #[command(flatten)]
        tracker: TrackerArgs,
        /// Smallest pitch in meters
        #[arg(long)]
        from: f64,
        /// Largest pitch in meters
        #[arg(long)]
        to: f64,
        /// Pitch increment in meters
        #[arg(long, default_value = "0.5")]
        step: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
    Tiff,
    All,
}

/// Tracker parameters: a JSON config file plus per-field overrides.
#[derive(Args)]
struct TrackerArgs {
    /// JSON config file (camelCase fields, missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, allow_negative_numbers = true)]
    latitude: Option<f64>,
    #[arg(long)]
    panel_chord: Option<f64>,
    #[arg(long)]
    tracker_length: Option<f64>,
    #[arg(long)]
    row_spacing: Option<f64>,
    #[arg(long)]
    hub_height: Option<f64>,
    #[arg(long)]
    backtracking: Option<bool>,
    #[arg(long)]
    max_rotation: Option<f64>,
    #[arg(long)]
    rows: Option<usize>,
    #[arg(long)]
    start_time: Option<i32>,
    #[arg(long)]
    end_time: Option<i32>,
}

impl TrackerArgs {
    fn resolve(&self) -> Result<TrackerConfig> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TrackerConfig::default(),
        };

        if let Some(v) = self.latitude {
            config.latitude = v;
        }
        if let Some(v) = self.panel_chord {
            config.panel_chord = v;
        }
        if let Some(v) = self.tracker_length {
            config.tracker_length = v;
        }
        if let Some(v) = self.row_spacing {
            config.row_spacing = v;
        }
        if let Some(v) = self.hub_height {
            config.hub_height = v;
        }
        if let Some(v) = self.backtracking {
            config.backtracking = v;
        }
        if let Some(v) = self.max_rotation {
            config.max_rotation = v;
        }
        if let Some(v) = self.rows {
            config.number_of_rows = v;
        }
        if let Some(v) = self.start_time {
            config.start_time = v;
        }
        if let Some(v) = self.end_time {
            config.end_time = v;
        }

        config.validate().context("Invalid tracker configuration")?;
        Ok(config)
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn setup_thread_pool(threads: Option<usize>) {
    let cpu_cores = threads.unwrap_or_else(num_cpus::get).max(1);
    info!("Using {} worker threads", cpu_cores);

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cpu_cores)
        .build_global()
    {
        warn!("Failed to configure Rayon thread pool: {}", e);
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap(),
    );
    pb
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn export(result: &SimulationResult, output_dir: &Path, format: ExportFormat) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let json = matches!(format, ExportFormat::Json | ExportFormat::All);
    let csv = matches!(format, ExportFormat::Csv | ExportFormat::All);
    let tiff = matches!(format, ExportFormat::Tiff | ExportFormat::All);

    if json {
        let path = output_dir.join(RasterIO::export_file_name("tracker_shading", "json"));
        RasterIO::write_json(&path, result).context("Failed to write JSON")?;
    }
    if csv {
        let path = output_dir.join(RasterIO::export_file_name("hourly_shading", "csv"));
        RasterIO::write_hourly_csv(&path, &result.hourly_heatmap)
            .context("Failed to write hourly CSV")?;
        let path = output_dir.join(RasterIO::export_file_name("ground_shadow", "csv"));
        RasterIO::write_ground_csv(&path, &result.ground_heatmap_2d)
            .context("Failed to write ground CSV")?;
    }
    if tiff {
        let path = output_dir.join(RasterIO::export_file_name("ground_shadow", "tif"));
        RasterIO::write_ground_tiff(&path, &result.ground_heatmap_2d)
            .context("Failed to write TIFF")?;
    }

    info!("Exported results to {}", output_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    setup_thread_pool(cli.threads);

    match cli.command {
        Commands::Simulate {
            tracker,
            output_dir,
            format,
            no_export,
        } => {
            let config = tracker.resolve()?;
            info!(
                "Simulating {} rows, pitch {} m, GCR {:.2}",
                config.number_of_rows,
                config.row_spacing,
                config.ground_coverage_ratio()
            );

            let start = Instant::now();
            let result = AnnualSimulation::new(&config)
                .with_progress(progress_bar())
                .run();
            info!("Simulation finished in {:.2?}", start.elapsed());

            println!("{}", report::summary(&config, &result));

            if !no_export {
                let dir = output_dir.unwrap_or_else(RasterIO::default_output_dir);
                export(&result, &dir, format)?;
            }
        }

        Commands::Instant { tracker, day, hour } => {
            let config = tracker.resolve()?;
            if !(1..=365).contains(&day) {
                bail!("Day of year must be in [1, 365], got {}", day);
            }

            let state = instantaneous_state(day, hour, &config);
            println!("{}", serde_json::to_string_pretty(&state)?);
            if !state.is_valid {
                info!("Sun is below the horizon, tracker stowed flat");
            }
        }

        Commands::Sweep {
            tracker,
            from,
            to,
            step,
        } => {
            let config = tracker.resolve()?;
            if !(from > 0.0 && to >= from && step > 0.0) {
                bail!("Sweep needs 0 < from <= to and step > 0");
            }

            let count = ((to - from) / step + 1e-9).floor() as usize + 1;
            let spacings: Vec<f64> = (0..count).map(|i| from + i as f64 * step).collect();

            let pb = spinner(&format!("Simulating {} row spacings...", spacings.len()));
            let points = sweep_row_spacing(&config, &spacings);
            pb.finish_and_clear();

            println!("{}", report::sweep_table(&points));
        }
    }

    Ok(())
}
