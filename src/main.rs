use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scratch_assay::layout::{read_results, LayoutColumns, WellRecord};
use scratch_assay::plot::{render_cohort_plot, Metric, PlotOptions};
use scratch_assay::{Assay, AssayConfig, FitOverride};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scratch-assay")]
#[command(version, about = "Scratch assay migration velocity analysis", long_about = None)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit every well of a layout and write results and plots
    Analyze {
        /// TOML session config
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Objective magnification (4x, 10x, 20x)
        #[arg(short, long, value_name = "LABEL")]
        magnification: Option<String>,

        /// Session date label, e.g. 20181102
        #[arg(short, long, value_name = "YYYYMMDD")]
        date: Option<String>,

        /// Reference image giving the frame size
        #[arg(long, value_name = "FILE")]
        reference_image: Option<PathBuf>,

        /// Layout metadata file
        #[arg(long, value_name = "FILE")]
        layout: Option<PathBuf>,

        /// Directory of per-well measurement files
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Fit-end override for some wells, e.g. "1,3=0.4" (repeatable)
        #[arg(long = "override", value_name = "INDICES=END")]
        overrides: Vec<String>,

        /// Skip all plots
        #[arg(long)]
        no_plots: bool,

        /// Write the batch report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Combine results files into one cohort plot
    Summarize {
        /// Results files written by `analyze`
        #[arg(value_name = "RESULTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Metric to plot (velocity, closure_time, slope, r_squared)
        #[arg(long, value_name = "METRIC", default_value = "velocity")]
        metric: String,

        /// Output file stem (metric name when unset)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Treatment order, comma separated
        #[arg(long, value_name = "A,B,..", value_delimiter = ',')]
        treatments: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            config,
            magnification,
            date,
            reference_image,
            layout,
            data_dir,
            out_dir,
            overrides,
            no_plots,
            report,
        } => {
            let mut config = match config {
                Some(path) => AssayConfig::from_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => AssayConfig::default(),
            };
            config.magnification = magnification.or(config.magnification);
            config.date = date.or(config.date);
            config.reference_image = reference_image.or(config.reference_image);
            config.layout_path = layout.or(config.layout_path);
            config.output_dir = out_dir.or(config.output_dir);
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            for raw in &overrides {
                config.overrides.push(raw.parse::<FitOverride>()?);
            }
            if no_plots {
                config.plots.enabled = false;
            }
            config.validate()?;

            let mut assay = Assay::open(config).context("Failed to open assay session")?;
            let batch = assay.run()?;

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&batch)?;
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
            }
            if let Some(path) = &batch.results_path {
                info!(path = %path.display(), "Results written");
            }
            if !batch.is_clean() {
                warn!(
                    analyzed = batch.analyzed,
                    failed = batch.failures.len(),
                    "Some wells could not be analyzed"
                );
            }
            if batch.analyzed == 0 && !batch.failures.is_empty() {
                bail!("no well could be analyzed");
            }
        }

        Commands::Summarize {
            inputs,
            out_dir,
            metric,
            name,
            treatments,
        } => {
            let metric: Metric = metric.parse()?;
            let mut records: Vec<WellRecord> = Vec::new();
            for path in &inputs {
                let table = read_results(path, &LayoutColumns::default())
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                info!(path = %path.display(), wells = table.len(), "Loaded results");
                records.extend(table.iter().cloned());
            }

            let options = PlotOptions {
                metric,
                treatment_order: (!treatments.is_empty()).then_some(treatments),
                ..PlotOptions::default()
            };
            let stem = name.unwrap_or_else(|| options.cohort_stem(""));
            let files = render_cohort_plot(&records, &options, &out_dir, &stem)?;
            for file in files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}
