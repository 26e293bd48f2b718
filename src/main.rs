use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};

use waveset_rs::catalog::{DatasetGroup, Modulation};
use waveset_rs::channel::ChannelKind;
use waveset_rs::constellation::Scheme;
use waveset_rs::sweep::{
    CancelToken, SweepConfig, WindowNorm, ZeroEnergyPolicy, parse_snr_list, run_sweep,
};
use waveset_rs::ui::progress::{ProgressManager, templates};
use waveset_rs::ui::{
    print_banner, print_constellation, print_datasets, print_hierarchy, print_report,
};
use waveset_rs::utils::logging::init_logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep SNRs and modulations into a labeled dataset
    Generate {
        /// JSON sweep configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        #[arg(long)]
        channel: Option<ChannelKind>,
        /// `start:stop:step` (stop exclusive) or `a,b,c`
        #[arg(long)]
        snr: Option<String>,
        #[arg(long)]
        window_len: Option<usize>,
        #[arg(long)]
        exemplars: Option<usize>,
        #[arg(long)]
        dataset: Option<DatasetGroup>,
        /// Explicit modulation labels, overriding the dataset group
        #[arg(long, value_delimiter = ',')]
        modulations: Option<Vec<Modulation>>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        jobs: Option<usize>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long, value_enum)]
        zero_energy: Option<ZeroEnergyPolicy>,
        #[arg(long, value_enum)]
        normalization: Option<WindowNorm>,
    },
    /// Show dataset groups, or the modulation hierarchy
    List {
        #[arg(long)]
        hierarchy: bool,
    },
    /// Print a constellation's point table
    Constellation {
        /// Scheme name, e.g. `16qam`; omit to print all
        name: Option<Scheme>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn load_config(path: Option<&Path>) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            info!("Loading sweep configuration from {}", path.display());
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        None => Ok(SweepConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            output,
            format,
            channel,
            snr,
            window_len,
            exemplars,
            dataset,
            modulations,
            seed,
            jobs,
            timeout_ms,
            zero_energy,
            normalization,
        } => {
            print_banner();
            let mut config = load_config(config.as_deref())?;
            if let Some(channel) = channel {
                config.channel = channel;
            }
            if let Some(snr) = snr {
                config.snr_vals = parse_snr_list(&snr)?;
            }
            if let Some(window_len) = window_len {
                config.window_len = window_len;
            }
            if let Some(exemplars) = exemplars {
                config.num_exemplars = exemplars;
            }
            if let Some(dataset) = dataset {
                config.dataset = dataset;
            }
            if modulations.is_some() {
                config.modulations = modulations;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.capture_timeout_ms = timeout_ms;
            }
            if let Some(zero_energy) = zero_energy {
                config.zero_energy = zero_energy;
            }
            if let Some(normalization) = normalization {
                config.normalization = normalization;
            }
            config.validate()?;

            let cancel = CancelToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || {
                warn!("Interrupted, cancelling remaining jobs");
                handler_token.cancel();
            })
            .ok(); // Ignore error if handler already set

            let total = (config.snr_vals.len() * config.modulations().len()) as u64;
            let progress = ProgressManager::new();
            progress.create_bar(
                "sweep",
                total,
                templates::SWEEP,
                config.channel.name(),
            )?;

            let report = run_sweep(&config, &cancel, |job| {
                let _ = progress.inc("sweep", 1);
                let _ = progress.set_message(
                    "sweep",
                    &format!("{} @ {} dB", job.modulation, job.snr_db),
                );
            })?;
            let _ = progress.finish("sweep", "done");

            match format {
                OutputFormat::Csv => report.dataset.write_csv(&output)?,
                OutputFormat::Json => report.dataset.write_json(&output)?,
            }
            info!(
                "Wrote {} rows x {} columns to {}",
                report.dataset.len(),
                report.dataset.column_names().len(),
                output.display()
            );
            print_report(&report);

            if cancel.is_cancelled() {
                error!("Sweep was cancelled, dataset is partial");
            }
        }
        Commands::List { hierarchy } => {
            if hierarchy {
                print_hierarchy();
            } else {
                print_datasets();
                let channels: Vec<&str> = ChannelKind::ALL
                    .iter()
                    .map(|c| c.name())
                    .collect();
                println!("channels       {}", channels.join(" "));
            }
        }
        Commands::Constellation { name } => {
            let schemes = match name {
                Some(scheme) => vec![scheme],
                None => Scheme::ALL.to_vec(),
            };
            for scheme in schemes {
                print_constellation(scheme, &scheme.build()?);
                println!();
            }
        }
    }
    Ok(())
}
