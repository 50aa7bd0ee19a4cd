use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;

use sinkholesim::config::SimConfig;
use sinkholesim::config_loader::{self, CliOverrides};
use sinkholesim::orchestrator::{RunOutputs, SimulationOrchestrator, TelemetryTarget};
use sinkholesim::report::{self, format_comparison, format_summary};
use sinkholesim::topology::NodeId;
use sinkholesim::SimError;

/// Sinkhole attack simulation over a wireless ad-hoc network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration YAML file (defaults to the reference scenario)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file receiving the energy telemetry
    #[arg(short, long, default_value = "energy_log.csv")]
    telemetry: PathBuf,

    /// JSON animation trace with node positions and colour changes
    #[arg(long)]
    animation_trace: Option<PathBuf>,

    /// JSON run report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Override the run horizon (e.g. "30s")
    #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
    horizon: Option<Duration>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the attacker ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    attackers: Option<Vec<NodeId>>,

    /// Run without any attacker
    #[arg(long, conflicts_with = "attackers")]
    no_attack: bool,

    /// Also run the scenario without attackers and compare deliveries
    #[arg(long)]
    compare_baseline: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            horizon: self.horizon,
            seed: self.seed,
            attackers: self.attackers.clone(),
            no_attack: self.no_attack,
        }
    }

    fn outputs(&self) -> RunOutputs {
        RunOutputs {
            telemetry: TelemetryTarget::Csv(self.telemetry.clone()),
            animation_trace: self.animation_trace.clone(),
        }
    }
}

fn load(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => {
            info!("No configuration file given, using the reference scenario");
            SimConfig::default()
        }
    };
    config_loader::apply_overrides(&mut config, &args.overrides())?;
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    info!("Starting sinkholesim");
    info!("Telemetry output: {:?}", args.telemetry);

    let config = load(&args).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let orchestrator = SimulationOrchestrator::new(config).map_err(|e| {
        if let SimError::Configuration(ref cause) = e {
            error!("Invalid configuration: {}", cause);
        }
        e
    })?;
    let outputs = args.outputs();

    if args.compare_baseline {
        let comparison = orchestrator
            .compare_with_baseline(&outputs)
            .wrap_err("Simulation failed")?;
        println!("{}", format_comparison(&comparison));
        if let Some(path) = &args.report {
            report::write_json_report(&comparison, path)?;
        }
    } else {
        let run = orchestrator.run(&outputs).wrap_err("Simulation failed")?;
        println!("{}", format_summary(&run));
        if let Some(path) = &args.report {
            report::write_json_report(&run, path)?;
        }
    }

    info!("Simulation completed successfully");
    Ok(())
}
