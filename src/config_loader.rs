use crate::config::SimConfig;
use crate::topology::NodeId;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<SimConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file '{}'", config_path.display()))?;

    let config: SimConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub horizon: Option<Duration>,
    pub seed: Option<u64>,
    pub attackers: Option<Vec<NodeId>>,
    pub no_attack: bool,
}

/// Apply CLI overrides to a configuration and re-validate it
pub fn apply_overrides(config: &mut SimConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(horizon) = overrides.horizon {
        info!("Overriding horizon: {:?}", horizon);
        config.general.horizon = horizon;

        // Keep the application windows inside a shortened run
        if config.traffic.stop > horizon {
            info!("Session stop clamped from {:?} to {:?}", config.traffic.stop, horizon);
            config.traffic.stop = horizon;
        }
        if config.traffic.sink_stop > horizon {
            config.traffic.sink_stop = horizon;
        }
    }

    if let Some(seed) = overrides.seed {
        info!("Overriding seed: {}", seed);
        config.general.seed = seed;
    }

    if let Some(attackers) = &overrides.attackers {
        info!("Overriding attackers: {:?}", attackers);
        config.roles.attackers = attackers.clone();
    }

    if overrides.no_attack {
        info!("Attack disabled, running without attackers");
        config.roles.attackers.clear();
    }

    config.validate()?;

    Ok(())
}
