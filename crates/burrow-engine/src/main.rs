//! Engine binary for the Burrow agent economy.
//!
//! Loads the configuration, builds the coordinator (reusing the cost cache
//! from a previous run when it still matches the world), and runs the
//! simulation loop until a bound is hit, every node is exhausted, or the
//! process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `burrow-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the coordinator, from the cost cache when one is present
//! 4. Write the cost cache back
//! 5. Create operator state and hook Ctrl-C to a clean stop
//! 6. Run the simulation loop
//! 7. Log the result

mod error;
mod report;

use std::path::Path;
use std::sync::Arc;

use burrow_agents::StubPolicy;
use burrow_core::config::LogFormat;
use burrow_core::{Coordinator, OperatorState, SimulationConfig, runner};
use burrow_world::snapshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::ReportCallback;

const DEFAULT_CONFIG_PATH: &str = "burrow-config.yaml";

/// Policy outputs: a direction pair plus one flag.
const POLICY_OUTPUTS: usize = 3;

/// Ticks between status lines.
const STATUS_EVERY: u64 = 100;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so a missing file is
    //    reported after step 2.
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config_exists = Path::new(&config_path).exists();
    let config = load_config(&config_path, config_exists)?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!("burrow-engine starting");
    if !config_exists {
        info!(path = %config_path, "Config file not found, using defaults");
    }
    info!(
        width = config.world.width,
        height = config.world.height,
        nodes = config.nodes.len(),
        seed = config.world.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the coordinator.
    let policy = Arc::new(StubPolicy::new(POLICY_OUTPUTS));
    let cache_path = config.simulation.cache_path.clone();
    let mut coordinator = match read_cache(&cache_path)? {
        Some(bytes) => match snapshot::load(&bytes) {
            Ok(cached) => {
                info!(path = %cache_path, saved_at = %cached.saved_at, "Loaded partition cache");
                Coordinator::restore(&config, policy, cached)?
            }
            Err(e) => {
                warn!(path = %cache_path, error = %e, "Ignoring unreadable partition cache");
                Coordinator::new(&config, policy)?
            }
        },
        None => Coordinator::new(&config, policy)?,
    };

    // 4. Write the cost cache back.
    if !cache_path.is_empty() {
        let bytes = coordinator.save_partition()?;
        std::fs::write(&cache_path, bytes).map_err(|source| EngineError::Cache {
            path: cache_path.clone(),
            source,
        })?;
        info!(path = %cache_path, "Partition cache written");
    }

    // 5. Create operator state.
    let operator = Arc::new(OperatorState::new(&config.simulation));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the simulation.
    let mut callback = ReportCallback::new(STATUS_EVERY);
    let result = runner::run_simulation(&mut coordinator, &operator, config.simulation.dt, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        stockpile = coordinator.stockpile(),
        "burrow-engine shutdown complete"
    );

    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init(),
    }
}

fn load_config(path: &str, exists: bool) -> Result<SimulationConfig, EngineError> {
    if exists {
        Ok(SimulationConfig::from_file(Path::new(path))?)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Read the cost cache. An empty path disables caching and a missing file
/// is not an error.
fn read_cache(path: &str) -> Result<Option<Vec<u8>>, EngineError> {
    if path.is_empty() || !Path::new(path).exists() {
        return Ok(None);
    }
    std::fs::read(path).map(Some).map_err(|source| EngineError::Cache {
        path: path.to_owned(),
        source,
    })
}
