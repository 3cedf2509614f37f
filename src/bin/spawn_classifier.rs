//! spawn-classifier: run one classification round for every spawn point
//! with sightings not yet folded into its record.
//!
//! Usage: `spawn-classifier [config.json]`. Without an argument the config is
//! read from `~/.spawnscan/config.json` when present, else defaults apply.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use spawnscan::db::SpawnDb;
use spawnscan::rounds::{run_rounds, PointLocks};
use spawnscan::types::{default_config_path, load_config, Config};

fn resolve_config() -> Result<Config, String> {
    if let Some(arg) = std::env::args().nth(1) {
        return load_config(&PathBuf::from(arg));
    }
    let path = default_config_path()?;
    if path.exists() {
        load_config(&path)
    } else {
        log::info!("No config at {}, using defaults", path.display());
        Ok(Config::default())
    }
}

fn run() -> Result<(), String> {
    let config = resolve_config()?;
    let db_path = config.resolved_db_path()?;
    let db = SpawnDb::open_at(db_path.clone())
        .map_err(|e| format!("Failed to open database at {}: {e}", db_path.display()))?;

    let locations = db
        .pending_locations()
        .map_err(|e| format!("Failed to list pending spawn points: {e}"))?;
    if locations.is_empty() {
        log::info!("No spawn points with new detections");
        return Ok(());
    }

    let locks = PointLocks::new();
    let summary = run_rounds(&db, &db, &locks, &locations);
    log::info!(
        "Classified {} spawn points: {} refined, {} unchanged, {} failed",
        summary.total(),
        summary.refined,
        summary.missed,
        summary.failed
    );

    if summary.failed > 0 {
        return Err(format!("{} spawn points could not be stored", summary.failed));
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
