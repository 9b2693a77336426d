//! File round-tripping for replay bundles and scenario states.
//!
//! Persisted files are plain JSON: `*.replay.json` for bundles and
//! `*.scenario.json` for initial states.

use std::fs;
use std::path::Path;

use crate::replay::ReplayBundle;
use crate::state::GameState;

pub const REPLAY_SUFFIX: &str = ".replay.json";
pub const SCENARIO_SUFFIX: &str = ".scenario.json";

#[derive(Debug, thiserror::Error)]
pub enum ReplayIoError {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_bundle(path: &Path) -> Result<ReplayBundle, ReplayIoError> {
    let text = fs::read_to_string(path)?;
    let bundle = serde_json::from_str(&text)?;
    tracing::info!(path = %path.display(), "replay bundle loaded");
    Ok(bundle)
}

pub fn save_bundle(path: &Path, bundle: &ReplayBundle) -> Result<(), ReplayIoError> {
    fs::write(path, serde_json::to_string_pretty(bundle)?)?;
    tracing::info!(path = %path.display(), steps = bundle.steps.len(), "replay bundle saved");
    Ok(())
}

pub fn load_scenario(path: &Path) -> Result<GameState, ReplayIoError> {
    let text = fs::read_to_string(path)?;
    let state = serde_json::from_str(&text)?;
    tracing::info!(path = %path.display(), "scenario loaded");
    Ok(state)
}

pub fn save_scenario(path: &Path, state: &GameState) -> Result<(), ReplayIoError> {
    fs::write(path, serde_json::to_string_pretty(state)?)?;
    tracing::info!(path = %path.display(), "scenario saved");
    Ok(())
}
