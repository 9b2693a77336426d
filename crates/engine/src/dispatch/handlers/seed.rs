//! SET_SEED: reseed the deterministic RNG and clear the roll history.

use crate::error::EngineError;
use crate::state::{EventBody, GameState, RngMode};

pub(crate) fn apply(state: &mut GameState, seed: &str) -> Result<(), EngineError> {
    let previous_seed = state.rng.seed.clone();
    let previous_mode = state.rng.mode;

    state.rng.seed = Some(seed.to_string());
    state.rng.mode = RngMode::Seeded;
    state.rng.last_rolls.clear();

    state.push_event(EventBody::RngSeedSet {
        previous_seed,
        previous_mode,
        next_seed: seed.to_string(),
        mode: RngMode::Seeded,
    });
    Ok(())
}
