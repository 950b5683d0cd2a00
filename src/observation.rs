//! Noisy observation of the biomass trajectory.

use crate::error::{SimError, SimResult};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Normal;

/// Add i.i.d. Gaussian noise `N(0, noise_std)` to every biomass value.
///
/// The random stream is owned by this call and seeded from `seed`,
/// so equal inputs give bit-identical output.
///
/// # Errors
/// Returns [`SimError::Config`] if `noise_std` is negative or not finite.
pub fn observe(biomass: &[f64], noise_std: f64, seed: u64) -> SimResult<Vec<f64>> {
    if !noise_std.is_finite() || noise_std < 0.0 {
        return Err(SimError::Config(format!(
            "invalid noise standard deviation: must be finite and non-negative, but is {noise_std:?}"
        )));
    }
    let noise_dist =
        Normal::new(0.0, noise_std).map_err(|error| SimError::Config(error.to_string()))?;

    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let observed = biomass
        .iter()
        .map(|&val| val + noise_dist.sample(&mut rng))
        .collect();

    Ok(observed)
}
