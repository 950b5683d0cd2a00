//! Growth and decay rate laws.

use crate::config::ModelConfig;
use crate::error::{SimError, SimResult};
use crate::model::State;

/// Substrate level at or below which the culture is starving.
pub const SUBSTRATE_FLOOR: f64 = 1e-3;

/// Kinetic regime of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Monod growth consuming substrate.
    Growth,
    /// First-order biomass decay, no substrate uptake.
    Decay,
}

/// Select the regime from the substrate level alone.
pub fn select_regime(substrate: f64) -> Regime {
    if substrate > SUBSTRATE_FLOOR {
        Regime::Growth
    } else {
        Regime::Decay
    }
}

/// Time derivatives of biomass and substrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub d_biomass: f64,
    pub d_substrate: f64,
}

/// Compute the derivatives at `state` under the regime its substrate selects.
///
/// # Errors
/// Returns [`SimError::Numerical`] if the Monod denominator vanishes
/// or a derivative is not finite.
pub fn compute_rates(model: &ModelConfig, state: State) -> SimResult<Rates> {
    let rates = match select_regime(state.substrate) {
        Regime::Growth => {
            let denom = model.k_s + state.substrate;
            if denom == 0.0 {
                return Err(SimError::Numerical(format!(
                    "zero Monod denominator at substrate {}",
                    state.substrate
                )));
            }
            let mu = model.mu_max * state.substrate / denom;
            let d_biomass = mu * state.biomass;
            Rates {
                d_biomass,
                d_substrate: -d_biomass / model.yield_coef,
            }
        }
        Regime::Decay => Rates {
            d_biomass: -model.k_decay * state.biomass,
            d_substrate: 0.0,
        },
    };

    if !rates.d_biomass.is_finite() || !rates.d_substrate.is_finite() {
        return Err(SimError::Numerical(format!(
            "non-finite rates {rates:?} at {state:?}"
        )));
    }

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelConfig {
        ModelConfig {
            mu_max: 1.2,
            k_s: 2.0,
            yield_coef: 0.6,
            k_decay: 0.8,
        }
    }

    #[test]
    fn regime_switches_at_floor() {
        assert_eq!(select_regime(30.0), Regime::Growth);
        assert_eq!(select_regime(0.0011), Regime::Growth);
        assert_eq!(select_regime(SUBSTRATE_FLOOR), Regime::Decay);
        assert_eq!(select_regime(0.0), Regime::Decay);
    }

    #[test]
    fn growth_follows_monod() {
        let state = State {
            biomass: 2.0,
            substrate: 2.0,
        };
        let rates = compute_rates(&model(), state).unwrap();
        // mu = 1.2 * 2 / (2 + 2) = 0.6
        assert!((rates.d_biomass - 1.2).abs() < 1e-12);
        assert!((rates.d_substrate + 2.0).abs() < 1e-12);
    }

    #[test]
    fn formula_changes_across_floor() {
        let above = State {
            biomass: 5.0,
            substrate: 0.0011,
        };
        let below = State {
            biomass: 5.0,
            substrate: 0.0009,
        };

        let growth = compute_rates(&model(), above).unwrap();
        assert!(growth.d_biomass > 0.0);
        assert!(growth.d_substrate < 0.0);

        let decay = compute_rates(&model(), below).unwrap();
        assert_eq!(decay.d_biomass, -0.8 * 5.0);
        assert_eq!(decay.d_substrate, 0.0);
    }

    #[test]
    fn degenerate_denominator_fails() {
        let mut model = model();
        model.k_s = -1.0;
        let state = State {
            biomass: 1.0,
            substrate: 1.0,
        };
        assert!(matches!(
            compute_rates(&model, state),
            Err(SimError::Numerical(_))
        ));
    }

    #[test]
    fn non_finite_rates_fail() {
        let state = State {
            biomass: f64::INFINITY,
            substrate: 0.0,
        };
        assert!(matches!(
            compute_rates(&model(), state),
            Err(SimError::Numerical(_))
        ));
    }
}
