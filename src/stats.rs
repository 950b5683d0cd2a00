use crate::model::Run;
use serde::{Deserialize, Serialize};

/// Online mean and sample variance (Welford).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n_steps: usize,
    pub n_triggers: usize,
    pub first_trigger_time: Option<f64>,
    pub final_biomass: f64,
    pub final_substrate: f64,
    pub peak_biomass: f64,
    /// Statistics of `observed - biomass`.
    pub residual: AccumulatorReport,
}

impl Summary {
    pub fn new(run: &Run, observed: &[f64]) -> Self {
        let states = &run.trajectory.states;
        let last = states.last();

        let mut residual = Accumulator::new();
        for (state, &obs) in states.iter().zip(observed) {
            residual.add(obs - state.biomass);
        }

        Self {
            n_steps: states.len(),
            n_triggers: run.events.len(),
            first_trigger_time: run.events.first().map(|event| event.time),
            final_biomass: last.map_or(f64::NAN, |state| state.biomass),
            final_substrate: last.map_or(f64::NAN, |state| state.substrate),
            peak_biomass: states
                .iter()
                .map(|state| state.biomass)
                .fold(f64::NEG_INFINITY, f64::max),
            residual: residual.report(),
        }
    }
}
