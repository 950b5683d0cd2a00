//! Simulation data types.

use serde::{Deserialize, Serialize};

/// State of the culture at one grid instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Biomass concentration `X` (g/L).
    pub biomass: f64,
    /// Substrate concentration `S` (g/L), never negative.
    pub substrate: f64,
}

/// Record of one substrate replenishment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Time `t_i` of the step that fired.
    pub time: f64,
    /// Biomass `X_{i-1}` at the moment of firing.
    pub biomass: f64,
}

/// States of a run on its time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub time: Vec<f64>,
    pub states: Vec<State>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Biomass column of the trajectory.
    pub fn biomass(&self) -> Vec<f64> {
        self.states.iter().map(|state| state.biomass).collect()
    }

    /// Substrate column of the trajectory.
    pub fn substrate(&self) -> Vec<f64> {
        self.states.iter().map(|state| state.substrate).collect()
    }
}

/// Outcome of one simulation: the trajectory and the trigger log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub trajectory: Trajectory,
    pub events: Vec<TriggerEvent>,
}
