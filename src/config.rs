use crate::error::{SimError, SimResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    ops::{Bound, RangeBounds},
    path::Path,
};

/// Largest admissible number of grid instants.
pub const MAX_N_STEPS: usize = 10_000_000;

/// Kinetic parameters of the culture.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Maximum specific growth rate (1/h).
    pub mu_max: f64,
    /// Monod half-saturation constant (g/L).
    pub k_s: f64,
    /// Biomass yield on substrate.
    pub yield_coef: f64,
    /// Biomass decay rate once substrate is exhausted (1/h).
    pub k_decay: f64,
}

/// Initial condition of the culture.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Initial biomass concentration (g/L).
    pub biomass: f64,
    /// Initial substrate concentration (g/L), also the replenishment level.
    pub substrate: f64,
}

/// Replenishment trigger.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Biomass derivative at or below which substrate is replenished.
    ///
    /// Must be negative; `-inf` disables the trigger.
    pub threshold_speed: f64,
}

/// Time discretization.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Total simulated duration (h).
    pub total_time: f64,
    /// Step size (h).
    pub dt: f64,
}

/// Observation model.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ObsConfig {
    /// Standard deviation of the Gaussian observation noise.
    pub noise_std: f64,
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub init: InitConfig,
    pub control: ControlConfig,
    pub time: TimeConfig,
    pub obs: ObsConfig,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check every parameter against its admissible range.
    pub fn validate(&self) -> SimResult<()> {
        let positive = (Bound::Excluded(0.0), Bound::Included(f64::MAX));
        let non_negative = 0.0..=f64::MAX;

        check_num("maximum growth rate", self.model.mu_max, non_negative.clone())?;
        check_num("half-saturation constant", self.model.k_s, positive)?;
        check_nonzero("yield coefficient", self.model.yield_coef)?;
        check_num("decay rate", self.model.k_decay, non_negative.clone())?;

        check_num("initial biomass", self.init.biomass, non_negative.clone())?;
        check_num("initial substrate", self.init.substrate, non_negative.clone())?;

        let negative = (Bound::Included(f64::NEG_INFINITY), Bound::Excluded(0.0));
        check_num("threshold speed", self.control.threshold_speed, negative)?;

        check_num("total time", self.time.total_time, positive)?;
        check_num("time step", self.time.dt, positive)?;
        check_num(
            "number of steps",
            self.step_ratio().floor(),
            1.0..=MAX_N_STEPS as f64,
        )?;

        check_num("noise standard deviation", self.obs.noise_std, non_negative)?;

        Ok(())
    }

    /// Number of grid instants, `floor(total_time / dt)`.
    ///
    /// The ratio is nudged by a relative 1e-12 so that representation
    /// error does not drop a step (e.g. `0.3 / 0.1`).
    pub fn n_steps(&self) -> usize {
        self.step_ratio().floor() as usize
    }

    fn step_ratio(&self) -> f64 {
        self.time.total_time / self.time.dt * (1.0 + 1e-12)
    }

    /// Time instant of grid index `i`.
    pub fn time_point(&self, i: usize) -> f64 {
        i as f64 * self.time.dt
    }

    /// The full ascending time grid `t_i = i * dt`.
    pub fn time_points(&self) -> Vec<f64> {
        (0..self.n_steps()).map(|i| self.time_point(i)).collect()
    }
}

fn check_num<R>(name: &str, num: f64, range: R) -> SimResult<()>
where
    R: RangeBounds<f64> + Debug,
{
    if !range.contains(&num) {
        return Err(SimError::Config(format!(
            "invalid {name}: number must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

fn check_nonzero(name: &str, num: f64) -> SimResult<()> {
    if !num.is_finite() || num == 0.0 {
        return Err(SimError::Config(format!(
            "invalid {name}: number must be finite and non-zero, but is {num:?}"
        )));
    }
    Ok(())
}
