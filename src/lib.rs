//! Simulation of a Monod growth/substrate culture whose substrate is
//! replenished whenever biomass collapses faster than a threshold rate.
//!
//! [`engine::Engine`] integrates the culture with explicit Euler steps and
//! records a [`model::TriggerEvent`] for every replenishment;
//! [`observation::observe`] derives a seeded noisy view of the biomass.

pub mod config;
pub mod engine;
pub mod error;
pub mod kinetics;
pub mod manager;
pub mod model;
pub mod observation;
pub mod stats;

pub use config::Config;
pub use engine::Engine;
pub use error::{SimError, SimResult};
pub use model::{Run, State, Trajectory, TriggerEvent};
