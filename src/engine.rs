use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::kinetics::compute_rates;
use crate::model::{Run, State, TriggerEvent, Trajectory};

/// Simulation engine.
///
/// Integrates the culture with explicit Euler steps on the configured
/// time grid, replenishing substrate whenever biomass collapses faster
/// than the threshold allows.
pub struct Engine {
    cfg: Config,
}

impl Engine {
    /// Create a new `Engine` after validating the configuration.
    pub fn new(cfg: Config) -> SimResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Perform the whole simulation from the initial condition.
    pub fn perform_simulation(&self) -> SimResult<Run> {
        let n_steps = self.cfg.n_steps();

        let mut states = Vec::with_capacity(n_steps);
        states.push(State {
            biomass: self.cfg.init.biomass,
            substrate: self.cfg.init.substrate,
        });
        let mut events = Vec::new();

        let progress_stride = (n_steps / 10).max(1);
        for i in 1..n_steps {
            // Room for step i, so the step may amend slot i - 1 and fill slot i.
            states.push(states[i - 1]);
            if let Some(event) = self.perform_step(&mut states, i)? {
                events.push(event);
            }

            if (i + 1) % progress_stride == 0 {
                let progress = 100.0 * (i + 1) as f64 / n_steps as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        Ok(Run {
            trajectory: Trajectory {
                time: self.cfg.time_points(),
                states,
            },
            events,
        })
    }

    /// Derive `states[i]` from `states[i - 1]`.
    ///
    /// If the biomass derivative is at or below the threshold, the stored
    /// `states[i - 1].substrate` is first reset to the initial substrate and
    /// the rates are recomputed from it; the recomputed rates are not
    /// checked again. Returns the trigger event if one fired.
    ///
    /// `i` must lie in `1..states.len()`.
    ///
    /// # Errors
    /// Returns [`SimError::Numerical`] on degenerate rates or a non-finite update.
    pub(crate) fn perform_step(
        &self,
        states: &mut [State],
        i: usize,
    ) -> SimResult<Option<TriggerEvent>> {
        debug_assert!(
            (1..states.len()).contains(&i),
            "step index {i} outside 1..{}",
            states.len()
        );

        let mut prev = states[i - 1];
        let mut rates = compute_rates(&self.cfg.model, prev)?;

        let mut event = None;
        if rates.d_biomass <= self.cfg.control.threshold_speed {
            states[i - 1].substrate = self.cfg.init.substrate;
            prev.substrate = self.cfg.init.substrate;

            rates = compute_rates(&self.cfg.model, prev)?;

            let time = self.cfg.time_point(i);
            log::debug!(
                "replenished substrate at {time:.1} h, biomass {:.3}",
                prev.biomass
            );
            event = Some(TriggerEvent {
                time,
                biomass: prev.biomass,
            });
        }

        let dt = self.cfg.time.dt;
        let next = State {
            biomass: prev.biomass + rates.d_biomass * dt,
            substrate: (prev.substrate + rates.d_substrate * dt).max(0.0),
        };
        if !next.biomass.is_finite() || !next.substrate.is_finite() {
            return Err(SimError::Numerical(format!(
                "non-finite state {next:?} at step {i}"
            )));
        }
        states[i] = next;

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::reference_config;

    #[test]
    fn step_without_trigger_is_euler() {
        let engine = Engine::new(reference_config()).unwrap();
        let mut states = vec![
            State {
                biomass: 2.0,
                substrate: 2.0,
            };
            2
        ];

        let event = engine.perform_step(&mut states, 1).unwrap();
        assert_eq!(event, None);
        assert_eq!(states[0].substrate, 2.0);
        // dX = 1.2, dS = -2.0, dt = 0.1
        assert!((states[1].biomass - 2.12).abs() < 1e-12);
        assert!((states[1].substrate - 1.8).abs() < 1e-12);
    }

    #[test]
    fn trigger_amends_previous_substrate() {
        let engine = Engine::new(reference_config()).unwrap();
        // Starving culture: dX = -0.8 * 5 = -4.0 <= -0.3.
        let mut states = vec![
            State {
                biomass: 5.0,
                substrate: 0.0,
            };
            4
        ];

        let event = engine.perform_step(&mut states, 3).unwrap();
        let event = event.expect("trigger should fire");
        assert!((event.time - 0.3).abs() < 1e-12);
        assert_eq!(event.biomass, 5.0);
        assert_eq!(states[2].substrate, 30.0);

        // Rates recomputed under growth from S0.
        let mu = 1.2 * 30.0 / 32.0;
        let d_biomass = mu * 5.0;
        assert!((states[3].biomass - (5.0 + d_biomass * 0.1)).abs() < 1e-12);
        assert!((states[3].substrate - (30.0 - d_biomass / 0.6 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn recomputed_rates_are_not_rechecked() {
        let mut cfg = reference_config();
        cfg.init.substrate = 0.0005;
        let engine = Engine::new(cfg).unwrap();
        let mut states = vec![
            State {
                biomass: 5.0,
                substrate: 0.0,
            };
            2
        ];

        // S0 is below the floor, so the recomputed rates are still decay.
        let event = engine.perform_step(&mut states, 1).unwrap();
        assert!(event.is_some());
        assert_eq!(states[0].substrate, 0.0005);
        assert!((states[1].biomass - (5.0 - 0.8 * 5.0 * 0.1)).abs() < 1e-12);
        assert_eq!(states[1].substrate, 0.0005);
    }

    #[test]
    fn substrate_is_clamped() {
        let mut cfg = reference_config();
        cfg.time.dt = 1.0;
        let engine = Engine::new(cfg).unwrap();
        let mut states = vec![
            State {
                biomass: 10.0,
                substrate: 0.5,
            };
            2
        ];

        engine.perform_step(&mut states, 1).unwrap();
        assert_eq!(states[1].substrate, 0.0);
    }

    #[test]
    fn overflowing_update_fails() {
        let mut cfg = reference_config();
        cfg.time.dt = 1.0;
        let engine = Engine::new(cfg).unwrap();
        // Rates stay finite, but X + dX * dt exceeds f64::MAX.
        let mut states = vec![
            State {
                biomass: f64::MAX / 2.0,
                substrate: 30.0,
            };
            2
        ];

        assert!(matches!(
            engine.perform_step(&mut states, 1),
            Err(SimError::Numerical(_))
        ));
    }

    #[test]
    fn overflowing_run_fails() {
        let mut cfg = reference_config();
        cfg.init.biomass = f64::MAX / 2.0;
        cfg.time.dt = 1.0;
        let engine = Engine::new(cfg).unwrap();

        assert!(matches!(
            engine.perform_simulation(),
            Err(SimError::Numerical(_))
        ));
    }

    #[test]
    fn run_has_grid_length() {
        let engine = Engine::new(reference_config()).unwrap();
        let run = engine.perform_simulation().unwrap();
        assert_eq!(run.trajectory.len(), 500);
        assert_eq!(run.trajectory.time.len(), 500);
        assert_eq!(run.trajectory.states[0].biomass, 0.1);
        assert!(!run.events.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = reference_config();
        cfg.time.dt = -0.1;
        assert!(matches!(Engine::new(cfg), Err(SimError::Config(_))));
    }
}
