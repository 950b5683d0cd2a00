use crate::config::Config;
use crate::engine::Engine;
use crate::model::Run;
use crate::observation::observe;
use crate::stats::Summary;
use anyhow::{Context, Result};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const OUTPUT_FILE: &str = "output.msgpack";
const SUMMARY_FILE: &str = "summary.msgpack";

/// Everything a run produces, as written to disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunRecord {
    /// Seed of the observation noise.
    pub seed: u64,
    pub run: Run,
    pub observed: Vec<f64>,
}

/// Simulation directory holding a `config.toml` and one `run-NNNN` directory per run.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Simulate a new run and save its record.
    ///
    /// Without a `seed`, a fresh one is drawn from the OS and recorded.
    /// The run directory is only created once the run has succeeded.
    pub fn create_run(&self, seed: Option<u64>) -> Result<PathBuf> {
        let seed = match seed {
            Some(seed) => seed,
            None => ChaCha12Rng::try_from_os_rng()?.random(),
        };

        let engine = Engine::new(self.cfg.clone()).context("failed to construct engine")?;
        let run = engine
            .perform_simulation()
            .context("failed to perform simulation")?;
        let observed = observe(&run.trajectory.biomass(), self.cfg.obs.noise_std, seed)
            .context("failed to observe trajectory")?;
        log::info!("recorded {} trigger events", run.events.len());

        let record = RunRecord {
            seed,
            run,
            observed,
        };

        let run_idx = self.next_run_idx().context("failed to find next run index")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let output_file = run_dir.join(OUTPUT_FILE);
        if let Err(error) = write_msgpack(&output_file, &record) {
            fs::remove_dir_all(&run_dir).ok();
            return Err(error.context(format!("failed to save {output_file:?}")));
        }

        Ok(run_dir)
    }

    /// Summarize every run and save the summaries.
    pub fn analyze_sim(&self) -> Result<Vec<Summary>> {
        let run_dirs = self.run_dirs().context("failed to list run dirs")?;

        let mut summaries = Vec::with_capacity(run_dirs.len());
        for run_dir in run_dirs {
            let output_file = run_dir.join(OUTPUT_FILE);
            let record: RunRecord = read_msgpack(&output_file)
                .with_context(|| format!("failed to load {output_file:?}"))?;

            let summary = Summary::new(&record.run, &record.observed);
            log::info!("{run_dir:?}: {summary:#?}");

            let summary_file = run_dir.join(SUMMARY_FILE);
            write_msgpack(&summary_file, &summary)
                .with_context(|| format!("failed to save {summary_file:?}"))?;

            summaries.push(summary);
        }

        Ok(summaries)
    }

    /// Remove every run directory.
    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    /// One past the highest existing run index, so gaps are never reused.
    fn next_run_idx(&self) -> Result<usize> {
        let next = self
            .run_dirs()?
            .iter()
            .filter_map(|run_dir| {
                let name = run_dir.file_name()?.to_str()?;
                name.strip_prefix("run-")?.parse::<usize>().ok()
            })
            .max()
            .map_or(0, |run_idx| run_idx + 1);
        Ok(next)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }
}

fn write_msgpack<T: Serialize>(file: &Path, value: &T) -> Result<()> {
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

fn read_msgpack<T: for<'de> Deserialize<'de>>(file: &Path) -> Result<T> {
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    let value = decode::from_read(&mut reader).context("failed to deserialize value")?;
    Ok(value)
}
