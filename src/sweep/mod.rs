//! Dataset sweep: for every (SNR, modulation) pair, capture an impaired
//! stream and cut it into labeled, normalized windows.

pub mod capture;
pub mod window;

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use capture::{CancelToken, capture};
pub use window::{
    OffsetWalk, WindowNorm, WindowPlan, ZeroEnergyPolicy, capture_capacity,
    draw_offsets, normalize_window, worst_case_extent,
};

use crate::catalog::{DatasetGroup, Modulation};
use crate::channel::ChannelKind;
use crate::dataset::{Dataset, Exemplar};
use crate::error::{ConfigError, SweepError, SweepResult};
use crate::source::WaveformSource;
use crate::utils::consts::{
    CAPTURE_FACTOR, CAPTURE_MARGIN, DEFAULT_CAPTURE_TIMEOUT_MS,
    DEFAULT_EXEMPLARS_PER_KEY, DEFAULT_SEED, DEFAULT_SNR_RANGE,
    DEFAULT_WINDOW_LEN, MAX_SNR_VALUES,
};

/// Everything a sweep needs. Deserializable so a JSON file can supply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    #[serde(alias = "channel_type")]
    pub channel: ChannelKind,
    pub snr_vals: Vec<f32>,
    #[serde(alias = "num_cplx_samples")]
    pub window_len: usize,
    #[serde(alias = "num_exemplars_per_key")]
    pub num_exemplars: usize,
    pub dataset: DatasetGroup,
    /// Explicit modulation list; overrides `dataset` when set.
    pub modulations: Option<Vec<Modulation>>,
    pub seed: u64,
    pub margin: usize,
    pub capture_factor: usize,
    pub capture_timeout_ms: u64,
    /// Worker threads.
    pub jobs: usize,
    pub zero_energy: ZeroEnergyPolicy,
    pub normalization: WindowNorm,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::Awgn,
            snr_vals: parse_snr_list(DEFAULT_SNR_RANGE).unwrap_or_default(),
            window_len: DEFAULT_WINDOW_LEN,
            num_exemplars: DEFAULT_EXEMPLARS_PER_KEY,
            dataset: DatasetGroup::AllTx,
            modulations: None,
            seed: DEFAULT_SEED,
            margin: CAPTURE_MARGIN,
            capture_factor: CAPTURE_FACTOR,
            capture_timeout_ms: DEFAULT_CAPTURE_TIMEOUT_MS,
            jobs: 1,
            zero_energy: ZeroEnergyPolicy::Fail,
            normalization: WindowNorm::UnitEnergy,
        }
    }
}

impl SweepConfig {
    pub fn capacity(&self) -> Result<usize, ConfigError> {
        capture_capacity(
            self.window_len,
            self.num_exemplars,
            self.capture_factor,
            self.margin,
        )
        .ok_or_else(|| self.too_large())
    }

    fn too_large(&self) -> ConfigError {
        ConfigError::InvalidSampler(format!(
            "{} windows of {} samples overflow the capture size",
            self.num_exemplars, self.window_len
        ))
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn window_plan(&self) -> WindowPlan {
        WindowPlan {
            window_len: self.window_len,
            num_exemplars: self.num_exemplars,
            margin: self.margin,
            zero_energy: self.zero_energy,
            norm: self.normalization,
        }
    }

    pub fn modulations(&self) -> Vec<Modulation> {
        match &self.modulations {
            Some(list) => list.clone(),
            None => self.dataset.modulations().to_vec(),
        }
    }

    /// Reject anything that would fail only after streaming started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_len == 0 {
            return Err(ConfigError::InvalidSampler(
                "window length must be positive".to_string(),
            ));
        }
        if self.num_exemplars == 0 {
            return Err(ConfigError::InvalidSampler(
                "exemplars per key must be positive".to_string(),
            ));
        }
        if self.capture_factor == 0 {
            return Err(ConfigError::InvalidSampler(
                "capture factor must be positive".to_string(),
            ));
        }
        if self.jobs == 0 {
            return Err(ConfigError::InvalidSampler(
                "at least one worker is required".to_string(),
            ));
        }
        if self.snr_vals.is_empty()
            || self.snr_vals.len() > MAX_SNR_VALUES
            || self.snr_vals.iter().any(|v| !v.is_finite())
        {
            return Err(ConfigError::InvalidSnrList(format!("{:?}", self.snr_vals)));
        }
        if self.modulations.as_ref().is_some_and(|list| list.is_empty()) {
            return Err(ConfigError::InvalidSampler(
                "modulation list is empty".to_string(),
            ));
        }

        let required =
            worst_case_extent(self.window_len, self.num_exemplars, self.margin)
                .ok_or_else(|| self.too_large())?;
        let capacity = self.capacity()?;
        if required > capacity {
            return Err(ConfigError::WindowsExceedCapture {
                window_len: self.window_len,
                num_exemplars: self.num_exemplars,
                required,
                capacity,
            });
        }
        Ok(())
    }

    /// All jobs, SNR outer and modulation inner.
    pub fn plan(&self) -> Result<Vec<SweepJob>, ConfigError> {
        self.validate()?;
        let modulations = self.modulations();
        let mut jobs = Vec::with_capacity(self.snr_vals.len() * modulations.len());
        for &snr_db in &self.snr_vals {
            for &modulation in &modulations {
                let index = jobs.len();
                jobs.push(SweepJob::new(
                    index,
                    modulation,
                    self.channel,
                    snr_db,
                    derive_seed(self.seed, index),
                ));
            }
        }
        Ok(jobs)
    }
}

/// Parse `start:stop:step` (stop exclusive) or a comma-separated list.
pub fn parse_snr_list(text: &str) -> Result<Vec<f32>, ConfigError> {
    let invalid = || ConfigError::InvalidSnrList(text.to_string());
    let text = text.trim();

    if text.contains(':') {
        let parts: Vec<f32> = text
            .split(':')
            .map(|p| p.trim().parse::<f32>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;
        let [start, stop, step] = parts[..] else {
            return Err(invalid());
        };
        if step == 0.0 || !step.is_finite() || !start.is_finite() || !stop.is_finite() {
            return Err(invalid());
        }
        let count = ((stop - start) / step).ceil();
        if !(count > 0.0 && count <= MAX_SNR_VALUES as f32) {
            return Err(invalid());
        }
        return Ok((0..count as usize)
            .map(|i| start + i as f32 * step)
            .collect());
    }

    let values: Vec<f32> = text
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    if values.len() > MAX_SNR_VALUES || values.iter().any(|v| !v.is_finite()) {
        return Err(invalid());
    }
    Ok(values)
}

fn derive_seed(sweep_seed: u64, index: usize) -> u64 {
    StdRng::seed_from_u64(sweep_seed.wrapping_add(index as u64)).random()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Streaming,
    Captured,
    Windowed,
    Emitted,
    Failed,
}

/// One (SNR, modulation) pair under a channel.
#[derive(Debug, Clone)]
pub struct SweepJob {
    pub index: usize,
    pub modulation: Modulation,
    pub channel: ChannelKind,
    pub snr_db: f32,
    pub seed: u64,
    state: JobState,
}

impl SweepJob {
    pub fn new(
        index: usize,
        modulation: Modulation,
        channel: ChannelKind,
        snr_db: f32,
        seed: u64,
    ) -> Self {
        Self {
            index,
            modulation,
            channel,
            snr_db,
            seed,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn advance(&mut self, next: JobState) {
        debug!(
            "Job {} ({} @ {} dB): {:?} -> {:?}",
            self.index, self.modulation, self.snr_db, self.state, next
        );
        self.state = next;
    }

    /// Independent seeds for the transmitter, the channel and the offset walk.
    fn stage_seeds(&self) -> [u64; 3] {
        let mut rng = StdRng::seed_from_u64(self.seed);
        [rng.random(), rng.random(), rng.random()]
    }

    /// Run with the modulation's own transmitter.
    pub fn run(
        &mut self,
        config: &SweepConfig,
        cancel: &CancelToken,
    ) -> SweepResult<Vec<Exemplar>> {
        let [source_seed, _, _] = self.stage_seeds();
        match self.modulation.build_source(source_seed) {
            Ok(source) => self.run_with_source(source, config, cancel),
            Err(err) => {
                self.advance(JobState::Failed);
                Err(err.into())
            }
        }
    }

    /// Run against an arbitrary source. Rows are labeled with the job's
    /// modulation.
    pub fn run_with_source(
        &mut self,
        source: Box<dyn WaveformSource>,
        config: &SweepConfig,
        cancel: &CancelToken,
    ) -> SweepResult<Vec<Exemplar>> {
        let result = self.execute(source, config, cancel);
        if result.is_err() {
            self.advance(JobState::Failed);
        }
        result
    }

    fn execute(
        &mut self,
        source: Box<dyn WaveformSource>,
        config: &SweepConfig,
        cancel: &CancelToken,
    ) -> SweepResult<Vec<Exemplar>> {
        let [_, channel_seed, window_seed] = self.stage_seeds();
        let channel = self.channel.build(self.snr_db, channel_seed);

        self.advance(JobState::Streaming);
        let samples = capture(
            source,
            channel,
            config.capacity()?,
            config.capture_timeout(),
            cancel,
        )?;
        self.advance(JobState::Captured);

        let mut rng = StdRng::seed_from_u64(window_seed);
        let windows = config.window_plan().extract(&samples, &mut rng)?;
        drop(samples);
        self.advance(JobState::Windowed);

        let label = self.modulation.label();
        let rows = windows
            .iter()
            .map(|(_, window)| Exemplar::from_window(window, label, self.snr_db))
            .collect();
        self.advance(JobState::Emitted);
        Ok(rows)
    }
}

/// A job that did not produce rows.
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub index: usize,
    pub modulation: Modulation,
    pub snr_db: f32,
    pub error: SweepError,
}

#[derive(Debug)]
pub struct SweepReport {
    pub dataset: Dataset,
    pub completed: usize,
    pub failures: Vec<JobFailure>,
}

impl SweepReport {
    pub fn total_jobs(&self) -> usize {
        self.completed + self.failures.len()
    }
}

/// Run every job of `config`. `on_job_done` is called from worker threads
/// as each job finishes. Rows are merged in job order, so the dataset is
/// the same for any worker count.
pub fn run_sweep<F>(
    config: &SweepConfig,
    cancel: &CancelToken,
    on_job_done: F,
) -> Result<SweepReport, ConfigError>
where
    F: Fn(&SweepJob) + Sync,
{
    let jobs = config.plan()?;
    let total = jobs.len();
    let workers = config.jobs.min(total).max(1);
    info!(
        "Sweep: {} jobs ({} SNRs x {} modulations), channel {}, {} worker(s)",
        total,
        config.snr_vals.len(),
        config.modulations().len(),
        config.channel,
        workers
    );

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<SweepJob>();
    for job in jobs {
        // receiver is alive, send cannot fail
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            let on_job_done = &on_job_done;
            scope.spawn(move || {
                while let Ok(mut job) = job_rx.recv() {
                    let result = if cancel.is_cancelled() {
                        job.advance(JobState::Failed);
                        Err(SweepError::Cancelled { captured: 0 })
                    } else {
                        job.run(config, cancel)
                    };
                    on_job_done(&job);
                    if done_tx.send((job, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(done_tx);

    let mut results: Vec<(SweepJob, SweepResult<Vec<Exemplar>>)> =
        done_rx.iter().collect();
    results.sort_by_key(|(job, _)| job.index);

    let mut report = SweepReport {
        dataset: Dataset::new(config.window_len),
        completed: 0,
        failures: Vec::new(),
    };
    for (job, result) in results {
        let outcome = result.and_then(|rows| {
            report.dataset.push_batch(rows).map_err(|err| {
                SweepError::Config(ConfigError::InvalidSampler(err.to_string()))
            })
        });
        match outcome {
            Ok(()) => report.completed += 1,
            Err(error) => {
                warn!(
                    "Job {} ({} @ {} dB) failed: {}",
                    job.index, job.modulation, job.snr_db, error
                );
                report.failures.push(JobFailure {
                    index: job.index,
                    modulation: job.modulation,
                    snr_db: job.snr_db,
                    error,
                });
            }
        }
    }

    info!(
        "Sweep finished: {} rows, {}/{} jobs ok",
        report.dataset.len(),
        report.completed,
        total
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SweepConfig {
        SweepConfig {
            channel: ChannelKind::Awgn,
            snr_vals: vec![10.0],
            window_len: 8,
            num_exemplars: 10,
            modulations: Some(vec![Modulation::Bpsk]),
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_parse_snr_range_is_stop_exclusive() {
        let snrs = parse_snr_list("-20:20:2").unwrap();
        assert_eq!(snrs.len(), 20);
        assert_eq!(snrs[0], -20.0);
        assert_eq!(snrs[19], 18.0);
    }

    #[test]
    fn test_parse_snr_list_forms() {
        assert_eq!(parse_snr_list("0, 5,10").unwrap(), vec![0.0, 5.0, 10.0]);
        assert_eq!(parse_snr_list("10:0:-5").unwrap(), vec![10.0, 5.0]);
        assert!(parse_snr_list("0:10:0").is_err());
        assert!(parse_snr_list("1:2").is_err());
        assert!(parse_snr_list("loud").is_err());
        assert!(parse_snr_list("5:0:1").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SweepConfig::default();
        config.validate().unwrap();
        assert_eq!(config.capacity(), Ok(640_500));
        assert_eq!(config.modulations().len(), 29);
    }

    #[test]
    fn test_oversized_windows_rejected_before_streaming() {
        let config = SweepConfig {
            capture_factor: 1,
            ..small_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WindowsExceedCapture { .. })
        ));
    }

    #[test]
    fn test_overflowing_sizes_rejected_before_streaming() {
        let config = SweepConfig {
            window_len: 1 << 40,
            num_exemplars: 1 << 30,
            ..small_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampler(_))
        ));
        assert!(config.capacity().is_err());
        assert!(config.plan().is_err());

        let config = SweepConfig {
            margin: usize::MAX,
            ..small_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_snr_ranges_rejected() {
        assert_eq!(
            parse_snr_list("0:1e30:1e-30"),
            Err(ConfigError::InvalidSnrList("0:1e30:1e-30".to_string()))
        );
        assert!(parse_snr_list("0:20000:1").is_err());
        assert_eq!(parse_snr_list("0:10000:1").unwrap().len(), 10_000);
    }

    #[test]
    fn test_zero_parameters_rejected() {
        for config in [
            SweepConfig { window_len: 0, ..small_config() },
            SweepConfig { num_exemplars: 0, ..small_config() },
            SweepConfig { jobs: 0, ..small_config() },
            SweepConfig { snr_vals: vec![], ..small_config() },
            SweepConfig { modulations: Some(vec![]), ..small_config() },
        ] {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_plan_orders_snr_outer() {
        let config = SweepConfig {
            snr_vals: vec![0.0, 10.0],
            modulations: Some(vec![
                Modulation::Bpsk,
                Modulation::Wbfm,
                Modulation::Ook,
            ]),
            ..small_config()
        };
        let jobs = config.plan().unwrap();
        let order: Vec<(f32, Modulation)> = jobs
            .iter()
            .map(|j| (j.snr_db, j.modulation))
            .collect();
        assert_eq!(
            order,
            vec![
                (0.0, Modulation::Bpsk),
                (0.0, Modulation::Wbfm),
                (0.0, Modulation::Ook),
                (10.0, Modulation::Bpsk),
                (10.0, Modulation::Wbfm),
                (10.0, Modulation::Ook),
            ]
        );
        assert!(jobs.iter().all(|j| j.state() == JobState::Pending));
        assert!(jobs.iter().enumerate().all(|(i, j)| j.index == i));
    }

    #[test]
    fn test_job_walks_every_state() {
        let config = small_config();
        let mut job = config.plan().unwrap().remove(0);
        let rows = job.run(&config, &CancelToken::new()).unwrap();
        assert_eq!(job.state(), JobState::Emitted);
        assert_eq!(rows.len(), 10);
        for row in &rows {
            assert!((row.energy() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_config_from_json_with_legacy_names() {
        let json = r#"{
            "channel_type": "flat_fading",
            "snr_vals": [0, 4],
            "num_cplx_samples": 64,
            "num_exemplars_per_key": 5,
            "dataset": "fsk",
            "zero_energy": "redraw"
        }"#;
        let config: SweepConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.channel, ChannelKind::FlatFading);
        assert_eq!(config.window_len, 64);
        assert_eq!(config.num_exemplars, 5);
        assert_eq!(config.dataset, DatasetGroup::Fsk);
        assert_eq!(config.zero_energy, ZeroEnergyPolicy::Redraw);
        assert_eq!(config.margin, CAPTURE_MARGIN);
        let unknown = r#"{"channel": "mystery"}"#;
        assert!(serde_json::from_str::<SweepConfig>(unknown).is_err());
    }
}
