//! Timing and agreement statistics for a diagnosis run.

use std::time::{Duration, Instant};
use tracing::info;

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Stage timings and model agreement collected over one invocation.
#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Model load times, in load order
    load_times: Vec<(String, Duration)>,
    /// Per-model inference times, in run order
    inference_times: Vec<(String, Duration)>,
    /// 1 - total variation distance between the two model distributions
    agreement: Option<f64>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how long a model took to load
    pub fn record_load(&mut self, model_name: &str, duration: Duration) {
        self.load_times.push((model_name.to_string(), duration));
    }

    /// Record model inference time
    pub fn record_inference(&mut self, model_name: &str, duration: Duration) {
        self.inference_times.push((model_name.to_string(), duration));
    }

    /// Record agreement between the image and text distributions
    pub fn record_agreement(&mut self, agreement: f64) {
        self.agreement = Some(agreement);
    }

    /// Run `f` and record its wall time as `model_name`'s inference time.
    pub fn time_inference<T>(&mut self, model_name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record_inference(model_name, start.elapsed());
        out
    }

    pub fn inference_time(&self, model_name: &str) -> Option<Duration> {
        self.inference_times
            .iter()
            .find(|(name, _)| name == model_name)
            .map(|(_, d)| *d)
    }

    pub fn total_inference(&self) -> Duration {
        self.inference_times.iter().map(|(_, d)| *d).sum()
    }

    pub fn total_load(&self) -> Duration {
        self.load_times.iter().map(|(_, d)| *d).sum()
    }

    pub fn agreement(&self) -> Option<f64> {
        self.agreement
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        for (model, d) in &self.load_times {
            info!(model = %model, load_ms = millis(*d), "Model load time");
        }
        for (model, d) in &self.inference_times {
            info!(model = %model, inference_us = micros(*d), "Model inference time");
        }
        info!(
            total_load_ms = millis(self.total_load()),
            total_inference_us = micros(self.total_inference()),
            agreement = self.agreement.unwrap_or(0.0),
            "Run summary"
        );
    }
}
