use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for frame-processing events.
///
/// Keeps the processor free of any particular reporting mechanism; the CLI
/// installs a `log`-backed implementation and tests use the null one.
pub trait PipelineLogger: Send {
    /// Frame-level progress. `total` is 0 when the source length is unknown.
    fn progress(&mut self, current: usize, total: usize);

    /// How long a named stage (`read`, `transform`, `display`) took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame measurement reported by the transform, e.g. contour count.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and peak of a series of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl StageStats {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Reports through the `log` facade and prints a per-stage summary at the end.
///
/// Progress lines are emitted every `every` frames.
pub struct StdoutPipelineLogger {
    every: usize,
    frames: usize,
    stages: BTreeMap<String, StageStats>,
    metrics: BTreeMap<String, StageStats>,
    started: Instant,
}

impl StdoutPipelineLogger {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.get(name)
    }

    pub fn metric_stats(&self, name: &str) -> Option<&StageStats> {
        self.metrics.get(name)
    }

    /// The summary text, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Processed {} frames in {elapsed:.2}s",
            self.frames
        )];

        for (name, stats) in &self.stages {
            lines.push(format!(
                "  {name:10} mean {:6.2}ms  max {:6.2}ms  total {:8.1}ms",
                stats.mean(),
                stats.max,
                stats.total
            ));
        }
        for (name, stats) in &self.metrics {
            lines.push(format!(
                "  {name:10} mean {:.1}  max {:.0}",
                stats.mean(),
                stats.max
            ));
        }
        if self.frames > 0 && elapsed > 0.0 {
            lines.push(format!("  throughput {:.1} fps", self.frames as f64 / elapsed));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = self.frames.max(current);
        if current % self.every != 0 && current != total {
            return;
        }
        if total > 0 {
            log::info!("Frame {current}/{total}");
        } else {
            log::info!("Frame {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
