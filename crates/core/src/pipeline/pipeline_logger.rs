use std::collections::HashMap;
use std::time::Instant;

use crate::shared::constants::PROGRESS_INTERVAL_FRAMES;

/// Observer for pipeline orchestration events.
///
/// Keeps the core free of direct printing: the CLI forwards events to the
/// `log` facade, tests discard or record them.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 when the source does not
    /// know its frame count.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named pipeline stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// `log`-backed logger with per-stage timing and a throughput summary.
///
/// Progress lines are throttled to every `throttle_frames` frames; with a
/// known total they are reported as a percentage. Timings and metrics are
/// folded into running totals, so memory stays flat on unbounded streams.
pub struct LogPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Stats>,
    metrics: HashMap<String, Stats>,
    start_time: Instant,
    frames_seen: usize,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// The progress line that would be logged for `current`, if any.
    pub fn progress_line(&self, current: usize, total: usize) -> Option<String> {
        if current == 0 {
            return None;
        }
        if total > 0 {
            (current % self.throttle_frames == 0 || current == total).then(|| {
                let pct = current as f64 / total as f64 * 100.0;
                format!("Processing: {current}/{total} frames ({pct:.1}%)")
            })
        } else {
            (current % self.throttle_frames == 0)
                .then(|| format!("Processing: {current} frames"))
        }
    }

    /// End-of-run report: per-stage cost, per-frame metrics and throughput.
    /// `None` until something has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Run summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for (stage, stats) in sorted_stats(&self.timings) {
            let share = if elapsed_ms > 0.0 {
                stats.total / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:<10} {:7.1} ms/frame  (max {:.1} ms, {share:.0}% of run)",
                stats.mean(),
                stats.max
            ));
        }
        for (name, stats) in sorted_stats(&self.metrics) {
            lines.push(format!(
                "  {name:<10} {:7.1} per frame (max {})",
                stats.mean(),
                stats.max
            ));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 * 1000.0 / elapsed_ms;
            lines.push(format!("  {:<10} {fps:7.1} fps", "throughput"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&Stats> {
        self.timings.get(stage)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&Stats> {
        self.metrics.get(name)
    }
}

/// Running count, sum and maximum of one recorded series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    pub count: u64,
    pub total: f64,
    pub max: f64,
}

impl Stats {
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

fn sorted_stats(series: &HashMap<String, Stats>) -> Vec<(&str, &Stats)> {
    let mut stats: Vec<_> = series
        .iter()
        .map(|(name, stats)| (name.as_str(), stats))
        .collect();
    stats.sort_by(|a, b| a.0.cmp(b.0));
    stats
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(PROGRESS_INTERVAL_FRAMES)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if let Some(line) = self.progress_line(current, total) {
            log::info!("{line}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = LogPipelineLogger::new(30);
        logger.timing("anonymize", 20.0);
        logger.timing("anonymize", 30.0);
        logger.timing("write", 5.0);

        let anonymize = logger.timings_for("anonymize").unwrap();
        assert_eq!(anonymize.count, 2);
        assert_relative_eq!(anonymize.total, 50.0);
        assert_relative_eq!(anonymize.max, 30.0);
        assert_eq!(logger.timings_for("write").unwrap().count, 1);
        assert!(logger.timings_for("read").is_none());
    }

    #[test]
    fn test_metric_average_in_summary() {
        let mut logger = LogPipelineLogger::new(30);
        logger.frames_seen = 5;
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);

        let stats = logger.metrics_for("faces").unwrap();
        assert_relative_eq!(stats.mean(), 3.5);
        assert_relative_eq!(stats.max, 4.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("3.5 per frame (max 4)"), "{summary}");
    }

    #[test]
    fn test_summary_lists_stages_alphabetically_with_throughput() {
        let mut logger = LogPipelineLogger::new(30);
        logger.progress(100, 100);
        logger.timing("write", 2.0);
        logger.timing("anonymize", 10.0);
        logger.timing("anonymize", 14.0);

        let summary = logger.summary_string().unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert!(lines[0].starts_with("Run summary (100 frames"));
        assert!(lines[1].trim_start().starts_with("anonymize"));
        assert!(lines[1].contains("12.0 ms/frame  (max 14.0 ms"), "{}", lines[1]);
        assert!(lines[2].trim_start().starts_with("write"));
        assert!(lines[3].trim_start().starts_with("throughput"));
        assert!(lines[3].ends_with("fps"));
    }

    #[test]
    fn test_stats_of_empty_series() {
        let stats = Stats::default();
        assert_eq!((stats.mean(), stats.max, stats.total), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_long_run_summary_stays_exact() {
        let mut logger = LogPipelineLogger::new(1000);
        let frames = 200_000;
        for i in 0..frames {
            logger.timing("anonymize", if i % 2 == 0 { 4.0 } else { 6.0 });
            logger.metric("faces", (i % 3) as f64);
            logger.progress(i + 1, 0);
        }
        logger.timing("anonymize", 250.0);

        let anonymize = logger.timings_for("anonymize").unwrap();
        assert_eq!(anonymize.count, frames as u64 + 1);
        assert_relative_eq!(anonymize.max, 250.0);
        let faces = logger.metrics_for("faces").unwrap();
        assert_relative_eq!(faces.mean(), 1.0, epsilon = 1e-4);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Run summary (200000 frames"), "{summary}");
        assert!(summary.contains("5.0 ms/frame  (max 250.0 ms"), "{summary}");
        assert!(summary.contains("1.0 per frame (max 2)"), "{summary}");
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(LogPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_with_known_total_is_throttled() {
        let logger = LogPipelineLogger::new(30);
        let lines: Vec<usize> = (1..=70)
            .filter(|&i| logger.progress_line(i, 70).is_some())
            .collect();
        assert_eq!(lines, vec![30, 60, 70]);
        assert_eq!(
            logger.progress_line(30, 70).unwrap(),
            "Processing: 30/70 frames (42.9%)"
        );
    }

    #[test]
    fn test_progress_with_unknown_total_reports_counts() {
        let logger = LogPipelineLogger::new(30);
        assert!(logger.progress_line(29, 0).is_none());
        assert_eq!(logger.progress_line(30, 0).unwrap(), "Processing: 30 frames");
        assert!(logger.progress_line(0, 0).is_none());
    }

    #[test]
    fn test_default_throttle_is_thirty_frames() {
        assert_eq!(LogPipelineLogger::default().throttle_frames, 30);
    }
}
