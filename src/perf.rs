//! Frame and operation timing.
//!
//! [`Editor::frame`](crate::Editor::frame) brackets every frame and records
//! each coalesced full reroute under `"reroute_all"`. Hot paths (snapping,
//! hit testing, rerouting) are wrapped in [`profile_scope!`], which costs
//! nothing unless the `profiling` feature is on:
//! ```toml
//! flowboard = { features = ["profiling"] }
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;
#[cfg(feature = "profiling")]
use tracing::trace;
use tracing::{debug, warn};

/// Target frame time for 60 FPS
pub const TARGET_FRAME_MS: f64 = 16.67;

/// A frame slower than this many targets is logged
const SLOW_FRAME_FACTOR: f64 = 2.0;

/// Samples kept per window
const WINDOW: usize = 120;

/// Time a scope. Compiles to nothing without the `profiling` feature.
///
/// ```ignore
/// fn nearest(&self) {
///     profile_scope!("magnetic_snap");
/// }
/// ```
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        $crate::profile_scope!($name, 1.0)
    };
    ($name:expr, $threshold_ms:expr) => {
        #[cfg(feature = "profiling")]
        let _scope = $crate::perf::ScopedTimer::new($name, $threshold_ms);
        #[cfg(not(feature = "profiling"))]
        let _ = ($name, $threshold_ms);
    };
}

pub use profile_scope;

/// Rolling window of millisecond samples.
///
/// `count` and `max` cover every sample ever recorded; `average` and `p95`
/// only the most recent ones.
#[derive(Debug, Clone, Default)]
pub struct TimingWindow {
    recent: VecDeque<f64>,
    count: u64,
    max_ms: f64,
}

impl TimingWindow {
    pub fn record(&mut self, ms: f64) {
        if self.recent.len() == WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(ms);
        self.count += 1;
        self.max_ms = self.max_ms.max(ms);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn average(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        self.recent.iter().sum::<f64>() / self.recent.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.max_ms
    }

    pub fn p95(&self) -> f64 {
        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let rank = (sorted.len() as f64 * 0.95).floor() as usize;
        sorted
            .get(rank.min(sorted.len().saturating_sub(1)))
            .copied()
            .unwrap_or(0.0)
    }

    fn summary(&self) -> TimingSummary {
        TimingSummary {
            count: self.count,
            average_ms: self.average(),
            p95_ms: self.p95(),
            max_ms: self.max_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingSummary {
    pub count: u64,
    pub average_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

/// Snapshot for hosts that surface engine timings in a debug overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfSummary {
    pub frames: TimingSummary,
    pub slow_frames: u64,
    pub operations: BTreeMap<&'static str, TimingSummary>,
}

#[derive(Debug, Default)]
pub struct PerfMonitor {
    frames: TimingWindow,
    frame_start: Option<Instant>,
    slow_frames: u64,
    operations: BTreeMap<&'static str, TimingWindow>,
}

impl PerfMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Close the frame opened by `begin_frame`, returning its duration in ms.
    pub fn end_frame(&mut self) -> Option<f64> {
        let ms = self.frame_start.take()?.elapsed().as_secs_f64() * 1000.0;
        self.frames.record(ms);
        if ms > TARGET_FRAME_MS * SLOW_FRAME_FACTOR {
            self.slow_frames += 1;
            warn!(frame_ms = format!("{ms:.2}"), "slow canvas frame");
        }
        Some(ms)
    }

    pub fn record_operation(&mut self, name: &'static str, elapsed_ms: f64) {
        self.operations.entry(name).or_default().record(elapsed_ms);
    }

    pub fn total_frames(&self) -> u64 {
        self.frames.count()
    }

    pub fn frames(&self) -> &TimingWindow {
        &self.frames
    }

    pub fn slow_frames(&self) -> u64 {
        self.slow_frames
    }

    pub fn operation(&self, name: &str) -> Option<&TimingWindow> {
        self.operations.get(name)
    }

    pub fn summary(&self) -> PerfSummary {
        PerfSummary {
            frames: self.frames.summary(),
            slow_frames: self.slow_frames,
            operations: self
                .operations
                .iter()
                .map(|(name, window)| (*name, window.summary()))
                .collect(),
        }
    }

    /// Log the slowest operations when frames run over budget on average.
    pub fn log_summary_if_slow(&self) {
        if self.frames.average() <= TARGET_FRAME_MS {
            return;
        }
        warn!(
            avg_frame_ms = format!("{:.2}", self.frames.average()),
            slow_frames = self.slow_frames,
            "canvas frames above target"
        );
        let mut ops: Vec<_> = self.operations.iter().collect();
        ops.sort_by(|a, b| b.1.average().total_cmp(&a.1.average()));
        for (name, window) in ops.into_iter().take(3) {
            debug!(
                operation = *name,
                avg_ms = format!("{:.2}", window.average()),
                p95_ms = format!("{:.2}", window.p95()),
                "slow operation candidate"
            );
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(feature = "profiling")]
thread_local! {
    static NESTING: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Reports the enclosing scope's duration on drop when it exceeds the threshold.
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
    threshold_ms: f64,
    #[cfg(feature = "profiling")]
    depth: usize,
}

impl ScopedTimer {
    pub fn new(name: &'static str, threshold_ms: f64) -> Self {
        Self {
            name,
            start: Instant::now(),
            threshold_ms,
            #[cfg(feature = "profiling")]
            depth: NESTING.with(|n| n.replace(n.get() + 1)),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        #[cfg(feature = "profiling")]
        {
            NESTING.with(|n| n.set(n.get().saturating_sub(1)));
        }

        if elapsed_ms <= self.threshold_ms {
            return;
        }
        #[cfg(feature = "profiling")]
        {
            trace!(depth = self.depth, scope = self.name, elapsed_ms = format!("{elapsed_ms:.2}"), "scope");
        }
        #[cfg(not(feature = "profiling"))]
        {
            warn!(
                operation = self.name,
                elapsed_ms = format!("{elapsed_ms:.2}"),
                threshold_ms = self.threshold_ms,
                "slow operation"
            );
        }
    }
}

/// Run `f` and return its result with the elapsed milliseconds.
#[inline]
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_secs_f64() * 1000.0)
}
