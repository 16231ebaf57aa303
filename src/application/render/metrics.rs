//! Per-pass render metrics.
//!
//! [`RenderMetrics`] is the snapshot a host reads back from a
//! [`Renderer`](super::Renderer). It always describes the most recently
//! started pass; an older pass that is still running when a newer one begins
//! stops writing to it. When monitoring is enabled each pass also feeds the
//! process-wide `metrics` recorder.

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use metrics::{counter, histogram};
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::trace;

use crate::util::lock::mutex_lock;

use super::types::RenderError;

pub const METRIC_RENDER_TOTAL: &str = "canopy_render_total";
pub const METRIC_RENDER_ELEMENTS_TOTAL: &str = "canopy_render_elements_total";
pub const METRIC_RENDER_FAILURES_TOTAL: &str = "canopy_render_failures_total";
pub const METRIC_RENDER_MS: &str = "canopy_render_ms";

const SOURCE: &str = "application::render::metrics";

/// Timing and element count of the most recent render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderMetrics {
    pub start_time: Option<OffsetDateTime>,
    /// `None` while the pass is running or if a stream was abandoned.
    pub end_time: Option<OffsetDateTime>,
    pub elements_processed: u64,
}

impl RenderMetrics {
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end_time? - self.start_time?)
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

/// How a pass was driven, used as the `mode` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderMode {
    Full,
    Stream,
}

impl RenderMode {
    fn as_label(self) -> &'static str {
        match self {
            RenderMode::Full => "full",
            RenderMode::Stream => "stream",
        }
    }
}

#[derive(Debug, Default)]
struct Latest {
    /// Sequence number of the pass that owns `metrics`.
    pass: u64,
    metrics: RenderMetrics,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MetricsStore {
    inner: Arc<Mutex<Latest>>,
}

impl MetricsStore {
    pub(crate) fn snapshot(&self) -> RenderMetrics {
        mutex_lock(&self.inner, SOURCE, "snapshot").metrics
    }

    /// Reset the snapshot and hand it to a new pass.
    pub(crate) fn begin(&self, mode: RenderMode) -> PassMonitor {
        let pass = {
            let mut latest = mutex_lock(&self.inner, SOURCE, "begin");
            latest.pass += 1;
            latest.metrics = RenderMetrics {
                start_time: Some(OffsetDateTime::now_utc()),
                end_time: None,
                elements_processed: 0,
            };
            latest.pass
        };
        counter!(METRIC_RENDER_TOTAL, "mode" => mode.as_label()).increment(1);

        PassMonitor {
            store: self.clone(),
            pass,
            mode,
            started_at: Instant::now(),
        }
    }

    /// Apply `update` unless a newer pass has taken over the snapshot.
    fn update_if_current(
        &self,
        pass: u64,
        operation: &'static str,
        update: impl FnOnce(&mut RenderMetrics),
    ) {
        let mut latest = mutex_lock(&self.inner, SOURCE, operation);
        if latest.pass == pass {
            update(&mut latest.metrics);
        } else {
            trace!(pass, current = latest.pass, "superseded pass left the snapshot alone");
        }
    }
}

/// Observer for one pass; writes through to the shared snapshot while the
/// pass is the latest one.
#[derive(Debug)]
pub(crate) struct PassMonitor {
    store: MetricsStore,
    pass: u64,
    mode: RenderMode,
    started_at: Instant,
}

impl PassMonitor {
    pub(crate) fn progress(&self, processed: u64) {
        self.store.update_if_current(self.pass, "progress", |metrics| {
            metrics.elements_processed = processed;
        });
    }

    pub(crate) fn finish(self, processed: u64, outcome: Result<(), &RenderError>) {
        self.store.update_if_current(self.pass, "finish", |metrics| {
            metrics.elements_processed = processed;
            metrics.end_time = Some(OffsetDateTime::now_utc());
        });

        let mode = self.mode.as_label();
        counter!(METRIC_RENDER_ELEMENTS_TOTAL, "mode" => mode).increment(processed);
        if let Err(err) = outcome {
            counter!(METRIC_RENDER_FAILURES_TOTAL, "mode" => mode, "kind" => err.kind())
                .increment(1);
        }
        histogram!(METRIC_RENDER_MS, "mode" => mode)
            .record(self.started_at.elapsed().as_secs_f64() * 1000.0);
    }
}
