//! Rendering of node trees into HTML.
//!
//! A [`Renderer`] owns a validated [`RenderConfig`] and the metrics of its
//! latest pass. Rendering is pure with respect to the tree: the output only
//! depends on the node and the configuration, and any failure aborts the pass
//! without returning partial output.

mod attributes;
mod engine;
mod escape;
mod metrics;
mod stream;
mod types;

use tracing::debug;

use crate::config::{ConfigError, RawRenderConfig, RenderConfig};
use crate::domain::Node;

use self::{
    engine::Engine,
    metrics::{MetricsStore, PassMonitor, RenderMode},
};

pub use engine::{VOID_TAGS, is_void_tag};
pub use escape::escape_html;
pub use metrics::{
    METRIC_RENDER_ELEMENTS_TOTAL, METRIC_RENDER_FAILURES_TOTAL, METRIC_RENDER_MS,
    METRIC_RENDER_TOTAL, RenderMetrics,
};
pub use stream::RenderStream;
pub use types::{ANONYMOUS_COMPONENT, RenderError};

/// Render `node` to a string with a one-off renderer.
pub fn render(node: &Node, config: &RenderConfig) -> Result<String, RenderError> {
    Renderer::new(*config).render(node)
}

/// Stream `node` with a one-off renderer.
pub fn render_stream(node: Node, config: &RenderConfig) -> RenderStream {
    Renderer::new(*config).render_stream(node)
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
    metrics: MetricsStore,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            metrics: MetricsStore::default(),
        }
    }

    /// Build a renderer from unvalidated options.
    pub fn from_raw(raw: RawRenderConfig) -> Result<Self, ConfigError> {
        RenderConfig::from_raw(raw).map(Self::new)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Metrics of the latest pass, or `None` when monitoring is disabled.
    pub fn metrics(&self) -> Option<RenderMetrics> {
        self.config
            .enable_monitoring
            .then(|| self.metrics.snapshot())
    }

    pub fn render(&self, node: &Node) -> Result<String, RenderError> {
        let monitor = self.begin(RenderMode::Full);
        let mut engine = Engine::new(node.clone(), &self.config);
        let mut out = String::new();
        let outcome = engine.run(&mut out);
        let processed = engine.processed();

        match &outcome {
            Ok(()) => debug!(
                elements = processed,
                bytes = out.len(),
                max_depth = self.config.max_depth.get(),
                "render finished"
            ),
            Err(err) => debug!(
                elements = processed,
                kind = err.kind(),
                error = ?err,
                "render failed"
            ),
        }
        if let Some(monitor) = monitor {
            monitor.finish(processed, outcome.as_ref().map(|_| ()));
        }

        outcome.map(|()| out)
    }

    /// Render lazily; see [`RenderStream`] for the chunking rules.
    pub fn render_stream(&self, node: Node) -> RenderStream {
        let monitor = self.begin(RenderMode::Stream);
        RenderStream::new(node, &self.config, monitor)
    }

    fn begin(&self, mode: RenderMode) -> Option<PassMonitor> {
        self.config
            .enable_monitoring
            .then(|| self.metrics.begin(mode))
    }
}
