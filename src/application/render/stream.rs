use std::iter::FusedIterator;

use async_stream::stream;
use futures::Stream;
use tracing::debug;

use crate::config::RenderConfig;
use crate::domain::Node;

use super::{engine::Engine, metrics::PassMonitor, types::RenderError};

/// Lazily rendered chunks of one tree, in document order.
///
/// A chunk is emitted once the buffered output reaches `chunk_size` bytes, or
/// once `yield_threshold` nodes were processed since the previous chunk,
/// whichever comes first; the remainder is flushed at the end. Work only
/// happens inside [`Iterator::next`], so dropping the stream cancels the
/// render. After an error the stream yields nothing more, and chunks already
/// handed out must be discarded by the caller.
#[must_use = "streams do nothing unless polled"]
pub struct RenderStream {
    engine: Option<Engine>,
    buffer: String,
    chunk_size: usize,
    yield_threshold: u64,
    mark: u64,
    chunks: usize,
    monitor: Option<PassMonitor>,
}

impl RenderStream {
    pub(crate) fn new(root: Node, config: &RenderConfig, monitor: Option<PassMonitor>) -> Self {
        Self {
            engine: Some(Engine::new(root, config)),
            buffer: String::with_capacity(config.chunk_size.get()),
            chunk_size: config.chunk_size.get(),
            yield_threshold: config.yield_threshold.get() as u64,
            mark: 0,
            chunks: 0,
            monitor,
        }
    }

    /// Adapt into an async stream that hands control back to the tokio
    /// scheduler between chunks.
    pub fn into_async(self) -> impl Stream<Item = Result<String, RenderError>> + Send + 'static {
        stream! {
            for chunk in self {
                yield chunk;
                tokio::task::yield_now().await;
            }
        }
    }

    fn take_chunk(&mut self) -> String {
        self.chunks += 1;
        std::mem::take(&mut self.buffer)
    }

    fn complete(&mut self, processed: u64, outcome: Result<(), &RenderError>) {
        self.engine = None;
        match outcome {
            Ok(()) => debug!(elements = processed, chunks = self.chunks, "stream render finished"),
            Err(err) => debug!(
                elements = processed,
                chunks = self.chunks,
                kind = err.kind(),
                error = ?err,
                "stream render failed"
            ),
        }
        if let Some(monitor) = self.monitor.take() {
            monitor.finish(processed, outcome);
        }
    }
}

impl Iterator for RenderStream {
    type Item = Result<String, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let engine = self.engine.as_mut()?;

        loop {
            match engine.step(&mut self.buffer) {
                Ok(true) => {
                    let processed = engine.processed();
                    let over_size = self.buffer.len() >= self.chunk_size;
                    let over_threshold = processed - self.mark >= self.yield_threshold
                        && !self.buffer.is_empty();
                    if over_size || over_threshold {
                        self.mark = processed;
                        if let Some(monitor) = &self.monitor {
                            monitor.progress(processed);
                        }
                        return Some(Ok(self.take_chunk()));
                    }
                }
                Ok(false) => {
                    let processed = engine.processed();
                    let rest = (!self.buffer.is_empty()).then(|| self.take_chunk());
                    self.complete(processed, Ok(()));
                    return rest.map(Ok);
                }
                Err(err) => {
                    let processed = engine.processed();
                    self.buffer.clear();
                    self.complete(processed, Err(&err));
                    return Some(Err(err));
                }
            }
        }
    }
}

impl FusedIterator for RenderStream {}

impl std::fmt::Debug for RenderStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderStream")
            .field("finished", &self.engine.is_none())
            .field("buffered", &self.buffer.len())
            .field("chunks", &self.chunks)
            .finish_non_exhaustive()
    }
}
