//! Glue for hosts that wrap rendered output in a document template or build
//! the root node from request data.
//!
//! Both adapters surface every failure as an [`AdapterError`], so a host maps
//! a single error type onto its transport (see `crate::infra::http`).

use thiserror::Error;
use tracing::debug;

use crate::domain::{ComponentError, Node};

use super::render::{RenderError, RenderStream, Renderer};

/// Token replaced by the rendered body.
pub const CONTENT_PLACEHOLDER: &str = "{{content}}";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("factory failed to produce a node")]
    Factory(#[source] ComponentError),
    #[error("render failed")]
    Render(#[from] RenderError),
    #[error("template has no `{{{{content}}}}` placeholder")]
    MissingPlaceholder,
}

impl AdapterError {
    pub fn factory(source: impl Into<ComponentError>) -> Self {
        Self::Factory(source.into())
    }
}

/// Substitute `body` for the first `{{content}}` in `template`. Later
/// occurrences are left untouched.
pub fn apply_template(template: &str, body: &str) -> Result<String, AdapterError> {
    let (head, tail) = split_template(template)?;
    let mut document = String::with_capacity(head.len() + body.len() + tail.len());
    document.push_str(head);
    document.push_str(body);
    document.push_str(tail);
    Ok(document)
}

/// Render `node` and place it into `template`. The template is checked before
/// rendering starts.
pub fn render_template(
    template: &str,
    node: &Node,
    renderer: &Renderer,
) -> Result<String, AdapterError> {
    split_template(template)?;
    let body = renderer.render(node)?;
    apply_template(template, &body)
}

/// Build the root node with `factory` and render it.
pub fn render_factory<A, E, F>(
    renderer: &Renderer,
    factory: F,
    args: A,
) -> Result<String, AdapterError>
where
    F: FnOnce(A) -> Result<Node, E>,
    E: Into<ComponentError>,
{
    let node = build_root(factory, args)?;
    Ok(renderer.render(&node)?)
}

/// Build the root node with `factory` and stream it.
pub fn stream_factory<A, E, F>(
    renderer: &Renderer,
    factory: F,
    args: A,
) -> Result<RenderStream, AdapterError>
where
    F: FnOnce(A) -> Result<Node, E>,
    E: Into<ComponentError>,
{
    let node = build_root(factory, args)?;
    Ok(renderer.render_stream(node))
}

fn build_root<A, E, F>(factory: F, args: A) -> Result<Node, AdapterError>
where
    F: FnOnce(A) -> Result<Node, E>,
    E: Into<ComponentError>,
{
    factory(args).map_err(|err| {
        let err = AdapterError::factory(err);
        debug!(error = ?err, "factory failed");
        err
    })
}

fn split_template(template: &str) -> Result<(&str, &str), AdapterError> {
    template
        .split_once(CONTENT_PLACEHOLDER)
        .ok_or(AdapterError::MissingPlaceholder)
}
