//! Server-side rendering of declarative node trees into HTML.
//!
//! A tree is built from [`Node`] values: scalars become escaped text, a
//! single-key map `{ tag: descriptor }` becomes an element, lists flatten into
//! their parent and [`Component`]s are invoked with their props while
//! rendering.
//!
//! ```
//! use canopy::{Node, RenderConfig, render};
//! use serde_json::json;
//!
//! let page = Node::from(json!({
//!     "ul": { "className": "todo", "children": [
//!         { "li": "write <docs>" },
//!         { "li": { "text": "ship", "data-done": true } }
//!     ]}
//! }));
//!
//! let html = render(&page, &RenderConfig::default())?;
//! assert_eq!(
//!     html,
//!     r#"<ul class="todo"><li>write &lt;docs&gt;</li><li data-done>ship</li></ul>"#
//! );
//! # Ok::<(), canopy::RenderError>(())
//! ```
//!
//! [`Renderer::render_stream`] produces the same markup as a lazy sequence of
//! chunks, [`memoize`] skips repeated component calls with unchanged props and
//! [`application::adapters`] wraps output into document templates.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
mod util;

pub use application::adapters::{AdapterError, apply_template, render_factory, render_template};
pub use application::memo::{Memo, MemoScope, MemoStats, memoize};
pub use application::render::{
    RenderError, RenderMetrics, RenderStream, Renderer, escape_html, render, render_stream,
};
pub use config::{ConfigError, RawRenderConfig, RenderConfig};
pub use domain::builder::element;
pub use domain::{Component, ComponentError, InvalidNodeError, Map, Node, props};
