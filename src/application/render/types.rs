use thiserror::Error;

use crate::domain::{error::InvalidNodeError, node::ComponentError};

/// Name reported for components without a display name.
pub const ANONYMOUS_COMPONENT: &str = "<anonymous>";

/// Structured errors surfaced by the renderer. Every variant is fatal to the
/// render call that produced it; no partial output is returned alongside.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    InvalidNode(#[from] InvalidNodeError),
    #[error("maximum render depth of {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },
    #[error("component `{component}` failed")]
    Component {
        component: String,
        #[source]
        source: ComponentError,
    },
}

impl RenderError {
    pub fn component(name: Option<&str>, source: ComponentError) -> Self {
        Self::Component {
            component: name.unwrap_or(ANONYMOUS_COMPONENT).to_string(),
            source,
        }
    }

    /// Short, stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::InvalidNode(_) => "invalid_node",
            RenderError::DepthExceeded { .. } => "depth_exceeded",
            RenderError::Component { .. } => "component",
        }
    }
}
