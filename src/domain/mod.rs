//! Node model and the rules for interpreting it.

pub mod builder;
pub mod classify;
pub mod error;
pub mod node;
pub mod validate;

pub use classify::{Content, ElementView, NodeKind, classify};
pub use error::InvalidNodeError;
pub use node::{Component, ComponentError, Map, Node, props};
pub use validate::{is_valid_node, validate_node};
