//! Cheap, shallow shape checks run before classification.
//!
//! Only the top level of a value is inspected. Deeper problems (bad tag
//! names, malformed attributes) surface while rendering.

use super::{error::InvalidNodeError, node::Node};

/// Whether `node` is structurally plausible.
pub fn is_valid_node(node: &Node) -> bool {
    validate_node(node).is_ok()
}

/// Like [`is_valid_node`], but reports what was received.
pub fn validate_node(node: &Node) -> Result<(), InvalidNodeError> {
    match node {
        Node::Map(map) if map.is_empty() => Err(InvalidNodeError::EmptyMap),
        Node::Null
        | Node::Bool(_)
        | Node::Number(_)
        | Node::String(_)
        | Node::List(_)
        | Node::Map(_)
        | Node::Function(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::node::{Component, Map};

    #[test]
    fn empty_and_scalar_values_are_valid() {
        assert!(is_valid_node(&Node::Null));
        assert!(is_valid_node(&Node::from("text")));
        assert!(is_valid_node(&Node::from(0)));
        assert!(is_valid_node(&Node::from(false)));
    }

    #[test]
    fn lists_and_functions_are_valid() {
        assert!(is_valid_node(&Node::list(Vec::<Node>::new())));
        assert!(is_valid_node(&Node::from(Component::new(|_| Node::Null))));
    }

    #[test]
    fn empty_map_is_rejected() {
        assert_eq!(
            validate_node(&Node::from(Map::new())),
            Err(InvalidNodeError::EmptyMap)
        );
    }

    #[test]
    fn any_non_empty_map_passes_shallow_validation() {
        assert!(is_valid_node(&Node::from(json!({ "div": {} }))));
        assert!(is_valid_node(&Node::from(json!({ "div": {}, "span": {} }))));
    }
}
