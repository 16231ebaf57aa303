use thiserror::Error;

/// A value that cannot be interpreted as a node, or an element whose shape is
/// unusable. Always fatal to the current render.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidNodeError {
    #[error("invalid node: received an empty map, expected a single tag key")]
    EmptyMap,
    #[error(
        "invalid node: received a map with keys [{}], expected a single tag key",
        .keys.join(", ")
    )]
    AmbiguousMap { keys: Vec<String> },
    #[error("invalid tag name `{tag}`")]
    InvalidTagName { tag: String },
    #[error("invalid attribute name `{name}` on <{tag}>")]
    InvalidAttributeName { tag: String, name: String },
    #[error("<{tag}> `{key}` must be {expected}, received {received}")]
    ContentShape {
        tag: String,
        key: &'static str,
        expected: &'static str,
        received: &'static str,
    },
    #[error("<{tag}> attribute `{name}` cannot take a {received} value")]
    AttributeShape {
        tag: String,
        name: String,
        received: &'static str,
    },
}

impl InvalidNodeError {
    pub fn ambiguous_map<'a>(keys: impl IntoIterator<Item = &'a String>) -> Self {
        Self::AmbiguousMap {
            keys: keys.into_iter().cloned().collect(),
        }
    }

    pub fn attribute_shape(tag: &str, name: &str, received: &'static str) -> Self {
        Self::AttributeShape {
            tag: tag.to_string(),
            name: name.to_string(),
            received,
        }
    }
}
