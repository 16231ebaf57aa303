//! Maps a [`Node`] to the category the renderer processes it as.

use std::borrow::Cow;
use std::sync::Arc;

use super::{
    error::InvalidNodeError,
    node::{Component, Map, Node},
};

/// Descriptor keys that carry content rather than attributes.
pub const TEXT_KEY: &str = "text";
pub const HTML_KEY: &str = "html";
pub const CHILDREN_KEY: &str = "children";

/// Processing category of a node.
#[derive(Debug, Clone)]
pub enum NodeKind<'a> {
    Empty,
    Text(Cow<'a, str>),
    Element(ElementView<'a>),
    /// Unevaluated component.
    Function(&'a Component),
    List(&'a Arc<[Node]>),
}

/// Classify a node. Maps must have exactly one key, a valid tag name.
pub fn classify(node: &Node) -> Result<NodeKind<'_>, InvalidNodeError> {
    let kind = match node {
        Node::Null => NodeKind::Empty,
        Node::Bool(_) | Node::Number(_) | Node::String(_) => {
            NodeKind::Text(node.as_text().unwrap_or_default())
        }
        Node::List(items) => NodeKind::List(items),
        Node::Function(component) => NodeKind::Function(component),
        Node::Map(map) => NodeKind::Element(ElementView::from_map(map)?),
    };
    Ok(kind)
}

/// Content of an element after applying precedence.
#[derive(Debug, Clone)]
pub enum Content<'a> {
    None,
    /// Literal text, escaped on output.
    Text(Cow<'a, str>),
    /// Pre-escaped markup, emitted verbatim.
    Html(&'a str),
    /// A node (usually a list) rendered one level deeper.
    Children(&'a Node),
}

/// A single-key map interpreted as `{ tag: descriptor }`.
///
/// The descriptor is normally a map of content keys and attributes. As a
/// shorthand it may also be a scalar (text content), a list or component
/// (children), or `null` (no content).
#[derive(Debug, Clone, Copy)]
pub struct ElementView<'a> {
    tag: &'a str,
    descriptor: &'a Node,
}

impl<'a> ElementView<'a> {
    fn from_map(map: &'a Map) -> Result<Self, InvalidNodeError> {
        let mut entries = map.iter();
        let (tag, descriptor) = match (entries.next(), map.len()) {
            (None, _) => return Err(InvalidNodeError::EmptyMap),
            (Some(entry), 1) => entry,
            _ => return Err(InvalidNodeError::ambiguous_map(map.keys())),
        };
        if !is_valid_tag_name(tag) {
            return Err(InvalidNodeError::InvalidTagName { tag: tag.clone() });
        }
        Ok(Self { tag, descriptor })
    }

    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn descriptor(&self) -> &'a Node {
        self.descriptor
    }

    /// The single active content mode. When several are supplied the
    /// precedence is `text`, then `html`, then `children`; the others are
    /// ignored. A `null` value counts as absent.
    pub fn content(&self) -> Result<Content<'a>, InvalidNodeError> {
        let Node::Map(descriptor) = self.descriptor else {
            return Ok(match self.descriptor {
                Node::Null => Content::None,
                Node::List(_) | Node::Function(_) => Content::Children(self.descriptor),
                scalar => Content::Text(scalar.as_text().unwrap_or_default()),
            });
        };

        if let Some(text) = present(descriptor, TEXT_KEY) {
            return text
                .as_text()
                .map(Content::Text)
                .ok_or_else(|| self.content_shape(TEXT_KEY, "a scalar", text));
        }
        if let Some(html) = present(descriptor, HTML_KEY) {
            return html
                .as_str()
                .map(Content::Html)
                .ok_or_else(|| self.content_shape(HTML_KEY, "a string", html));
        }
        Ok(present(descriptor, CHILDREN_KEY).map_or(Content::None, Content::Children))
    }

    /// Attribute entries, excluding content keys and event bindings.
    pub fn attributes(self) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.entries()
            .filter(|(name, value)| !is_content_key(name) && !is_event_binding(name, value))
    }

    /// Event-binding descriptors (`on*` keys holding functions). They are
    /// never serialized; a hydration layer can collect them from here.
    pub fn events(self) -> impl Iterator<Item = (&'a str, &'a Component)> + 'a {
        self.entries().filter_map(|(name, value)| match value {
            Node::Function(handler) if is_event_name(name) => Some((name, handler)),
            _ => None,
        })
    }

    fn entries(self) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.descriptor
            .as_map()
            .into_iter()
            .flat_map(|map| map.iter().map(|(name, value)| (name.as_str(), value)))
    }

    fn content_shape(
        &self,
        key: &'static str,
        expected: &'static str,
        got: &Node,
    ) -> InvalidNodeError {
        InvalidNodeError::ContentShape {
            tag: self.tag.to_string(),
            key,
            expected,
            received: got.type_name(),
        }
    }
}

fn present<'a>(descriptor: &'a Map, key: &str) -> Option<&'a Node> {
    descriptor.get(key).filter(|value| !value.is_null())
}

fn is_content_key(name: &str) -> bool {
    matches!(name, TEXT_KEY | HTML_KEY | CHILDREN_KEY)
}

fn is_event_name(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

fn is_event_binding(name: &str, value: &Node) -> bool {
    matches!(value, Node::Function(_)) && is_event_name(name)
}

fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}
