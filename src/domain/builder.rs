//! Fluent construction of element nodes.
//!
//! ```
//! use canopy::domain::builder::element;
//!
//! let node = element("a")
//!     .attr("href", "/docs")
//!     .class("nav-link")
//!     .text("Docs")
//!     .build();
//! assert!(node.as_map().is_some());
//! ```

use super::{
    classify::{CHILDREN_KEY, HTML_KEY, TEXT_KEY},
    node::{Component, Map, Node},
};

/// Start building `{ tag: { … } }`.
pub fn element(tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder {
        tag: tag.into(),
        descriptor: Map::new(),
        children: Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    descriptor: Map,
    children: Vec<Node>,
}

impl ElementBuilder {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.descriptor.insert(name.into(), value.into());
        self
    }

    /// Set `className`; accepts a string, a list of names, a `{name: bool}`
    /// map or a component returning a string.
    pub fn class(self, value: impl Into<Node>) -> Self {
        self.attr("className", value)
    }

    pub fn style<I, K, V>(self, declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Node>,
    {
        self.attr("style", Node::map(declarations))
    }

    pub fn text(self, value: impl Into<Node>) -> Self {
        self.attr(TEXT_KEY, value)
    }

    /// Raw markup emitted without escaping. The caller vouches for it.
    pub fn html(self, markup: impl Into<String>) -> Self {
        self.attr(HTML_KEY, Node::String(markup.into()))
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Bind an event handler, e.g. `on("click", handler)` stores `onclick`.
    pub fn on(self, event: &str, handler: Component) -> Self {
        self.attr(format!("on{event}"), handler)
    }

    pub fn build(self) -> Node {
        let Self {
            tag,
            mut descriptor,
            children,
        } = self;
        if !children.is_empty() {
            descriptor.insert(CHILDREN_KEY.to_string(), Node::list(children));
        }
        Node::map([(tag, Node::from(descriptor))])
    }
}

impl From<ElementBuilder> for Node {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}
