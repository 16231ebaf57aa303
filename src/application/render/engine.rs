//! The traversal shared by full and streamed renders.
//!
//! Work is kept on an explicit stack of frames instead of the native call
//! stack, so arbitrarily deep trees fail with [`RenderError::DepthExceeded`]
//! rather than overflowing, and a stream can stop between any two steps.

use std::sync::Arc;

use crate::application::memo::MemoScope;
use crate::config::RenderConfig;
use crate::domain::{Content, ElementView, Node, NodeKind, classify, validate_node};

use super::{attributes::write_attributes, escape::push_escaped, types::RenderError};

/// Elements that never have content or a closing tag.
pub const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

#[derive(Debug)]
enum Frame {
    /// An owned node awaiting classification: the root or a component's output.
    Node { node: Node, depth: usize },
    /// Remaining entries of a list, all rendered at `depth`.
    Siblings {
        items: Arc<[Node]>,
        next: usize,
        depth: usize,
    },
    Close { tag: String },
}

/// One render pass over one root node.
#[derive(Debug)]
pub(crate) struct Engine {
    stack: Vec<Frame>,
    max_depth: usize,
    validate: bool,
    scope: MemoScope,
    processed: u64,
}

impl Engine {
    pub(crate) fn new(root: Node, config: &RenderConfig) -> Self {
        Self {
            stack: vec![Frame::Node {
                node: root,
                depth: 1,
            }],
            max_depth: config.max_depth.get(),
            validate: config.enable_validation,
            scope: MemoScope::new(),
            processed: 0,
        }
    }

    /// Elements and text nodes fully written so far.
    pub(crate) fn processed(&self) -> u64 {
        self.processed
    }

    /// Run one frame, appending its output. Returns `false` once the tree is
    /// exhausted.
    pub(crate) fn step(&mut self, out: &mut String) -> Result<bool, RenderError> {
        let Some(frame) = self.stack.pop() else {
            return Ok(false);
        };

        match frame {
            Frame::Node { node, depth } => self.visit(out, &node, depth)?,
            Frame::Siblings { items, next, depth } => {
                if next < items.len() {
                    let current = Arc::clone(&items);
                    self.stack.push(Frame::Siblings {
                        items,
                        next: next + 1,
                        depth,
                    });
                    let item = &current[next];
                    if !item.is_omitted() {
                        self.visit(out, item, depth)?;
                    }
                }
            }
            Frame::Close { tag } => {
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
                self.processed += 1;
            }
        }

        Ok(true)
    }

    /// Drive the pass to completion.
    pub(crate) fn run(&mut self, out: &mut String) -> Result<(), RenderError> {
        while self.step(out)? {}
        Ok(())
    }

    fn visit(&mut self, out: &mut String, node: &Node, depth: usize) -> Result<(), RenderError> {
        if self.validate {
            validate_node(node)?;
        }

        match classify(node)? {
            NodeKind::Empty => {}
            NodeKind::Text(text) => {
                push_escaped(out, &text);
                self.processed += 1;
            }
            NodeKind::List(items) => self.stack.push(Frame::Siblings {
                items: Arc::clone(items),
                next: 0,
                depth,
            }),
            NodeKind::Function(component) => {
                self.check_depth(depth)?;
                let output = self
                    .scope
                    .enter(|| component.call())
                    .map_err(|source| RenderError::component(component.name(), source))?;
                self.stack.push(Frame::Node {
                    node: output,
                    depth: depth + 1,
                });
            }
            NodeKind::Element(element) => {
                self.check_depth(depth)?;
                self.open(out, element, depth)?;
            }
        }

        Ok(())
    }

    fn open(
        &mut self,
        out: &mut String,
        element: ElementView<'_>,
        depth: usize,
    ) -> Result<(), RenderError> {
        let tag = element.tag();
        out.push('<');
        out.push_str(tag);
        write_attributes(out, element, &self.scope)?;
        out.push('>');

        if is_void_tag(tag) {
            self.processed += 1;
            return Ok(());
        }

        match element.content()? {
            Content::None => {}
            Content::Text(text) => push_escaped(out, &text),
            Content::Html(markup) => out.push_str(markup),
            Content::Children(children) => {
                self.stack.push(Frame::Close {
                    tag: tag.to_string(),
                });
                let frame = match children {
                    Node::List(items) => Frame::Siblings {
                        items: Arc::clone(items),
                        next: 0,
                        depth: depth + 1,
                    },
                    other => Frame::Node {
                        node: other.clone(),
                        depth: depth + 1,
                    },
                };
                self.stack.push(frame);
                return Ok(());
            }
        }

        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        self.processed += 1;
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), RenderError> {
        if depth > self.max_depth {
            return Err(RenderError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }
}
