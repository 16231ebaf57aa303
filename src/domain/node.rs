//! The declarative node model consumed by the renderer.
//!
//! A [`Node`] mirrors the loosely-typed values a host hands in: nothing, a
//! scalar, a list, a single-key map describing an element, or a component
//! function. Interpretation of those shapes lives in [`crate::domain::classify`].
//!
//! Lists and maps are reference counted. Cloning a node never copies a
//! subtree, and two clones of the same list are observably the same
//! reference, which is what shallow prop comparison relies on.

use std::{borrow::Cow, error::Error as StdError, fmt, sync::Arc};

use indexmap::IndexMap;
use serde_json::{Number, Value};

/// Ordered mapping used for element descriptors, attributes and props.
pub type Map = IndexMap<String, Node>;

/// Error type a component may fail with.
pub type ComponentError = Box<dyn StdError + Send + Sync + 'static>;

pub(crate) type RenderFn = dyn Fn(&Map) -> Result<Node, ComponentError> + Send + Sync;

/// A renderable value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Node {
    /// Absence of output.
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Siblings, flattened into the parent's children.
    List(Arc<[Node]>),
    /// A single-key map is an element (`{ tag: descriptor }`).
    Map(Arc<Map>),
    /// A component, invoked with its props during rendering.
    Function(Component),
}

impl Node {
    /// Build a list node from anything convertible into nodes.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Node::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map node from key/value pairs, keeping their order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Node>,
    {
        Node::Map(Arc::new(props(entries)))
    }

    /// Short name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::List(_) => "list",
            Node::Map(map) if map.is_empty() => "empty map",
            Node::Map(_) => "map",
            Node::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// `null` and `false` entries are dropped from lists without output.
    pub fn is_omitted(&self) -> bool {
        matches!(self, Node::Null | Node::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Canonical text of a scalar: booleans as `true`/`false`, numbers in
    /// plain decimal form. Non-scalars yield `None`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Node::String(value) => Some(Cow::Borrowed(value)),
            Node::Bool(true) => Some(Cow::Borrowed("true")),
            Node::Bool(false) => Some(Cow::Borrowed("false")),
            Node::Number(number) => Some(Cow::Owned(format_number(number))),
            _ => None,
        }
    }

    /// Shallow equality: scalars by value, lists, maps and functions by
    /// reference.
    pub fn shallow_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Number(a), Node::Number(b)) => a == b,
            (Node::String(a), Node::String(b)) => a == b,
            (Node::List(a), Node::List(b)) => Arc::ptr_eq(a, b),
            (Node::Map(a), Node::Map(b)) => Arc::ptr_eq(a, b),
            (Node::Function(a), Node::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Collect key/value pairs into a [`Map`].
pub fn props<I, K, V>(entries: I) -> Map
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Node>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Shallow comparison of two prop maps, see [`Node::shallow_eq`].
pub fn props_shallow_eq(a: &Map, b: &Map) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| value.shallow_eq(other)))
}

fn format_number(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

/// A pure function from props to a [`Node`].
///
/// Components must be referentially transparent: equal props produce equal
/// nodes. The renderer and [`crate::application::memo`] rely on it.
#[derive(Clone)]
pub struct Component {
    name: Option<Cow<'static, str>>,
    render: Arc<RenderFn>,
    props: Arc<Map>,
}

impl Component {
    /// Wrap an infallible render function.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Map) -> Node + Send + Sync + 'static,
    {
        Self::fallible(move |props| Ok(render(props)))
    }

    /// Wrap a render function that may fail.
    pub fn fallible<F>(render: F) -> Self
    where
        F: Fn(&Map) -> Result<Node, ComponentError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            render: Arc::new(render),
            props: Arc::new(Map::new()),
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the props the component is invoked with.
    pub fn with_props(mut self, props: Map) -> Self {
        self.props = Arc::new(props);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn props(&self) -> &Map {
        &self.props
    }

    /// Invoke with the attached props.
    pub fn call(&self) -> Result<Node, ComponentError> {
        (self.render)(&self.props)
    }

    /// Invoke with explicit props instead of the attached ones.
    pub fn call_with(&self, props: &Map) -> Result<Node, ComponentError> {
        (self.render)(props)
    }

    /// Same function and same props reference.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Arc::ptr_eq(&self.render, &other.render) && Arc::ptr_eq(&self.props, &other.props)
    }

    pub(crate) fn replace_render(&self, render: Arc<RenderFn>) -> Self {
        Self {
            name: self.name.clone(),
            render,
            props: Arc::clone(&self.props),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.render, &other.render) && self.props == other.props
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl From<Component> for Node {
    fn from(component: Component) -> Self {
        Node::Function(component)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::String(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

macro_rules! node_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::Number(Number::from(value))
                }
            }
        )*
    };
}

node_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Node::Null, Node::Number)
    }
}

impl From<f32> for Node {
    fn from(value: f32) -> Self {
        Node::from(f64::from(value))
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Null, Into::into)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(items: Vec<T>) -> Self {
        Node::list(items)
    }
}

impl From<Map> for Node {
    fn from(map: Map) -> Self {
        Node::Map(Arc::new(map))
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(value) => Node::Bool(value),
            Value::Number(number) => Node::Number(number),
            Value::String(value) => Node::String(value),
            Value::Array(items) => Node::list(items),
            Value::Object(object) => Node::map(object),
        }
    }
}
