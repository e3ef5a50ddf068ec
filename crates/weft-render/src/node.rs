//! Static description of a render tree.
//!
//! A [`Node`] is one of three things:
//!
//! ```text
//! Node
//! ├── Literal   "text", 42, true, null, undefined
//! ├── Element   { tag, props }   tag = intrinsic name | component
//! └── Fragment  [Node, Node, ...]  (flattened before evaluation)
//! ```
//!
//! Nodes are immutable and cheap to clone. Cloning an element shares its
//! identity, which is what [`memo`](crate::memo) keys on.
//!
//! Building a node never evaluates anything and never fails. Evaluation
//! happens in [`RenderContext::render`].
//!
//! # Example
//!
//! ```
//! use weft_render::{create_element, intrinsic, Node, Props};
//!
//! let el = create_element(
//!     intrinsic("message"),
//!     Props::new().attr("role", "user"),
//!     vec![Node::from("Hello, "), Node::from("world")],
//! );
//! assert_eq!(el.tag().name(), "message");
//! assert_eq!(el.props().get_str("role"), Some("user"));
//! assert_eq!(el.props().children().len(), 2);
//! ```

use crate::component::{Component, FnComponent, Renderable};
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::live::LiveElement;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use weft_types::ElementId;

/// Primitive leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Renders as itself.
    Str(String),
    /// Renders in display form; integral values have no fractional part.
    Number(f64),
    /// Renders as the empty string.
    Bool(bool),
    /// Renders as the empty string.
    Null,
    /// Renders as the empty string.
    Undefined,
}

impl Literal {
    /// Returns the text this literal contributes to a flattening.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Bool(_) | Self::Null | Self::Undefined => String::new(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A renderable tree description.
#[derive(Clone)]
pub enum Node {
    /// Primitive leaf.
    Literal(Literal),
    /// Intrinsic or component element.
    Element(Element),
    /// Ordered sequence of nodes.
    Fragment(Vec<Node>),
}

impl Node {
    /// Creates a fragment from anything convertible to nodes.
    pub fn fragment<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::Fragment(nodes.into_iter().map(Into::into).collect())
    }

    /// Returns the element, if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Expands nested fragments into a flat list of non-fragment nodes.
    #[must_use]
    pub fn flatten(self) -> Vec<Node> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    pub(crate) fn flatten_into(self, out: &mut Vec<Node>) {
        match self {
            Self::Fragment(nodes) => {
                for node in nodes {
                    node.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Converts a dynamic value returned by a component.
    ///
    /// Objects are not renderable; the error carries a description of what
    /// was found.
    pub(crate) fn from_value(value: Value) -> Result<Node, String> {
        match value {
            Value::Null => Ok(Self::Literal(Literal::Null)),
            Value::Bool(b) => Ok(Self::Literal(Literal::Bool(b))),
            Value::Number(n) => Ok(Self::Literal(Literal::Number(n.as_f64().unwrap_or(f64::NAN)))),
            Value::String(s) => Ok(Self::Literal(Literal::Str(s))),
            Value::Array(items) => items
                .into_iter()
                .map(Self::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Fragment),
            Value::Object(map) => Err(format!("object with {} key(s)", map.len())),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => lit.fmt(f),
            Self::Element(el) => el.fmt(f),
            Self::Fragment(nodes) => f.debug_list().entries(nodes).finish(),
        }
    }
}

impl From<Literal> for Node {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Literal(Literal::Str(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Literal(Literal::Str(s))
    }
}

impl From<&String> for Node {
    fn from(s: &String) -> Self {
        Self::Literal(Literal::Str(s.clone()))
    }
}

macro_rules! node_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Node {
                fn from(n: $t) -> Self {
                    Self::Literal(Literal::Number(n as f64))
                }
            }
        )*
    };
}

node_from_number!(f64, f32, i64, i32, u64, u32, usize);

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Self::Literal(Literal::Bool(b))
    }
}

impl From<()> for Node {
    fn from((): ()) -> Self {
        Self::Literal(Literal::Undefined)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Literal(Literal::Null), Into::into)
    }
}

impl From<Vec<Node>> for Node {
    fn from(nodes: Vec<Node>) -> Self {
        Self::Fragment(nodes)
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

/// Element tag: an intrinsic name or a component.
#[derive(Clone)]
pub enum Tag {
    /// Named leaf kind. Rendered without expansion; children are evaluated.
    Intrinsic(Arc<str>),
    /// User component, invoked at render time.
    Component(Arc<dyn Component>),
}

impl Tag {
    /// Returns the intrinsic name or the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Intrinsic(name) => name,
            Self::Component(c) => c.name(),
        }
    }

    /// Returns `true` for component tags.
    #[must_use]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intrinsic(name) => write!(f, "Intrinsic({name})"),
            Self::Component(c) => write!(f, "Component({})", c.name()),
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        intrinsic(name)
    }
}

impl<C: Component + 'static> From<Arc<C>> for Tag {
    fn from(c: Arc<C>) -> Self {
        Self::Component(c)
    }
}

/// Creates an intrinsic tag.
#[must_use]
pub fn intrinsic(name: &str) -> Tag {
    Tag::Intrinsic(Arc::from(name))
}

/// Creates a component tag from a closure.
///
/// # Example
///
/// ```
/// use weft_render::{component, create_element, Props, RenderContext, Renderable};
///
/// let greet = component("Greet", |props, _ctx| {
///     let name = props.get_str("name").unwrap_or("stranger").to_string();
///     Ok(Renderable::from(format!("Hello, {name}")))
/// });
/// let el = create_element(greet, Props::new().attr("name", "Ada"), vec![]);
/// let live = RenderContext::new().render(el);
/// assert_eq!(live.to_string(), "Hello, Ada");
/// ```
pub fn component<F>(name: &str, render: F) -> Tag
where
    F: Fn(&Props, &RenderContext) -> Result<Renderable, RenderError> + Send + Sync + 'static,
{
    Tag::Component(Arc::new(FnComponent::new(name, render)))
}

/// Element attributes plus the reserved children list.
#[derive(Clone, Default)]
pub struct Props {
    attributes: Map<String, Value>,
    children: Vec<Node>,
}

impl Props {
    /// Creates empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Appends children.
    #[must_use]
    pub fn with_children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Returns an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns a string attribute.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Returns all attributes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the children.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns the attributes as a JSON object (children excluded).
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .finish()
    }
}

/// A tagged node with props and a unique identity.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementData>,
}

struct ElementData {
    id: ElementId,
    tag: Tag,
    props: Props,
    /// Set for elements produced by [`LiveElement::as_node`].
    spliced: Option<LiveElement>,
}

impl Element {
    /// Creates an element with a fresh identity.
    #[must_use]
    pub fn new(tag: impl Into<Tag>, props: Props) -> Self {
        Self {
            inner: Arc::new(ElementData {
                id: ElementId::new(),
                tag: tag.into(),
                props,
                spliced: None,
            }),
        }
    }

    pub(crate) fn splice(tag: Tag, live: LiveElement) -> Self {
        Self {
            inner: Arc::new(ElementData {
                id: ElementId::new(),
                tag,
                props: Props::default(),
                spliced: Some(live),
            }),
        }
    }

    /// Returns the element identity.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    /// Returns the tag.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        &self.inner.tag
    }

    /// Returns the props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub(crate) fn spliced(&self) -> Option<&LiveElement> {
        self.inner.spliced.as_ref()
    }

    /// Invokes the element under `ctx`.
    ///
    /// Components are called with the element's props. Intrinsic elements
    /// yield a new live element whose children are rendered recursively.
    ///
    /// # Errors
    ///
    /// Returns whatever the component's `render` returns.
    pub fn invoke(&self, ctx: &RenderContext) -> Result<Renderable, RenderError> {
        match self.tag() {
            Tag::Component(c) => c.render(self.props(), ctx),
            Tag::Intrinsic(_) => Ok(Renderable::Evaluator(LiveElement::build(
                Node::Element(self.clone()),
                ctx,
                false,
            ))),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .field("tag", &self.inner.tag)
            .field("props", &self.inner.props)
            .finish()
    }
}

/// Creates an element, appending `children` to the props' children.
pub fn create_element<I>(tag: impl Into<Tag>, props: Props, children: I) -> Element
where
    I: IntoIterator<Item = Node>,
{
    Element::new(tag, props.with_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_text_forms() {
        assert_eq!(Literal::Str("hi".into()).to_text(), "hi");
        assert_eq!(Literal::Number(3.0).to_text(), "3");
        assert_eq!(Literal::Number(-2.5).to_text(), "-2.5");
        assert_eq!(Literal::Number(f64::NAN).to_text(), "NaN");
        assert_eq!(Literal::Bool(true).to_text(), "");
        assert_eq!(Literal::Null.to_text(), "");
        assert_eq!(Literal::Undefined.to_text(), "");
    }

    #[test]
    fn flatten_expands_nested_fragments() {
        let node = Node::fragment(vec![
            Node::from("a"),
            Node::fragment(vec![Node::from("b"), Node::fragment(vec![Node::from("c")])]),
        ]);
        let flat = node.flatten();
        assert_eq!(flat.len(), 3);
        assert!(flat.iter().all(|n| matches!(n, Node::Literal(_))));
    }

    #[test]
    fn from_value_rejects_objects() {
        assert!(matches!(
            Node::from_value(json!(["a", 1, null])),
            Ok(Node::Fragment(items)) if items.len() == 3
        ));
        let err = Node::from_value(json!({"a": 1})).unwrap_err();
        assert_eq!(err, "object with 1 key(s)");
        assert!(Node::from_value(json!([{"nested": true}])).is_err());
    }

    #[test]
    fn option_none_is_null() {
        let node = Node::from(None::<&str>);
        assert!(matches!(node, Node::Literal(Literal::Null)));
    }

    #[test]
    fn create_element_merges_children() {
        let el = create_element(
            "list",
            Props::new().with_children(vec!["a"]),
            vec![Node::from("b")],
        );
        assert_eq!(el.props().children().len(), 2);
        assert_eq!(el.tag().name(), "list");
        assert!(!el.tag().is_component());
    }

    #[test]
    fn clones_share_identity() {
        let el = Element::new("x", Props::new());
        let copy = el.clone();
        assert_eq!(el, copy);
        assert_ne!(el, Element::new("x", Props::new()));
    }

    #[test]
    fn props_to_value_excludes_children() {
        let props = Props::new().attr("k", 1).with_children(vec!["child"]);
        assert_eq!(props.to_value(), json!({"k": 1}));
    }
}
