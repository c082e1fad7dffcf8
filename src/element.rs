//! Element builder - immutable descriptors for declarative trees.
//!
//! An element names what should exist at one tree position: a host node with
//! a tag, a text leaf, or a component to invoke. [`build`] mirrors the
//! classic `createElement` shape: a tag, a prop bag, and a child list in
//! which nested lists are flattened and bare primitives are wrapped into
//! text descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::Scope;
use crate::types::{Handler, Value};

/// Reserved prop key carrying a text node's display value.
///
/// Text updates flow through the ordinary prop diff, so a changed text value
/// reaches the host as a single `set_property` on this key.
pub const TEXT_VALUE: &str = "text";

// =============================================================================
// Element Kind
// =============================================================================

/// A component: a plain function invoked with a hook scope and its props,
/// returning the element it renders to.
///
/// Function pointers give components a stable identity across passes, which
/// is what positional reconciliation compares to decide whether hook state
/// carries forward.
pub type ComponentFn = fn(&mut Scope, &Props) -> Element;

/// The three renderable kinds.
#[derive(Clone)]
pub enum ElementKind {
    /// Host node with a tag the binding understands.
    Host(Rc<str>),
    /// Text leaf; the value lives in the [`TEXT_VALUE`] prop.
    Text,
    /// Component invoked during the pass to produce children.
    Component(ComponentFn),
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Host(tag) => write!(f, "Host({tag:?})"),
            ElementKind::Text => write!(f, "Text"),
            ElementKind::Component(func) => write!(f, "Component({:p})", *func as *const ()),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Ordered prop bag plus ordered child list. Immutable once built.
///
/// Children are structural, not an entry in the keyed bag, so the prop diff
/// never has to special-case a reserved `children` key. Keys are kept in a
/// sorted map so commit mutation order is deterministic.
#[derive(Clone, Debug, Default)]
pub struct Props {
    values: BTreeMap<String, Value>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a keyed value (builder style).
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Attach an event listener under the `on` naming convention:
    /// `on("click", h)` stores the `onclick` key.
    pub fn on(mut self, event: &str, handler: Handler) -> Self {
        self.values
            .insert(format!("on{event}"), Value::Handler(handler));
        self
    }

    /// Look up a keyed value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterate keyed values in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the keyed bag contains `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The ordered child list.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn set_children(&mut self, children: Vec<Element>) {
        self.children = children;
    }
}

// =============================================================================
// Child arguments
// =============================================================================

/// A child argument accepted by [`build`]: an element, a primitive to wrap
/// into a text leaf, or a nested list to flatten.
pub enum Child {
    One(Element),
    Many(Vec<Child>),
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::One(element)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::One(Element::text(value))
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::One(Element::text(value))
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::One(Element::text(value))
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::One(Element::text(value))
    }
}

impl From<Vec<Child>> for Child {
    fn from(children: Vec<Child>) -> Self {
        Child::Many(children)
    }
}

impl From<Vec<Element>> for Child {
    fn from(elements: Vec<Element>) -> Self {
        Child::Many(elements.into_iter().map(Child::One).collect())
    }
}

fn flatten_into(child: Child, out: &mut Vec<Element>) {
    match child {
        Child::One(element) => out.push(element),
        Child::Many(children) => {
            for child in children {
                flatten_into(child, out);
            }
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// One node of a declarative tree: a kind plus its props and children.
#[derive(Clone, Debug)]
pub struct Element {
    pub(crate) kind: ElementKind,
    pub(crate) props: Props,
}

impl Element {
    /// The element's kind.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// The element's props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// A text leaf carrying `value` verbatim in the [`TEXT_VALUE`] prop.
    pub fn text(value: impl Into<Value>) -> Self {
        Self {
            kind: ElementKind::Text,
            props: Props::new().set(TEXT_VALUE, value),
        }
    }

    /// A component element. Children for the component go through
    /// [`Element::with_children`] and arrive in its props.
    pub fn component(func: ComponentFn, props: Props) -> Self {
        Self {
            kind: ElementKind::Component(func),
            props,
        }
    }

    /// Replace the child list, flattening as [`build`] does.
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        let mut flat = Vec::new();
        for child in children {
            flatten_into(child.into(), &mut flat);
        }
        self.props.set_children(flat);
        self
    }
}

/// Construct a host element descriptor.
///
/// Children may be elements, strings, or numbers in arbitrarily nested
/// lists; lists are flattened until none remain and primitives become text
/// leaves. No validation is performed on `props`.
pub fn build<I>(tag: &str, props: Props, children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Child>,
{
    Element {
        kind: ElementKind::Host(Rc::from(tag)),
        props,
    }
    .with_children(children)
}

// =============================================================================
// Tests
// =============================================================================
