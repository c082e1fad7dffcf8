//! Core types for cinder.
//!
//! These types define the vocabulary shared by the element builder, the
//! reconciler and the host binding: property values, event payloads, and the
//! mutation tags carried by work units through a render pass.

use std::fmt;
use std::rc::Rc;

// =============================================================================
// Event
// =============================================================================

/// Payload delivered to event listeners.
///
/// The engine itself never synthesizes events; the host binding constructs
/// one when it routes a native event into a registered listener.
#[derive(Clone, Debug)]
pub struct Event {
    /// Native event name, e.g. `click`.
    pub name: String,
    /// Optional host-provided payload.
    pub detail: Option<Value>,
}

impl Event {
    /// Create an event with no detail payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    /// Attach a detail payload.
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Shared event callback (Rc for shared ownership in closures).
///
/// Using `Rc<dyn Fn>` instead of `Box<dyn Fn>` allows cloning callbacks into
/// props and host listener tables without ownership issues. Handlers compare
/// by pointer identity, which is what the commit diff uses to decide whether
/// a listener changed between passes.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    /// Wrap a callback.
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Identity comparison: two handlers are the same only if they share the
    /// same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// A value carried in an element's prop bag or an effect dependency list.
///
/// Primitives compare by value, handlers by reference. The commit diff only
/// touches entries whose comparison reports a change.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Handler(Handler),
}

impl Value {
    /// Display form of the value, used for text node content.
    pub fn to_text(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Handler(_) => "[handler]".to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value.as_str()))
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

// =============================================================================
// Effect Tag
// =============================================================================

/// Pending host mutation recorded on a work unit during reconciliation.
///
/// Tags are consumed by the commit engine and reset to `None` when the
/// finished tree is promoted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EffectTag {
    /// No pending mutation (committed units, and the pass root).
    #[default]
    None,
    /// Fresh unit: its host node must be inserted.
    Placement,
    /// Reused unit: diff and apply prop/listener changes.
    Update,
    /// Unmatched previous-generation unit: detach its host subtree.
    Deletion,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::from("a"), Value::from("b"));
        assert_ne!(Value::from(1), Value::from(1.0));
    }

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(|_| {});
        let b = Handler::new(|_| {});
        let a2 = a.clone();

        assert!(a.ptr_eq(&a2));
        assert!(!a.ptr_eq(&b));
        assert_eq!(Value::from(a.clone()), Value::from(a2));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Value::from("hi").to_text(), "hi");
        assert_eq!(Value::from(42).to_text(), "42");
        assert_eq!(Value::from(true).to_text(), "true");
    }

    #[test]
    fn test_handler_call() {
        use std::cell::Cell;
        use std::rc::Rc;

        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let handler = Handler::new(move |event| {
            assert_eq!(event.name, "click");
            hits_clone.set(hits_clone.get() + 1);
        });

        handler.call(&Event::new("click"));
        handler.call(&Event::new("click"));
        assert_eq!(hits.get(), 2);
    }
}
