//! In-memory host tree.
//!
//! A retained node store standing in for a real UI toolkit. It accepts
//! arbitrary properties permissively, records every mutation applied through
//! the [`HostTree`] trait so tests can assert on exactly what the commit
//! engine did, and can dispatch named events into registered listeners to
//! close the loop from committed handler props back into the engine.

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::element::TEXT_VALUE;
use crate::types::{Event, Handler, Value};

use super::{HostError, HostTree};

slotmap::new_key_type! {
    /// Node handle minted by [`MemoryHost`].
    pub struct MemoryNodeId;
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
enum NodeKind {
    Element(String),
    Text,
}

/// One retained node: kind, properties, listeners, and child links.
#[derive(Debug)]
pub struct MemoryNode {
    kind: NodeKind,
    props: BTreeMap<String, Value>,
    listeners: BTreeMap<String, Handler>,
    children: Vec<MemoryNodeId>,
    parent: Option<MemoryNodeId>,
}

impl MemoryNode {
    fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element(tag.to_string()),
            props: BTreeMap::new(),
            listeners: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    fn new_text() -> Self {
        Self {
            kind: NodeKind::Text,
            props: BTreeMap::new(),
            listeners: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Tag for element nodes, `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text => None,
        }
    }

    /// Whether this is a text node.
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// A property value, if assigned.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// The registered listener for a native event, if any.
    pub fn listener(&self, event: &str) -> Option<&Handler> {
        self.listeners.get(event)
    }

    /// Child handles in document order.
    pub fn children(&self) -> &[MemoryNodeId] {
        &self.children
    }

    /// Display text of a text node.
    pub fn text(&self) -> Option<String> {
        if self.is_text() {
            Some(
                self.props
                    .get(TEXT_VALUE)
                    .map(Value::to_text)
                    .unwrap_or_default(),
            )
        } else {
            None
        }
    }
}

// =============================================================================
// Mutation log
// =============================================================================

/// Record of one mutation applied through the [`HostTree`] trait.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    CreateNode { node: MemoryNodeId, tag: String },
    CreateText { node: MemoryNodeId },
    SetProperty { node: MemoryNodeId, key: String },
    ClearProperty { node: MemoryNodeId, key: String },
    AddListener { node: MemoryNodeId, event: String },
    RemoveListener { node: MemoryNodeId, event: String },
    AppendChild { parent: MemoryNodeId, child: MemoryNodeId },
    RemoveChild { parent: MemoryNodeId, child: MemoryNodeId },
}

// =============================================================================
// Memory Host
// =============================================================================

/// Retained in-memory host tree with a mutation log.
#[derive(Debug)]
pub struct MemoryHost {
    nodes: SlotMap<MemoryNodeId, MemoryNode>,
    root: MemoryNodeId,
    log: Vec<Mutation>,
}

impl MemoryHost {
    /// Create a host with a single empty container node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(MemoryNode::element("#root"));
        Self {
            nodes,
            root,
            log: Vec::new(),
        }
    }

    /// The container node renders are mounted into.
    pub fn root(&self) -> MemoryNodeId {
        self.root
    }

    /// Look up a live node.
    pub fn node(&self, id: MemoryNodeId) -> Option<&MemoryNode> {
        self.nodes.get(id)
    }

    /// Child handles of `id` in document order (empty if unknown).
    pub fn children_of(&self, id: MemoryNodeId) -> &[MemoryNodeId] {
        self.nodes.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Every mutation applied since the last [`MemoryHost::clear_log`].
    pub fn log(&self) -> &[Mutation] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Concatenated text content of `id`'s subtree, document order.
    pub fn text_content(&self, id: MemoryNodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if let Some(text) = node.text() {
                out.push_str(&text);
            }
            for child in node.children().iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Route a named event into the listener registered on `node`.
    ///
    /// Returns whether a listener ran. Takes `&self`: listeners are cloned
    /// out before invocation, so a handler is free to queue state updates
    /// that a later engine tick will pick up.
    pub fn dispatch(&self, node: MemoryNodeId, event: &str) -> bool {
        let Some(handler) = self
            .nodes
            .get(node)
            .and_then(|n| n.listeners.get(event))
            .cloned()
        else {
            return false;
        };
        handler.call(&Event::new(event));
        true
    }

    fn describe(&self, id: MemoryNodeId) -> String {
        format!("{id:?}")
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTree for MemoryHost {
    type Node = MemoryNodeId;

    fn create_node(&mut self, tag: &str) -> Result<MemoryNodeId, HostError> {
        let node = self.nodes.insert(MemoryNode::element(tag));
        self.log.push(Mutation::CreateNode {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text(&mut self) -> Result<MemoryNodeId, HostError> {
        let node = self.nodes.insert(MemoryNode::new_text());
        self.log.push(Mutation::CreateText { node });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: MemoryNodeId,
        key: &str,
        value: &Value,
    ) -> Result<(), HostError> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| HostError::UnknownNode(format!("{node:?}")))?;
        // Permissive: any key is accepted as a node property.
        entry.props.insert(key.to_string(), value.clone());
        self.log.push(Mutation::SetProperty {
            node,
            key: key.to_string(),
        });
        Ok(())
    }

    fn clear_property(&mut self, node: MemoryNodeId, key: &str) -> Result<(), HostError> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| HostError::UnknownNode(format!("{node:?}")))?;
        entry.props.remove(key);
        self.log.push(Mutation::ClearProperty {
            node,
            key: key.to_string(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: MemoryNodeId,
        event: &str,
        handler: Handler,
    ) -> Result<(), HostError> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| HostError::UnknownNode(format!("{node:?}")))?;
        entry.listeners.insert(event.to_string(), handler);
        self.log.push(Mutation::AddListener {
            node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(&mut self, node: MemoryNodeId, event: &str) -> Result<(), HostError> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| HostError::UnknownNode(format!("{node:?}")))?;
        entry.listeners.remove(event);
        self.log.push(Mutation::RemoveListener {
            node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: MemoryNodeId, child: MemoryNodeId) -> Result<(), HostError> {
        if !self.nodes.contains_key(child) {
            return Err(HostError::UnknownNode(self.describe(child)));
        }
        match self.nodes.get(parent) {
            None => return Err(HostError::UnknownNode(self.describe(parent))),
            Some(node) if node.is_text() => {
                return Err(HostError::NotAContainer(self.describe(parent)));
            }
            Some(_) => {}
        }

        // Re-appending moves the child, like a retained document tree.
        if let Some(old_parent) = self.nodes[child].parent {
            if let Some(entry) = self.nodes.get_mut(old_parent) {
                entry.children.retain(|c| *c != child);
            }
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.log.push(Mutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: MemoryNodeId, child: MemoryNodeId) -> Result<(), HostError> {
        if !self.nodes.contains_key(parent) {
            return Err(HostError::UnknownNode(self.describe(parent)));
        }
        if self.nodes[parent].children.iter().all(|c| *c != child) {
            return Err(HostError::NotAChild {
                parent: self.describe(parent),
                child: self.describe(child),
            });
        }
        self.nodes[parent].children.retain(|c| *c != child);
        if let Some(entry) = self.nodes.get_mut(child) {
            entry.parent = None;
        }
        self.log.push(Mutation::RemoveChild { parent, child });
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_append() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let div = host.create_node("div").unwrap();
        let text = host.create_text().unwrap();

        host.append_child(root, div).unwrap();
        host.append_child(div, text).unwrap();

        assert_eq!(host.children_of(root), &[div]);
        assert_eq!(host.children_of(div), &[text]);
        assert_eq!(host.node(div).unwrap().tag(), Some("div"));
        assert!(host.node(text).unwrap().is_text());
    }

    #[test]
    fn test_text_nodes_reject_children() {
        let mut host = MemoryHost::new();
        let text = host.create_text().unwrap();
        let div = host.create_node("div").unwrap();

        assert!(matches!(
            host.append_child(text, div),
            Err(HostError::NotAContainer(_))
        ));
    }

    #[test]
    fn test_remove_child_requires_attachment() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let div = host.create_node("div").unwrap();

        assert!(matches!(
            host.remove_child(root, div),
            Err(HostError::NotAChild { .. })
        ));

        host.append_child(root, div).unwrap();
        host.remove_child(root, div).unwrap();
        assert!(host.children_of(root).is_empty());
    }

    #[test]
    fn test_permissive_properties() {
        let mut host = MemoryHost::new();
        let div = host.create_node("div").unwrap();

        host.set_property(div, "whatever", &Value::from(9))
            .unwrap();
        assert_eq!(host.node(div).unwrap().prop("whatever"), Some(&Value::from(9)));
    }

    #[test]
    fn test_dispatch_invokes_listener() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut host = MemoryHost::new();
        let button = host.create_node("button").unwrap();
        let clicks = Rc::new(Cell::new(0));
        let clicks_clone = clicks.clone();

        host.add_listener(
            button,
            "click",
            Handler::new(move |_| clicks_clone.set(clicks_clone.get() + 1)),
        )
        .unwrap();

        assert!(host.dispatch(button, "click"));
        assert!(host.dispatch(button, "click"));
        assert!(!host.dispatch(button, "keydown"));
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn test_text_content_document_order() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_text().unwrap();
        let div = host.create_node("div").unwrap();
        let b = host.create_text().unwrap();

        host.set_property(a, TEXT_VALUE, &Value::from("a")).unwrap();
        host.set_property(b, TEXT_VALUE, &Value::from("b")).unwrap();
        host.append_child(root, a).unwrap();
        host.append_child(root, div).unwrap();
        host.append_child(div, b).unwrap();

        assert_eq!(host.text_content(root), "ab");
    }
}
