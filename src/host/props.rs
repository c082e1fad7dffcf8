//! Property and listener diffing against a host node.
//!
//! Prop keys follow one naming convention: a key starting with `on` is an
//! event binding whose native event name is the remainder, lower-cased;
//! every other key is a direct property assignment. The diff touches only
//! entries that changed between two prop bags, so re-applying identical
//! props produces no host mutations. (Children never appear in the keyed
//! bag - [`crate::Props`] keeps them as a separate structural list.)

use crate::element::Props;

use super::HostTree;

/// Whether `key` is an event binding under the `on` convention.
pub fn is_event(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on")
}

/// Native event name for an event-binding key: `onClick` -> `click`.
///
/// Returns `None` for keys outside the convention.
pub fn event_name(key: &str) -> Option<String> {
    if is_event(key) {
        Some(key[2..].to_ascii_lowercase())
    } else {
        None
    }
}

/// Apply the difference between `prev` and `next` to `node`.
///
/// Four phases, in order: remove listeners that are gone or changed, clear
/// properties that are gone, assign properties that are new or changed, add
/// listeners that are new or changed. Change detection is [`Value`]
/// equality - by value for primitives, by reference for handlers. Binding
/// failures are logged and skipped.
pub(crate) fn apply<H: HostTree>(host: &mut H, node: H::Node, prev: &Props, next: &Props) {
    // Remove old or changed event listeners.
    for (key, value) in prev.iter() {
        let Some(event) = event_name(key) else {
            continue;
        };
        let gone_or_changed = match next.get(key) {
            None => true,
            Some(next_value) => next_value != value,
        };
        if gone_or_changed {
            if let Err(err) = host.remove_listener(node, &event) {
                log::warn!("remove_listener({event}) failed: {err}");
            }
        }
    }

    // Clear properties that vanished.
    for (key, _) in prev.iter() {
        if is_event(key) || next.contains(key) {
            continue;
        }
        if let Err(err) = host.clear_property(node, key) {
            log::warn!("clear_property({key}) failed: {err}");
        }
    }

    // Assign new or changed properties.
    for (key, value) in next.iter() {
        if is_event(key) || prev.get(key) == Some(value) {
            continue;
        }
        if let Err(err) = host.set_property(node, key, value) {
            log::warn!("set_property({key}) failed: {err}");
        }
    }

    // Add new or changed event listeners.
    for (key, value) in next.iter() {
        let Some(event) = event_name(key) else {
            continue;
        };
        if prev.get(key) == Some(value) {
            continue;
        }
        let Some(handler) = value.as_handler() else {
            // Classified by key, but the value cannot be bound.
            log::warn!("prop {key} is event-classified but holds no handler, skipping");
            continue;
        };
        if let Err(err) = host.add_listener(node, &event, handler.clone()) {
            log::warn!("add_listener({event}) failed: {err}");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryHost, Mutation};
    use crate::types::Handler;

    fn node(host: &mut MemoryHost) -> <MemoryHost as HostTree>::Node {
        host.create_node("div").unwrap()
    }

    #[test]
    fn test_event_name_convention() {
        assert_eq!(event_name("onClick"), Some("click".to_string()));
        assert_eq!(event_name("onclick"), Some("click".to_string()));
        assert_eq!(event_name("onDblClick"), Some("dblclick".to_string()));
        assert_eq!(event_name("once"), Some("ce".to_string()));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("class"), None);
    }

    #[test]
    fn test_identical_props_are_a_noop() {
        let mut host = MemoryHost::new();
        let n = node(&mut host);
        let props = Props::new()
            .set("class", "row")
            .on("click", Handler::new(|_| {}));

        apply(&mut host, n, &Props::new(), &props);
        let applied = host.log().len();

        apply(&mut host, n, &props, &props);
        assert_eq!(host.log().len(), applied, "unchanged props reached the host");
    }

    #[test]
    fn test_vanished_property_is_cleared() {
        let mut host = MemoryHost::new();
        let n = node(&mut host);
        let prev = Props::new().set("class", "row").set("id", "x");
        let next = Props::new().set("class", "row");

        apply(&mut host, n, &Props::new(), &prev);
        host.clear_log();
        apply(&mut host, n, &prev, &next);

        assert_eq!(
            host.log(),
            &[Mutation::ClearProperty {
                node: n,
                key: "id".to_string()
            }]
        );
        assert!(host.node(n).unwrap().prop("id").is_none());
    }

    #[test]
    fn test_changed_handler_is_replaced() {
        let mut host = MemoryHost::new();
        let n = node(&mut host);
        let first = Handler::new(|_| {});
        let second = Handler::new(|_| {});
        let prev = Props::new().on("click", first);
        let next = Props::new().on("click", second.clone());

        apply(&mut host, n, &Props::new(), &prev);
        host.clear_log();
        apply(&mut host, n, &prev, &next);

        assert_eq!(
            host.log(),
            &[
                Mutation::RemoveListener {
                    node: n,
                    event: "click".to_string()
                },
                Mutation::AddListener {
                    node: n,
                    event: "click".to_string()
                },
            ]
        );
        assert!(
            host.node(n)
                .unwrap()
                .listener("click")
                .unwrap()
                .ptr_eq(&second)
        );
    }

    #[test]
    fn test_unchanged_handler_is_kept() {
        let mut host = MemoryHost::new();
        let n = node(&mut host);
        let handler = Handler::new(|_| {});
        let props = Props::new().on("click", handler);

        apply(&mut host, n, &Props::new(), &props);
        host.clear_log();
        apply(&mut host, n, &props, &props.clone());

        assert!(host.log().is_empty());
    }
}
