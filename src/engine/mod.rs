//! Engine context - a render root and its cooperative work loop.
//!
//! [`Engine`] owns everything one render root needs: the work-unit arena,
//! the two generation roots, the traversal cursor, the pass deletion list,
//! and the dirty flag setters mark. Nothing is process-global, so
//! independent roots coexist and tests construct isolated engines.
//!
//! The work loop is cooperative: the host event loop calls [`Engine::tick`]
//! with whatever slice of time it can spare, the engine processes work units
//! one at a time and returns control when the slice is spent, resuming from
//! the stored cursor on the next call. A finished pass is committed to the
//! host tree in one uninterruptible step inside the tick that exhausts the
//! cursor.

use std::time::Instant;

use crate::element::{Element, ElementKind, Props};
use crate::host::{HostError, HostTree, props};

mod commit;
mod hooks;
mod reconcile;
mod unit;

pub use hooks::{Cleanup, IntoCleanup, Scope, Setter};
pub use unit::UnitId;

use hooks::DirtyFlag;
use unit::{UnitArena, WorkUnit};

// =============================================================================
// Work Budget
// =============================================================================

/// Cooperative slice granted to one [`Engine::tick`].
///
/// The budget is checked after each processed unit, so suspension happens
/// only between units - never mid-component, never mid-mutation.
#[derive(Clone, Copy, Debug)]
pub enum WorkBudget {
    /// Never yield; the pass runs to commit in one tick.
    Unlimited,
    /// Yield after this many units. Deterministic, used heavily in tests.
    Units(usize),
    /// Yield once the deadline passes.
    Until(Instant),
}

impl WorkBudget {
    /// Account one processed unit; returns whether the slice is spent.
    fn consume_unit(&mut self) -> bool {
        match self {
            WorkBudget::Unlimited => false,
            WorkBudget::Units(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            WorkBudget::Until(deadline) => Instant::now() >= *deadline,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// One render root: arena, generations, cursor, and the host binding.
pub struct Engine<H: HostTree> {
    host: H,
    units: UnitArena<H::Node>,
    current_root: Option<UnitId>,
    wip_root: Option<UnitId>,
    cursor: Option<UnitId>,
    deletions: Vec<UnitId>,
    dirty: DirtyFlag,
}

impl<H: HostTree> Engine<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            units: UnitArena::with_key(),
            current_root: None,
            wip_root: None,
            cursor: None,
            deletions: Vec::new(),
            dirty: DirtyFlag::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Tear down the engine, returning the host binding.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Seed a pass rendering `element` into `container`.
    ///
    /// The sole entry point: the first call mounts the tree, later calls
    /// diff against whatever was last committed into the same engine.
    pub fn render(&mut self, element: Element, container: H::Node) {
        let mut root_props = Props::new();
        root_props.set_children(vec![element]);
        self.seed(container, root_props);
    }

    /// Drive one cooperative slice. Returns whether work remains, i.e.
    /// whether the host should schedule another tick.
    pub fn tick(&mut self, mut budget: WorkBudget) -> bool {
        // An update queued since the last slice supersedes any in-flight
        // pass: the partial tree is abandoned and a fresh pass derives from
        // the committed tree. Before the first commit there is nothing to
        // derive from, so the flag stays pending.
        if self.dirty.take() && !self.seed_from_current() {
            self.dirty.mark();
        }

        while let Some(unit) = self.cursor {
            self.cursor = self.perform_unit(unit);
            if budget.consume_unit() && self.cursor.is_some() {
                return true;
            }
        }

        if self.wip_root.is_some() {
            self.commit();
        }

        self.dirty.is_marked()
    }

    /// Run passes to completion until no work remains - the behavior of a
    /// host that always grants more time.
    pub fn run_until_idle(&mut self) {
        while self.tick(WorkBudget::Unlimited) {}
    }

    // =========================================================================
    // Pass setup
    // =========================================================================

    fn seed(&mut self, container: H::Node, root_props: Props) {
        // A fresh pass folds every action queued so far, so a pending
        // invalidation is subsumed by it.
        self.dirty.take();
        if let Some(abandoned) = self.wip_root.take() {
            log::debug!("abandoning in-flight pass");
            self.free_tree(abandoned);
        }
        self.deletions.clear();

        // The pass root adopts the caller's container and never creates a
        // node of its own; the empty tag is never bound.
        let mut root = WorkUnit::new(ElementKind::Host("".into()), root_props);
        root.node = Some(container);
        root.alternate = self.current_root;
        let root = self.units.insert(root);

        log::trace!("pass seeded");
        self.wip_root = Some(root);
        self.cursor = Some(root);
    }

    /// Start a fresh pass derived from the last committed tree. Returns
    /// false when nothing has been committed yet.
    fn seed_from_current(&mut self) -> bool {
        let Some(current) = self.current_root else {
            return false;
        };
        let (node, props) = {
            let unit = &self.units[current];
            (unit.node, unit.props.clone())
        };
        let Some(node) = node else {
            return false;
        };
        self.seed(node, props);
        true
    }

    // =========================================================================
    // Unit processing
    // =========================================================================

    /// Process one unit, then pick the next in depth-first pre-order: the
    /// first child if any, else the nearest sibling walking up the parent
    /// chain.
    fn perform_unit(&mut self, unit: UnitId) -> Option<UnitId> {
        match self.units[unit].kind.clone() {
            ElementKind::Component(func) => self.update_component(unit, func),
            ElementKind::Host(_) | ElementKind::Text => self.update_host(unit),
        }

        if let Some(child) = self.units[unit].first_child {
            return Some(child);
        }
        let mut cursor = Some(unit);
        while let Some(id) = cursor {
            if let Some(sibling) = self.units[id].next_sibling {
                return Some(sibling);
            }
            cursor = self.units[id].parent;
        }
        None
    }

    /// Invoke a component with a hook scope bound to its unit and reconcile
    /// the returned element as the unit's only child.
    fn update_component(&mut self, unit: UnitId, func: crate::element::ComponentFn) {
        let prev = self.units[unit]
            .alternate
            .and_then(|alt| self.units.get(alt))
            .map(|alt| hooks::snapshot(&alt.hooks))
            .unwrap_or_default();
        let mut scope = Scope::new(prev, self.dirty.clone());

        let props = self.units[unit].props.clone();
        let rendered = func(&mut scope, &props);

        let (hook_records, pending) = scope.finish();
        {
            let unit = &mut self.units[unit];
            unit.hooks = hook_records;
            unit.effects = pending;
        }
        reconcile::reconcile_children(
            &mut self.units,
            &mut self.deletions,
            unit,
            std::slice::from_ref(&rendered),
        );
    }

    /// Ensure a host/text unit owns a host node, then reconcile its declared
    /// children.
    fn update_host(&mut self, unit: UnitId) {
        if self.units[unit].node.is_none() {
            match self.create_node_for(unit) {
                Ok(node) => {
                    self.units[unit].node = Some(node);
                    // Initial props are applied at creation time; commit
                    // placement only attaches the finished node.
                    let next = self.units[unit].props.clone();
                    props::apply(&mut self.host, node, &Props::new(), &next);
                }
                Err(err) => log::warn!("host node creation failed: {err}"),
            }
        }

        let children = self.units[unit].props.children().to_vec();
        reconcile::reconcile_children(&mut self.units, &mut self.deletions, unit, &children);
    }

    fn create_node_for(&mut self, unit: UnitId) -> Result<H::Node, HostError> {
        match self.units[unit].kind.clone() {
            ElementKind::Text => self.host.create_text(),
            ElementKind::Host(tag) => self.host.create_node(&tag),
            ElementKind::Component(_) => unreachable!("component units own no host node"),
        }
    }

    // =========================================================================
    // Arena maintenance
    // =========================================================================

    /// Free a generation root and everything below it. Only ever called on
    /// generation roots, which have no siblings of their own.
    fn free_tree(&mut self, root: UnitId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(unit) = self.units.remove(id) {
                if let Some(child) = unit.first_child {
                    stack.push(child);
                }
                if id != root {
                    if let Some(sibling) = unit.next_sibling {
                        stack.push(sibling);
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Child, build};
    use crate::host::{MemoryHost, MemoryNodeId, Mutation};
    use crate::types::{Event, Handler, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mounted(element: Element) -> Engine<MemoryHost> {
        let mut engine = Engine::new(MemoryHost::new());
        let root = engine.host().root();
        engine.render(element, root);
        engine.run_until_idle();
        engine
    }

    fn first_child(engine: &Engine<MemoryHost>) -> MemoryNodeId {
        engine.host().children_of(engine.host().root())[0]
    }

    // -------------------------------------------------------------------------
    // Structural end-to-end
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_text_render_and_update() {
        let mut engine = mounted(Element::text("hello"));
        let root = engine.host().root();

        let children = engine.host().children_of(root);
        assert_eq!(children.len(), 1);
        let text_node = children[0];
        assert_eq!(engine.host().text_content(root), "hello");

        engine.host_mut().clear_log();
        engine.render(Element::text("world"), root);
        engine.run_until_idle();

        assert_eq!(engine.host().text_content(root), "world");
        assert_eq!(
            engine.host().log(),
            &[Mutation::SetProperty {
                node: text_node,
                key: crate::element::TEXT_VALUE.to_string()
            }],
            "exactly one update mutation, no nodes created or removed"
        );
    }

    #[test]
    fn test_unchanged_tree_recommits_without_mutations() {
        let on_click = Handler::new(|_| {});
        let tree = || {
            build(
                "div",
                Props::new().set("class", "row").on("click", on_click.clone()),
                ["stable"],
            )
        };

        let mut engine = mounted(tree());
        let root = engine.host().root();
        engine.host_mut().clear_log();

        engine.render(tree(), root);
        engine.run_until_idle();

        assert!(
            engine.host().log().is_empty(),
            "idempotent re-render leaked mutations: {:?}",
            engine.host().log()
        );
    }

    #[test]
    fn test_kind_change_replaces_host_node() {
        let mut engine = mounted(build("div", Props::new(), ["x"]));
        let root = engine.host().root();
        let old_node = first_child(&engine);

        engine.host_mut().clear_log();
        engine.render(build("span", Props::new(), ["x"]), root);
        engine.run_until_idle();

        let new_node = first_child(&engine);
        assert_ne!(old_node, new_node, "host node crossed a kind change");
        assert_eq!(engine.host().node(new_node).unwrap().tag(), Some("span"));
        assert!(
            engine
                .host()
                .log()
                .contains(&Mutation::RemoveChild { parent: root, child: old_node }),
            "old unit must commit as a deletion"
        );
        assert!(
            engine
                .host()
                .log()
                .contains(&Mutation::AppendChild { parent: root, child: new_node }),
            "new unit must commit as a placement"
        );
    }

    #[test]
    fn test_middle_removal_shifts_trailing_siblings() {
        let list = |texts: &[&str]| {
            build(
                "ul",
                Props::new(),
                texts
                    .iter()
                    .map(|t| build("li", Props::new(), [*t]))
                    .collect::<Vec<_>>(),
            )
        };

        let mut engine = mounted(list(&["a", "b", "c"]));
        let root = engine.host().root();
        let ul = first_child(&engine);
        let before: Vec<_> = engine.host().children_of(ul).to_vec();
        assert_eq!(before.len(), 3);

        engine.host_mut().clear_log();
        engine.render(list(&["a", "c"]), root);
        engine.run_until_idle();

        let after: Vec<_> = engine.host().children_of(ul).to_vec();
        assert_eq!(
            after,
            before[..2].to_vec(),
            "positional diff mutates trailing nodes in place instead of moving them"
        );
        assert_eq!(engine.host().text_content(ul), "ac");
        assert!(
            engine
                .host()
                .log()
                .contains(&Mutation::RemoveChild { parent: ul, child: before[2] }),
            "only the tail position is detached"
        );
        assert!(
            !engine
                .host()
                .log()
                .iter()
                .any(|m| matches!(m, Mutation::CreateNode { .. } | Mutation::CreateText { .. })),
            "no nodes may be created by a pure shrink"
        );
    }

    // -------------------------------------------------------------------------
    // Components, state, events
    // -------------------------------------------------------------------------

    fn counter(scope: &mut Scope, props: &Props) -> Element {
        let step = props.get("step").and_then(Value::as_int).unwrap_or(1);
        let (count, set_count) = scope.state(0i64);
        let on_click = Handler::new(move |_| set_count.update(move |c| c + step));
        build("button", Props::new().on("click", on_click), [Child::from(count)])
    }

    #[test]
    fn test_counter_batches_synchronous_updates() {
        let mut engine = mounted(Element::component(counter, Props::new()));
        let root = engine.host().root();
        assert_eq!(engine.host().text_content(root), "0");

        let button = first_child(&engine);
        for _ in 0..3 {
            assert!(engine.host().dispatch(button, "click"));
        }
        engine.run_until_idle();

        assert_eq!(
            engine.host().text_content(root),
            "3",
            "three queued increments must fold in call order"
        );
    }

    #[test]
    fn test_independent_roots_do_not_share_state() {
        let mut left = mounted(Element::component(counter, Props::new()));
        let right = mounted(Element::component(counter, Props::new()));

        let button = first_child(&left);
        left.host().dispatch(button, "click");
        left.run_until_idle();

        assert_eq!(left.host().text_content(left.host().root()), "1");
        assert_eq!(right.host().text_content(right.host().root()), "0");
    }

    fn effect_probe(scope: &mut Scope, props: &Props) -> Element {
        let dep = props.get("dep").cloned().unwrap_or(Value::Int(0));
        let probe = props
            .get("probe")
            .and_then(Value::as_handler)
            .cloned()
            .expect("probe handler prop");
        let cleanup_probe = probe.clone();
        scope.effect(vec![dep.clone()], move || {
            probe.call(&Event::new("run"));
            move || cleanup_probe.call(&Event::new("cleanup"))
        });
        Element::text(dep.to_text())
    }

    fn probe_log() -> (Handler, Rc<RefCell<Vec<String>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let handler = Handler::new(move |event: &Event| sink.borrow_mut().push(event.name.clone()));
        (handler, events)
    }

    #[test]
    fn test_effect_skips_when_deps_unchanged() {
        let (probe, events) = probe_log();
        let app = |dep: i64| {
            Element::component(
                effect_probe,
                Props::new().set("dep", dep).set("probe", probe.clone()),
            )
        };

        let mut engine = mounted(app(1));
        let root = engine.host().root();
        assert_eq!(*events.borrow(), ["run"]);

        engine.render(app(1), root);
        engine.run_until_idle();
        assert_eq!(
            *events.borrow(),
            ["run"],
            "referentially unchanged deps re-ran the effect"
        );
    }

    #[test]
    fn test_effect_cleanup_runs_before_next_callback() {
        let (probe, events) = probe_log();
        let app = |dep: i64| {
            Element::component(
                effect_probe,
                Props::new().set("dep", dep).set("probe", probe.clone()),
            )
        };

        let mut engine = mounted(app(1));
        let root = engine.host().root();
        engine.render(app(2), root);
        engine.run_until_idle();

        assert_eq!(*events.borrow(), ["run", "cleanup", "run"]);
    }

    fn effect_updater(scope: &mut Scope, _: &Props) -> Element {
        let (count, set_count) = scope.state(0i64);
        scope.effect(vec![], move || set_count.set(5));
        Element::text(count)
    }

    #[test]
    fn test_update_from_effect_lands_one_pass_later() {
        let engine = mounted(Element::component(effect_updater, Props::new()));
        // run_until_idle covers both passes: the commit whose effect queued
        // the update, then the pass that renders it.
        assert_eq!(engine.host().text_content(engine.host().root()), "5");
    }

    // -------------------------------------------------------------------------
    // Cooperative scheduling
    // -------------------------------------------------------------------------

    #[test]
    fn test_budget_yields_between_units_and_commits_once() {
        let mut engine = Engine::new(MemoryHost::new());
        let root = engine.host().root();
        engine.render(build("div", Props::new(), ["a", "b", "c"]), root);

        let mut ticks = 0;
        while engine.tick(WorkBudget::Units(1)) {
            ticks += 1;
            assert!(
                engine.host().children_of(root).is_empty(),
                "host tree attached before the pass finished"
            );
            assert!(ticks < 100, "scheduler failed to make progress");
        }

        assert!(ticks >= 3, "a five-unit pass must span several unit slices");
        assert_eq!(engine.host().text_content(root), "abc");
    }

    #[test]
    fn test_update_supersedes_interrupted_pass() {
        let mut engine = mounted(Element::component(counter, Props::new()));
        let root = engine.host().root();
        let button = first_child(&engine);

        engine.host().dispatch(button, "click");
        // Start the resulting pass but yield before it finishes.
        let more = engine.tick(WorkBudget::Units(1));
        assert!(more, "pass should be suspended mid-flight");
        assert_eq!(engine.host().text_content(root), "0");

        // A second update invalidates the suspended pass; the replacement
        // derives from the committed tree and folds both queued actions.
        engine.host().dispatch(button, "click");
        engine.run_until_idle();

        assert_eq!(
            engine.host().text_content(root),
            "2",
            "superseded pass must not lose or double-apply updates"
        );
    }

    #[test]
    fn test_deadline_budget_runs_to_completion() {
        let mut engine = Engine::new(MemoryHost::new());
        let root = engine.host().root();
        engine.render(build("div", Props::new(), ["x"]), root);

        // A generous deadline behaves like an unlimited slice.
        let deadline = Instant::now() + std::time::Duration::from_secs(60);
        assert!(!engine.tick(WorkBudget::Until(deadline)));
        assert_eq!(engine.host().text_content(root), "x");
    }
}
