//! Commit engine - applies a finished pass to the host tree.
//!
//! Commit runs only after the whole work-in-progress tree has been
//! processed, and it runs to completion without yielding: no other mutation
//! pass can interleave. Four steps, in order: flush the deletion list, apply
//! placements and updates depth-first, run queued effects in tree order,
//! promote the finished tree to current.

use crate::host::{HostTree, props};
use crate::types::EffectTag;

use super::hooks::HookRecord;
use super::unit::UnitId;
use super::Engine;

impl<H: HostTree> Engine<H> {
    pub(super) fn commit(&mut self) {
        let Some(root) = self.wip_root else {
            return;
        };
        log::debug!("commit: {} deletions", self.deletions.len());

        let deletions = std::mem::take(&mut self.deletions);
        for unit in deletions {
            self.commit_deletion(unit);
        }

        if let Some(child) = self.units[root].first_child {
            self.commit_unit(child);
        }

        self.run_effects(root);
        self.promote(root);
    }

    /// Nearest host-bearing ancestor: where a unit's subtree attaches.
    /// Component units own no node, so the walk may skip several levels.
    fn host_parent(&self, unit: UnitId) -> Option<H::Node> {
        let mut cursor = self.units[unit].parent;
        while let Some(id) = cursor {
            let unit = &self.units[id];
            if let Some(node) = unit.node {
                return Some(node);
            }
            cursor = unit.parent;
        }
        None
    }

    /// Nearest host-bearing unit at or below `unit`, following first
    /// children - the node that actually sits in the host tree.
    fn host_descendant(&self, unit: UnitId) -> Option<H::Node> {
        let mut cursor = Some(unit);
        while let Some(id) = cursor {
            let unit = &self.units[id];
            if let Some(node) = unit.node {
                return Some(node);
            }
            cursor = unit.first_child;
        }
        None
    }

    fn commit_deletion(&mut self, unit: UnitId) {
        let parent = self.host_parent(unit);
        let node = self.host_descendant(unit);
        if let (Some(parent), Some(node)) = (parent, node) {
            if let Err(err) = self.host.remove_child(parent, node) {
                log::warn!("remove_child failed during deletion: {err}");
            }
        }
    }

    /// Placement/update walk. Component units are skipped (nothing of
    /// theirs exists in the host tree); deletions never appear here because
    /// they are only reachable through the deletion list.
    fn commit_unit(&mut self, unit: UnitId) {
        let (effect, node, alternate) = {
            let unit = &self.units[unit];
            (unit.effect, unit.node, unit.alternate)
        };

        match effect {
            EffectTag::Placement => {
                if let Some(node) = node {
                    if let Some(parent) = self.host_parent(unit) {
                        if let Err(err) = self.host.append_child(parent, node) {
                            log::warn!("append_child failed during placement: {err}");
                        }
                    }
                }
            }
            EffectTag::Update => {
                if let Some(node) = node {
                    let prev = alternate
                        .map(|alt| self.units[alt].props.clone())
                        .unwrap_or_default();
                    let next = self.units[unit].props.clone();
                    props::apply(&mut self.host, node, &prev, &next);
                }
            }
            EffectTag::Deletion | EffectTag::None => {}
        }

        if let Some(child) = self.units[unit].first_child {
            self.commit_unit(child);
        }
        if let Some(sibling) = self.units[unit].next_sibling {
            self.commit_unit(sibling);
        }
    }

    /// Run queued effect callbacks depth-first in tree order. Each pending
    /// effect's previous cleanup runs first; the callback's return value
    /// becomes the cleanup for the next run.
    fn run_effects(&mut self, unit: UnitId) {
        let pending = std::mem::take(&mut self.units[unit].effects);
        for slot in pending {
            let (run, cell) = match &mut self.units[unit].hooks[slot] {
                HookRecord::Effect { run, cleanup, .. } => (run.take(), cleanup.clone()),
                HookRecord::State { .. } => continue,
            };
            let Some(run) = run else {
                continue;
            };
            let previous = cell.borrow_mut().take();
            if let Some(previous) = previous {
                previous();
            }
            let next = run();
            *cell.borrow_mut() = next;
        }

        if let Some(child) = self.units[unit].first_child {
            self.run_effects(child);
        }
        if let Some(sibling) = self.units[unit].next_sibling {
            self.run_effects(sibling);
        }
    }

    /// Promote the finished tree: sever cross-generation links, free the
    /// superseded generation, and swap the roots.
    fn promote(&mut self, root: UnitId) {
        let old_root = self.units[root].alternate;

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let unit = &mut self.units[id];
            unit.alternate = None;
            unit.effect = EffectTag::None;
            if let Some(child) = unit.first_child {
                stack.push(child);
            }
            if let Some(sibling) = unit.next_sibling {
                stack.push(sibling);
            }
        }

        if let Some(old_root) = old_root {
            self.free_tree(old_root);
        }

        self.current_root = Some(root);
        self.wip_root = None;
        log::trace!("pass promoted");
    }
}
