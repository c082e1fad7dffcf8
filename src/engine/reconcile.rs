//! Positional diff of a unit's previous children against a fresh element
//! list.
//!
//! The previous generation's child chain (reached through the alternate
//! link) and the new element list are walked in lock-step by index: matching
//! kinds become updates that reuse the old host node and hook state, fresh
//! elements become placements, and leftover old units are tagged for
//! deletion. Both sides run to exhaustion, the shorter one backfilled with
//! nothing. Diffing is purely positional - there is no key-based move
//! detection, so removing a middle sibling rewrites everything after it.
//!
//! One call handles one tree level; deeper levels are reached when the
//! scheduler descends into each child and calls back in here.

use crate::element::Element;
use crate::types::EffectTag;

use super::unit::{UnitArena, UnitId, WorkUnit, same_kind};

/// Diff `parent`'s previous children against `elements`, linking the new
/// child chain under `parent` and appending unmatched old units to
/// `deletions`.
pub(crate) fn reconcile_children<N: Copy>(
    units: &mut UnitArena<N>,
    deletions: &mut Vec<UnitId>,
    parent: UnitId,
    elements: &[Element],
) {
    let mut old = units[parent]
        .alternate
        .and_then(|alt| units.get(alt))
        .and_then(|alt| alt.first_child);
    let mut prev_sibling: Option<UnitId> = None;
    let mut index = 0;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let matched = match (old, element) {
            (Some(old), Some(element)) => same_kind(&units[old].kind, &element.kind),
            _ => false,
        };

        let created = if matched {
            // Same kind at the same position: update in place, carrying the
            // host node forward and linking the alternate for hook state.
            let old_id = old.expect("matched without an old unit");
            let element = element.expect("matched without an element");
            let (kind, node) = {
                let old_unit = &units[old_id];
                (old_unit.kind.clone(), old_unit.node)
            };
            let mut unit = WorkUnit::new(kind, element.props.clone());
            unit.node = node;
            unit.parent = Some(parent);
            unit.alternate = Some(old_id);
            unit.effect = EffectTag::Update;
            Some(units.insert(unit))
        } else if let Some(element) = element {
            // New element with no usable counterpart: fresh unit, no host
            // node, no hook carryover.
            let mut unit = WorkUnit::new(element.kind.clone(), element.props.clone());
            unit.parent = Some(parent);
            unit.effect = EffectTag::Placement;
            Some(units.insert(unit))
        } else {
            None
        };

        if let Some(old_id) = old {
            if !matched {
                units[old_id].effect = EffectTag::Deletion;
                deletions.push(old_id);
            }
            old = units[old_id].next_sibling;
        }

        if let Some(created) = created {
            if index == 0 {
                units[parent].first_child = Some(created);
            } else if let Some(prev) = prev_sibling {
                units[prev].next_sibling = Some(created);
            }
            prev_sibling = Some(created);
        }

        index += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
