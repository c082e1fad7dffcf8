//! Work units - the engine's per-position bookkeeping records.
//!
//! One unit exists per rendered tree position per pass. Units live in a
//! slotmap arena and encode the tree through left-child/right-sibling index
//! links; the alternate link is a plain key into the previous committed
//! generation, never an owning edge, so a freed generation simply makes
//! stale keys resolve to nothing.

use smallvec::SmallVec;

use crate::element::{ElementKind, Props};
use crate::types::EffectTag;

use super::hooks::HookRecord;

slotmap::new_key_type! {
    /// Index handle for a work unit in the arena.
    pub struct UnitId;
}

/// Arena holding every live work unit across both generations.
pub(crate) type UnitArena<N> = slotmap::SlotMap<UnitId, WorkUnit<N>>;

/// Per-position record for one render pass.
///
/// `node` is owned by host/text units only; component units never own a
/// host node. `hooks` and `effects` are populated while the unit's
/// component runs and consumed by the commit engine.
pub(crate) struct WorkUnit<N> {
    pub kind: ElementKind,
    pub props: Props,
    pub node: Option<N>,
    pub parent: Option<UnitId>,
    pub first_child: Option<UnitId>,
    pub next_sibling: Option<UnitId>,
    pub alternate: Option<UnitId>,
    pub effect: EffectTag,
    pub hooks: SmallVec<[HookRecord; 4]>,
    pub effects: SmallVec<[usize; 4]>,
}

impl<N> WorkUnit<N> {
    pub fn new(kind: ElementKind, props: Props) -> Self {
        Self {
            kind,
            props,
            node: None,
            parent: None,
            first_child: None,
            next_sibling: None,
            alternate: None,
            effect: EffectTag::None,
            hooks: SmallVec::new(),
            effects: SmallVec::new(),
        }
    }
}

/// Position + kind equality: the reuse test for host-node identity and hook
/// state. Components compare by function address; there is no key-based
/// identity.
pub(crate) fn same_kind(a: &ElementKind, b: &ElementKind) -> bool {
    match (a, b) {
        (ElementKind::Host(x), ElementKind::Host(y)) => x == y,
        (ElementKind::Text, ElementKind::Text) => true,
        (ElementKind::Component(f), ElementKind::Component(g)) => std::ptr::fn_addr_eq(*f, *g),
        _ => false,
    }
}
