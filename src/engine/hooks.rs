//! Hook store - ordered component-local state and effect records.
//!
//! Hooks are positional: the Nth hook call inside a component reads the Nth
//! record captured on the unit's alternate during the previous pass, so a
//! component must call its hooks in the same order and count on every
//! invocation. Records are snapshotted from the alternate through cheap `Rc`
//! clones - an abandoned pass never disturbs the committed generation's
//! state.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::types::Value;

// =============================================================================
// Shared cells
// =============================================================================

/// Cleanup function returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

/// Queued effect callback, run during the commit effect pass.
pub(crate) type EffectRun = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Queued state action: folds the previous value into the next one.
///
/// Actions are `Fn`, not `FnOnce`: the queue of a superseded pass is
/// re-folded by whichever pass eventually commits.
type Action = Box<dyn Fn(&Rc<dyn Any>) -> Rc<dyn Any>>;

type ActionQueue = Rc<RefCell<Vec<Action>>>;

/// Cleanup slot shared across generations of the same hook position.
type CleanupCell = Rc<RefCell<Option<Cleanup>>>;

/// Invalidation flag shared between an engine and the setters it hands out.
///
/// Setters mark it; the scheduler consumes it when it next looks for work.
#[derive(Clone, Default)]
pub(crate) struct DirtyFlag(Rc<Cell<bool>>);

impl DirtyFlag {
    pub fn mark(&self) {
        self.0.set(true);
    }

    /// Consume the flag, returning whether it was marked.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub fn is_marked(&self) -> bool {
        self.0.get()
    }
}

// =============================================================================
// Hook records
// =============================================================================

/// One slot in a work unit's ordered hook list.
pub(crate) enum HookRecord {
    State {
        /// Value produced for the pass that built this record.
        value: Rc<dyn Any>,
        /// Queue bound to the setters handed out during that pass.
        queue: ActionQueue,
    },
    Effect {
        deps: Vec<Value>,
        cleanup: CleanupCell,
        /// Pending callback, present only when deps changed this pass.
        /// Taken by the commit effect pass.
        run: Option<EffectRun>,
    },
}

/// Read-only view of an alternate's hook record.
pub(crate) enum PrevHook {
    State { value: Rc<dyn Any>, queue: ActionQueue },
    Effect { deps: Vec<Value>, cleanup: CleanupCell },
}

/// Snapshot an alternate's records for the next invocation.
pub(crate) fn snapshot(hooks: &[HookRecord]) -> Vec<PrevHook> {
    hooks
        .iter()
        .map(|record| match record {
            HookRecord::State { value, queue } => PrevHook::State {
                value: value.clone(),
                queue: queue.clone(),
            },
            HookRecord::Effect { deps, cleanup, .. } => PrevHook::Effect {
                deps: deps.clone(),
                cleanup: cleanup.clone(),
            },
        })
        .collect()
}

/// Pairwise identity comparison of dependency lists. A length change counts
/// as a change.
fn deps_equal(prev: &[Value], next: &[Value]) -> bool {
    prev.len() == next.len() && prev.iter().zip(next).all(|(a, b)| a == b)
}

/// The component broke the ordering contract. Loud in debug builds; in
/// release the slot is reinitialized and the mismatch logged.
fn hook_order_violation(detail: &str) {
    if cfg!(debug_assertions) {
        panic!("hook order violation: {detail}");
    }
    log::error!("hook order violation: {detail}");
}

// =============================================================================
// Setter
// =============================================================================

/// Writable half of a state hook.
///
/// A setter never mutates state synchronously: it enqueues an action onto
/// the hook's queue and marks the engine dirty. All actions queued before
/// the next pass are folded in call order when that pass revisits the
/// component.
pub struct Setter<T> {
    queue: ActionQueue,
    dirty: DirtyFlag,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            dirty: self.dirty.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + 'static> Setter<T> {
    /// Queue a replacement value.
    pub fn set(&self, value: T) {
        self.push(Box::new(move |_| Rc::new(value.clone()) as Rc<dyn Any>));
    }

    /// Queue an updater folded over the value the pass computes before it.
    pub fn update(&self, updater: impl Fn(&T) -> T + 'static) {
        self.push(Box::new(move |prev| match prev.downcast_ref::<T>() {
            Some(prev) => Rc::new(updater(prev)) as Rc<dyn Any>,
            None => {
                hook_order_violation("queued update saw a different state type");
                prev.clone()
            }
        }));
    }

    fn push(&self, action: Action) {
        self.queue.borrow_mut().push(action);
        self.dirty.mark();
    }
}

// =============================================================================
// Effect cleanup conversion
// =============================================================================

/// Accepted return values of an effect callback: `()` for effects with
/// nothing to tear down, a closure (or boxed closure) otherwise.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

impl<F: FnOnce() + 'static> IntoCleanup for F {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(Box::new(self))
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Hook cursor bound to the component currently being invoked.
///
/// Handed to a component for exactly the duration of its call; the records
/// it accumulates become the unit's hook list for this pass.
pub struct Scope {
    prev: Vec<PrevHook>,
    hooks: SmallVec<[HookRecord; 4]>,
    effects: SmallVec<[usize; 4]>,
    cursor: usize,
    dirty: DirtyFlag,
}

impl Scope {
    pub(crate) fn new(prev: Vec<PrevHook>, dirty: DirtyFlag) -> Self {
        Self {
            prev,
            hooks: SmallVec::new(),
            effects: SmallVec::new(),
            cursor: 0,
            dirty,
        }
    }

    /// State hook: the value for this pass and a setter that queues updates
    /// for the next one.
    ///
    /// The previous generation's queue is folded over its value in FIFO
    /// order to produce the returned value. The queue is read, not cleared,
    /// and this pass's record gets a fresh queue: a pass that is later
    /// abandoned re-folds the same actions, losing nothing.
    pub fn state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        let slot = self.cursor;
        self.cursor += 1;

        let mut value: Rc<dyn Any> = match self.prev.get(slot) {
            Some(PrevHook::State { value, queue }) => {
                let mut folded = value.clone();
                for action in queue.borrow().iter() {
                    folded = action(&folded);
                }
                folded
            }
            Some(PrevHook::Effect { .. }) => {
                hook_order_violation("state() called where effect() was recorded");
                Rc::new(initial.clone())
            }
            None => Rc::new(initial.clone()),
        };

        let current = match value.downcast_ref::<T>().cloned() {
            Some(current) => current,
            None => {
                hook_order_violation("state type changed between passes");
                value = Rc::new(initial.clone());
                initial
            }
        };

        let queue: ActionQueue = Rc::default();
        self.hooks.push(HookRecord::State {
            value,
            queue: queue.clone(),
        });
        (
            current,
            Setter {
                queue,
                dirty: self.dirty.clone(),
                _marker: PhantomData,
            },
        )
    }

    /// Effect hook: queues `callback` for the commit effect pass when `deps`
    /// differ pairwise from the previous pass's list (a first render always
    /// runs). The previous cleanup runs right before the callback; the
    /// callback's return value becomes the next cleanup.
    pub fn effect<C: IntoCleanup>(&mut self, deps: Vec<Value>, callback: impl FnOnce() -> C + 'static) {
        let slot = self.cursor;
        self.cursor += 1;

        let prev = match self.prev.get(slot) {
            Some(PrevHook::Effect { deps, cleanup }) => Some((deps, cleanup.clone())),
            Some(PrevHook::State { .. }) => {
                hook_order_violation("effect() called where state() was recorded");
                None
            }
            None => None,
        };

        let changed = match &prev {
            Some((prev_deps, _)) => !deps_equal(prev_deps, &deps),
            None => true,
        };
        let cleanup = prev.map(|(_, cell)| cell).unwrap_or_default();

        let run: Option<EffectRun> = if changed {
            self.effects.push(slot);
            Some(Box::new(move || callback().into_cleanup()))
        } else {
            None
        };
        self.hooks.push(HookRecord::Effect { deps, cleanup, run });
    }

    pub(crate) fn finish(self) -> (SmallVec<[HookRecord; 4]>, SmallVec<[usize; 4]>) {
        (self.hooks, self.effects)
    }
}

// =============================================================================
// Tests
// =============================================================================
