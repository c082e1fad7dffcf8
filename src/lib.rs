//! # cinder
//!
//! Incremental declarative UI rendering engine.
//!
//! cinder turns an immutable tree of element descriptors into mutations on a
//! retained host tree. Rendering is double-buffered: each pass builds a
//! work-in-progress tree of work units diffed positionally against the last
//! committed generation, a cooperative scheduler walks that tree one unit at
//! a time inside whatever time slice the host grants, and a single
//! uninterruptible commit flushes the tagged mutations and promotes the
//! finished tree.
//!
//! ## Architecture
//!
//! ```text
//! build() elements → reconcile (positional diff) → schedule (cooperative,
//!     one unit per step) → commit (deletions, mutations, effects) → host tree
//! ```
//!
//! Components are plain functions with positional hooks: [`Scope::state`]
//! for queued, batched local state and [`Scope::effect`] for commit-time
//! side effects with dependency lists. Everything an engine needs lives in
//! one [`Engine`] value, so independent render roots coexist freely.
//!
//! ## Modules
//!
//! - [`element`] - element descriptors and the build API
//! - [`engine`] - work-unit arena, reconciler, scheduler, commit, hooks
//! - [`host`] - host binding trait, prop diffing, in-memory reference host
//! - [`types`] - prop values, events, effect tags
//!
//! ## Example
//!
//! ```
//! use cinder::{build, Child, Element, Engine, Handler, MemoryHost, Props, Scope};
//!
//! fn counter(scope: &mut Scope, _props: &Props) -> Element {
//!     let (count, set_count) = scope.state(0i64);
//!     let on_click = Handler::new(move |_| set_count.update(|c| c + 1));
//!     build("button", Props::new().on("click", on_click), [Child::from(count)])
//! }
//!
//! let mut engine = Engine::new(MemoryHost::new());
//! let root = engine.host().root();
//! engine.render(Element::component(counter, Props::new()), root);
//! engine.run_until_idle();
//!
//! let button = engine.host().children_of(root)[0];
//! engine.host().dispatch(button, "click");
//! engine.run_until_idle();
//! assert_eq!(engine.host().text_content(root), "1");
//! ```

pub mod element;
pub mod engine;
pub mod host;
pub mod types;

pub use element::{Child, ComponentFn, Element, ElementKind, Props, TEXT_VALUE, build};
pub use engine::{Cleanup, Engine, IntoCleanup, Scope, Setter, UnitId, WorkBudget};
pub use host::{HostError, HostTree, MemoryHost, MemoryNode, MemoryNodeId, Mutation};
pub use types::{EffectTag, Event, Handler, Value};
