#![forbid(unsafe_code)]

//! Reactive data bindings.
//!
//! This module provides change-tracking primitives for host code that wants
//! to react to state changes without polling:
//!
//! - [`ReactiveCell`]: a shared, version-tracked value that notifies
//!   listeners when it changes by `PartialEq`.
//! - [`ObservableSequence`]: a shared list that reports inserts, removals,
//!   replacements and clears with their indices and items.
//! - [`ReadOnlyCell`] / [`ReadOnlySequence`]: observation-only handles.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Architecture
//!
//! Both primitives use `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Listeners are stored as `Weak` callbacks and pruned lazily
//! during dispatch. Storage is updated first, the borrow is released, and
//! then listeners run synchronously before the mutating call returns.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per notifying mutation.
//! 2. Listeners within one set are notified in registration order.
//! 3. Setting a cell to a value equal to the current one is a no-op.
//! 4. Silent writes (`set_silently`, `restore`) never notify.
//! 5. Dropping a [`Subscription`] detaches its callback before the next
//!    dispatch starts.

pub mod cell;
pub mod dynamic;
pub mod event;
pub mod sequence;
pub mod subscription;

pub use cell::{ReactiveCell, ReadOnlyCell};
pub use dynamic::{DynCell, DynCellMut};
pub use event::{CollectionAction, CollectionChanged, ItemChange, ItemChangeKind};
pub use sequence::{ObservableSequence, ReadOnlySequence};
pub use subscription::{Subscription, SubscriptionId};
