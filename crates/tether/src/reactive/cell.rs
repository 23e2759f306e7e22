#![forbid(unsafe_code)]

//! Single-value reactive cell with change notification and version tracking.
//!
//! # Design
//!
//! [`ReactiveCell<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). When the value changes (determined by
//! `PartialEq`), three listener sets are notified, always in this order:
//!
//! 1. untyped listeners ([`ReactiveCell::subscribe_any`]) with `&dyn Any`,
//! 2. typed listeners ([`ReactiveCell::subscribe`]) with `&T`,
//! 3. old/new listeners ([`ReactiveCell::subscribe_change`]) with `(&T, &T)`.
//!
//! # Performance
//!
//! | Operation       | Complexity                        |
//! |-----------------|-----------------------------------|
//! | `get()`         | O(1) + clone                      |
//! | `set()`         | O(S) where S = subscribers        |
//! | `set_silently()`| O(1)                              |
//! | `subscribe*()`  | O(1) amortized                    |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: the storage borrow is released before listeners
//!   run, so a listener may call `set()` on the same cell. A listener that
//!   always writes a new value loops forever; that is the caller's bug.
//! - **Panicking listener**: the panic propagates out of `set()`. The value
//!   is already stored; listeners later in the order are skipped.
//! - **Threads**: handles are `!Send`. Cross-thread sharing does not compile.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::subscription::{ListenerSet, Subscription, SubscriptionId};

type AnyCallback = dyn Fn(&dyn Any);
type ValueCallback<T> = dyn Fn(&T);
type ChangeCallback<T> = dyn Fn(&T, &T);

/// Shared interior for [`ReactiveCell<T>`].
struct CellInner<T> {
    value: T,
    version: u64,
    any_listeners: ListenerSet<AnyCallback>,
    value_listeners: ListenerSet<ValueCallback<T>>,
    change_listeners: ListenerSet<ChangeCallback<T>>,
}

impl<T> CellInner<T> {
    fn subscriber_count(&self) -> usize {
        self.any_listeners.len() + self.value_listeners.len() + self.change_listeners.len()
    }
}

/// A shared, version-tracked value with change notification.
///
/// Cloning a `ReactiveCell` creates a new handle to the **same** state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each notifying mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. `set_silently(v)` never notifies and never bumps `version`.
/// 4. Within each listener set, listeners run in registration order.
pub struct ReactiveCell<T> {
    inner: Rc<RefCell<CellInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ReactiveCell")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscriber_count())
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {}",
            short_type_name::<T>(),
            self.inner.borrow().value
        )
    }
}

/// `type_name` with module paths stripped from every segment, e.g.
/// `Vec<alloc::string::String>` becomes `Vec<String>`.
fn short_type_name<T: ?Sized>() -> String {
    fn push_last_segment(out: &mut String, path: &str) {
        out.push_str(path.rsplit("::").next().unwrap_or(path));
    }

    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut start = 0;
    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';') {
            push_last_segment(&mut out, &full[start..i]);
            out.push(c);
            start = i + c.len_utf8();
        }
    }
    push_last_segment(&mut out, &full[start..]);
    out
}

impl<T: Clone + PartialEq + Default + 'static> Default for ReactiveCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for ReactiveCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveCell<T> {
    /// Create a new cell with the given initial value.
    ///
    /// The initial version is 0 and no subscribers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CellInner {
                value,
                version: 0,
                any_listeners: ListenerSet::default(),
                value_listeners: ListenerSet::default(),
                change_listeners: ListenerSet::default(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Set a new value. If it differs from the current value (by
    /// `PartialEq`), the version is incremented and all live listeners are
    /// notified before this call returns.
    ///
    /// Equality is plain `PartialEq`, so a value that is not equal to
    /// itself (`f64::NAN`) notifies on every `set`, even when unchanged.
    pub fn set(&self, value: T) {
        let old = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.version += 1;
            std::mem::replace(&mut inner.value, value)
        };
        self.notify(old);
    }

    /// Modify the value in place via a closure. If the value changes
    /// (compared against a snapshot taken before `f` runs), this behaves
    /// like a changing [`set`](Self::set).
    ///
    /// # Panics
    ///
    /// Panics if `f` accesses this cell; it runs while storage is borrowed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let old = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value == old {
                return;
            }
            inner.version += 1;
            old
        };
        self.notify(old);
    }

    /// Store `value` unconditionally without notifying anyone.
    ///
    /// Meant for restoring persisted state, where re-running side effects
    /// would be wrong. The version is left unchanged.
    pub fn set_silently(&self, value: T) {
        self.inner.borrow_mut().value = value;
    }

    /// Subscribe to changes with the new value as `&dyn Any`.
    pub fn subscribe_any(&self, callback: impl Fn(&dyn Any) + 'static) -> Subscription {
        let callback: Rc<AnyCallback> = Rc::new(callback);
        self.inner.borrow_mut().any_listeners.register(callback)
    }

    /// Subscribe to changes with the new value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<ValueCallback<T>> = Rc::new(callback);
        self.inner.borrow_mut().value_listeners.register(callback)
    }

    /// Subscribe to changes with `(old, new)`.
    pub fn subscribe_change(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        let callback: Rc<ChangeCallback<T>> = Rc::new(callback);
        self.inner.borrow_mut().change_listeners.register(callback)
    }

    /// Remove a registration right away. Returns `false` if `subscription`
    /// was not registered on this cell; the guard is dropped either way.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.remove_listener(subscription.id())
    }

    fn remove_listener(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.any_listeners.remove(id)
            || inner.value_listeners.remove(id)
            || inner.change_listeners.remove(id)
    }

    /// Current version number. Increments by 1 on each notifying mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered listeners across all three sets (including
    /// dead ones not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscriber_count()
    }

    /// Whether both handles share the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// An observation-only handle to this cell.
    #[must_use]
    pub fn read_only(&self) -> ReadOnlyCell<T> {
        ReadOnlyCell { cell: self.clone() }
    }

    /// Notify live listeners and prune dead ones.
    fn notify(&self, old: T) {
        // Snapshot everything first so no borrow is held during callbacks.
        let (new, version, any, typed, change) = {
            let mut inner = self.inner.borrow_mut();
            (
                inner.value.clone(),
                inner.version,
                inner.any_listeners.snapshot(),
                inner.value_listeners.snapshot(),
                inner.change_listeners.snapshot(),
            )
        };
        trace!(
            version,
            any = any.len(),
            typed = typed.len(),
            change = change.len(),
            "reactive cell changed"
        );

        for cb in &any {
            cb(&new as &dyn Any);
        }
        for cb in &typed {
            cb(&new);
        }
        for cb in &change {
            cb(&old, &new);
        }
    }
}

/// Observation-only handle to a [`ReactiveCell`].
///
/// Exposes reads and subscriptions but no way to change the value.
pub struct ReadOnlyCell<T> {
    cell: ReactiveCell<T>,
}

impl<T> Clone for ReadOnlyCell<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnlyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyCell").field(&self.cell).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadOnlyCell<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    pub fn subscribe_any(&self, callback: impl Fn(&dyn Any) + 'static) -> Subscription {
        self.cell.subscribe_any(callback)
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(callback)
    }

    pub fn subscribe_change(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        self.cell.subscribe_change(callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.cell.unsubscribe(subscription)
    }

    /// Whether this view observes `cell`.
    #[must_use]
    pub fn observes(&self, cell: &ReactiveCell<T>) -> bool {
        self.cell.ptr_eq(cell)
    }
}
