#![forbid(unsafe_code)]

//! Listener registry and RAII subscription guards.
//!
//! # Design
//!
//! A [`ListenerSet`] stores callbacks as `Weak` references. The matching
//! strong `Rc` lives inside the [`Subscription`] handed back to the caller,
//! so the primitive never keeps a listener alive on its own: dropping the
//! guard is enough to detach it, and an explicit `unsubscribe` on the owning
//! primitive removes the entry eagerly.
//!
//! Dispatch goes through [`ListenerSet::snapshot`], which prunes dead entries
//! and returns strong clones of the live callbacks. Callers release their
//! `RefCell` borrow before invoking the snapshot, which makes registering or
//! removing listeners from inside a callback safe.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, useful for logging.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Ordered set of weakly-held callbacks of one shape `F`.
pub(crate) struct ListenerSet<F: ?Sized> {
    entries: Vec<(SubscriptionId, Weak<F>)>,
}

impl<F: ?Sized> Default for ListenerSet<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

// Bookkeeping that never hands out `Rc<F>`, so it needs no `'static` bound.
impl<F: ?Sized> ListenerSet<F> {
    /// Remove the entry with `id`. Returns whether it was present.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Number of entries, including dead ones not yet pruned.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<F: ?Sized + 'static> ListenerSet<F> {
    /// Register a callback. The returned guard owns the only strong
    /// reference.
    pub(crate) fn register(&mut self, callback: Rc<F>) -> Subscription {
        let id = SubscriptionId::next();
        self.entries.push((id, Rc::downgrade(&callback)));
        Subscription {
            id,
            _guard: Box::new(callback),
        }
    }

    /// Prune dead entries and collect the live callbacks in registration
    /// order.
    pub(crate) fn snapshot(&mut self) -> Vec<Rc<F>> {
        self.entries.retain(|(_, weak)| weak.strong_count() > 0);
        self.entries
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }
}

/// RAII guard for a registered listener.
///
/// Dropping the guard releases the callback; it will not run on any
/// dispatch that starts afterwards. Pass it to the owning primitive's
/// `unsubscribe` to also drop the registry entry right away.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: SubscriptionId,
    /// Type-erased strong `Rc` keeping the callback alive.
    _guard: Box<dyn Any>,
}

impl Subscription {
    /// Identifier of this registration.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Callback = dyn Fn(&i32);

    fn register(set: &mut ListenerSet<Callback>, f: impl Fn(&i32) + 'static) -> Subscription {
        set.register(Rc::new(f))
    }

    #[test]
    fn snapshot_is_registration_order() {
        let mut set = ListenerSet::<Callback>::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _a = register(&mut set, move |v| l1.borrow_mut().push(('a', *v)));
        let l2 = Rc::clone(&log);
        let _b = register(&mut set, move |v| l2.borrow_mut().push(('b', *v)));

        for cb in set.snapshot() {
            cb(&7);
        }
        assert_eq!(*log.borrow(), vec![('a', 7), ('b', 7)]);
    }

    #[test]
    fn dropped_guard_is_pruned() {
        let mut set = ListenerSet::<Callback>::default();
        let a = register(&mut set, |_| {});
        let _b = register(&mut set, |_| {});
        assert_eq!(set.len(), 2);

        drop(a);
        assert_eq!(set.len(), 2);
        assert_eq!(set.snapshot().len(), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_by_id() {
        let mut set = ListenerSet::<Callback>::default();
        let a = register(&mut set, |_| {});
        let id = a.id();
        assert!(set.remove(id));
        assert!(!set.remove(id));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let mut set = ListenerSet::<Callback>::default();
        let a = register(&mut set, |_| {});
        let b = register(&mut set, |_| {});
        assert_ne!(a.id(), b.id());
        assert!(a.id().get() < b.id().get());
    }

    #[test]
    fn snapshot_keeps_callback_alive_after_drop() {
        let mut set = ListenerSet::<Callback>::default();
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        let sub = register(&mut set, move |_| *h.borrow_mut() += 1);

        let snapshot = set.snapshot();
        drop(sub);
        for cb in &snapshot {
            cb(&0);
        }
        assert_eq!(*hits.borrow(), 1);
        drop(snapshot);
        assert!(set.snapshot().is_empty());
    }

    #[test]
    fn debug_format() {
        let mut set = ListenerSet::<Callback>::default();
        let sub = register(&mut set, |_| {});
        let dbg = format!("{sub:?}");
        assert!(dbg.contains("Subscription"));
        assert!(dbg.contains("id"));
    }
}
