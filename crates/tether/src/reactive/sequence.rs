#![forbid(unsafe_code)]

//! Observable, index-addressable sequence.
//!
//! # Design
//!
//! [`ObservableSequence<T>`] keeps a `Vec<T>` in shared storage
//! (`Rc<RefCell<..>>`) and reports every content change on two channels,
//! generic first and typed second:
//!
//! ```text
//! insert(1, w) on [x, y, z]
//!   storage  -> [x, w, y, z]           (borrow released)
//!   generic  -> CollectionChanged { Add, index: 1, new_item: w }
//!   typed    -> ItemChange { Add, index: 1, value: w }
//! ```
//!
//! Bulk appends (`extend`) emit one event pair per item. `clear` emits a
//! single Reset/Clear pair regardless of length. `restore` replaces storage
//! without emitting anything.
//!
//! # Invariants
//!
//! 1. Positions are contiguous and 0-based.
//! 2. Each event describes storage as it is when dispatch starts.
//! 3. Remove events carry the pre-removal index; Replace events carry the
//!    element captured before the overwrite.
//! 4. `version` increments by exactly 1 per notifying mutation.
//!
//! # Failure Modes
//!
//! - **Out-of-range index**: reported as [`BindingError::IndexOutOfRange`],
//!   never clamped. Storage and listeners are untouched.
//! - **Re-entrant mutation**: listeners may mutate the sequence. Later
//!   listeners of the outer dispatch then see an event that is already
//!   stale; ordering across nested dispatches is the caller's concern.
//! - **Predicates**: `find_index` and `remove_all` call their predicate
//!   while storage is borrowed; a predicate may read the sequence but must
//!   not mutate it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::event::{CollectionChanged, ItemChange, ItemChangeKind};
use super::subscription::{ListenerSet, Subscription, SubscriptionId};
use crate::error::{BindingError, Result};

type CollectionCallback = dyn Fn(&CollectionChanged<'_>);
type ItemCallback<T> = dyn Fn(&ItemChange<'_, T>);

/// A change that has already been applied to storage, awaiting dispatch.
enum Applied<'a, T> {
    Add { index: usize, item: &'a T },
    Remove { index: usize, item: &'a T },
    Replace { index: usize, old: &'a T, new: &'a T },
    Clear,
}

struct SequenceInner<T> {
    items: Vec<T>,
    version: u64,
    collection_listeners: ListenerSet<CollectionCallback>,
    item_listeners: ListenerSet<ItemCallback<T>>,
}

/// A shared, observable list.
///
/// Cloning a handle shares storage and listeners.
pub struct ObservableSequence<T> {
    inner: Rc<RefCell<SequenceInner<T>>>,
}

impl<T> Clone for ObservableSequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableSequence")
            .field("items", &inner.items)
            .field("version", &inner.version)
            .field(
                "subscriber_count",
                &(inner.collection_listeners.len() + inner.item_listeners.len()),
            )
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for ObservableSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> From<Vec<T>> for ObservableSequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + PartialEq + 'static> FromIterator<T> for ObservableSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + PartialEq + 'static> ObservableSequence<T> {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a sequence holding `items`. No events are emitted.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SequenceInner {
                items,
                version: 0,
                collection_listeners: ListenerSet::default(),
                item_listeners: ListenerSet::default(),
            })),
        }
    }

    // -- Reads --------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Clone of the element at `index`.
    ///
    /// # Errors
    ///
    /// [`BindingError::IndexOutOfRange`] unless `index < len`.
    pub fn get(&self, index: usize) -> Result<T> {
        let inner = self.inner.borrow();
        inner
            .items
            .get(index)
            .cloned()
            .ok_or(BindingError::IndexOutOfRange {
                index,
                len: inner.items.len(),
            })
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.inner.borrow().items.contains(item)
    }

    /// Position of the first element equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.inner.borrow().items.iter().position(|x| x == item)
    }

    /// Position of the first element satisfying `predicate`.
    pub fn find_index(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.inner.borrow().items.iter().position(predicate)
    }

    /// Borrow the elements as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this sequence.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().items)
    }

    /// Clone of the backing storage, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.borrow().items.clone()
    }

    /// Iterate over a snapshot taken now. Later mutations do not affect it.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    /// Increments by 1 on each notifying mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered listeners on both channels, including dead ones not yet
    /// pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.collection_listeners.len() + inner.item_listeners.len()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// An observation-only handle to this sequence.
    #[must_use]
    pub fn read_only(&self) -> ReadOnlySequence<T> {
        ReadOnlySequence { seq: self.clone() }
    }

    // -- Mutations ----------------------------------------------------------

    /// Insert `item` at `index`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// [`BindingError::IndexOutOfRange`] unless `index <= len`.
    pub fn insert(&self, index: usize, item: T) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let len = inner.items.len();
            if index > len {
                return Err(BindingError::IndexOutOfRange { index, len });
            }
            inner.items.insert(index, item.clone());
            inner.version += 1;
        }
        self.dispatch(Applied::Add { index, item: &item });
        Ok(())
    }

    /// Append `item`.
    pub fn push(&self, item: T) {
        let index = {
            let mut inner = self.inner.borrow_mut();
            inner.items.push(item.clone());
            inner.version += 1;
            inner.items.len() - 1
        };
        self.dispatch(Applied::Add { index, item: &item });
    }

    /// Append each item in order, one Add event per item.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.push(item);
        }
    }

    /// Overwrite the element at `index` and return the previous one.
    ///
    /// A Replace event is emitted even when the new element equals the old.
    ///
    /// # Errors
    ///
    /// [`BindingError::IndexOutOfRange`] unless `index < len`.
    pub fn set(&self, index: usize, item: T) -> Result<T> {
        let old = {
            let mut inner = self.inner.borrow_mut();
            let len = inner.items.len();
            let slot = inner
                .items
                .get_mut(index)
                .ok_or(BindingError::IndexOutOfRange { index, len })?;
            let old = std::mem::replace(slot, item.clone());
            inner.version += 1;
            old
        };
        self.dispatch(Applied::Replace {
            index,
            old: &old,
            new: &item,
        });
        Ok(old)
    }

    /// Remove and return the element at `index`, shifting later elements
    /// left.
    ///
    /// # Errors
    ///
    /// [`BindingError::IndexOutOfRange`] unless `index < len`.
    pub fn remove_at(&self, index: usize) -> Result<T> {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let len = inner.items.len();
            if index >= len {
                return Err(BindingError::IndexOutOfRange { index, len });
            }
            inner.version += 1;
            inner.items.remove(index)
        };
        self.dispatch(Applied::Remove {
            index,
            item: &removed,
        });
        Ok(removed)
    }

    /// Remove the first element equal to `item`. Returns `false`, without
    /// emitting anything, if there is none.
    pub fn remove(&self, item: &T) -> bool {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    /// Remove every element satisfying `predicate`, walking from the last
    /// position to the first. Each removal emits its own Remove event with
    /// the index valid at that moment. Returns the number removed.
    pub fn remove_all(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        let mut index = self.len();
        while index > 0 {
            index -= 1;
            // A listener may have shrunk the sequence; `get` then misses.
            let hit = self
                .inner
                .borrow()
                .items
                .get(index)
                .is_some_and(|item| predicate(item));
            if hit && self.remove_at(index).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every element. Emits a single Reset/Clear pair, even when the
    /// sequence was already empty.
    pub fn clear(&self) {
        let cleared = {
            let mut inner = self.inner.borrow_mut();
            inner.version += 1;
            std::mem::take(&mut inner.items)
        };
        debug!(cleared = cleared.len(), "observable sequence cleared");
        drop(cleared);
        self.dispatch(Applied::Clear);
    }

    /// Replace the backing storage wholesale without emitting events or
    /// bumping the version. Meant for loading persisted state.
    pub fn restore(&self, items: Vec<T>) {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            std::mem::replace(&mut inner.items, items)
        };
        debug!(
            previous = previous.len(),
            restored = self.len(),
            "observable sequence restored"
        );
    }

    // -- Subscriptions ------------------------------------------------------

    /// Subscribe to generic structural events.
    pub fn subscribe_collection(
        &self,
        callback: impl Fn(&CollectionChanged<'_>) + 'static,
    ) -> Subscription {
        let callback: Rc<CollectionCallback> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .collection_listeners
            .register(callback)
    }

    /// Subscribe to typed item events.
    pub fn subscribe(&self, callback: impl Fn(&ItemChange<'_, T>) + 'static) -> Subscription {
        let callback: Rc<ItemCallback<T>> = Rc::new(callback);
        self.inner.borrow_mut().item_listeners.register(callback)
    }

    /// Remove a registration right away. Returns `false` if it did not
    /// belong to this sequence.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.remove_listener(subscription.id())
    }

    fn remove_listener(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.collection_listeners.remove(id) || inner.item_listeners.remove(id)
    }

    fn dispatch(&self, applied: Applied<'_, T>) {
        let (version, generic, typed) = {
            let mut inner = self.inner.borrow_mut();
            (
                inner.version,
                inner.collection_listeners.snapshot(),
                inner.item_listeners.snapshot(),
            )
        };

        let (generic_event, typed_event) = match applied {
            Applied::Add { index, item } => (
                CollectionChanged::add(index, item),
                ItemChange::new(ItemChangeKind::Add, index, item),
            ),
            Applied::Remove { index, item } => (
                CollectionChanged::remove(index, item),
                ItemChange::new(ItemChangeKind::Remove, index, item),
            ),
            Applied::Replace { index, old, new } => (
                CollectionChanged::replace(index, old, new),
                ItemChange::new(ItemChangeKind::Change, index, new),
            ),
            Applied::Clear => (CollectionChanged::reset(), ItemChange::clear()),
        };
        trace!(
            version,
            action = ?generic_event.action,
            index = ?generic_event.index,
            generic = generic.len(),
            typed = typed.len(),
            "observable sequence changed"
        );

        for cb in &generic {
            cb(&generic_event);
        }
        for cb in &typed {
            cb(&typed_event);
        }
    }
}

/// Observation-only handle to an [`ObservableSequence`].
pub struct ReadOnlySequence<T> {
    seq: ObservableSequence<T>,
}

impl<T> Clone for ReadOnlySequence<T> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnlySequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlySequence").field(&self.seq).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadOnlySequence<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// # Errors
    ///
    /// [`BindingError::IndexOutOfRange`] unless `index < len`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.seq.get(index)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.seq.contains(item)
    }

    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.seq.index_of(item)
    }

    pub fn find_index(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.seq.find_index(predicate)
    }

    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.seq.with(f)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.seq.to_vec()
    }

    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.seq.iter()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.seq.version()
    }

    pub fn subscribe_collection(
        &self,
        callback: impl Fn(&CollectionChanged<'_>) + 'static,
    ) -> Subscription {
        self.seq.subscribe_collection(callback)
    }

    pub fn subscribe(&self, callback: impl Fn(&ItemChange<'_, T>) + 'static) -> Subscription {
        self.seq.subscribe(callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.seq.unsubscribe(subscription)
    }

    /// Whether this view observes `seq`.
    #[must_use]
    pub fn observes(&self, seq: &ObservableSequence<T>) -> bool {
        self.seq.ptr_eq(seq)
    }
}
