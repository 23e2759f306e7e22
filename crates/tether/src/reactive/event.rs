#![forbid(unsafe_code)]

//! Event shapes emitted by [`ObservableSequence`](super::ObservableSequence).
//!
//! Every content change is reported on two channels, in this order:
//!
//! 1. [`CollectionChanged`]: a generic structural event whose items are
//!    type-erased (`&dyn Any`). Suited to listeners that only care about
//!    *what kind* of change happened and where, such as a UI list adapter.
//! 2. [`ItemChange`]: a typed event carrying the concrete element.

use std::any::Any;
use std::fmt;

/// Action of a generic structural event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionAction {
    Add,
    Remove,
    Replace,
    /// Everything changed; do not attempt an incremental diff.
    Reset,
}

/// Generic structural change notification.
///
/// | action    | `index`     | `new_item` | `old_item` |
/// |-----------|-------------|------------|------------|
/// | `Add`     | insert pos  | added      | `None`     |
/// | `Remove`  | pre-removal | `None`     | removed    |
/// | `Replace` | slot        | new        | previous   |
/// | `Reset`   | `None`      | `None`     | `None`     |
#[derive(Clone, Copy)]
pub struct CollectionChanged<'a> {
    pub action: CollectionAction,
    pub index: Option<usize>,
    pub new_item: Option<&'a dyn Any>,
    pub old_item: Option<&'a dyn Any>,
}

impl<'a> CollectionChanged<'a> {
    pub(crate) fn add(index: usize, item: &'a dyn Any) -> Self {
        Self {
            action: CollectionAction::Add,
            index: Some(index),
            new_item: Some(item),
            old_item: None,
        }
    }

    pub(crate) fn remove(index: usize, item: &'a dyn Any) -> Self {
        Self {
            action: CollectionAction::Remove,
            index: Some(index),
            new_item: None,
            old_item: Some(item),
        }
    }

    pub(crate) fn replace(index: usize, old: &'a dyn Any, new: &'a dyn Any) -> Self {
        Self {
            action: CollectionAction::Replace,
            index: Some(index),
            new_item: Some(new),
            old_item: Some(old),
        }
    }

    pub(crate) fn reset() -> Self {
        Self {
            action: CollectionAction::Reset,
            index: None,
            new_item: None,
            old_item: None,
        }
    }

    /// Downcast the new item, if present and of type `T`.
    #[must_use]
    pub fn new_item_as<T: 'static>(&self) -> Option<&'a T> {
        self.new_item.and_then(|item| item.downcast_ref())
    }

    /// Downcast the old item, if present and of type `T`.
    #[must_use]
    pub fn old_item_as<T: 'static>(&self) -> Option<&'a T> {
        self.old_item.and_then(|item| item.downcast_ref())
    }
}

impl fmt::Debug for CollectionChanged<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionChanged")
            .field("action", &self.action)
            .field("index", &self.index)
            .field("has_new_item", &self.new_item.is_some())
            .field("has_old_item", &self.old_item.is_some())
            .finish()
    }
}

/// Kind of a typed item change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemChangeKind {
    /// An element was overwritten in place.
    Change,
    Add,
    Remove,
    Clear,
}

impl ItemChangeKind {
    /// The generic action this kind corresponds to.
    #[must_use]
    pub const fn action(self) -> CollectionAction {
        match self {
            Self::Change => CollectionAction::Replace,
            Self::Add => CollectionAction::Add,
            Self::Remove => CollectionAction::Remove,
            Self::Clear => CollectionAction::Reset,
        }
    }
}

/// Typed change notification.
///
/// `value` is the new element for `Change`/`Add`, the removed element for
/// `Remove`, and `None` for `Clear`. `index` is `None` only for `Clear`.
#[derive(Debug, PartialEq, Eq)]
pub struct ItemChange<'a, T> {
    pub kind: ItemChangeKind,
    pub index: Option<usize>,
    pub value: Option<&'a T>,
}

// Manual impls: a derive would require `T: Clone`.
impl<T> Clone for ItemChange<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ItemChange<'_, T> {}

impl<'a, T> ItemChange<'a, T> {
    pub(crate) fn new(kind: ItemChangeKind, index: usize, value: &'a T) -> Self {
        Self {
            kind,
            index: Some(index),
            value: Some(value),
        }
    }

    pub(crate) fn clear() -> Self {
        Self {
            kind: ItemChangeKind::Clear,
            index: None,
            value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_items() {
        let old = 1_i32;
        let new = 2_i32;
        let ev = CollectionChanged::replace(3, &old, &new);
        assert_eq!(ev.action, CollectionAction::Replace);
        assert_eq!(ev.index, Some(3));
        assert_eq!(ev.old_item_as::<i32>(), Some(&1));
        assert_eq!(ev.new_item_as::<i32>(), Some(&2));
        assert_eq!(ev.new_item_as::<String>(), None);
    }

    #[test]
    fn reset_has_no_payload() {
        let ev = CollectionChanged::reset();
        assert_eq!(ev.index, None);
        assert!(ev.new_item.is_none());
        assert!(ev.old_item.is_none());
    }

    #[test]
    fn kind_maps_to_action() {
        assert_eq!(ItemChangeKind::Change.action(), CollectionAction::Replace);
        assert_eq!(ItemChangeKind::Add.action(), CollectionAction::Add);
        assert_eq!(ItemChangeKind::Remove.action(), CollectionAction::Remove);
        assert_eq!(ItemChangeKind::Clear.action(), CollectionAction::Reset);
    }

    #[test]
    fn debug_hides_payload() {
        let item = "x";
        let dbg = format!("{:?}", CollectionChanged::add(0, &item));
        assert!(dbg.contains("Add"));
        assert!(dbg.contains("has_new_item: true"));
    }
}
