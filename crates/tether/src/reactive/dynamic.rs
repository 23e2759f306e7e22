#![forbid(unsafe_code)]

//! Type-erased capability traits for reactive cells.
//!
//! [`DynCell`] lets heterogeneous cells be stored and observed behind one
//! trait object (`Box<dyn DynCell>`), for example by an inspector that
//! lists every bound field of an entity. [`DynCellMut`] adds the untyped
//! write path, which is only implemented for [`ReactiveCell`], never for
//! [`ReadOnlyCell`].
//!
//! # Coercion policy
//!
//! [`DynCellMut::set_any`] rejects values of the wrong type with
//! [`BindingError::TypeMismatch`] and leaves the cell unchanged. Callers that
//! want the lenient behaviour (store `T::default()` on mismatch) have to ask
//! for it by name with [`ReactiveCell::set_any_or_default`].

use std::any::{Any, type_name};

use tracing::warn;

use super::cell::{ReactiveCell, ReadOnlyCell};
use super::subscription::Subscription;
use crate::error::{BindingError, Result};

/// Read-only, object-safe view of a cell whose value type is erased.
pub trait DynCell {
    /// Clone of the current value, boxed.
    fn get_any(&self) -> Box<dyn Any>;

    /// Name of the concrete value type.
    fn value_type_name(&self) -> &'static str;

    /// Subscribe to changes with the new value as `&dyn Any`.
    fn subscribe_dyn(&self, callback: Box<dyn Fn(&dyn Any)>) -> Subscription;
}

/// Untyped write access to a cell.
pub trait DynCellMut: DynCell {
    /// Downcast `value` to the cell's type and [`set`](ReactiveCell::set) it.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::TypeMismatch`] if `value` is not of the cell's
    /// type. The cell is not modified in that case.
    fn set_any(&self, value: Box<dyn Any>) -> Result<()>;
}

impl<T: Clone + PartialEq + 'static> DynCell for ReactiveCell<T> {
    fn get_any(&self) -> Box<dyn Any> {
        Box::new(self.get())
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn subscribe_dyn(&self, callback: Box<dyn Fn(&dyn Any)>) -> Subscription {
        self.subscribe_any(callback)
    }
}

impl<T: Clone + PartialEq + 'static> DynCellMut for ReactiveCell<T> {
    fn set_any(&self, value: Box<dyn Any>) -> Result<()> {
        let value = value.downcast::<T>().map_err(|_| BindingError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
        self.set(*value);
        Ok(())
    }
}

impl<T: Clone + PartialEq + Default + 'static> ReactiveCell<T> {
    /// Lenient untyped write: on a type mismatch, store `T::default()`
    /// instead of failing.
    ///
    /// The fallback goes through [`set`](Self::set), so listeners fire if
    /// the default differs from the current value. Returns whether `value`
    /// had the right type.
    pub fn set_any_or_default(&self, value: Box<dyn Any>) -> bool {
        match value.downcast::<T>() {
            Ok(value) => {
                self.set(*value);
                true
            }
            Err(_) => {
                warn!(
                    expected = type_name::<T>(),
                    "untyped write with mismatched type, storing default"
                );
                self.set(T::default());
                false
            }
        }
    }
}

impl<T: Clone + PartialEq + 'static> DynCell for ReadOnlyCell<T> {
    fn get_any(&self) -> Box<dyn Any> {
        Box::new(self.get())
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn subscribe_dyn(&self, callback: Box<dyn Fn(&dyn Any)>) -> Subscription {
        self.subscribe_any(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn set_any_with_matching_type() {
        let cell = ReactiveCell::new(1_i32);
        cell.set_any(Box::new(5_i32)).unwrap();
        assert_eq!(cell.get(), 5);
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn set_any_mismatch_fails_loudly() {
        let cell = ReactiveCell::new(1_i32);
        let err = cell.set_any(Box::new("five")).unwrap_err();
        assert_eq!(err, BindingError::TypeMismatch { expected: "i32" });
        assert_eq!(cell.get(), 1);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn set_any_or_default_falls_back() {
        let cell = ReactiveCell::new(7_u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| s.borrow_mut().push(*v));

        assert!(cell.set_any_or_default(Box::new(9_u32)));
        assert!(!cell.set_any_or_default(Box::new(9.5_f64)));
        assert_eq!(cell.get(), 0);
        assert_eq!(*seen.borrow(), vec![9, 0]);
    }

    #[test]
    fn heterogeneous_cells_behind_trait_objects() {
        let count = ReactiveCell::new(3_i64);
        let name = ReactiveCell::new(String::from("hp"));
        let fields: Vec<Box<dyn DynCell>> = vec![
            Box::new(count.read_only()) as Box<dyn DynCell>,
            Box::new(name.clone()),
        ];

        let names: Vec<_> = fields.iter().map(|f| f.value_type_name()).collect();
        assert_eq!(names, vec!["i64", "alloc::string::String"]);

        let value = fields[0].get_any();
        assert_eq!(value.downcast_ref::<i64>(), Some(&3));
    }

    #[test]
    fn subscribe_dyn_receives_erased_value() {
        let cell = ReactiveCell::new(String::new());
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        let erased: &dyn DynCellMut = &cell;
        let _sub = erased.subscribe_dyn(Box::new(move |v: &dyn Any| {
            *s.borrow_mut() = v.downcast_ref::<String>().cloned();
        }));

        erased.set_any(Box::new(String::from("ready"))).unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("ready"));
    }
}
