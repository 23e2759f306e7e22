#![forbid(unsafe_code)]

//! Reactive cells and observable sequences.
//!
//! # Role
//! `tether` gives host code two passive data holders with attached change
//! notification: [`ReactiveCell`] for a single value and
//! [`ObservableSequence`] for an ordered list. UI bindings and game logic
//! subscribe to them instead of polling.
//!
//! # Threading
//! Every handle is `!Send` and `!Sync`. All dispatch happens synchronously
//! on the thread that performs the mutation; there is no batching or
//! deferral.
//!
//! # Features
//! - `state-persistence`: serde `Serialize`/`Deserialize` for cells and
//!   sequences (see the `persistence` module).

pub mod error;
#[cfg(feature = "state-persistence")]
pub mod persistence;
pub mod reactive;

pub use error::{BindingError, Result};
pub use reactive::{
    CollectionAction, CollectionChanged, DynCell, DynCellMut, ItemChange, ItemChangeKind,
    ObservableSequence, ReactiveCell, ReadOnlyCell, ReadOnlySequence, Subscription,
    SubscriptionId,
};
