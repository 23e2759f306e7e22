#![forbid(unsafe_code)]

//! Serde boundary for saving and loading reactive state.
//!
//! A [`ReactiveCell<T>`] serializes as its bare value and an
//! [`ObservableSequence<T>`] as a plain sequence, so saved data carries no
//! trace of the reactive wrapper. Deserializing produces a fresh handle with
//! no listeners, which is a silent load by construction.
//!
//! To load into a handle that already has listeners, deserialize the raw
//! value and hand it to [`ReactiveCell::set_silently`] or
//! [`ObservableSequence::restore`]:
//!
//! ```ignore
//! let saved: Vec<Item> = serde_json::from_str(&json)?;
//! inventory.restore(saved);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::reactive::{ObservableSequence, ReactiveCell, ReadOnlyCell, ReadOnlySequence};

impl<T> Serialize for ReactiveCell<T>
where
    T: Serialize + Clone + PartialEq + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with(|value| value.serialize(serializer))
    }
}

impl<'de, T> Deserialize<'de> for ReactiveCell<T>
where
    T: Deserialize<'de> + Clone + PartialEq + 'static,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

impl<T> Serialize for ReadOnlyCell<T>
where
    T: Serialize + Clone + PartialEq + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with(|value| value.serialize(serializer))
    }
}

impl<T> Serialize for ObservableSequence<T>
where
    T: Serialize + Clone + PartialEq + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with(|items| items.serialize(serializer))
    }
}

impl<'de, T> Deserialize<'de> for ObservableSequence<T>
where
    T: Deserialize<'de> + Clone + PartialEq + 'static,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_vec)
    }
}

impl<T> Serialize for ReadOnlySequence<T>
where
    T: Serialize + Clone + PartialEq + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with(|items| items.serialize(serializer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Serialize, Deserialize)]
    struct PlayerState {
        health: ReactiveCell<u32>,
        name: ReactiveCell<Option<String>>,
        inventory: ObservableSequence<String>,
    }

    #[test]
    fn cell_serializes_as_bare_value() {
        let cell = ReactiveCell::new(12_u32);
        assert_eq!(serde_json::to_string(&cell).unwrap(), "12");
        assert_eq!(serde_json::to_string(&cell.read_only()).unwrap(), "12");
    }

    #[test]
    fn sequence_serializes_as_array() {
        let seq = ObservableSequence::from_vec(vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&seq).unwrap(), "[1,2,3]");
        assert_eq!(serde_json::to_string(&seq.read_only()).unwrap(), "[1,2,3]");
    }

    #[test]
    fn struct_round_trip_starts_pristine() {
        let state = PlayerState {
            health: ReactiveCell::new(80),
            name: ReactiveCell::new(None),
            inventory: ObservableSequence::from_vec(vec!["sword".into()]),
        };
        state.health.set(75);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"health":75,"name":null,"inventory":["sword"]}"#
        );

        let loaded: PlayerState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.health.get(), 75);
        assert_eq!(loaded.health.version(), 0);
        assert_eq!(loaded.name.get(), None);
        assert_eq!(loaded.inventory.to_vec(), vec!["sword".to_string()]);
        assert_eq!(loaded.inventory.subscriber_count(), 0);
    }

    #[test]
    fn load_into_live_handles_is_silent() {
        let health = ReactiveCell::new(10_u32);
        let inventory = ObservableSequence::<String>::new();
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let _a = health.subscribe(move |_| h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        let _b = inventory.subscribe(move |_| h.set(h.get() + 1));

        health.set_silently(serde_json::from_str("99").unwrap());
        inventory.restore(serde_json::from_str(r#"["a","b"]"#).unwrap());

        assert_eq!(health.get(), 99);
        assert_eq!(inventory.len(), 2);
        assert_eq!(hits.get(), 0);
    }
}
