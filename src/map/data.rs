//! Typed per-element attribute storage

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Name and value type of one attribute
///
/// Keys are usually declared as constants:
///
/// ```
/// use rust_voronoi_map::{DataKey, DataStore};
///
/// const ELEVATION: DataKey<f64> = DataKey::new("elevation");
///
/// let mut data = DataStore::new();
/// data.set(&ELEVATION, 12.5);
/// assert_eq!(data.get(&ELEVATION), Some(&12.5));
/// ```
pub struct DataKey<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> DataKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for DataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DataKey<T> {}

impl<T> fmt::Debug for DataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey({})", self.name)
    }
}

pub(crate) type DataValue = Box<dyn Any + Send + Sync>;

/// Attribute values keyed by [`DataKey`] name
///
/// A value stored under a name is only visible through a key of the same
/// value type; a mismatched key reads as absent.
#[derive(Default)]
pub struct DataStore {
    values: HashMap<&'static str, DataValue>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any>(&self, key: &DataKey<T>) -> Option<&T> {
        self.values.get(key.name)?.downcast_ref::<T>()
    }

    /// Like [`DataStore::get`], for attributes an earlier stage must have set
    ///
    /// # Panics
    ///
    /// Panics if the attribute is missing.
    pub fn require<T: Any>(&self, key: &DataKey<T>) -> &T {
        match self.get(key) {
            Some(value) => value,
            None => panic!("required attribute `{}` is missing", key.name),
        }
    }

    /// Store a value, returning the previous one of the same type
    pub fn set<T: Any + Send + Sync>(&mut self, key: &DataKey<T>, value: T) -> Option<T> {
        self.values
            .insert(key.name, Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn remove<T: Any>(&mut self, key: &DataKey<T>) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        self.values
            .remove(key.name)
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains<T: Any>(&self, key: &DataKey<T>) -> bool {
        self.values.get(key.name).map_or(false, |value| value.is::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().copied().collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEIGHT: DataKey<f64> = DataKey::new("height");
    const HEIGHT_AS_INT: DataKey<i32> = DataKey::new("height");
    const LABEL: DataKey<String> = DataKey::new("label");

    #[test]
    fn test_set_get_remove() {
        let mut data = DataStore::new();
        assert!(data.is_empty());
        assert_eq!(data.set(&HEIGHT, 1.5), None);
        assert_eq!(data.set(&HEIGHT, 2.5), Some(1.5));
        assert_eq!(data.get(&HEIGHT), Some(&2.5));
        assert_eq!(data.remove(&HEIGHT), Some(2.5));
        assert_eq!(data.get(&HEIGHT), None);
    }

    #[test]
    fn test_mismatched_type_reads_as_absent() {
        let mut data = DataStore::new();
        data.set(&HEIGHT, 3.0);
        assert_eq!(data.get(&HEIGHT_AS_INT), None);
        assert!(!data.contains(&HEIGHT_AS_INT));
        // removing through the wrong type keeps the value
        assert_eq!(data.remove(&HEIGHT_AS_INT), None);
        assert_eq!(data.get(&HEIGHT), Some(&3.0));
    }

    #[test]
    fn test_owned_values() {
        let mut data = DataStore::new();
        data.set(&LABEL, "coast".to_string());
        assert_eq!(data.require(&LABEL), "coast");
        assert_eq!(format!("{:?}", data), "{\"label\"}");
    }

    #[test]
    #[should_panic(expected = "`height` is missing")]
    fn test_require_missing_panics() {
        DataStore::new().require(&HEIGHT);
    }
}
