//! The values bound to each spec item by one invocation.

use crate::codec::Value;
use crate::spec::SpecId;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One bound item.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    /// `None` when the item was not given and has no default.
    pub value: Option<Value>,
}

/// Values in the order the items were resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: IndexMap<SpecId, Entry>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: SpecId, name: &str, value: Option<Value>) {
        self.entries.insert(
            id,
            Entry {
                name: name.to_string(),
                value,
            },
        );
    }

    /// Whether `id` was resolved, even to an absent value.
    pub fn contains(&self, id: SpecId) -> bool {
        self.entries.contains_key(&id)
    }

    /// The value bound to `id`.
    pub fn get(&self, id: SpecId) -> Option<&Value> {
        self.entries.get(&id).and_then(|e| e.value.as_ref())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.entries
            .values()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpecId, &Entry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized as an object keyed by item name; absent values become `null`.
impl Serialize for Values {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in self.entries.values() {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}
