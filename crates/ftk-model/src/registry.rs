//! Id-keyed store that deduplicates values by content.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ModelError, Result};

/// Values that can be deduplicated by an exact content key.
pub trait ContentKeyed: Clone {
    fn content_key(&self) -> String;

    /// Error for a missing id of this value type.
    fn not_found(id: i32) -> ModelError;
}

#[derive(Debug, Clone)]
pub struct DedupStore<T> {
    values: BTreeMap<i32, T>,
    by_content: HashMap<String, i32>,
    last_id: i32,
}

impl<T> Default for DedupStore<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            by_content: HashMap::new(),
            last_id: 0,
        }
    }
}

impl<T: ContentKeyed> DedupStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of an identical value, or the id of a newly stored copy.
    pub fn add_or_get(&mut self, value: T) -> i32 {
        if let Some(id) = self.find(&value) {
            return id;
        }
        let id = self.last_id + 1;
        self.add_with_id(id, value);
        id
    }

    /// Id of a stored value with the same content, if any.
    pub fn find(&self, value: &T) -> Option<i32> {
        self.by_content.get(&value.content_key()).copied()
    }

    /// Installs or overwrites the value at `id`.
    pub fn add_with_id(&mut self, id: i32, value: T) {
        if let Some(old) = self.values.remove(&id) {
            self.unlink(id, &old);
        }
        // the first id stored with this content stays canonical
        self.by_content.entry(value.content_key()).or_insert(id);
        self.values.insert(id, value);
        self.last_id = self.last_id.max(id);
    }

    pub fn remove(&mut self, id: i32) -> Result<T> {
        let value = self.values.remove(&id).ok_or_else(|| T::not_found(id))?;
        self.unlink(id, &value);
        if id == self.last_id {
            self.last_id = self.values.keys().next_back().copied().unwrap_or(0);
        }
        Ok(value)
    }

    fn unlink(&mut self, id: i32, value: &T) {
        let key = value.content_key();
        if self.by_content.get(&key) == Some(&id) {
            self.by_content.remove(&key);
            // another id may still hold the same content
            if let Some((other, _)) = self
                .values
                .iter()
                .find(|(_, v)| v.content_key() == key)
            {
                self.by_content.insert(key, *other);
            }
        }
    }

    pub fn get(&self, id: i32) -> Result<&T> {
        self.values.get(&id).ok_or_else(|| T::not_found(id))
    }

    pub fn contains(&self, id: i32) -> bool {
        self.values.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<i32> {
        self.values.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        self.values.iter().map(|(id, v)| (*id, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_id(&self) -> i32 {
        self.last_id
    }
}
