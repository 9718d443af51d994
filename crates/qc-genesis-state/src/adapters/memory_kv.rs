use std::collections::BTreeMap;

use crate::domain::KvStoreError;
use crate::ports::{KeyValueStore, KvIter, KvPair};

/// In-memory ordered implementation of `KeyValueStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryKvStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = KvPair>,
    {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> KvIter<'_> {
        Box::new(
            self.entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), value.clone()))),
        )
    }
}
