//! # Outbound Ports (Driven Ports)
//!
//! Storage backend required by `StateDb`.

use crate::domain::KvStoreError;

/// One key/value pair as yielded by store iteration.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Fallible, key-ordered iterator over a store.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<KvPair, KvStoreError>> + 'a>;

/// Abstract interface for key-value database operations.
///
/// Testing and genesis construction: `InMemoryKvStore`.
///
/// ## Ordering Guarantee
///
/// `iter` yields pairs in strictly increasing byte order of their keys.
/// Exported State sections depend on this for determinism.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError>;

    /// Put a single key-value pair, replacing any previous value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError>;

    /// Number of stored pairs.
    fn len(&self) -> usize;

    /// True when the store holds no pairs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all pairs in key order.
    ///
    /// A read failure surfaces as an `Err` item; callers must stop there.
    fn iter(&self) -> KvIter<'_>;
}
