use qc_genesis_state::{KvIter, KvPair, KvStoreError};

use super::cancel::CancelToken;
use super::writer::{ActiveSection, SectionSink};
use crate::error::{GenesisStoreError, Result};

/// Ordered walk over a key/value store for the State section.
///
/// Rejects keys that do not strictly increase and stops for good after the
/// first error.
pub struct KvDump<'a> {
    inner: KvIter<'a>,
    last_key: Option<Vec<u8>>,
    entries: u64,
    done: bool,
}

impl<'a> KvDump<'a> {
    pub fn new(inner: KvIter<'a>) -> Self {
        Self {
            inner,
            last_key: None,
            entries: 0,
            done: false,
        }
    }

    /// Entries yielded so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Stream every pair into `section` as key/value records.
    ///
    /// A read failure or cancellation poisons the section so it can never be
    /// flushed with partial state.
    pub fn write_into<W: SectionSink>(
        mut self,
        section: &mut ActiveSection<'_, W>,
        cancel: &CancelToken,
    ) -> Result<u64> {
        while let Some(item) = self.next() {
            if let Err(err) = cancel.check() {
                section.poison(err.to_string());
                return Err(err);
            }
            match item {
                Ok((key, value)) => section.write_kv(&key, &value)?,
                Err(source) => {
                    let err = GenesisStoreError::Iteration {
                        entries: self.entries,
                        source,
                    };
                    section.poison(err.to_string());
                    return Err(err);
                }
            }
        }
        Ok(self.entries)
    }
}

impl Iterator for KvDump<'_> {
    type Item = std::result::Result<KvPair, KvStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            None => {
                self.done = true;
                None
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(err))
            }
            Some(Ok((key, value))) => {
                if let Some(last) = &self.last_key {
                    if key <= *last {
                        self.done = true;
                        return Some(Err(KvStoreError::Corruption {
                            message: format!(
                                "key {} does not follow {}",
                                hex::encode(&key),
                                hex::encode(last)
                            ),
                        }));
                    }
                }
                self.last_key = Some(key.clone());
                self.entries += 1;
                Some(Ok((key, value)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::writer::SectionWriter;
    use shared_types::{GenesisHeader, SectionDescriptor};

    fn header() -> GenesisHeader {
        GenesisHeader {
            genesis_id: [3u8; 32],
            network_id: 4003,
            network_name: "quantum-testnet".to_string(),
        }
    }

    fn iter_of(items: Vec<std::result::Result<KvPair, KvStoreError>>) -> KvIter<'static> {
        Box::new(items.into_iter())
    }

    fn pair(k: &[u8], v: &[u8]) -> std::result::Result<KvPair, KvStoreError> {
        Ok((k.to_vec(), v.to_vec()))
    }

    #[test]
    fn test_counts_ordered_entries() {
        let dump = KvDump::new(iter_of(vec![pair(b"a", b"1"), pair(b"b", b"2")]));
        let items: Vec<_> = dump.collect();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.is_ok()));
    }

    #[test]
    fn test_rejects_unordered_keys_and_fuses() {
        let mut dump = KvDump::new(iter_of(vec![
            pair(b"b", b"1"),
            pair(b"a", b"2"),
            pair(b"c", b"3"),
        ]));
        assert!(dump.next().unwrap().is_ok());
        assert!(matches!(
            dump.next(),
            Some(Err(KvStoreError::Corruption { .. }))
        ));
        assert!(dump.next().is_none());
        assert_eq!(dump.entries(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut dump = KvDump::new(iter_of(vec![pair(b"a", b"1"), pair(b"a", b"2")]));
        assert!(dump.next().unwrap().is_ok());
        assert!(dump.next().unwrap().is_err());
    }

    #[test]
    fn test_read_error_poisons_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let mut section =
            SectionWriter::new(&mut sink).start(&header(), SectionDescriptor::state(0), dir.path());

        let dump = KvDump::new(iter_of(vec![
            pair(b"a", b"1"),
            Err(KvStoreError::Io {
                message: "disk gone".to_string(),
            }),
            pair(b"b", b"2"),
        ]));
        let err = dump.write_into(&mut section, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, GenesisStoreError::Iteration { entries: 1, .. }));
        assert!(section.is_poisoned());
        assert!(matches!(
            section.flush(),
            Err(GenesisStoreError::SectionFailed { .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cancel_poisons_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let mut section =
            SectionWriter::new(&mut sink).start(&header(), SectionDescriptor::state(0), dir.path());

        let cancel = CancelToken::new();
        cancel.cancel();
        let dump = KvDump::new(iter_of(vec![pair(b"a", b"1")]));
        assert!(matches!(
            dump.write_into(&mut section, &cancel),
            Err(GenesisStoreError::Cancelled)
        ));
        assert!(section.flush().is_err());
    }

    #[test]
    fn test_writes_all_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let mut section =
            SectionWriter::new(&mut sink).start(&header(), SectionDescriptor::state(0), dir.path());

        let dump = KvDump::new(iter_of(vec![pair(b"a", b"1"), pair(b"b", b"22")]));
        assert_eq!(dump.write_into(&mut section, &CancelToken::new()).unwrap(), 2);
        let flushed = section.flush().unwrap();
        assert_eq!(flushed.records, 2);
        assert_eq!(flushed.payload_len, 4 * 4 + 1 + 1 + 1 + 2);
    }
}
