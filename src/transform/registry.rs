//! Pass-scoped registry of extracted server functions.

use std::collections::BTreeMap;

use super::FunctionRecord;

/// Outcome of registering a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The id was new; the record is now stored.
    Inserted,
    /// The id already existed; the new record was dropped.
    /// Carries the artifact and line of the record that was kept.
    Duplicate { kept_artifact: String, kept_line: usize },
}

/// Append-only mapping from function id to record.
///
/// Created at pass start and discarded after the SDK is rendered. The first
/// record for an id wins; later ones are dropped.
#[derive(Debug, Clone, Default)]
pub struct IdentifierRegistry {
    records: BTreeMap<String, FunctionRecord>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record unless its id is already taken.
    pub fn register(&mut self, record: FunctionRecord) -> Registration {
        if let Some(kept) = self.records.get(&record.id) {
            return Registration::Duplicate {
                kept_artifact: kept.artifact.clone(),
                kept_line: kept.line,
            };
        }
        self.records.insert(record.id.clone(), record);
        Registration::Inserted
    }

    pub fn get(&self, id: &str) -> Option<&FunctionRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by id, so rendering is independent of registration order.
    pub fn records(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.records.values()
    }
}
