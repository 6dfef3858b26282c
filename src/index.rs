//! Dense index <-> external ID mapping for users and items.

use std::collections::HashMap;

use crate::error::{AlsError, EntityKind};

/// Bijection between 64-bit external IDs and row indices `0..len`.
///
/// Indices follow the order in which the IDs were enumerated; nothing is
/// re-sorted, so a deterministic source yields a deterministic index.
#[derive(Debug, Clone)]
pub struct IdIndex {
    kind: EntityKind,
    ids: Vec<u64>,
    positions: HashMap<u64, usize>,
}

impl IdIndex {
    pub fn from_ids<I>(kind: EntityKind, ids: I) -> Result<Self, AlsError>
    where
        I: IntoIterator<Item = u64>,
    {
        let ids: Vec<u64> = ids.into_iter().collect();
        let mut positions = HashMap::with_capacity(ids.len());
        for (index, &id) in ids.iter().enumerate() {
            if positions.insert(id, index).is_some() {
                return Err(AlsError::DuplicateId { kind, id });
            }
        }
        Ok(Self {
            kind,
            ids,
            positions,
        })
    }

    /// Row index of `id`, `NotFound` if it was never enumerated
    pub fn index_of(&self, id: u64) -> Result<usize, AlsError> {
        self.get(id).ok_or(AlsError::NotFound {
            kind: self.kind,
            id,
        })
    }

    pub fn get(&self, id: u64) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn id_at(&self, index: usize) -> Option<u64> {
        self.ids.get(index).copied()
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
