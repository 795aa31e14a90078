use crate::model::{Discardable, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// EntityStore
///
/// Ordered typed store for one entity table, keyed by the typed id. All
/// mutation goes through the write pipeline in `db::ops`; the store itself is
/// mechanical.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize, E::Id: Serialize",
    deserialize = "E: Deserialize<'de>, E::Id: Deserialize<'de>"
))]
pub struct EntityStore<E: EntityKind> {
    rows: BTreeMap<E::Id, E>,
}

impl<E: EntityKind> EntityStore<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.rows.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &E::Id) -> bool {
        self.rows.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    /// Find the first row matching a predicate, in id order.
    pub fn find(&self, mut pred: impl FnMut(&E) -> bool) -> Option<&E> {
        self.rows.values().find(|row| pred(row))
    }

    pub(crate) fn insert(&mut self, entity: E) -> Option<E> {
        self.rows.insert(entity.id(), entity)
    }

    pub(crate) fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.rows.remove(id)
    }

    pub(crate) fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.rows.get_mut(id)
    }
}

impl<E: EntityKind + Discardable> EntityStore<E> {
    /// Iterate live (non-discarded) rows only.
    pub fn iter_live(&self) -> impl Iterator<Item = &E> {
        self.rows.values().filter(|row| !row.is_discarded())
    }

    #[must_use]
    pub fn count_live(&self) -> usize {
        self.iter_live().count()
    }
}

impl<E: EntityKind> Default for EntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}
