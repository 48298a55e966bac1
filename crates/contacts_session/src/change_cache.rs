#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use contacts_contracts::{ContactField, ContactId, ContactPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    Clean,
    Dirty,
}

/// Id-keyed staging area for unsaved edits and deletions.
///
/// Nothing here touches the store; the sync coordinator drains it on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeCache {
    edits: BTreeMap<ContactId, ContactPatch>,
    deletions: BTreeSet<ContactId>,
}

impl ChangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one field edit into the entry for `id`, creating it on first edit.
    pub fn record_edit(&mut self, id: ContactId, field: ContactField, value: impl Into<String>) {
        self.edits.entry(id).or_default().set(field, value);
    }

    pub fn record_deletion(&mut self, id: ContactId) {
        self.deletions.insert(id);
    }

    pub fn state(&self) -> CacheState {
        if self.edits.is_empty() && self.deletions.is_empty() {
            CacheState::Clean
        } else {
            CacheState::Dirty
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state() == CacheState::Dirty
    }

    pub fn edit_for(&self, id: ContactId) -> Option<&ContactPatch> {
        self.edits.get(&id)
    }

    pub fn is_marked_for_deletion(&self, id: ContactId) -> bool {
        self.deletions.contains(&id)
    }

    pub fn edits(&self) -> impl Iterator<Item = (ContactId, &ContactPatch)> + '_ {
        self.edits.iter().map(|(id, patch)| (*id, patch))
    }

    pub fn deletions(&self) -> impl Iterator<Item = ContactId> + '_ {
        self.deletions.iter().copied()
    }

    /// Edits whose id is not also marked for deletion. Deletion dominates.
    pub fn pending_updates(&self) -> impl Iterator<Item = (ContactId, &ContactPatch)> + '_ {
        self.edits()
            .filter(|(id, _)| !self.deletions.contains(id))
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.deletions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_cache_01_starts_clean_and_edit_makes_dirty() {
        let mut c = ChangeCache::new();
        assert_eq!(c.state(), CacheState::Clean);
        c.record_edit(ContactId(1), ContactField::Name, "A");
        assert_eq!(c.state(), CacheState::Dirty);
    }

    #[test]
    fn at_cache_02_edits_to_same_id_merge_last_write_wins() {
        let mut c = ChangeCache::new();
        c.record_edit(ContactId(1), ContactField::Name, "A");
        c.record_edit(ContactId(1), ContactField::Email, "a@example.com");
        c.record_edit(ContactId(1), ContactField::Name, "B");

        let patch = c.edit_for(ContactId(1)).unwrap();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get(ContactField::Name), Some("B"));
        assert_eq!(c.edits().count(), 1);
    }

    #[test]
    fn at_cache_03_deletion_alone_makes_dirty() {
        let mut c = ChangeCache::new();
        c.record_deletion(ContactId(4));
        c.record_deletion(ContactId(4));
        assert!(c.is_dirty());
        assert_eq!(c.deletions().collect::<Vec<_>>(), vec![ContactId(4)]);
    }

    #[test]
    fn at_cache_04_pending_updates_skip_ids_marked_for_deletion() {
        let mut c = ChangeCache::new();
        c.record_edit(ContactId(1), ContactField::Name, "Kept");
        c.record_edit(ContactId(2), ContactField::Name, "Dropped");
        c.record_deletion(ContactId(2));

        let ids: Vec<ContactId> = c.pending_updates().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ContactId(1)]);
        assert!(c.edit_for(ContactId(2)).is_some());
    }

    #[test]
    fn at_cache_05_clear_returns_to_clean() {
        let mut c = ChangeCache::new();
        c.record_edit(ContactId(1), ContactField::Address, "Main St");
        c.record_deletion(ContactId(2));
        c.clear();
        assert_eq!(c.state(), CacheState::Clean);
        assert_eq!(c, ChangeCache::default());
    }
}
