#![forbid(unsafe_code)]

use std::path::Path;

use contacts_contracts::{validate, ContactField, ContactFields, ContactId};
use contacts_storage::{api::init_store, ContactStore, ContactsRepo, StorageError};

use crate::change_cache::{CacheState, ChangeCache};
use crate::filter::{FilterEngine, FilterOutcome};
use crate::sync::{SaveError, SaveReport, SyncCoordinator};
use crate::table::{ContactTable, TableError};

/// One interactive editing session over an injected store handle.
///
/// Cell edits and row deletions are staged in the change cache and reach the store only
/// on [`ContactSession::save`]. Adds go straight to the store (validated) and become
/// durable on the next save.
#[derive(Debug)]
pub struct ContactSession<R: ContactsRepo> {
    store: R,
    table: ContactTable,
    cache: ChangeCache,
    filter: FilterEngine,
}

impl ContactSession<ContactStore> {
    /// Opens the store at `path` and loads every record into the table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let mut session = Self::new(init_store(path)?);
        session.load()?;
        Ok(session)
    }
}

impl<R: ContactsRepo> ContactSession<R> {
    pub fn new(store: R) -> Self {
        Self {
            store,
            table: ContactTable::new(),
            cache: ChangeCache::new(),
            filter: FilterEngine::new(),
        }
    }

    /// Reloads the table from the store. Any active filter is dropped; staged edits and
    /// deletion marks are laid back over the fresh rows. Returns the row count.
    pub fn load(&mut self) -> Result<usize, StorageError> {
        let records = self.store.contact_rows(None)?;
        self.table.load(records);
        self.filter.reset();

        for (id, patch) in self.cache.edits() {
            for (field, value) in patch.iter() {
                self.table.restore_cell(id, field, value);
            }
        }
        for id in self.cache.deletions() {
            self.table.restore_deletion(id);
        }
        Ok(self.table.len())
    }

    /// Validates and inserts a new record, then appends its row. The row stays visible
    /// even while a filter is active.
    pub fn add(&mut self, fields: ContactFields) -> Result<ContactId, StorageError> {
        let fields = validate(fields)?;
        let id = self.store.insert_contact_row(fields.clone())?;
        let stored = match self.store.get_contact_row(id)? {
            Some(contact) => contact,
            None => fields.normalized().into_contact(id),
        };
        self.table.push(stored);
        Ok(id)
    }

    pub fn edit_cell(
        &mut self,
        position: usize,
        field: ContactField,
        value: &str,
    ) -> Result<ContactId, TableError> {
        let id = self.table.set_cell(position, field, value)?;
        self.cache.record_edit(id, field, value);
        Ok(id)
    }

    /// Hides the rows at once and stages their ids for deletion on save.
    pub fn delete_rows(&mut self, positions: &[usize]) -> Result<Vec<ContactId>, TableError> {
        let ids = self.table.mark_deleted(positions)?;
        for id in &ids {
            self.cache.record_deletion(*id);
        }
        Ok(ids)
    }

    pub fn search(&mut self, query: &str) -> FilterOutcome {
        self.filter.apply(&mut self.table, query)
    }

    /// Applies the change cache and commits. On failure nothing in the session changes.
    pub fn save(&mut self) -> Result<SaveReport, SaveError> {
        let report = SyncCoordinator::save(&mut self.store, &mut self.cache)?;
        self.table.purge_deleted();
        for contact in &report.updated {
            self.table.push(contact.clone());
        }
        Ok(report)
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    /// True when the cache is dirty or the store holds uncommitted adds.
    pub fn has_unsaved_changes(&self) -> bool {
        self.cache.is_dirty() || self.store.has_pending_contact_rows()
    }

    pub fn table(&self) -> &ContactTable {
        &self.table
    }

    pub fn cache(&self) -> &ChangeCache {
        &self.cache
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn store(&self) -> &R {
        &self.store
    }
}
