#![forbid(unsafe_code)]

use std::fmt;

use contacts_contracts::{Contact, ContactField, ContactId, Validate};
use contacts_storage::{ContactsRepo, StorageError};

use crate::change_cache::ChangeCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavePhase {
    Prepare,
    Update,
    Delete,
    Commit,
    Rollback,
}

impl fmt::Display for SavePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SavePhase::Prepare => "prepare",
            SavePhase::Update => "update",
            SavePhase::Delete => "delete",
            SavePhase::Commit => "commit",
            SavePhase::Rollback => "rollback",
        };
        f.write_str(label)
    }
}

/// A save that did not complete. The change cache is left exactly as it was.
#[derive(Debug, thiserror::Error)]
#[error("save failed during {phase}{}{}: {source}", of_contact(.id), in_field(.field))]
pub struct SaveError {
    pub phase: SavePhase,
    pub id: Option<ContactId>,
    pub field: Option<ContactField>,
    pub source: StorageError,
}

impl SaveError {
    fn new(phase: SavePhase, id: Option<ContactId>, source: StorageError) -> Self {
        Self {
            phase,
            id,
            field: source.field(),
            source,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.source.is_fatal()
    }
}

fn of_contact(id: &Option<ContactId>) -> String {
    id.map(|id| format!(" of contact {id}")).unwrap_or_default()
}

fn in_field(field: &Option<ContactField>) -> String {
    field.map(|field| format!(" ({field})")).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Stored state of every updated record, in id order.
    pub updated: Vec<Contact>,
    pub deleted: Vec<ContactId>,
}

/// Applies the change cache to the store on save.
///
/// All staged updates run before any deletion, and updates for ids also marked for
/// deletion are skipped. The whole save sits inside a store save point: on failure the
/// store is rolled back to where it was when the save began and the cache is untouched.
#[derive(Debug, Default)]
pub struct SyncCoordinator;

impl SyncCoordinator {
    pub fn save<R: ContactsRepo + ?Sized>(
        store: &mut R,
        cache: &mut ChangeCache,
    ) -> Result<SaveReport, SaveError> {
        store
            .begin_save_point()
            .map_err(|e| SaveError::new(SavePhase::Prepare, None, e))?;

        let report = match Self::apply(store, cache) {
            Ok(report) => report,
            Err(err) => {
                if let Err(rollback) = store.rollback_save_point() {
                    return Err(SaveError::new(SavePhase::Rollback, err.id, rollback));
                }
                return Err(err);
            }
        };

        store
            .release_save_point()
            .map_err(|e| SaveError::new(SavePhase::Commit, None, e))?;
        store
            .commit_contact_rows()
            .map_err(|e| SaveError::new(SavePhase::Commit, None, e))?;
        cache.clear();
        Ok(report)
    }

    fn apply<R: ContactsRepo + ?Sized>(
        store: &mut R,
        cache: &ChangeCache,
    ) -> Result<SaveReport, SaveError> {
        let mut report = SaveReport::default();

        for (id, patch) in cache.pending_updates() {
            let fail = |e: StorageError| SaveError::new(SavePhase::Update, Some(id), e);
            let current = store
                .get_contact_row(id)
                .map_err(fail)?
                .ok_or(StorageError::NotFound(id))
                .map_err(fail)?;
            let merged = patch.apply_to(&current.fields);
            merged
                .validate()
                .map_err(|e| fail(StorageError::Validation(e)))?;
            let stored = store.update_contact_row(id, patch).map_err(fail)?;
            report.updated.push(stored);
        }

        for id in cache.deletions() {
            store
                .delete_contact_row(id)
                .map_err(|e| SaveError::new(SavePhase::Delete, Some(id), e))?;
            report.deleted.push(id);
        }

        Ok(report)
    }
}
