#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use contacts_contracts::{
    Contact, ContactField, ContactFields, ContactFilter, ContactId, ContactPatch, Validate,
    ValidationError,
};
use rusqlite::{params, Connection, OptionalExtension};

const CONTACTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name VARCHAR(50) NOT NULL,
    phone_no VARCHAR(15) UNIQUE,
    email VARCHAR(50) UNIQUE,
    address TEXT,
    CONSTRAINT phone_no_or_email_or_address_is_not_null
        CHECK ((phone_no IS NOT NULL) OR (email IS NOT NULL) OR (address IS NOT NULL))
);
";

const SELECT_CONTACT_COLUMNS: &str = "SELECT id, name, phone_no, email, address FROM contacts";

// Save point bracketing one coordinator save.
const SYNC_SAVE_POINT: &str = "contacts_sync";
// Save point bracketing one filtered batch write.
const BATCH_SAVE_POINT: &str = "contacts_batch";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
    #[error("contact {0} not found")]
    NotFound(ContactId),
    #[error("storage backend failure: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Backend faults end the session; every other kind is a recoverable, displayable outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Sqlite(_) | StorageError::Io(_))
    }

    pub fn field(&self) -> Option<ContactField> {
        match self {
            StorageError::Validation(v) => v.field(),
            StorageError::Constraint(c) => Some(c.field()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("{field} '{value}' already belongs to another contact")]
    Duplicate { field: ContactField, value: String },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: ContactField, max: usize },
}

impl ConstraintViolation {
    pub fn field(&self) -> ContactField {
        match self {
            ConstraintViolation::Duplicate { field, .. } => *field,
            ConstraintViolation::TooLong { field, .. } => *field,
        }
    }
}

/// Record store over the local `contacts` table.
///
/// Writes are staged in an open transaction and become durable only on [`ContactStore::commit`].
/// Reads through the same handle see staged rows. Dropping the handle without committing
/// discards everything staged since the last commit.
#[derive(Debug)]
pub struct ContactStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ContactStore {
    /// Opens or creates the store at `path`, creating parent directories and the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, StorageError> {
        conn.execute_batch(CONTACTS_SCHEMA)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True while staged writes await [`ContactStore::commit`].
    pub fn has_pending_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    pub fn insert(&mut self, fields: ContactFields) -> Result<ContactId, StorageError> {
        let fields = fields.normalized();
        fields.validate()?;
        self.check_constraints(&fields, None)?;
        self.begin_if_needed()?;
        self.conn
            .execute(
                "INSERT INTO contacts (name, phone_no, email, address) VALUES (?1, ?2, ?3, ?4)",
                params![fields.name, fields.phone_no, fields.email, fields.address],
            )
            .map_err(|e| map_write_error(e, &fields))?;
        Ok(ContactId(self.conn.last_insert_rowid()))
    }

    /// All records in store order, or those with a field containing `substring`
    /// case-insensitively. Each call runs a fresh query.
    pub fn query(&self, substring: Option<&str>) -> Result<Vec<Contact>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_CONTACT_COLUMNS} ORDER BY id"))?;
        let rows = stmt
            .query_map([], map_contact_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(match substring {
            Some(q) if !q.is_empty() => rows
                .into_iter()
                .filter(|c| c.fields.matches_query(q))
                .collect(),
            _ => rows,
        })
    }

    pub fn get(&self, id: ContactId) -> Result<Option<Contact>, StorageError> {
        let contact = self
            .conn
            .query_row(
                &format!("{SELECT_CONTACT_COLUMNS} WHERE id = ?1"),
                params![id.0],
                map_contact_row,
            )
            .optional()?;
        Ok(contact)
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Applies `patch` to the record with `id`; the merged record is validated first.
    pub fn update(&mut self, id: ContactId, patch: &ContactPatch) -> Result<Contact, StorageError> {
        let current = self.get(id)?.ok_or(StorageError::NotFound(id))?;
        let merged = patch.apply_to(&current.fields);
        merged.validate()?;
        self.check_constraints(&merged, Some(id))?;
        self.begin_if_needed()?;
        self.conn
            .execute(
                "UPDATE contacts SET name = ?1, phone_no = ?2, email = ?3, address = ?4 WHERE id = ?5",
                params![merged.name, merged.phone_no, merged.email, merged.address, id.0],
            )
            .map_err(|e| map_write_error(e, &merged))?;
        Ok(merged.into_contact(id))
    }

    /// Applies `patch` to every record matching `filter`. All-or-nothing: on the first
    /// failure no matched record is changed. Returns the number of records updated.
    pub fn update_where(
        &mut self,
        filter: &ContactFilter,
        patch: &ContactPatch,
    ) -> Result<usize, StorageError> {
        let ids = self.matching_ids(filter)?;
        if ids.is_empty() {
            return Ok(0);
        }
        self.in_save_point(BATCH_SAVE_POINT, |store| {
            for id in &ids {
                store.update(*id, patch)?;
            }
            Ok(ids.len())
        })
    }

    /// Removes the record with `id`. Absent ids succeed without effect.
    /// Returns whether a record was removed.
    pub fn delete(&mut self, id: ContactId) -> Result<bool, StorageError> {
        if self.get(id)?.is_none() {
            return Ok(false);
        }
        self.begin_if_needed()?;
        let n = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1", params![id.0])?;
        Ok(n > 0)
    }

    /// Removes every record matching `filter`. Returns the number removed.
    pub fn delete_where(&mut self, filter: &ContactFilter) -> Result<usize, StorageError> {
        let ids = self.matching_ids(filter)?;
        if ids.is_empty() {
            return Ok(0);
        }
        self.in_save_point(BATCH_SAVE_POINT, |store| {
            let mut removed = 0;
            for id in &ids {
                if store.delete(*id)? {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    /// Makes every staged write durable. No-op when nothing is staged.
    pub fn commit(&mut self) -> Result<(), StorageError> {
        if self.has_pending_changes() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    pub fn begin_sync_save_point(&mut self) -> Result<(), StorageError> {
        self.begin_if_needed()?;
        self.conn
            .execute_batch(&format!("SAVEPOINT {SYNC_SAVE_POINT}"))?;
        Ok(())
    }

    pub fn release_sync_save_point(&mut self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(&format!("RELEASE SAVEPOINT {SYNC_SAVE_POINT}"))?;
        Ok(())
    }

    /// Undoes every write since [`ContactStore::begin_sync_save_point`]; writes staged
    /// before it are kept.
    pub fn rollback_sync_save_point(&mut self) -> Result<(), StorageError> {
        self.conn.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {SYNC_SAVE_POINT}; RELEASE SAVEPOINT {SYNC_SAVE_POINT}"
        ))?;
        Ok(())
    }

    fn begin_if_needed(&mut self) -> Result<(), StorageError> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn in_save_point<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        self.begin_if_needed()?;
        self.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        match f(self) {
            Ok(v) => {
                self.conn
                    .execute_batch(&format!("RELEASE SAVEPOINT {name}"))?;
                Ok(v)
            }
            Err(err) => {
                self.conn.execute_batch(&format!(
                    "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}"
                ))?;
                Err(err)
            }
        }
    }

    fn matching_ids(&self, filter: &ContactFilter) -> Result<Vec<ContactId>, StorageError> {
        if let Some(id) = filter.id {
            return Ok(self
                .get(id)?
                .filter(|c| filter.matches(c))
                .map(|c| vec![c.id])
                .unwrap_or_default());
        }
        Ok(self
            .query(None)?
            .into_iter()
            .filter(|c| filter.matches(c))
            .map(|c| c.id)
            .collect())
    }

    fn check_constraints(
        &self,
        fields: &ContactFields,
        exclude: Option<ContactId>,
    ) -> Result<(), StorageError> {
        for field in ContactField::ALL {
            let Some(value) = fields.get(field) else {
                continue;
            };
            if let Some(max) = field.max_chars() {
                if value.chars().count() > max {
                    return Err(ConstraintViolation::TooLong { field, max }.into());
                }
            }
            if !field.is_unique() {
                continue;
            }
            let holder: Option<i64> = self
                .conn
                .query_row(
                    &format!("SELECT id FROM contacts WHERE {} = ?1 LIMIT 1", field.column()),
                    params![value],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(holder) = holder {
                if Some(ContactId(holder)) != exclude {
                    return Err(ConstraintViolation::Duplicate {
                        field,
                        value: value.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

fn map_contact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: ContactId(row.get(0)?),
        fields: ContactFields {
            name: row.get(1)?,
            phone_no: row.get(2)?,
            email: row.get(3)?,
            address: row.get(4)?,
        },
    })
}

fn map_write_error(err: rusqlite::Error, fields: &ContactFields) -> StorageError {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            for field in ContactField::ALL.into_iter().filter(|f| f.is_unique()) {
                if message.contains(&format!("contacts.{}", field.column())) {
                    return ConstraintViolation::Duplicate {
                        field,
                        value: fields.text(field).to_string(),
                    }
                    .into();
                }
            }
        }
    }
    StorageError::Sqlite(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, phone: Option<&str>, email: Option<&str>) -> ContactFields {
        ContactFields::new(
            name,
            phone.map(str::to_string),
            email.map(str::to_string),
            None,
        )
    }

    #[test]
    fn at_store_01_insert_assigns_increasing_ids() {
        let mut s = ContactStore::open_in_memory().unwrap();
        let a = s.insert(fields("Amy", Some("12345"), None)).unwrap();
        let b = s.insert(fields("Rory", Some("54321"), None)).unwrap();
        assert_eq!(a, ContactId(1));
        assert_eq!(b, ContactId(2));
        assert!(s.has_pending_changes());
    }

    #[test]
    fn at_store_02_ids_not_reused_after_delete() {
        let mut s = ContactStore::open_in_memory().unwrap();
        let a = s.insert(fields("Amy", Some("12345"), None)).unwrap();
        s.commit().unwrap();
        assert!(s.delete(a).unwrap());
        s.commit().unwrap();
        let b = s.insert(fields("Rory", Some("54321"), None)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn at_store_03_too_long_fields_rejected() {
        let mut s = ContactStore::open_in_memory().unwrap();
        let err = s
            .insert(fields(&"x".repeat(51), Some("12345"), None))
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Constraint(ConstraintViolation::TooLong {
                field: ContactField::Name,
                max: 50
            })
        ));
        assert_eq!(err.field(), Some(ContactField::Name));
        assert!(!err.is_fatal());
    }

    #[test]
    fn at_store_04_invalid_candidate_never_reaches_table() {
        let mut s = ContactStore::open_in_memory().unwrap();
        let err = s.insert(fields("Amy", None, None)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::MissingContactMethod)
        ));
        assert!(!s.has_pending_changes());
        assert_eq!(s.count().unwrap(), 0);
    }

    #[test]
    fn at_store_05_update_keeps_own_unique_values() {
        let mut s = ContactStore::open_in_memory().unwrap();
        let id = s
            .insert(fields("Amy", Some("12345"), Some("amy@example.com")))
            .unwrap();
        let patch = ContactPatch::new()
            .with(ContactField::Name, "Amelia")
            .with(ContactField::PhoneNo, "12345");
        let updated = s.update(id, &patch).unwrap();
        assert_eq!(updated.fields.name, "Amelia");
        assert_eq!(updated.fields.email.as_deref(), Some("amy@example.com"));
    }

    #[test]
    fn at_store_06_sync_save_point_rollback_keeps_earlier_staged_rows() {
        let mut s = ContactStore::open_in_memory().unwrap();
        let id = s.insert(fields("Amy", Some("12345"), None)).unwrap();
        s.begin_sync_save_point().unwrap();
        s.update(id, &ContactPatch::new().with(ContactField::Name, "Changed"))
            .unwrap();
        s.rollback_sync_save_point().unwrap();

        let amy = s.get(id).unwrap().unwrap();
        assert_eq!(amy.fields.name, "Amy");
        assert!(s.has_pending_changes());
        s.commit().unwrap();
        assert!(!s.has_pending_changes());
    }

    #[test]
    fn at_store_07_commit_without_staged_work_is_noop() {
        let mut s = ContactStore::open_in_memory().unwrap();
        s.commit().unwrap();
        assert!(!s.delete(ContactId(42)).unwrap());
        assert!(!s.has_pending_changes());
    }
}
