#![forbid(unsafe_code)]

use contacts_contracts::{
    ContactField, ContactFields, ContactFilter, ContactId, ContactPatch, ValidationError,
};
use contacts_storage::api::{add, delete, init_store, save_changes, search, update};
use contacts_storage::repo::ContactsRepo;
use contacts_storage::store::{ConstraintViolation, ContactStore, StorageError};

fn amy() -> ContactFields {
    ContactFields::new("Amy", Some("12345".to_string()), None, None)
}

fn contact(name: &str, phone: &str, email: &str, address: &str) -> ContactFields {
    ContactFields::new(
        name,
        Some(phone.to_string()),
        Some(email.to_string()),
        Some(address.to_string()),
    )
}

fn seeded_store() -> ContactStore {
    let mut s = ContactStore::open_in_memory().unwrap();
    s.insert(contact("Amy Pond", "12345", "amy@example.com", "Leadworth"))
        .unwrap();
    s.insert(contact("Rory Williams", "54321", "rory@example.com", ""))
        .unwrap();
    s.insert(contact("River Song", "", "river@stormcage.org", "Stormcage"))
        .unwrap();
    s.commit().unwrap();
    s
}

#[test]
fn at_contacts_db_01_concrete_session_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = init_store(dir.path().join("db").join("contacts.db")).unwrap();

    let id = add(&mut s, amy()).unwrap();
    assert_eq!(id, ContactId(1));

    let found = search(&s, Some("amy")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ContactId(1));

    update(
        &mut s,
        id,
        &ContactPatch::new().with(ContactField::Address, "Main St"),
    )
    .unwrap();
    save_changes(&mut s).unwrap();
    assert_eq!(
        s.get(id).unwrap().unwrap().fields.address.as_deref(),
        Some("Main St")
    );

    delete(&mut s, id).unwrap();
    save_changes(&mut s).unwrap();
    assert!(search(&s, None).unwrap().is_empty());
}

#[test]
fn at_contacts_db_02_insert_then_query_round_trip() {
    let mut s = ContactStore::open_in_memory().unwrap();
    let record = contact("Clara Oswald", "+442079460958", "clara@example.com", "");
    let id = s.insert(record.clone()).unwrap();

    let found = s.query(Some(&record.name)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].fields, record);
}

#[test]
fn at_contacts_db_03_query_matches_any_field_case_insensitive() {
    let s = seeded_store();
    let names = |q: &str| -> Vec<String> {
        s.query(Some(q))
            .unwrap()
            .into_iter()
            .map(|c| c.fields.name)
            .collect()
    };
    assert_eq!(names("RIVER"), vec!["River Song"]);
    assert_eq!(names("example.com"), vec!["Amy Pond", "Rory Williams"]);
    assert_eq!(names("stormcage"), vec!["River Song"]);
    assert_eq!(names("543"), vec!["Rory Williams"]);
    assert!(names("dalek").is_empty());
    assert_eq!(s.query(None).unwrap().len(), 3);
    assert_eq!(s.query(Some("")).unwrap().len(), 3);
}

#[test]
fn at_contacts_db_04_query_is_restartable_and_store_ordered() {
    let s = seeded_store();
    let first = s.query(None).unwrap();
    let second = s.query(None).unwrap();
    assert_eq!(first, second);
    let ids: Vec<i64> = first.iter().map(|c| c.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn at_contacts_db_05_delete_is_idempotent() {
    let mut once = seeded_store();
    once.delete(ContactId(2)).unwrap();
    once.commit().unwrap();

    let mut twice = seeded_store();
    assert!(twice.delete(ContactId(2)).unwrap());
    assert!(!twice.delete(ContactId(2)).unwrap());
    twice.commit().unwrap();

    assert_eq!(once.query(None).unwrap(), twice.query(None).unwrap());
    delete(&mut twice, ContactId(99)).unwrap();
}

#[test]
fn at_contacts_db_06_unique_phone_and_email_enforced() {
    let mut s = seeded_store();

    let err = s
        .insert(contact("Impostor", "12345", "", "Somewhere"))
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Constraint(ConstraintViolation::Duplicate {
            field: ContactField::PhoneNo,
            ..
        })
    ));

    let err = s
        .update(
            ContactId(2),
            &ContactPatch::new().with(ContactField::Email, "amy@example.com"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Constraint(ConstraintViolation::Duplicate {
            field: ContactField::Email,
            ..
        })
    ));
    assert_eq!(err.field(), Some(ContactField::Email));
}

#[test]
fn at_contacts_db_07_absent_optionals_never_collide() {
    let mut s = ContactStore::open_in_memory().unwrap();
    s.insert(contact("A", "", "", "Street 1")).unwrap();
    s.insert(contact("B", "", "", "Street 2")).unwrap();
    assert_eq!(s.count().unwrap(), 2);
}

#[test]
fn at_contacts_db_08_update_missing_id_is_not_found() {
    let mut s = seeded_store();
    let err = s
        .update(
            ContactId(77),
            &ContactPatch::new().with(ContactField::Name, "Nobody"),
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(ContactId(77))));
}

#[test]
fn at_contacts_db_09_update_validates_merged_record() {
    let mut s = seeded_store();
    let err = s
        .update(
            ContactId(3),
            &ContactPatch::new()
                .with(ContactField::Email, "")
                .with(ContactField::Address, ""),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Validation(ValidationError::MissingContactMethod)
    ));
    let river = s.get(ContactId(3)).unwrap().unwrap();
    assert_eq!(river.fields.address.as_deref(), Some("Stormcage"));
}

#[test]
fn at_contacts_db_10_staged_writes_visible_but_not_durable_until_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.db");
    {
        let mut s = ContactStore::open(&path).unwrap();
        s.insert(amy()).unwrap();
        s.commit().unwrap();
        s.insert(contact("Rory", "54321", "", "")).unwrap();
        assert_eq!(s.query(None).unwrap().len(), 2);
        assert!(s.has_pending_changes());
    }
    let reopened = ContactStore::open(&path).unwrap();
    let rows = reopened.query(None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields.name, "Amy");
}

#[test]
fn at_contacts_db_11_filtered_batch_update_and_delete() {
    let mut s = seeded_store();
    s.insert(contact("Amy Clone", "99999", "", "Leadworth"))
        .unwrap();

    let filter = ContactFilter::all().with(ContactField::Address, "Leadworth");
    let n = s
        .update_where(
            &filter,
            &ContactPatch::new().with(ContactField::Address, "Gallifrey"),
        )
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(s.query(Some("gallifrey")).unwrap().len(), 2);

    let removed = s
        .delete_where(&ContactFilter::all().with(ContactField::Address, "Gallifrey"))
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(s.count().unwrap(), 2);
    assert_eq!(s.delete_where(&ContactFilter::by_id(ContactId(1))).unwrap(), 0);
}

#[test]
fn at_contacts_db_12_filtered_batch_update_is_all_or_nothing() {
    let mut s = seeded_store();
    // Every row would take the same phone number: the second write collides.
    let filter = ContactFilter::all();
    let err = s
        .update_where(
            &filter,
            &ContactPatch::new().with(ContactField::PhoneNo, "77777"),
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)));
    let phones: Vec<Option<String>> = s
        .query(None)
        .unwrap()
        .into_iter()
        .map(|c| c.fields.phone_no)
        .collect();
    assert_eq!(
        phones,
        vec![Some("12345".to_string()), Some("54321".to_string()), None]
    );
}

#[test]
fn at_contacts_db_13_repo_seam_delegates_to_store() {
    let mut s = ContactStore::open_in_memory().unwrap();
    let repo: &mut dyn ContactsRepo = &mut s;
    let id = repo.insert_contact_row(amy()).unwrap();
    assert!(repo.has_pending_contact_rows());
    repo.update_contact_row(id, &ContactPatch::new().with(ContactField::Name, "Amelia"))
        .unwrap();
    repo.commit_contact_rows().unwrap();
    assert!(!repo.has_pending_contact_rows());
    assert_eq!(
        repo.get_contact_row(id).unwrap().unwrap().fields.name,
        "Amelia"
    );
    repo.delete_contact_row(id).unwrap();
    repo.delete_contact_row(id).unwrap();
    assert!(repo.contact_rows(None).unwrap().is_empty());
}

#[test]
fn at_contacts_db_14_add_rejects_invalid_candidates() {
    let mut s = ContactStore::open_in_memory().unwrap();
    let err = add(&mut s, contact("Amy", "", "amy@", "")).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Validation(ValidationError::InvalidEmail(_))
    ));
    assert_eq!(s.count().unwrap(), 0);
}
