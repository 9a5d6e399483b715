use addrbook_core::{ContactRecord, ContactRepository, ContactStore, IdentityResolution};
use std::fs;

fn contact(id: &str, email: &str) -> ContactRecord {
    let mut record = ContactRecord::with_id(id);
    record.email = email.to_string();
    record
}

#[test]
fn upsert_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("addressbook.json");

    let mut store = ContactStore::load(&path);
    assert!(store.is_empty());

    let mut jane = contact("", "jane@example.com");
    jane.first_name = "Jane".to_string();
    let outcome = store.upsert(jane).unwrap();

    let reloaded = ContactStore::load(&path);
    assert_eq!(reloaded.len(), 1);
    let stored = reloaded.find_by_id(&outcome.id).unwrap();
    assert_eq!(stored.first_name, "Jane");
}

#[test]
fn store_file_uses_contacts_envelope_and_canonical_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("addressbook.json");

    let mut store = ContactStore::load(&path);
    store.upsert(contact("", "a@x.com")).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let entries = json["contacts"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["email"], "a@x.com");
    assert!(entries[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(entries[0]["mobile_phone"], "");
}

#[test]
fn identity_priority_prefers_id_over_email() {
    let mut store = ContactStore::in_memory();
    let x = store.upsert(contact("", "a@x.com")).unwrap().id;

    let by_id = store.upsert(contact(&x, "b@y.com")).unwrap();
    assert_eq!(by_id.resolution, IdentityResolution::MatchedId);
    assert_eq!(store.len(), 1);
    assert_eq!(store.find_by_id(&x).unwrap().email, "b@y.com");

    let by_email = store.upsert(contact("", "B@Y.com")).unwrap();
    assert_eq!(by_email.resolution, IdentityResolution::MatchedEmail);
    assert_eq!(by_email.id, x);
    assert_eq!(store.len(), 1);
}

#[test]
fn email_match_keeps_existing_id_even_with_foreign_incoming_id() {
    let mut store = ContactStore::in_memory();
    let x = store.upsert(contact("", "a@x.com")).unwrap().id;

    let outcome = store.upsert(contact("not-in-store", "a@x.com")).unwrap();
    assert_eq!(outcome.id, x);
    assert!(store.find_by_id("not-in-store").is_none());
}

#[test]
fn upsert_is_idempotent() {
    let mut store = ContactStore::in_memory();
    let mut incoming = contact("", "same@x.com");
    incoming.city = "Berlin".to_string();

    let first = store.upsert(incoming.clone()).unwrap();
    let snapshot = store.all().to_vec();
    let second = store.upsert(incoming).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.all(), snapshot.as_slice());
}

#[test]
fn full_replace_clears_fields_missing_from_incoming() {
    let mut store = ContactStore::in_memory();
    let mut stored = contact("", "a@x.com");
    stored.mobile_phone = "0170 123".to_string();
    store.upsert(stored).unwrap();

    store.upsert(contact("", "a@x.com")).unwrap();
    assert_eq!(store.find_by_email("a@x.com").unwrap().mobile_phone, "");
}

#[test]
fn find_by_email_returns_first_in_storage_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dupes.json");
    fs::write(
        &path,
        r#"{"contacts": [
            {"id": "one", "email": "dup@x.com"},
            {"id": "two", "email": "DUP@x.com "}
        ]}"#,
    )
    .unwrap();

    let store = ContactStore::load(&path);
    assert_eq!(store.find_by_email(" Dup@X.com").unwrap().id, "one");
}

#[test]
fn delete_by_id_is_noop_when_absent() {
    let mut store = ContactStore::in_memory();
    let id = store.upsert(contact("", "a@x.com")).unwrap().id;

    assert!(!store.delete_by_id("missing").unwrap());
    assert_eq!(store.len(), 1);
    assert!(store.delete_by_id(&format!(" {id} ")).unwrap());
    assert!(store.is_empty());
}

#[test]
fn delete_by_email_resolves_to_id() {
    let mut store = ContactStore::in_memory();
    store.upsert(contact("", "a@x.com")).unwrap();
    store.upsert(contact("", "b@x.com")).unwrap();

    assert!(store.delete_by_email("A@X.COM").unwrap());
    assert!(!store.delete_by_email("a@x.com").unwrap());
    assert_eq!(store.len(), 1);
}

#[test]
fn missing_or_corrupt_files_load_as_empty() {
    let dir = tempfile::tempdir().unwrap();

    let missing = ContactStore::load(dir.path().join("missing.json"));
    assert!(missing.is_empty());

    let corrupt_path = dir.path().join("corrupt.json");
    fs::write(&corrupt_path, "{ not json").unwrap();
    assert!(ContactStore::load(&corrupt_path).is_empty());

    let wrong_shape = dir.path().join("shape.json");
    fs::write(&wrong_shape, r#"{"contacts": {"id": "x"}}"#).unwrap();
    assert!(ContactStore::load(&wrong_shape).is_empty());
}

#[test]
fn load_repairs_missing_ids_and_persists_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(
        &path,
        r#"{"contacts": [
            {"_id": "", "vorname": "Max", "name": "Muster", "plz": "10115", "festnetz": "030 1"},
            {"_id": "keep-me", "email": "k@x.com"},
            "not an object"
        ]}"#,
    )
    .unwrap();

    let store = ContactStore::load(&path);
    assert_eq!(store.len(), 2);
    let repaired = &store.all()[0];
    assert!(!repaired.id.is_empty());
    assert_eq!(repaired.first_name, "Max");
    assert_eq!(repaired.last_name, "Muster");
    assert_eq!(repaired.postal_code, "10115");
    assert_eq!(repaired.home_phone, "030 1");
    assert_eq!(store.all()[1].id, "keep-me");

    let on_disk = ContactStore::load(&path);
    assert_eq!(on_disk.all()[0].id, repaired.id);
}

#[test]
fn failed_write_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    // A directory at the store path makes the final rename fail.
    let path = dir.path().join("occupied");
    fs::create_dir(&path).unwrap();

    let mut store = ContactStore::load(&path);
    assert!(store.upsert(contact("", "a@x.com")).is_err());
    assert!(store.is_empty());
    assert!(path.is_dir());
}

#[test]
fn failed_write_leaves_existing_file_and_memory_unchanged() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("book");
    let path = dir.join("addressbook.json");

    let mut store = ContactStore::load(&path);
    let kept = store.upsert(contact("", "keep@x.com")).unwrap().id;
    let bytes_before = fs::read(&path).unwrap();
    let state_before = store.all().to_vec();

    // A plain file where the store directory was makes every save fail.
    let parked = root.path().join("parked");
    fs::rename(&dir, &parked).unwrap();
    fs::write(&dir, "not a directory").unwrap();

    assert!(store.upsert(contact("", "new@x.com")).is_err());
    assert!(store.delete_by_id(&kept).is_err());
    assert_eq!(store.all(), state_before.as_slice());

    fs::remove_file(&dir).unwrap();
    fs::rename(&parked, &dir).unwrap();
    assert_eq!(fs::read(&path).unwrap(), bytes_before);
    assert_eq!(ContactStore::load(&path).all(), state_before.as_slice());
}

#[test]
fn non_text_values_do_not_drop_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hand_edited.json");
    fs::write(
        &path,
        r#"{"contacts": [
            {"_id": "keep", "vorname": "Max", "name": "Muster", "plz": 10115, "webseite": null, "email": "max@x.com"}
        ]}"#,
    )
    .unwrap();

    let mut store = ContactStore::load(&path);
    assert_eq!(store.len(), 1);
    store.upsert(contact("", "other@x.com")).unwrap();

    let reloaded = ContactStore::load(&path);
    assert_eq!(reloaded.len(), 2);
    let kept = reloaded.find_by_id("keep").unwrap();
    assert_eq!(kept.last_name, "Muster");
    assert_eq!(kept.postal_code, "10115");
    assert_eq!(kept.website, "");
}

#[test]
fn no_temp_files_are_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("addressbook.json");

    let mut store = ContactStore::load(&path);
    store.upsert(contact("", "a@x.com")).unwrap();
    store.upsert(contact("", "b@x.com")).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["addressbook.json".to_string()]);
}
