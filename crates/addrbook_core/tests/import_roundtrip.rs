use addrbook_core::{
    decode_vcard, encode_vcard, read_csv, write_csv, ContactField, ContactRecord,
    ContactRepository, ContactStore, CsvImportError, ImportService,
};

const SAMPLE_VCARD: &str = "BEGIN:VCARD\nN:Doe;Jane;;;\nEMAIL:Jane@Example.com\nEND:VCARD\n";

fn full_contact() -> ContactRecord {
    ContactRecord {
        id: "c1".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        street: "Main St 1".to_string(),
        postal_code: "12345".to_string(),
        city: "Springfield".to_string(),
        mobile_phone: "+49 170 1".to_string(),
        home_phone: "030 2".to_string(),
        email: "jane@example.com".to_string(),
        birth_date: "1990-01-01".to_string(),
        website: "https://jane.example".to_string(),
        last_used: String::new(),
    }
}

#[test]
fn sample_vcard_imports_then_updates() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ContactStore::load(dir.path().join("book.json"));

    let first = ImportService::new(&mut store).import_vcard(SAMPLE_VCARD);
    assert_eq!((first.added, first.updated, first.skipped), (1, 0, 0));

    let second = ImportService::new(&mut store).import_vcard(SAMPLE_VCARD);
    assert_eq!((second.added, second.updated, second.skipped), (0, 1, 0));
    assert_eq!(store.len(), 1);

    let stored = &store.all()[0];
    assert_eq!(stored.last_name, "Doe");
    assert_eq!(stored.first_name, "Jane");
    assert_eq!(stored.email, "jane@example.com");
}

#[test]
fn vcard_round_trip_preserves_emitted_fields() {
    let original = full_contact();
    let decoded = decode_vcard(&encode_vcard(std::slice::from_ref(&original)));
    assert_eq!(decoded.len(), 1);

    let mut expected = original;
    expected.id = String::new();
    assert_eq!(decoded[0], expected);
}

#[test]
fn vcard_round_trip_keeps_omitted_fields_empty() {
    let mut sparse = ContactRecord::with_id("c2");
    sparse.last_name = "Solo".to_string();
    sparse.city = "Bonn".to_string();

    let decoded = decode_vcard(&encode_vcard(&[sparse]));
    let record = &decoded[0];
    assert_eq!(record.last_name, "Solo");
    assert_eq!(record.city, "Bonn");
    for field in [
        ContactField::FirstName,
        ContactField::Street,
        ContactField::PostalCode,
        ContactField::MobilePhone,
        ContactField::HomePhone,
        ContactField::Email,
        ContactField::BirthDate,
        ContactField::Website,
    ] {
        assert_eq!(record.get(field), "", "{} should stay empty", field.name());
    }
}

#[test]
fn vcard_round_trip_keeps_separators_and_line_breaks() {
    let csv = "email;strasse;name;ort;plz\n\
               a@x.com;\"Main St 1\nApt 4\";\"Smith;Jones\";Bonn, Rhein;53111\n";
    let rows = read_csv(csv).unwrap();
    let mut contact: ContactRecord = rows.into_iter().next().unwrap().into();
    assert_eq!(contact.street, "Main St 1\nApt 4");
    assert_eq!(contact.last_name, "Smith;Jones");
    contact.first_name = "Ann, Marie".to_string();
    contact.website = "https://x.example/a;b".to_string();
    contact.birth_date = "C:\\odd\\".to_string();

    let decoded = decode_vcard(&encode_vcard(std::slice::from_ref(&contact)));
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0], contact);
}

#[test]
fn multiple_cards_keep_input_order() {
    let mut a = ContactRecord::new();
    a.last_name = "First".to_string();
    let mut b = ContactRecord::new();
    b.last_name = "Second".to_string();

    let text = encode_vcard(&[a, b]).replace('\n', "\r\n");
    let decoded = decode_vcard(&text);
    let names: Vec<&str> = decoded.iter().map(|c| c.last_name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
}

#[test]
fn csv_import_maps_headers_and_merges_by_email() {
    let mut store = ContactStore::in_memory();
    let csv = "Vorname,Nachname,E-Mail,Handy,Town\nJane,Doe,JANE@example.com,0170,Bonn\nMax,Muster,,,\n";

    let report = ImportService::new(&mut store).import_csv(csv).unwrap();
    assert_eq!((report.added, report.updated, report.skipped), (2, 0, 0));

    let jane = store.find_by_email("jane@example.com").unwrap();
    assert_eq!(jane.mobile_phone, "0170");
    assert_eq!(jane.city, "Bonn");

    let update = "email;ort\njane@example.com;Köln\n";
    let report = ImportService::new(&mut store).import_csv(update).unwrap();
    assert_eq!((report.added, report.updated), (0, 1));

    // Full replace: the phone number is gone after an import without it.
    let jane = store.find_by_email("jane@example.com").unwrap();
    assert_eq!(jane.city, "Köln");
    assert_eq!(jane.mobile_phone, "");
    assert_eq!(jane.first_name, "");
}

#[test]
fn csv_without_header_aborts_before_touching_store() {
    let mut store = ContactStore::in_memory();
    let err = ImportService::new(&mut store).import_csv("").unwrap_err();
    assert!(matches!(err, CsvImportError::MissingHeader));
    assert!(store.is_empty());
}

#[test]
fn csv_export_reimports_into_same_identities() {
    let mut store = ContactStore::in_memory();
    ImportService::new(&mut store).import_records(vec![full_contact()]);
    let exported = write_csv(store.all()).unwrap();

    let rows = read_csv(&exported).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(ContactField::Website), Some("https://jane.example"));

    let report = ImportService::new(&mut store).import_records(rows);
    assert_eq!((report.added, report.updated), (0, 1));
    assert_eq!(store.len(), 1);
}
