use contactbook_core::db::open_db_in_memory;
use contactbook_core::{
    Contact, ContactBook, ContactKey, ContactRepository, ContactValidationError, RepoError,
    SqliteContactRepository,
};

fn contact(first_name: &str, last_name: &str, email: &str) -> Contact {
    let mut contact = Contact::new(first_name, last_name);
    contact.email = email.to_string();
    contact
}

#[test]
fn add_and_get_contact_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);

    let mut ada = contact("Ada", "Lovelace", "ada@example.com");
    ada.category = "Family".to_string();
    ada.phone_number = "555-0100".to_string();
    repo.add(&ada).unwrap();

    let loaded = repo.get(&ada.key()).unwrap().unwrap();
    assert_eq!(loaded, ada);
    assert!(!loaded.is_starred);
    assert!(repo.get(&ContactKey::new("Ada", "")).unwrap().is_none());
}

#[test]
fn adding_same_key_twice_returns_duplicate_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);

    repo.add(&contact("Ada", "Lovelace", "first@example.com"))
        .unwrap();
    let err = repo
        .add(&contact("Ada", "Lovelace", "second@example.com"))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateKey(ref key) if *key == ContactKey::new("Ada", "Lovelace")));
    assert!(err.is_recoverable());
    assert_eq!(repo.count().unwrap(), 1);
    let stored = repo.get(&ContactKey::new("Ada", "Lovelace")).unwrap().unwrap();
    assert_eq!(stored.email, "first@example.com");
}

#[test]
fn same_first_name_with_different_last_name_is_a_distinct_contact() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);

    repo.add(&Contact::new("Ada", "Lovelace")).unwrap();
    repo.add(&Contact::new("Ada", "")).unwrap();

    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn add_rejects_blank_first_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);

    let err = repo.add(&Contact::new("   ", "Lovelace")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ContactValidationError::EmptyFirstName)
    ));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn update_replaces_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&contact("Grace", "Hopper", "old@example.com"))
        .unwrap();

    let mut replacement = contact("Grace", "Hopper", "grace@navy.mil");
    replacement.institution = "US Navy".to_string();
    replacement.is_starred = true;
    repo.update(&replacement.key(), &replacement).unwrap();

    assert_eq!(repo.get(&replacement.key()).unwrap(), Some(replacement));
}

#[test]
fn update_of_missing_key_returns_not_found_and_leaves_store_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&contact("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    let before = repo.list().unwrap();

    let missing = ContactKey::new("Charles", "Babbage");
    let err = repo
        .update(&missing, &contact("Charles", "Babbage", "cb@example.com"))
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound(ref key) if *key == missing));
    assert_eq!(repo.list().unwrap(), before);
}

#[test]
fn update_can_rename_contact() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&contact("Ada", "Byron", "ada@example.com")).unwrap();

    let old_key = ContactKey::new("Ada", "Byron");
    repo.update(&old_key, &contact("Ada", "Lovelace", "ada@example.com"))
        .unwrap();

    assert!(repo.get(&old_key).unwrap().is_none());
    assert!(repo
        .get(&ContactKey::new("Ada", "Lovelace"))
        .unwrap()
        .is_some());
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn rename_onto_existing_key_is_rejected_by_unique_constraint() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&contact("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    repo.add(&contact("Alan", "Turing", "alan@example.com"))
        .unwrap();

    let err = repo
        .update(
            &ContactKey::new("Alan", "Turing"),
            &contact("Ada", "Lovelace", "alan@example.com"),
        )
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateKey(ref key) if *key == ContactKey::new("Ada", "Lovelace")));
    let alan = repo.get(&ContactKey::new("Alan", "Turing")).unwrap().unwrap();
    assert_eq!(alan.email, "alan@example.com");
    let ada = repo.get(&ContactKey::new("Ada", "Lovelace")).unwrap().unwrap();
    assert_eq!(ada.email, "ada@example.com");
}

#[test]
fn delete_removes_contact_and_missing_key_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&Contact::new("Ada", "Lovelace")).unwrap();
    repo.add(&Contact::new("Alan", "Turing")).unwrap();

    repo.delete(&ContactKey::new("Ada", "Lovelace")).unwrap();
    assert_eq!(repo.count().unwrap(), 1);

    let err = repo.delete(&ContactKey::new("Ada", "Lovelace")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn toggle_star_twice_restores_original_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    let key = ContactKey::new("Ada", "Lovelace");
    repo.add(&Contact::new("Ada", "Lovelace")).unwrap();

    assert!(repo.toggle_star(&key).unwrap());
    assert!(repo.get(&key).unwrap().unwrap().is_starred);
    assert!(!repo.toggle_star(&key).unwrap());
    assert!(!repo.get(&key).unwrap().unwrap().is_starred);
}

#[test]
fn toggle_star_on_missing_key_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&Contact::new("Ada", "Lovelace")).unwrap();

    let err = repo
        .toggle_star(&ContactKey::new("Alan", "Turing"))
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound(_)));
    assert!(repo.list().unwrap().iter().all(|c| !c.is_starred));
}

#[test]
fn list_returns_starred_contacts_first_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    for (first, last) in [
        ("Ada", "Lovelace"),
        ("Alan", "Turing"),
        ("Grace", "Hopper"),
        ("Edsger", "Dijkstra"),
    ] {
        repo.add(&Contact::new(first, last)).unwrap();
    }
    repo.toggle_star(&ContactKey::new("Grace", "Hopper")).unwrap();
    repo.toggle_star(&ContactKey::new("Alan", "Turing")).unwrap();

    let names = repo
        .list()
        .unwrap()
        .into_iter()
        .map(|c| c.first_name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["Alan", "Grace", "Ada", "Edsger"]);
}

#[test]
fn bulk_add_skips_duplicates_and_invalid_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::new(&conn);
    repo.add(&Contact::new("Ada", "Lovelace")).unwrap();

    let report = repo
        .bulk_add(&[
            Contact::new("Ada", "Lovelace"),
            Contact::new("Alan", "Turing"),
            Contact::new("", "Nobody"),
            Contact::new("Alan", "Turing"),
            Contact::new("Grace", "Hopper"),
        ])
        .unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(
        report.duplicates,
        [
            ContactKey::new("Ada", "Lovelace"),
            ContactKey::new("Alan", "Turing")
        ]
    );
    assert_eq!(report.invalid, [ContactKey::new("", "Nobody")]);
    assert_eq!(repo.count().unwrap(), 3);
}

#[test]
fn contact_book_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.db");

    let book = ContactBook::open(&path).unwrap();
    assert_eq!(book.db_path(), path.as_path());
    book.add(&contact("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    book.toggle_star(&ContactKey::new("Ada", "Lovelace"))
        .unwrap();
    drop(book);

    let reopened = ContactBook::open(&path).unwrap();
    let contacts = reopened.list().unwrap();
    assert_eq!(contacts.len(), 1);
    assert!(contacts[0].is_starred);
    assert!(matches!(
        reopened.add(&Contact::new("Ada", "Lovelace")),
        Err(RepoError::DuplicateKey(_))
    ));
}

#[test]
fn contact_book_reads_changes_made_by_other_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let book = ContactBook::open(&path).unwrap();
    assert_eq!(book.count().unwrap(), 0);

    let conn = contactbook_core::db::connect(&path).unwrap();
    SqliteContactRepository::new(&conn)
        .add(&Contact::new("Alan", "Turing"))
        .unwrap();
    drop(conn);

    assert_eq!(book.count().unwrap(), 1);
}
