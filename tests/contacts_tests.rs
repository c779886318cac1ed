// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use settleclip::contacts;
use settleclip::error::LedgerError;
use settleclip::ledger;
use settleclip::models::ContactRef;
use settleclip::store;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    settleclip::db::init_schema(&conn).unwrap();
    conn
}

/// Alice (1) and Bob (2); Bob keeps a contact "Ally" linked to Alice.
fn alice_and_bob(conn: &Connection) -> (i64, i64, i64) {
    let alice = ledger::create_profile(conn, "Alice", "USD").unwrap().id;
    let bob = ledger::create_profile(conn, "Bob", "USD").unwrap().id;
    let bobs_alice = contacts::create_contact(conn, bob, "Ally", Some(alice))
        .unwrap()
        .id;
    (alice, bob, bobs_alice)
}

#[test]
fn reverse_reference_resolves_to_one_canonical_contact() {
    let conn = setup();
    let (alice, bob, bobs_alice) = alice_and_bob(&conn);
    let reverse = ContactRef::Reverse {
        contact_id: bobs_alice,
        owner_id: bob,
    };

    let first = contacts::resolve(&conn, alice, &reverse).unwrap();
    let second = contacts::resolve(&conn, alice, &reverse).unwrap();
    assert_eq!(first, second);

    let created = store::get_contact(&conn, first).unwrap();
    assert_eq!(created.owner_id, alice);
    assert_eq!(created.linked_profile_id, Some(bob));
    assert_eq!(created.name, "Bob");
    assert_eq!(store::contacts_for_owner(&conn, alice).unwrap().len(), 1);
}

#[test]
fn native_reference_to_the_other_side_is_treated_as_reverse() {
    let conn = setup();
    let (alice, bob, bobs_alice) = alice_and_bob(&conn);
    let mine = contacts::create_contact(&conn, alice, "Bobby", Some(bob))
        .unwrap()
        .id;
    let resolved = contacts::resolve(&conn, alice, &ContactRef::Native(bobs_alice)).unwrap();
    assert_eq!(resolved, mine);
}

#[test]
fn linked_contact_creation_is_find_or_create() {
    let conn = setup();
    let (alice, bob, _) = alice_and_bob(&conn);
    let a = contacts::create_contact(&conn, alice, "Bob", Some(bob)).unwrap();
    let b = contacts::create_contact(&conn, alice, "Robert", Some(bob)).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(b.name, "Bob");

    // unlinked contacts may repeat
    let x = contacts::create_contact(&conn, alice, "Cash friend", None).unwrap();
    let y = contacts::create_contact(&conn, alice, "Cash friend", None).unwrap();
    assert_ne!(x.id, y.id);
}

#[test]
fn linking_yourself_is_rejected() {
    let conn = setup();
    let (alice, _, _) = alice_and_bob(&conn);
    let err = contacts::create_contact(&conn, alice, "Me", Some(alice)).unwrap_err();
    assert!(matches!(err, LedgerError::AmbiguousContact(_)));
}

#[test]
fn list_shows_virtual_entry_until_linked_back() {
    let conn = setup();
    let (alice, bob, bobs_alice) = alice_and_bob(&conn);

    let before = contacts::list_contacts(&conn, alice).unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(
        before[0].reference,
        ContactRef::Reverse {
            contact_id: bobs_alice,
            owner_id: bob
        }
    );
    assert_eq!(before[0].name, "Bob");

    let mine = contacts::resolve(&conn, alice, &before[0].reference).unwrap();
    let after = contacts::list_contacts(&conn, alice).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].reference, ContactRef::Native(mine));

    // Bob only ever sees his own row
    let bobs = contacts::list_contacts(&conn, bob).unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].reference, ContactRef::Native(bobs_alice));
}

#[test]
fn strangers_cannot_use_a_contact() {
    let conn = setup();
    let (_, bob, bobs_alice) = alice_and_bob(&conn);
    let carol = ledger::create_profile(&conn, "Carol", "USD").unwrap().id;

    let err = contacts::resolve(&conn, carol, &ContactRef::Native(bobs_alice)).unwrap_err();
    assert!(matches!(err, LedgerError::AmbiguousContact(id) if id == bobs_alice));

    let err = contacts::resolve(
        &conn,
        carol,
        &ContactRef::Reverse {
            contact_id: bobs_alice,
            owner_id: bob,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::AmbiguousContact(_)));
    assert!(store::contacts_for_owner(&conn, carol).unwrap().is_empty());
}

#[test]
fn reverse_reference_with_wrong_owner_is_ambiguous() {
    let conn = setup();
    let (alice, _, bobs_alice) = alice_and_bob(&conn);
    let err = contacts::resolve(
        &conn,
        alice,
        &ContactRef::Reverse {
            contact_id: bobs_alice,
            owner_id: alice,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::AmbiguousContact(_)));
}

#[test]
fn missing_contact_is_not_found() {
    let conn = setup();
    let (alice, _, _) = alice_and_bob(&conn);
    let err = contacts::resolve(&conn, alice, &ContactRef::Native(999)).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::NotFound {
            entity: "contact",
            id: 999
        }
    ));
}

#[test]
fn relationship_lookup_never_creates_rows() {
    let conn = setup();
    let (alice, bob, bobs_alice) = alice_and_bob(&conn);
    let rel = contacts::relationship(
        &conn,
        alice,
        &ContactRef::Reverse {
            contact_id: bobs_alice,
            owner_id: bob,
        },
    )
    .unwrap();
    assert_eq!(rel.counterparty, Some(bob));
    assert!(rel.canonical.is_none());
    assert_eq!(rel.contact_ids(), vec![bobs_alice]);
    assert!(store::contacts_for_owner(&conn, alice).unwrap().is_empty());
}

#[test]
fn cli_references_parse_to_tagged_refs() {
    let conn = setup();
    let (alice, bob, bobs_alice) = alice_and_bob(&conn);
    let parse = settleclip::utils::parse_contact_ref;

    assert_eq!(
        parse(&conn, alice, &format!("r{}", bobs_alice)).unwrap(),
        ContactRef::Reverse {
            contact_id: bobs_alice,
            owner_id: bob
        }
    );
    // the owner writing "r" still means their own row
    assert_eq!(
        parse(&conn, bob, &format!("r{}", bobs_alice)).unwrap(),
        ContactRef::Native(bobs_alice)
    );
    assert_eq!(parse(&conn, bob, " 7 ").unwrap(), ContactRef::Native(7));
    assert!(parse(&conn, alice, "reverse_1").is_err());
}
