// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;
use settleclip::commands::doctor::find_issues;
use settleclip::ledger::{self, NewTransaction};
use settleclip::models::{Role, Split, SplitKind, TransactionKind};
use settleclip::{contacts, db, store};
use tempfile::tempdir;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn clean_store_has_no_issues() {
    let conn = setup();
    ledger::create_profile(&conn, "Alice", "USD").unwrap();
    assert!(find_issues(&conn).unwrap().is_empty());
}

#[test]
fn flags_unknown_currency_and_foreign_split() {
    let conn = setup();
    let alice = ledger::create_profile(&conn, "Alice", "USD").unwrap().id;
    let carol = ledger::create_profile(&conn, "Carol", "USD").unwrap().id;
    let sam = contacts::create_contact(&conn, alice, "Sam", None).unwrap().id;
    conn.execute(
        "INSERT INTO accounts(owner_id, name, currency_code) VALUES (?1, 'Odd', 'ZZZ')",
        [alice],
    )
    .unwrap();

    let tx = ledger::record_transaction(
        &conn,
        alice,
        &NewTransaction::new(TransactionKind::Expense, Decimal::new(5, 0), "USD"),
    )
    .unwrap()
    .transaction;
    store::insert_split(
        &conn,
        &Split {
            id: 0,
            transaction_id: tx.id,
            contact_id: sam,
            amount: Decimal::new(9, 0),
            currency: "USD".into(),
            kind: SplitKind::Debt,
            role: Role::Payer,
            created_by: carol,
            created_at: Utc::now(),
        },
    )
    .unwrap();

    let issues = find_issues(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|r| r[0].as_str()).collect();
    assert!(kinds.contains(&"unknown_currency"));
    assert!(kinds.contains(&"foreign_split"));
    assert!(kinds.contains(&"debts_exceed_amount"));
}

#[test]
fn open_at_creates_file_and_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("ledger.sqlite");
    let conn = db::open_at(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store::get_base_currency(&conn).unwrap(), "USD");
    // reopening an existing file keeps it usable
    drop(conn);
    let conn = db::open_at(&path).unwrap();
    assert!(store::list_profiles(&conn).unwrap().is_empty());
}
