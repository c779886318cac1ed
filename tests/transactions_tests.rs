// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use settleclip::error::LedgerError;
use settleclip::ledger::{self, NewSplit, NewTransaction};
use settleclip::models::{ContactRef, Role, TransactionKind};
use settleclip::utils::parse_date;
use settleclip::{cli, commands::transactions, contacts, store};

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn setup() -> (Connection, i64, i64) {
    let conn = Connection::open_in_memory().unwrap();
    settleclip::db::init_schema(&conn).unwrap();
    let user = ledger::create_profile(&conn, "Alice", "USD").unwrap().id;
    let account = ledger::create_account(&conn, user, "A1", "USD", dec("100"))
        .unwrap()
        .id;
    (conn, user, account)
}

#[test]
fn expense_debits_account_and_stamps_roles() {
    let (conn, user, account) = setup();
    let friend = contacts::create_contact(&conn, user, "Sam", None).unwrap().id;
    let new = NewTransaction::new(TransactionKind::Expense, dec("25.10"), "usd")
        .account(account)
        .description("Lunch")
        .split(NewSplit::debt(ContactRef::Native(friend), dec("12.55")));
    let recorded = ledger::record_transaction(&conn, user, &new).unwrap();

    assert_eq!(recorded.transaction.currency, "USD");
    assert_eq!(recorded.splits.len(), 1);
    assert_eq!(recorded.splits[0].role, Role::Payer);
    assert_eq!(recorded.splits[0].currency, "USD");
    assert_eq!(
        store::get_account(&conn, account).unwrap().balance,
        dec("74.90")
    );
}

#[test]
fn oversized_debts_write_nothing() {
    let (conn, user, account) = setup();
    let friend = contacts::create_contact(&conn, user, "Sam", None).unwrap().id;
    let new = NewTransaction::new(TransactionKind::Expense, dec("10"), "USD")
        .account(account)
        .split(NewSplit::debt(ContactRef::Native(friend), dec("6")))
        .split(NewSplit::debt(ContactRef::Native(friend), dec("6")));
    let err = ledger::record_transaction(&conn, user, &new).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    assert!(ledger::list_transactions(&conn, user, None).unwrap().is_empty());
    assert_eq!(
        store::get_account(&conn, account).unwrap().balance,
        dec("100")
    );
}

#[test]
fn failed_split_rolls_back_the_transaction() {
    let (conn, user, account) = setup();
    let new = NewTransaction::new(TransactionKind::Expense, dec("10"), "USD")
        .account(account)
        .split(NewSplit::debt(ContactRef::Native(4242), dec("5")));
    let err = ledger::record_transaction(&conn, user, &new).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
    assert!(ledger::list_transactions(&conn, user, None).unwrap().is_empty());
    assert_eq!(
        store::get_account(&conn, account).unwrap().balance,
        dec("100")
    );
}

#[test]
fn transfer_converts_into_destination_currency() {
    let (conn, user, account) = setup();
    let euros = ledger::create_account(&conn, user, "Euros", "EUR", dec("0"))
        .unwrap()
        .id;
    let new = NewTransaction::new(TransactionKind::Transfer, dec("50"), "USD")
        .account(account)
        .to_account(euros);
    ledger::record_transaction(&conn, user, &new).unwrap();
    assert_eq!(store::get_account(&conn, account).unwrap().balance, dec("50"));
    assert_eq!(store::get_account(&conn, euros).unwrap().balance, dec("46"));
}

#[test]
fn unknown_currency_is_rejected() {
    let (conn, user, _) = setup();
    let new = NewTransaction::new(TransactionKind::Income, dec("10"), "XYZ");
    let err = ledger::record_transaction(&conn, user, &new).unwrap_err();
    assert!(matches!(err, LedgerError::UnknownCurrency(c) if c == "XYZ"));
}

#[test]
fn list_limit_respected() {
    let (conn, user, account) = setup();
    for i in 1..=3 {
        let new = NewTransaction::new(TransactionKind::Expense, dec("10"), "USD")
            .account(account)
            .occurred_at(parse_date(&format!("2025-01-0{}", i)).unwrap());
        ledger::record_transaction(&conn, user, &new).unwrap();
    }
    let cli = cli::build_cli();
    let matches =
        cli.get_matches_from(["settleclip", "tx", "list", "--limit", "2", "--user", "1"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let user_flag = *list_m.get_one::<i64>("user").unwrap();
            assert_eq!(user_flag, user);
            let limit = list_m.get_one::<usize>("limit").copied();
            let rows = transactions::query_rows(&conn, user_flag, limit).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-01-03");
            assert_eq!(rows[0].account, "A1");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}
