// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use settleclip::ledger::{self, NewSplit, NewTransaction};
use settleclip::models::{ContactRef, TransactionKind};
use settleclip::{cli, commands::exporter, contacts};
use serde_json::json;
use tempfile::tempdir;

/// Alice charges Bob 12.34 of a 30 USD expense; returns (conn, alice, bob, alice's contact).
fn base_conn() -> (Connection, i64, i64, i64) {
    let conn = Connection::open_in_memory().unwrap();
    settleclip::db::init_schema(&conn).unwrap();
    let alice = ledger::create_profile(&conn, "Alice", "USD").unwrap().id;
    let bob = ledger::create_profile(&conn, "Bob", "USD").unwrap().id;
    let alices_bob = contacts::create_contact(&conn, alice, "Bob", Some(bob))
        .unwrap()
        .id;
    let new = NewTransaction::new(TransactionKind::Expense, Decimal::new(30, 0), "USD").split(
        NewSplit::debt(ContactRef::Native(alices_bob), Decimal::new(1234, 2)),
    );
    ledger::record_transaction(&conn, alice, &new).unwrap();
    (conn, alice, bob, alices_bob)
}

fn run_export(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["settleclip"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_splits_writes_pretty_json() {
    let (conn, _, _, alices_bob) = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(
        &conn,
        &["export", "splits", "--format", "json", "--out", &out_str, "--user", "1"],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let row = &parsed[0];
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(row["contact"], json!(alices_bob.to_string()));
    assert_eq!(row["kind"], json!("DEBT"));
    assert_eq!(row["role"], json!("payer"));
    assert_eq!(row["amount"], json!("12.34"));
    assert_eq!(row["currency"], json!("USD"));
    assert_eq!(row["created_by"], json!(1));
}

#[test]
fn counterparty_sees_split_through_reverse_reference() {
    let (conn, _, bob, alices_bob) = base_conn();
    let records = exporter::split_records(&conn, bob).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].contact, format!("r{}", alices_bob));
}

#[test]
fn export_splits_csv_has_header_and_rows() {
    let (conn, _, _, _) = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("splits.csv");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(&conn, &["--user", "1", "export", "splits", "--out", &out_str]).unwrap();

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[3], "kind");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][5], "12.34");
}

#[test]
fn export_splits_rejects_unknown_format() {
    let (conn, _, _, _) = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    let out_str = out_path.to_string_lossy().to_string();

    let res = run_export(
        &conn,
        &["--user", "1", "export", "splits", "--format", "xml", "--out", &out_str],
    );
    assert!(res.is_err());
    assert!(!out_path.exists());
}
