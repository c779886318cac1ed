// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use settleclip::error::LedgerError;
use settleclip::fx::{self, RateTable};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    settleclip::db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn builtin_rates_route_through_usd() {
    let conn = setup();
    let rates = RateTable::load(&conn).unwrap();

    // 9000 INR -> 100 USD -> 92 EUR
    let res = rates
        .convert(Decimal::new(9000, 0), "INR", "EUR")
        .unwrap();
    assert_eq!(format!("{:.2}", res.round_dp(2)), "92.00");

    let same = rates.convert(Decimal::new(1234, 2), "gbp", "GBP").unwrap();
    assert_eq!(same, Decimal::new(1234, 2));
}

#[test]
fn stored_rates_overlay_builtins() {
    let conn = setup();
    fx::set_rate(&conn, "inr", Decimal::new(80, 0)).unwrap();
    fx::set_rate(&conn, "AAA", Decimal::new(2, 0)).unwrap();
    let rates = RateTable::load(&conn).unwrap();
    assert_eq!(rates.rate("INR").unwrap(), Decimal::new(80, 0));
    assert!(rates.contains("aaa"));

    // updating keeps one row per code
    fx::set_rate(&conn, "AAA", Decimal::new(4, 0)).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM currency_rates WHERE code='AAA'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
    let rates = RateTable::load(&conn).unwrap();
    assert_eq!(
        rates.convert(Decimal::new(8, 0), "AAA", "USD").unwrap(),
        Decimal::new(2, 0)
    );
}

#[test]
fn unknown_code_never_defaults() {
    let conn = setup();
    let rates = RateTable::load(&conn).unwrap();
    let err = rates.convert(Decimal::ONE, "USD", "XYZ").unwrap_err();
    assert!(matches!(err, LedgerError::UnknownCurrency(c) if c == "XYZ"));
}

#[test]
fn non_positive_rate_is_rejected() {
    let conn = setup();
    let err = fx::set_rate(&conn, "AAA", Decimal::ZERO).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM currency_rates", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}
