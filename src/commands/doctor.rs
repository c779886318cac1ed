// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use crate::fx::RateTable;
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Problems found in the store, as `(issue, detail)` pairs.
pub fn find_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Currencies the rate table cannot convert
    let rates = RateTable::load(conn)?;
    for c in store::distinct_currencies(conn)? {
        if !rates.contains(&c) {
            rows.push(vec!["unknown_currency".into(), c]);
        }
    }

    // 2) Splits written by someone on neither side of the contact
    let mut stmt = conn.prepare(
        "SELECT s.id, s.created_by, c.id FROM splits s JOIN contacts c ON s.contact_id=c.id
         WHERE s.created_by != c.owner_id
           AND (c.linked_profile_id IS NULL OR s.created_by != c.linked_profile_id)
         ORDER BY s.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let split: i64 = r.get(0)?;
        let author: i64 = r.get(1)?;
        let contact: i64 = r.get(2)?;
        rows.push(vec![
            "foreign_split".into(),
            format!("split {} by profile {} on contact {}", split, author, contact),
        ]);
    }

    // 3) Debts that add up to more than their transaction
    let mut stmt = conn.prepare(
        "SELECT t.id, t.amount, s.amount FROM transactions t JOIN splits s ON s.transaction_id=t.id
         WHERE s.kind='DEBT' ORDER BY t.id",
    )?;
    let mut cur = stmt.query([])?;
    let mut totals: BTreeMap<i64, (Decimal, Decimal)> = BTreeMap::new();
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let amount = store::decimal_at(r, 1)?;
        let share = store::decimal_at(r, 2)?;
        totals.entry(id).or_insert((amount, Decimal::ZERO)).1 += share;
    }
    for (id, (amount, sum)) in totals {
        if sum > amount {
            rows.push(vec![
                "debts_exceed_amount".into(),
                format!("transaction {}: {} > {}", id, sum, amount),
            ]);
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = find_issues(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
