// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balances::{self, to_currency_balances};
use crate::dashboard::reporting_currency_for;
use crate::fx::normalize_code;
use crate::utils::{fmt_money, maybe_print_json, parse_contact_ref, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = require_user(m)?;
    let json = m.get_flag("json");

    if let Some(s) = m.get_one::<String>("contact") {
        let reference = parse_contact_ref(conn, user, s)?;
        let map = balances::balance(conn, user, &reference)?;
        let list = to_currency_balances(&map);
        if !maybe_print_json(json, &list)? {
            if list.is_empty() {
                println!("Settled up with {}", reference);
                return Ok(());
            }
            let rows = list
                .iter()
                .map(|b| vec![b.currency.clone(), fmt_money(&b.amount, &b.currency)])
                .collect();
            println!("{}", pretty_table(&["Currency", "Balance"], rows));
        }
        return Ok(());
    }

    let reporting = match m.get_one::<String>("currency") {
        Some(c) => normalize_code(c),
        None => reporting_currency_for(conn, user)?,
    };
    let all = balances::contact_balances(conn, user, &reporting)?;
    if !maybe_print_json(json, &all)? {
        let rows = all
            .iter()
            .map(|cb| {
                let detail = cb
                    .balances
                    .iter()
                    .map(|b| fmt_money(&b.amount, &b.currency))
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    cb.reference.to_string(),
                    cb.name.clone(),
                    detail,
                    fmt_money(&cb.total, &cb.total_currency),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Ref", "Contact", "By currency", "Total"], rows)
        );
        println!("Positive: they owe you. Negative: you owe them.");
    }
    Ok(())
}
