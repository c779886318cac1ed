// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::settlement::{self, Direction, PaymentSplit, SettlementRequest};
use crate::utils::{
    arg, fmt_money, maybe_print_json, parse_contact_ref, parse_decimal, pretty_table,
    require_user,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = require_user(m)?;
    let contact = parse_contact_ref(conn, user, arg(m, "contact")?)?;
    let account_id = *m
        .get_one::<i64>("account")
        .ok_or_else(|| anyhow::anyhow!("--account is required"))?;
    let direction: Direction = arg(m, "direction")?.parse()?;
    let req = SettlementRequest {
        contact,
        account_id,
        amount: parse_decimal(arg(m, "amount")?)?,
        direction,
        description: m.get_one::<String>("description").cloned(),
    };
    let json = m.get_flag("json");

    if m.get_flag("preview") {
        let preview = settlement::preview_settlement(conn, user, &req)?;
        if !maybe_print_json(json, &preview)? {
            print_allocation(&preview.splits);
            println!(
                "Account change: {}",
                fmt_money(&preview.account_delta, &preview.payment_currency)
            );
        }
        return Ok(());
    }

    let done = settlement::settle(conn, user, &req)?;
    if !maybe_print_json(json, &done)? {
        print_allocation(&done.allocation);
        println!(
            "Settlement {} recorded: {} ({})",
            done.transaction.id,
            fmt_money(&done.transaction.amount, &done.transaction.currency),
            req.direction
        );
    }
    Ok(())
}

fn print_allocation(splits: &[PaymentSplit]) {
    let rows = splits
        .iter()
        .map(|s| {
            vec![
                s.debt_split_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "credit".into()),
                fmt_money(&s.amount, &s.currency),
                format!("{:?}", s.phase),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Debt", "Amount", "Phase"], rows));
}
