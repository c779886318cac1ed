// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{arg, fmt_money, maybe_print_json, parse_decimal, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = require_user(sub)?;
            let name = arg(sub, "name")?;
            let ccy = arg(sub, "currency")?;
            let opening = match sub.get_one::<String>("opening") {
                Some(s) => parse_decimal(s)?,
                None => Decimal::ZERO,
            };
            let account = ledger::create_account(conn, user, name, ccy, opening)?;
            if !maybe_print_json(sub.get_flag("json"), &account)? {
                println!(
                    "Added account '{}' (id {}, {})",
                    account.name, account.id, account.currency
                );
            }
        }
        Some(("list", sub)) => {
            let user = require_user(sub)?;
            let accounts = ledger::list_accounts(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), &accounts)? {
                let data = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.currency.clone(),
                            fmt_money(&a.balance, &a.currency),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Currency", "Balance"], data)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
