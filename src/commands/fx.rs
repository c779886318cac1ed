// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::fx::{self, RateTable, normalize_code};
use crate::store;
use crate::utils::{arg, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = normalize_code(arg(sub, "currency")?);
            RateTable::load(conn)?.rate(&ccy)?;
            store::set_base_currency(conn, &ccy)?;
            println!("Base currency set to {}", ccy);
        }
        Some(("set-rate", sub)) => {
            let code = normalize_code(arg(sub, "code")?);
            let rate = parse_decimal(arg(sub, "rate")?)?;
            fx::set_rate(conn, &code, rate)?;
            println!("1 USD = {} {}", rate, code);
        }
        Some(("list", sub)) => list_rates(conn, sub.get_flag("json"))?,
        Some(("convert", sub)) => convert_amount(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct RateRow {
    code: String,
    per_usd: String,
}

fn list_rates(conn: &Connection, json: bool) -> Result<()> {
    let rates = RateTable::load(conn)?;
    let data: Vec<RateRow> = rates
        .iter()
        .map(|(code, r)| RateRow {
            code: code.to_string(),
            per_usd: r.to_string(),
        })
        .collect();
    if !maybe_print_json(json, &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.code, r.per_usd])
            .collect();
        println!("{}", pretty_table(&["Code", "Per USD"], rows));
    }
    Ok(())
}

fn convert_amount(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let from = normalize_code(arg(sub, "from")?);
    let to = normalize_code(arg(sub, "to")?);
    let res = RateTable::load(conn)?.convert(amount, &from, &to)?;
    println!("{} {} -> {:.4} {}", amount, from, res, to);
    Ok(())
}
