// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dashboard::{reporting_currency_for, summarize};
use crate::fx::normalize_code;
use crate::utils::{fmt_money, maybe_print_json, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = require_user(m)?;
    let ccy = match m.get_one::<String>("currency") {
        Some(c) => normalize_code(c),
        None => reporting_currency_for(conn, user)?,
    };
    let summary = summarize(conn, user, &ccy)?;
    if maybe_print_json(m.get_flag("json"), &summary)? {
        return Ok(());
    }
    let c = &summary.currency;
    let rows = vec![
        vec!["Cash in accounts".into(), fmt_money(&summary.total_balance, c)],
        vec!["Owed to you".into(), fmt_money(&summary.owed_to_you, c)],
        vec!["You owe".into(), fmt_money(&summary.you_owe, c)],
        vec!["Income".into(), fmt_money(&summary.income, c)],
        vec!["Expenses".into(), fmt_money(&summary.expenses, c)],
        vec!["Net savings".into(), fmt_money(&summary.net_savings, c)],
        vec!["Assets".into(), fmt_money(&summary.assets, c)],
        vec!["Liabilities".into(), fmt_money(&summary.liabilities, c)],
        vec!["Net worth".into(), fmt_money(&summary.net_worth, c)],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));
    if !summary.per_category.is_empty() {
        let rows = summary
            .per_category
            .iter()
            .map(|(name, v)| vec![name.clone(), fmt_money(v, c)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }
    Ok(())
}
