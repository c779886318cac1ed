// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::contacts;
use crate::dashboard::reporting_currency_for;
use crate::ledger::{self, NewSplit, NewTransaction, Recorded};
use crate::models::TransactionKind;
use crate::store;
use crate::utils::{
    arg, fmt_money, maybe_print_json, parse_date, parse_decimal, parse_split_arg, pretty_table,
    require_user,
};
use anyhow::{Result, bail};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let kind: TransactionKind = arg(sub, "kind")?.parse()?;
    if kind == TransactionKind::Settlement {
        bail!("Use `settle` to record a settlement");
    }
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let account = sub.get_one::<i64>("account").copied();

    let currency = match (sub.get_one::<String>("currency"), account) {
        (Some(c), _) => c.clone(),
        (None, Some(id)) => ledger::owned_account(conn, user, id)?.currency,
        (None, None) => reporting_currency_for(conn, user)?,
    };

    let mut new = NewTransaction::new(kind, amount, &currency);
    if let Some(id) = account {
        new = new.account(id);
    }
    if let Some(id) = sub.get_one::<i64>("to-account") {
        new = new.to_account(*id);
    }
    if let Some(id) = sub.get_one::<i64>("category") {
        new = new.category(*id);
    }
    if let Some(d) = sub.get_one::<String>("description") {
        new = new.description(d);
    }
    if let Some(d) = sub.get_one::<String>("date") {
        new = new.occurred_at(parse_date(d)?);
    }
    if let Some(values) = sub.get_many::<String>("split") {
        for v in values {
            let (contact, share) = parse_split_arg(conn, user, v)?;
            new = new.split(NewSplit::debt(contact, share));
        }
    }

    let recorded = ledger::record_transaction(conn, user, &new)?;
    if !maybe_print_json(sub.get_flag("json"), &recorded)? {
        let tx = &recorded.transaction;
        println!(
            "Recorded {} {} (id {}, {} split(s))",
            tx.kind.as_str(),
            fmt_money(&tx.amount, &tx.currency),
            tx.id,
            recorded.splits.len()
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub currency: String,
    pub account: String,
    pub category: String,
    pub description: String,
    pub splits: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let limit = sub.get_one::<usize>("limit").copied();
    let data = query_rows(conn, user, limit)?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.account.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.splits.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Id",
                    "Date",
                    "Kind",
                    "Amount",
                    "CCY",
                    "Account",
                    "Category",
                    "Description",
                    "Splits"
                ],
                rows,
            )
        );
    }
    Ok(())
}

/// Flattened view of the user's transactions, newest first.
pub fn query_rows(
    conn: &Connection,
    user: i64,
    limit: Option<usize>,
) -> Result<Vec<TransactionRow>> {
    let mut data = Vec::new();
    for Recorded {
        transaction: tx,
        splits,
    } in ledger::list_transactions(conn, user, limit)?
    {
        let account = match tx.account_id {
            Some(id) => store::get_account(conn, id)?.name,
            None => String::new(),
        };
        let category = match tx.category_id {
            Some(id) => store::get_category(conn, id)?.name,
            None => String::new(),
        };
        let mut parts = Vec::with_capacity(splits.len());
        for s in &splits {
            let reference = contacts::reference_for(conn, user, s.contact_id)?;
            parts.push(format!(
                "{} {} {}",
                reference,
                s.kind.as_str(),
                fmt_money(&s.amount, &s.currency)
            ));
        }
        data.push(TransactionRow {
            id: tx.id,
            date: tx.occurred_at.format("%Y-%m-%d").to_string(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount.round_dp(2).to_string(),
            currency: tx.currency,
            account,
            category,
            description: tx.description.unwrap_or_default(),
            splits: parts.join("; "),
        });
    }
    Ok(data)
}
