// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ArgMatches;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::contacts;
use crate::models::{ContactRef, ProfileId};
use crate::store;

/// Value of a required string argument.
pub fn arg<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("--{} is required", name))
}

/// The profile acting on the ledger, from the global `--user` flag.
pub fn require_user(m: &ArgMatches) -> Result<ProfileId> {
    m.get_one::<i64>("user")
        .copied()
        .ok_or_else(|| anyhow!("--user <PROFILE_ID> is required for this command"))
}

pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let d = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    d.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow!("Invalid date '{}'", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// `"42"` names the user's own contact 42; `"r42"` names contact 42 kept by
/// someone who linked the user.
pub fn parse_contact_ref(conn: &Connection, user_id: ProfileId, s: &str) -> Result<ContactRef> {
    let s = s.trim();
    let (reverse, digits) = match s.strip_prefix(['r', 'R']) {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let id: i64 = digits
        .parse()
        .with_context(|| format!("Invalid contact reference '{}'", s))?;
    if !reverse {
        return Ok(ContactRef::Native(id));
    }
    let contact = store::get_contact(conn, id)?;
    if contact.owner_id == user_id {
        return Ok(ContactRef::Native(id));
    }
    Ok(ContactRef::Reverse {
        contact_id: id,
        owner_id: contact.owner_id,
    })
}

/// `CONTACT=AMOUNT`, as given to `tx add --split`.
pub fn parse_split_arg(
    conn: &Connection,
    user_id: ProfileId,
    s: &str,
) -> Result<(ContactRef, Decimal)> {
    let (who, amount) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid split '{}', expected CONTACT=AMOUNT", s))?;
    let reference = parse_contact_ref(conn, user_id, who)?;
    // surfaces ambiguity before anything is written
    contacts::relationship(conn, user_id, &reference)?;
    Ok((reference, parse_decimal(amount)?))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}
