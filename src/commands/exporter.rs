// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::contacts;
use crate::store;
use crate::utils::{arg, require_user};
use anyhow::{Result, bail};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("splits", sub)) => export_splits(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct SplitRecord {
    pub id: i64,
    pub transaction_id: i64,
    pub contact: String,
    pub kind: String,
    pub role: String,
    pub amount: String,
    pub currency: String,
    pub created_by: i64,
    pub created_at: String,
}

/// Every split the user can see, oldest first, with contacts written the way
/// the user refers to them.
pub fn split_records(conn: &Connection, user: i64) -> Result<Vec<SplitRecord>> {
    let mut out = Vec::new();
    for s in store::splits_visible_to(conn, user)? {
        let reference = contacts::reference_for(conn, user, s.contact_id)?;
        out.push(SplitRecord {
            id: s.id,
            transaction_id: s.transaction_id,
            contact: reference.to_string(),
            kind: s.kind.as_str().to_string(),
            role: s.role.as_str().to_string(),
            amount: s.amount.to_string(),
            currency: s.currency,
            created_by: s.created_by,
            created_at: store::format_stamp(&s.created_at),
        });
    }
    Ok(out)
}

fn export_splits(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let fmt = arg(sub, "format")?.to_lowercase();
    let out = arg(sub, "out")?;
    let records = split_records(conn, user)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            for r in &records {
                wtr.serialize(r)?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&records)?)?;
        }
        _ => bail!("Unknown format: {} (use csv|json)", fmt),
    }
    println!("Exported {} splits to {}", records.len(), out);
    Ok(())
}
