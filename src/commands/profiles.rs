// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::store;
use crate::utils::{arg, maybe_print_json, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg(sub, "name")?;
            let ccy = match sub.get_one::<String>("currency") {
                Some(c) => c.clone(),
                None => store::get_base_currency(conn)?,
            };
            let profile = ledger::create_profile(conn, name, &ccy)?;
            if !maybe_print_json(sub.get_flag("json"), &profile)? {
                println!(
                    "Added profile '{}' (id {}, {})",
                    profile.name, profile.id, profile.base_currency
                );
            }
        }
        Some(("set-currency", sub)) => {
            let user = require_user(sub)?;
            let profile = ledger::set_profile_currency(conn, user, arg(sub, "currency")?)?;
            println!("Reports for '{}' now use {}", profile.name, profile.base_currency);
        }
        Some(("list", sub)) => {
            let profiles = store::list_profiles(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &profiles)? {
                let data = profiles
                    .into_iter()
                    .map(|p| vec![p.id.to_string(), p.name, p.base_currency])
                    .collect();
                println!("{}", pretty_table(&["Id", "Name", "Currency"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
