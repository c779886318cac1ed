// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::store;
use crate::utils::{arg, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg(sub, "name")?;
            let id = ledger::create_category(conn, name)?;
            println!("Added category '{}' (id {})", name, id);
        }
        Some(("list", sub)) => {
            let categories = store::list_categories(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &categories)? {
                let data = categories
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name])
                    .collect();
                println!("{}", pretty_table(&["Id", "Category"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
