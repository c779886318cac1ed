// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::contacts;
use crate::models::ContactRef;
use crate::utils::{arg, maybe_print_json, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = require_user(sub)?;
            let name = arg(sub, "name")?;
            let linked = sub.get_one::<i64>("profile").copied();
            let contact = contacts::create_contact(conn, user, name, linked)?;
            if !maybe_print_json(sub.get_flag("json"), &contact)? {
                println!("Contact '{}' (id {})", contact.name, contact.id);
            }
        }
        Some(("list", sub)) => {
            let user = require_user(sub)?;
            let views = contacts::list_contacts(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), &views)? {
                let data = views
                    .iter()
                    .map(|v| {
                        let kind = match v.reference {
                            ContactRef::Native(_) => "own",
                            ContactRef::Reverse { .. } => "added you",
                        };
                        vec![
                            v.reference.to_string(),
                            v.name.clone(),
                            kind.to_string(),
                            v.linked_profile_id
                                .map(|p| p.to_string())
                                .unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Ref", "Name", "Kind", "Profile"], data)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
