// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Settleclip", "settleclip"));

/// Environment variable that points the CLI at a specific database file.
pub const DB_ENV: &str = "SETTLECLIP_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("settleclip.sqlite"))
}

pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS profiles(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        base_currency TEXT NOT NULL DEFAULT 'USD'
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        currency_code TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0',
        UNIQUE(owner_id, name),
        FOREIGN KEY(owner_id) REFERENCES profiles(id)
    );

    CREATE TABLE IF NOT EXISTS contacts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        linked_profile_id INTEGER,
        FOREIGN KEY(owner_id) REFERENCES profiles(id),
        FOREIGN KEY(linked_profile_id) REFERENCES profiles(id)
    );
    -- one contact per (owner, linked profile); concurrent find-or-create relies on it
    CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_owner_link
        ON contacts(owner_id, linked_profile_id)
        WHERE linked_profile_id IS NOT NULL;
    CREATE INDEX IF NOT EXISTS idx_contacts_link ON contacts(linked_profile_id);

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_by INTEGER NOT NULL,
        account_id INTEGER,
        to_account_id INTEGER,
        payer_contact_id INTEGER,
        receiver_contact_id INTEGER,
        amount TEXT NOT NULL,
        currency_code TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('INCOME','EXPENSE','TRANSFER','SETTLEMENT')),
        category_id INTEGER,
        description TEXT,
        occurred_at TEXT NOT NULL,
        FOREIGN KEY(created_by) REFERENCES profiles(id),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(to_account_id) REFERENCES accounts(id),
        FOREIGN KEY(payer_contact_id) REFERENCES contacts(id),
        FOREIGN KEY(receiver_contact_id) REFERENCES contacts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_creator ON transactions(created_by, occurred_at);

    CREATE TABLE IF NOT EXISTS splits(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        contact_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        currency_code TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('DEBT','PAYMENT')),
        role TEXT NOT NULL CHECK(role IN ('payer','receiver')),
        created_by INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(transaction_id) REFERENCES transactions(id),
        FOREIGN KEY(contact_id) REFERENCES contacts(id),
        FOREIGN KEY(created_by) REFERENCES profiles(id)
    );
    CREATE INDEX IF NOT EXISTS idx_splits_contact ON splits(contact_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_splits_transaction ON splits(transaction_id);

    -- units of currency per one USD; overlays the built-in table
    CREATE TABLE IF NOT EXISTS currency_rates(
        code TEXT PRIMARY KEY,
        per_usd TEXT NOT NULL
    );
    "#,
    )
}
