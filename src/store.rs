// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Repository over the relational store.
//!
//! The rest of the crate only needs point lookups by id, lookups by foreign
//! key ordered by `created_at`, inserts, and one account balance update.
//! Every function takes `&Connection`, so callers can pass a
//! `rusqlite::Transaction` and keep a whole operation atomic.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{
    Connection, OptionalExtension, Row, Transaction as SqlTransaction, TransactionBehavior, params,
    params_from_iter,
};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{
    Account, AccountId, Category, CategoryId, Contact, ContactId, Profile, ProfileId, Split,
    SplitId, Transaction, TransactionId,
};

const ACCOUNT_COLS: &str = "id, owner_id, name, currency_code, balance";
const CONTACT_COLS: &str = "id, owner_id, name, linked_profile_id";
const TX_COLS: &str = "id, created_by, account_id, to_account_id, payer_contact_id, \
     receiver_contact_id, amount, currency_code, kind, category_id, description, occurred_at";
const SPLIT_COLS: &str =
    "id, transaction_id, contact_id, amount, currency_code, kind, role, created_by, created_at";

fn conversion_failure<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub fn decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| conversion_failure(idx, e))
}

pub fn stamp_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = r.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn parsed_at<T>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: String = r.get(idx)?;
    s.parse::<T>().map_err(|e| conversion_failure(idx, e))
}

/// Fixed-width UTC stamp; sorts lexically in chronological order.
pub fn format_stamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        name: r.get(2)?,
        currency: r.get(3)?,
        balance: decimal_at(r, 4)?,
    })
}

fn contact_from_row(r: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        name: r.get(2)?,
        linked_profile_id: r.get(3)?,
    })
}

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        created_by: r.get(1)?,
        account_id: r.get(2)?,
        to_account_id: r.get(3)?,
        payer_contact_id: r.get(4)?,
        receiver_contact_id: r.get(5)?,
        amount: decimal_at(r, 6)?,
        currency: r.get(7)?,
        kind: parsed_at(r, 8)?,
        category_id: r.get(9)?,
        description: r.get(10)?,
        occurred_at: stamp_at(r, 11)?,
    })
}

fn split_from_row(r: &Row<'_>) -> rusqlite::Result<Split> {
    Ok(Split {
        id: r.get(0)?,
        transaction_id: r.get(1)?,
        contact_id: r.get(2)?,
        amount: decimal_at(r, 3)?,
        currency: r.get(4)?,
        kind: parsed_at(r, 5)?,
        role: parsed_at(r, 6)?,
        created_by: r.get(7)?,
        created_at: stamp_at(r, 8)?,
    })
}

/// Run `f` as one write unit. Reuses the caller's transaction when one is
/// already open on `conn`; otherwise takes the write lock up front so two
/// settlements cannot allocate against the same debts concurrently.
pub fn atomic<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    scoped(conn, TransactionBehavior::Immediate, f)
}

/// Run `f` against a single read snapshot.
pub fn snapshot<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    scoped(conn, TransactionBehavior::Deferred, f)
}

fn scoped<T>(
    conn: &Connection,
    behavior: TransactionBehavior,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = SqlTransaction::new_unchecked(conn, behavior)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

// Settings

pub fn get_base_currency(conn: &Connection) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='base_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('base_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy],
    )?;
    Ok(())
}

// Profiles

pub fn insert_profile(conn: &Connection, name: &str, base_currency: &str) -> Result<ProfileId> {
    conn.execute(
        "INSERT INTO profiles(name, base_currency) VALUES (?1, ?2)",
        params![name, base_currency],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_profile(conn: &Connection, id: ProfileId) -> Result<Profile> {
    conn.query_row(
        "SELECT id, name, base_currency FROM profiles WHERE id=?1",
        params![id],
        |r| {
            Ok(Profile {
                id: r.get(0)?,
                name: r.get(1)?,
                base_currency: r.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("profile", id))
}

pub fn update_profile_currency(conn: &Connection, id: ProfileId, ccy: &str) -> Result<()> {
    let n = conn.execute(
        "UPDATE profiles SET base_currency=?1 WHERE id=?2",
        params![ccy, id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("profile", id));
    }
    Ok(())
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare("SELECT id, name, base_currency FROM profiles ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(Profile {
            id: r.get(0)?,
            name: r.get(1)?,
            base_currency: r.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Accounts

pub fn insert_account(
    conn: &Connection,
    owner_id: ProfileId,
    name: &str,
    currency: &str,
    balance: Decimal,
) -> Result<AccountId> {
    conn.execute(
        "INSERT INTO accounts(owner_id, name, currency_code, balance) VALUES (?1, ?2, ?3, ?4)",
        params![owner_id, name, currency, balance.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_account(conn: &Connection, id: AccountId) -> Result<Account> {
    let sql = format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE id=?1");
    conn.query_row(&sql, params![id], account_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("account", id))
}

pub fn accounts_for_owner(conn: &Connection, owner_id: ProfileId) -> Result<Vec<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE owner_id=?1 ORDER BY name");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![owner_id], account_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// The one write the core performs on accounts.
pub fn update_account_balance(conn: &Connection, id: AccountId, balance: Decimal) -> Result<()> {
    let n = conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![balance.to_string(), id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("account", id));
    }
    Ok(())
}

// Contacts

pub fn get_contact(conn: &Connection, id: ContactId) -> Result<Contact> {
    let sql = format!("SELECT {CONTACT_COLS} FROM contacts WHERE id=?1");
    conn.query_row(&sql, params![id], contact_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("contact", id))
}

pub fn contact_for_link(
    conn: &Connection,
    owner_id: ProfileId,
    linked_profile_id: ProfileId,
) -> Result<Option<Contact>> {
    let sql = format!("SELECT {CONTACT_COLS} FROM contacts WHERE owner_id=?1 AND linked_profile_id=?2");
    Ok(conn
        .query_row(&sql, params![owner_id, linked_profile_id], contact_from_row)
        .optional()?)
}

pub fn contacts_for_owner(conn: &Connection, owner_id: ProfileId) -> Result<Vec<Contact>> {
    let sql = format!("SELECT {CONTACT_COLS} FROM contacts WHERE owner_id=?1 ORDER BY id");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![owner_id], contact_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Contacts other people keep that link to `profile_id`.
pub fn contacts_linking_to(conn: &Connection, profile_id: ProfileId) -> Result<Vec<Contact>> {
    let sql = format!(
        "SELECT {CONTACT_COLS} FROM contacts WHERE linked_profile_id=?1 AND owner_id<>?1 ORDER BY id"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![profile_id], contact_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_contact(
    conn: &Connection,
    owner_id: ProfileId,
    name: &str,
    linked_profile_id: Option<ProfileId>,
) -> Result<ContactId> {
    conn.execute(
        "INSERT INTO contacts(owner_id, name, linked_profile_id) VALUES (?1, ?2, ?3)",
        params![owner_id, name, linked_profile_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a linked contact unless the `(owner, linked profile)` pair exists.
/// Returns whether a row was written.
pub fn insert_linked_contact_if_absent(
    conn: &Connection,
    owner_id: ProfileId,
    name: &str,
    linked_profile_id: ProfileId,
) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO contacts(owner_id, name, linked_profile_id) VALUES (?1, ?2, ?3)",
        params![owner_id, name, linked_profile_id],
    )?;
    Ok(n > 0)
}

// Categories

pub fn insert_category(conn: &Connection, name: &str) -> Result<CategoryId> {
    conn.execute("INSERT INTO categories(name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_category(conn: &Connection, id: CategoryId) -> Result<Category> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE id=?1",
        params![id],
        |r| {
            Ok(Category {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("category", id))
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Transactions

/// Insert a transaction row; `tx.id` is ignored and the new id returned.
pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<TransactionId> {
    conn.execute(
        "INSERT INTO transactions(created_by, account_id, to_account_id, payer_contact_id,
             receiver_contact_id, amount, currency_code, kind, category_id, description, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            tx.created_by,
            tx.account_id,
            tx.to_account_id,
            tx.payer_contact_id,
            tx.receiver_contact_id,
            tx.amount.to_string(),
            tx.currency,
            tx.kind.as_str(),
            tx.category_id,
            tx.description,
            format_stamp(&tx.occurred_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_transaction(conn: &Connection, id: TransactionId) -> Result<Transaction> {
    let sql = format!("SELECT {TX_COLS} FROM transactions WHERE id=?1");
    conn.query_row(&sql, params![id], transaction_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("transaction", id))
}

/// Newest first.
pub fn transactions_by_creator(
    conn: &Connection,
    created_by: ProfileId,
    limit: Option<usize>,
) -> Result<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {TX_COLS} FROM transactions WHERE created_by=?1 ORDER BY occurred_at DESC, id DESC"
    );
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![created_by], transaction_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Splits

/// Insert a split row; `split.id` is ignored and the new id returned.
pub fn insert_split(conn: &Connection, split: &Split) -> Result<SplitId> {
    conn.execute(
        "INSERT INTO splits(transaction_id, contact_id, amount, currency_code, kind, role,
             created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            split.transaction_id,
            split.contact_id,
            split.amount.to_string(),
            split.currency,
            split.kind.as_str(),
            split.role.as_str(),
            split.created_by,
            format_stamp(&split.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Oldest first, ties broken by insertion order.
pub fn splits_for_contacts(conn: &Connection, contact_ids: &[ContactId]) -> Result<Vec<Split>> {
    if contact_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; contact_ids.len()].join(",");
    let sql = format!(
        "SELECT {SPLIT_COLS} FROM splits WHERE contact_id IN ({placeholders}) ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(contact_ids.iter()), split_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn splits_for_transaction(conn: &Connection, tx_id: TransactionId) -> Result<Vec<Split>> {
    let sql = format!("SELECT {SPLIT_COLS} FROM splits WHERE transaction_id=?1 ORDER BY created_at, id");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![tx_id], split_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Splits a user authored, plus splits on any contact that belongs to or
/// points at the user.
pub fn splits_visible_to(conn: &Connection, user_id: ProfileId) -> Result<Vec<Split>> {
    let sql = format!(
        "SELECT {} FROM splits s JOIN contacts c ON s.contact_id=c.id
         WHERE s.created_by=?1 OR c.owner_id=?1 OR c.linked_profile_id=?1
         ORDER BY s.created_at, s.id",
        SPLIT_COLS
            .split(", ")
            .map(|c| format!("s.{c}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], split_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Every currency code referenced anywhere in the store.
pub fn distinct_currencies(conn: &Connection) -> Result<Vec<String>> {
    let mut out = Vec::<String>::new();
    for sql in [
        "SELECT DISTINCT base_currency FROM profiles",
        "SELECT DISTINCT currency_code FROM accounts",
        "SELECT DISTINCT currency_code FROM transactions",
        "SELECT DISTINCT currency_code FROM splits",
    ] {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        for row in rows {
            let c: String = row?;
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
    }
    Ok(out)
}
