// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The append-only split ledger.
//!
//! A transaction and its splits are written as one unit together with the
//! account balance change they imply. Nothing here is ever edited afterwards.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::contacts;
use crate::error::{LedgerError, Result};
use crate::fx::{RateTable, normalize_code};
use crate::models::{
    Account, AccountId, CategoryId, ContactRef, Profile, ProfileId, Role, Split, SplitKind,
    Transaction, TransactionKind,
};
use crate::store;

#[derive(Debug, Clone, PartialEq)]
pub struct NewSplit {
    pub contact: ContactRef,
    pub amount: Decimal,
    pub kind: SplitKind,
}

impl NewSplit {
    pub fn debt(contact: ContactRef, amount: Decimal) -> Self {
        NewSplit {
            contact,
            amount,
            kind: SplitKind::Debt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub account_id: Option<AccountId>,
    /// Destination account of a transfer.
    pub to_account_id: Option<AccountId>,
    pub payer: Option<ContactRef>,
    pub receiver: Option<ContactRef>,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub splits: Vec<NewSplit>,
}

impl NewTransaction {
    pub fn new(kind: TransactionKind, amount: Decimal, currency: &str) -> Self {
        NewTransaction {
            kind,
            amount,
            currency: normalize_code(currency),
            account_id: None,
            to_account_id: None,
            payer: None,
            receiver: None,
            category_id: None,
            description: None,
            occurred_at: None,
            splits: Vec::new(),
        }
    }

    pub fn account(mut self, id: AccountId) -> Self {
        self.account_id = Some(id);
        self
    }

    pub fn to_account(mut self, id: AccountId) -> Self {
        self.to_account_id = Some(id);
        self
    }

    pub fn category(mut self, id: CategoryId) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    pub fn split(mut self, split: NewSplit) -> Self {
        self.splits.push(split);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recorded {
    pub transaction: Transaction,
    pub splits: Vec<Split>,
}

pub fn ensure_positive(amount: Decimal, what: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "{} must be positive, got {}",
            what, amount
        )));
    }
    Ok(())
}

// Profiles, accounts, categories

pub fn create_profile(conn: &Connection, name: &str, base_currency: &str) -> Result<Profile> {
    let code = normalize_code(base_currency);
    RateTable::load(conn)?.rate(&code)?;
    let id = store::insert_profile(conn, name.trim(), &code)?;
    info!(profile_id = id, "profile created");
    store::get_profile(conn, id)
}

/// Change the currency the user's reports are shown in. Stored amounts are
/// untouched.
pub fn set_profile_currency(conn: &Connection, user_id: ProfileId, currency: &str) -> Result<Profile> {
    store::atomic(conn, |conn| {
        let code = normalize_code(currency);
        RateTable::load(conn)?.rate(&code)?;
        store::update_profile_currency(conn, user_id, &code)?;
        info!(profile_id = user_id, currency = %code, "profile currency changed");
        store::get_profile(conn, user_id)
    })
}

pub fn create_account(
    conn: &Connection,
    owner_id: ProfileId,
    name: &str,
    currency: &str,
    opening_balance: Decimal,
) -> Result<Account> {
    store::atomic(conn, |conn| {
        store::get_profile(conn, owner_id)?;
        let code = normalize_code(currency);
        RateTable::load(conn)?.rate(&code)?;
        let id = store::insert_account(conn, owner_id, name.trim(), &code, opening_balance)?;
        info!(account_id = id, owner_id, currency = %code, "account created");
        store::get_account(conn, id)
    })
}

pub fn list_accounts(conn: &Connection, owner_id: ProfileId) -> Result<Vec<Account>> {
    store::accounts_for_owner(conn, owner_id)
}

pub fn create_category(conn: &Connection, name: &str) -> Result<CategoryId> {
    store::insert_category(conn, name.trim())
}

/// Look up an account and make sure `user_id` owns it. Someone else's
/// account is reported as missing.
pub fn owned_account(conn: &Connection, user_id: ProfileId, id: AccountId) -> Result<Account> {
    let account = store::get_account(conn, id)?;
    if account.owner_id != user_id {
        return Err(LedgerError::not_found("account", id));
    }
    Ok(account)
}

/// Add `delta` (denominated in `currency`) to an account's cached balance.
pub(crate) fn apply_account_delta(
    conn: &Connection,
    rates: &RateTable,
    account: &Account,
    delta: Decimal,
    currency: &str,
) -> Result<Decimal> {
    let converted = rates.convert(delta, currency, &account.currency)?;
    let balance = account.balance + converted;
    store::update_account_balance(conn, account.id, balance)?;
    debug!(account_id = account.id, %converted, %balance, "account balance updated");
    Ok(balance)
}

// Transactions

/// Write a transaction, its splits, and the account movement it implies.
///
/// Split contacts go through the resolver first, so a split aimed at a
/// reverse contact lands on the user's own canonical contact. Each split is
/// stamped with its author's role here, once.
#[instrument(skip(conn, new), fields(kind = new.kind.as_str(), amount = %new.amount, currency = %new.currency))]
pub fn record_transaction(
    conn: &Connection,
    user_id: ProfileId,
    new: &NewTransaction,
) -> Result<Recorded> {
    ensure_positive(new.amount, "transaction amount")?;
    let debt_total: Decimal = new
        .splits
        .iter()
        .filter(|s| s.kind == SplitKind::Debt)
        .map(|s| s.amount)
        .sum();
    for s in &new.splits {
        ensure_positive(s.amount, "split amount")?;
    }
    if debt_total > new.amount {
        return Err(LedgerError::InvalidAmount(format!(
            "splits total {} exceeds transaction amount {}",
            debt_total, new.amount
        )));
    }

    store::atomic(conn, |conn| {
        store::get_profile(conn, user_id)?;
        let rates = RateTable::load(conn)?;
        let currency = normalize_code(&new.currency);
        rates.rate(&currency)?;

        let source = new
            .account_id
            .map(|id| owned_account(conn, user_id, id))
            .transpose()?;
        let destination = match (new.kind, new.to_account_id) {
            (TransactionKind::Transfer, Some(id)) => Some(owned_account(conn, user_id, id)?),
            _ => None,
        };
        if let Some(cat) = new.category_id {
            store::get_category(conn, cat)?;
        }

        let payer_contact_id = new
            .payer
            .as_ref()
            .map(|r| contacts::resolve(conn, user_id, r))
            .transpose()?;
        let receiver_contact_id = new
            .receiver
            .as_ref()
            .map(|r| contacts::resolve(conn, user_id, r))
            .transpose()?;
        let role = Role::of_author(new.kind, payer_contact_id, receiver_contact_id);

        let now = Utc::now();
        let mut transaction = Transaction {
            id: 0,
            created_by: user_id,
            account_id: source.as_ref().map(|a| a.id),
            to_account_id: destination.as_ref().map(|a| a.id),
            payer_contact_id,
            receiver_contact_id,
            amount: new.amount,
            currency: currency.clone(),
            kind: new.kind,
            category_id: new.category_id,
            description: new.description.clone(),
            occurred_at: new.occurred_at.unwrap_or(now),
        };
        transaction.id = store::insert_transaction(conn, &transaction)?;

        let mut splits = Vec::with_capacity(new.splits.len());
        for s in &new.splits {
            let contact_id = contacts::resolve(conn, user_id, &s.contact)?;
            let mut split = Split {
                id: 0,
                transaction_id: transaction.id,
                contact_id,
                amount: s.amount,
                currency: currency.clone(),
                kind: s.kind,
                role: match s.kind {
                    SplitKind::Debt => Role::Payer,
                    SplitKind::Payment => role,
                },
                created_by: user_id,
                created_at: now,
            };
            split.id = store::insert_split(conn, &split)?;
            splits.push(split);
        }

        if let Some(account) = &source {
            let signed = match new.kind {
                TransactionKind::Income => new.amount,
                TransactionKind::Expense | TransactionKind::Transfer => -new.amount,
                TransactionKind::Settlement => match role {
                    Role::Payer => -new.amount,
                    Role::Receiver => new.amount,
                },
            };
            apply_account_delta(conn, &rates, account, signed, &currency)?;
        }
        if let Some(account) = &destination {
            // source and destination may be the same row; re-read it
            let account = store::get_account(conn, account.id)?;
            apply_account_delta(conn, &rates, &account, new.amount, &currency)?;
        }

        info!(
            transaction_id = transaction.id,
            split_count = splits.len(),
            "transaction recorded"
        );
        Ok(Recorded {
            transaction,
            splits,
        })
    })
}

/// The user's transactions, newest first, each with its splits.
pub fn list_transactions(
    conn: &Connection,
    user_id: ProfileId,
    limit: Option<usize>,
) -> Result<Vec<Recorded>> {
    store::snapshot(conn, |conn| {
        let txs = store::transactions_by_creator(conn, user_id, limit)?;
        let mut out = Vec::with_capacity(txs.len());
        for transaction in txs {
            let splits = store::splits_for_transaction(conn, transaction.id)?;
            out.push(Recorded {
                transaction,
                splits,
            });
        }
        Ok(out)
    })
}
