// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::balances::relationship_balance;
use crate::contacts;
use crate::error::Result;
use crate::fx::{RateTable, normalize_code};
use crate::models::{CategoryId, ProfileId, SplitKind, Transaction, TransactionId, TransactionKind};
use crate::store;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub currency: String,
    pub total_balance: Decimal,
    pub owed_to_you: Decimal,
    pub you_owe: Decimal,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net_savings: Decimal,
    pub assets: Decimal,
    pub liabilities: Decimal,
    pub net_worth: Decimal,
    pub per_category: BTreeMap<String, Decimal>,
}

/// The user's own base currency.
pub fn reporting_currency_for(conn: &Connection, user_id: ProfileId) -> Result<String> {
    Ok(store::get_profile(conn, user_id)?.base_currency)
}

struct CategoryNames<'c> {
    conn: &'c Connection,
    cache: HashMap<CategoryId, String>,
}

impl<'c> CategoryNames<'c> {
    fn name(&mut self, id: Option<CategoryId>) -> Result<String> {
        let Some(id) = id else {
            return Ok(UNCATEGORIZED.to_string());
        };
        if let Some(n) = self.cache.get(&id) {
            return Ok(n.clone());
        }
        let n = store::get_category(self.conn, id)?.name;
        self.cache.insert(id, n.clone());
        Ok(n)
    }
}

/// Roll accounts, transactions and splits into one reporting currency.
///
/// Money fronted for others on an expense is a receivable, so only the
/// user's share counts as expense. Debts other people recorded against the
/// user for their expenses are the user's expense too.
#[instrument(skip(conn))]
pub fn summarize(
    conn: &Connection,
    user_id: ProfileId,
    reporting_currency: &str,
) -> Result<DashboardSummary> {
    let currency = normalize_code(reporting_currency);
    store::snapshot(conn, |conn| {
        store::get_profile(conn, user_id)?;
        let rates = RateTable::load(conn)?;
        rates.rate(&currency)?;
        let to_reporting = |amount: Decimal, from: &str| rates.convert(amount, from, &currency);
        let mut categories = CategoryNames {
            conn,
            cache: HashMap::new(),
        };

        let mut total_balance = Decimal::ZERO;
        for account in store::accounts_for_owner(conn, user_id)? {
            total_balance += to_reporting(account.balance, &account.currency)?;
        }

        let mut income = Decimal::ZERO;
        let mut expenses = Decimal::ZERO;
        let mut per_category: BTreeMap<String, Decimal> = BTreeMap::new();

        for tx in store::transactions_by_creator(conn, user_id, None)? {
            let amount = to_reporting(tx.amount, &tx.currency)?;
            match tx.kind {
                TransactionKind::Income => income += amount,
                TransactionKind::Expense => {
                    let mut fronted = Decimal::ZERO;
                    for s in store::splits_for_transaction(conn, tx.id)? {
                        if s.kind == SplitKind::Debt {
                            fronted += to_reporting(s.amount, &s.currency)?;
                        }
                    }
                    let own = (amount - fronted).max(Decimal::ZERO);
                    expenses += own;
                    *per_category
                        .entry(categories.name(tx.category_id)?)
                        .or_insert(Decimal::ZERO) += own;
                }
                TransactionKind::Transfer | TransactionKind::Settlement => {}
            }
        }

        // expenses someone else paid and charged to the user
        let mut parents: HashMap<TransactionId, Transaction> = HashMap::new();
        for theirs in store::contacts_linking_to(conn, user_id)? {
            for s in store::splits_for_contacts(conn, &[theirs.id])? {
                if s.kind != SplitKind::Debt || s.created_by != theirs.owner_id {
                    continue;
                }
                if !parents.contains_key(&s.transaction_id) {
                    let tx = store::get_transaction(conn, s.transaction_id)?;
                    parents.insert(s.transaction_id, tx);
                }
                let tx = &parents[&s.transaction_id];
                if tx.kind != TransactionKind::Expense {
                    continue;
                }
                let share = to_reporting(s.amount, &s.currency)?;
                expenses += share;
                *per_category
                    .entry(categories.name(tx.category_id)?)
                    .or_insert(Decimal::ZERO) += share;
            }
        }

        let mut owed_to_you = Decimal::ZERO;
        let mut you_owe = Decimal::ZERO;
        for view in contacts::list_contacts(conn, user_id)? {
            let rel = contacts::relationship(conn, user_id, &view.reference)?;
            for (ccy, amount) in relationship_balance(conn, &rel)? {
                let v = to_reporting(amount, &ccy)?;
                if v > Decimal::ZERO {
                    owed_to_you += v;
                } else {
                    you_owe -= v;
                }
            }
        }

        let assets = total_balance + owed_to_you;
        let liabilities = you_owe;
        debug!(%income, %expenses, %assets, %liabilities, "dashboard computed");
        Ok(DashboardSummary {
            currency: currency.clone(),
            total_balance,
            owed_to_you,
            you_owe,
            income,
            expenses,
            net_savings: income - expenses,
            assets,
            liabilities,
            net_worth: assets - liabilities,
            per_category,
        })
    })
}
