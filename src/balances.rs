// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-currency balances between a user and one counter-party, recomputed
//! from the split ledger on every call.

use std::collections::BTreeMap;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::contacts::{self, Relationship};
use crate::error::Result;
use crate::fx::RateTable;
use crate::models::{ContactRef, CurrencyBalance, ProfileId, Role, Split, SplitKind};
use crate::store;

/// One cent. Totals smaller than this are treated as settled.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Effect of one split on the balance seen by `user_id`.
///
/// From the author's side a DEBT, or a PAYMENT the author made, moves the
/// balance up; a PAYMENT the author received moves it down. A split authored
/// by the counter-party counts with the opposite sign.
pub fn signed_effect(user_id: ProfileId, split: &Split) -> Decimal {
    let authored = match (split.kind, split.role) {
        (SplitKind::Debt, _) | (SplitKind::Payment, Role::Payer) => split.amount,
        (SplitKind::Payment, Role::Receiver) => -split.amount,
    };
    if split.created_by == user_id {
        authored
    } else {
        -authored
    }
}

/// Sum the splits of a relationship per currency, dropping settled totals.
pub fn fold_splits<'a>(
    user_id: ProfileId,
    counterparty: Option<ProfileId>,
    splits: impl IntoIterator<Item = &'a Split>,
) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for split in splits {
        if split.created_by != user_id && Some(split.created_by) != counterparty {
            warn!(
                split_id = split.id,
                author = split.created_by,
                "split authored outside the relationship ignored"
            );
            continue;
        }
        *totals.entry(split.currency.clone()).or_insert(Decimal::ZERO) +=
            signed_effect(user_id, split);
    }
    totals.retain(|_, v| v.abs() >= EPSILON);
    totals
}

pub(crate) fn relationship_balance(
    conn: &Connection,
    rel: &Relationship,
) -> Result<BTreeMap<String, Decimal>> {
    let splits = store::splits_for_contacts(conn, &rel.contact_ids())?;
    Ok(fold_splits(rel.user_id, rel.counterparty, &splits))
}

/// Signed balance per currency between `user_id` and the referenced
/// counter-party. Positive means the counter-party owes the user.
#[instrument(skip(conn), fields(reference = %reference))]
pub fn balance(
    conn: &Connection,
    user_id: ProfileId,
    reference: &ContactRef,
) -> Result<BTreeMap<String, Decimal>> {
    store::snapshot(conn, |conn| {
        let rel = contacts::relationship(conn, user_id, reference)?;
        relationship_balance(conn, &rel)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactBalance {
    pub reference: ContactRef,
    pub name: String,
    pub balances: Vec<CurrencyBalance>,
    /// All currencies converted into the reporting currency.
    pub total: Decimal,
    pub total_currency: String,
}

pub fn to_currency_balances(map: &BTreeMap<String, Decimal>) -> Vec<CurrencyBalance> {
    map.iter()
        .map(|(currency, amount)| CurrencyBalance {
            currency: currency.clone(),
            amount: *amount,
        })
        .collect()
}

/// Balances for every contact in the user's list, native and virtual.
pub fn contact_balances(
    conn: &Connection,
    user_id: ProfileId,
    reporting_currency: &str,
) -> Result<Vec<ContactBalance>> {
    store::snapshot(conn, |conn| {
        let rates = RateTable::load(conn)?;
        rates.rate(reporting_currency)?;
        let mut out = Vec::new();
        for view in contacts::list_contacts(conn, user_id)? {
            let rel = contacts::relationship(conn, user_id, &view.reference)?;
            let map = relationship_balance(conn, &rel)?;
            let mut total = Decimal::ZERO;
            for (currency, amount) in &map {
                total += rates.convert(*amount, currency, reporting_currency)?;
            }
            out.push(ContactBalance {
                reference: view.reference,
                name: view.name,
                balances: to_currency_balances(&map),
                total,
                total_currency: reporting_currency.to_string(),
            });
        }
        Ok(out)
    })
}
