// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Settlement allocation.
//!
//! A lump-sum payment is spread over the outstanding debts of one
//! relationship by a fixed waterfall:
//!
//! 1. debts in the payment currency, oldest first;
//! 2. debts in other currencies, oldest first, each paid in the debt's own
//!    currency at the rate of the moment;
//! 3. whatever is left becomes a credit in the payment currency.
//!
//! The PAYMENT splits written by [`settle`] are the only record of an
//! allocation. How much of a debt is still open is re-derived by replaying
//! earlier payments of the same currency against debts oldest-first.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::balances::EPSILON;
use crate::contacts;
use crate::error::Result;
use crate::fx::{RateTable, normalize_code};
use crate::ledger::{apply_account_delta, ensure_positive, owned_account};
use crate::models::{
    AccountId, ContactRef, ParseEnumError, ProfileId, Role, Split, SplitId, SplitKind,
    Transaction, TransactionKind,
};
use crate::store;

/// Which way the settlement money moves, seen from the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The user pays the counter-party, clearing debts the counter-party recorded.
    YouPay,
    /// The counter-party pays the user, clearing debts the user recorded.
    TheyPay,
}

impl Direction {
    pub fn role(self) -> Role {
        match self {
            Direction::YouPay => Role::Payer,
            Direction::TheyPay => Role::Receiver,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::YouPay => write!(f, "you_pay"),
            Direction::TheyPay => write!(f, "they_pay"),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "you_pay" | "pay" => Ok(Direction::YouPay),
            "they_pay" | "receive" => Ok(Direction::TheyPay),
            _ => Err(ParseEnumError::new("settlement direction", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutstandingDebt {
    pub split_id: SplitId,
    pub currency: String,
    pub amount: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SameCurrency,
    CrossCurrency,
    Credit,
}

/// One PAYMENT split the allocator wants written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSplit {
    /// The debt this slice pays down; `None` for a credit.
    pub debt_split_id: Option<SplitId>,
    pub amount: Decimal,
    pub currency: String,
    pub phase: Phase,
}

/// Debts of the relationship that `direction` settles, oldest first, with
/// what is still open after replaying earlier payments in the same
/// direction. Fully covered debts are left out.
pub fn outstanding_debts(
    user_id: ProfileId,
    counterparty: Option<ProfileId>,
    direction: Direction,
    splits: &[Split],
) -> Vec<OutstandingDebt> {
    let debt_author_matches = |author: ProfileId| match direction {
        Direction::YouPay => author != user_id && Some(author) == counterparty,
        Direction::TheyPay => author == user_id,
    };

    let mut ordered: Vec<&Split> = splits.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut paid: BTreeMap<&str, Decimal> = BTreeMap::new();
    for s in &ordered {
        // the other side records the same movement with the opposite role
        let same_way = if s.created_by == user_id {
            s.role == direction.role()
        } else {
            Some(s.created_by) == counterparty && s.role != direction.role()
        };
        if s.kind == SplitKind::Payment && same_way {
            *paid.entry(s.currency.as_str()).or_insert(Decimal::ZERO) += s.amount;
        }
    }

    let mut out = Vec::new();
    for s in ordered {
        if s.kind != SplitKind::Debt || !debt_author_matches(s.created_by) {
            continue;
        }
        let pool = paid.entry(s.currency.as_str()).or_insert(Decimal::ZERO);
        let applied = (*pool).min(s.amount);
        *pool -= applied;
        let remaining = s.amount - applied;
        if remaining > EPSILON {
            out.push(OutstandingDebt {
                split_id: s.id,
                currency: s.currency.clone(),
                amount: s.amount,
                remaining,
            });
        }
    }
    out
}

/// Run the three-phase waterfall over `debts` (already oldest first).
pub fn plan_allocation(
    debts: &[OutstandingDebt],
    amount: Decimal,
    currency: &str,
    rates: &RateTable,
) -> Result<Vec<PaymentSplit>> {
    ensure_positive(amount, "payment amount")?;
    rates.rate(currency)?;
    let currency = normalize_code(currency);
    let mut remaining = amount;
    let mut out = Vec::new();

    // any positive slice is written; only the leftover credit is held to a cent
    for debt in debts.iter().filter(|d| d.currency == currency) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let slice = remaining.min(debt.remaining);
        if slice > Decimal::ZERO {
            out.push(PaymentSplit {
                debt_split_id: Some(debt.split_id),
                amount: slice,
                currency: currency.clone(),
                phase: Phase::SameCurrency,
            });
            remaining -= slice;
        }
    }

    for debt in debts.iter().filter(|d| d.currency != currency) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let available = rates.convert(remaining, &currency, &debt.currency)?;
        let slice = available.min(debt.remaining);
        if slice > Decimal::ZERO {
            out.push(PaymentSplit {
                debt_split_id: Some(debt.split_id),
                amount: slice,
                currency: debt.currency.clone(),
                phase: Phase::CrossCurrency,
            });
            if slice == available {
                // the whole rest went into this debt; converting back would leave dust
                remaining = Decimal::ZERO;
            } else {
                let used = rates.convert(slice, &debt.currency, &currency)?;
                remaining = (remaining - used).max(Decimal::ZERO);
            }
        }
    }

    if remaining > EPSILON {
        out.push(PaymentSplit {
            debt_split_id: None,
            amount: remaining,
            currency,
            phase: Phase::Credit,
        });
    }
    Ok(out)
}

/// Plan how a payment of `amount` in `currency` would be spread over the
/// relationship's open debts. Reads only.
#[instrument(skip(conn), fields(reference = %reference, amount = %amount))]
pub fn allocate(
    conn: &Connection,
    user_id: ProfileId,
    reference: &ContactRef,
    amount: Decimal,
    currency: &str,
    direction: Direction,
) -> Result<Vec<PaymentSplit>> {
    ensure_positive(amount, "payment amount")?;
    store::snapshot(conn, |conn| {
        let rates = RateTable::load(conn)?;
        let rel = contacts::relationship(conn, user_id, reference)?;
        let splits = store::splits_for_contacts(conn, &rel.contact_ids())?;
        let debts = outstanding_debts(user_id, rel.counterparty, direction, &splits);
        debug!(open_debts = debts.len(), "debts collected");
        plan_allocation(&debts, amount, currency, &rates)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub contact: ContactRef,
    /// Account the money leaves (you pay) or lands in (they pay). Its
    /// currency is the payment currency.
    pub account_id: AccountId,
    pub amount: Decimal,
    pub direction: Direction,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementPreview {
    pub splits: Vec<PaymentSplit>,
    pub payment_currency: String,
    /// Signed change to the account balance, in the account's currency.
    pub account_delta: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub transaction: Transaction,
    pub splits: Vec<Split>,
    pub allocation: Vec<PaymentSplit>,
}

fn signed_account_delta(direction: Direction, amount: Decimal) -> Decimal {
    match direction {
        Direction::YouPay => -amount,
        Direction::TheyPay => amount,
    }
}

/// What [`settle`] would write, without writing it.
pub fn preview_settlement(
    conn: &Connection,
    user_id: ProfileId,
    req: &SettlementRequest,
) -> Result<SettlementPreview> {
    ensure_positive(req.amount, "payment amount")?;
    store::snapshot(conn, |conn| {
        let account = owned_account(conn, user_id, req.account_id)?;
        let splits = allocate(
            conn,
            user_id,
            &req.contact,
            req.amount,
            &account.currency,
            req.direction,
        )?;
        Ok(SettlementPreview {
            splits,
            account_delta: signed_account_delta(req.direction, req.amount),
            payment_currency: account.currency,
        })
    })
}

/// Allocate a payment and write it: one SETTLEMENT transaction, its PAYMENT
/// splits on the user's canonical contact, and the account movement.
#[instrument(skip(conn, req), fields(reference = %req.contact, amount = %req.amount, direction = %req.direction))]
pub fn settle(conn: &Connection, user_id: ProfileId, req: &SettlementRequest) -> Result<Settlement> {
    ensure_positive(req.amount, "payment amount")?;
    store::atomic(conn, |conn| {
        let rates = RateTable::load(conn)?;
        let account = owned_account(conn, user_id, req.account_id)?;
        let currency = account.currency.clone();
        let canonical = contacts::resolve(conn, user_id, &req.contact)?;

        let native = ContactRef::Native(canonical);
        let allocation = allocate(conn, user_id, &native, req.amount, &currency, req.direction)?;

        let (payer_contact_id, receiver_contact_id) = match req.direction {
            Direction::YouPay => (None, Some(canonical)),
            Direction::TheyPay => (Some(canonical), None),
        };
        let role = Role::of_author(
            TransactionKind::Settlement,
            payer_contact_id,
            receiver_contact_id,
        );
        let description = req.description.clone().unwrap_or_else(|| {
            match req.direction {
                Direction::YouPay => "Payment sent",
                Direction::TheyPay => "Payment received",
            }
            .to_string()
        });

        let now = Utc::now();
        let mut transaction = Transaction {
            id: 0,
            created_by: user_id,
            account_id: Some(account.id),
            to_account_id: None,
            payer_contact_id,
            receiver_contact_id,
            amount: req.amount,
            currency: currency.clone(),
            kind: TransactionKind::Settlement,
            category_id: None,
            description: Some(description),
            occurred_at: now,
        };
        transaction.id = store::insert_transaction(conn, &transaction)?;

        let mut splits = Vec::with_capacity(allocation.len());
        for slice in &allocation {
            let mut split = Split {
                id: 0,
                transaction_id: transaction.id,
                contact_id: canonical,
                amount: slice.amount,
                currency: slice.currency.clone(),
                kind: SplitKind::Payment,
                role,
                created_by: user_id,
                created_at: now,
            };
            split.id = store::insert_split(conn, &split)?;
            splits.push(split);
        }

        apply_account_delta(
            conn,
            &rates,
            &account,
            signed_account_delta(req.direction, req.amount),
            &currency,
        )?;

        info!(
            transaction_id = transaction.id,
            contact_id = canonical,
            slices = splits.len(),
            "settlement recorded"
        );
        Ok(Settlement {
            transaction,
            splits,
            allocation,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn debt(id: SplitId, ccy: &str, remaining: &str) -> OutstandingDebt {
        OutstandingDebt {
            split_id: id,
            currency: ccy.into(),
            amount: dec(remaining),
            remaining: dec(remaining),
        }
    }

    fn ab_rates() -> RateTable {
        RateTable::empty()
            .with_rate("AAA", dec("2.0"))
            .unwrap()
            .with_rate("BBB", dec("3.0"))
            .unwrap()
    }

    #[test]
    fn same_currency_is_paid_oldest_first() {
        let debts = [debt(1, "USD", "30"), debt(2, "USD", "50")];
        let plan = plan_allocation(&debts, dec("40"), "USD", &RateTable::default()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].debt_split_id, Some(1));
        assert_eq!(plan[0].amount, dec("30"));
        assert_eq!(plan[1].debt_split_id, Some(2));
        assert_eq!(plan[1].amount, dec("10"));
    }

    #[test]
    fn cross_currency_locks_rate_in_debt_currency() {
        let debts = [debt(7, "AAA", "100")];
        let plan = plan_allocation(&debts, dec("60"), "BBB", &ab_rates()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].currency, "AAA");
        assert_eq!(plan[0].amount, dec("40"));
        assert_eq!(plan[0].phase, Phase::CrossCurrency);
    }

    #[test]
    fn same_currency_beats_older_cross_currency_debt() {
        let debts = [debt(1, "AAA", "10"), debt(2, "BBB", "9")];
        let plan = plan_allocation(&debts, dec("9"), "BBB", &ab_rates()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].debt_split_id, Some(2));
    }

    #[test]
    fn overpayment_becomes_credit() {
        let debts = [debt(1, "USD", "60"), debt(2, "USD", "40")];
        let plan = plan_allocation(&debts, dec("150"), "USD", &RateTable::default()).unwrap();
        let credit = plan.last().unwrap();
        assert_eq!(credit.phase, Phase::Credit);
        assert_eq!(credit.debt_split_id, None);
        assert_eq!(credit.amount, dec("50"));
    }

    #[test]
    fn one_cent_payment_still_reaches_the_debt() {
        let debts = [debt(1, "USD", "5")];
        let plan = plan_allocation(&debts, dec("0.01"), "USD", &RateTable::default()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].debt_split_id, Some(1));
        assert_eq!(plan[0].amount, dec("0.01"));
    }

    #[test]
    fn cross_currency_tail_leaves_no_dust_credit() {
        let debts = [debt(1, "AAA", "100"), debt(2, "BBB", "50")];
        let rates = RateTable::empty()
            .with_rate("AAA", dec("1"))
            .unwrap()
            .with_rate("BBB", dec("7"))
            .unwrap()
            .with_rate("CCC", dec("3"))
            .unwrap();
        let plan = plan_allocation(&debts, dec("10"), "CCC", &rates).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].debt_split_id, Some(1));
        assert_eq!(
            plan[0].amount,
            rates.convert(dec("10"), "CCC", "AAA").unwrap()
        );
    }

    #[test]
    fn non_positive_payment_is_rejected() {
        let err = plan_allocation(&[], Decimal::ZERO, "USD", &RateTable::default());
        assert!(matches!(err, Err(crate::error::LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn direction_parses_cli_spellings() {
        assert_eq!("pay".parse::<Direction>().unwrap(), Direction::YouPay);
        assert_eq!("they-pay".parse::<Direction>().unwrap(), Direction::TheyPay);
        assert!("gift".parse::<Direction>().is_err());
    }
}
