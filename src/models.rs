// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ProfileId = i64;
pub type AccountId = i64;
pub type ContactId = i64;
pub type CategoryId = i64;
pub type TransactionId = i64;
pub type SplitId = i64;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        ParseEnumError {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub base_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: ProfileId,
    pub name: String,
    pub currency: String,
    /// Cached projection of applied transactions. Never consulted for debts.
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A directed relationship: `owner_id` keeps a row describing a counter-party,
/// optionally linked to that counter-party's own profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub owner_id: ProfileId,
    pub name: String,
    pub linked_profile_id: Option<ProfileId>,
}

/// How the presentation layer points at a counter-party.
///
/// `Reverse` is someone else's contact row that links back to the requesting
/// user; it is only ever read until the resolver maps it onto a canonical
/// contact of the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactRef {
    Native(ContactId),
    Reverse {
        contact_id: ContactId,
        owner_id: ProfileId,
    },
}

impl ContactRef {
    pub fn contact_id(&self) -> ContactId {
        match *self {
            ContactRef::Native(id) => id,
            ContactRef::Reverse { contact_id, .. } => contact_id,
        }
    }
}

impl fmt::Display for ContactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactRef::Native(id) => write!(f, "{}", id),
            ContactRef::Reverse { contact_id, .. } => write!(f, "r{}", contact_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    Settlement,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
            TransactionKind::Transfer => "TRANSFER",
            TransactionKind::Settlement => "SETTLEMENT",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            "TRANSFER" => Ok(TransactionKind::Transfer),
            "SETTLEMENT" => Ok(TransactionKind::Settlement),
            _ => Err(ParseEnumError::new("transaction kind", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitKind {
    Debt,
    Payment,
}

impl SplitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitKind::Debt => "DEBT",
            SplitKind::Payment => "PAYMENT",
        }
    }
}

impl FromStr for SplitKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBT" => Ok(SplitKind::Debt),
            "PAYMENT" => Ok(SplitKind::Payment),
            _ => Err(ParseEnumError::new("split kind", s)),
        }
    }
}

/// Which way money moved for the author of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Payer,
    Receiver,
}

impl Role {
    /// Role of a split's author, decided once when the split is written.
    ///
    /// An expense means the author paid. A settlement names the other side
    /// either as receiver (so the author paid) or as payer (so the author
    /// received). Anything else means the author received.
    pub fn of_author(
        kind: TransactionKind,
        payer_contact_id: Option<ContactId>,
        receiver_contact_id: Option<ContactId>,
    ) -> Role {
        match kind {
            TransactionKind::Expense => Role::Payer,
            TransactionKind::Settlement => {
                if receiver_contact_id.is_none() && payer_contact_id.is_some() {
                    Role::Receiver
                } else {
                    Role::Payer
                }
            }
            TransactionKind::Income | TransactionKind::Transfer => Role::Receiver,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Payer => "payer",
            Role::Receiver => "receiver",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "payer" => Ok(Role::Payer),
            "receiver" => Ok(Role::Receiver),
            _ => Err(ParseEnumError::new("split role", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub created_by: ProfileId,
    pub account_id: Option<AccountId>,
    pub to_account_id: Option<AccountId>,
    pub payer_contact_id: Option<ContactId>,
    pub receiver_contact_id: Option<ContactId>,
    pub amount: Decimal,
    pub currency: String,
    pub kind: TransactionKind,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub id: SplitId,
    pub transaction_id: TransactionId,
    pub contact_id: ContactId,
    pub amount: Decimal,
    pub currency: String,
    pub kind: SplitKind,
    pub role: Role,
    pub created_by: ProfileId,
    pub created_at: DateTime<Utc>,
}

/// Signed net per currency. Positive: the counter-party owes the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub currency: String,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_follows_transaction_kind() {
        assert_eq!(Role::of_author(TransactionKind::Expense, None, None), Role::Payer);
        assert_eq!(Role::of_author(TransactionKind::Income, None, None), Role::Receiver);
        assert_eq!(
            Role::of_author(TransactionKind::Settlement, None, Some(7)),
            Role::Payer
        );
        assert_eq!(
            Role::of_author(TransactionKind::Settlement, Some(7), None),
            Role::Receiver
        );
    }

    #[test]
    fn contact_ref_display_tags_reverse() {
        assert_eq!(ContactRef::Native(4).to_string(), "4");
        let r = ContactRef::Reverse {
            contact_id: 9,
            owner_id: 2,
        };
        assert_eq!(r.to_string(), "r9");
        assert_eq!(r.contact_id(), 9);
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("expense".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert_eq!("Payment".parse::<SplitKind>(), Ok(SplitKind::Payment));
        assert!("loan".parse::<TransactionKind>().is_err());
    }
}
