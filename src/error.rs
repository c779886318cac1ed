// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures surfaced by the reconciliation core.
///
/// Nothing in the core recovers from these locally.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A contact reference could not be mapped to exactly one profile.
    #[error("contact {0} cannot be resolved to a single counter-party")]
    AmbiguousContact(i64),

    #[error("unknown currency code '{0}'")]
    UnknownCurrency(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("store failure: {0}")]
    StoreFailure(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
