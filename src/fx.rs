// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed-table currency conversion.
//!
//! Rates are expressed as units of a currency per one USD. Conversion is
//! `amount / rate[from] * rate[to]` at full decimal precision; rounding is
//! left to whoever displays the number.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};

static BUILTIN_RATES: Lazy<BTreeMap<&'static str, Decimal>> = Lazy::new(|| {
    BTreeMap::from([
        ("USD", Decimal::ONE),
        ("INR", Decimal::new(90, 0)),
        ("AED", Decimal::new(367, 2)),
        ("EUR", Decimal::new(92, 2)),
        ("GBP", Decimal::new(79, 2)),
    ])
});

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<String, Decimal>,
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable {
            rates: BUILTIN_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

impl RateTable {
    /// An empty table; every lookup fails until rates are added.
    pub fn empty() -> Self {
        RateTable {
            rates: BTreeMap::new(),
        }
    }

    /// Built-in rates overlaid with whatever `currency_rates` holds.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut table = RateTable::default();
        let mut stmt = conn.prepare_cached("SELECT code, per_usd FROM currency_rates")?;
        let mut rows = stmt.query([])?;
        while let Some(r) = rows.next()? {
            let code: String = r.get(0)?;
            let rate = crate::store::decimal_at(r, 1)?;
            table = table.with_rate(&code, rate)?;
        }
        Ok(table)
    }

    pub fn with_rate(mut self, code: &str, per_usd: Decimal) -> Result<Self> {
        if per_usd <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "rate for {} must be positive, got {}",
                code, per_usd
            )));
        }
        self.rates.insert(normalize_code(code), per_usd);
        Ok(self)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(&normalize_code(code))
    }

    pub fn rate(&self, code: &str) -> Result<Decimal> {
        self.rates
            .get(&normalize_code(code))
            .copied()
            .ok_or_else(|| LedgerError::UnknownCurrency(code.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> + '_ {
        self.rates.iter().map(|(c, r)| (c.as_str(), *r))
    }

    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal> {
        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;
        if normalize_code(from) == normalize_code(to) {
            return Ok(amount);
        }
        amount
            .checked_div(from_rate)
            .and_then(|usd| usd.checked_mul(to_rate))
            .ok_or_else(|| {
                LedgerError::InvalidAmount(format!(
                    "{} {} overflows when converted to {}",
                    amount, from, to
                ))
            })
    }
}

/// Persist an override for one currency's rate.
pub fn set_rate(conn: &Connection, code: &str, per_usd: Decimal) -> Result<()> {
    // validates sign before touching the table
    RateTable::empty().with_rate(code, per_usd)?;
    conn.execute(
        "INSERT INTO currency_rates(code, per_usd) VALUES (?1, ?2)
         ON CONFLICT(code) DO UPDATE SET per_usd=excluded.per_usd",
        params![normalize_code(code), per_usd.to_string()],
    )?;
    tracing::info!(code = %normalize_code(code), %per_usd, "currency rate set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn converts_through_usd_reference() {
        let t = RateTable::default();
        assert_eq!(t.convert(dec("90"), "INR", "USD").unwrap(), dec("1"));
        let eur = t.convert(dec("100"), "USD", "EUR").unwrap();
        assert_eq!(eur.round_dp(2), dec("92.00"));
    }

    #[test]
    fn unknown_code_is_an_error_not_a_default() {
        let t = RateTable::default();
        match t.convert(dec("10"), "XYZ", "USD") {
            Err(LedgerError::UnknownCurrency(c)) => assert_eq!(c, "XYZ"),
            other => panic!("expected UnknownCurrency, got {:?}", other),
        }
        assert!(matches!(
            t.convert(dec("10"), "USD", "XYZ"),
            Err(LedgerError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn same_currency_is_identity() {
        let t = RateTable::default();
        assert_eq!(t.convert(dec("12.345"), "gbp", "GBP").unwrap(), dec("12.345"));
    }

    #[test]
    fn rejects_non_positive_rates() {
        assert!(RateTable::default().with_rate("JPY", Decimal::ZERO).is_err());
        let t = RateTable::empty().with_rate("A", dec("2")).unwrap();
        assert!(t.contains("a"));
        assert!(!t.contains("USD"));
    }
}
