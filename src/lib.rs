// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod balances;
pub mod cli;
pub mod commands;
pub mod contacts;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod fx;
pub mod ledger;
pub mod models;
pub mod settlement;
pub mod store;
pub mod utils;

pub use error::{LedgerError, Result};
