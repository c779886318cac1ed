// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod balances;
pub mod categories;
pub mod contacts;
pub mod dashboard;
pub mod doctor;
pub mod exporter;
pub mod fx;
pub mod profiles;
pub mod settle;
pub mod transactions;
