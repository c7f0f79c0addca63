// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod categories;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod ids;
pub mod keys;
pub mod kv;
pub mod ledger;
pub mod migration;
pub mod models;
pub mod stats;
pub mod store;
pub mod utils;

pub use error::{BackendError, Result, StoreError};
pub use ledger::Ledger;
