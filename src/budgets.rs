// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::{Result, StoreError};
use crate::kv::{read_json, write_json, KvBackend};
use crate::models::Budgets;

pub const BUDGETS_KEY: &str = "budgets";

/// Single budget document; every `set` replaces it whole.
pub struct BudgetStore {
    backend: Arc<dyn KvBackend>,
}

impl BudgetStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub async fn get(&self) -> Result<Budgets> {
        read_json(self.backend.as_ref(), BUDGETS_KEY).await
    }

    pub async fn set(&self, budgets: &Budgets) -> Result<Budgets> {
        if let Some((key, amount)) = budgets.iter().find(|(_, v)| **v < Decimal::ZERO) {
            return Err(StoreError::validation(format!(
                "budget for '{}' must not be negative, got {}",
                key, amount
            )));
        }
        if budgets.keys().any(|k| k.trim().is_empty()) {
            return Err(StoreError::validation("budget keys must not be empty"));
        }
        write_json(self.backend.as_ref(), BUDGETS_KEY, budgets).await?;
        Ok(budgets.clone())
    }
}
