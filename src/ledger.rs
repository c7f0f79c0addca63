// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Every logical operation the storage layer offers its callers.

use std::sync::Arc;

use crate::budgets::BudgetStore;
use crate::categories::CategoryStore;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::events::{EventSink, TracingSink};
use crate::ids::{IdAllocator, IdSource};
use crate::kv::KvBackend;
use crate::models::{
    Budgets, Category, LocateHint, NewCategory, NewTransaction, Period, Transaction,
    TransactionPatch,
};
use crate::stats::{summarize, PeriodSummary};
use crate::store::RecordStore;

pub struct Ledger {
    transactions: RecordStore,
    categories: CategoryStore,
    budgets: BudgetStore,
}

impl Ledger {
    pub fn new(backend: Arc<dyn KvBackend>, config: StoreConfig) -> Result<Self> {
        Self::with_sink(backend, config, Arc::new(TracingSink))
    }

    pub fn with_sink(
        backend: Arc<dyn KvBackend>,
        config: StoreConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let category_ids = IdAllocator::random(config.id_regenerations);
        Ok(Self {
            categories: CategoryStore::new(backend.clone(), category_ids),
            budgets: BudgetStore::new(backend.clone()),
            transactions: RecordStore::new(backend, config, sink)?,
        })
    }

    /// Replaces the transaction id generator.
    pub fn with_id_source(mut self, source: Box<dyn IdSource>) -> Self {
        self.transactions = self.transactions.with_id_source(source);
        self
    }

    pub fn records(&self) -> &RecordStore {
        &self.transactions
    }

    pub async fn list_transactions(&self, period: Period) -> Result<Vec<Transaction>> {
        self.transactions.list(period).await
    }

    pub async fn create_transaction(&self, input: &NewTransaction) -> Result<Transaction> {
        self.transactions.create(input).await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
        hint: &LocateHint,
    ) -> Result<Transaction> {
        self.transactions.update(id, patch, hint).await
    }

    pub async fn delete_transaction(&self, id: &str, hint: &LocateHint) -> Result<Transaction> {
        self.transactions.delete(id, hint).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.categories.list().await
    }

    pub async fn create_category(&self, input: &NewCategory) -> Result<Category> {
        self.categories.create(input).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<Category> {
        self.categories.delete(id).await
    }

    pub async fn get_budgets(&self) -> Result<Budgets> {
        self.budgets.get().await
    }

    pub async fn set_budgets(&self, budgets: &Budgets) -> Result<Budgets> {
        self.budgets.set(budgets).await
    }

    pub async fn summarize(&self, period: Period) -> Result<PeriodSummary> {
        let records = self.transactions.list(period).await?;
        let categories = self.categories.load().await?;
        Ok(summarize(period, &records, &categories))
    }
}
