// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Category, Kind, Period, Transaction, DEFAULT_ICON};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: String,
    pub category_name: String,
    pub icon: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    pub expense_by_category: Vec<CategoryTotal>,
    pub income_by_category: Vec<CategoryTotal>,
}

/// Totals for one period. `records` is expected to be merged and
/// deduplicated already. Categories that no longer exist fall back to their
/// raw id and the placeholder icon.
pub fn summarize(period: Period, records: &[Transaction], categories: &[Category]) -> PeriodSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut income: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut expense: BTreeMap<&str, Decimal> = BTreeMap::new();

    for t in records {
        let (total, by_category) = match t.kind {
            Kind::Income => (&mut total_income, &mut income),
            Kind::Expense => (&mut total_expense, &mut expense),
        };
        *total += t.amount;
        *by_category.entry(t.category.as_str()).or_insert(Decimal::ZERO) += t.amount;
    }

    PeriodSummary {
        period,
        total_income,
        total_expense,
        balance: total_income - total_expense,
        transaction_count: records.len(),
        expense_by_category: breakdown(expense, categories),
        income_by_category: breakdown(income, categories),
    }
}

/// Descending by amount; equal amounts keep category-id order.
fn breakdown(sums: BTreeMap<&str, Decimal>, categories: &[Category]) -> Vec<CategoryTotal> {
    let mut rows: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(id, amount)| {
            let known = categories.iter().find(|c| c.id == id);
            CategoryTotal {
                category_id: id.to_string(),
                category_name: known.map_or_else(|| id.to_string(), |c| c.name.clone()),
                icon: known.map_or_else(|| DEFAULT_ICON.to_string(), |c| c.icon.clone()),
                amount,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    rows
}
