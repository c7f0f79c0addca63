// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

static DAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("day pattern"));
static PERIOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}$").expect("period pattern"));

pub const DEFAULT_ICON: &str = "📝";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(StoreError::validation(format!(
                "type must be 'income' or 'expense', got '{}'",
                other
            ))),
        }
    }
}

/// A stored ledger entry. Field names on the wire match the records the
/// period-level layout has always held, so legacy values decode unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "date")]
    pub occurred_on: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn period(&self) -> Period {
        Period::of(self.occurred_on)
    }
}

/// Caller-supplied fields for a new transaction, not yet validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "date")]
    pub occurred_on: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Validated contents of a [`NewTransaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    pub kind: Kind,
    pub amount: Decimal,
    pub category: String,
    pub occurred_on: NaiveDate,
    pub note: String,
}

impl NewTransaction {
    pub fn validate(&self, note_max_chars: usize) -> Result<TransactionFields> {
        Ok(TransactionFields {
            kind: self.kind.parse()?,
            amount: normalize_amount(self.amount)?,
            category: normalize_category(&self.category)?,
            occurred_on: parse_day(&self.occurred_on)?,
            note: truncate_note(self.note.as_deref().unwrap_or(""), note_max_chars),
        })
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "date")]
    pub occurred_on: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Validated contents of a [`TransactionPatch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchFields {
    pub kind: Option<Kind>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub note: Option<String>,
}

impl TransactionPatch {
    pub fn validate(&self, note_max_chars: usize) -> Result<PatchFields> {
        Ok(PatchFields {
            kind: self.kind.as_deref().map(str::parse::<Kind>).transpose()?,
            amount: self.amount.map(normalize_amount).transpose()?,
            category: self.category.as_deref().map(normalize_category).transpose()?,
            occurred_on: self.occurred_on.as_deref().map(parse_day).transpose()?,
            note: self.note.as_deref().map(|n| truncate_note(n, note_max_chars)),
        })
    }
}

impl PatchFields {
    /// Overwrites the provided fields and stamps `updated_at`.
    pub fn apply_to(&self, record: &mut Transaction, now: DateTime<Utc>) {
        if let Some(k) = self.kind {
            record.kind = k;
        }
        if let Some(a) = self.amount {
            record.amount = a;
        }
        if let Some(c) = &self.category {
            record.category = c.clone();
        }
        if let Some(d) = self.occurred_on {
            record.occurred_on = d;
        }
        if let Some(n) = &self.note {
            record.note = n.clone();
        }
        record.updated_at = Some(now);
    }
}

/// Where the caller last saw a record. `day` allows a single-key probe,
/// `period` narrows the fan-out to one month. Only a hinted month is migrated
/// from legacy keys during lookup, so records of an unmigrated month need a
/// hint to be found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocateHint {
    pub day: Option<NaiveDate>,
    pub period: Option<Period>,
}

impl LocateHint {
    pub fn day(day: NaiveDate) -> Self {
        Self {
            day: Some(day),
            period: None,
        }
    }

    pub fn period(period: Period) -> Self {
        Self {
            day: None,
            period: Some(period),
        }
    }

    pub fn hinted_period(&self) -> Option<Period> {
        self.period.or_else(|| self.day.map(Period::of))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: Kind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

/// Budget limits keyed by category id or period, stored as one document.
pub type Budgets = BTreeMap<String, Decimal>;

/// A calendar month (`YYYY-MM`). Derived from `occurredOn`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period(NaiveDate);

impl Period {
    pub fn of(day: NaiveDate) -> Self {
        Period(day.with_day(1).unwrap_or(day))
    }

    pub fn current() -> Self {
        Self::of(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Every day of the month, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.0.month();
        self.0.iter_days().take_while(move |d| d.month() == month)
    }

    pub fn preceding(&self) -> Option<Period> {
        self.0.pred_opt().map(Period::of)
    }

    /// This period followed by up to `count - 1` preceding ones.
    pub fn trailing(&self, count: u32) -> Vec<Period> {
        let mut out = Vec::with_capacity(count as usize);
        let mut cur = Some(*self);
        while let Some(p) = cur {
            if out.len() >= count as usize {
                break;
            }
            out.push(p);
            cur = p.preceding();
        }
        out
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || StoreError::validation(format!("invalid period '{}', expected YYYY-MM", s));
        if !PERIOD_RE.is_match(s) {
            return Err(invalid());
        }
        let first = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(Period(first))
    }
}

impl From<Period> for String {
    fn from(p: Period) -> String {
        p.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

pub fn parse_day(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    let invalid = || StoreError::validation(format!("invalid date '{}', expected YYYY-MM-DD", s));
    if !DAY_RE.is_match(s) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Rounds to cents (half away from zero) and requires a positive result.
pub fn normalize_amount(amount: Decimal) -> Result<Decimal> {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        return Err(StoreError::validation(format!(
            "amount must be greater than 0, got {}",
            amount
        )));
    }
    rounded.rescale(2);
    Ok(rounded)
}

fn normalize_category(category: &str) -> Result<String> {
    let c = category.trim();
    if c.is_empty() {
        return Err(StoreError::validation("category must not be empty"));
    }
    Ok(c.to_string())
}

pub fn truncate_note(note: &str, max_chars: usize) -> String {
    note.chars().take(max_chars).collect()
}
