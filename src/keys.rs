// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Storage key derivation for transaction shards.
//!
//! Three key layouts have been used over time and all of them may still hold
//! data:
//!
//! | Generation | Key | Granularity |
//! |---|---|---|
//! | 1 | `transactions_YYYY_MM` | one key per month |
//! | 2 | `transactions_YYYY_MM_DD` | one key per day |
//! | 3 | `transactions_YYYY_MM_DD_xx` | one key per day and id bucket |
//!
//! Only generation 3 is written. The other two are read when a month has no
//! generation-3 key at all and carries no layout marker.

use chrono::{Datelike, NaiveDate};

use crate::models::Period;

const PREFIX: &str = "transactions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Generation {
    /// Generation 1.
    PeriodLevel,
    /// Generation 2.
    DayLevel,
    /// Generation 3, the write layout.
    DayBucket,
}

/// Legacy layouts in the order they are probed: newest first.
pub const LEGACY_GENERATIONS: [Generation; 2] = [Generation::DayLevel, Generation::PeriodLevel];

impl Generation {
    pub fn number(&self) -> u8 {
        match self {
            Generation::PeriodLevel => 1,
            Generation::DayLevel => 2,
            Generation::DayBucket => 3,
        }
    }
}

/// A legacy key together with the layout that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyKey {
    pub generation: Generation,
    pub key: String,
}

/// Rolling hash over UTF-16 code units: `h = h * 31 + unit` in wrapping
/// 32-bit signed arithmetic. Existing generation-3 keys were bucketed with
/// exactly this function; it must not change.
pub fn id_hash(id: &str) -> i32 {
    id.encode_utf16().fold(0i32, |h, unit| {
        (h << 5).wrapping_sub(h).wrapping_add(unit as i32)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyScheme {
    bucket_count: u16,
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self { bucket_count: 256 }
    }
}

impl KeyScheme {
    /// `bucket_count` is clamped to `1..=256` so a bucket always renders as
    /// two hex digits.
    pub fn new(bucket_count: u16) -> Self {
        Self {
            bucket_count: bucket_count.clamp(1, 256),
        }
    }

    pub fn bucket_count(&self) -> u16 {
        self.bucket_count
    }

    pub fn bucket(&self, id: &str) -> u8 {
        (id_hash(id).unsigned_abs() % u32::from(self.bucket_count)) as u8
    }

    /// Generation-3 key a record with this id and day is written under.
    pub fn key_for_write(&self, day: NaiveDate, id: &str) -> String {
        bucket_key(day, self.bucket(id))
    }

    /// Every generation-3 key of the period, day-major then bucket ascending.
    pub fn keys_for_period(&self, period: Period) -> Vec<String> {
        let buckets = self.bucket_count;
        period
            .days()
            .flat_map(|day| (0..buckets).map(move |b| bucket_key(day, b as u8)))
            .collect()
    }

    /// Generation-3 keys that can hold `id` within the period: one per day.
    pub fn keys_for_id_in_period(&self, period: Period, id: &str) -> Vec<String> {
        let bucket = self.bucket(id);
        period.days().map(|day| bucket_key(day, bucket)).collect()
    }

    /// Generation-2 day keys (ascending) followed by the generation-1 key.
    pub fn legacy_keys_for_period(&self, period: Period) -> Vec<LegacyKey> {
        LEGACY_GENERATIONS
            .iter()
            .flat_map(|generation| match generation {
                Generation::DayLevel => period
                    .days()
                    .map(|day| LegacyKey {
                        generation: Generation::DayLevel,
                        key: day_key(day),
                    })
                    .collect::<Vec<_>>(),
                Generation::PeriodLevel => vec![LegacyKey {
                    generation: Generation::PeriodLevel,
                    key: period_key(period),
                }],
                Generation::DayBucket => Vec::new(),
            })
            .collect()
    }
}

/// Marker stating that the period's legacy records, if any, have been copied
/// into generation-3 keys.
pub fn layout_key(period: Period) -> String {
    format!("{}_layout", period_key(period))
}

pub fn period_key(period: Period) -> String {
    format!("{}_{:04}_{:02}", PREFIX, period.year(), period.month())
}

pub fn day_key(day: NaiveDate) -> String {
    format!("{}_{:04}_{:02}_{:02}", PREFIX, day.year(), day.month(), day.day())
}

pub fn bucket_key(day: NaiveDate, bucket: u8) -> String {
    format!("{}_{:02x}", day_key(day), bucket)
}
