// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Tunables for the sharded record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Gen-3 buckets per day. Wider spreads same-day writers over more keys
    /// and makes period reads proportionally more expensive. Must stay fixed
    /// once data exists: a different count re-derives every bucket and
    /// strands the records already written.
    pub bucket_count: u16,
    /// Maximum backend gets in flight during one fan-out.
    pub fan_out: usize,
    /// Periods searched by an unhinted update/delete (current and preceding).
    pub search_periods: u32,
    /// Regenerations allowed after an identifier collides in its shard.
    pub id_regenerations: u32,
    pub note_max_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket_count: 256,
            fan_out: 50,
            search_periods: 3,
            id_regenerations: 5,
            note_max_chars: 100,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 || self.bucket_count > 256 {
            return Err(StoreError::validation(format!(
                "bucket_count must be within 1..=256, got {}",
                self.bucket_count
            )));
        }
        if self.fan_out == 0 {
            return Err(StoreError::validation("fan_out must be at least 1"));
        }
        if self.search_periods == 0 {
            return Err(StoreError::validation("search_periods must be at least 1"));
        }
        Ok(())
    }
}
