// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Lazy, read-triggered upgrade of legacy shard layouts.
//!
//! Runs when a period has no generation-3 key at all, and before the first
//! write into a period that carries no layout marker. Legacy records are
//! copied into their generation-3 shards and returned as they were found,
//! then the period is marked. Legacy keys are never written or deleted, so a
//! repeated or interrupted migration only ever re-copies the same records;
//! the list-time dedup by id absorbs any duplicates.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::events::{generation_numbers, EventSink, LedgerEvent};
use crate::keys::{layout_key, Generation, KeyScheme};
use crate::kv::{fan_out_read, read_json, read_json_opt, write_json, KvBackend};
use crate::models::{Period, Transaction};

/// Records recovered from legacy keys.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LegacyRecords {
    pub records: Vec<Transaction>,
    /// Layouts that held at least one record, in probe order.
    pub generations: Vec<Generation>,
}

/// Stored under [`layout_key`] once a period's legacy data lives in
/// generation-3 keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMarker {
    pub generation: u8,
    pub marked_at: DateTime<Utc>,
}

pub struct MigrationResolver {
    backend: Arc<dyn KvBackend>,
    keys: KeyScheme,
    fan_out: usize,
    sink: Arc<dyn EventSink>,
}

impl MigrationResolver {
    pub fn new(
        backend: Arc<dyn KvBackend>,
        keys: KeyScheme,
        fan_out: usize,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            backend,
            keys,
            fan_out,
            sink,
        }
    }

    /// Whether the period carries a generation-3 layout marker.
    pub async fn is_current(&self, period: Period) -> Result<bool> {
        let marker: Option<LayoutMarker> =
            read_json_opt(self.backend.as_ref(), &layout_key(period)).await?;
        Ok(marker.is_some_and(|m| m.generation >= Generation::DayBucket.number()))
    }

    pub async fn mark_current(&self, period: Period) -> Result<()> {
        let marker = LayoutMarker {
            generation: Generation::DayBucket.number(),
            marked_at: Utc::now(),
        };
        write_json(self.backend.as_ref(), &layout_key(period), &marker).await?;
        debug!(%period, "period marked current");
        Ok(())
    }

    /// Migrates the period's legacy records, if any, and returns them. The
    /// period is marked only when something was migrated, so reading an
    /// empty period never writes.
    pub async fn resolve(&self, period: Period) -> Result<Vec<Transaction>> {
        let legacy = self.probe(period).await?;
        if legacy.records.is_empty() {
            debug!(%period, "no legacy data");
            return Ok(Vec::new());
        }
        let keys_written = self.rewrite(&legacy.records).await?;
        self.mark_current(period).await?;
        self.sink.emit(&LedgerEvent::Migrated {
            period,
            generations: generation_numbers(&legacy.generations),
            records: legacy.records.len(),
            keys_written,
        });
        Ok(legacy.records)
    }

    /// Reads the generation-2 day keys, then the generation-1 month key.
    /// A month can straddle a layout rollout, so every legacy key is read and
    /// the first copy of an id (newest layout) wins.
    pub async fn probe(&self, period: Period) -> Result<LegacyRecords> {
        let legacy_keys = self.keys.legacy_keys_for_period(period);
        let keys = legacy_keys.iter().map(|k| k.key.clone()).collect();
        let shards =
            fan_out_read::<_, Vec<Transaction>>(self.backend.as_ref(), keys, self.fan_out).await?;

        let mut out = LegacyRecords::default();
        let mut seen = HashSet::new();
        for (legacy, (_, records)) in legacy_keys.iter().zip(shards) {
            let records = records.unwrap_or_default();
            if records.is_empty() {
                continue;
            }
            if !out.generations.contains(&legacy.generation) {
                out.generations.push(legacy.generation);
            }
            for record in records {
                if seen.insert(record.id.clone()) {
                    out.records.push(record);
                }
            }
        }
        debug!(%period, records = out.records.len(), "legacy probe finished");
        Ok(out)
    }

    /// Appends each record to its generation-3 shard, one read-modify-write
    /// per destination key. Ids already present are left alone. Returns the
    /// number of keys written.
    pub async fn rewrite(&self, records: &[Transaction]) -> Result<usize> {
        let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
        for record in records {
            groups
                .entry(self.keys.key_for_write(record.occurred_on, &record.id))
                .or_default()
                .push(record);
        }

        let backend = self.backend.as_ref();
        stream::iter(groups)
            .map(|(key, batch)| async move {
                let mut shard: Vec<Transaction> = read_json(backend, &key).await?;
                let before = shard.len();
                for record in batch {
                    if !shard.iter().any(|t| t.id == record.id) {
                        shard.push(record.clone());
                    }
                }
                if shard.len() == before {
                    return Ok::<_, StoreError>(0usize);
                }
                write_json(backend, &key, &shard).await?;
                Ok(1)
            })
            .buffer_unordered(self.fan_out.max(1))
            .try_fold(0usize, |acc, n| async move { Ok(acc + n) })
            .await
    }
}
