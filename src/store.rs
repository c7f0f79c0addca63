// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sharded transaction storage.
//!
//! Writes are plain read-modify-write on a single generation-3 key with no
//! concurrency control: two writers racing on the same key can lose one
//! update. Bucketing by id keeps that race confined to writers of the same
//! day and bucket. A record moved between keys is written to its new key
//! before it is removed from the old one, so an interruption leaves a
//! duplicate (dropped again by `list`) rather than a loss.
//!
//! A period whose data still sits under legacy keys is migrated before the
//! first record is written into it, and before a hinted lookup in it gives
//! up. Once a generation-3 key of a period exists, even holding `[]`, the
//! legacy keys of that period are never read by `list` again.

use std::collections::HashSet;
use std::pin::pin;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::events::{EventSink, LedgerEvent};
use crate::ids::{IdAllocator, IdSource};
use crate::keys::KeyScheme;
use crate::kv::{fan_out_read, read_json, write_json, KvBackend};
use crate::migration::MigrationResolver;
use crate::models::{LocateHint, NewTransaction, Period, Transaction, TransactionPatch};

/// Outcome of bringing a period's legacy records into generation-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adoption {
    /// Already marked; nothing was read beyond the marker.
    Current,
    /// Legacy records were copied and the period marked.
    Migrated,
    /// No legacy data. The period is still unmarked.
    Empty,
}

/// A shard holding the record being looked for.
struct Located {
    key: String,
    shard: Vec<Transaction>,
    index: usize,
}

pub struct RecordStore {
    backend: Arc<dyn KvBackend>,
    keys: KeyScheme,
    config: StoreConfig,
    ids: IdAllocator,
    migration: MigrationResolver,
    sink: Arc<dyn EventSink>,
}

impl RecordStore {
    pub fn new(
        backend: Arc<dyn KvBackend>,
        config: StoreConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        let keys = KeyScheme::new(config.bucket_count);
        let migration =
            MigrationResolver::new(backend.clone(), keys, config.fan_out, sink.clone());
        Ok(Self {
            ids: IdAllocator::random(config.id_regenerations),
            backend,
            keys,
            config,
            migration,
            sink,
        })
    }

    pub fn with_id_source(mut self, source: Box<dyn IdSource>) -> Self {
        self.ids = IdAllocator::new(source, self.config.id_regenerations);
        self
    }

    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Raw contents of one shard key.
    pub async fn shard(&self, key: &str) -> Result<Vec<Transaction>> {
        read_json(self.backend.as_ref(), key).await
    }

    /// All records of the period, deduplicated by id and ordered by
    /// `(occurredOn, createdAt)`. When no generation-3 key of the period
    /// exists at all, falls back to the legacy layouts and migrates whatever
    /// they hold. A key emptied by `delete` or a move still counts as
    /// existing.
    pub async fn list(&self, period: Period) -> Result<Vec<Transaction>> {
        let keys = self.keys.keys_for_period(period);
        debug!(%period, keys = keys.len(), "period fan-out");
        let shards: Vec<(String, Option<Vec<Transaction>>)> =
            fan_out_read(self.backend.as_ref(), keys, self.config.fan_out).await?;
        let present = shards.iter().any(|(_, shard)| shard.is_some());
        let records = self.merge(
            shards
                .into_iter()
                .map(|(key, shard)| (key, shard.unwrap_or_default()))
                .collect(),
        );
        if present {
            return Ok(records);
        }

        let mut legacy = self.migration.resolve(period).await?;
        sort_records(&mut legacy);
        Ok(legacy)
    }

    pub async fn create(&self, input: &NewTransaction) -> Result<Transaction> {
        let fields = input.validate(self.config.note_max_chars)?;
        let period = Period::of(fields.occurred_on);
        let adoption = self.adopt_legacy(period).await?;
        let (id, key, mut shard) = self.allocate_slot(fields.occurred_on).await?;

        let record = Transaction {
            id,
            kind: fields.kind,
            amount: fields.amount,
            category: fields.category,
            occurred_on: fields.occurred_on,
            note: fields.note,
            created_at: Utc::now(),
            updated_at: None,
        };
        shard.push(record.clone());
        write_json(self.backend.as_ref(), &key, &shard).await?;
        if adoption == Adoption::Empty {
            self.migration.mark_current(period).await?;
        }

        self.sink.emit(&LedgerEvent::Created {
            id: record.id.clone(),
            key,
        });
        Ok(record)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: &TransactionPatch,
        hint: &LocateHint,
    ) -> Result<Transaction> {
        let fields = patch.validate(self.config.note_max_chars)?;
        let Located {
            key,
            mut shard,
            index,
        } = self.locate(id, hint).await?;

        let mut record = shard[index].clone();
        fields.apply_to(&mut record, Utc::now());
        let dest = self.keys.key_for_write(record.occurred_on, &record.id);
        let backend = self.backend.as_ref();

        if dest == key {
            shard[index] = record.clone();
            write_json(backend, &key, &shard).await?;
            self.sink.emit(&LedgerEvent::Updated {
                id: record.id.clone(),
                key,
            });
            return Ok(record);
        }

        let dest_period = record.period();
        let adoption = if Period::of(shard[index].occurred_on) == dest_period {
            Adoption::Current
        } else {
            self.adopt_legacy(dest_period).await?
        };

        // Destination first: a crash between the two writes leaves a duplicate.
        let mut target: Vec<Transaction> = read_json(backend, &dest).await?;
        match target.iter().position(|t| t.id == record.id) {
            Some(i) => target[i] = record.clone(),
            None => target.push(record.clone()),
        }
        write_json(backend, &dest, &target).await?;
        if adoption == Adoption::Empty {
            self.migration.mark_current(dest_period).await?;
        }

        shard.retain(|t| t.id != record.id);
        write_json(backend, &key, &shard).await?;

        self.sink.emit(&LedgerEvent::Moved {
            id: record.id.clone(),
            from: key,
            to: dest,
        });
        Ok(record)
    }

    /// Removes the record and returns it as it was stored.
    pub async fn delete(&self, id: &str, hint: &LocateHint) -> Result<Transaction> {
        let Located {
            key,
            mut shard,
            index,
        } = self.locate(id, hint).await?;

        let removed = shard.remove(index);
        shard.retain(|t| t.id != id);
        write_json(self.backend.as_ref(), &key, &shard).await?;

        self.sink.emit(&LedgerEvent::Deleted {
            id: removed.id.clone(),
            key,
        });
        Ok(removed)
    }

    /// Migrates the period's legacy records unless it is already marked.
    async fn adopt_legacy(&self, period: Period) -> Result<Adoption> {
        if self.migration.is_current(period).await? {
            return Ok(Adoption::Current);
        }
        if self.migration.resolve(period).await?.is_empty() {
            Ok(Adoption::Empty)
        } else {
            Ok(Adoption::Migrated)
        }
    }

    /// Generates ids until one is free in the shard it maps to. Returns the
    /// id, its key and the shard contents as read.
    async fn allocate_slot(&self, day: NaiveDate) -> Result<(String, String, Vec<Transaction>)> {
        for attempt in 1..=self.ids.attempts() {
            let id = self.ids.generate();
            let key = self.keys.key_for_write(day, &id);
            let shard: Vec<Transaction> = read_json(self.backend.as_ref(), &key).await?;
            if !shard.iter().any(|t| t.id == id) {
                return Ok((id, key, shard));
            }
            self.sink
                .emit(&LedgerEvent::IdCollision { id, key, attempt });
        }
        Err(self.ids.exhausted())
    }

    /// Finds the shard holding `id`:
    ///
    /// 1. the exact key for the hinted day,
    /// 2. every day of the hinted period (or the current one),
    /// 3. the current period and the ones before it, up to `search_periods`.
    ///
    /// A miss in the hinted period migrates its legacy records, if it has not
    /// been marked yet, and searches it once more. Unhinted periods are only
    /// searched under generation-3 keys.
    ///
    /// The bucket is a function of the id, so each period costs one get per
    /// day rather than one per day and bucket.
    async fn locate(&self, id: &str, hint: &LocateHint) -> Result<Located> {
        let mut probed = HashSet::new();

        if let Some(day) = hint.day {
            let key = self.keys.key_for_write(day, id);
            probed.insert(key.clone());
            if let Some(found) = self.search(id, vec![key]).await? {
                return Ok(found);
            }
        }

        let current = Period::current();
        let hinted = hint.hinted_period();
        let first = hinted.unwrap_or(current);
        let mut periods = vec![first];
        periods.extend(
            current
                .trailing(self.config.search_periods)
                .into_iter()
                .filter(|p| *p != first),
        );

        for period in periods {
            let keys: Vec<String> = self
                .keys
                .keys_for_id_in_period(period, id)
                .into_iter()
                .filter(|k| probed.insert(k.clone()))
                .collect();
            if let Some(found) = self.search(id, keys).await? {
                return Ok(found);
            }
            if hinted == Some(period) && self.adopt_legacy(period).await? == Adoption::Migrated {
                let keys = self.keys.keys_for_id_in_period(period, id);
                if let Some(found) = self.search(id, keys).await? {
                    return Ok(found);
                }
            }
        }
        Err(StoreError::not_found(id))
    }

    /// Reads keys in order with bounded concurrency and stops at the first
    /// shard containing `id`.
    async fn search(&self, id: &str, keys: Vec<String>) -> Result<Option<Located>> {
        let backend = self.backend.as_ref();
        let mut shards = pin!(
            stream::iter(keys)
                .map(|key| async move {
                    let shard: Vec<Transaction> = read_json(backend, &key).await?;
                    Ok::<_, StoreError>((key, shard))
                })
                .buffered(self.config.fan_out)
        );
        while let Some((key, shard)) = shards.try_next().await? {
            if let Some(index) = shard.iter().position(|t| t.id == id) {
                debug!(%id, %key, "record located");
                return Ok(Some(Located { key, shard, index }));
            }
        }
        Ok(None)
    }

    /// Concatenates shards, keeping the first copy of each id.
    fn merge(&self, shards: Vec<(String, Vec<Transaction>)>) -> Vec<Transaction> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (key, records) in shards {
            for record in records {
                if seen.insert(record.id.clone()) {
                    out.push(record);
                } else {
                    self.sink.emit(&LedgerEvent::DuplicateId {
                        id: record.id,
                        key: key.clone(),
                    });
                }
            }
        }
        sort_records(&mut out);
        out
    }
}

pub fn sort_records(records: &mut [Transaction]) {
    records.sort_by(|a, b| (a.occurred_on, a.created_at).cmp(&(b.occurred_on, b.created_at)));
}
