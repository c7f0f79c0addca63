// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Raw key-value backend abstraction.
//!
//! The backend offers whole-value `get` and `put` per string key with
//! read-after-write consistency on the same key and nothing else: no scans,
//! no transactions, no compare-and-swap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BackendError, Result, StoreError};

#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, BackendError>;

    async fn put(&self, key: &str, value: String) -> std::result::Result<(), BackendError>;
}

/// Process-local backend. Counts every call so callers can observe how many
/// keys an operation touched.
#[derive(Debug, Default)]
pub struct MemoryKv {
    map: RwLock<HashMap<String, String>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.gets.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
    }

    /// Keys currently holding a value, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.map.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, BackendError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.map.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> std::result::Result<(), BackendError> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.map.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Reads and decodes a JSON document; `None` when the key is absent or
/// holds a blank value.
pub async fn read_json_opt<B, T>(backend: &B, key: &str) -> Result<Option<T>>
where
    B: KvBackend + ?Sized,
    T: DeserializeOwned,
{
    match backend.get(key).await? {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        _ => Ok(None),
    }
}

/// Like [`read_json_opt`] with absent values decoding as `T::default()`.
pub async fn read_json<B, T>(backend: &B, key: &str) -> Result<T>
where
    B: KvBackend + ?Sized,
    T: DeserializeOwned + Default,
{
    Ok(read_json_opt(backend, key).await?.unwrap_or_default())
}

pub async fn write_json<B, T>(backend: &B, key: &str, value: &T) -> Result<()>
where
    B: KvBackend + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(StoreError::Encode)?;
    backend.put(key, raw).await?;
    Ok(())
}

/// Reads every key with at most `limit` gets in flight. Results come back in
/// key order, `None` for keys that hold nothing. The first failure aborts the
/// whole read.
pub async fn fan_out_read<B, T>(
    backend: &B,
    keys: Vec<String>,
    limit: usize,
) -> Result<Vec<(String, Option<T>)>>
where
    B: KvBackend + ?Sized,
    T: DeserializeOwned + Send,
{
    stream::iter(keys)
        .map(|key| async move {
            let value = read_json_opt::<B, T>(backend, &key).await?;
            Ok::<_, StoreError>((key, value))
        })
        .buffered(limit.max(1))
        .try_collect()
        .await
}
