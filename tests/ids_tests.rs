// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use ledgerkv::config::StoreConfig;
use ledgerkv::events::{EventSink, LedgerEvent};
use ledgerkv::ids::{to_base36, IdAllocator, IdSource, RandomIdSource};
use ledgerkv::keys::KeyScheme;
use ledgerkv::kv::{KvBackend, MemoryKv};
use ledgerkv::models::NewTransaction;
use ledgerkv::{Ledger, StoreError};

/// Hands out a fixed sequence of ids, then `fresh-<n>`.
struct Scripted {
    queue: Mutex<VecDeque<String>>,
    counter: Mutex<u32>,
}

impl Scripted {
    fn new(ids: &[&str]) -> Self {
        Self {
            queue: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
            counter: Mutex::new(0),
        }
    }
}

impl IdSource for Scripted {
    fn next_id(&self) -> String {
        if let Some(id) = self.queue.lock().unwrap().pop_front() {
            return id;
        }
        let mut n = self.counter.lock().unwrap();
        *n += 1;
        format!("fresh-{}", n)
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<LedgerEvent>>);

impl EventSink for Recorder {
    fn emit(&self, event: &LedgerEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn lunch() -> NewTransaction {
    NewTransaction {
        kind: "expense".into(),
        amount: "9.99".parse().unwrap(),
        category: "food".into(),
        occurred_on: "2024-03-05".into(),
        note: None,
    }
}

/// Puts one record per reserved id into the shard that id maps to.
async fn reserve(kv: &MemoryKv, reserved: &[&str]) {
    let keys = KeyScheme::default();
    let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    for id in reserved {
        let key = keys.key_for_write(day, id);
        let mut shard: Vec<serde_json::Value> = kv
            .raw(&key)
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .unwrap_or_default();
        shard.push(serde_json::json!({
            "id": id, "type": "expense", "amount": 1, "category": "x",
            "date": "2024-03-05", "createdAt": "2024-03-05T00:00:00Z"
        }));
        kv.put(&key, serde_json::to_string(&shard).unwrap())
            .await
            .unwrap();
    }
}

#[test]
fn base36_encoding() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(u64::from(u32::MAX)), "1z141z3");
}

#[test]
fn random_ids_are_compact_and_distinct() {
    let source = RandomIdSource;
    let mut seen = HashSet::new();
    for _ in 0..5_000 {
        let id = source.next_id();
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert!(id.len() >= 14 && id.len() <= 30, "{}", id);
        assert!(seen.insert(id));
    }
}

#[test]
fn allocate_skips_taken_ids() {
    let reserved = ["a1", "a2", "a3"];
    let alloc = IdAllocator::new(Box::new(Scripted::new(&reserved)), 5);
    let id = alloc.allocate(|c| reserved.contains(&c)).unwrap();
    assert_eq!(id, "fresh-1");
}

#[test]
fn allocate_gives_up_after_bounded_retries() {
    let alloc = IdAllocator::new(Box::new(Scripted::new(&["x"; 6])), 5);
    let err = alloc.allocate(|c| c == "x").unwrap_err();
    assert!(matches!(err, StoreError::ResourceExhausted { attempts: 6 }));
}

#[tokio::test]
async fn create_never_reuses_a_reserved_id() {
    let reserved = ["r-one", "r-two", "r-three", "r-four"];
    let kv = Arc::new(MemoryKv::new());
    reserve(&kv, &reserved).await;

    let rec = Arc::new(Recorder::default());
    let ledger = Ledger::with_sink(kv.clone(), StoreConfig::default(), rec.clone())
        .unwrap()
        .with_id_source(Box::new(Scripted::new(&reserved)));

    let t = ledger.create_transaction(&lunch()).await.unwrap();
    assert!(!reserved.contains(&t.id.as_str()));
    assert_eq!(t.id, "fresh-1");

    let collisions = rec
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, LedgerEvent::IdCollision { .. }))
        .count();
    assert_eq!(collisions, reserved.len());
}

#[tokio::test]
async fn exhausted_allocation_writes_nothing() {
    let kv = Arc::new(MemoryKv::new());
    reserve(&kv, &["dup"]).await;
    kv.reset_counters();

    let ledger = Ledger::new(kv.clone(), StoreConfig::default())
        .unwrap()
        .with_id_source(Box::new(Scripted::new(&["dup"; 10])));
    let err = ledger.create_transaction(&lunch()).await.unwrap_err();
    assert!(matches!(err, StoreError::ResourceExhausted { attempts: 6 }));
    assert_eq!(kv.puts(), 0);
    // Layout marker, 31 day keys and the month key, then one read per candidate.
    assert_eq!(kv.gets(), 1 + 32 + 6);
}
