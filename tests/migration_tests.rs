// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use ledgerkv::config::StoreConfig;
use ledgerkv::events::{EventSink, LedgerEvent, TracingSink};
use ledgerkv::keys::{layout_key, Generation, KeyScheme};
use ledgerkv::kv::{KvBackend, MemoryKv};
use ledgerkv::migration::MigrationResolver;
use ledgerkv::models::{LocateHint, NewTransaction, Period, Transaction, TransactionPatch};
use ledgerkv::{Ledger, StoreError};

#[derive(Default)]
struct Recorder(Mutex<Vec<LedgerEvent>>);

impl EventSink for Recorder {
    fn emit(&self, event: &LedgerEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    fn migrations(&self) -> Vec<LedgerEvent> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, LedgerEvent::Migrated { .. }))
            .cloned()
            .collect()
    }
}

const NOVEMBER_GEN1: &str = r#"[
  {"id":"lp0x1a2b3c","type":"expense","amount":12.5,"category":"food","date":"2023-11-14","note":"lunch","createdAt":"2023-11-14T04:10:00.000Z"},
  {"id":"lp0x1a2b3d","type":"income","amount":3000,"category":"salary","date":"2023-11-01","note":"","createdAt":"2023-11-01T09:00:00.000Z"},
  {"id":"lp0x1a2b3e","type":"expense","amount":42.1,"category":"transport","date":"2023-11-14","note":"taxi","createdAt":"2023-11-14T01:00:00.000Z","updatedAt":"2023-11-15T08:00:00.000Z"}
]"#;

async fn seeded() -> (Arc<MemoryKv>, Arc<Recorder>, Ledger) {
    let kv = Arc::new(MemoryKv::new());
    kv.put("transactions_2023_11", NOVEMBER_GEN1.to_string())
        .await
        .unwrap();
    let rec = Arc::new(Recorder::default());
    let ledger = Ledger::with_sink(kv.clone(), StoreConfig::default(), rec.clone()).unwrap();
    (kv, rec, ledger)
}

fn november() -> Period {
    "2023-11".parse().unwrap()
}

fn ids(records: &[Transaction]) -> Vec<&str> {
    records.iter().map(|t| t.id.as_str()).collect()
}

#[tokio::test]
async fn period_key_records_are_listed_and_redistributed() {
    let (kv, rec, ledger) = seeded().await;

    let listed = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(ids(&listed), vec!["lp0x1a2b3d", "lp0x1a2b3e", "lp0x1a2b3c"]);
    assert_eq!(listed[2].amount.to_string(), "12.5");
    assert_eq!(listed[1].note, "taxi");
    assert!(listed[1].updated_at.is_some());

    let keys = ledger.records().keys();
    for t in &listed {
        let shard = ledger
            .records()
            .shard(&keys.key_for_write(t.occurred_on, &t.id))
            .await
            .unwrap();
        assert!(shard.contains(t), "{} not in its bucket", t.id);
    }

    // Legacy data is left exactly where it was.
    assert_eq!(kv.raw("transactions_2023_11").unwrap(), NOVEMBER_GEN1);

    let migrations = rec.migrations();
    assert_eq!(migrations.len(), 1);
    match &migrations[0] {
        LedgerEvent::Migrated {
            generations,
            records,
            ..
        } => {
            assert_eq!(generations, &vec![1]);
            assert_eq!(*records, 3);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn second_list_reads_current_keys_only() {
    let (_kv, rec, ledger) = seeded().await;
    let first = ledger.list_transactions(november()).await.unwrap();
    let second = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(rec.migrations().len(), 1);
}

#[tokio::test]
async fn repeated_migration_adds_no_duplicates() {
    let (kv, _rec, ledger) = seeded().await;
    let once = ledger.list_transactions(november()).await.unwrap();

    let resolver = MigrationResolver::new(kv.clone(), KeyScheme::default(), 50, Arc::new(TracingSink));
    let again = resolver.resolve(november()).await.unwrap();
    assert_eq!(again.len(), 3);
    // Records already present in their shards are not appended again.
    assert_eq!(resolver.rewrite(&again).await.unwrap(), 0);

    let twice = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(once, twice);
    let unique: HashSet<&str> = ids(&twice).into_iter().collect();
    assert_eq!(unique.len(), twice.len());
}

#[tokio::test]
async fn concurrent_migrations_converge() {
    let (kv, _rec, _ledger) = seeded().await;
    let a = MigrationResolver::new(kv.clone(), KeyScheme::default(), 4, Arc::new(TracingSink));
    let b = MigrationResolver::new(kv.clone(), KeyScheme::default(), 4, Arc::new(TracingSink));
    let (ra, rb) = futures::join!(a.resolve(november()), b.resolve(november()));
    assert_eq!(ra.unwrap().len(), 3);
    assert_eq!(rb.unwrap().len(), 3);

    let ledger = Ledger::new(kv.clone(), StoreConfig::default()).unwrap();
    let listed = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(ids(&listed), vec!["lp0x1a2b3d", "lp0x1a2b3e", "lp0x1a2b3c"]);
}

#[tokio::test]
async fn day_keys_win_over_the_period_key() {
    let kv = Arc::new(MemoryKv::new());
    kv.put(
        "transactions_2023_11_14",
        r#"[{"id":"lp0x1a2b3c","type":"expense","amount":"15.00","category":"food","date":"2023-11-14","note":"edited","createdAt":"2023-11-14T04:10:00.000Z"},
            {"id":"lp0x9","type":"expense","amount":1,"category":"food","date":"2023-11-14","createdAt":"2023-11-14T05:00:00Z"}]"#
            .to_string(),
    )
    .await
    .unwrap();
    kv.put("transactions_2023_11", NOVEMBER_GEN1.to_string())
        .await
        .unwrap();

    let resolver = MigrationResolver::new(kv.clone(), KeyScheme::default(), 50, Arc::new(TracingSink));
    let legacy = resolver.probe(november()).await.unwrap();
    assert_eq!(legacy.generations, vec![Generation::DayLevel, Generation::PeriodLevel]);
    assert_eq!(legacy.records.len(), 4);
    let edited = legacy.records.iter().find(|t| t.id == "lp0x1a2b3c").unwrap();
    assert_eq!(edited.note, "edited");
    assert_eq!(edited.amount.to_string(), "15.00");

    let ledger = Ledger::new(kv.clone(), StoreConfig::default()).unwrap();
    assert_eq!(ledger.list_transactions(november()).await.unwrap().len(), 4);
}

#[tokio::test]
async fn create_into_a_legacy_period_migrates_it_first() {
    let (kv, rec, ledger) = seeded().await;
    let created = ledger
        .create_transaction(&NewTransaction {
            kind: "expense".into(),
            amount: "5".parse().unwrap(),
            category: "food".into(),
            occurred_on: "2023-11-20".into(),
            note: None,
        })
        .await
        .unwrap();

    let listed = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(
        ids(&listed),
        vec!["lp0x1a2b3d", "lp0x1a2b3e", "lp0x1a2b3c", created.id.as_str()]
    );
    assert_eq!(rec.migrations().len(), 1);
    assert!(kv.raw(&layout_key(november())).is_some());

    let summary = ledger.summarize(november()).await.unwrap();
    assert_eq!(summary.transaction_count, 4);
}

#[tokio::test]
async fn create_into_an_empty_period_marks_it() {
    let kv = Arc::new(MemoryKv::new());
    let ledger = Ledger::new(kv.clone(), StoreConfig::default()).unwrap();
    let december: Period = "2023-12".parse().unwrap();
    ledger.list_transactions(december).await.unwrap();
    assert_eq!(kv.puts(), 0);

    ledger
        .create_transaction(&NewTransaction {
            kind: "income".into(),
            amount: "10".parse().unwrap(),
            category: "bonus".into(),
            occurred_on: "2023-12-24".into(),
            note: None,
        })
        .await
        .unwrap();
    assert!(kv.raw(&layout_key(december)).is_some());

    // Legacy data appearing later is not read once the period is marked.
    kv.put("transactions_2023_12", NOVEMBER_GEN1.to_string())
        .await
        .unwrap();
    assert_eq!(ledger.list_transactions(december).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleted_records_stay_deleted_after_migration() {
    let (_kv, rec, ledger) = seeded().await;
    ledger.list_transactions(november()).await.unwrap();

    let hint = LocateHint::period(november());
    for id in ["lp0x1a2b3c", "lp0x1a2b3d", "lp0x1a2b3e"] {
        ledger.delete_transaction(id, &hint).await.unwrap();
    }

    assert!(ledger.list_transactions(november()).await.unwrap().is_empty());
    let err = ledger.delete_transaction("lp0x1a2b3d", &hint).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(rec.migrations().len(), 1);
}

#[tokio::test]
async fn record_moved_out_of_a_migrated_period_is_listed_once() {
    let kv = Arc::new(MemoryKv::new());
    kv.put(
        "transactions_2023_11",
        r#"[{"id":"only1","type":"expense","amount":3,"category":"food","date":"2023-11-02","createdAt":"2023-11-02T10:00:00Z"}]"#
            .to_string(),
    )
    .await
    .unwrap();
    let ledger = Ledger::new(kv.clone(), StoreConfig::default()).unwrap();
    assert_eq!(ids(&ledger.list_transactions(november()).await.unwrap()), vec!["only1"]);

    let patch = TransactionPatch {
        occurred_on: Some("2023-12-01".into()),
        ..Default::default()
    };
    ledger
        .update_transaction("only1", &patch, &LocateHint::period(november()))
        .await
        .unwrap();

    assert!(ledger.list_transactions(november()).await.unwrap().is_empty());
    let december = ledger
        .list_transactions("2023-12".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(ids(&december), vec!["only1"]);
}

#[tokio::test]
async fn hinted_delete_reaches_an_unmigrated_period() {
    let (_kv, rec, ledger) = seeded().await;
    let day = chrono::NaiveDate::from_ymd_opt(2023, 11, 14).unwrap();

    let removed = ledger
        .delete_transaction("lp0x1a2b3c", &LocateHint::day(day))
        .await
        .unwrap();
    assert_eq!(removed.note, "lunch");
    assert_eq!(rec.migrations().len(), 1);

    let listed = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(ids(&listed), vec!["lp0x1a2b3d", "lp0x1a2b3e"]);
}

#[tokio::test]
async fn unhinted_lookup_does_not_migrate() {
    let (_kv, rec, ledger) = seeded().await;
    let err = ledger
        .delete_transaction("lp0x1a2b3c", &LocateHint::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(rec.migrations().is_empty());
}

#[tokio::test]
async fn migrated_records_can_be_updated_and_deleted() {
    let (_kv, _rec, ledger) = seeded().await;
    ledger.list_transactions(november()).await.unwrap();

    let hint = LocateHint::period(november());
    let patch = TransactionPatch {
        note: Some("team lunch".into()),
        ..Default::default()
    };
    let updated = ledger
        .update_transaction("lp0x1a2b3c", &patch, &hint)
        .await
        .unwrap();
    assert_eq!(updated.note, "team lunch");

    ledger.delete_transaction("lp0x1a2b3d", &hint).await.unwrap();
    let listed = ledger.list_transactions(november()).await.unwrap();
    assert_eq!(ids(&listed), vec!["lp0x1a2b3e", "lp0x1a2b3c"]);
}

#[tokio::test]
async fn period_without_any_data_migrates_nothing() {
    let kv = Arc::new(MemoryKv::new());
    let resolver = MigrationResolver::new(kv.clone(), KeyScheme::default(), 50, Arc::new(TracingSink));
    assert!(resolver.resolve(november()).await.unwrap().is_empty());
    assert_eq!(kv.puts(), 0);
}
