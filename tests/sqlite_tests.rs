// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use ledgerkv::config::StoreConfig;
use ledgerkv::db::SqliteKv;
use ledgerkv::kv::KvBackend;
use ledgerkv::models::{LocateHint, NewTransaction, TransactionPatch};
use ledgerkv::Ledger;

#[tokio::test]
async fn put_overwrites_whole_value() {
    let kv = SqliteKv::open_in_memory().unwrap();
    assert_eq!(kv.get("budgets").await.unwrap(), None);
    kv.put("budgets", r#"{"food":"1"}"#.to_string()).await.unwrap();
    kv.put("budgets", r#"{"food":"2"}"#.to_string()).await.unwrap();
    assert_eq!(kv.get("budgets").await.unwrap().as_deref(), Some(r#"{"food":"2"}"#));
}

#[tokio::test]
async fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");

    let id = {
        let kv = SqliteKv::open(&path).unwrap();
        let ledger = Ledger::new(Arc::new(kv), StoreConfig::default()).unwrap();
        let t = ledger
            .create_transaction(&NewTransaction {
                kind: "income".into(),
                amount: "2500".parse().unwrap(),
                category: "salary".into(),
                occurred_on: "2024-04-30".into(),
                note: Some("april".into()),
            })
            .await
            .unwrap();
        t.id
    };

    let kv = SqliteKv::open(&path).unwrap();
    let ledger = Ledger::new(Arc::new(kv), StoreConfig::default()).unwrap();
    let listed = ledger
        .list_transactions("2024-04".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].amount.to_string(), "2500.00");

    let patch = TransactionPatch {
        occurred_on: Some("2024-05-01".into()),
        ..Default::default()
    };
    let hint = LocateHint::day("2024-04-30".parse().unwrap());
    ledger.update_transaction(&id, &patch, &hint).await.unwrap();
    assert!(ledger
        .list_transactions("2024-04".parse().unwrap())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        ledger
            .list_transactions("2024-05".parse().unwrap())
            .await
            .unwrap()
            .len(),
        1
    );
}
