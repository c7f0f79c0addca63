// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Operation-boundary events.

use serde::Serialize;
use tracing::{info, warn};

use crate::keys::Generation;
use crate::models::Period;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Created {
        id: String,
        key: String,
    },
    Updated {
        id: String,
        key: String,
    },
    /// The record's shard changed; `from` was cleared after `to` was written.
    Moved {
        id: String,
        from: String,
        to: String,
    },
    Deleted {
        id: String,
        key: String,
    },
    Migrated {
        period: Period,
        generations: Vec<u8>,
        records: usize,
        keys_written: usize,
    },
    IdCollision {
        id: String,
        key: String,
        attempt: u32,
    },
    /// The same id was seen twice while merging a period; the first copy won.
    DuplicateId {
        id: String,
        key: String,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}

/// Renders events as `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Created { id, key } => info!(%id, %key, "transaction created"),
            LedgerEvent::Updated { id, key } => info!(%id, %key, "transaction updated"),
            LedgerEvent::Moved { id, from, to } => info!(%id, %from, %to, "transaction moved"),
            LedgerEvent::Deleted { id, key } => info!(%id, %key, "transaction deleted"),
            LedgerEvent::Migrated {
                period,
                generations,
                records,
                keys_written,
            } => info!(
                %period,
                ?generations,
                records,
                keys_written,
                "legacy period migrated"
            ),
            LedgerEvent::IdCollision { id, key, attempt } => {
                warn!(%id, %key, attempt, "identifier collision")
            }
            LedgerEvent::DuplicateId { id, key } => {
                warn!(%id, %key, "duplicate id across shards, keeping first")
            }
        }
    }
}

pub(crate) fn generation_numbers(generations: &[Generation]) -> Vec<u8> {
    generations.iter().map(Generation::number).collect()
}
