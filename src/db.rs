// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BackendError;
use crate::kv::KvBackend;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Ledgerkv", "ledgerkv"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("ledgerkv.sqlite"))
}

/// Whole-value key-value store kept in a single SQLite table.
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    pub fn open(path: &Path) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

pub fn open_or_init(path: Option<&Path>) -> Result<SqliteKv> {
    match path {
        Some(p) => SqliteKv::open(p),
        None => SqliteKv::open(&db_path()?),
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS kv(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}

#[async_trait]
impl KvBackend for SqliteKv {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, BackendError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT value FROM kv WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()
        .map_err(|e| BackendError::get(key, e))
    }

    async fn put(&self, key: &str, value: String) -> std::result::Result<(), BackendError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )
        .map_err(|e| BackendError::put(key, e))?;
        Ok(())
    }
}
