// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the storage layer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure of a raw `get`/`put` against the key-value backend.
#[derive(Debug, Error)]
#[error("backend {op} failed for key '{key}': {message}")]
pub struct BackendError {
    pub op: &'static str,
    pub key: String,
    pub message: String,
}

impl BackendError {
    pub fn get(key: &str, message: impl ToString) -> Self {
        Self {
            op: "get",
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn put(key: &str, message: impl ToString) -> Self {
        Self {
            op: "put",
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or missing input; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The id is absent from every shard in the searched scope.
    #[error("record '{id}' not found in searched scope")]
    NotFound { id: String },

    /// Identifier allocation kept colliding; nothing was written.
    #[error("could not allocate a free identifier after {attempts} attempts")]
    ResourceExhausted { attempts: u32 },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    #[error("stored value under '{key}' is not valid: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn not_found(id: &str) -> Self {
        StoreError::NotFound { id: id.to_string() }
    }
}
