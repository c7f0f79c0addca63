// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record identifier generation.
//!
//! An id is `<millis><r1><r2>` in base 36: the millisecond clock followed by
//! two independent random words, each zero-padded so ids from one clock tick
//! stay the same length. Collisions are checked against the shard the id
//! would land in, never globally.

use chrono::Utc;
use rand::Rng;

use crate::error::{Result, StoreError};

const RANDOM_WIDTH: usize = 7;

pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let mut rng = rand::thread_rng();
        let r1: u32 = rng.r#gen();
        let r2: u32 = rng.r#gen();
        format!(
            "{}{:0>w$}{:0>w$}",
            to_base36(millis),
            to_base36(u64::from(r1)),
            to_base36(u64::from(r2)),
            w = RANDOM_WIDTH
        )
    }
}

pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

pub struct IdAllocator {
    source: Box<dyn IdSource>,
    max_regenerations: u32,
}

impl IdAllocator {
    pub fn new(source: Box<dyn IdSource>, max_regenerations: u32) -> Self {
        Self {
            source,
            max_regenerations,
        }
    }

    pub fn random(max_regenerations: u32) -> Self {
        Self::new(Box::new(RandomIdSource), max_regenerations)
    }

    /// Total candidates tried before giving up.
    pub fn attempts(&self) -> u32 {
        self.max_regenerations + 1
    }

    pub fn generate(&self) -> String {
        self.source.next_id()
    }

    /// Picks an id not yet taken in a fixed scope.
    pub fn allocate(&self, taken: impl Fn(&str) -> bool) -> Result<String> {
        for _ in 0..self.attempts() {
            let id = self.generate();
            if !taken(&id) {
                return Ok(id);
            }
        }
        Err(self.exhausted())
    }

    pub fn exhausted(&self) -> StoreError {
        StoreError::ResourceExhausted {
            attempts: self.attempts(),
        }
    }
}
