// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::ids::IdAllocator;
use crate::kv::{read_json, write_json, KvBackend};
use crate::models::{Category, Kind, NewCategory, DEFAULT_ICON};

pub const CATEGORIES_KEY: &str = "categories";

/// Seeded into an empty collection on first listing.
pub fn default_categories() -> Vec<Category> {
    [
        ("food", "Food", "🍔", Kind::Expense),
        ("transport", "Transport", "🚗", Kind::Expense),
        ("shopping", "Shopping", "🛍️", Kind::Expense),
        ("entertainment", "Entertainment", "🎬", Kind::Expense),
        ("medical", "Medical", "🏥", Kind::Expense),
        ("education", "Education", "📚", Kind::Expense),
        ("salary", "Salary", "💰", Kind::Income),
        ("bonus", "Bonus", "🎁", Kind::Income),
        ("investment", "Investment", "📈", Kind::Income),
    ]
    .into_iter()
    .map(|(id, name, icon, kind)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        kind,
    })
    .collect()
}

/// The category collection, kept whole under a single key.
pub struct CategoryStore {
    backend: Arc<dyn KvBackend>,
    ids: IdAllocator,
}

impl CategoryStore {
    pub fn new(backend: Arc<dyn KvBackend>, ids: IdAllocator) -> Self {
        Self { backend, ids }
    }

    /// Stored categories, or the defaults without persisting them.
    pub async fn load(&self) -> Result<Vec<Category>> {
        let stored: Vec<Category> = read_json(self.backend.as_ref(), CATEGORIES_KEY).await?;
        if stored.is_empty() {
            return Ok(default_categories());
        }
        Ok(stored)
    }

    /// Like [`load`](Self::load) but writes the defaults back when the
    /// collection is empty.
    pub async fn list(&self) -> Result<Vec<Category>> {
        let stored: Vec<Category> = read_json(self.backend.as_ref(), CATEGORIES_KEY).await?;
        if !stored.is_empty() {
            return Ok(stored);
        }
        let defaults = default_categories();
        write_json(self.backend.as_ref(), CATEGORIES_KEY, &defaults).await?;
        Ok(defaults)
    }

    pub async fn create(&self, input: &NewCategory) -> Result<Category> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("category name must not be empty"));
        }
        let kind: Kind = input.kind.parse()?;

        let mut categories = self.load().await?;
        if categories
            .iter()
            .any(|c| c.name.trim() == name && c.kind == kind)
        {
            return Err(StoreError::validation(format!(
                "category '{}' already exists for {}",
                name, kind
            )));
        }

        let id = self
            .ids
            .allocate(|candidate| categories.iter().any(|c| c.id == candidate))?;
        let icon = input
            .icon
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ICON);
        let category = Category {
            id,
            name: name.to_string(),
            icon: icon.to_string(),
            kind,
        };
        categories.push(category.clone());
        write_json(self.backend.as_ref(), CATEGORIES_KEY, &categories).await?;
        Ok(category)
    }

    pub async fn delete(&self, id: &str) -> Result<Category> {
        let mut categories = self.load().await?;
        let index = categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        let removed = categories.remove(index);
        write_json(self.backend.as_ref(), CATEGORIES_KEY, &categories).await?;
        Ok(removed)
    }
}
