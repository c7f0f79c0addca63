// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::NewCategory;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub async fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = NewCategory {
                name: sub.get_one::<String>("name").cloned().unwrap_or_default(),
                icon: sub.get_one::<String>("icon").cloned(),
                kind: sub.get_one::<String>("type").cloned().unwrap_or_default(),
            };
            let c = ledger.create_category(&input).await?;
            println!("Added category '{}' ({}, id: {})", c.name, c.kind, c.id);
        }
        Some(("list", sub)) => {
            let categories = ledger.list_categories().await?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &categories)? {
                let data = categories
                    .iter()
                    .map(|c| vec![c.id.clone(), c.icon.clone(), c.name.clone(), c.kind.to_string()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Icon", "Category", "Type"], data));
            }
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").map_or("", |s| s.trim());
            let c = ledger.delete_category(id).await?;
            println!("Removed category '{}'", c.name);
        }
        _ => {}
    }
    Ok(())
}
