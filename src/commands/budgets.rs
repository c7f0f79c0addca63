// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;

pub async fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(ledger, sub).await?,
        Some(("list", sub)) => list(ledger, sub).await?,
        _ => {}
    }
    Ok(())
}

async fn set(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let key = sub.get_one::<String>("key").map_or("", |s| s.trim());
    let amount = parse_decimal(sub.get_one::<String>("amount").map_or("", |s| s.as_str()))?;
    // The document is replaced whole, so merge into what is stored.
    let mut budgets = ledger.get_budgets().await?;
    budgets.insert(key.to_string(), amount);
    ledger.set_budgets(&budgets).await?;
    println!("Budget set for {} = {}", key, fmt_money(&amount));
    Ok(())
}

async fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let budgets = ledger.get_budgets().await?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        let data = budgets
            .iter()
            .map(|(k, v)| vec![k.clone(), fmt_money(v)])
            .collect();
        println!("{}", pretty_table(&["Key", "Limit"], data));
    }
    Ok(())
}
