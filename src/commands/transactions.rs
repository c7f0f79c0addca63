// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{NewTransaction, Transaction, TransactionPatch};
use crate::utils::{fmt_money, hint_from, maybe_print_json, parse_decimal, parse_period, pretty_table};
use anyhow::Result;
use serde::Serialize;

pub async fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub).await?,
        Some(("list", sub)) => list(ledger, sub).await?,
        Some(("update", sub)) => update(ledger, sub).await?,
        Some(("rm", sub)) => rm(ledger, sub).await?,
        _ => {}
    }
    Ok(())
}

fn opt_string(sub: &clap::ArgMatches, name: &str) -> Option<String> {
    sub.get_one::<String>(name).map(|s| s.to_string())
}

async fn add(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let input = NewTransaction {
        kind: opt_string(sub, "type").unwrap_or_default(),
        amount: parse_decimal(sub.get_one::<String>("amount").map_or("", |s| s.as_str()))?,
        category: opt_string(sub, "category").unwrap_or_default(),
        occurred_on: opt_string(sub, "date").unwrap_or_default(),
        note: opt_string(sub, "note"),
    };
    let t = ledger.create_transaction(&input).await?;
    println!(
        "Recorded {} {} on {} in '{}' (id: {})",
        t.kind,
        fmt_money(&t.amount),
        t.occurred_on,
        t.category,
        t.id
    );
    Ok(())
}

async fn update(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").map_or("", |s| s.trim());
    let patch = TransactionPatch {
        kind: opt_string(sub, "type"),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        category: opt_string(sub, "category"),
        occurred_on: opt_string(sub, "date"),
        note: opt_string(sub, "note"),
    };
    let hint = hint_from(sub)?;
    let t = ledger.update_transaction(id, &patch, &hint).await?;
    println!("Updated {} ({} {} on {})", t.id, t.kind, fmt_money(&t.amount), t.occurred_on);
    Ok(())
}

async fn rm(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").map_or("", |s| s.trim());
    let hint = hint_from(sub)?;
    let t = ledger.delete_transaction(id, &hint).await?;
    println!("Removed {} ({} on {})", t.id, fmt_money(&t.amount), t.occurred_on);
    Ok(())
}

async fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(ledger, sub).await?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.id.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "ID", "Type", "Amount", "Category", "Note"], rows)
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub note: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id.clone(),
            date: t.occurred_on.to_string(),
            kind: t.kind.to_string(),
            amount: fmt_money(&t.amount),
            category: t.category.clone(),
            note: t.note.clone(),
        }
    }
}

pub async fn query_rows(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let period = parse_period(sub.get_one::<String>("month"))?;
    let records = ledger.list_transactions(period).await?;
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);
    Ok(records.iter().take(limit).map(TransactionRow::from).collect())
}
