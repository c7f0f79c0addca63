// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::stats::CategoryTotal;
use crate::utils::{fmt_money, maybe_print_json, parse_period, pretty_table};
use anyhow::Result;

pub async fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("stats", sub)) => stats(ledger, sub).await?,
        _ => {}
    }
    Ok(())
}

fn breakdown_rows(kind: &str, rows: &[CategoryTotal]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|c| {
            vec![
                kind.to_string(),
                format!("{} {}", c.icon, c.category_name),
                fmt_money(&c.amount),
            ]
        })
        .collect()
}

async fn stats(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let period = parse_period(sub.get_one::<String>("month"))?;
    let summary = ledger.summarize(period).await?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }

    let totals = vec![vec![
        summary.period.to_string(),
        fmt_money(&summary.total_income),
        fmt_money(&summary.total_expense),
        fmt_money(&summary.balance),
        summary.transaction_count.to_string(),
    ]];
    println!(
        "{}",
        pretty_table(&["Month", "Income", "Expense", "Balance", "Count"], totals)
    );

    let mut data = breakdown_rows("expense", &summary.expense_by_category);
    data.extend(breakdown_rows("income", &summary.income_by_category));
    if !data.is_empty() {
        println!("{}", pretty_table(&["Type", "Category", "Amount"], data));
    }
    Ok(())
}
