// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

use crate::models::{parse_day, LocateHint, Period};

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// `None` means the current month.
pub fn parse_period(s: Option<&String>) -> Result<Period> {
    match s {
        Some(raw) => Ok(raw.parse::<Period>()?),
        None => Ok(Period::current()),
    }
}

pub fn hint_from(sub: &clap::ArgMatches) -> Result<LocateHint> {
    let day = sub
        .get_one::<String>("on")
        .map(|s| parse_day(s))
        .transpose()?;
    let period = sub
        .get_one::<String>("in_month")
        .map(|s| s.parse::<Period>())
        .transpose()?;
    Ok(LocateHint { day, period })
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
