// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::config::StoreConfig;

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn hint_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("id")
            .long("id")
            .required(true)
            .help("Transaction id"),
    )
    .arg(
        Arg::new("on")
            .long("on")
            .help("Date the transaction is currently recorded on (YYYY-MM-DD)"),
    )
    .arg(
        Arg::new("in_month")
            .long("in-month")
            .help("Month the transaction is currently recorded in (YYYY-MM)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("ledgerkv")
        .about("Sharded personal ledger over a key-value store")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("LEDGERKV_DB")
                .value_parser(value_parser!(PathBuf))
                .help("SQLite file backing the key-value store"),
        )
        .arg(
            Arg::new("fan_out")
                .long("fan-out")
                .global(true)
                .env("LEDGERKV_FAN_OUT")
                .value_parser(value_parser!(usize))
                .help("Maximum concurrent key reads per fan-out"),
        )
        .arg(
            Arg::new("search_periods")
                .long("search-periods")
                .global(true)
                .env("LEDGERKV_SEARCH_PERIODS")
                .value_parser(value_parser!(u32))
                .help("Months searched when updating or deleting without a hint"),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log filter used when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("type").long("type").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("month").long("month").help("YYYY-MM, defaults to the current month"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(hint_args(
                    Command::new("update")
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("note").long("note")),
                ))
                .subcommand(hint_args(Command::new("rm"))),
        )
        .subcommand(
            Command::new("category")
                .about("Categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("type").long("type").required(true))
                        .arg(Arg::new("icon").long("icon")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("budget")
                .about("Budget limits")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("report").about("Reports").subcommand(json_flags(
                Command::new("stats").arg(Arg::new("month").long("month")),
            )),
        )
}

/// Store tunables from global arguments, defaults for the rest.
pub fn store_config(m: &ArgMatches) -> StoreConfig {
    let mut config = StoreConfig::default();
    if let Some(n) = m.get_one::<usize>("fan_out") {
        config.fan_out = *n;
    }
    if let Some(n) = m.get_one::<u32>("search_periods") {
        config.search_periods = *n;
    }
    config
}
