// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ledgerkv::{cli, commands, db, ledger::Ledger};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();

    let level = matches
        .get_one::<String>("log_level")
        .cloned()
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let backend = db::open_or_init(matches.get_one::<PathBuf>("db").map(PathBuf::as_path))?;
    let ledger = Ledger::new(Arc::new(backend), cli::store_config(&matches))?;

    match matches.subcommand() {
        Some(("tx", sub)) => commands::transactions::handle(&ledger, sub).await?,
        Some(("category", sub)) => commands::categories::handle(&ledger, sub).await?,
        Some(("budget", sub)) => commands::budgets::handle(&ledger, sub).await?,
        Some(("report", sub)) => commands::reports::handle(&ledger, sub).await?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
