// Copyright (c) 2026 The nvim-jump Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use clap::Parser;
use std::path::PathBuf;

use nvim_jump::editor::NvimConnector;
use nvim_jump::error::AnyResult;
use nvim_jump::{config, log, server};

/// nvim-jump: open files in a running Neovim at a given line and column
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.nvim-jump/config/nvim-jump.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let (config, warnings) = config::load(cli.config).await?;

    // 2. Initialize logging (should be the first side effect)
    let _log_guard = log::init(&config)?;
    tracing::info!("Starting up (v{})", env!("CARGO_PKG_VERSION"));
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    // 3. Start accepting jump requests
    let connector = NvimConnector::new(config.editor.address.clone());
    tracing::info!("Forwarding jump requests to Neovim at {}", connector.address());
    let server_handle = server::start(&config.server, connector).await?;
    tracing::info!("Listening on {}", server_handle.local_addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, shutting down...");

    server_handle.shutdown().await?;

    tracing::info!("Shutting down");

    Ok(())
}
