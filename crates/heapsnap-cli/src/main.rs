mod cli;
mod commands;
mod output;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;
use heapsnap_core::AnalyzerConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean; RUST_LOG overrides
    let default_level = if cli.global.verbose {
        "heapsnap=debug"
    } else {
        "heapsnap=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .init();

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_ctrlc = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        info!("Received interrupt, stopping after the current root...");
        cancel_ctrlc.store(true, Ordering::Relaxed);
    })?;

    let config = AnalyzerConfig::load_or_default(&cli.global.config)?;
    debug!("Analyzer config: {:?}", config);

    let ctx = Context {
        config,
        cancel,
        json: cli.global.json,
    };

    match cli.command {
        Command::Summary { capture, top } => commands::summary::run(&ctx, &capture, top),
        Command::Inspect { capture, address } => commands::inspect::run(&ctx, &capture, &address),
        Command::Path { capture, address } => commands::path::run(&ctx, &capture, &address),
        Command::Diff {
            before,
            after,
            include,
            exclude,
            output,
            limit,
        } => commands::diff::run(
            &ctx,
            &before,
            &after,
            commands::diff::DiffOptions {
                include,
                exclude,
                output,
                limit,
            },
        ),
        Command::Hexdump {
            capture,
            address,
            size,
            ascii,
        } => commands::hexdump::run(&capture, &address, size, ascii),
    }
}
