//! `guardian`: headless arena runner.

use std::io::BufWriter;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;

use guardian_app::cli::Cli;
use guardian_app::game_loop::{forward_commands, spawn_game_loop};
use guardian_app::state::LoopState;
use guardian_core::commands::ArenaCommand;
use guardian_core::config::EngagementConfig;
use guardian_sim::ArenaEngine;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut engine = ArenaEngine::new(cli.arena_config());
    if let Some(path) = &cli.config {
        let config = EngagementConfig::from_path(path)
            .with_context(|| format!("loading engagement config {}", path.display()))?;
        engine = engine.with_agent_config(config);
    }
    engine.queue_command(ArenaCommand::StartScenario {
        scenario: cli.scenario,
    });
    info!(scenario = cli.scenario.label(), seed = cli.seed, "starting arena");

    let state = LoopState::new();
    let out = BufWriter::new(std::io::stdout());
    let (cmd_tx, handle) = spawn_game_loop(engine, cli.loop_options(), out, state.latest_snapshot.clone())
        .context("failed to spawn game loop thread")?;

    let input_tx = cmd_tx.clone();
    *state
        .command_tx
        .lock()
        .map_err(|_| anyhow::anyhow!("loop state poisoned"))? = Some(cmd_tx);

    // Detached: blocks on stdin and ends with the process.
    std::thread::Builder::new()
        .name("guardian-stdin".into())
        .spawn(move || {
            let forwarded = forward_commands(std::io::stdin().lock(), &input_tx);
            info!(forwarded, "command input closed");
        })
        .context("failed to spawn command reader thread")?;

    let ticks = handle
        .join()
        .map_err(|_| anyhow::anyhow!("game loop thread panicked"))??;
    state.shutdown();
    info!(ticks, "arena run complete");
    Ok(())
}

/// Log to stderr so stdout carries only snapshots. `RUST_LOG` overrides
/// the default `info` level.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
