//! Command-line options for the headless arena runner.

use std::path::PathBuf;

use clap::Parser;

use guardian_core::constants::TICK_RATE;
use guardian_core::enums::Scenario;
use guardian_sim::ArenaConfig;

use crate::game_loop::LoopOptions;

/// Run an engagement arena and stream snapshots as JSON lines on stdout.
///
/// Arena commands are read from stdin, one JSON object per line.
#[derive(Debug, Parser)]
#[command(name = "guardian")]
#[command(about = "Headless arena for autonomous engagement controllers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Scenario to start: duel, skirmish or swarm
    #[arg(long, default_value = "duel", value_parser = parse_scenario)]
    pub scenario: Scenario,

    /// RNG seed; the same seed replays the same run
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Simulation ticks per second
    #[arg(long, default_value_t = TICK_RATE)]
    pub tick_rate: u32,

    /// Simulated seconds per wall-clock second
    #[arg(long, default_value_t = 1.0)]
    pub time_scale: f64,

    /// Engagement config (JSON) given to every agent
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pace ticks against the wall clock
    #[arg(long)]
    pub realtime: bool,

    /// Write every n-th snapshot
    #[arg(long, default_value_t = 1)]
    pub emit_every: u64,

    /// Keep ticking after one team remains
    #[arg(long)]
    pub keep_running: bool,
}

fn parse_scenario(label: &str) -> Result<Scenario, String> {
    Scenario::from_label(label).ok_or_else(|| {
        let known: Vec<&str> = Scenario::ALL.iter().map(|s| s.label()).collect();
        format!("unknown scenario '{label}', expected one of: {}", known.join(", "))
    })
}

impl Cli {
    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            seed: self.seed,
            tick_rate: self.tick_rate,
            time_scale: self.time_scale,
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            max_ticks: self.ticks,
            realtime: self.realtime,
            emit_every: self.emit_every,
            stop_when_finished: !self.keep_running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["guardian"]).unwrap();
        assert_eq!(cli.scenario, Scenario::Duel);
        assert_eq!(cli.arena_config(), ArenaConfig::default());
        assert_eq!(cli.loop_options(), LoopOptions::default());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_run_options() {
        let cli = Cli::try_parse_from([
            "guardian",
            "--scenario",
            "SWARM",
            "--seed",
            "9",
            "--ticks",
            "600",
            "--time-scale",
            "2.5",
            "--emit-every",
            "30",
            "--keep-running",
        ])
        .unwrap();
        assert_eq!(cli.scenario, Scenario::Swarm);
        assert_eq!(cli.arena_config().seed, 9);
        assert_eq!(cli.arena_config().time_scale, 2.5);
        let options = cli.loop_options();
        assert_eq!(options.max_ticks, Some(600));
        assert_eq!(options.emit_every, 30);
        assert!(!options.stop_when_finished);
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        let err = Cli::try_parse_from(["guardian", "--scenario", "melee"]).unwrap_err();
        assert!(err.to_string().contains("unknown scenario"));
    }
}
