//! Game loop thread: runs the arena engine and streams snapshots.
//!
//! The engine moves into the loop thread. Commands arrive via an `mpsc`
//! channel. Every emitted snapshot is written as one JSON line to the
//! output sink and stored in shared state for polling.

use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, info, warn};

use guardian_core::commands::ArenaCommand;
use guardian_core::constants::TICK_RATE;
use guardian_core::enums::ArenaPhase;
use guardian_core::state::ArenaSnapshot;
use guardian_sim::ArenaEngine;

use crate::state::{LoopCommand, SharedSnapshot};

/// Wall-clock duration of one tick at the default rate.
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// Wall-clock duration of one tick at `tick_rate`. Time scale needs no
/// adjustment here since the engine already folds it into `dt`.
pub fn tick_duration(tick_rate: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(tick_rate.max(1)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    /// Stop after this many ticks. `None` runs until shutdown or the arena finishes.
    pub max_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of running flat out.
    pub realtime: bool,
    /// Write every n-th snapshot. The final snapshot is always written.
    pub emit_every: u64,
    pub stop_when_finished: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_ticks: None,
            realtime: false,
            emit_every: 1,
            stop_when_finished: true,
        }
    }
}

/// Spawns the game loop in a new thread.
///
/// Returns the command sender and a handle yielding the number of ticks run.
pub fn spawn_game_loop<W>(
    engine: ArenaEngine,
    options: LoopOptions,
    out: W,
    latest_snapshot: SharedSnapshot,
) -> std::io::Result<(mpsc::Sender<LoopCommand>, JoinHandle<anyhow::Result<u64>>)>
where
    W: Write + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();

    let handle = std::thread::Builder::new()
        .name("guardian-game-loop".into())
        .spawn(move || {
            let mut out = out;
            run_game_loop(engine, cmd_rx, options, &mut out, &latest_snapshot)
        })?;

    Ok((cmd_tx, handle))
}

/// The game loop. Runs until Shutdown, channel disconnect, the tick limit,
/// or (optionally) the arena finishing. Returns the number of ticks run.
pub fn run_game_loop<W: Write>(
    mut engine: ArenaEngine,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    options: LoopOptions,
    out: &mut W,
    latest_snapshot: &Mutex<Option<ArenaSnapshot>>,
) -> anyhow::Result<u64> {
    let emit_every = options.emit_every.max(1);
    let mut next_tick_time = Instant::now();
    let mut ticks = 0u64;

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(LoopCommand::Arena(cmd)) => engine.queue_command(cmd),
                Ok(LoopCommand::Shutdown) => {
                    info!(ticks, "game loop shut down");
                    return Ok(ticks);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    debug!(ticks, "command channel closed");
                    return Ok(ticks);
                }
            }
        }

        // 2. Advance one tick (the engine handles pause internally)
        let snapshot = engine.tick();
        ticks += 1;

        let finished = options.stop_when_finished && snapshot.phase == ArenaPhase::Finished;
        let last = finished || options.max_ticks.is_some_and(|max| ticks >= max);

        // 3. Write the snapshot as one JSON line
        if last || ticks % emit_every == 0 {
            serde_json::to_writer(&mut *out, &snapshot).context("failed to encode snapshot")?;
            out.write_all(b"\n").context("failed to write snapshot")?;
            if options.realtime || last {
                out.flush().context("failed to flush snapshot output")?;
            }
        }

        // 4. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        if last {
            info!(ticks, finished, "game loop complete");
            return Ok(ticks);
        }

        // 5. Sleep until the next tick
        if options.realtime {
            let period = tick_duration(engine.tick_rate());
            next_tick_time += period;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > period * 2 {
                // Too far behind; reset rather than spiral
                next_tick_time = now;
            }
        }
    }
}

/// Read one JSON `ArenaCommand` per line and forward each to the loop.
/// Blank lines are skipped, malformed lines logged and skipped. Stops at
/// end of input or when the loop has gone. Returns the number forwarded.
pub fn forward_commands<R: BufRead>(reader: R, cmd_tx: &mpsc::Sender<LoopCommand>) -> usize {
    let mut forwarded = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "command input failed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ArenaCommand>(line) {
            Ok(cmd) => {
                if cmd_tx.send(LoopCommand::Arena(cmd)).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(err) => warn!(line = index + 1, %err, "ignoring malformed command"),
        }
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::enums::Scenario;
    use guardian_core::types::TargetId;
    use guardian_sim::ArenaConfig;
    use std::io::Cursor;

    fn engine(seed: u64) -> ArenaEngine {
        ArenaEngine::new(ArenaConfig {
            seed,
            ..ArenaConfig::default()
        })
    }

    fn lines(out: &[u8]) -> Vec<ArenaSnapshot> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();

        tx.send(LoopCommand::Arena(ArenaCommand::StartScenario {
            scenario: Scenario::Duel,
        }))
        .unwrap();
        tx.send(LoopCommand::Arena(ArenaCommand::Pause)).unwrap();
        tx.send(LoopCommand::Shutdown).unwrap();

        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }

        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            LoopCommand::Arena(ArenaCommand::StartScenario { .. })
        ));
        assert!(matches!(commands[1], LoopCommand::Arena(ArenaCommand::Pause)));
        assert!(matches!(commands[2], LoopCommand::Shutdown));
    }

    #[test]
    fn test_tick_duration_constant() {
        // 30Hz = 33.333ms per tick
        let expected_nanos = 1_000_000_000u64 / 30;
        assert_eq!(TICK_DURATION.as_nanos(), expected_nanos as u128);
        assert_eq!(tick_duration(TICK_RATE), TICK_DURATION);
        assert_eq!(tick_duration(60).as_nanos(), 16_666_666);
        assert_eq!(tick_duration(0), Duration::from_secs(1));
    }

    #[test]
    fn test_loop_writes_one_line_per_tick() {
        let (tx, rx) = mpsc::channel();
        tx.send(LoopCommand::Arena(ArenaCommand::StartScenario {
            scenario: Scenario::Duel,
        }))
        .unwrap();
        let latest = Mutex::new(None);
        let mut out = Vec::new();
        let options = LoopOptions {
            max_ticks: Some(5),
            ..LoopOptions::default()
        };

        let ticks = run_game_loop(engine(7), rx, options, &mut out, &latest).unwrap();

        assert_eq!(ticks, 5);
        let snaps = lines(&out);
        assert_eq!(snaps.len(), 5);
        assert_eq!(snaps[0].phase, ArenaPhase::Active);
        assert_eq!(snaps[4].time.tick, 5);
        let stored = latest.lock().unwrap().clone().unwrap();
        assert_eq!(stored.time.tick, 5);
        assert_eq!(stored.hulls.len(), snaps[4].hulls.len());
    }

    #[test]
    fn test_emit_every_keeps_final_snapshot() {
        let (tx, rx) = mpsc::channel();
        tx.send(LoopCommand::Arena(ArenaCommand::StartScenario {
            scenario: Scenario::Skirmish,
        }))
        .unwrap();
        let mut out = Vec::new();
        let options = LoopOptions {
            max_ticks: Some(10),
            emit_every: 4,
            ..LoopOptions::default()
        };

        run_game_loop(engine(3), rx, options, &mut out, &Mutex::new(None)).unwrap();

        let ticks: Vec<u64> = lines(&out).iter().map(|s| s.time.tick).collect();
        assert_eq!(ticks, vec![4, 8, 10]);
    }

    #[test]
    fn test_shutdown_stops_before_ticking() {
        let (tx, rx) = mpsc::channel();
        tx.send(LoopCommand::Shutdown).unwrap();
        let mut out = Vec::new();

        let ticks = run_game_loop(engine(1), rx, LoopOptions::default(), &mut out, &Mutex::new(None)).unwrap();

        assert_eq!(ticks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_disconnect_stops_loop() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();
        drop(tx);

        let ticks = run_game_loop(engine(1), rx, LoopOptions::default(), &mut Vec::new(), &Mutex::new(None)).unwrap();

        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_loop_stops_when_arena_finishes() {
        let mut engine = engine(11);
        engine.queue_command(ArenaCommand::StartScenario {
            scenario: Scenario::Duel,
        });
        engine.tick();
        let agent = engine.agents().next().unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(LoopCommand::Arena(ArenaCommand::Despawn {
            target: TargetId::new(agent.get()),
        }))
        .unwrap();
        let mut out = Vec::new();

        let ticks = run_game_loop(engine, rx, LoopOptions::default(), &mut out, &Mutex::new(None)).unwrap();

        assert_eq!(ticks, 1);
        let snaps = lines(&out);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].phase, ArenaPhase::Finished);
        // The sender outlives the loop.
        drop(tx);
    }

    #[test]
    fn test_spawned_loop_publishes_snapshot() {
        let latest = SharedSnapshot::default();
        let options = LoopOptions {
            max_ticks: Some(3),
            ..LoopOptions::default()
        };
        let mut engine = engine(2);
        engine.queue_command(ArenaCommand::StartScenario {
            scenario: Scenario::Swarm,
        });
        let (tx, handle) = spawn_game_loop(engine, options, std::io::sink(), latest.clone()).unwrap();

        let ticks = handle.join().unwrap().unwrap();

        assert_eq!(ticks, 3);
        let snap = latest.lock().unwrap().clone().unwrap();
        assert_eq!(snap.time.tick, 3);
        drop(tx);
    }

    #[test]
    fn test_pause_resume_via_commands() {
        let mut engine = engine(42);

        engine.queue_command(ArenaCommand::StartScenario {
            scenario: Scenario::Duel,
        });
        let snap = engine.tick();
        assert_eq!(snap.phase, ArenaPhase::Active);

        engine.queue_command(ArenaCommand::Pause);
        let snap = engine.tick();
        assert_eq!(snap.phase, ArenaPhase::Paused);
        let paused_tick = snap.time.tick;

        // Tick while paused: time should not advance
        let snap = engine.tick();
        assert_eq!(snap.time.tick, paused_tick);

        engine.queue_command(ArenaCommand::Resume);
        let snap = engine.tick();
        assert_eq!(snap.phase, ArenaPhase::Active);
        assert!(snap.time.tick > paused_tick);
    }

    #[test]
    fn test_forward_commands_skips_bad_lines() {
        let input = "{\"type\":\"Pause\"}\n\nnot json\n{\"type\":\"SetTimeScale\",\"scale\":2.0}\n";
        let (tx, rx) = mpsc::channel();

        let forwarded = forward_commands(Cursor::new(input), &tx);

        assert_eq!(forwarded, 2);
        assert!(matches!(rx.try_recv(), Ok(LoopCommand::Arena(ArenaCommand::Pause))));
        assert!(matches!(
            rx.try_recv(),
            Ok(LoopCommand::Arena(ArenaCommand::SetTimeScale { scale })) if scale == 2.0
        ));
    }
}
