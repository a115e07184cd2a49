//! State shared between the command reader and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use guardian_core::commands::ArenaCommand;
use guardian_core::state::ArenaSnapshot;

/// Commands sent from the input side to the game loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// An arena command to forward to the engine.
    Arena(ArenaCommand),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// Latest snapshot, updated by the game loop after every tick.
pub type SharedSnapshot = Arc<Mutex<Option<ArenaSnapshot>>>;

/// Handles held by the side that drives a running loop.
///
/// `mpsc::Sender` is not `Sync`, so it sits behind a `Mutex` like the
/// snapshot does. `None` once the loop has been told to stop.
pub struct LoopState {
    pub command_tx: Mutex<Option<mpsc::Sender<LoopCommand>>>,
    pub latest_snapshot: SharedSnapshot,
}

impl Default for LoopState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
        }
    }
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a command. Returns false if no loop is attached or it has exited.
    pub fn send(&self, command: ArenaCommand) -> bool {
        let Ok(lock) = self.command_tx.lock() else {
            return false;
        };
        lock.as_ref()
            .is_some_and(|tx| tx.send(LoopCommand::Arena(command)).is_ok())
    }

    /// Ask the loop to stop and detach from it.
    pub fn shutdown(&self) {
        if let Ok(mut lock) = self.command_tx.lock() {
            if let Some(tx) = lock.take() {
                let _ = tx.send(LoopCommand::Shutdown);
            }
        }
    }

    pub fn latest(&self) -> Option<ArenaSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|s| s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_creation() {
        let state = LoopState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest().is_none());
        assert!(!state.send(ArenaCommand::Pause));
    }

    #[test]
    fn test_send_and_shutdown() {
        let state = LoopState::new();
        let (tx, rx) = mpsc::channel();
        *state.command_tx.lock().unwrap() = Some(tx);

        assert!(state.send(ArenaCommand::Pause));
        state.shutdown();
        assert!(!state.send(ArenaCommand::Resume));

        assert!(matches!(rx.try_recv(), Ok(LoopCommand::Arena(ArenaCommand::Pause))));
        assert!(matches!(rx.try_recv(), Ok(LoopCommand::Shutdown)));
        assert!(rx.try_recv().is_err());
    }
}
