//! Runs every hosted controller against this tick's catalog.
//!
//! Agents update sequentially in id order. Each update is wrapped in an
//! unwind guard: a panicking controller is logged, its outputs for the tick
//! are discarded, and the remaining agents still update.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use hecs::World;
use tracing::error;

use guardian_core::events::ArenaEvent;
use guardian_core::types::AgentId;
use guardian_targeting::catalog::TargetCatalog;

use crate::agent::AgentSlot;
use crate::systems::perception;

/// Tick every agent. Results land in each slot's `last`.
pub fn run(
    world: &World,
    slots: &mut BTreeMap<AgentId, AgentSlot>,
    catalog: &TargetCatalog,
    dt: f64,
    events: &mut Vec<ArenaEvent>,
) {
    let team_sizes = perception::team_sizes(slots);

    for slot in slots.values_mut() {
        let teammates = team_sizes
            .get(&slot.team)
            .map_or(0, |n| n.saturating_sub(1));
        let Some(state) = perception::agent_state(world, slot, teammates) else {
            slot.last = None;
            continue;
        };

        let config = &slot.config;
        let controller = &mut slot.controller;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            controller.tick(dt, &state, catalog, config)
        }));

        match outcome {
            Ok(snapshot) => slot.last = Some(snapshot),
            Err(payload) => {
                slot.faults += 1;
                slot.last = None;
                let reason = panic_message(payload.as_ref());
                error!(agent = %slot.agent, faults = slot.faults, %reason, "controller panicked, tick discarded");
                events.push(ArenaEvent::AgentFault { agent: slot.agent });
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
