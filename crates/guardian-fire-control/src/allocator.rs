//! Weapon-to-target allocation.
//!
//! Given the ranked candidates of a scan, decides which mount holds which
//! targets. Existing pairings are kept unless a challenger beats them by
//! more than the hysteresis margin; freed capacity is then filled in mount
//! order. Indirect-fire mounts share two budgets: munitions per target and
//! distinct targets for the whole agent. Both count munitions already in
//! flight.

use std::collections::{BTreeMap, HashMap};

use tracing::error;

use guardian_core::types::{MountId, TargetId};
use guardian_targeting::scoring::RankedTarget;

use crate::engagement::{EngagementTable, MunitionLedger};

/// Allocation view of one mount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountSlot {
    pub mount: MountId,
    pub indirect: bool,
    /// Simultaneous targets this mount may hold.
    pub capacity: usize,
    /// False when out of ammunition. Unavailable mounts hold nothing.
    pub available: bool,
    /// Mid-burst; existing pairings cannot be displaced.
    pub locked: bool,
}

/// Agent-wide limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationLimits {
    /// Distinct targets engaged by indirect fire at once.
    pub max_indirect_targets: usize,
    /// Indirect munitions (reserved plus in flight) on a single target.
    pub max_munitions_per_target: usize,
    pub score_hysteresis: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationPass {
    /// Full rescan: existing pairings may be displaced.
    Scan,
    /// Between scans after a loss: keep everything valid, only fill gaps.
    Immediate,
}

/// One (mount, target) pairing produced by an allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub mount: MountId,
    pub target: TargetId,
    pub score: f64,
    /// Carried over from the previous allocation.
    pub retained: bool,
}

/// Stateless between calls apart from reusable scratch buffers.
#[derive(Debug, Default)]
pub struct EngagementAllocator {
    rank_of: HashMap<TargetId, (usize, f64)>,
    indirect_load: BTreeMap<TargetId, usize>,
    held: BTreeMap<MountId, Vec<TargetId>>,
}

impl EngagementAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the full set of pairings. `ranked` must be sorted best first;
    /// `eligible` reports whether a mount can currently reach a target.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &mut self,
        ranked: &[RankedTarget],
        slots: &[MountSlot],
        existing: &EngagementTable,
        ledger: &MunitionLedger,
        limits: &AllocationLimits,
        pass: AllocationPass,
        eligible: impl Fn(MountId, TargetId) -> bool,
    ) -> Vec<Assignment> {
        self.reset(ranked, ledger);
        let mut out = Vec::new();
        if ranked.is_empty() {
            return out;
        }

        let mut order: Vec<&MountSlot> = slots
            .iter()
            .filter(|s| s.available && s.capacity > 0)
            .collect();
        order.sort_by_key(|s| s.mount);

        // --- Retain ---
        for slot in &order {
            for eng in existing.of_mount(slot.mount) {
                if self.held_count(slot.mount) >= slot.capacity {
                    break;
                }
                let Some(&(_, score)) = self.rank_of.get(&eng.target) else {
                    continue;
                };
                if !eligible(slot.mount, eng.target) {
                    continue;
                }
                if slot.indirect && !self.indirect_room(eng.target, limits) {
                    continue;
                }
                if pass == AllocationPass::Scan
                    && !slot.locked
                    && self.outscored(slot, eng.target, score, ranked, existing, limits, &eligible)
                {
                    continue;
                }
                self.take(slot, eng.target, score, true, &mut out);
            }
        }

        // --- Fill ---
        for slot in &order {
            while self.held_count(slot.mount) < slot.capacity {
                let pick = if slot.indirect {
                    self.pick_indirect(slot, ranked, limits, &eligible)
                } else {
                    self.pick_direct(slot, ranked, &eligible)
                };
                let Some(r) = pick else { break };
                self.take(slot, r.target, r.score, false, &mut out);
            }
        }

        let dropped = enforce_limits(&mut out, slots, ledger, limits);
        debug_assert_eq!(dropped, 0, "allocator produced {dropped} over-capacity pairings");
        out
    }

    fn reset(&mut self, ranked: &[RankedTarget], ledger: &MunitionLedger) {
        self.rank_of.clear();
        for (i, r) in ranked.iter().enumerate() {
            self.rank_of.entry(r.target).or_insert((i, r.score));
        }
        self.indirect_load.clear();
        for entry in ledger.iter() {
            *self.indirect_load.entry(entry.target).or_default() += 1;
        }
        self.held.clear();
    }

    fn held_count(&self, mount: MountId) -> usize {
        self.held.get(&mount).map_or(0, Vec::len)
    }

    fn holds(&self, mount: MountId, target: TargetId) -> bool {
        self.held.get(&mount).is_some_and(|h| h.contains(&target))
    }

    fn load(&self, target: TargetId) -> usize {
        self.indirect_load.get(&target).copied().unwrap_or(0)
    }

    /// One more indirect munition may be committed to `target`.
    fn indirect_room(&self, target: TargetId, limits: &AllocationLimits) -> bool {
        let load = self.load(target);
        load < limits.max_munitions_per_target
            && (load > 0 || self.indirect_load.len() < limits.max_indirect_targets)
    }

    fn take(
        &mut self,
        slot: &MountSlot,
        target: TargetId,
        score: f64,
        retained: bool,
        out: &mut Vec<Assignment>,
    ) {
        self.held.entry(slot.mount).or_default().push(target);
        if slot.indirect {
            *self.indirect_load.entry(target).or_default() += 1;
        }
        out.push(Assignment {
            mount: slot.mount,
            target,
            score,
            retained,
        });
    }

    /// Best eligible challenger beats `current` by more than the margin.
    #[allow(clippy::too_many_arguments)]
    fn outscored(
        &self,
        slot: &MountSlot,
        current: TargetId,
        current_score: f64,
        ranked: &[RankedTarget],
        existing: &EngagementTable,
        limits: &AllocationLimits,
        eligible: &impl Fn(MountId, TargetId) -> bool,
    ) -> bool {
        let challenger = ranked.iter().find(|r| {
            r.target != current
                && !existing.holds(slot.mount, r.target)
                && eligible(slot.mount, r.target)
                && (!slot.indirect || self.indirect_room(r.target, limits))
        });
        challenger.is_some_and(|c| c.score - current_score > limits.score_hysteresis)
    }

    fn pick_direct(
        &self,
        slot: &MountSlot,
        ranked: &[RankedTarget],
        eligible: &impl Fn(MountId, TargetId) -> bool,
    ) -> Option<RankedTarget> {
        ranked
            .iter()
            .find(|r| !self.holds(slot.mount, r.target) && eligible(slot.mount, r.target))
            .copied()
    }

    /// Open the best unengaged target while the distinct-target budget
    /// allows, otherwise double up on the least-loaded engaged one.
    fn pick_indirect(
        &self,
        slot: &MountSlot,
        ranked: &[RankedTarget],
        limits: &AllocationLimits,
        eligible: &impl Fn(MountId, TargetId) -> bool,
    ) -> Option<RankedTarget> {
        let candidates: Vec<(usize, &RankedTarget)> = ranked
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                !self.holds(slot.mount, r.target)
                    && self.load(r.target) < limits.max_munitions_per_target
                    && eligible(slot.mount, r.target)
            })
            .collect();

        if self.indirect_load.len() < limits.max_indirect_targets {
            if let Some((_, r)) = candidates.iter().find(|(_, r)| self.load(r.target) == 0) {
                return Some(**r);
            }
        }

        candidates
            .iter()
            .filter(|(_, r)| self.load(r.target) > 0)
            .min_by_key(|(i, r)| (self.load(r.target), *i))
            .map(|(_, r)| **r)
    }
}

/// Drop pairings that break a capacity invariant. Returns how many were
/// dropped; anything non-zero is an allocator bug.
fn enforce_limits(
    out: &mut Vec<Assignment>,
    slots: &[MountSlot],
    ledger: &MunitionLedger,
    limits: &AllocationLimits,
) -> usize {
    let slot_of: HashMap<MountId, &MountSlot> = slots.iter().map(|s| (s.mount, s)).collect();
    let mut per_mount: HashMap<MountId, usize> = HashMap::new();
    let mut load: BTreeMap<TargetId, usize> = BTreeMap::new();
    for entry in ledger.iter() {
        *load.entry(entry.target).or_default() += 1;
    }

    let before = out.len();
    out.retain(|a| {
        let Some(slot) = slot_of.get(&a.mount) else {
            return false;
        };
        let held = per_mount.entry(a.mount).or_default();
        if !slot.available || *held >= slot.capacity {
            return false;
        }
        if slot.indirect {
            let current = load.get(&a.target).copied().unwrap_or(0);
            if current >= limits.max_munitions_per_target
                || (current == 0 && load.len() >= limits.max_indirect_targets)
            {
                return false;
            }
            *load.entry(a.target).or_default() += 1;
        }
        *held += 1;
        true
    });

    let dropped = before - out.len();
    if dropped > 0 {
        error!(dropped, "allocator exceeded capacity limits, excess pairings dropped");
    }
    dropped
}
