//! Engagement bookkeeping: which mount holds which target, and which
//! indirect munitions are still in flight.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use guardian_core::types::{MountId, TargetId};

/// A live (mount, target) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub mount: MountId,
    pub target: TargetId,
    /// Simulation time the pairing was created.
    pub assigned_at: f64,
    /// Score at the most recent scan that kept or created the pairing.
    pub score: f64,
    /// Aim offset from the target's center of mass.
    pub aim_offset: DVec3,
}

/// All engagements of one controller, grouped by mount.
#[derive(Debug, Clone, Default)]
pub struct EngagementTable {
    by_mount: BTreeMap<MountId, Vec<Engagement>>,
}

impl EngagementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mount: MountId, target: TargetId) -> Option<&Engagement> {
        self.by_mount
            .get(&mount)?
            .iter()
            .find(|e| e.target == target)
    }

    pub fn get_mut(&mut self, mount: MountId, target: TargetId) -> Option<&mut Engagement> {
        self.by_mount
            .get_mut(&mount)?
            .iter_mut()
            .find(|e| e.target == target)
    }

    pub fn holds(&self, mount: MountId, target: TargetId) -> bool {
        self.get(mount, target).is_some()
    }

    /// Engagements of one mount in assignment order.
    pub fn of_mount(&self, mount: MountId) -> &[Engagement] {
        self.by_mount.get(&mount).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn insert(&mut self, engagement: Engagement) {
        let list = self.by_mount.entry(engagement.mount).or_default();
        if !list.iter().any(|e| e.target == engagement.target) {
            list.push(engagement);
        }
    }

    pub fn remove(&mut self, mount: MountId, target: TargetId) -> Option<Engagement> {
        let list = self.by_mount.get_mut(&mount)?;
        let idx = list.iter().position(|e| e.target == target)?;
        let removed = list.remove(idx);
        if list.is_empty() {
            self.by_mount.remove(&mount);
        }
        Some(removed)
    }

    /// Remove every engagement of `mount`.
    pub fn clear_mount(&mut self, mount: MountId) -> Vec<Engagement> {
        self.by_mount.remove(&mount).unwrap_or_default()
    }

    /// Remove every engagement, in mount order.
    pub fn drain(&mut self) -> Vec<Engagement> {
        std::mem::take(&mut self.by_mount)
            .into_values()
            .flatten()
            .collect()
    }

    /// Remove engagements for which `keep` is false and return them.
    pub fn extract_if(&mut self, mut keep: impl FnMut(&Engagement) -> bool) -> Vec<Engagement> {
        let mut removed = Vec::new();
        for list in self.by_mount.values_mut() {
            let mut i = 0;
            while i < list.len() {
                if keep(&list[i]) {
                    i += 1;
                } else {
                    removed.push(list.remove(i));
                }
            }
        }
        self.by_mount.retain(|_, list| !list.is_empty());
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Engagement> {
        self.by_mount.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_mount.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mount.is_empty()
    }
}

/// An indirect munition on its way to a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InFlight {
    pub mount: MountId,
    pub target: TargetId,
    pub launched_at: f64,
    pub expires_at: f64,
}

/// In-flight munitions. Each entry counts against its target's
/// munition budget until it expires or is resolved.
#[derive(Debug, Clone, Default)]
pub struct MunitionLedger {
    entries: Vec<InFlight>,
}

impl MunitionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: InFlight) {
        self.entries.push(entry);
    }

    /// Munitions in flight toward `target`.
    pub fn load(&self, target: TargetId) -> usize {
        self.entries.iter().filter(|e| e.target == target).count()
    }

    /// Distinct targets with at least one munition in flight.
    pub fn targets(&self) -> BTreeSet<TargetId> {
        self.entries.iter().map(|e| e.target).collect()
    }

    /// Drop entries whose lifetime has passed.
    pub fn retire_expired(&mut self, now: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.expires_at > now);
        before - self.entries.len()
    }

    /// Drop entries whose target no longer exists.
    pub fn purge_missing(&mut self, exists: impl Fn(TargetId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| exists(e.target));
        before - self.entries.len()
    }

    /// Free the oldest munition aimed at `target`, if any.
    pub fn resolve(&mut self, target: TargetId) -> bool {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.target == target)
            .min_by(|(_, a), (_, b)| a.launched_at.total_cmp(&b.launched_at))
            .map(|(i, _)| i);
        match oldest {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &InFlight> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eng(mount: u16, target: u32) -> Engagement {
        Engagement {
            mount: MountId::new(mount),
            target: TargetId::new(target),
            assigned_at: 0.0,
            score: 1.0,
            aim_offset: DVec3::ZERO,
        }
    }

    #[test]
    fn test_table_insert_is_idempotent() {
        let mut table = EngagementTable::new();
        table.insert(eng(0, 1));
        table.insert(eng(0, 1));
        table.insert(eng(0, 2));
        assert_eq!(table.len(), 2);
        assert_eq!(table.of_mount(MountId::new(0)).len(), 2);
        assert!(table.of_mount(MountId::new(5)).is_empty());
    }

    #[test]
    fn test_table_extract_if() {
        let mut table = EngagementTable::new();
        table.insert(eng(0, 1));
        table.insert(eng(1, 2));
        table.insert(eng(1, 3));
        let removed = table.extract_if(|e| e.target != TargetId::new(2));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].target, TargetId::new(2));
        assert_eq!(table.len(), 2);

        let removed = table.extract_if(|e| e.mount != MountId::new(0));
        assert_eq!(removed.len(), 1);
        assert!(table.of_mount(MountId::new(0)).is_empty());
        assert!(!table.is_empty());
    }

    #[test]
    fn test_ledger_expiry_and_resolve() {
        let mut ledger = MunitionLedger::new();
        let t = TargetId::new(4);
        for (launched, expires) in [(0.0, 5.0), (1.0, 3.0)] {
            ledger.record(InFlight {
                mount: MountId::new(0),
                target: t,
                launched_at: launched,
                expires_at: expires,
            });
        }
        assert_eq!(ledger.load(t), 2);
        assert_eq!(ledger.retire_expired(3.0), 1);
        assert_eq!(ledger.load(t), 1);
        assert!(ledger.resolve(t));
        assert!(!ledger.resolve(t));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_ledger_purge_missing() {
        let mut ledger = MunitionLedger::new();
        for target in [1, 2, 2] {
            ledger.record(InFlight {
                mount: MountId::new(0),
                target: TargetId::new(target),
                launched_at: 0.0,
                expires_at: 10.0,
            });
        }
        assert_eq!(ledger.targets().len(), 2);
        assert_eq!(ledger.purge_missing(|id| id == TargetId::new(1)), 2);
        assert_eq!(ledger.len(), 1);
    }
}
