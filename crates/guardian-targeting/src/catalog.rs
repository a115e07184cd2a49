//! The shared perception feed and each agent's filtered view of it.
//!
//! A [`TargetCatalog`] is built once per tick by the host and shared
//! read-only by every agent. Each controller derives a
//! [`TargetCatalogView`] holding only what it may engage.

use guardian_core::components::{AgentState, TargetSnapshot};
use guardian_core::types::{angle_between, TargetId};

/// Immutable, id-sorted collection of target snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetCatalog {
    targets: Vec<TargetSnapshot>,
}

impl TargetCatalog {
    /// Build from snapshots in any order. When an id repeats, the last
    /// snapshot for it wins.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = TargetSnapshot>) -> Self {
        let mut targets: Vec<TargetSnapshot> = snapshots.into_iter().collect();
        // Stable sort keeps feed order within an id; keep the last of each run.
        targets.sort_by_key(|t| t.id);
        let mut deduped: Vec<TargetSnapshot> = Vec::with_capacity(targets.len());
        for t in targets {
            match deduped.last_mut() {
                Some(prev) if prev.id == t.id => *prev = t,
                _ => deduped.push(t),
            }
        }
        Self { targets: deduped }
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetSnapshot> {
        self.targets
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.targets[i])
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetSnapshot> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Guard-volume parameters that decide what an agent may see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityFilter {
    pub guard_range_m: f64,
    pub guard_fov_deg: f64,
}

impl VisibilityFilter {
    /// Hostile, inside guard range, and within half the field of view of the heading.
    pub fn admits(&self, agent: &AgentState, target: &TargetSnapshot) -> bool {
        if !target.is_hostile_to(agent.team) {
            return false;
        }
        let offset = target.kinematics.position - agent.kinematics.position;
        let distance = offset.length();
        if !distance.is_finite() || distance > self.guard_range_m {
            return false;
        }
        if self.guard_fov_deg >= 360.0 {
            return true;
        }
        let half_fov = (self.guard_fov_deg / 2.0).to_radians();
        angle_between(agent.heading(), offset) <= half_fov
    }
}

/// One agent's engageable subset of the catalog.
#[derive(Debug, Clone)]
pub struct TargetCatalogView<'a> {
    catalog: &'a TargetCatalog,
    visible: Vec<usize>,
}

impl<'a> TargetCatalogView<'a> {
    pub fn for_agent(catalog: &'a TargetCatalog, agent: &AgentState, filter: &VisibilityFilter) -> Self {
        let visible = catalog
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| filter.admits(agent, t))
            .map(|(i, _)| i)
            .collect();
        Self { catalog, visible }
    }

    pub fn catalog(&self) -> &'a TargetCatalog {
        self.catalog
    }

    pub fn get(&self, id: TargetId) -> Option<&'a TargetSnapshot> {
        let idx = self
            .catalog
            .targets
            .binary_search_by_key(&id, |t| t.id)
            .ok()?;
        self.visible
            .binary_search(&idx)
            .ok()
            .map(|_| &self.catalog.targets[idx])
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TargetSnapshot> + '_ {
        let catalog = self.catalog;
        self.visible.iter().map(move |&i| &catalog.targets[i])
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
