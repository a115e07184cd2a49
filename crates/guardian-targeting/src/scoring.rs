//! Weighted scoring and ranking of candidate targets.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use guardian_core::components::{AgentState, TargetSnapshot};
use guardian_core::config::ScoringWeights;
use guardian_core::state::RankedScore;
use guardian_core::types::TargetId;

use crate::features::{FeatureExtractor, FeatureVector};

/// One scored candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedTarget {
    pub target: TargetId,
    pub score: f64,
}

impl RankedTarget {
    /// Ranking order: higher score first, lower id on ties.
    pub fn precedes(&self, other: &RankedTarget) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.target.cmp(&other.target))
    }
}

impl From<RankedTarget> for RankedScore {
    fn from(r: RankedTarget) -> Self {
        RankedScore {
            target: r.target,
            score: r.score,
        }
    }
}

/// Scores targets as `bias + Σ weightᵢ · featureᵢ`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    extractor: FeatureExtractor,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights, extractor: FeatureExtractor) -> Self {
        Self { weights, extractor }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: ScoringWeights) {
        self.weights = weights;
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn set_extractor(&mut self, extractor: FeatureExtractor) {
        self.extractor = extractor;
    }

    pub fn features(&self, agent: &AgentState, target: &TargetSnapshot) -> FeatureVector {
        self.extractor.extract(agent, target)
    }

    /// Score of one target. A non-finite result (only possible with
    /// non-finite weights) scores as negative infinity.
    pub fn score(&self, agent: &AgentState, target: &TargetSnapshot) -> f64 {
        let s = self.features(agent, target).weighted_sum(&self.weights);
        if s.is_nan() {
            f64::NEG_INFINITY
        } else {
            s
        }
    }

    /// Score and sort candidates. The result does not depend on input order.
    pub fn rank<'a>(
        &self,
        agent: &AgentState,
        candidates: impl IntoIterator<Item = &'a TargetSnapshot>,
    ) -> Vec<RankedTarget> {
        let mut ranked: Vec<RankedTarget> = candidates
            .into_iter()
            .map(|t| RankedTarget {
                target: t.id,
                score: self.score(agent, t),
            })
            .collect();
        ranked.sort_by(RankedTarget::precedes);
        ranked.dedup_by_key(|r| r.target);
        ranked
    }
}
