/// Mission scoring and ranking.
///
/// Each feature column is min-max normalized across the candidate pool passed
/// to [`rank_airfoils`], then combined with the mission's weights. Normalized
/// values depend on the pool, so scores from different pools are not
/// comparable.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::{AnalysisError, Result};
use crate::features::AirfoilFeatureRecord;

const FEATURE_COUNT: usize = 6;

/// Scored features of an [`AirfoilFeatureRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MaxLiftToDrag,
    OptimumCl,
    /// Lower is better; inverted before normalization.
    OptimumCd,
    ClMax,
    ClAtZero,
    AngleDiff,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::MaxLiftToDrag,
        Feature::OptimumCl,
        Feature::OptimumCd,
        Feature::ClMax,
        Feature::ClAtZero,
        Feature::AngleDiff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::MaxLiftToDrag => "max_lift_to_drag",
            Feature::OptimumCl => "optimum_cl",
            Feature::OptimumCd => "optimum_cd",
            Feature::ClMax => "cl_max",
            Feature::ClAtZero => "cl_at_zero",
            Feature::AngleDiff => "angle_diff",
        }
    }

    pub fn value(self, record: &AirfoilFeatureRecord) -> f64 {
        match self {
            Feature::MaxLiftToDrag => record.max_lift_to_drag,
            Feature::OptimumCl => record.optimum_cl,
            Feature::OptimumCd => record.optimum_cd,
            Feature::ClMax => record.cl_max,
            Feature::ClAtZero => record.cl_at_zero,
            Feature::AngleDiff => record.angle_diff,
        }
    }

    pub fn lower_is_better(self) -> bool {
        matches!(self, Feature::OptimumCd)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature values rescaled to [0, 1] against one candidate pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFeatureSet {
    values: [f64; FEATURE_COUNT],
}

impl NormalizedFeatureSet {
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }
}

/// Named feature → weight table, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionProfile {
    name: String,
    weights: BTreeMap<Feature, f64>,
}

impl MissionProfile {
    pub const CANONICAL: [&'static str; 3] = ["payload", "endurance", "trainer"];

    /// Build a profile. Weights must be finite, non-negative, unique per
    /// feature, and sum to 1.0 within `tolerance`.
    pub fn new(
        name: impl Into<String>,
        weights: impl IntoIterator<Item = (Feature, f64)>,
        tolerance: f64,
    ) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| AnalysisError::InvalidProfile {
            profile: name.clone(),
            reason,
        };

        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(invalid(format!("tolerance {tolerance} must be finite and non-negative")));
        }

        let mut table = BTreeMap::new();
        for (feature, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!("weight {weight} for {feature} is not a non-negative number")));
            }
            if table.insert(feature, weight).is_some() {
                return Err(invalid(format!("duplicate weight for {feature}")));
            }
        }
        if table.is_empty() {
            return Err(invalid("no weights given".into()));
        }

        let sum: f64 = table.values().sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(invalid(format!("weights sum to {sum}, expected 1.0 ± {tolerance}")));
        }

        Ok(Self {
            name,
            weights: table,
        })
    }

    /// One of the built-in profiles: `payload`, `endurance` or `trainer`.
    pub fn canonical(name: &str) -> Result<Self> {
        use Feature::*;
        let weights: &[(Feature, f64)] = match name {
            "payload" => &[
                (MaxLiftToDrag, 0.25),
                (OptimumCl, 0.30),
                (ClMax, 0.20),
                (ClAtZero, 0.10),
                (AngleDiff, 0.10),
                (OptimumCd, 0.05),
            ],
            "endurance" => &[
                (MaxLiftToDrag, 0.40),
                (OptimumCd, 0.20),
                (OptimumCl, 0.15),
                (AngleDiff, 0.15),
                (ClAtZero, 0.10),
            ],
            "trainer" => &[
                (AngleDiff, 0.35),
                (ClAtZero, 0.20),
                (ClMax, 0.20),
                (MaxLiftToDrag, 0.15),
                (OptimumCl, 0.10),
            ],
            other => {
                return Err(AnalysisError::InvalidProfile {
                    profile: other.to_string(),
                    reason: format!("unknown mission, expected one of {:?}", Self::CANONICAL),
                })
            }
        };
        Self::new(name, weights.iter().copied(), defaults::WEIGHT_TOLERANCE)
    }

    /// All built-in profiles in canonical order.
    pub fn canonical_all() -> Result<Vec<Self>> {
        Self::CANONICAL.iter().map(|n| Self::canonical(n)).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Weight of `feature`, zero when the profile ignores it.
    pub fn weight(&self, feature: Feature) -> f64 {
        self.weights.get(&feature).copied().unwrap_or(0.0)
    }

    pub fn weights(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.weights.iter().map(|(&f, &w)| (f, w))
    }
}

/// One airfoil's ranking under a mission.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedAirfoilRecord {
    pub features: AirfoilFeatureRecord,
    pub normalized: NormalizedFeatureSet,
    pub score: f64,
    /// 1 = best
    pub rank: usize,
    pub mission: String,
}

/// Min-max normalize one column. Equal columns map to 0.5.
pub fn normalize_column(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !(range > 0.0) || !range.is_finite() {
        return vec![0.5; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - min) / range).clamp(0.0, 1.0))
        .collect()
}

/// Normalize every scored feature across the pool, in pool order.
pub fn normalize_pool(records: &[AirfoilFeatureRecord]) -> Vec<NormalizedFeatureSet> {
    let mut sets = vec![
        NormalizedFeatureSet {
            values: [0.0; FEATURE_COUNT]
        };
        records.len()
    ];

    for feature in Feature::ALL {
        let sign = if feature.lower_is_better() { -1.0 } else { 1.0 };
        let column: Vec<f64> = records.iter().map(|r| sign * feature.value(r)).collect();
        for (set, v) in sets.iter_mut().zip(normalize_column(&column)) {
            set.values[feature.index()] = v;
        }
    }
    sets
}

/// Weighted sum of normalized features.
pub fn composite_score(normalized: &NormalizedFeatureSet, profile: &MissionProfile) -> f64 {
    profile.weights().map(|(f, w)| w * normalized.get(f)).sum()
}

/// Rank the pool under `profile`, best first.
///
/// Ties on score are broken by airfoil name, then Reynolds number, so the
/// ordering is fully deterministic.
pub fn rank_airfoils(
    records: &[AirfoilFeatureRecord],
    profile: &MissionProfile,
) -> Vec<RankedAirfoilRecord> {
    let normalized = normalize_pool(records);

    let mut ranked: Vec<RankedAirfoilRecord> = records
        .iter()
        .zip(normalized)
        .map(|(record, normalized)| RankedAirfoilRecord {
            score: composite_score(&normalized, profile),
            features: record.clone(),
            normalized,
            rank: 0,
            mission: profile.name().to_string(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.features.airfoil.cmp(&b.features.airfoil))
            .then_with(|| a.features.reynolds.total_cmp(&b.features.reynolds))
    });
    for (i, r) in ranked.iter_mut().enumerate() {
        r.rank = i + 1;
    }

    debug!(
        "Ranked {} candidates for '{}'{}",
        ranked.len(),
        profile.name(),
        ranked
            .first()
            .map(|r| format!(", best {} ({:.3})", r.features.id(), r.score))
            .unwrap_or_default()
    );
    ranked
}

/// Rank the same pool under several missions.
pub fn compare_missions(
    records: &[AirfoilFeatureRecord],
    profiles: &[MissionProfile],
) -> Vec<(String, Vec<RankedAirfoilRecord>)> {
    profiles
        .iter()
        .map(|p| (p.name().to_string(), rank_airfoils(records, p)))
        .collect()
}

/// The first `n` entries of a ranking.
pub fn top_n(ranked: &[RankedAirfoilRecord], n: usize) -> &[RankedAirfoilRecord] {
    &ranked[..n.min(ranked.len())]
}
