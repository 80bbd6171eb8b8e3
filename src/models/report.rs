//! Completed-set statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PointCounts, PointLog, Rotation, SetScore, TeamPair};

/// Performance of one team while it held one rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationStat {
    /// Points won minus points lost in this rotation
    pub gp: i32,

    /// Sideouts won in this rotation
    pub sideouts: u32,

    /// Rallies received in this rotation
    pub sideout_chances: u32,
}

impl RotationStat {
    /// Fraction of received rallies converted, 0 when none were received.
    pub fn sideout_percentage(&self) -> f64 {
        if self.sideout_chances == 0 {
            0.0
        } else {
            f64::from(self.sideouts) / f64::from(self.sideout_chances)
        }
    }
}

impl std::ops::AddAssign for RotationStat {
    fn add_assign(&mut self, other: Self) {
        self.gp += other.gp;
        self.sideouts += other.sideouts;
        self.sideout_chances += other.sideout_chances;
    }
}

/// Per-rotation statistics of one team, keyed by rotation 1..=6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotationTable(BTreeMap<Rotation, RotationStat>);

impl RotationTable {
    pub fn new() -> Self {
        Self(Rotation::all().map(|r| (r, RotationStat::default())).collect())
    }

    pub fn get(&self, rotation: Rotation) -> RotationStat {
        self.0.get(&rotation).copied().unwrap_or_default()
    }

    pub fn entry(&mut self, rotation: Rotation) -> &mut RotationStat {
        self.0.entry(rotation).or_default()
    }

    /// Iterate all six rotations in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Rotation, RotationStat)> + '_ {
        Rotation::all().map(move |r| (r, self.get(r)))
    }

    pub fn total(&self) -> RotationStat {
        self.iter().fold(RotationStat::default(), |mut acc, (_, stat)| {
            acc += stat;
            acc
        })
    }

    /// Add every rotation of `other` into this table.
    pub fn merge(&mut self, other: &RotationTable) {
        for (rotation, stat) in other.iter() {
            *self.entry(rotation) += stat;
        }
    }
}

impl Default for RotationTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of a finished set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetReport {
    /// Set number, starting at 1
    pub set_number: u32,

    pub final_score: SetScore,

    pub point_counts: PointCounts,

    /// Own (actions − errors) / (actions + errors)
    #[serde(default)]
    pub own_efficiency: f64,

    /// 1 − rival efficiency
    #[serde(default)]
    pub rival_error_impact: f64,

    pub point_log: PointLog,

    /// Keyed by the own team's rotation at each rally
    #[serde(default)]
    pub rotation_stats: RotationTable,

    /// Keyed by the rival team's rotation at each rally
    #[serde(default)]
    pub rival_rotation_stats: RotationTable,

    #[serde(default)]
    pub sideout_percentage: TeamPair<f64>,

    /// Points won per service rotation
    #[serde(default)]
    pub points_per_serve: TeamPair<f64>,

    #[serde(default)]
    pub break_points: TeamPair<u32>,
}

impl SetReport {
    pub fn winner(&self) -> Option<super::Team> {
        self.final_score.leader()
    }
}
