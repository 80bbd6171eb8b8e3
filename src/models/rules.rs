//! Scoring thresholds for sets and matches.

use serde::{Deserialize, Serialize};

/// Thresholds that decide when a set or match ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    /// Target score of a regular set
    #[serde(default = "default_set_points_regular")]
    pub set_points_regular: u32,

    /// Target score of the deciding set
    #[serde(default = "default_set_points_decider")]
    pub set_points_decider: u32,

    /// Lead needed to close a set
    #[serde(default = "default_required_point_difference")]
    pub required_point_difference: u32,

    /// Sets needed to win the match
    #[serde(default = "default_sets_to_win_match")]
    pub sets_to_win_match: u32,
}

fn default_set_points_regular() -> u32 {
    25
}

fn default_set_points_decider() -> u32 {
    15
}

fn default_required_point_difference() -> u32 {
    2
}

fn default_sets_to_win_match() -> u32 {
    3
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            set_points_regular: default_set_points_regular(),
            set_points_decider: default_set_points_decider(),
            required_point_difference: default_required_point_difference(),
            sets_to_win_match: default_sets_to_win_match(),
        }
    }
}
