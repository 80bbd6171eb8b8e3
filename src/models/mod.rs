//! Core data models for match tracking.

mod ids;
mod match_data;
mod point;
mod report;
mod rotation;
mod rules;
mod team;

pub use ids::*;
pub use match_data::*;
pub use point::*;
pub use report::*;
pub use rotation::*;
pub use rules::*;
pub use team::*;
