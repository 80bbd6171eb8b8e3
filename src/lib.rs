//! # Volley Stats
//!
//! A live volleyball scoring and statistics engine.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (teams, rotations, point log, match record)
//! - **calculate**: Pure scoring rules and derived set/match statistics
//! - **tracker**: Point recording, undo and set reset over the match record
//! - **engine**: Command-driven match state machine and its persisted session
//! - **storage**: Key-value persistence, legacy migration and the match repository
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod engine;
pub mod models;
pub mod storage;
pub mod tracker;

pub use models::*;
