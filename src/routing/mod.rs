//! Rule evaluation and edge-triggered routing
//!
//! # Module Organization
//!
//! - [`condition`] - Single `field <operator> value` tests and the regex cache
//! - [`matcher`] - Conjunction of a rule's conditions over one snapshot
//! - [`transition`] - Rising-edge detection between consecutive snapshots
//! - [`tracker`] - Per-document record of rules that already fired
//! - [`snapshot_cache`] - Last observed snapshot per document
//! - [`orchestrator`] - The [`Router`] tying everything to the move primitive
//! - [`monitoring`] - Routing statistics
//! - [`error`] - Routing specific error types

pub mod condition;
pub mod error;
pub mod matcher;
pub mod monitoring;
pub mod orchestrator;
pub mod snapshot_cache;
pub mod tracker;
pub mod transition;

pub use condition::{Condition, ConditionEvaluator, Operator};
pub use error::RoutingError;
pub use monitoring::RoutingStats;
pub use orchestrator::{Router, RoutingOutcome};
pub use snapshot_cache::PreviousSnapshotCache;
pub use tracker::{AppliedRuleTracker, RuleState};
pub use transition::{should_fire, Transition};
