pub mod config;
mod error;
pub mod events;
pub mod metadata;
pub mod mover;
mod retry;
pub mod routing;
pub mod rules;
mod watcher;

pub use config::RouterConfig;
pub use error::{ErrorRecoveryConfig, Result, RouterError};
pub use events::{ChangeEvent, ChangeKind, Document, RouteRecord};
pub use metadata::{FieldValue, FrontmatterIndex, MetadataIndex, MetadataSnapshot};
pub use mover::{DryRunMover, FsMover, Mover};
pub use routing::{Condition, Operator, Router, RoutingOutcome, RoutingStats};
pub use rules::{Rule, RuleId, RuleStore, RouterSettings};
pub use watcher::RouterWatcher;
