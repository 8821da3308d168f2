//! Decoupled multi-agent planning: single-agent routes, one prioritized agent
//! per iteration, and local joint searches wherever its route is blocked.

mod config;
mod conflict;
mod obstacles;
mod orchestrator;
mod plan;
mod resolution;
mod route;
mod router;

pub use config::PlannerConfig;
pub use conflict::{Conflict, DetectedConflict, build_target, detect_conflict};
pub use obstacles::{Priority, find_obstacles, prioritize};
pub use orchestrator::Orchestrator;
pub use plan::aligned_slice;
pub use resolution::{resolution_heuristic, resolve_conflict};
pub use route::Route;
pub use router::route_agents;
