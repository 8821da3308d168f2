pub mod infra;
pub mod planners;
pub mod state;

// Re-export commonly used types for convenience
pub use infra::{GridNavigator, NavigationOracle, PlanError, Position};
pub use planners::decoupled::{Orchestrator, PlannerConfig};
pub use state::{Level, Plan, WorldState};
