mod default_observer;
mod error;
mod pathfinding;
mod plan_observer;
mod types;

pub use default_observer::DefaultObserver;
pub use error::PlanError;
pub use pathfinding::{GridNavigator, NavigationOracle};
pub use plan_observer::PlanObserver;
pub use types::{Color, Direction, Position};
