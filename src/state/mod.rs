mod action;
pub mod level;
mod world;

pub use action::{Action, ActionKind, JointAction, Plan, format_plan};
pub use level::{GoalMark, Level};
pub use world::{BoxLayout, WorldState};
