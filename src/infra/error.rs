use crate::state::Action;

/// Errors raised while loading a level or planning it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Level text is malformed at line {line}: {reason}")]
    LevelParse { line: usize, reason: String },

    #[error("Unknown color '{0}'")]
    UnknownColor(String),

    #[error("Agent {agent} has no route steps left after step {step} to build a target from")]
    MalformedTarget { agent: usize, step: usize },

    #[error(
        "Planning stalled: no way to clear the obstacle of agent {agent} at route step {step} ({expanded} states expanded)"
    )]
    PlanningStalled {
        agent: usize,
        step: usize,
        expanded: usize,
    },

    #[error("No agent has a route, but the level is not solved")]
    NoRoutes,

    #[error("Iteration {iteration} did not change the world")]
    NoProgress { iteration: usize },

    #[error("Iteration limit of {0} reached before the level was solved")]
    IterationLimit(usize),

    #[error("Action {action} of agent {agent} is not applicable at plan step {step}")]
    IllegalAction {
        agent: usize,
        action: Action,
        step: usize,
    },
}
