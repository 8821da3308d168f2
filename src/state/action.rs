use std::fmt;
use std::sync::OnceLock;

use crate::infra::{Direction, Position};

/// A single agent's action for one time step.
///
/// `Push { agent, boxed }`: the agent steps into the box cell ahead of it and
/// the box moves one cell in `boxed`.
/// `Pull { agent, boxed }`: the agent steps away in `agent` and the box behind
/// it (at `agent_pos - boxed`) follows into the agent's old cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NoOp,
    Move(Direction),
    Push { agent: Direction, boxed: Direction },
    Pull { agent: Direction, boxed: Direction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    NoOp,
    Move,
    Push,
    Pull,
}

pub type JointAction = Vec<Action>;
pub type Plan = Vec<JointAction>;

impl Action {
    /// Every action, in the order the expander tries them.
    pub fn all() -> &'static [Action] {
        static ALL: OnceLock<Vec<Action>> = OnceLock::new();
        ALL.get_or_init(|| {
            let mut actions = vec![Action::NoOp];
            actions.extend(Direction::ALL.iter().map(|d| Action::Move(*d)));
            for agent in Direction::ALL {
                for boxed in Direction::ALL {
                    // the box cannot move back into the agent
                    if boxed != agent.opposite() {
                        actions.push(Action::Push { agent, boxed });
                    }
                }
            }
            for agent in Direction::ALL {
                for boxed in Direction::ALL {
                    // the agent cannot walk into the box it drags
                    if agent != boxed.opposite() {
                        actions.push(Action::Pull { agent, boxed });
                    }
                }
            }
            actions
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::NoOp => ActionKind::NoOp,
            Action::Move(_) => ActionKind::Move,
            Action::Push { .. } => ActionKind::Push,
            Action::Pull { .. } => ActionKind::Pull,
        }
    }

    pub fn agent_direction(&self) -> Option<Direction> {
        match *self {
            Action::NoOp => None,
            Action::Move(dir) => Some(dir),
            Action::Push { agent, .. } | Action::Pull { agent, .. } => Some(agent),
        }
    }

    pub fn agent_delta(&self) -> (i32, i32) {
        self.agent_direction().map(Direction::delta).unwrap_or((0, 0))
    }

    /// Agent cell after the action.
    pub fn agent_target(&self, agent: Position) -> Position {
        let (dr, dc) = self.agent_delta();
        Position::new(agent.row + dr, agent.col + dc)
    }

    /// Cell of the moved box before the action.
    pub fn box_origin(&self, agent: Position) -> Option<Position> {
        match *self {
            Action::Push { agent: dir, .. } => Some(agent.step(dir)),
            Action::Pull { boxed, .. } => Some(agent.step_back(boxed)),
            _ => None,
        }
    }

    /// Cell of the moved box after the action.
    pub fn box_target(&self, agent: Position) -> Option<Position> {
        match *self {
            Action::Push { agent: dir, boxed } => Some(agent.step(dir).step(boxed)),
            Action::Pull { .. } => Some(agent),
            _ => None,
        }
    }

    pub fn moves_box(&self) -> bool {
        matches!(self, Action::Push { .. } | Action::Pull { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOp => write!(f, "NoOp"),
            Action::Move(dir) => write!(f, "Move({})", dir.letter()),
            Action::Push { agent, boxed } => {
                write!(f, "Push({},{})", agent.letter(), boxed.letter())
            }
            Action::Pull { agent, boxed } => {
                write!(f, "Pull({},{})", agent.letter(), boxed.letter())
            }
        }
    }
}

/// Render one joint action per line, agents separated by `|`.
pub fn format_plan(plan: &[JointAction]) -> String {
    plan.iter()
        .map(|joint| {
            joint
                .iter()
                .map(Action::to_string)
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
