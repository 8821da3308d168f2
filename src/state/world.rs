use std::fmt;
use std::hash::{Hash, Hasher};

use crate::infra::Position;
use crate::state::level::{GoalMark, Level};
use crate::state::{Action, ActionKind};

/// Dense box grid plus a sorted list of the occupied cells.
///
/// Lookups go through the grid; equality and hashing only look at the list so
/// they stay proportional to the number of boxes.
#[derive(Clone, Debug)]
pub struct BoxLayout {
    width: i32,
    height: i32,
    cells: Vec<u8>,
    occupied: Vec<(Position, u8)>,
}

impl BoxLayout {
    fn new(width: i32, height: i32, boxes: Vec<(Position, u8)>) -> Self {
        let mut layout = Self {
            width,
            height,
            cells: vec![0; (width.max(0) * height.max(0)) as usize],
            occupied: Vec::with_capacity(boxes.len()),
        };
        for (pos, letter) in boxes {
            layout.place(pos, letter);
        }
        layout
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width {
            Some((pos.row * self.width + pos.col) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, pos: Position) -> Option<u8> {
        self.index(pos)
            .map(|idx| self.cells[idx])
            .filter(|letter| *letter != 0)
    }

    /// Put `letter` on `pos`, replacing whatever box was there.
    pub fn place(&mut self, pos: Position, letter: u8) {
        let Some(idx) = self.index(pos) else {
            return;
        };
        if self.cells[idx] != 0 {
            self.occupied.retain(|(p, _)| *p != pos);
        }
        self.cells[idx] = letter;
        let at = self.occupied.partition_point(|(p, _)| *p < pos);
        self.occupied.insert(at, (pos, letter));
    }

    pub fn clear(&mut self, pos: Position) -> Option<u8> {
        let idx = self.index(pos)?;
        let letter = std::mem::take(&mut self.cells[idx]);
        if letter == 0 {
            return None;
        }
        self.occupied.retain(|(p, _)| *p != pos);
        Some(letter)
    }

    pub fn move_box(&mut self, from: Position, to: Position) {
        if let Some(letter) = self.clear(from) {
            self.place(to, letter);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, u8)> + '_ {
        self.occupied.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }
}

impl PartialEq for BoxLayout {
    fn eq(&self, other: &Self) -> bool {
        self.occupied == other.occupied
    }
}

impl Eq for BoxLayout {}

impl Hash for BoxLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.occupied.hash(state);
    }
}

/// Immutable world snapshot: where every agent and every box is.
///
/// Every transition clones; a snapshot is never changed after it is built.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorldState {
    agents: Vec<Position>,
    boxes: BoxLayout,
}

impl WorldState {
    pub fn new(level: &Level, agents: Vec<Position>, boxes: Vec<(Position, u8)>) -> Self {
        Self {
            agents,
            boxes: BoxLayout::new(level.width, level.height, boxes),
        }
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn agent_position(&self, agent: usize) -> Position {
        self.agents[agent]
    }

    pub fn agent_positions(&self) -> &[Position] {
        &self.agents
    }

    pub fn boxes(&self) -> &BoxLayout {
        &self.boxes
    }

    pub fn agent_at(&self, pos: Position) -> Option<usize> {
        self.agents.iter().position(|p| *p == pos)
    }

    pub fn box_at(&self, pos: Position) -> Option<u8> {
        self.boxes.get(pos)
    }

    pub fn cell_is_free(&self, level: &Level, pos: Position) -> bool {
        !level.is_wall(pos) && self.box_at(pos).is_none() && self.agent_at(pos).is_none()
    }

    // ------------------------------------------------------------------
    // Legality
    // ------------------------------------------------------------------

    pub fn is_applicable(&self, level: &Level, agent: usize, action: &Action) -> bool {
        match action.kind() {
            ActionKind::NoOp => true,
            ActionKind::Move => self.is_move_legal(level, agent, action),
            ActionKind::Push => self.is_push_legal(level, agent, action),
            ActionKind::Pull => self.is_pull_legal(level, agent, action),
        }
    }

    pub fn is_move_legal(&self, level: &Level, agent: usize, action: &Action) -> bool {
        let target = action.agent_target(self.agents[agent]);
        self.cell_is_free(level, target)
    }

    pub fn is_push_legal(&self, level: &Level, agent: usize, action: &Action) -> bool {
        let pos = self.agents[agent];
        let (Some(box_origin), Some(box_target)) = (action.box_origin(pos), action.box_target(pos))
        else {
            return false;
        };
        self.box_matches_agent(level, agent, box_origin) && self.cell_is_free(level, box_target)
    }

    pub fn is_pull_legal(&self, level: &Level, agent: usize, action: &Action) -> bool {
        let pos = self.agents[agent];
        let Some(box_origin) = action.box_origin(pos) else {
            return false;
        };
        self.box_matches_agent(level, agent, box_origin)
            && self.cell_is_free(level, action.agent_target(pos))
    }

    fn box_matches_agent(&self, level: &Level, agent: usize, pos: Position) -> bool {
        self.box_at(pos)
            .and_then(|letter| level.box_color(letter))
            .is_some_and(|color| color == level.agent_color(agent))
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn apply(&self, agent: usize, action: &Action) -> WorldState {
        let mut next = self.clone();
        next.apply_in_place(agent, action);
        next
    }

    pub fn apply_move(&self, agent: usize, action: &Action) -> WorldState {
        debug_assert_eq!(action.kind(), ActionKind::Move);
        self.apply(agent, action)
    }

    pub fn apply_push(&self, agent: usize, action: &Action) -> WorldState {
        debug_assert_eq!(action.kind(), ActionKind::Push);
        self.apply(agent, action)
    }

    pub fn apply_pull(&self, agent: usize, action: &Action) -> WorldState {
        debug_assert_eq!(action.kind(), ActionKind::Pull);
        self.apply(agent, action)
    }

    /// Apply one action per agent. Actions are assumed legal and
    /// collision-free against `self`.
    pub fn apply_joint(&self, joint: &[Action]) -> WorldState {
        let mut next = self.clone();
        for (agent, action) in joint.iter().enumerate() {
            next.apply_in_place(agent, action);
        }
        next
    }

    /// Apply a sequence of actions for a single agent, ignoring everyone else.
    pub fn apply_agent_sequence(&self, agent: usize, actions: &[Action]) -> WorldState {
        let mut next = self.clone();
        for action in actions {
            next.apply_in_place(agent, action);
        }
        next
    }

    fn apply_in_place(&mut self, agent: usize, action: &Action) {
        let pos = self.agents[agent];
        if let (Some(from), Some(to)) = (action.box_origin(pos), action.box_target(pos)) {
            self.boxes.move_box(from, to);
        }
        self.agents[agent] = action.agent_target(pos);
    }

    // ------------------------------------------------------------------
    // Direct edits, used when building target snapshots
    // ------------------------------------------------------------------

    pub(crate) fn set_agent_position(&mut self, agent: usize, pos: Position) {
        self.agents[agent] = pos;
    }

    pub(crate) fn place_box(&mut self, pos: Position, letter: u8) {
        self.boxes.place(pos, letter);
    }

    pub(crate) fn clear_box(&mut self, pos: Position) -> Option<u8> {
        self.boxes.clear(pos)
    }

    // ------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------

    pub fn is_goal_state(&self, level: &Level) -> bool {
        level.goals().all(|(pos, mark)| self.satisfies(pos, mark))
    }

    pub fn unsatisfied_goals(&self, level: &Level) -> usize {
        level
            .goals()
            .filter(|(pos, mark)| !self.satisfies(*pos, *mark))
            .count()
    }

    fn satisfies(&self, pos: Position, mark: GoalMark) -> bool {
        match mark {
            GoalMark::Box(letter) => self.box_at(pos) == Some(letter),
            GoalMark::Agent(agent) => self.agents.get(agent) == Some(&pos),
        }
    }

    pub fn render(&self, level: &Level) -> String {
        let mut out = String::new();
        for row in 0..level.height {
            for col in 0..level.width {
                let pos = Position::new(row, col);
                if let Some(letter) = self.box_at(pos) {
                    out.push(letter as char);
                } else if level.is_wall(pos) {
                    out.push('+');
                } else if let Some(agent) = self.agent_at(pos) {
                    out.push((b'0' + agent as u8) as char);
                } else {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agents {:?}, boxes [", self.agents)?;
        for (i, (pos, letter)) in self.boxes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}@{}", letter as char, pos)?;
        }
        write!(f, "]")
    }
}
