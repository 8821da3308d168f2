use crate::infra::{Color, PlanError, Position};
use crate::state::WorldState;

pub const MAX_AGENTS: usize = 10;
pub const MAX_BOX_KINDS: usize = 26;

/// What must end up on a goal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalMark {
    Agent(usize),
    Box(u8),
}

/// Static description of a level: walls, goals and colors.
///
/// Built once before planning starts and shared by reference afterwards.
#[derive(Clone, Debug)]
pub struct Level {
    pub width: i32,
    pub height: i32,
    walls: Vec<bool>,
    goals: Vec<Option<GoalMark>>,
    agent_colors: Vec<Color>,
    box_colors: [Option<Color>; MAX_BOX_KINDS],
    agent_goals: Vec<Vec<Position>>,
    box_goals: Vec<Vec<Position>>,
}

impl Level {
    pub fn new(width: i32, height: i32, agent_colors: Vec<Color>) -> Self {
        let cells = (width.max(0) * height.max(0)) as usize;
        let num_agents = agent_colors.len();
        Self {
            width,
            height,
            walls: vec![false; cells],
            goals: vec![None; cells],
            agent_colors,
            box_colors: [None; MAX_BOX_KINDS],
            agent_goals: vec![Vec::new(); num_agents],
            box_goals: vec![Vec::new(); MAX_BOX_KINDS],
        }
    }

    pub fn set_wall(&mut self, pos: Position) {
        if let Some(idx) = self.index(pos) {
            self.walls[idx] = true;
        }
    }

    pub fn set_goal(&mut self, pos: Position, mark: GoalMark) {
        let Some(idx) = self.index(pos) else {
            return;
        };
        self.goals[idx] = Some(mark);
        match mark {
            GoalMark::Agent(agent) => {
                if agent >= self.agent_goals.len() {
                    self.agent_goals.resize(agent + 1, Vec::new());
                }
                self.agent_goals[agent].push(pos);
            }
            GoalMark::Box(letter) => self.box_goals[box_index(letter)].push(pos),
        }
    }

    pub fn set_box_color(&mut self, letter: u8, color: Color) {
        self.box_colors[box_index(letter)] = Some(color);
    }

    pub fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.row * self.width + pos.col) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
    }

    /// Out-of-bounds cells count as walls.
    pub fn is_wall(&self, pos: Position) -> bool {
        self.index(pos).map(|idx| self.walls[idx]).unwrap_or(true)
    }

    pub fn walls_around(&self, pos: Position) -> usize {
        pos.neighbors().iter().filter(|n| self.is_wall(**n)).count()
    }

    pub fn goal_at(&self, pos: Position) -> Option<GoalMark> {
        self.index(pos).and_then(|idx| self.goals[idx])
    }

    pub fn goals(&self) -> impl Iterator<Item = (Position, GoalMark)> + '_ {
        self.goals.iter().enumerate().filter_map(|(idx, goal)| {
            goal.map(|mark| {
                let idx = idx as i32;
                (Position::new(idx / self.width, idx % self.width), mark)
            })
        })
    }

    pub fn goal_count(&self) -> usize {
        self.goals.iter().filter(|g| g.is_some()).count()
    }

    pub fn agent_goals(&self, agent: usize) -> &[Position] {
        self.agent_goals.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn box_goals(&self, letter: u8) -> &[Position] {
        &self.box_goals[box_index(letter)]
    }

    pub fn num_agents(&self) -> usize {
        self.agent_colors.len()
    }

    pub fn agent_color(&self, agent: usize) -> Color {
        self.agent_colors[agent]
    }

    pub fn box_color(&self, letter: u8) -> Option<Color> {
        self.box_colors[box_index(letter)]
    }

    /// Box letters an agent is allowed to move, in alphabetical order.
    pub fn boxes_for_agent(&self, agent: usize) -> Vec<u8> {
        let color = self.agent_color(agent);
        (b'A'..=b'Z')
            .filter(|letter| self.box_color(*letter) == Some(color))
            .collect()
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Parse a level from its text form.
    ///
    /// ```text
    /// #colors
    /// blue: 0, A
    /// #initial
    /// +++++
    /// +0A +
    /// +++++
    /// #goal
    /// +++++
    /// +  A+
    /// +++++
    /// #end
    /// ```
    pub fn parse(text: &str) -> Result<(Level, WorldState), PlanError> {
        let mut section = "";
        let mut colors: Vec<(usize, Color, String)> = Vec::new();
        let mut initial: Vec<(usize, &str)> = Vec::new();
        let mut goal: Vec<(usize, &str)> = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let line = raw.trim_end_matches('\r');
            if line.starts_with('#') {
                section = line.trim();
                continue;
            }
            match section {
                "#colors" => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let (name, entities) =
                        line.split_once(':').ok_or_else(|| PlanError::LevelParse {
                            line: line_no,
                            reason: "expected '<color>: <entities>'".to_string(),
                        })?;
                    let color = Color::from_name(name)
                        .ok_or_else(|| PlanError::UnknownColor(name.trim().to_string()))?;
                    colors.push((line_no, color, entities.to_string()));
                }
                "#initial" => initial.push((line_no, line)),
                "#goal" => goal.push((line_no, line)),
                "#end" | "" => {}
                other => {
                    return Err(PlanError::LevelParse {
                        line: line_no,
                        reason: format!("unknown section {other}"),
                    });
                }
            }
        }

        if initial.is_empty() {
            return Err(PlanError::LevelParse {
                line: 0,
                reason: "missing #initial section".to_string(),
            });
        }

        let height = initial.len() as i32;
        let width = initial
            .iter()
            .chain(goal.iter())
            .map(|(_, l)| l.chars().count() as i32)
            .max()
            .unwrap_or(0);

        let mut agent_colors: [Option<Color>; MAX_AGENTS] = [None; MAX_AGENTS];
        let mut box_colors: [Option<Color>; MAX_BOX_KINDS] = [None; MAX_BOX_KINDS];
        for (line_no, color, entities) in &colors {
            for entity in entities.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let mut chars = entity.chars();
                match (chars.next(), chars.next()) {
                    (Some(c @ '0'..='9'), None) => agent_colors[agent_index(c)] = Some(*color),
                    (Some(c @ 'A'..='Z'), None) => box_colors[box_index(c as u8)] = Some(*color),
                    _ => {
                        return Err(PlanError::LevelParse {
                            line: *line_no,
                            reason: format!("'{entity}' is neither an agent nor a box"),
                        });
                    }
                }
            }
        }

        let mut agents: [Option<Position>; MAX_AGENTS] = [None; MAX_AGENTS];
        let mut boxes: Vec<(Position, u8)> = Vec::new();
        let mut walls: Vec<Position> = Vec::new();
        for (row, (line_no, line)) in initial.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                let pos = Position::new(row as i32, col as i32);
                match c {
                    '+' => walls.push(pos),
                    '0'..='9' => {
                        if agents[agent_index(c)].replace(pos).is_some() {
                            return Err(PlanError::LevelParse {
                                line: *line_no,
                                reason: format!("agent {c} appears twice"),
                            });
                        }
                    }
                    'A'..='Z' => boxes.push((pos, c as u8)),
                    ' ' => {}
                    other => {
                        return Err(PlanError::LevelParse {
                            line: *line_no,
                            reason: format!("unexpected character '{other}'"),
                        });
                    }
                }
            }
        }

        let num_agents = agents.iter().take_while(|a| a.is_some()).count();
        if agents[num_agents..].iter().any(Option::is_some) {
            return Err(PlanError::LevelParse {
                line: 0,
                reason: "agent numbers must be consecutive from 0".to_string(),
            });
        }

        let mut resolved_colors = Vec::with_capacity(num_agents);
        for (agent, color) in agent_colors.iter().take(num_agents).enumerate() {
            let color = color.ok_or_else(|| PlanError::LevelParse {
                line: 0,
                reason: format!("agent {agent} has no color"),
            })?;
            resolved_colors.push(color);
        }

        let mut level = Level::new(width, height, resolved_colors);
        for wall in walls {
            level.set_wall(wall);
        }
        // Cells outside a ragged row are walls too.
        for (row, (_, line)) in initial.iter().enumerate() {
            for col in line.chars().count() as i32..width {
                level.set_wall(Position::new(row as i32, col));
            }
        }
        for (letter_idx, color) in box_colors.iter().enumerate() {
            if let Some(color) = color {
                level.set_box_color(b'A' + letter_idx as u8, *color);
            }
        }
        for (_, letter) in &boxes {
            if level.box_color(*letter).is_none() {
                return Err(PlanError::LevelParse {
                    line: 0,
                    reason: format!("box {} has no color", *letter as char),
                });
            }
        }

        for (row, (line_no, line)) in goal.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                let pos = Position::new(row as i32, col as i32);
                match c {
                    '0'..='9' => {
                        let agent = agent_index(c);
                        if agent >= num_agents {
                            return Err(PlanError::LevelParse {
                                line: *line_no,
                                reason: format!("goal for missing agent {c}"),
                            });
                        }
                        level.set_goal(pos, GoalMark::Agent(agent));
                    }
                    'A'..='Z' => level.set_goal(pos, GoalMark::Box(c as u8)),
                    _ => {}
                }
            }
        }

        let agent_positions: Vec<Position> =
            agents.iter().take(num_agents).flatten().copied().collect();
        let world = WorldState::new(&level, agent_positions, boxes);
        Ok((level, world))
    }
}

pub fn box_index(letter: u8) -> usize {
    (letter - b'A') as usize
}

fn agent_index(c: char) -> usize {
    (c as u8 - b'0') as usize
}
