use crate::infra::{NavigationOracle, Position};
use crate::state::{Action, Level};

/// Collision-ignorant route of a single agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Walk to an agent goal. `path` starts on the agent's cell.
    ToGoal { path: Vec<Position> },
    /// Walk up to a box, then bring it to its goal.
    ///
    /// `to_box` runs from the agent's cell to the cell next to the box (the
    /// box cell itself excluded); `box_to_goal` runs from the box cell to the
    /// goal.
    ViaBox {
        to_box: Vec<Position>,
        box_to_goal: Vec<Position>,
    },
}

impl Route {
    /// Cells the route sweeps over, without the box's own starting cell.
    pub fn swept_cells(&self) -> Vec<Position> {
        match self {
            Route::ToGoal { path } => path.clone(),
            Route::ViaBox { to_box, box_to_goal } => {
                let box_cell = box_to_goal.first().copied();
                to_box
                    .iter()
                    .copied()
                    .chain(box_to_goal.iter().skip(1).copied().filter(|c| Some(*c) != box_cell))
                    .collect()
            }
        }
    }

    /// Provisional action sequence for this route.
    ///
    /// Returns `None` when the push/pull geometry cannot be built, which the
    /// caller treats like having no route at all.
    pub fn to_actions<N>(&self, level: &Level, nav: &N) -> Option<Vec<Action>>
    where
        N: NavigationOracle + ?Sized,
    {
        match self {
            Route::ToGoal { path } => moves_along(path),
            Route::ViaBox { to_box, box_to_goal } => {
                let mut actions = moves_along(to_box)?;
                let agent = *to_box.last()?;
                let (&box_cell, &next) = (box_to_goal.first()?, box_to_goal.get(1)?);
                let goal = *box_to_goal.last()?;

                if agent != next {
                    let mut lane = Vec::with_capacity(box_to_goal.len() + 1);
                    lane.push(agent);
                    lane.extend_from_slice(box_to_goal);
                    actions.extend(pushes_along(&lane)?);
                } else if level.walls_around(goal) < 3 {
                    actions.extend(pulls_along(box_to_goal)?);
                    // Step off the goal so the box can be pulled onto it
                    let before_goal = box_to_goal[box_to_goal.len() - 2];
                    let exit = first_open_neighbor(level, goal, &[before_goal])?;
                    actions.push(pull_step(before_goal, goal, exit)?);
                } else {
                    actions.extend(detour_through_branch(level, nav, agent, box_cell, goal)?);
                }
                Some(actions)
            }
        }
    }
}

/// Turn the box around at the nearest branch cell so it can be pushed into a
/// dead-end goal.
fn detour_through_branch<N>(
    level: &Level,
    nav: &N,
    agent: Position,
    box_cell: Position,
    goal: Position,
) -> Option<Vec<Action>>
where
    N: NavigationOracle + ?Sized,
{
    let branch = nearest_branch_cell(level, nav, agent)?;
    let push = nav.distance(branch, agent)? > nav.distance(branch, box_cell)?;

    let mut actions = Vec::new();
    let parked = if push {
        let mut lane = vec![agent];
        lane.extend(nav.path(box_cell, branch)?);
        actions.extend(pushes_along(&lane)?);
        let behind = lane[lane.len() - 2];
        let aside = first_open_neighbor(level, branch, &[behind])?;
        actions.push(push_step(behind, branch, aside)?);
        aside
    } else {
        let mut lane = vec![box_cell];
        lane.extend(nav.path(agent, branch)?);
        actions.extend(pulls_along(&lane)?);
        lane[lane.len() - 2]
    };

    // Agent is on the branch cell, the box right next to it
    let toward_goal = nav.next_hop(branch, goal)?;
    let exit = first_open_neighbor(level, branch, &[parked, toward_goal])?;
    actions.push(pull_step(parked, branch, exit)?);

    let mut lane = vec![exit];
    lane.extend(nav.path(branch, goal)?);
    actions.extend(pushes_along(&lane)?);
    Some(actions)
}

fn nearest_branch_cell<N>(level: &Level, nav: &N, from: Position) -> Option<Position>
where
    N: NavigationOracle + ?Sized,
{
    let mut best: Option<(u32, Position)> = None;
    for cell in nav.branch_cells() {
        let Some(d) = nav.distance(from, *cell) else {
            continue;
        };
        if (d as i32) < level.area() && best.is_none_or(|(min, _)| d < min) {
            best = Some((d, *cell));
        }
    }
    best.map(|(_, cell)| cell)
}

/// First non-wall neighbour of `cell` in N, S, W, E order not in `excluded`.
fn first_open_neighbor(level: &Level, cell: Position, excluded: &[Position]) -> Option<Position> {
    cell.neighbors()
        .into_iter()
        .find(|n| !excluded.contains(n) && !level.is_wall(*n))
}

fn moves_along(path: &[Position]) -> Option<Vec<Action>> {
    path.windows(2)
        .map(|w| w[0].direction_to(&w[1]).map(Action::Move))
        .collect()
}

/// Agent on `lane[0]`, box on `lane[1]`; push the box to the end of the lane.
fn pushes_along(lane: &[Position]) -> Option<Vec<Action>> {
    lane.windows(3).map(|w| push_step(w[0], w[1], w[2])).collect()
}

/// Box on `lane[0]`, agent on `lane[1]`; drag the box until the agent is at the
/// end of the lane.
fn pulls_along(lane: &[Position]) -> Option<Vec<Action>> {
    lane.windows(3).map(|w| pull_step(w[0], w[1], w[2])).collect()
}

/// Agent on `from` pushes the box on `over` into `into`.
fn push_step(from: Position, over: Position, into: Position) -> Option<Action> {
    let agent = from.direction_to(&over)?;
    let boxed = over.direction_to(&into)?;
    (boxed != agent.opposite()).then_some(Action::Push { agent, boxed })
}

/// Agent on `at` steps to `to`, dragging the box on `from` into `at`.
fn pull_step(from: Position, at: Position, to: Position) -> Option<Action> {
    let agent = at.direction_to(&to)?;
    let boxed = from.direction_to(&at)?;
    (agent != boxed.opposite()).then_some(Action::Pull { agent, boxed })
}
