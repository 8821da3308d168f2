use crate::infra::{NavigationOracle, Position};
use crate::planners::decoupled::Route;
use crate::state::{Level, WorldState};

/// A misplaced box and the goal it is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoxAssignment {
    letter: u8,
    cell: Position,
    goal: Position,
}

/// Greedy single-agent routes, one slot per agent.
///
/// Routes ignore every agent and box; only walls are taken into account.
/// An agent with nothing reachable to do gets `None`.
#[tracing::instrument(level = "trace", skip_all)]
pub fn route_agents<N>(level: &Level, state: &WorldState, nav: &N) -> Vec<Option<Route>>
where
    N: NavigationOracle + ?Sized,
{
    let assignments = assign_box_goals(level, state, nav);

    (0..state.num_agents())
        .map(|agent| {
            let route = route_via_box(level, state, nav, agent, &assignments)
                .or_else(|| route_to_agent_goal(level, state, nav, agent));
            tracing::trace!(agent, route = ?route, "Route chosen");
            route
        })
        .collect()
}

/// Nearest free goal of the right letter for every box not already on one.
fn assign_box_goals<N>(level: &Level, state: &WorldState, nav: &N) -> Vec<BoxAssignment>
where
    N: NavigationOracle + ?Sized,
{
    let mut assignments = Vec::new();
    'boxes: for (cell, letter) in state.boxes().iter() {
        let mut best: Option<(u32, Position)> = None;
        for goal in level.box_goals(letter) {
            let Some(d) = nav.distance(cell, *goal) else {
                continue;
            };
            if *goal == cell {
                continue 'boxes;
            }
            if state.box_at(*goal) == Some(letter) {
                continue;
            }
            if (d as i32) < level.area() && best.is_none_or(|(min, _)| d < min) {
                best = Some((d, *goal));
            }
        }
        if let Some((_, goal)) = best {
            assignments.push(BoxAssignment { letter, cell, goal });
        }
    }
    assignments
}

fn route_via_box<N>(
    level: &Level,
    state: &WorldState,
    nav: &N,
    agent: usize,
    assignments: &[BoxAssignment],
) -> Option<Route>
where
    N: NavigationOracle + ?Sized,
{
    let from = state.agent_position(agent);
    let mut best: Option<(i64, &BoxAssignment)> = None;

    for letter in level.boxes_for_agent(agent) {
        for assignment in assignments.iter().filter(|a| a.letter == letter) {
            let Some(to_box) = nav.distance(from, assignment.cell) else {
                continue;
            };
            let Some(to_goal) = nav.distance(assignment.cell, assignment.goal) else {
                continue;
            };
            // 0.4 * d(agent, box) + 0.6 * d(box, goal), rounded down
            let score = (4 * to_box as i64 + 6 * to_goal as i64) / 10;
            if score < level.area() as i64 && best.is_none_or(|(min, _)| score < min) {
                best = Some((score, assignment));
            }
        }
    }

    let (_, chosen) = best?;
    let mut to_box = nav.path(from, chosen.cell)?;
    to_box.pop();
    let box_to_goal = nav.path(chosen.cell, chosen.goal)?;
    Some(Route::ViaBox { to_box, box_to_goal })
}

fn route_to_agent_goal<N>(level: &Level, state: &WorldState, nav: &N, agent: usize) -> Option<Route>
where
    N: NavigationOracle + ?Sized,
{
    let from = state.agent_position(agent);
    let mut best: Option<(u32, Position)> = None;
    for goal in level.agent_goals(agent) {
        let Some(d) = nav.distance(from, *goal) else {
            continue;
        };
        if *goal == from {
            return None;
        }
        if (d as i32) < level.area() && best.is_none_or(|(min, _)| d < min) {
            best = Some((d, *goal));
        }
    }
    let (_, goal) = best?;
    Some(Route::ToGoal {
        path: nav.path(from, goal)?,
    })
}
