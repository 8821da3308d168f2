use crate::infra::Position;
use crate::planners::decoupled::Route;
use crate::state::{Action, WorldState};

/// Foreign agents and boxes currently sitting on a route, in route order and
/// without duplicates.
pub fn find_obstacles(route: &Route, agent: usize, state: &WorldState) -> Vec<Position> {
    let mut obstacles = Vec::new();
    for cell in route.swept_cells() {
        let foreign_agent = state.agent_at(cell).is_some_and(|other| other != agent);
        if (foreign_agent || state.box_at(cell).is_some()) && !obstacles.contains(&cell) {
            obstacles.push(cell);
        }
    }
    obstacles
}

/// The agent picked to act this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub agent: usize,
    pub obstacles: usize,
    pub route_len: usize,
}

/// Agent with the fewest obstacles on its route; ties go to the shorter
/// action sequence, then to the lower agent id.
///
/// Agents without actions are never picked. Returns `None` when no agent has
/// anything to do.
pub fn prioritize(
    routes: &[Option<Route>],
    sequences: &[Vec<Action>],
    state: &WorldState,
) -> Option<Priority> {
    let mut best: Option<Priority> = None;
    for (agent, (route, sequence)) in routes.iter().zip(sequences).enumerate() {
        let Some(route) = route else {
            continue;
        };
        if sequence.is_empty() {
            continue;
        }
        let candidate = Priority {
            agent,
            obstacles: find_obstacles(route, agent, state).len(),
            route_len: sequence.len(),
        };
        tracing::trace!(
            agent,
            obstacles = candidate.obstacles,
            route_len = candidate.route_len,
            "Route scanned"
        );
        let better = match best {
            None => true,
            Some(current) => {
                (candidate.obstacles, candidate.route_len) < (current.obstacles, current.route_len)
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}
