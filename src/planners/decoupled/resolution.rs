use rand::Rng;

use crate::infra::{NavigationOracle, PlanError};
use crate::planners::decoupled::Conflict;
use crate::planners::search::{Evaluation, FrontierBestFirst, SearchOutcome, graph_search};
use crate::state::{Level, Plan, WorldState};

/// Resolution heuristic: how far the prioritized agent is from its target
/// cell, how many goals are open, and how much is still standing in the
/// obstacle area.
pub fn resolution_heuristic<N>(
    level: &Level,
    nav: &N,
    conflict: &Conflict,
    state: &WorldState,
) -> i32
where
    N: NavigationOracle + ?Sized,
{
    let agent = conflict.agent;
    let here = state.agent_position(agent);
    let there = conflict.target.agent_position(agent);
    let distance = nav.distance(here, there).map_or(level.area(), |d| d as i32);

    let blocked = conflict
        .obstacle_area
        .iter()
        .filter(|cell| {
            state.box_at(**cell).is_some()
                || state.agent_at(**cell).is_some_and(|other| other != agent)
        })
        .count();

    distance + state.unsatisfied_goals(level) as i32 + blocked as i32
}

/// Local joint-action search from the conflict snapshot to its target.
///
/// Every agent may act. The returned plan ends exactly in `conflict.target`.
#[tracing::instrument(
    level = "trace",
    skip_all,
    fields(agent = conflict.agent, step = conflict.step)
)]
pub fn resolve_conflict<N, R>(
    level: &Level,
    nav: &N,
    conflict: &Conflict,
    weight: i32,
    max_expansions: Option<usize>,
    rng: &mut R,
) -> Result<Plan, PlanError>
where
    N: NavigationOracle + ?Sized,
    R: Rng + ?Sized,
{
    let evaluation = Evaluation::weighted_astar(weight, |state: &WorldState| {
        resolution_heuristic(level, nav, conflict, state)
    });
    let mut frontier = FrontierBestFirst::new(evaluation);

    let (outcome, stats) = graph_search(
        level,
        conflict.snapshot.clone(),
        &mut frontier,
        |state| *state == conflict.target,
        max_expansions,
        rng,
    );

    match outcome {
        SearchOutcome::Found(plan) => {
            tracing::debug!(
                agent = conflict.agent,
                steps = plan.len(),
                expanded = stats.expanded,
                "Conflict resolved"
            );
            Ok(plan)
        }
        SearchOutcome::Exhausted | SearchOutcome::Cutoff => {
            tracing::warn!(
                agent = conflict.agent,
                step = conflict.step,
                expanded = stats.expanded,
                cutoff = matches!(outcome, SearchOutcome::Cutoff),
                "Conflict resolution stalled"
            );
            Err(PlanError::PlanningStalled {
                agent: conflict.agent,
                step: conflict.step,
                expanded: stats.expanded,
            })
        }
    }
}
