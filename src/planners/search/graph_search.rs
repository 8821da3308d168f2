use std::collections::HashSet;

use rand::Rng;

use crate::planners::search::{Frontier, SearchNode, expander};
use crate::state::{Level, Plan, WorldState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expanded: usize,
    pub generated: usize,
    pub explored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Joint actions leading from the root to a goal snapshot. Empty when the
    /// root already satisfies the goal.
    Found(Plan),
    /// Every reachable snapshot was explored without meeting the goal.
    Exhausted,
    /// The expansion cap was hit first.
    Cutoff,
}

/// Graph search over joint actions.
///
/// Nodes are goal-tested when popped. A child is queued only if its snapshot
/// has not been seen before.
#[tracing::instrument(level = "trace", skip_all, fields(frontier = %frontier.name()))]
pub fn graph_search<F, G, R>(
    level: &Level,
    initial: WorldState,
    frontier: &mut F,
    is_goal: G,
    max_expansions: Option<usize>,
    rng: &mut R,
) -> (SearchOutcome, SearchStats)
where
    F: Frontier + ?Sized,
    G: Fn(&WorldState) -> bool,
    R: Rng + ?Sized,
{
    let mut stats = SearchStats::default();
    let mut seen: HashSet<WorldState> = HashSet::new();

    seen.insert(initial.clone());
    frontier.add(SearchNode::root(initial));

    while let Some(node) = frontier.pop() {
        if is_goal(&node.state) {
            stats.explored = seen.len();
            tracing::debug!(
                expanded = stats.expanded,
                generated = stats.generated,
                length = node.g,
                "Search reached goal"
            );
            return (SearchOutcome::Found(node.extract_plan()), stats);
        }

        if max_expansions.is_some_and(|cap| stats.expanded >= cap) {
            stats.explored = seen.len();
            tracing::debug!(expanded = stats.expanded, "Search cut off");
            return (SearchOutcome::Cutoff, stats);
        }
        stats.expanded += 1;

        for (joint, child) in expander::expand(level, &node.state, rng) {
            if seen.contains(&child) {
                continue;
            }
            seen.insert(child.clone());
            stats.generated += 1;
            frontier.add(SearchNode::child(&node, joint, child));
        }

        if stats.expanded % 10_000 == 0 {
            tracing::trace!(
                expanded = stats.expanded,
                frontier = frontier.len(),
                explored = seen.len(),
                "Search progress"
            );
        }
    }

    stats.explored = seen.len();
    tracing::debug!(expanded = stats.expanded, "Search exhausted");
    (SearchOutcome::Exhausted, stats)
}
