use std::fmt;

use crate::infra::{NavigationOracle, Position};
use crate::planners::search::SearchNode;
use crate::state::{Level, WorldState};

/// How `g` and `h` combine into the priority `f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// f = g
    Bfs,
    /// f = g + weight * h
    WeightedAStar { weight: i32 },
    /// f = h
    Greedy,
}

/// Priority function for the best-first frontier.
pub struct Evaluation<H> {
    strategy: Strategy,
    heuristic: H,
}

impl<H> Evaluation<H>
where
    H: Fn(&WorldState) -> i32,
{
    pub fn new(strategy: Strategy, heuristic: H) -> Self {
        Self { strategy, heuristic }
    }

    pub fn weighted_astar(weight: i32, heuristic: H) -> Self {
        Self::new(Strategy::WeightedAStar { weight }, heuristic)
    }

    pub fn greedy(heuristic: H) -> Self {
        Self::new(Strategy::Greedy, heuristic)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn h(&self, state: &WorldState) -> i32 {
        (self.heuristic)(state)
    }

    pub fn f(&self, node: &SearchNode) -> i32 {
        let g = node.g as i32;
        match self.strategy {
            Strategy::Bfs => g,
            Strategy::WeightedAStar { weight } => g + weight * self.h(&node.state),
            Strategy::Greedy => self.h(&node.state),
        }
    }
}

impl<H> fmt::Display for Evaluation<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::Bfs => write!(f, "breadth-first"),
            Strategy::WeightedAStar { weight } => write!(f, "WA*(w={weight})"),
            Strategy::Greedy => write!(f, "greedy"),
        }
    }
}

/// Whole-level estimate for solving from scratch.
///
/// Sums, for every box and every agent, the walking distance to the nearest
/// goal of its own, and adds the number of open goals. Boxes and agents
/// without goals add nothing; goals that cannot be reached count as
/// `level.area()`.
pub fn goal_distance_heuristic<N>(level: &Level, nav: &N, state: &WorldState) -> i32
where
    N: NavigationOracle + ?Sized,
{
    let nearest = |from: Position, goals: &[Position]| -> i32 {
        if goals.is_empty() {
            return 0;
        }
        goals
            .iter()
            .filter_map(|goal| nav.distance(from, *goal))
            .min()
            .map_or(level.area(), |d| d as i32)
    };

    let boxes: i32 = state
        .boxes()
        .iter()
        .map(|(pos, letter)| nearest(pos, level.box_goals(letter)))
        .sum();
    let agents: i32 = state
        .agent_positions()
        .iter()
        .enumerate()
        .map(|(agent, pos)| nearest(*pos, level.agent_goals(agent)))
        .sum();

    boxes + agents + state.unsatisfied_goals(level) as i32
}
