use rand::Rng;
use rand::seq::SliceRandom;

use crate::infra::Position;
use crate::state::{Action, JointAction, Level, WorldState};

/// Individually legal actions for one agent, NoOp first.
pub fn applicable_actions(level: &Level, state: &WorldState, agent: usize) -> Vec<Action> {
    Action::all()
        .iter()
        .filter(|action| state.is_applicable(level, agent, action))
        .copied()
        .collect()
}

/// Cells an agent's action claims in the next snapshot.
#[derive(Clone, Copy, Default)]
struct Footprint {
    agent: Option<Position>,
    box_from: Option<Position>,
    box_to: Option<Position>,
}

impl Footprint {
    fn of(state: &WorldState, agent: usize, action: &Action) -> Self {
        if *action == Action::NoOp {
            return Self::default();
        }
        let pos = state.agent_position(agent);
        Self {
            agent: Some(action.agent_target(pos)),
            box_from: action.box_origin(pos),
            box_to: action.box_target(pos),
        }
    }

    fn clashes_with(&self, other: &Footprint) -> bool {
        let same = |a: Option<Position>, b: Option<Position>| a.is_some() && a == b;
        same(self.agent, other.agent)
            || same(self.box_to, other.box_to)
            || same(self.box_to, other.agent)
            || same(self.agent, other.box_to)
            || same(self.box_from, other.box_from)
    }
}

/// True when two agents would end up on the same cell, two boxes would, an
/// agent and a box would, or two agents try to move the same box.
pub fn is_conflicting(state: &WorldState, joint: &[Action]) -> bool {
    let footprints: Vec<Footprint> = joint
        .iter()
        .enumerate()
        .map(|(agent, action)| Footprint::of(state, agent, action))
        .collect();

    for (a1, first) in footprints.iter().enumerate() {
        if joint[a1] == Action::NoOp {
            continue;
        }
        for (a2, second) in footprints.iter().enumerate().skip(a1 + 1) {
            if joint[a2] == Action::NoOp {
                continue;
            }
            if first.clashes_with(second) {
                return true;
            }
        }
    }
    false
}

/// All collision-free joint actions from `state` with the snapshots they
/// produce, shuffled with `rng`.
pub fn expand<R: Rng + ?Sized>(
    level: &Level,
    state: &WorldState,
    rng: &mut R,
) -> Vec<(JointAction, WorldState)> {
    let num_agents = state.num_agents();
    let per_agent: Vec<Vec<Action>> = (0..num_agents)
        .map(|agent| applicable_actions(level, state, agent))
        .collect();

    let mut children = Vec::new();
    let mut permutation = vec![0usize; num_agents];
    loop {
        let joint: JointAction = permutation
            .iter()
            .enumerate()
            .map(|(agent, idx)| per_agent[agent][*idx])
            .collect();
        if !is_conflicting(state, &joint) {
            let next = state.apply_joint(&joint);
            children.push((joint, next));
        }
        if !advance(&mut permutation, &per_agent) {
            break;
        }
    }

    children.shuffle(rng);
    children
}

/// Odometer step with agent 0 varying fastest. Returns false once every
/// combination has been produced.
fn advance(permutation: &mut [usize], per_agent: &[Vec<Action>]) -> bool {
    for (agent, idx) in permutation.iter_mut().enumerate() {
        if *idx + 1 < per_agent[agent].len() {
            *idx += 1;
            return true;
        }
        *idx = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Direction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn parse(text: &str) -> (Level, WorldState) {
        Level::parse(text).unwrap()
    }

    const FACING: &str = "#colors\nred: 0\nblue: 1\n#initial\n+++++\n+0 1+\n+++++\n#goal\n+++++\n+   +\n+++++\n#end\n";

    #[test]
    fn test_noop_always_applicable() {
        let text = "#colors\nred: 0\n#initial\n+++\n+0+\n+++\n#goal\n+++\n+ +\n+++\n#end\n";
        let (level, world) = parse(text);
        assert_eq!(applicable_actions(&level, &world, 0), vec![Action::NoOp]);
        let mut rng = StdRng::seed_from_u64(1);
        let children = expand(&level, &world, &mut rng);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].1, world);
    }

    #[test]
    fn test_agents_moving_into_same_cell_conflict() {
        let (level, world) = parse(FACING);
        let joint = vec![Action::Move(Direction::East), Action::Move(Direction::West)];
        assert!(world.is_applicable(&level, 0, &joint[0]));
        assert!(world.is_applicable(&level, 1, &joint[1]));
        assert!(is_conflicting(&world, &joint));

        let mut rng = StdRng::seed_from_u64(1);
        let children = expand(&level, &world, &mut rng);
        // (NoOp, NoOp), (E, NoOp), (NoOp, W); the pair (E, W) is rejected
        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|(joint, _)| !is_conflicting(&world, joint)));
    }

    #[test]
    fn test_box_and_agent_target_conflict() {
        let text = "#colors\nred: 0, A\nblue: 1\n#initial\n++++++\n+0A  +\n+++ ++\n+++1++\n++++++\n#goal\n++++++\n+    +\n+++ ++\n+++ ++\n++++++\n#end\n";
        let (level, world) = parse(text);
        let push = Action::Push {
            agent: Direction::East,
            boxed: Direction::East,
        };
        let up = Action::Move(Direction::North);
        assert!(world.is_applicable(&level, 0, &push));
        // agent 1 at (3,3) goes to (2,3), the box goes to (1,3): no clash
        assert!(!is_conflicting(&world, &[push, up]));
        let moved = world.apply(1, &up);
        // now agent 1 would step into (1,3) as the box arrives there
        assert!(is_conflicting(&moved, &[push, up]));
    }

    #[test]
    fn test_two_agents_cannot_move_the_same_box() {
        let text = "#colors\nred: 0, 1, A\n#initial\n++++++\n+0A  +\n++1+++\n++ +++\n++++++\n#goal\n++++++\n+    +\n++ +++\n++ +++\n++++++\n#end\n";
        let (level, world) = parse(text);
        let push = Action::Push {
            agent: Direction::East,
            boxed: Direction::East,
        };
        let pull = Action::Pull {
            agent: Direction::South,
            boxed: Direction::South,
        };
        assert!(world.is_applicable(&level, 0, &push));
        assert!(world.is_applicable(&level, 1, &pull));
        assert!(is_conflicting(&world, &[push, pull]));
    }

    #[test]
    fn test_expansion_is_deterministic_for_a_seed() {
        let (level, world) = parse(FACING);
        let first = expand(&level, &world, &mut StdRng::seed_from_u64(7));
        let second = expand(&level, &world, &mut StdRng::seed_from_u64(7));
        let actions = |c: &Vec<(JointAction, WorldState)>| {
            c.iter().map(|(j, _)| j.clone()).collect::<Vec<_>>()
        };
        assert_eq!(actions(&first), actions(&second));
    }
}
