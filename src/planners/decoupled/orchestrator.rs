use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::infra::{NavigationOracle, PlanError, PlanObserver};
use crate::planners::decoupled::{
    PlannerConfig, aligned_slice, build_target, detect_conflict, prioritize, resolve_conflict,
    route_agents,
};
use crate::state::{Action, JointAction, Level, Plan, WorldState};

/// Drives the decoupled planner: one prioritized agent per iteration, its
/// route spliced with local resolutions wherever something is in the way.
pub struct Orchestrator<'a, N: NavigationOracle + ?Sized> {
    level: &'a Level,
    navigator: &'a N,
    config: PlannerConfig,
}

impl<'a, N: NavigationOracle + ?Sized> Orchestrator<'a, N> {
    pub fn new(level: &'a Level, navigator: &'a N, config: PlannerConfig) -> Self {
        Self {
            level,
            navigator,
            config,
        }
    }

    /// Joint-action plan taking `initial` to a goal state.
    pub fn plan(
        &self,
        initial: &WorldState,
        observer: &mut dyn PlanObserver,
    ) -> Result<Plan, PlanError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut state = initial.clone();
        let mut plan = Plan::new();
        let mut iteration = 0;

        while !state.is_goal_state(self.level) {
            if iteration >= self.config.max_iterations {
                return Err(PlanError::IterationLimit(self.config.max_iterations));
            }
            iteration += 1;
            observer.on_iteration_start(iteration, &state);

            let routes = route_agents(self.level, &state, self.navigator);
            let mut sequences: Vec<Vec<Action>> = routes
                .iter()
                .map(|route| {
                    route
                        .as_ref()
                        .and_then(|route| route.to_actions(self.level, self.navigator))
                        .unwrap_or_default()
                })
                .collect();

            let priority = prioritize(&routes, &sequences, &state).ok_or(PlanError::NoRoutes)?;
            let agent = priority.agent;
            observer.on_agent_prioritized(agent, priority.route_len, priority.obstacles);

            for (other, sequence) in sequences.iter_mut().enumerate() {
                if other != agent {
                    sequence.clear();
                }
            }
            let sequence = &sequences[agent];

            let before = state.clone();
            let mut index = 0;
            while let Some(detected) = detect_conflict(self.level, &state, sequence, index, agent) {
                let prefix = aligned_slice(&sequences, index, detected.step);
                state = self.replay(&state, &prefix, &mut plan)?;

                let conflict = build_target(self.level, self.navigator, detected, sequence, agent)?;
                observer.on_conflict(agent, &conflict);

                let resolution = resolve_conflict(
                    self.level,
                    self.navigator,
                    &conflict,
                    self.config.weight,
                    self.config.max_expansions,
                    &mut rng,
                )?;
                state = self.replay(&conflict.snapshot, &resolution, &mut plan)?;
                observer.on_resolution(agent, resolution.len(), &state);

                index = conflict.step + conflict.skipped;
            }

            let suffix = aligned_slice(&sequences, index, sequence.len());
            state = self.replay(&state, &suffix, &mut plan)?;

            if state == before {
                return Err(PlanError::NoProgress { iteration });
            }
        }

        observer.on_plan_complete(plan.len(), iteration);
        Ok(plan)
    }

    /// Apply `steps` to `state`, appending them to `plan`. Every action is
    /// checked against the snapshot it is applied to.
    fn replay(
        &self,
        state: &WorldState,
        steps: &[JointAction],
        plan: &mut Plan,
    ) -> Result<WorldState, PlanError> {
        let mut state = state.clone();
        for joint in steps {
            let illegal = joint
                .iter()
                .enumerate()
                .find(|(agent, action)| !state.is_applicable(self.level, *agent, action));
            if let Some((agent, action)) = illegal {
                return Err(PlanError::IllegalAction {
                    agent,
                    action: *action,
                    step: plan.len(),
                });
            }
            state = state.apply_joint(joint);
            plan.push(joint.clone());
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{DefaultObserver, Direction, GridNavigator, Position};
    use crate::planners::decoupled::Conflict;
    use crate::planners::search::expander::is_conflicting;

    fn p(row: i32, col: i32) -> Position {
        Position::new(row, col)
    }

    fn solve(text: &str, config: PlannerConfig) -> (Level, WorldState, Result<Plan, PlanError>) {
        let (level, world) = Level::parse(text).unwrap();
        let nav = GridNavigator::new(&level);
        let result =
            Orchestrator::new(&level, &nav, config).plan(&world, &mut DefaultObserver);
        (level, world, result)
    }

    /// Replays the plan checking legality and collisions; returns the end state.
    fn validate(level: &Level, initial: &WorldState, plan: &Plan) -> WorldState {
        let mut state = initial.clone();
        for (step, joint) in plan.iter().enumerate() {
            assert_eq!(joint.len(), state.num_agents(), "step {step} has the wrong width");
            for (agent, action) in joint.iter().enumerate() {
                assert!(
                    state.is_applicable(level, agent, action),
                    "step {step}: {action} of agent {agent}"
                );
            }
            assert!(!is_conflicting(&state, joint), "step {step} collides");
            state = state.apply_joint(joint);
        }
        state
    }

    #[derive(Default)]
    struct Recorder {
        iterations: usize,
        conflicts: Vec<(usize, usize)>,
        resolutions: usize,
        completed: Option<(usize, usize)>,
    }

    impl PlanObserver for Recorder {
        fn on_iteration_start(&mut self, _iteration: usize, _world: &WorldState) {
            self.iterations += 1;
        }

        fn on_conflict(&mut self, agent: usize, conflict: &Conflict) {
            self.conflicts.push((agent, conflict.step));
        }

        fn on_resolution(&mut self, _agent: usize, _steps: usize, _world: &WorldState) {
            self.resolutions += 1;
        }

        fn on_plan_complete(&mut self, steps: usize, iterations: usize) {
            self.completed = Some((steps, iterations));
        }
    }

    const PUSH: &str = "#colors\nblue: 0, A\n#initial\n+++++\n+0A +\n+++++\n#goal\n+++++\n+  A+\n+++++\n#end\n";
    const SWAP: &str = "#colors\nred: 0\nblue: 1\n#initial\n+++++\n+01++\n+  ++\n+++++\n#goal\n+++++\n+10++\n+  ++\n+++++\n#end\n";
    const NICHE: &str = "#colors\nred: 0\nblue: 1\n#initial\n+++++++\n+0 1  +\n+++ +++\n+++++++\n#goal\n+++++++\n+    0+\n+++ +++\n+++++++\n#end\n";
    const TWO_ROOMS: &str = "#colors\nred: 0, A\nblue: 1, B\n#initial\n+++++++\n+0A   +\n+     +\n+1B   +\n+++++++\n#goal\n+++++++\n+    A+\n+     +\n+    B+\n+++++++\n#end\n";

    #[test]
    fn test_single_push_round_trip() {
        let (_, _, plan) = solve(PUSH, PlannerConfig::default());
        assert_eq!(
            plan.unwrap(),
            vec![vec![Action::Push {
                agent: Direction::East,
                boxed: Direction::East
            }]]
        );
    }

    #[test]
    fn test_solved_level_gives_empty_plan() {
        let text = "#colors\nblue: 0, A\n#initial\n++++\n+0A+\n++++\n#goal\n++++\n+ A+\n++++\n#end\n";
        let (level, world) = Level::parse(text).unwrap();
        let nav = GridNavigator::new(&level);
        let mut recorder = Recorder::default();
        let plan = Orchestrator::new(&level, &nav, PlannerConfig::default())
            .plan(&world, &mut recorder)
            .unwrap();
        assert!(plan.is_empty());
        assert_eq!(recorder.completed, Some((0, 0)));
    }

    #[test]
    fn test_swap_relocates_blocking_agent_to_origin() {
        let (level, world) = Level::parse(SWAP).unwrap();
        let nav = GridNavigator::new(&level);
        let mut recorder = Recorder::default();
        let plan = Orchestrator::new(&level, &nav, PlannerConfig::default())
            .plan(&world, &mut recorder)
            .unwrap();

        let end = validate(&level, &world, &plan);
        assert!(end.is_goal_state(&level));
        assert_eq!(end.agent_position(0), p(1, 2));
        assert_eq!(end.agent_position(1), p(1, 1));
        assert_eq!(recorder.iterations, 1);
        assert_eq!(recorder.conflicts, vec![(0, 0)]);
        assert_eq!(recorder.resolutions, 1);
        assert_eq!(recorder.completed, Some((plan.len(), 1)));
    }

    #[test]
    fn test_blocking_agent_steps_into_niche() {
        let (level, world, plan) = solve(NICHE, PlannerConfig::default());
        let plan = plan.unwrap();
        let end = validate(&level, &world, &plan);
        assert!(end.is_goal_state(&level));
        assert_eq!(end.agent_position(0), p(1, 5));
        // the first step is the clear prefix, the other agent waits
        assert_eq!(plan[0], vec![Action::Move(Direction::East), Action::NoOp]);
    }

    #[test]
    fn test_independent_agents_take_turns() {
        let (level, world, plan) = solve(TWO_ROOMS, PlannerConfig::default());
        let plan = plan.unwrap();
        let end = validate(&level, &world, &plan);
        assert!(end.is_goal_state(&level));
        assert_eq!(plan.len(), 6);
        assert!(plan[..3].iter().all(|joint| joint[1] == Action::NoOp));
        assert!(plan[3..].iter().all(|joint| joint[0] == Action::NoOp));
    }

    #[test]
    fn test_same_seed_same_plan() {
        let config = PlannerConfig {
            seed: 7,
            ..PlannerConfig::default()
        };
        let (_, _, first) = solve(NICHE, config);
        let (_, _, second) = solve(NICHE, config);
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn test_unreachable_box_reports_no_routes() {
        let text = "#colors\nblue: 0, A\n#initial\n++++++\n+0+A +\n++++++\n#goal\n++++++\n+ + A+\n++++++\n#end\n";
        let (_, _, plan) = solve(text, PlannerConfig::default());
        assert_eq!(plan, Err(PlanError::NoRoutes));
    }

    #[test]
    fn test_impossible_swap_is_a_hard_failure() {
        let text = "#colors\nred: 0\nblue: 1\n#initial\n+++++\n+01 +\n+++++\n#goal\n+++++\n+10 +\n+++++\n#end\n";
        let (_, _, plan) = solve(text, PlannerConfig::default());
        assert!(matches!(plan, Err(PlanError::PlanningStalled { agent: 0, step: 0, .. })));
    }

    #[test]
    fn test_iteration_limit() {
        let config = PlannerConfig {
            max_iterations: 0,
            ..PlannerConfig::default()
        };
        let (_, _, plan) = solve(PUSH, config);
        assert_eq!(plan, Err(PlanError::IterationLimit(0)));
    }
}
