use crate::planners::decoupled::Conflict;
use crate::state::WorldState;

/// Trait for observing the orchestrator while it builds a plan
pub trait PlanObserver {
    /// Called at the top of every outer iteration
    fn on_iteration_start(&mut self, _iteration: usize, _world: &WorldState) {}

    /// Called once the prioritized agent for the iteration is known
    fn on_agent_prioritized(&mut self, _agent: usize, _route_len: usize, _obstacles: usize) {}

    /// Called when the prioritized agent's route is blocked
    fn on_conflict(&mut self, _agent: usize, _conflict: &Conflict) {}

    /// Called when a resolution sub-plan has been spliced in
    fn on_resolution(&mut self, _agent: usize, _steps: usize, _world: &WorldState) {}

    /// Called when the level is solved
    fn on_plan_complete(&mut self, _steps: usize, _iterations: usize) {}
}
