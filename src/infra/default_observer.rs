use crate::infra::PlanObserver;
use crate::planners::decoupled::Conflict;
use crate::state::WorldState;

/// Observer that only logs.
pub struct DefaultObserver;

impl PlanObserver for DefaultObserver {
    fn on_iteration_start(&mut self, iteration: usize, world: &WorldState) {
        tracing::debug!(iteration, world = %world, "Starting planning iteration");
    }

    fn on_agent_prioritized(&mut self, agent: usize, route_len: usize, obstacles: usize) {
        tracing::debug!(agent, route_len, obstacles, "Prioritized agent selected");
    }

    fn on_conflict(&mut self, agent: usize, conflict: &Conflict) {
        tracing::debug!(
            agent,
            step = conflict.step,
            skipped = conflict.skipped,
            obstacle_area = ?conflict.obstacle_area,
            "Route blocked"
        );
    }

    fn on_resolution(&mut self, agent: usize, steps: usize, world: &WorldState) {
        tracing::debug!(agent, steps, world = %world, "Obstacle cleared");
    }

    fn on_plan_complete(&mut self, steps: usize, iterations: usize) {
        tracing::info!(steps, iterations, "Plan complete");
    }
}
