use crate::infra::{NavigationOracle, PlanError, Position};
use crate::state::{Action, ActionKind, Level, WorldState};

/// First blocked step of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedConflict {
    /// Index of the blocked action in the route.
    pub step: usize,
    /// The input snapshot with only the steps before `step` applied.
    pub snapshot: WorldState,
}

/// A blocked route together with the snapshot the local search has to reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub agent: usize,
    pub step: usize,
    /// Route steps covered by reaching `target`.
    pub skipped: usize,
    pub snapshot: WorldState,
    pub target: WorldState,
    /// Cells walked while looking for a free spot, minus the final ones.
    pub obstacle_area: Vec<Position>,
    pub initial_agent: Position,
    pub final_agent: Position,
    pub initial_box: Option<Position>,
    pub final_box: Option<Position>,
}

/// Walk `sequence` from `start` against the unmodified `state` and report the
/// first step whose destination is taken.
///
/// Move and Pull are blocked when the agent's destination holds anything but
/// the agent itself; Push is blocked when the box's destination does. The cell
/// the agent's own box started on no longer counts once the route moved it.
pub fn detect_conflict(
    level: &Level,
    state: &WorldState,
    sequence: &[Action],
    start: usize,
    agent: usize,
) -> Option<DetectedConflict> {
    let mut pos = state.agent_position(agent);
    let mut vacated: Option<Position> = None;

    let occupied = |cell: Position, vacated: Option<Position>| {
        !state.cell_is_free(level, cell)
            && state.agent_at(cell) != Some(agent)
            && Some(cell) != vacated
    };

    for (step, action) in sequence.iter().enumerate().skip(start) {
        let blocked = match action.kind() {
            ActionKind::NoOp => false,
            ActionKind::Move | ActionKind::Pull => occupied(action.agent_target(pos), vacated),
            ActionKind::Push => action
                .box_target(pos)
                .is_some_and(|cell| occupied(cell, vacated)),
        };
        if blocked {
            tracing::debug!(agent, step, at = %pos, action = %action, "Route blocked");
            return Some(DetectedConflict {
                step,
                snapshot: state.apply_agent_sequence(agent, &sequence[start..step]),
            });
        }
        if vacated.is_none() && action.moves_box() {
            vacated = action.box_origin(pos);
        }
        pos = action.agent_target(pos);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPhase {
    /// Nothing past the blocked step examined yet.
    Prefix,
    /// Walking the remainder for a spot where agent and box both fit.
    Scanning,
    Found,
    /// Ran off the end of the route; the last action anchors the target.
    Exhausted,
}

/// Forward walk over the rest of a blocked route that finds where the agent
/// (and its box) would first stand on free cells.
struct TargetScan<'a> {
    level: &'a Level,
    snapshot: &'a WorldState,
    phase: ScanPhase,
    agent_cell: Position,
    initial_agent: Position,
    initial_box: Option<Position>,
    obstacle_area: Vec<Position>,
    consumed: usize,
}

impl<'a> TargetScan<'a> {
    fn new(level: &'a Level, snapshot: &'a WorldState, agent: usize) -> Self {
        let start = snapshot.agent_position(agent);
        Self {
            level,
            snapshot,
            phase: ScanPhase::Prefix,
            agent_cell: start,
            initial_agent: start,
            initial_box: None,
            obstacle_area: Vec::new(),
            consumed: 0,
        }
    }

    fn is_free(&self, cell: Position) -> bool {
        self.snapshot.cell_is_free(self.level, cell)
    }

    fn run(&mut self, remainder: &[Action]) {
        for action in remainder {
            self.advance(action);
            if self.phase == ScanPhase::Found {
                return;
            }
        }
        self.phase = ScanPhase::Exhausted;
    }

    fn advance(&mut self, action: &Action) {
        self.phase = ScanPhase::Scanning;
        let box_cell = action.box_origin(self.agent_cell);

        if self.initial_box.is_none() && box_cell.is_some() {
            self.initial_box = box_cell;
            if self.is_free(self.agent_cell) {
                self.phase = ScanPhase::Found;
                return;
            }
        }
        if self.is_free(self.agent_cell) && box_cell.is_none_or(|cell| self.is_free(cell)) {
            self.phase = ScanPhase::Found;
            return;
        }

        self.agent_cell = action.agent_target(self.agent_cell);
        self.obstacle_area.push(self.agent_cell);
        self.consumed += 1;
    }

    /// Where the box ends up, judged from the last consumed action.
    fn final_box(&self, last: &Action) -> Option<Position> {
        let start = self.initial_box?;
        let pos = self.agent_cell;
        let anchored = match (*last, self.phase) {
            (Action::Push { boxed, .. }, ScanPhase::Exhausted) => Some(pos.step(boxed)),
            (Action::Push { agent, .. }, _) => Some(pos.step(agent)),
            (Action::Pull { agent, .. }, _) => Some(pos.step_back(agent)),
            _ => None,
        };
        Some(anchored.unwrap_or(start))
    }
}

/// Builds the post-conflict target for a detected conflict.
///
/// `sequence` is the whole route of `agent`; the walk starts at the blocked
/// step.
#[tracing::instrument(level = "trace", skip_all, fields(agent = agent, step = detected.step))]
pub fn build_target<N>(
    level: &Level,
    nav: &N,
    detected: DetectedConflict,
    sequence: &[Action],
    agent: usize,
) -> Result<Conflict, PlanError>
where
    N: NavigationOracle + ?Sized,
{
    let step = detected.step;
    let remainder = sequence.get(step..).unwrap_or_default();
    let malformed = PlanError::MalformedTarget { agent, step };

    let snapshot = &detected.snapshot;
    let mut scan = TargetScan::new(level, snapshot, agent);
    scan.run(remainder);
    let last = *scan
        .consumed
        .checked_sub(1)
        .and_then(|idx| remainder.get(idx))
        .ok_or(malformed)?;

    let initial_agent = scan.initial_agent;
    let final_agent = scan.agent_cell;
    let initial_box = scan.initial_box;
    let final_box = scan.final_box(&last);
    let skipped = scan.consumed;
    let exhausted = scan.phase == ScanPhase::Exhausted;
    let mut obstacle_area = scan.obstacle_area;
    let displacement = nav.distance(initial_agent, final_agent);

    let relocate = |target: &mut WorldState, from: Position, to: Position| {
        if let Some(letter) = snapshot.box_at(from) {
            target.clear_box(from);
            target.place_box(to, letter);
        } else if let Some(other) = snapshot.agent_at(from).filter(|other| *other != agent) {
            target.set_agent_position(other, to);
        }
    };

    let mut target = snapshot.clone();
    match displacement {
        Some(1) => match last.kind() {
            ActionKind::Move => relocate(&mut target, final_agent, initial_agent),
            ActionKind::Pull => {
                if let Some(origin) = initial_box {
                    relocate(&mut target, final_agent, origin);
                }
            }
            ActionKind::Push => {
                if let Some(cell) = final_box {
                    relocate(&mut target, cell, initial_agent);
                }
            }
            ActionKind::NoOp => {}
        },
        Some(2) => relocate(&mut target, final_agent, initial_agent),
        _ => {}
    }
    target.set_agent_position(agent, final_agent);

    remove_first(&mut obstacle_area, final_agent);

    // a one-step pull swaps a blocking box onto the box's old cell
    let box_swapped_in = displacement == Some(1)
        && last.kind() == ActionKind::Pull
        && snapshot.box_at(final_agent).is_some();

    if let (Some(from), Some(to)) = (initial_box, final_box) {
        let letter = snapshot.box_at(from);
        if !box_swapped_in {
            target.clear_box(from);
        }
        if displacement == Some(2) {
            relocate(&mut target, to, from);
        }
        if let Some(letter) = letter {
            target.place_box(to, letter);
        }
        remove_first(&mut obstacle_area, to);
    }
    if let Some(from) = initial_box {
        remove_first(&mut obstacle_area, from);
    }

    tracing::debug!(
        agent,
        step,
        skipped,
        exhausted,
        from = %initial_agent,
        to = %final_agent,
        "Post-conflict target built"
    );

    Ok(Conflict {
        agent,
        step,
        skipped,
        snapshot: detected.snapshot,
        target,
        obstacle_area,
        initial_agent,
        final_agent,
        initial_box,
        final_box,
    })
}

fn remove_first(cells: &mut Vec<Position>, cell: Position) {
    if let Some(idx) = cells.iter().position(|c| *c == cell) {
        cells.remove(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{Direction, GridNavigator};

    fn p(row: i32, col: i32) -> Position {
        Position::new(row, col)
    }

    const E: Action = Action::Move(Direction::East);

    const BLOCKED: &str = "#colors\nred: 0\nblue: B\n#initial\n+++++++\n+0 B  +\n+++++++\n#goal\n+++++++\n+     +\n+++++++\n#end\n";
    const CLEAR: &str = "#colors\nred: 0\nblue: B\n#initial\n+++++++\n+0    +\n+++++++\n#goal\n+++++++\n+     +\n+++++++\n#end\n";

    #[test]
    fn test_foreign_box_blocks_move() {
        let (level, world) = Level::parse(BLOCKED).unwrap();
        let route = [E, E, E, E];
        let detected = detect_conflict(&level, &world, &route, 0, 0).unwrap();
        assert_eq!(detected.step, 1);
        assert_eq!(detected.snapshot.agent_position(0), p(1, 2));
        assert_eq!(detected.snapshot.box_at(p(1, 3)), Some(b'B'));
    }

    #[test]
    fn test_clear_corridor_has_no_conflict() {
        let (level, world) = Level::parse(CLEAR).unwrap();
        assert_eq!(detect_conflict(&level, &world, &[E, E, E, E], 0, 0), None);
        // scanning starts at the given index
        let (level, world) = Level::parse(BLOCKED).unwrap();
        let moved = world.apply_agent_sequence(0, &[E, E, E]);
        assert_eq!(detect_conflict(&level, &moved, &[E, E, E, E], 3, 0), None);
    }

    #[test]
    fn test_own_pushed_box_does_not_block() {
        // agent pushes A east and then walks back over A's start cell
        let text = "#colors\nred: 0, A\n#initial\n++++++\n+0A  +\n++++++\n#goal\n++++++\n+    +\n++++++\n#end\n";
        let (level, world) = Level::parse(text).unwrap();
        let push = Action::Push {
            agent: Direction::East,
            boxed: Direction::East,
        };
        let route = [push, push, Action::Move(Direction::West), Action::Move(Direction::West)];
        assert_eq!(detect_conflict(&level, &world, &route, 0, 0), None);
    }

    #[test]
    fn test_target_is_first_free_cell_past_the_obstacle() {
        let (level, world) = Level::parse(BLOCKED).unwrap();
        let nav = GridNavigator::new(&level);
        let route = [E, E, E, E];
        let detected = detect_conflict(&level, &world, &route, 0, 0).unwrap();
        let conflict = build_target(&level, &nav, detected, &route, 0).unwrap();

        // (1,2) holds the agent, (1,3) the box; (1,4) is the first free cell
        assert_eq!(conflict.skipped, 2);
        assert_eq!(conflict.initial_agent, p(1, 2));
        assert_eq!(conflict.final_agent, p(1, 4));
        assert_eq!(conflict.target.agent_position(0), p(1, 4));
        assert_eq!(conflict.target.box_at(p(1, 3)), Some(b'B'));
        assert_eq!(conflict.obstacle_area, vec![p(1, 3)]);
        assert_eq!(conflict.initial_box, None);
    }

    #[test]
    fn test_two_step_target_swaps_occupant_back() {
        // the route runs out on the second box
        let text = "#colors\nred: 0\nblue: B, C\n#initial\n++++++\n+0BC +\n++++++\n#goal\n++++++\n+    +\n++++++\n#end\n";
        let (level, world) = Level::parse(text).unwrap();
        let nav = GridNavigator::new(&level);
        let route = [E, E];
        let detected = detect_conflict(&level, &world, &route, 0, 0).unwrap();
        assert_eq!(detected.step, 0);
        let conflict = build_target(&level, &nav, detected, &route, 0).unwrap();

        assert_eq!(conflict.skipped, 2);
        assert_eq!(conflict.final_agent, p(1, 3));
        assert_eq!(conflict.target.agent_position(0), p(1, 3));
        assert_eq!(conflict.target.box_at(p(1, 1)), Some(b'C'));
        assert_eq!(conflict.target.box_at(p(1, 2)), Some(b'B'));
        assert_eq!(conflict.target.box_at(p(1, 3)), None);
        assert_eq!(conflict.obstacle_area, vec![p(1, 2)]);
    }

    #[test]
    fn test_one_step_move_swaps_agent_back() {
        let text = "#colors\nred: 0\nblue: 1\n#initial\n+++++\n+01++\n+  ++\n+++++\n#goal\n+++++\n+10++\n+  ++\n+++++\n#end\n";
        let (level, world) = Level::parse(text).unwrap();
        let nav = GridNavigator::new(&level);
        let route = [E];
        let detected = detect_conflict(&level, &world, &route, 0, 0).unwrap();
        assert_eq!(detected.step, 0);
        let conflict = build_target(&level, &nav, detected, &route, 0).unwrap();

        assert_eq!(conflict.skipped, 1);
        assert_eq!(conflict.target.agent_position(0), p(1, 2));
        assert_eq!(conflict.target.agent_position(1), p(1, 1));
        assert!(conflict.obstacle_area.is_empty());
    }

    const PUSH_E: Action = Action::Push {
        agent: Direction::East,
        boxed: Direction::East,
    };
    const PULL_E: Action = Action::Pull {
        agent: Direction::East,
        boxed: Direction::East,
    };

    /// Builds the target of a single blocked action on a two-row level whose
    /// first row is `row` and checks that the target is a legal snapshot.
    fn one_step_target(colors: &str, row: &str, action: Action) -> Conflict {
        let text = format!(
            "#colors\n{colors}\n#initial\n+++++++\n{row}\n+     +\n+++++++\n#goal\n+++++++\n+     +\n+     +\n+++++++\n#end\n"
        );
        let (level, world) = Level::parse(&text).unwrap();
        let nav = GridNavigator::new(&level);
        let route = [action];
        let detected = detect_conflict(&level, &world, &route, 0, 0).unwrap();
        assert_eq!(detected.step, 0);
        let conflict = build_target(&level, &nav, detected, &route, 0).unwrap();

        assert_eq!(conflict.skipped, 1);
        assert_eq!(conflict.target.boxes().len(), world.boxes().len());
        for pos in conflict.target.agent_positions() {
            assert_eq!(conflict.target.box_at(*pos), None, "agent standing on a box at {pos}");
        }
        conflict
    }

    #[test]
    fn test_one_step_move_swaps_box_back() {
        let conflict = one_step_target("red: 0\nblue: B", "+0B   +", E);
        assert_eq!(conflict.target.agent_position(0), p(1, 2));
        assert_eq!(conflict.target.box_at(p(1, 1)), Some(b'B'));
    }

    #[test]
    fn test_one_step_pull_swaps_agent_onto_box_origin() {
        let conflict = one_step_target("red: 0, A\nblue: 1", "+A01  +", PULL_E);
        assert_eq!(conflict.initial_box, Some(p(1, 1)));
        assert_eq!(conflict.final_box, Some(p(1, 2)));
        assert_eq!(conflict.target.agent_position(0), p(1, 3));
        assert_eq!(conflict.target.agent_position(1), p(1, 1));
        assert_eq!(conflict.target.box_at(p(1, 1)), None);
        assert_eq!(conflict.target.box_at(p(1, 2)), Some(b'A'));
    }

    #[test]
    fn test_one_step_pull_swaps_box_onto_box_origin() {
        let conflict = one_step_target("red: 0, A\nblue: B", "+A0B  +", PULL_E);
        assert_eq!(conflict.target.agent_position(0), p(1, 3));
        assert_eq!(conflict.target.box_at(p(1, 1)), Some(b'B'));
        assert_eq!(conflict.target.box_at(p(1, 2)), Some(b'A'));
        assert_eq!(conflict.target.box_at(p(1, 3)), None);
    }

    #[test]
    fn test_one_step_push_swaps_agent_behind() {
        let conflict = one_step_target("red: 0, A\nblue: 1", "+0A1  +", PUSH_E);
        assert_eq!(conflict.initial_box, Some(p(1, 2)));
        assert_eq!(conflict.final_box, Some(p(1, 3)));
        assert_eq!(conflict.target.agent_position(0), p(1, 2));
        assert_eq!(conflict.target.agent_position(1), p(1, 1));
        assert_eq!(conflict.target.box_at(p(1, 3)), Some(b'A'));
    }

    #[test]
    fn test_one_step_push_swaps_box_behind() {
        let conflict = one_step_target("red: 0, A\nblue: B", "+0AB  +", PUSH_E);
        assert_eq!(conflict.target.agent_position(0), p(1, 2));
        assert_eq!(conflict.target.box_at(p(1, 1)), Some(b'B'));
        assert_eq!(conflict.target.box_at(p(1, 2)), None);
        assert_eq!(conflict.target.box_at(p(1, 3)), Some(b'A'));
    }

    #[test]
    fn test_pushed_box_gets_a_target_too() {
        let text = "#colors\nred: 0, A\nblue: B\n#initial\n++++++++\n+0AB   +\n++++++++\n#goal\n++++++++\n+      +\n++++++++\n#end\n";
        let (level, world) = Level::parse(text).unwrap();
        let nav = GridNavigator::new(&level);
        let push = Action::Push {
            agent: Direction::East,
            boxed: Direction::East,
        };
        let route = [push, push, push, push];
        let detected = detect_conflict(&level, &world, &route, 0, 0).unwrap();
        assert_eq!(detected.step, 0);
        let conflict = build_target(&level, &nav, detected, &route, 0).unwrap();

        assert_eq!(conflict.initial_box, Some(p(1, 2)));
        assert_eq!(conflict.final_agent, p(1, 4));
        assert_eq!(conflict.final_box, Some(p(1, 5)));
        assert_eq!(conflict.target.box_at(p(1, 5)), Some(b'A'));
        assert_eq!(conflict.target.agent_position(0), p(1, 4));
        assert_eq!(conflict.skipped, 3);
    }

    #[test]
    fn test_empty_remainder_is_malformed() {
        let (level, world) = Level::parse(BLOCKED).unwrap();
        let nav = GridNavigator::new(&level);
        let detected = DetectedConflict {
            step: 4,
            snapshot: world,
        };
        assert_eq!(
            build_target(&level, &nav, detected, &[E, E, E, E], 0),
            Err(PlanError::MalformedTarget { agent: 0, step: 4 })
        );
    }
}
