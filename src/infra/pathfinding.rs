use std::collections::VecDeque;

use crate::infra::Position;
use crate::state::Level;

/// Shortest-path queries over the static walls of a level.
///
/// Agents and boxes are ignored; only walls block.
pub trait NavigationOracle {
    fn distance(&self, from: Position, to: Position) -> Option<u32>;

    /// Cells from `from` to `to`, both ends included.
    fn path(&self, from: Position, to: Position) -> Option<Vec<Position>>;

    fn next_hop(&self, from: Position, to: Position) -> Option<Position>;

    /// Open cells with at least three open neighbours.
    fn branch_cells(&self) -> &[Position];
}

const UNREACHABLE: u32 = u32::MAX;

/// All-pairs breadth-first distance table over the open cells of a level.
pub struct GridNavigator {
    width: i32,
    height: i32,
    cell_index: Vec<Option<usize>>,
    open_cells: Vec<Position>,
    distances: Vec<u32>,
    branch_cells: Vec<Position>,
}

impl GridNavigator {
    #[tracing::instrument(
        level = "trace",
        skip(level),
        fields(width = level.width, height = level.height)
    )]
    pub fn new(level: &Level) -> Self {
        let mut cell_index = vec![None; level.area().max(0) as usize];
        let mut open_cells = Vec::new();
        for row in 0..level.height {
            for col in 0..level.width {
                let pos = Position::new(row, col);
                if !level.is_wall(pos) {
                    cell_index[(row * level.width + col) as usize] = Some(open_cells.len());
                    open_cells.push(pos);
                }
            }
        }

        let branch_cells = open_cells
            .iter()
            .copied()
            .filter(|pos| level.walls_around(*pos) <= 1)
            .collect();

        let mut navigator = Self {
            width: level.width,
            height: level.height,
            cell_index,
            distances: vec![UNREACHABLE; open_cells.len() * open_cells.len()],
            open_cells,
            branch_cells,
        };
        for source in 0..navigator.open_cells.len() {
            navigator.sweep_from(source);
        }

        tracing::debug!(
            open_cells = navigator.open_cells.len(),
            branch_cells = navigator.branch_cells.len(),
            "Navigation table built"
        );
        navigator
    }

    fn sweep_from(&mut self, source: usize) {
        let n = self.open_cells.len();
        let row_offset = source * n;
        self.distances[row_offset + source] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(current) = queue.pop_front() {
            let current_distance = self.distances[row_offset + current];
            for neighbor in self.open_cells[current].neighbors() {
                let Some(next) = self.index_of(neighbor) else {
                    continue;
                };
                if self.distances[row_offset + next] == UNREACHABLE {
                    self.distances[row_offset + next] = current_distance + 1;
                    queue.push_back(next);
                }
            }
        }
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        if pos.row < 0 || pos.row >= self.height || pos.col < 0 || pos.col >= self.width {
            return None;
        }
        self.cell_index[(pos.row * self.width + pos.col) as usize]
    }

    fn raw_distance(&self, from: usize, to: usize) -> Option<u32> {
        let d = self.distances[from * self.open_cells.len() + to];
        (d != UNREACHABLE).then_some(d)
    }
}

impl NavigationOracle for GridNavigator {
    fn distance(&self, from: Position, to: Position) -> Option<u32> {
        self.raw_distance(self.index_of(from)?, self.index_of(to)?)
    }

    fn path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        let remaining = self.distance(from, to)?;
        let mut path = Vec::with_capacity(remaining as usize + 1);
        path.push(from);
        let mut current = from;
        while current != to {
            current = self.next_hop(current, to)?;
            path.push(current);
        }
        Some(path)
    }

    fn next_hop(&self, from: Position, to: Position) -> Option<Position> {
        let target = self.index_of(to)?;
        let here = self.raw_distance(self.index_of(from)?, target)?;
        if here == 0 {
            return None;
        }
        from.neighbors().into_iter().find(|neighbor| {
            self.index_of(*neighbor)
                .and_then(|idx| self.raw_distance(idx, target))
                .is_some_and(|d| d + 1 == here)
        })
    }

    fn branch_cells(&self) -> &[Position] {
        &self.branch_cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(text: &str) -> GridNavigator {
        let (level, _) = Level::parse(text).unwrap();
        GridNavigator::new(&level)
    }

    const WALLED: &str = "#colors\nblue: 0\n#initial\n+++++++\n+0  + +\n+ + + +\n+   + +\n+++++++\n#goal\n+++++++\n+   + +\n+ + + +\n+   + +\n+++++++\n#end\n";

    #[test]
    fn test_distance_goes_around_walls() {
        let nav = navigator(WALLED);
        assert_eq!(nav.distance(Position::new(1, 1), Position::new(1, 1)), Some(0));
        assert_eq!(nav.distance(Position::new(1, 1), Position::new(1, 3)), Some(2));
        assert_eq!(nav.distance(Position::new(1, 1), Position::new(3, 3)), Some(4));
    }

    #[test]
    fn test_unreachable_and_walls() {
        let nav = navigator(WALLED);
        // column 5 is sealed off by the wall at column 4
        assert_eq!(nav.distance(Position::new(1, 1), Position::new(2, 5)), None);
        assert_eq!(nav.path(Position::new(1, 1), Position::new(2, 5)), None);
        assert_eq!(nav.distance(Position::new(0, 0), Position::new(1, 1)), None);
    }

    #[test]
    fn test_path_is_contiguous_and_shortest() {
        let nav = navigator(WALLED);
        let from = Position::new(1, 1);
        let to = Position::new(3, 3);
        let path = nav.path(from, to).unwrap();
        assert_eq!(path.first(), Some(&from));
        assert_eq!(path.last(), Some(&to));
        assert_eq!(path.len() as u32, nav.distance(from, to).unwrap() + 1);
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
        assert_eq!(nav.next_hop(to, to), None);
    }

    #[test]
    fn test_branch_cells() {
        let text = "#colors\nblue: 0\n#initial\n+++++\n+0  +\n++ ++\n+++++\n#goal\n+++++\n+   +\n++ ++\n+++++\n#end\n";
        let nav = navigator(text);
        assert_eq!(nav.branch_cells(), &[Position::new(1, 2)]);
    }
}
