use std::fmt;

/// Grid coordinate. Rows grow downwards, columns grow to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn distance(&self, other: &Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    pub fn neighbors(&self) -> [Position; 4] {
        [
            self.step(Direction::North),
            self.step(Direction::South),
            self.step(Direction::West),
            self.step(Direction::East),
        ]
    }

    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.distance(other) == 1
    }

    pub fn step(&self, dir: Direction) -> Position {
        let (dr, dc) = dir.delta();
        Position::new(self.row + dr, self.col + dc)
    }

    pub fn step_back(&self, dir: Direction) -> Position {
        self.step(dir.opposite())
    }

    /// Direction of a single cardinal step from `self` to `to`.
    pub fn direction_to(&self, to: &Position) -> Option<Direction> {
        Direction::from_delta(to.row - self.row, to.col - self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    pub fn from_delta(row: i32, col: i32) -> Option<Direction> {
        match (row, col) {
            (-1, 0) => Some(Direction::North),
            (1, 0) => Some(Direction::South),
            (0, 1) => Some(Direction::East),
            (0, -1) => Some(Direction::West),
            _ => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Blue,
    Red,
    Cyan,
    Purple,
    Green,
    Orange,
    Pink,
    Grey,
    Lightblue,
    Brown,
}

impl Color {
    pub fn from_name(name: &str) -> Option<Color> {
        match name.trim().to_ascii_lowercase().as_str() {
            "blue" => Some(Color::Blue),
            "red" => Some(Color::Red),
            "cyan" => Some(Color::Cyan),
            "purple" => Some(Color::Purple),
            "green" => Some(Color::Green),
            "orange" => Some(Color::Orange),
            "pink" => Some(Color::Pink),
            "grey" => Some(Color::Grey),
            "lightblue" => Some(Color::Lightblue),
            "brown" => Some(Color::Brown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_round_trips_through_delta() {
        for dir in Direction::ALL {
            let (dr, dc) = dir.delta();
            assert_eq!(Direction::from_delta(dr, dc), Some(dir));
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Direction::from_delta(1, 1), None);
    }

    #[test]
    fn test_position_direction_to() {
        let a = Position::new(2, 2);
        assert_eq!(a.direction_to(&Position::new(1, 2)), Some(Direction::North));
        assert_eq!(a.direction_to(&Position::new(2, 3)), Some(Direction::East));
        assert_eq!(a.direction_to(&Position::new(4, 2)), None);
        assert_eq!(a.step_back(Direction::East), Position::new(2, 1));
    }

    #[test]
    fn test_color_from_name_is_case_insensitive() {
        assert_eq!(Color::from_name("Blue"), Some(Color::Blue));
        assert_eq!(Color::from_name(" lightblue "), Some(Color::Lightblue));
        assert_eq!(Color::from_name("magenta"), None);
    }
}
