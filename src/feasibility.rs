// Which of the four moves from a cell land on an in-bounds, empty cell

use crate::snapshot::OccupancyGrid;
use crate::types::{Coord, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feasibility {
    pub down: bool,
    pub up: bool,
    pub left: bool,
    pub right: bool,
}

impl Feasibility {
    /// Checks all four neighbours of `cell`. Any occupant, ours or not, blocks.
    pub fn from_cell(cell: Coord, occupancy: &OccupancyGrid) -> Self {
        let open = |dir: Direction| matches!(occupancy.get(dir.apply(&cell)), Some(None));
        Feasibility {
            down: open(Direction::Down),
            up: open(Direction::Up),
            left: open(Direction::Left),
            right: open(Direction::Right),
        }
    }

    pub fn allows(&self, dir: Direction) -> bool {
        match dir {
            Direction::Down => self.down,
            Direction::Up => self.up,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// First open direction in canonical order
    pub fn first_open(&self) -> Option<Direction> {
        Direction::all().iter().copied().find(|d| self.allows(*d))
    }
}
