// Dense per-turn board lookups
//
// A snapshot turns the API's list-of-bodies view into two grids the search can
// index in O(1): who occupies each cell, and whether it holds food. Grids are
// column-shared copy-on-write, so a branch that clones a grid and edits one
// cell only duplicates the column it touched.

use log::warn;
use std::fmt::Write;
use std::sync::Arc;

use crate::types::{Board, Coord};

/// What is sitting on an occupied cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    /// A body segment of `board.snakes[index]`
    Snake(usize),
    /// A cell the controlled snake has already moved through in a hypothetical line
    Path,
}

/// Fixed-size 2D grid indexed by `Coord`, cheap to clone
#[derive(Debug, Clone)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    columns: Vec<Arc<Vec<T>>>,
}

impl<T: Copy> Grid<T> {
    /// Creates a `width` x `height` grid with every cell set to `fill`
    pub fn new(width: i32, height: i32, fill: T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let column = Arc::new(vec![fill; height as usize]);
        Grid {
            width,
            height,
            columns: vec![column; width as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// True when `coord` lies on the grid
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    /// Value at `coord`, or `None` when out of bounds
    pub fn get(&self, coord: Coord) -> Option<T> {
        if !self.contains(coord) {
            return None;
        }
        Some(self.columns[coord.x as usize][coord.y as usize])
    }

    /// Writes `value` at `coord`. Returns false (and writes nothing) when out of bounds.
    pub fn set(&mut self, coord: Coord, value: T) -> bool {
        if !self.contains(coord) {
            return false;
        }
        Arc::make_mut(&mut self.columns[coord.x as usize])[coord.y as usize] = value;
        true
    }
}

/// Cell -> occupant, `None` when empty
pub type OccupancyGrid = Grid<Option<Occupant>>;

/// Cell -> food present
pub type FoodGrid = Grid<bool>;

/// A head segment the builder kept out of the occupancy grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadMark {
    pub snake: usize,
    pub coord: Coord,
}

/// Everything the search needs to know about the board at the start of a turn
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub width: i32,
    pub height: i32,
    pub occupancy: OccupancyGrid,
    pub food: FoodGrid,
    pub heads: Vec<HeadMark>,
}

impl BoardSnapshot {
    /// Builds the occupancy and food grids for one turn
    ///
    /// A head segment is set aside in `heads` only when it shares neither a
    /// column nor a row with `tracked_head`; every other segment, heads
    /// included, is a solid obstacle in `occupancy`.
    pub fn build(board: &Board, tracked_head: Coord) -> Self {
        let mut occupancy: OccupancyGrid = Grid::new(board.width, board.height, None);
        let mut food: FoodGrid = Grid::new(board.width, board.height, false);
        let mut heads = Vec::new();

        for (index, snake) in board.snakes.iter().enumerate() {
            for (segment, coord) in snake.body.iter().enumerate() {
                if segment == 0 && coord.x != tracked_head.x && coord.y != tracked_head.y {
                    heads.push(HeadMark {
                        snake: index,
                        coord: *coord,
                    });
                } else if !occupancy.set(*coord, Some(Occupant::Snake(index))) {
                    warn!(
                        "Snake {} segment {} at {} is off the {}x{} board",
                        snake.id, segment, coord, board.width, board.height
                    );
                }
            }
        }

        for coord in &board.food {
            if !food.set(*coord, true) {
                warn!("Food at {} is off the {}x{} board", coord, board.width, board.height);
            }
        }

        BoardSnapshot {
            width: occupancy.width(),
            height: occupancy.height(),
            occupancy,
            food,
            heads,
        }
    }

    /// ASCII picture of the snapshot, one line per row.
    /// `S` occupied, `F` food, `H` set-aside head.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let coord = Coord::new(x, y);
                out.push('|');
                if self.occupancy.get(coord).flatten().is_some() {
                    out.push('S');
                }
                if self.food.get(coord).unwrap_or(false) {
                    out.push('F');
                }
                if self.heads.iter().any(|h| h.coord == coord) {
                    out.push('H');
                }
            }
            let _ = writeln!(out, "|");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Battlesnake;

    fn snake(id: &str, body: &[(i32, i32)]) -> Battlesnake {
        Battlesnake {
            id: id.to_string(),
            name: id.to_string(),
            health: 100,
            body: body.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
            shout: None,
        }
    }

    fn board(width: i32, height: i32, snakes: Vec<Battlesnake>, food: &[(i32, i32)]) -> Board {
        Board {
            width,
            height,
            food: food.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
            snakes,
            hazards: vec![],
        }
    }

    #[test]
    fn test_grid_dimensions_match_board() {
        let snapshot = BoardSnapshot::build(&board(7, 4, vec![], &[]), Coord::new(0, 0));
        assert_eq!(snapshot.occupancy.width(), 7);
        assert_eq!(snapshot.occupancy.height(), 4);
        assert_eq!(snapshot.food.width(), 7);
        assert_eq!(snapshot.food.height(), 4);
    }

    #[test]
    fn test_grid_clone_does_not_see_later_writes() {
        let mut original: FoodGrid = Grid::new(3, 3, false);
        let copy = original.clone();
        original.set(Coord::new(1, 1), true);

        assert_eq!(original.get(Coord::new(1, 1)), Some(true));
        assert_eq!(copy.get(Coord::new(1, 1)), Some(false));
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut grid: FoodGrid = Grid::new(2, 2, false);
        assert_eq!(grid.get(Coord::new(-1, 0)), None);
        assert_eq!(grid.get(Coord::new(0, 2)), None);
        assert!(!grid.set(Coord::new(2, 0), true));
    }

    #[test]
    fn test_own_body_is_occupied() {
        let me = snake("me", &[(2, 2), (2, 1), (2, 0)]);
        let snapshot = BoardSnapshot::build(&board(5, 5, vec![me], &[]), Coord::new(2, 2));

        for y in 0..3 {
            assert_eq!(
                snapshot.occupancy.get(Coord::new(2, y)),
                Some(Some(Occupant::Snake(0)))
            );
        }
        assert!(snapshot.heads.is_empty());
    }

    #[test]
    fn test_head_sharing_an_axis_with_tracked_head_is_an_obstacle() {
        let me = snake("me", &[(0, 0), (0, 1)]);
        let them = snake("them", &[(3, 0), (4, 0)]);
        let snapshot = BoardSnapshot::build(&board(5, 5, vec![me, them], &[]), Coord::new(0, 0));

        assert_eq!(
            snapshot.occupancy.get(Coord::new(3, 0)),
            Some(Some(Occupant::Snake(1)))
        );
        assert!(snapshot.heads.is_empty());
    }

    #[test]
    fn test_head_off_both_axes_is_set_aside() {
        let me = snake("me", &[(0, 0), (0, 1)]);
        let them = snake("them", &[(3, 3), (3, 4)]);
        let snapshot = BoardSnapshot::build(&board(5, 5, vec![me, them], &[]), Coord::new(0, 0));

        assert_eq!(snapshot.occupancy.get(Coord::new(3, 3)), Some(None));
        assert_eq!(
            snapshot.occupancy.get(Coord::new(3, 4)),
            Some(Some(Occupant::Snake(1)))
        );
        assert_eq!(
            snapshot.heads,
            vec![HeadMark {
                snake: 1,
                coord: Coord::new(3, 3)
            }]
        );
    }

    #[test]
    fn test_food_and_body_can_share_a_cell() {
        let me = snake("me", &[(1, 1), (1, 2)]);
        let snapshot =
            BoardSnapshot::build(&board(3, 3, vec![me], &[(1, 2), (0, 0)]), Coord::new(1, 1));

        assert_eq!(snapshot.food.get(Coord::new(1, 2)), Some(true));
        assert_eq!(snapshot.food.get(Coord::new(0, 0)), Some(true));
        assert!(snapshot.occupancy.get(Coord::new(1, 2)).flatten().is_some());
    }

    #[test]
    fn test_off_board_entries_are_ignored() {
        let me = snake("me", &[(0, 0), (-1, 0)]);
        let snapshot = BoardSnapshot::build(&board(2, 2, vec![me], &[(5, 5)]), Coord::new(0, 0));
        assert_eq!(snapshot.occupancy.get(Coord::new(1, 0)), Some(None));
        assert_eq!(snapshot.food.get(Coord::new(1, 1)), Some(false));
    }

    #[test]
    fn test_render() {
        let me = snake("me", &[(0, 0), (0, 1)]);
        let them = snake("them", &[(1, 1)]);
        let snapshot =
            BoardSnapshot::build(&board(2, 2, vec![me, them], &[(1, 0)]), Coord::new(0, 0));
        assert_eq!(snapshot.render(), "|S|F|\n|S|H|\n");
    }
}
