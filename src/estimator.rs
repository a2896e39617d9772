// Recursive lookahead scoring of a single candidate cell
//
// A cell's score is its own heuristic terms plus the sum of the scores of
// every move out of it, recursively, down to `max_depth`. Each branch owns its
// grids; the column-shared `Grid` keeps those copies cheap.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{Config, ScoresConfig};
use crate::feasibility::Feasibility;
use crate::snapshot::{FoodGrid, OccupancyGrid, Occupant};
use crate::types::{Battlesnake, Board, Coord, Direction};

/// Weight of a cell's own terms at `depth`
///
/// Integer division makes this a step: 1 for every depth below `max_depth`,
/// 0 at `max_depth`.
pub fn relevance_factor(depth: u8, max_depth: u8) -> i64 {
    1 - depth.checked_div(max_depth).map_or(1, i64::from)
}

/// Score credited to a move that cannot be made, as if the snake died at
/// `next_depth` and every level after it
pub fn failure_value(next_depth: u8, max_depth: u8, death_value: i64) -> i64 {
    (next_depth..max_depth)
        .map(|depth| death_value * relevance_factor(depth, max_depth))
        .sum()
}

/// The controlled snake as it is at the start of the turn. The search never
/// moves it; only the tail is treated specially.
#[derive(Debug, Clone, Copy)]
pub struct AgentView<'a> {
    pub health: i32,
    pub body: &'a [Coord],
}

impl<'a> AgentView<'a> {
    pub fn of(snake: &'a Battlesnake) -> Self {
        AgentView {
            health: snake.health,
            body: &snake.body,
        }
    }

    pub fn length(&self) -> usize {
        self.body.len()
    }

    pub fn tail(&self) -> Option<Coord> {
        self.body.last().copied()
    }
}

pub struct Estimator<'a> {
    snakes: &'a [Battlesnake],
    you: AgentView<'a>,
    scores: &'a ScoresConfig,
    max_depth: u8,
    parallel_depth_cutoff: u8,
    abort: Option<&'a AtomicBool>,
}

impl<'a> Estimator<'a> {
    pub fn new(board: &'a Board, you: AgentView<'a>, config: &'a Config) -> Self {
        Estimator {
            snakes: &board.snakes,
            you,
            scores: &config.scores,
            max_depth: config.search.max_depth,
            parallel_depth_cutoff: config.search.parallel_depth_cutoff,
            abort: None,
        }
    }

    /// Stops recursing (every pending branch scores 0) once `flag` is set
    pub fn with_abort(mut self, flag: &'a AtomicBool) -> Self {
        self.abort = Some(flag);
        self
    }

    /// Score of a first move that cannot be made at all
    pub fn immediate_death_value(&self) -> i64 {
        self.scores.immediate_death_value
    }

    /// Whether the moves out of a level-`depth` cell run on the thread pool
    pub fn fans_out(&self, depth: u8) -> bool {
        depth < self.parallel_depth_cutoff
    }

    /// Set once the search has been told to stop; any score computed since is incomplete
    pub fn aborted(&self) -> bool {
        self.abort.map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Full score of moving onto `cell` at `depth`: its own terms plus every continuation
    pub fn estimate(&self, occupancy: OccupancyGrid, food: FoodGrid, cell: Coord, depth: u8) -> i64 {
        if self.aborted() {
            return 0;
        }

        let mut value = self.cell_terms(&occupancy, &food, cell, depth);
        if depth < self.max_depth {
            value += self.continuation(occupancy, food, cell, depth);
        }
        value
    }

    /// Base, food, collision and wall terms at `cell`, scaled by the relevance factor
    pub fn cell_terms(&self, occupancy: &OccupancyGrid, food: &FoodGrid, cell: Coord, depth: u8) -> i64 {
        let scores = self.scores;
        let relevance = relevance_factor(depth, self.max_depth);

        let mut value = scores.base_value * relevance;

        if food.get(cell).unwrap_or(false) {
            // Larger bonus above the threshold, smaller one at or below it
            if self.you.health > scores.health_threshold {
                value += scores.food_value * relevance;
            } else {
                value += scores.low_food_value * relevance;
            }
        }

        if let Some(Some(occupant)) = occupancy.get(cell) {
            value += self.collision_term(occupant, cell, depth, relevance);
        }

        if cell.x == 0 || cell.x == occupancy.width() - 1 {
            value += scores.next_to_wall_value * relevance;
        }
        if cell.y == 0 || cell.y == occupancy.height() - 1 {
            value += scores.next_to_wall_value * relevance;
        }

        value
    }

    fn collision_term(&self, occupant: Occupant, cell: Coord, depth: u8, relevance: i64) -> i64 {
        let scores = self.scores;
        let other = match occupant {
            Occupant::Snake(index) => self.snakes.get(index),
            Occupant::Path => None,
        };

        match other {
            Some(other) if self.you.length() > other.length() => {
                if other.head() == Some(cell) {
                    // Their head will have moved by the time we get deeper
                    if depth == 0 {
                        scores.kill_value * relevance
                    } else {
                        0
                    }
                } else {
                    scores.death_value * relevance
                }
            }
            _ if depth == 0 => scores.immediate_death_value,
            _ => scores.death_value * relevance,
        }
    }

    fn continuation(&self, mut occupancy: OccupancyGrid, food: FoodGrid, cell: Coord, depth: u8) -> i64 {
        let feasible = Feasibility::from_cell(cell, &occupancy);

        // Without food the tail moves up, freeing its cell for the next level
        if !food.get(cell).unwrap_or(false) {
            if let Some(tail) = self.you.tail() {
                occupancy.set(tail, None);
            }
        }

        let next_depth = depth + 1;
        let fail = failure_value(next_depth, self.max_depth, self.scores.death_value);

        let branch = |dir: &Direction| -> i64 {
            if !feasible.allows(*dir) {
                return fail;
            }
            let mut child = occupancy.clone();
            child.set(cell, Some(Occupant::Path));
            self.estimate(child, food.clone(), dir.apply(&cell), next_depth)
        };

        let directions = Direction::all();
        if self.fans_out(depth) {
            directions[..].par_iter().map(branch).sum()
        } else {
            directions.iter().map(branch).sum()
        }
    }
}
