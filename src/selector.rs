// Top-level move choice
//
// Scores each of the four moves from the head (infeasible ones get the
// immediate-death value without searching) and picks the best. Scores are
// published as each direction finishes so a caller running against a deadline
// can still read whatever is ready.

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::estimator::Estimator;
use crate::feasibility::Feasibility;
use crate::snapshot::BoardSnapshot;
use crate::types::{Coord, Direction};

/// One score per direction; `None` until that direction has been evaluated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionScores {
    pub down: Option<i64>,
    pub up: Option<i64>,
    pub left: Option<i64>,
    pub right: Option<i64>,
}

impl DirectionScores {
    /// Builds from values in canonical order (down, up, left, right)
    pub fn from_values(values: [Option<i64>; 4]) -> Self {
        let [down, up, left, right] = values;
        DirectionScores {
            down,
            up,
            left,
            right,
        }
    }

    pub fn get(&self, dir: Direction) -> Option<i64> {
        match dir {
            Direction::Down => self.down,
            Direction::Up => self.up,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, dir: Direction, score: i64) {
        match dir {
            Direction::Down => self.down = Some(score),
            Direction::Up => self.up = Some(score),
            Direction::Left => self.left = Some(score),
            Direction::Right => self.right = Some(score),
        }
    }

    pub fn is_complete(&self) -> bool {
        Direction::all().iter().all(|d| self.get(*d).is_some())
    }

    /// Highest ready score; ties go to the earliest direction in canonical order
    pub fn best(&self) -> Option<Direction> {
        self.best_where(|_| true)
    }

    /// Like `best`, considering only directions accepted by `filter`
    pub fn best_where<F: Fn(Direction) -> bool>(&self, filter: F) -> Option<Direction> {
        let mut best: Option<(Direction, i64)> = None;
        for dir in Direction::all() {
            if !filter(dir) {
                continue;
            }
            if let Some(score) = self.get(dir) {
                match best {
                    Some((_, top)) if score <= top => {}
                    _ => best = Some((dir, score)),
                }
            }
        }
        best.map(|(dir, _)| dir)
    }
}

impl fmt::Display for DirectionScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dir) in Direction::all().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.get(*dir) {
                Some(score) => write!(f, "{}: {}", dir, score)?,
                None => write!(f, "{}: -", dir)?,
            }
        }
        Ok(())
    }
}

/// Collects direction scores from concurrently running evaluations
#[derive(Debug, Default)]
pub struct ScoreBoard {
    scores: Mutex<DirectionScores>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        ScoreBoard::default()
    }

    pub fn publish(&self, dir: Direction, score: i64) {
        self.scores.lock().set(dir, score);
    }

    /// Copy of whatever has been published so far
    pub fn scores(&self) -> DirectionScores {
        self.scores.lock().clone()
    }
}

/// Outcome of one turn's search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub direction: Direction,
    pub scores: DirectionScores,
}

/// Scores all four moves from `head`, publishing each into `sink` as it completes
pub fn evaluate_directions(
    snapshot: &BoardSnapshot,
    head: Coord,
    estimator: &Estimator<'_>,
    sink: &ScoreBoard,
) {
    let feasible = Feasibility::from_cell(head, &snapshot.occupancy);

    let evaluate = |dir: &Direction| {
        let score = if feasible.allows(*dir) {
            estimator.estimate(
                snapshot.occupancy.clone(),
                snapshot.food.clone(),
                dir.apply(&head),
                0,
            )
        } else {
            estimator.immediate_death_value()
        };
        // A branch cut short by the deadline is missing terms; leave it unscored
        if !estimator.aborted() {
            sink.publish(*dir, score);
        }
    };

    let directions = Direction::all();
    if estimator.fans_out(0) {
        directions[..].par_iter().for_each(evaluate);
    } else {
        directions.iter().for_each(evaluate);
    }
}

/// Picks a move. Always returns a direction.
///
/// With all four scores in, this is simply the best one. With a partial set
/// (the search ran out of time), an open move that has been scored beats one
/// that has not, and any open move beats a known-fatal one.
pub fn select(scores: &DirectionScores, feasible: Feasibility) -> Direction {
    if scores.is_complete() {
        return scores.best().unwrap_or(Direction::Down);
    }

    scores
        .best_where(|dir| feasible.allows(dir))
        .or_else(|| feasible.first_open())
        .or_else(|| scores.best())
        .unwrap_or(Direction::Down)
}

/// Runs the full search from `head` and chooses a direction
pub fn decide(snapshot: &BoardSnapshot, head: Coord, estimator: &Estimator<'_>) -> Decision {
    let sink = ScoreBoard::new();
    evaluate_directions(snapshot, head, estimator, &sink);
    let scores = sink.scores();
    let direction = select(&scores, Feasibility::from_cell(head, &snapshot.occupancy));
    Decision { direction, scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::estimator::AgentView;
    use crate::types::{Battlesnake, Board};
    use std::sync::atomic::AtomicBool;

    /// 5x5 board, our snake hugging the left wall with its head at (0,2):
    /// down and right are open, up is our neck, left is off the board
    fn wall_hugger() -> (Board, Battlesnake) {
        let you = Battlesnake {
            id: "me".to_string(),
            name: "me".to_string(),
            health: 100,
            body: vec![Coord::new(0, 2), Coord::new(0, 1), Coord::new(0, 0)],
            shout: None,
        };
        let board = Board {
            width: 5,
            height: 5,
            food: vec![],
            snakes: vec![you.clone()],
            hazards: vec![],
        };
        (board, you)
    }

    #[test]
    fn test_best_picks_strict_max() {
        let scores = DirectionScores::from_values([Some(1), Some(5), Some(3), Some(-2)]);
        assert_eq!(scores.best(), Some(Direction::Up));
    }

    #[test]
    fn test_best_first_seen_wins_ties() {
        let scores = DirectionScores::from_values([Some(1), Some(4), Some(4), Some(4)]);
        assert_eq!(scores.best(), Some(Direction::Up));

        let all_dead = DirectionScores::from_values([Some(-9); 4]);
        assert_eq!(all_dead.best(), Some(Direction::Down));
    }

    #[test]
    fn test_best_skips_missing() {
        let scores = DirectionScores::from_values([None, None, Some(-100), Some(-50)]);
        assert_eq!(scores.best(), Some(Direction::Right));
        assert!(!scores.is_complete());
        assert_eq!(DirectionScores::default().best(), None);
    }

    #[test]
    fn test_display_lists_all_directions() {
        let scores = DirectionScores::from_values([Some(10), None, Some(-3), Some(0)]);
        assert_eq!(scores.to_string(), "down: 10, up: -, left: -3, right: 0");
    }

    #[test]
    fn test_select_falls_back_to_open_move_then_down() {
        let open_left = Feasibility {
            left: true,
            ..Feasibility::default()
        };
        assert_eq!(select(&DirectionScores::default(), open_left), Direction::Left);
        assert_eq!(
            select(&DirectionScores::default(), Feasibility::default()),
            Direction::Down
        );
    }

    #[test]
    fn test_select_complete_scores_ignores_feasibility() {
        let scores = DirectionScores::from_values([Some(-10), Some(-3), Some(-7), Some(-3)]);
        assert_eq!(select(&scores, Feasibility::default()), Direction::Up);
    }

    #[test]
    fn test_select_partial_prefers_open_moves() {
        let open_right = Feasibility {
            right: true,
            left: true,
            ..Feasibility::default()
        };

        // Only the blocked moves have reported
        let dead_only = DirectionScores::from_values([Some(-100_000), Some(-100_000), None, None]);
        assert_eq!(select(&dead_only, open_right), Direction::Left);

        // One open move has reported
        let one_ready = DirectionScores::from_values([Some(-100_000), None, None, Some(-4_000)]);
        assert_eq!(select(&one_ready, open_right), Direction::Right);

        // Nothing open: least bad of what reported
        let boxed = DirectionScores::from_values([Some(-100_000), Some(-90_000), None, None]);
        assert_eq!(select(&boxed, Feasibility::default()), Direction::Up);
    }

    #[test]
    fn test_score_board_collects_publications() {
        let board = ScoreBoard::new();
        board.publish(Direction::Left, 12);
        board.publish(Direction::Down, -3);
        let scores = board.scores();
        assert_eq!(scores.get(Direction::Left), Some(12));
        assert_eq!(scores.get(Direction::Down), Some(-3));
        assert_eq!(scores.get(Direction::Up), None);
    }

    #[test]
    fn test_scores_serialize_by_direction_name() {
        let scores = DirectionScores::from_values([Some(1), None, Some(3), Some(4)]);
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["down"], 1);
        assert!(json["up"].is_null());
        assert_eq!(json["right"], 4);
    }

    #[test]
    fn test_stopped_search_leaves_open_moves_unscored() {
        let config = Config::default_hardcoded();
        let (board, you) = wall_hugger();
        let head = Coord::new(0, 2);
        let snapshot = BoardSnapshot::build(&board, head);
        let stop = AtomicBool::new(true);
        let estimator = Estimator::new(&board, AgentView::of(&you), &config).with_abort(&stop);

        let sink = ScoreBoard::new();
        evaluate_directions(&snapshot, head, &estimator, &sink);
        let scores = sink.scores();

        assert_eq!(scores.down, None);
        assert_eq!(scores.right, None);
        assert_eq!(scores.up, Some(config.scores.immediate_death_value));
        assert_eq!(scores.left, Some(config.scores.immediate_death_value));
        assert!(!scores.is_complete());
    }

    #[test]
    fn test_deadline_decides_from_finished_moves_only() {
        let config = Config::default_hardcoded();
        let (board, you) = wall_hugger();
        let head = Coord::new(0, 2);
        let snapshot = BoardSnapshot::build(&board, head);
        let feasible = Feasibility::from_cell(head, &snapshot.occupancy);

        let full = decide(&snapshot, head, &Estimator::new(&board, AgentView::of(&you), &config));
        assert!(full.scores.is_complete());
        assert_eq!(full.direction, Direction::Down);
        let right = full.scores.right.unwrap();
        assert!(right < 0);

        // Right finished before the deadline; down was still running when it hit
        let stop = AtomicBool::new(true);
        let stopped = Estimator::new(&board, AgentView::of(&you), &config).with_abort(&stop);
        let sink = ScoreBoard::new();
        sink.publish(Direction::Right, right);
        evaluate_directions(&snapshot, head, &stopped, &sink);
        let partial = sink.scores();

        assert_eq!(partial.down, None);
        assert_eq!(partial.right, Some(right));
        assert_eq!(select(&partial, feasible), Direction::Right);

        // Nothing open finished: first open move in canonical order
        let sink = ScoreBoard::new();
        evaluate_directions(&snapshot, head, &stopped, &sink);
        assert_eq!(select(&sink.scores(), feasible), Direction::Down);
    }
}
