// Per-game state that outlives a single request
//
// The engine advances its idea of where our head is eagerly, at the end of
// each decision, instead of trusting the head reported in the next request.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::selector::DirectionScores;
use crate::types::Coord;

/// What we remember about one game
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub head: Coord,
    pub last_scores: Option<DirectionScores>,
}

/// Game ID -> session state, shared across requests
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        SessionTracker::default()
    }

    /// Returns the tracked head for `game_id`, creating the entry from `fallback_head` if absent
    pub fn get_or_init(&self, game_id: &str, fallback_head: Coord) -> Coord {
        self.sessions
            .lock()
            .entry(game_id.to_string())
            .or_insert(SessionState {
                head: fallback_head,
                last_scores: None,
            })
            .head
    }

    /// Overwrites the tracked head
    pub fn set(&self, game_id: &str, head: Coord) {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(game_id) {
            Some(state) => state.head = head,
            None => {
                sessions.insert(
                    game_id.to_string(),
                    SessionState {
                        head,
                        last_scores: None,
                    },
                );
            }
        }
    }

    /// Tracked head without creating an entry
    pub fn head(&self, game_id: &str) -> Option<Coord> {
        self.sessions.lock().get(game_id).map(|s| s.head)
    }

    /// Remembers the most recent four-way score set for diagnostics
    pub fn record_scores(&self, game_id: &str, scores: DirectionScores) {
        if let Some(state) = self.sessions.lock().get_mut(game_id) {
            state.last_scores = Some(scores);
        }
    }

    pub fn last_scores(&self, game_id: &str) -> Option<DirectionScores> {
        self.sessions
            .lock()
            .get(game_id)
            .and_then(|s| s.last_scores.clone())
    }

    /// Removes and returns the session's state
    pub fn end_session(&self, game_id: &str) -> Option<SessionState> {
        self.sessions.lock().remove(game_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_init_uses_fallback_once() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.get_or_init("g", Coord::new(1, 1)), Coord::new(1, 1));
        assert_eq!(tracker.get_or_init("g", Coord::new(4, 4)), Coord::new(1, 1));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let tracker = SessionTracker::new();
        tracker.get_or_init("g", Coord::new(1, 1));
        tracker.set("g", Coord::new(1, 2));
        assert_eq!(tracker.head("g"), Some(Coord::new(1, 2)));
        assert_eq!(tracker.get_or_init("g", Coord::new(0, 0)), Coord::new(1, 2));
    }

    #[test]
    fn test_sessions_are_independent() {
        let tracker = SessionTracker::new();
        tracker.get_or_init("a", Coord::new(0, 0));
        tracker.get_or_init("b", Coord::new(5, 5));
        tracker.set("a", Coord::new(0, 1));
        assert_eq!(tracker.head("b"), Some(Coord::new(5, 5)));
    }

    #[test]
    fn test_scores_are_kept_until_session_end() {
        let tracker = SessionTracker::new();
        tracker.get_or_init("g", Coord::new(0, 0));
        let scores = DirectionScores::from_values([Some(1), Some(2), None, Some(-4)]);
        tracker.record_scores("g", scores.clone());

        assert_eq!(tracker.last_scores("g"), Some(scores.clone()));

        let ended = tracker.end_session("g").unwrap();
        assert_eq!(ended.last_scores, Some(scores));
        assert!(tracker.is_empty());
        assert_eq!(tracker.last_scores("g"), None);
    }

    #[test]
    fn test_record_scores_ignores_unknown_session() {
        let tracker = SessionTracker::new();
        tracker.record_scores("nope", DirectionScores::default());
        assert!(tracker.is_empty());
    }
}
