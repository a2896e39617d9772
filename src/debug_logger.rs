// Debug logging module for asynchronous decision logging
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each decision is written as one line of a
// JSONL file, with enough state to re-run it later (see `replay`).

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::selector::DirectionScores;
use crate::types::{Battlesnake, Board, Coord, Direction};

/// One logged decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub game_id: String,
    pub turn: i32,
    /// Head the engine searched from, which may differ from `you.body[0]`
    pub tracked_head: Coord,
    pub chosen_move: Direction,
    pub scores: DirectionScores,
    pub board: Board,
    pub you: Battlesnake,
    pub timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a decision asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_move(&self, entry: DecisionLogEntry) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Internal async function that performs the actual file write
    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: DecisionLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }

    /// Writes an entry and waits for it to land on disk
    pub async fn log_move_now(&self, entry: DecisionLogEntry) {
        if self.enabled {
            Self::write_entry(self.file.clone(), entry).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(turn: i32) -> DecisionLogEntry {
        let you = Battlesnake {
            id: "me".to_string(),
            name: "me".to_string(),
            health: 90,
            body: vec![Coord::new(1, 1), Coord::new(1, 2)],
            shout: None,
        };
        DecisionLogEntry {
            game_id: "g".to_string(),
            turn,
            tracked_head: Coord::new(1, 1),
            chosen_move: Direction::Left,
            scores: DirectionScores::from_values([Some(-5), Some(3), Some(7), None]),
            board: Board {
                width: 3,
                height: 3,
                food: vec![],
                snakes: vec![you.clone()],
                hazards: vec![],
            },
            you,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_logger_is_noop() {
        let logger = DebugLogger::new(false, "unused.jsonl").await;
        assert!(!logger.is_enabled());
        logger.log_move(entry(0));
    }

    #[tokio::test]
    async fn test_entries_are_written_as_json_lines() {
        let path = std::env::temp_dir().join(format!("lookahead_debug_{}.jsonl", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());
        logger.log_move_now(entry(3)).await;
        logger.log_move_now(entry(4)).await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: DecisionLogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.turn, 4);
        assert_eq!(parsed.chosen_move, Direction::Left);
        assert_eq!(parsed.scores.left, Some(7));
        assert!(lines[0].contains("\"chosen_move\":\"left\""));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
