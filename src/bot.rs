// Welcome to
// __________         __    __  .__                               __
// \______   \_____ _/  |__/  |_|  |   ____   ______ ____ _____  |  | __ ____
//  |    |  _/\__  \\   __\   __\  | _/ __ \ /  ___//    \\__  \ |  |/ // __ \
//  |    |   \ / __ \|  |  |  | |  |_\  ___/ \___ \|   |  \/ __ \|    <\  ___/
//  |________/(______/__|  |__| |____/\_____>______>___|__(______/__|__\\_____>
//
// The Bot ties the lookahead engine to the API lifecycle: it owns the
// configuration, the per-game session state, the search thread pool and the
// optional debug log.

use log::{debug, error, info, warn};
use rayon::ThreadPool;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::{DebugLogger, DecisionLogEntry};
use crate::estimator::{AgentView, Estimator};
use crate::feasibility::Feasibility;
use crate::selector::{self, Decision, DirectionScores, ScoreBoard};
use crate::session::SessionTracker;
use crate::snapshot::BoardSnapshot;
use crate::types::{Battlesnake, Board, Coord, Game};

/// Everything one background search needs, owned so it can cross into a blocking task
struct SearchJob {
    config: Config,
    board: Board,
    you: Battlesnake,
    snapshot: Arc<BoardSnapshot>,
    head: Coord,
    sink: Arc<ScoreBoard>,
    abort: Arc<AtomicBool>,
}

impl SearchJob {
    fn run(&self, pool: Option<&ThreadPool>) {
        let estimator =
            Estimator::new(&self.board, AgentView::of(&self.you), &self.config).with_abort(&self.abort);
        let evaluate =
            || selector::evaluate_directions(&self.snapshot, self.head, &estimator, &self.sink);

        match pool {
            Some(pool) => pool.install(evaluate),
            None => evaluate(),
        }
    }
}

/// Battlesnake Bot with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Config,
    sessions: SessionTracker,
    pool: Option<Arc<ThreadPool>>,
    debug_logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        let pool = Self::build_pool(config.search.worker_threads);
        Bot {
            config,
            sessions: SessionTracker::new(),
            pool,
            debug_logger: DebugLogger::disabled(),
        }
    }

    /// Attaches a debug logger that records every `/move` decision
    pub fn with_debug_logger(mut self, debug_logger: DebugLogger) -> Self {
        self.debug_logger = debug_logger;
        self
    }

    /// Dedicated search pool, or `None` to share rayon's global pool
    fn build_pool(worker_threads: usize) -> Option<Arc<ThreadPool>> {
        if worker_threads == 0 {
            return None;
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("lookahead-{}", i))
            .build()
        {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                warn!(
                    "Could not build {}-thread search pool ({}), using the global pool",
                    worker_threads, e
                );
                None
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "lookahead-snake",
            "color": "#006400",
            "head": "default",
            "tail": "default",
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, _board: &Board, you: &Battlesnake) {
        let head = self.sessions.get_or_init(&game.id, Self::reported_head(you));
        info!("GAME START {} (head at {})", game.id, head);
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    ///
    /// Logs and returns the last score set computed for the game.
    pub fn end(&self, game: &Game, turn: &i32, _board: &Board, _you: &Battlesnake) -> Option<DirectionScores> {
        info!("GAME OVER {} at turn {}", game.id, turn);

        let last_scores = if self.config.session.evict_on_end {
            self.sessions.end_session(&game.id).and_then(|s| s.last_scores)
        } else {
            self.sessions.last_scores(&game.id)
        };

        match &last_scores {
            Some(scores) => info!("Previous estimates - {}", scores),
            None => info!("No estimates recorded for {}", game.id),
        }

        last_scores
    }

    /// Runs a complete search (no deadline) and advances the session's head
    pub fn decide(&self, game: &Game, turn: &i32, board: &Board, you: &Battlesnake) -> Decision {
        let head = self.sessions.get_or_init(&game.id, Self::reported_head(you));
        let decision = Self::search_from(&self.config, board, you, head);
        self.commit(&game.id, *turn, head, decision)
    }

    /// Computes and returns the next move within the configured time budget
    /// Corresponds to POST /move endpoint
    ///
    /// The search runs on the blocking pool while this task waits for it.
    /// If the budget runs out first, outstanding branches are told to stop and
    /// the move is chosen from whichever directions already have a score.
    ///
    /// # Returns
    /// * `Value` - JSON response containing the chosen move direction
    pub async fn get_move(&self, game: &Game, turn: &i32, board: &Board, you: &Battlesnake) -> Value {
        let start_time = Instant::now();
        let head = self.sessions.get_or_init(&game.id, Self::reported_head(you));

        let snapshot = Arc::new(BoardSnapshot::build(board, head));
        debug!("Turn {}: board\n{}", turn, snapshot.render());

        let sink = Arc::new(ScoreBoard::new());
        let abort = Arc::new(AtomicBool::new(false));
        let job = SearchJob {
            config: self.config.clone(),
            board: board.clone(),
            you: you.clone(),
            snapshot: snapshot.clone(),
            head,
            sink: sink.clone(),
            abort: abort.clone(),
        };
        let pool = self.pool.clone();
        let task = tokio::task::spawn_blocking(move || job.run(pool.as_deref()));

        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());
        match tokio::time::timeout(budget, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Turn {}: search task failed: {}", turn, e),
            Err(_) => {
                abort.store(true, Ordering::Relaxed);
                warn!(
                    "Turn {}: search exceeded {}ms, deciding from partial scores",
                    turn,
                    budget.as_millis()
                );
            }
        }

        let scores = sink.scores();
        let direction = selector::select(&scores, Feasibility::from_cell(head, &snapshot.occupancy));
        let decision = self.commit(&game.id, *turn, head, Decision { direction, scores });

        info!(
            "Turn {}: Chose {} ({}, time: {}ms)",
            turn,
            decision.direction,
            decision.scores,
            start_time.elapsed().as_millis()
        );

        self.debug_logger.log_move(DecisionLogEntry {
            game_id: game.id.clone(),
            turn: *turn,
            tracked_head: head,
            chosen_move: decision.direction,
            scores: decision.scores.clone(),
            board: board.clone(),
            you: you.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });

        json!({ "move": decision.direction.as_str() })
    }

    /// The engine itself: snapshot, score all four moves, pick one.
    /// Pure in its inputs; session state is handled by the caller.
    pub fn search_from(config: &Config, board: &Board, you: &Battlesnake, head: Coord) -> Decision {
        let snapshot = BoardSnapshot::build(board, head);
        let estimator = Estimator::new(board, AgentView::of(you), config);
        selector::decide(&snapshot, head, &estimator)
    }

    /// Moves the tracked head along the chosen direction and remembers the scores
    fn commit(&self, game_id: &str, turn: i32, head: Coord, decision: Decision) -> Decision {
        let next_head = decision.direction.apply(&head);
        debug!("Turn {}: tracked head {} -> {}", turn, head, next_head);

        self.sessions.set(game_id, next_head);
        self.sessions.record_scores(game_id, decision.scores.clone());
        decision
    }

    fn reported_head(you: &Battlesnake) -> Coord {
        you.head().unwrap_or_default()
    }
}
