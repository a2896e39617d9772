// Configuration module for reading Snake.toml
// This module provides OOP-style configuration management for the Battlesnake bot

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Deepest search the engine will accept. Fan-out is 4^depth.
pub const MAX_SEARCH_DEPTH_CAP: u8 = 8;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub search: SearchConfig,
    pub scores: ScoresConfig,
    pub session: SessionConfig,
    pub debug: DebugConfig,
}

/// Timing and performance constants
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Lookahead search shape
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Maximum recursion depth. The relevance factor is zero at this depth.
    pub max_depth: u8,
    /// Levels shallower than this fan out onto the thread pool; deeper levels run sequentially
    pub parallel_depth_cutoff: u8,
    /// Worker threads for the search pool (0 = one per core)
    pub worker_threads: usize,
}

/// Heuristic rewards and penalties
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    // Per reachable cell
    pub base_value: i64,

    // Food: food_value applies above health_threshold, low_food_value at or below it
    pub food_value: i64,
    pub low_food_value: i64,
    pub health_threshold: i32,

    // Collisions
    pub kill_value: i64,
    pub death_value: i64,
    pub immediate_death_value: i64,

    // Applied once per boundary axis
    pub next_to_wall_value: i64,
}

/// Session bookkeeping
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub evict_on_end: bool,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed and validated configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Rejects search shapes the engine cannot run
    pub fn validate(&self) -> Result<(), String> {
        if self.search.max_depth == 0 {
            return Err("search.max_depth must be at least 1".to_string());
        }
        if self.search.max_depth > MAX_SEARCH_DEPTH_CAP {
            return Err(format!(
                "search.max_depth {} exceeds the cap of {}",
                self.search.max_depth, MAX_SEARCH_DEPTH_CAP
            ));
        }
        Ok(())
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 500,
                network_overhead_ms: 100,
            },
            search: SearchConfig {
                max_depth: 4,
                parallel_depth_cutoff: 2,
                worker_threads: 0,
            },
            scores: ScoresConfig {
                base_value: 10,
                food_value: 40,
                low_food_value: 20,
                health_threshold: 50,
                kill_value: 300,
                death_value: -200,
                immediate_death_value: -100_000,
                next_to_wall_value: -5,
            },
            session: SessionConfig { evict_on_end: true },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "battlesnake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
