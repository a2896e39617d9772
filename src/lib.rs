// Library exports for the lookahead Battlesnake
// The HTTP server, the replay tool and the integration tests all drive the engine through these modules

pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod estimator;
pub mod feasibility;
pub mod replay;
pub mod selector;
pub mod session;
pub mod snapshot;
pub mod types;
