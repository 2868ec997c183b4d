pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod formation;
pub mod loader;
pub mod model;
pub mod optimizer;
pub mod scoring;

pub use aggregate::{AggregateFilters, DisplayFilter, RoundRange, aggregate};
pub use config::OptimizerConfig;
pub use error::{AggregateError, LoadError, OptimizeError};
pub use formation::{FORMATIONS, Formation};
pub use model::{AggregatedPlayer, FixtureRecord, PlayerRoundRecord, Position, Scout, ScoutCounts, Venue};
pub use optimizer::{Criterion, Lineup, StopReason, Swap, best_lineup, optimize, optimize_formations};
