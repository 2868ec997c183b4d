use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
const MAX_ITERATIONS_CEILING: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Upper bound on accepted swaps.
    pub max_iterations: usize,
    /// Wall-clock guard for very large pools.
    #[serde(default)]
    pub time_limit: Option<Duration>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_limit: None,
        }
    }
}

impl OptimizerConfig {
    /// Defaults overridden by `ROBO_MAX_ITERATIONS` and `ROBO_TIME_LIMIT_MS`.
    pub fn from_env() -> Self {
        let max_iterations = env_usize("ROBO_MAX_ITERATIONS")
            .unwrap_or(DEFAULT_MAX_ITERATIONS)
            .clamp(1, MAX_ITERATIONS_CEILING);
        let time_limit = env_usize("ROBO_TIME_LIMIT_MS")
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64));
        Self {
            max_iterations,
            time_limit,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.clamp(1, MAX_ITERATIONS_CEILING);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|val| val.trim().parse::<usize>().ok())
}
