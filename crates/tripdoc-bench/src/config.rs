use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Benchmark knobs, read from the environment.
pub struct Config {
    /// Number of itinerary days to generate.
    pub days: usize,
    /// Longest run of adjacent images in a day.
    pub max_run: usize,
    /// Iterations averaged for decode and render timings.
    pub iterations: u32,
    /// Write group identifiers to run heads too.
    pub tag_run_head: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            days: try_load("BENCH_DAYS", "500"),
            max_run: try_load("BENCH_MAX_RUN", "4"),
            iterations: try_load("BENCH_ITERATIONS", "10"),
            tag_run_head: try_load("BENCH_TAG_RUN_HEAD", "false"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
