use std::env;
use std::str::FromStr;

/// Tunables of the decoupled planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Seed of the random source that orders sibling joint actions.
    pub seed: u64,
    /// Weight of `h` in the resolution search, `f = g + weight * h`.
    pub weight: i32,
    pub max_iterations: usize,
    /// Expansion cap of a single resolution search; `None` runs to exhaustion.
    pub max_expansions: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            weight: 2,
            max_iterations: 10_000,
            max_expansions: None,
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `BOXBOT_SEED`, `BOXBOT_WEIGHT`,
    /// `BOXBOT_MAX_ITERATIONS` and `BOXBOT_MAX_EXPANSIONS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            seed: parse_var(&lookup, "BOXBOT_SEED").unwrap_or(defaults.seed),
            weight: parse_var(&lookup, "BOXBOT_WEIGHT").unwrap_or(defaults.weight),
            max_iterations: parse_var(&lookup, "BOXBOT_MAX_ITERATIONS")
                .unwrap_or(defaults.max_iterations),
            max_expansions: parse_var(&lookup, "BOXBOT_MAX_EXPANSIONS")
                .or(defaults.max_expansions),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid setting");
            None
        }
    }
}
