use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Points handed out by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub exact_score_points: i32,
    pub correct_outcome_points: i32,
    pub round_advance_points: i32,
    pub penalty_winner_points: i32,
}

impl Default for ScoringPolicy {
    fn default() -> ScoringPolicy {
        ScoringPolicy {
            exact_score_points: 3,
            correct_outcome_points: 1,
            round_advance_points: 5,
            penalty_winner_points: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl LeaderboardLimits {
    /// Requested window size, falling back to the default and never above the cap.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

impl Default for LeaderboardLimits {
    fn default() -> LeaderboardLimits {
        LeaderboardLimits {
            default_limit: 50,
            max_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exponential backoff: base, 2*base, 4*base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay * factor
    }
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub scoring: ScoringPolicy,
    pub leaderboard: LeaderboardLimits,
    pub group_capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            database_url: None,
            pool_size: 3,
            scoring: ScoringPolicy::default(),
            leaderboard: LeaderboardLimits::default(),
            group_capacity: crate::groups::MAX_GROUP_MEMBERS,
            retry: RetryPolicy::default(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}

fn var<T: FromStr>(key: &str, default: T) -> Result<T> {
    parse_var(key, env::var(key).ok(), default)
}

impl Config {
    pub fn from_env() -> Result<Config> {
        dotenv().ok();

        let defaults = Config::default();
        let config = Config {
            database_url: env::var("DATABASE_URL").ok(),
            pool_size: var("DB_POOL_SIZE", defaults.pool_size)?,
            scoring: ScoringPolicy {
                exact_score_points: var("EXACT_SCORE_POINTS", defaults.scoring.exact_score_points)?,
                correct_outcome_points: var(
                    "CORRECT_OUTCOME_POINTS",
                    defaults.scoring.correct_outcome_points,
                )?,
                round_advance_points: var(
                    "ROUND_ADVANCE_POINTS",
                    defaults.scoring.round_advance_points,
                )?,
                penalty_winner_points: var(
                    "PENALTY_WINNER_POINTS",
                    defaults.scoring.penalty_winner_points,
                )?,
            },
            leaderboard: LeaderboardLimits {
                default_limit: var(
                    "LEADERBOARD_DEFAULT_LIMIT",
                    defaults.leaderboard.default_limit,
                )?,
                max_limit: var("LEADERBOARD_MAX_LIMIT", defaults.leaderboard.max_limit)?,
            },
            group_capacity: var("GROUP_CAPACITY", defaults.group_capacity)?,
            retry: RetryPolicy {
                max_attempts: var("TX_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
                base_delay: Duration::from_millis(var("TX_RETRY_BASE_MS", 10u64)?),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("TX_MAX_ATTEMPTS must be at least 1".to_owned()));
        }
        // The creator takes the first seat of every group.
        if self.group_capacity == 0 {
            return Err(Error::Config("GROUP_CAPACITY must be at least 1".to_owned()));
        }
        if self.leaderboard.default_limit > self.leaderboard.max_limit {
            return Err(Error::Config(
                "LEADERBOARD_DEFAULT_LIMIT exceeds LEADERBOARD_MAX_LIMIT".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_ref()
            .map(String::as_str)
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        assert_eq!(parse_var("GROUP_CAPACITY", None, 500usize), Ok(500));
        assert_eq!(parse_var("GROUP_CAPACITY", Some(" 20 ".to_owned()), 500usize), Ok(20));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        match parse_var("EXACT_SCORE_POINTS", Some("lots".to_owned()), 3i32) {
            Err(Error::Config(message)) => assert!(message.contains("EXACT_SCORE_POINTS")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn leaderboard_limit_is_capped() {
        let limits = LeaderboardLimits::default();
        assert_eq!(limits.clamp(None), 50);
        assert_eq!(limits.clamp(Some(10)), 10);
        assert_eq!(limits.clamp(Some(5000)), 1000);
    }

    #[test]
    fn retry_delay_doubles() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for(1), Duration::from_millis(10));
        assert_eq!(retry.delay_for(2), Duration::from_millis(20));
        assert_eq!(retry.delay_for(3), Duration::from_millis(40));
    }

    #[test]
    fn groups_need_room_for_their_creator() {
        let mut config = Config::default();
        assert_eq!(config.validate(), Ok(()));

        config.group_capacity = 0;
        match config.validate() {
            Err(Error::Config(message)) => assert!(message.contains("GROUP_CAPACITY")),
            other => panic!("unexpected {:?}", other),
        }

        config.group_capacity = 1;
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn database_url_is_required_only_when_asked_for() {
        let config = Config::default();
        assert!(config.database_url().is_err());
    }
}
