//! Runtime tunables for the review CLI.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable. Command-line flags take precedence over both.

use std::path::PathBuf;

/// Environment variable overriding the worker pool size.
pub const WORKERS_ENV: &str = "CHESS_REVIEW_WORKERS";

/// Environment variable enabling the daily rolling log file.
pub const LOG_DIR_ENV: &str = "CHESS_REVIEW_LOG_DIR";

/// Upper bound on engine processes started for one review.
const MAX_WORKERS: usize = 8;

/// Default search depth per position.
pub const DEFAULT_DEPTH: u8 = 18;

/// Default per-position timeout (in seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parse a worker count. Zero and garbage are rejected; large values are
/// clamped to [`MAX_WORKERS`].
pub fn parse_workers(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n.min(MAX_WORKERS)),
    }
}

/// Half the available cores, at least one, at most [`MAX_WORKERS`].
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

/// Get the worker pool size.
///
/// Priority:
/// 1. `CHESS_REVIEW_WORKERS` env variable if set and valid
/// 2. [`default_workers`]
pub fn get_workers() -> usize {
    if let Ok(value) = std::env::var(WORKERS_ENV) {
        match parse_workers(&value) {
            Some(n) => return n,
            None => tracing::warn!(value = %value, "Ignoring invalid {}", WORKERS_ENV),
        }
    }

    default_workers()
}

/// Get the log directory, if file logging is enabled.
///
/// Returns `CHESS_REVIEW_LOG_DIR` when set and non-empty, otherwise `None`
/// (logs go to stderr only).
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var(LOG_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Some(4));
        assert_eq!(parse_workers(" 2 "), Some(2));
        assert_eq!(parse_workers("64"), Some(MAX_WORKERS));
        assert_eq!(parse_workers("0"), None);
        assert_eq!(parse_workers("-1"), None);
        assert_eq!(parse_workers("many"), None);
    }

    #[test]
    fn test_default_workers_in_range() {
        let n = default_workers();
        assert!((1..=MAX_WORKERS).contains(&n));
    }

    #[test]
    fn test_get_workers() {
        let n = get_workers();
        match std::env::var(WORKERS_ENV).ok().and_then(|v| parse_workers(&v)) {
            Some(expected) => assert_eq!(n, expected),
            None => assert_eq!(n, default_workers()),
        }
    }

    #[test]
    fn test_get_log_dir() {
        let dir = get_log_dir();
        match std::env::var(LOG_DIR_ENV) {
            Ok(val) if !val.trim().is_empty() => assert_eq!(dir, Some(PathBuf::from(val))),
            _ => assert_eq!(dir, None),
        }
    }
}
