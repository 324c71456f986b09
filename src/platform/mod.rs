//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Clock-derived seeds
//! - Content fetch retry schedule
//! - The browser host (DOM surface, input adapters, frame loop, teardown)

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{Host, HostOptions};

/// Seed for runs that did not configure one
#[cfg(target_arch = "wasm32")]
pub fn clock_seed() -> u64 {
    js_sys::Date::now() as u64
}

/// Seed for runs that did not configure one
#[cfg(not(target_arch = "wasm32"))]
pub fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// First retry delay for a failed content fetch
const CONTENT_RETRY_BASE_MS: u32 = 2_000;
/// Longest wait between content fetch attempts
const CONTENT_RETRY_MAX_MS: u32 = 30_000;
/// Attempts before the host gives up on content
pub const CONTENT_FETCH_ATTEMPTS: u32 = 6;

/// Wait before content fetch `attempt` (0-based), doubling up to a cap
///
/// None once every attempt has been spent.
pub fn content_retry_delay_ms(attempt: u32) -> Option<u32> {
    match attempt {
        0 => Some(0),
        n if n < CONTENT_FETCH_ATTEMPTS => {
            Some(CONTENT_RETRY_BASE_MS.saturating_mul(1 << (n - 1)).min(CONTENT_RETRY_MAX_MS))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_retry_backs_off_then_stops() {
        let delays: Vec<u32> = (0..).map_while(content_retry_delay_ms).collect();
        assert_eq!(delays, vec![0, 2_000, 4_000, 8_000, 16_000, 30_000]);
        assert_eq!(content_retry_delay_ms(CONTENT_FETCH_ATTEMPTS), None);
    }

    #[test]
    fn test_clock_seed_is_nonzero() {
        assert!(clock_seed() > 0);
    }
}
