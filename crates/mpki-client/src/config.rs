//! Client configuration types.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;

/// Client-side request rate limit
///
/// Throttling only; the client never retries a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,

    /// Requests allowed in a burst
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitConfig {
    /// Create a new rate limit configuration (10 req/s, burst of 10)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 10,
        }
    }

    /// Set sustained requests per second
    #[must_use]
    pub const fn requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }

    /// Set burst size
    #[must_use]
    pub const fn burst_size(mut self, burst: u32) -> Self {
        self.burst_size = burst;
        self
    }

    /// Build the limiter; zero values are clamped to one
    pub(crate) fn limiter(self) -> DefaultDirectRateLimiter {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        RateLimiter::direct(Quota::per_second(rate).allow_burst(burst))
    }
}
