//! @ai:module:intent Client-side request pacing for the hosted model API
//! @ai:module:layer infrastructure
//! @ai:module:public_api RateLimiter, RateLimiterTrait
//! @ai:module:stateless false

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// @ai:intent Trait for request pacing
pub trait RateLimiterTrait: Send + Sync {
    /// @ai:intent Wait until a request is allowed
    fn wait(&self) -> impl std::future::Future<Output = ()> + Send;
}

/// @ai:intent Token bucket shared by every call to the model API
pub struct RateLimiter {
    state: Arc<Mutex<BucketState>>,
    per_second: f64,
    capacity: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// @ai:intent Create a limiter allowing a burst of one minute's budget
    /// @ai:effects pure
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = f64::from(requests_per_minute.max(1));

        Self {
            state: Arc::new(Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
            per_second: capacity / 60.0,
            capacity,
        }
    }

    /// @ai:effects pure
    pub fn requests_per_minute(&self) -> u32 {
        self.capacity as u32
    }

    /// @ai:intent Take one token, or report how long until one is available
    /// @ai:effects state:write
    fn try_acquire(&self, state: &mut BucketState) -> Option<Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.per_second).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64((1.0 - state.tokens) / self.per_second))
        }
    }
}

impl RateLimiterTrait for RateLimiter {
    /// @ai:intent Wait until a request is allowed
    /// @ai:effects state:write, time
    async fn wait(&self) {
        loop {
            let pause = {
                let mut state = self.state.lock().await;
                match self.try_acquire(&mut state) {
                    None => return,
                    Some(pause) => pause,
                }
            };

            tracing::debug!("Rate limit reached, waiting {:?}", pause);
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(30);

        let start = Instant::now();
        limiter.wait().await;

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_exhausted_bucket_waits_for_refill() {
        let limiter = RateLimiter::new(120);

        for _ in 0..120 {
            limiter.wait().await;
        }

        let start = Instant::now();
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[test]
    fn test_zero_rate_is_raised_to_one() {
        assert_eq!(RateLimiter::new(0).requests_per_minute(), 1);
    }
}
