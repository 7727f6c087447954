//! Sliding-window admission control, keyed by any `Eq + Hash` value (IP
//! addresses for HTTP endpoints, session ids for WS chat — §4.6).
//!
//! Each key tracks its own timestamp deque; `allow` prunes entries older
//! than the window on every call, so idle keys self-clean without a
//! separate sweep, and `cleanup` drops keys that have gone fully idle to
//! bound memory for keys that stop showing up at all.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

struct Window {
    hits: VecDeque<Instant>,
}

/// In-memory sliding-window rate limiter. Default preset per §4.6: 20
/// events per 60 second window.
pub struct SlidingWindowLimiter<K> {
    windows: Mutex<HashMap<K, Window>>,
    limit: usize,
    window: Duration,
}

impl<K: Eq + Hash + Clone> SlidingWindowLimiter<K> {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { windows: Mutex::new(HashMap::new()), limit, window }
    }

    /// Default per §4.6: N=20 events per 60s per key.
    pub fn default_preset() -> Self {
        Self::new(20, Duration::from_secs(60))
    }

    /// Returns `(allowed, retry_after)`. `retry_after` is `Some` only when
    /// denied, and is how long until the oldest hit in the window ages out.
    pub async fn allow(&self, key: K) -> (bool, Option<Duration>) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(key).or_insert_with(|| Window { hits: VecDeque::new() });

        while let Some(&oldest) = entry.hits.front() {
            if now.duration_since(oldest) >= self.window {
                entry.hits.pop_front();
            } else {
                break;
            }
        }

        if entry.hits.len() >= self.limit {
            let retry_after = entry
                .hits
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)));
            return (false, retry_after);
        }

        entry.hits.push_back(now);
        (true, None)
    }

    /// Drop keys with no hits inside the current window. Call periodically
    /// to bound memory for keys that have gone idle entirely.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| w.hits.back().is_some_and(|&last| now.duration_since(last) < window));
    }

    #[cfg(test)]
    async fn key_count(&self) -> usize {
        self.windows.lock().await.len()
    }
}
