//! Bounded set of attached live feeds

use pennywise_core::LiveFeed;
use std::collections::HashMap;
use std::sync::Arc;

struct CachedFeed {
    feed: Arc<LiveFeed>,
    last_used: u64,
}

/// Live feeds by user, holding at most `capacity` of them
///
/// When full, attaching a new feed drops the least recently used one, which
/// unsubscribes it from the store once no request holds it any more.
pub(crate) struct FeedCache {
    capacity: usize,
    tick: u64,
    feeds: HashMap<String, CachedFeed>,
}

impl FeedCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            feeds: HashMap::new(),
        }
    }

    /// Feed of `user`, calling `attach` if none is cached
    pub(crate) fn get_or_attach(&mut self, user: &str, attach: impl FnOnce() -> LiveFeed) -> Arc<LiveFeed> {
        self.tick += 1;
        if let Some(cached) = self.feeds.get_mut(user) {
            cached.last_used = self.tick;
            return cached.feed.clone();
        }

        if self.feeds.len() >= self.capacity {
            self.evict_least_recent();
        }
        let feed = Arc::new(attach());
        self.feeds.insert(
            user.to_string(),
            CachedFeed {
                feed: feed.clone(),
                last_used: self.tick,
            },
        );
        feed
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .feeds
            .iter()
            .min_by_key(|(_, cached)| cached.last_used)
            .map(|(user, _)| user.clone());
        if let Some(user) = oldest {
            self.feeds.remove(&user);
            log::debug!("Evicted live feed of {}", user);
        }
    }
}
