//! Relay liveness inferred from `status` frame recency

use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Watchdog {
    ttl: Duration,
    last_status: Option<Instant>,
    online: bool,
}

impl Watchdog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_status: None,
            online: false,
        }
    }

    pub fn record_status(&mut self, now: Instant, online: bool) {
        if online != self.online {
            debug!(online = online, "Relay status changed");
        }
        self.last_status = Some(now);
        self.online = online;
    }

    /// Returns true when this check is the one that declared the relay offline
    pub fn check(&mut self, now: Instant) -> bool {
        if !self.online {
            return false;
        }
        let stale = self
            .last_status
            .is_none_or(|last| now.saturating_duration_since(last) > self.ttl);
        if stale {
            warn!(ttl_ms = self.ttl.as_millis() as u64, "No status from relay, marking offline");
            self.online = false;
        }
        stale
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn last_status(&self) -> Option<Instant> {
        self.last_status
    }
}
