//! Optional measurement side channel.
//!
//! Latency and prefetch timing go through the `log` facade so hosts decide
//! where samples land. Disabling diagnostics changes no functional behavior;
//! every method is a no-op then.

use log::debug;

use crate::config::Millis;

#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Time from navigation intent to visible hero pixels
    pub fn navigation_latency(&self, index: usize, latency_ms: Millis) {
        if self.enabled {
            debug!("hero image {index} visible {latency_ms:.0}ms after navigation intent");
        }
    }

    pub fn prefetch_started(&self, url: &str, reason: &str) {
        if self.enabled {
            debug!("prefetch started ({reason}): {url}");
        }
    }

    pub fn prefetch_finished(&self, url: &str, success: bool) {
        if self.enabled {
            debug!(
                "prefetch {}: {url}",
                if success { "completed" } else { "dropped" }
            );
        }
    }
}
