//! Carousel navigation state machine.

use log::debug;

use crate::config::{Millis, ViewerTunables};

/// Last navigation direction; biases prefetch order, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Forward,
    Backward,
}

/// Emitted once per index change when the new hero image has decoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroLoad {
    pub index: usize,
    /// Time from navigation intent to visible pixels; `None` for the initial
    /// display, which has no navigation intent
    pub latency_ms: Option<Millis>,
}

/// Owns the current index, wrap-around stepping, input throttling, and swipe
/// detection. All externally triggered navigation funnels through one
/// throttled transition, so rapid key-repeat or multi-touch jitter collapses
/// to a single index change per throttle window.
#[derive(Debug)]
pub struct CarouselController {
    count: usize,
    current: usize,
    direction: SwipeDirection,
    throttle_ms: Millis,
    swipe_threshold_px: f32,
    neighbors: usize,
    last_navigation_at: Option<Millis>,
    navigation_intent_at: Option<Millis>,
    touch_start_x: Option<f32>,
    hero_pending: bool,
}

impl CarouselController {
    pub fn new(count: usize, tunables: &ViewerTunables) -> Self {
        Self {
            count,
            current: 0,
            direction: SwipeDirection::Forward,
            throttle_ms: tunables.navigation_throttle_ms,
            swipe_threshold_px: tunables.swipe_threshold_px,
            neighbors: tunables.prefetch_neighbors,
            last_navigation_at: None,
            navigation_intent_at: None,
            touch_start_x: None,
            hero_pending: count > 0,
        }
    }

    pub fn image_count(&self) -> usize {
        self.count
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn direction(&self) -> SwipeDirection {
        self.direction
    }

    /// Hosts that know the travel direction out of band (e.g. restoring a
    /// session) may set it directly; normal navigation derives it.
    pub fn set_direction(&mut self, direction: SwipeDirection) {
        self.direction = direction;
    }

    /// Called when the listing identity changes: the index resets to 0 and
    /// all transient input state is dropped.
    pub fn set_image_count(&mut self, count: usize) {
        self.count = count;
        self.current = 0;
        self.direction = SwipeDirection::Forward;
        self.last_navigation_at = None;
        self.navigation_intent_at = None;
        self.touch_start_x = None;
        self.hero_pending = count > 0;
    }

    /// Advances to the next image, wrapping past the end
    pub fn next(&mut self, now: Millis) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let target = (self.current + 1) % self.count;
        self.navigate(target, SwipeDirection::Forward, now)
    }

    /// Steps back to the previous image, wrapping past the start
    pub fn previous(&mut self, now: Millis) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let target = (self.current + self.count - 1) % self.count;
        self.navigate(target, SwipeDirection::Backward, now)
    }

    /// Jumps to an index (dot click). The index is clamped into range; the
    /// direction follows whether the target is ahead of or behind the prior
    /// index.
    pub fn slide_to(&mut self, index: usize, now: Millis) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let target = index.min(self.count - 1);
        let direction = if target >= self.current {
            SwipeDirection::Forward
        } else {
            SwipeDirection::Backward
        };
        self.navigate(target, direction, now)
    }

    pub fn touch_start(&mut self, x: f32) {
        self.touch_start_x = Some(x);
    }

    /// Navigation fires only when the horizontal delta since touch-start
    /// exceeds the swipe threshold; the direction is the sign of the delta.
    pub fn touch_end(&mut self, x: f32, now: Millis) -> Option<usize> {
        let start = self.touch_start_x.take()?;
        let delta = x - start;
        if delta.abs() <= self.swipe_threshold_px {
            return None;
        }
        if delta < 0.0 {
            self.next(now)
        } else {
            self.previous(now)
        }
    }

    /// Records that the new hero image has decoded. Returns a notification
    /// exactly once per index change; repeated decode events for the same
    /// index yield `None`.
    pub fn hero_loaded(&mut self, now: Millis) -> Option<HeroLoad> {
        if !self.hero_pending {
            return None;
        }
        self.hero_pending = false;
        let latency_ms = self.navigation_intent_at.take().map(|at| now - at);
        Some(HeroLoad {
            index: self.current,
            latency_ms,
        })
    }

    /// Indices to warm next: the following `prefetch_neighbors` images in the
    /// current travel direction, excluding the current index.
    pub fn prefetch_plan(&self) -> Vec<usize> {
        if self.count < 2 {
            return Vec::new();
        }
        let steps = self.neighbors.min(self.count - 1);
        (1..=steps)
            .map(|step| match self.direction {
                SwipeDirection::Forward => (self.current + step) % self.count,
                SwipeDirection::Backward => (self.current + self.count - step) % self.count,
            })
            .collect()
    }

    fn navigate(&mut self, target: usize, direction: SwipeDirection, now: Millis) -> Option<usize> {
        if self.throttled(now) {
            debug!("navigation to {target} throttled");
            return None;
        }
        if target == self.current {
            return None;
        }
        self.last_navigation_at = Some(now);
        self.navigation_intent_at = Some(now);
        self.current = target;
        self.direction = direction;
        self.hero_pending = true;
        Some(target)
    }

    fn throttled(&self, now: Millis) -> bool {
        self.last_navigation_at
            .is_some_and(|at| now - at < self.throttle_ms)
    }
}
