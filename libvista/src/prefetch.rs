//! Bounded-concurrency prefetch scheduling.
//!
//! The scheduler is a pure state machine: it never performs I/O. `enqueue`
//! and `on_complete` return the jobs the host (or the streaming driver) must
//! start now; completions are fed back with the generation they were started
//! under, so results from before a `reset` are discarded.

use std::collections::{HashSet, VecDeque};

use log::debug;
use serde::Serialize;

use crate::config::ViewerTunables;

/// Diagnostic tag describing what triggered a prefetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrefetchReason {
    PointerDown,
    TouchStart,
    HeroLoaded,
    IndexChange,
}

impl PrefetchReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "pointer-down",
            Self::TouchStart => "touch-start",
            Self::HeroLoaded => "hero-loaded",
            Self::IndexChange => "index-change",
        }
    }
}

/// A not-yet-admitted request to warm one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefetchRequest {
    pub url: String,
    pub index: usize,
    pub reason: PrefetchReason,
}

/// An admitted job the host must start now. Carries the generation it was
/// started under; pass it back unchanged to `on_complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefetchJob {
    pub url: String,
    pub index: usize,
    pub reason: PrefetchReason,
    pub generation: u64,
}

#[derive(Debug)]
pub struct PrefetchScheduler {
    generation: u64,
    completed: HashSet<String>,
    pending: HashSet<String>,
    queue: VecDeque<PrefetchRequest>,
    max_in_flight: usize,
    index_fanout: usize,
}

impl PrefetchScheduler {
    pub fn new(tunables: &ViewerTunables) -> Self {
        Self {
            generation: 0,
            completed: HashSet::new(),
            pending: HashSet::new(),
            queue: VecDeque::new(),
            max_in_flight: tunables.prefetch_concurrency.max(1),
            index_fanout: tunables.prefetch_index_fanout.max(1),
        }
    }

    /// Generation jobs are currently started under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of in-flight loads
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Number of admitted requests not yet started
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// True once the URL has been fetched and decoded this generation
    pub fn is_warm(&self, url: &str) -> bool {
        self.completed.contains(url)
    }

    /// Admits requests and returns the jobs to start now.
    ///
    /// A request whose URL is already completed, in flight, or queued is
    /// silently dropped. Per call, requests for at most `index_fanout` unique
    /// target indices are admitted; callers re-enqueue on their next trigger,
    /// so overflow is never lost permanently.
    pub fn enqueue(&mut self, requests: Vec<PrefetchRequest>) -> Vec<PrefetchJob> {
        let mut admitted_indices: HashSet<usize> = HashSet::new();

        for request in requests {
            if self.completed.contains(&request.url)
                || self.pending.contains(&request.url)
                || self.queue.iter().any(|queued| queued.url == request.url)
            {
                continue;
            }
            if !admitted_indices.contains(&request.index)
                && admitted_indices.len() >= self.index_fanout
            {
                debug!(
                    "prefetch admission full, dropping index {} ({})",
                    request.index,
                    request.reason.as_str()
                );
                continue;
            }
            admitted_indices.insert(request.index);
            self.queue.push_back(request);
        }

        self.drain()
    }

    /// Records a job outcome and returns follow-up jobs to start.
    ///
    /// Completions whose generation predates the current one are ignored;
    /// their slot was already reclaimed by `reset`. Failures free the slot
    /// without entering the completed set (best-effort warming, no retry).
    pub fn on_complete(&mut self, generation: u64, url: &str, success: bool) -> Vec<PrefetchJob> {
        if generation != self.generation {
            debug!("discarding stale prefetch completion for {url} (generation {generation})");
            return Vec::new();
        }

        if self.pending.remove(url) && success {
            self.completed.insert(url.to_string());
        }

        self.drain()
    }

    /// Called on listing change: advances the generation and clears all
    /// scheduler state. In-flight loads cannot be aborted; their completions
    /// are discarded by the generation guard when they eventually arrive.
    pub fn reset(&mut self) -> u64 {
        self.generation += 1;
        self.queue.clear();
        self.pending.clear();
        self.completed.clear();
        self.generation
    }

    // FIFO start order; completion order is up to the network.
    fn drain(&mut self) -> Vec<PrefetchJob> {
        let mut jobs = Vec::new();
        while self.pending.len() < self.max_in_flight {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            self.pending.insert(request.url.clone());
            jobs.push(PrefetchJob {
                url: request.url,
                index: request.index,
                reason: request.reason,
                generation: self.generation,
            });
        }
        jobs
    }
}
