//! Asynchronous load+decode plumbing.
//!
//! The pure scheduler decides *what* to start; this module actually starts
//! it. Jobs are spawned on the tokio runtime and their completions funneled
//! back over an mpsc channel, tagged with the generation they were started
//! under so the scheduler can discard stragglers from a previous listing.

use std::path::PathBuf;
use std::sync::Arc;

pub use futures::future::BoxFuture;
use log::debug;
use tokio::sync::mpsc;

use crate::config::Millis;
use crate::descriptor::ImageDescriptor;
use crate::error::{Result, ViewerError};
use crate::prefetch::{PrefetchJob, PrefetchScheduler};
use crate::viewport::ZoomPanViewport;

/// A decoded image ready for display (RGBA8)
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Host-provided load+decode primitive. A fetch resolves once the image is
/// fully decoded, not merely downloaded.
pub trait ImageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<DecodedImage>>;
}

/// Fetcher over a local rendition tree, decoding with the image crate.
/// Decode runs on the blocking pool; it is CPU-bound.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<DecodedImage>> {
        let path = self.root.join(url.trim_start_matches('/'));
        Box::pin(async move {
            let bytes = tokio::fs::read(&path).await?;
            let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
                .await
                .map_err(|e| ViewerError::DecodeError(e.to_string()))??;
            let rgba = decoded.to_rgba8();
            Ok(DecodedImage {
                width: rgba.width(),
                height: rgba.height(),
                pixels: rgba.into_raw(),
            })
        })
    }
}

/// Outcome of one spawned prefetch job
#[derive(Debug, Clone)]
pub struct PrefetchCompletion {
    pub generation: u64,
    pub url: String,
    pub index: usize,
    pub success: bool,
}

/// Pumps the pure scheduler: spawns a fetch per admitted job and feeds the
/// completions back to free concurrency slots. There is no abort; a stale
/// fetch occupies its slot until it naturally resolves, and the generation
/// guard discards its result.
pub struct PrefetchDriver {
    fetcher: Arc<dyn ImageFetcher>,
    tx: mpsc::UnboundedSender<PrefetchCompletion>,
    rx: mpsc::UnboundedReceiver<PrefetchCompletion>,
}

impl PrefetchDriver {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { fetcher, tx, rx }
    }

    /// Starts the given jobs on the runtime. Failures are recorded as
    /// unsuccessful completions, never surfaced.
    pub fn spawn_jobs(&self, jobs: Vec<PrefetchJob>) {
        for job in jobs {
            let fetcher = Arc::clone(&self.fetcher);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = fetcher.fetch(&job.url).await;
                if let Err(e) = &result {
                    debug!("prefetch failed for {}: {e}", job.url);
                }
                let _ = tx.send(PrefetchCompletion {
                    generation: job.generation,
                    url: job.url,
                    index: job.index,
                    success: result.is_ok(),
                });
            });
        }
    }

    /// Awaits the next completion
    pub async fn next_completion(&mut self) -> Option<PrefetchCompletion> {
        self.rx.recv().await
    }

    /// Runs until the scheduler has neither in-flight nor queued work,
    /// starting follow-up jobs as slots free up. Returns the completions in
    /// arrival order.
    pub async fn run_to_idle(
        &mut self,
        scheduler: &mut PrefetchScheduler,
    ) -> Vec<PrefetchCompletion> {
        let mut completions = Vec::new();
        while scheduler.in_flight() > 0 {
            let Some(completion) = self.rx.recv().await else {
                break;
            };
            let follow_ups =
                scheduler.on_complete(completion.generation, &completion.url, completion.success);
            self.spawn_jobs(follow_ups);
            completions.push(completion);
        }
        completions
    }
}

/// Drives one settle-cycle upgrade for the fullscreen viewport: polls the
/// debounced decision, preloads the candidate fully, and commits it. A
/// preload failure leaves the active source unchanged.
pub async fn drive_upgrade(
    viewport: &mut ZoomPanViewport,
    descriptor: &ImageDescriptor,
    fetcher: &dyn ImageFetcher,
    now: Millis,
) -> Result<bool> {
    let Some(request) = viewport.poll_upgrade(descriptor, now) else {
        return Ok(false);
    };
    match fetcher.fetch(&request.url).await {
        Ok(_decoded) => Ok(viewport.complete_upgrade(request.id)),
        Err(e) => {
            viewport.fail_upgrade(request.id);
            Err(e)
        }
    }
}
