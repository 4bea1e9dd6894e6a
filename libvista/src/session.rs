//! Per-listing viewer session.
//!
//! The session owns the filtered image list, the carousel state, the
//! prefetch scheduler generation, and every host listener handle it
//! registered. It is recreated whenever the listing identity changes (or
//! re-seeded via `set_images`, which is equivalent for state purposes).

use std::collections::VecDeque;

use log::debug;

use crate::carousel::CarouselController;
use crate::config::{Millis, ViewerTunables};
use crate::descriptor::{ImageDescriptor, RenditionRole};
use crate::diagnostics::Diagnostics;
use crate::events::ViewerEvent;
use crate::prefetch::{PrefetchJob, PrefetchReason, PrefetchRequest, PrefetchScheduler};
use crate::resolver;
use crate::urls::UrlResolver;
use crate::viewport::{Size, ZoomPanViewport};

/// What the host should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    /// No displayable images: render the explicit placeholder, never throw
    Empty,
    Gallery,
}

/// Keyboard input relevant to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
}

/// Host event sources the session subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostListener {
    Keydown,
    Resize,
}

/// A listener registration owned by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: u64,
    pub listener: HostListener,
}

/// Arena-style registry of host listener handles. The session owns every
/// handle it created and releases them all, deterministically, on teardown.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    next_id: u64,
    handles: Vec<SubscriptionHandle>,
}

impl SubscriptionSet {
    pub fn register(&mut self, listener: HostListener) -> SubscriptionHandle {
        self.next_id += 1;
        let handle = SubscriptionHandle {
            id: self.next_id,
            listener,
        };
        self.handles.push(handle);
        handle
    }

    pub fn active(&self) -> &[SubscriptionHandle] {
        &self.handles
    }

    /// Returns the released handles so the host can unhook its listeners
    pub fn release_all(&mut self) -> Vec<SubscriptionHandle> {
        std::mem::take(&mut self.handles)
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Accessibility label for the gallery
    pub title: String,
    pub touch_primary: bool,
    /// Enables the latency/prefetch measurement side channel
    pub diagnostics: bool,
    pub tunables: ViewerTunables,
    pub urls: UrlResolver,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            touch_primary: false,
            diagnostics: false,
            tunables: ViewerTunables::default(),
            urls: UrlResolver::default(),
        }
    }
}

pub struct ViewerSession {
    images: Vec<ImageDescriptor>,
    title: String,
    touch_primary: bool,
    tunables: ViewerTunables,
    urls: UrlResolver,
    carousel: CarouselController,
    scheduler: PrefetchScheduler,
    diagnostics: Diagnostics,
    subscriptions: SubscriptionSet,
    outbox: VecDeque<ViewerEvent>,
    #[cfg(feature = "streaming")]
    event_tx: Option<tokio::sync::mpsc::UnboundedSender<ViewerEvent>>,
    closed: bool,
}

impl ViewerSession {
    pub fn new(images: Vec<ImageDescriptor>, options: SessionOptions) -> Self {
        let images = prepare(images);
        let carousel = CarouselController::new(images.len(), &options.tunables);
        let scheduler = PrefetchScheduler::new(&options.tunables);

        let mut subscriptions = SubscriptionSet::default();
        subscriptions.register(HostListener::Keydown);
        subscriptions.register(HostListener::Resize);

        Self {
            images,
            title: options.title,
            touch_primary: options.touch_primary,
            tunables: options.tunables,
            urls: options.urls,
            carousel,
            scheduler,
            diagnostics: Diagnostics::new(options.diagnostics),
            subscriptions,
            outbox: VecDeque::new(),
            #[cfg(feature = "streaming")]
            event_tx: None,
            closed: false,
        }
    }

    /// Attaches an async event stream. Events keep flowing into the polled
    /// outbox as well; the stream is an additional tap for hosts that drain
    /// with a task.
    #[cfg(feature = "streaming")]
    pub fn attach_event_stream(&mut self) -> crate::events::EventStream {
        let (tx, stream) = crate::events::EventStream::channel();
        self.event_tx = Some(tx);
        stream
    }

    pub fn state(&self) -> ViewerState {
        if self.images.is_empty() {
            ViewerState::Empty
        } else {
            ViewerState::Gallery
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn images(&self) -> &[ImageDescriptor] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn current_index(&self) -> usize {
        self.carousel.current_index()
    }

    pub fn current_image(&self) -> Option<&ImageDescriptor> {
        self.images.get(self.carousel.current_index())
    }

    pub fn scheduler(&self) -> &PrefetchScheduler {
        &self.scheduler
    }

    pub fn subscriptions(&self) -> &[SubscriptionHandle] {
        self.subscriptions.active()
    }

    /// Display URL for the current hero image
    pub fn hero_url(&self) -> Option<String> {
        let descriptor = self.current_image()?;
        resolver::resolve_display_url(
            descriptor,
            RenditionRole::Detail,
            self.tunables.detail_target_width,
        )
        .map(|url| self.urls.resolve(url))
    }

    /// Display URL for a thumbnail slot
    pub fn thumbnail_url(&self, index: usize) -> Option<String> {
        let descriptor = self.images.get(index)?;
        resolver::resolve_display_url(
            descriptor,
            RenditionRole::Grid,
            self.tunables.grid_target_width,
        )
        .map(|url| self.urls.resolve(url))
    }

    /// Replaces the image list when the listing identity changes. The index
    /// resets to 0 and the prefetch generation advances, so completions from
    /// the previous listing are discarded on arrival.
    pub fn set_images(&mut self, images: Vec<ImageDescriptor>) {
        self.images = prepare(images);
        self.carousel.set_image_count(self.images.len());
        let generation = self.scheduler.reset();
        debug!(
            "listing changed: {} images, prefetch generation {generation}",
            self.images.len()
        );
        if !self.images.is_empty() {
            self.emit(ViewerEvent::IndexChanged { index: 0 });
        }
    }

    pub fn next(&mut self, now: Millis) -> Vec<PrefetchJob> {
        match self.carousel.next(now) {
            Some(index) => self.after_navigation(index),
            None => Vec::new(),
        }
    }

    pub fn previous(&mut self, now: Millis) -> Vec<PrefetchJob> {
        match self.carousel.previous(now) {
            Some(index) => self.after_navigation(index),
            None => Vec::new(),
        }
    }

    pub fn slide_to(&mut self, index: usize, now: Millis) -> Vec<PrefetchJob> {
        match self.carousel.slide_to(index, now) {
            Some(index) => self.after_navigation(index),
            None => Vec::new(),
        }
    }

    pub fn handle_key(&mut self, key: Key, now: Millis) -> Vec<PrefetchJob> {
        match key {
            Key::ArrowRight => self.next(now),
            Key::ArrowLeft => self.previous(now),
        }
    }

    /// Pointer-down on the carousel: warm the likely-next images early
    pub fn pointer_down(&mut self, _now: Millis) -> Vec<PrefetchJob> {
        self.warm_neighbors(PrefetchReason::PointerDown)
    }

    pub fn touch_start(&mut self, x: f32, _now: Millis) -> Vec<PrefetchJob> {
        self.carousel.touch_start(x);
        self.warm_neighbors(PrefetchReason::TouchStart)
    }

    pub fn touch_end(&mut self, x: f32, now: Millis) -> Vec<PrefetchJob> {
        match self.carousel.touch_end(x, now) {
            Some(index) => self.after_navigation(index),
            None => Vec::new(),
        }
    }

    /// Called when the hero image for the current index has decoded. Emits
    /// the hero-loaded event exactly once per index change and warms the
    /// next neighbors.
    pub fn hero_loaded(&mut self, now: Millis) -> Vec<PrefetchJob> {
        let Some(load) = self.carousel.hero_loaded(now) else {
            return Vec::new();
        };
        if let Some(latency) = load.latency_ms {
            self.diagnostics.navigation_latency(load.index, latency);
        }
        self.emit(ViewerEvent::HeroLoaded {
            index: load.index,
            latency_ms: load.latency_ms,
        });
        self.warm_neighbors(PrefetchReason::HeroLoaded)
    }

    /// Feeds a prefetch outcome back; returns follow-up jobs to start
    pub fn prefetch_complete(
        &mut self,
        generation: u64,
        url: &str,
        success: bool,
    ) -> Vec<PrefetchJob> {
        self.diagnostics.prefetch_finished(url, success);
        self.scheduler.on_complete(generation, url, success)
    }

    /// Drains pending host-facing events
    pub fn poll_events(&mut self) -> Vec<ViewerEvent> {
        self.outbox.drain(..).collect()
    }

    /// Scroll offset that centers the active thumbnail in a strip of the
    /// given width, computed from known thumbnail width and gap rather than
    /// element queries.
    pub fn thumbnail_scroll_offset(&self, thumb_width: f32, gap: f32, strip_width: f32) -> f32 {
        if self.images.is_empty() {
            return 0.0;
        }
        let slot = thumb_width + gap;
        let total = slot * self.images.len() as f32 - gap;
        let max_offset = (total - strip_width).max(0.0);
        let center = self.carousel.current_index() as f32 * slot + thumb_width / 2.0;
        (center - strip_width / 2.0).clamp(0.0, max_offset)
    }

    /// Builds the fullscreen viewport for the current image, seeded with the
    /// hero rendition currently displayed
    pub fn open_fullscreen(
        &self,
        container: Size,
        device_pixel_ratio: f32,
    ) -> Option<ZoomPanViewport> {
        let descriptor = self.current_image()?;
        let mut viewport = ZoomPanViewport::new(
            container,
            device_pixel_ratio,
            self.touch_primary,
            self.tunables.clone(),
        );
        if let Some((width, height)) = descriptor.natural_size() {
            viewport.set_natural_size(Size::new(width as f32, height as f32));
        }
        if let Some(rendition) = resolver::resolve_rendition(
            descriptor,
            RenditionRole::Detail,
            self.tunables.detail_target_width,
            true,
        ) {
            viewport.set_active_source(self.urls.resolve(&rendition.url), rendition.width);
        }
        Some(viewport)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Tears the session down: releases every host listener handle and
    /// advances the prefetch generation so in-flight completions are
    /// discarded. Returns the handles for the host to unhook.
    pub fn close(&mut self) -> Vec<SubscriptionHandle> {
        self.closed = true;
        self.scheduler.reset();
        self.subscriptions.release_all()
    }

    fn after_navigation(&mut self, index: usize) -> Vec<PrefetchJob> {
        debug!("carousel index -> {index}");
        self.emit(ViewerEvent::IndexChanged { index });
        self.warm_neighbors(PrefetchReason::IndexChange)
    }

    fn emit(&mut self, event: ViewerEvent) {
        #[cfg(feature = "streaming")]
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event.clone());
        }
        self.outbox.push_back(event);
    }

    fn warm_neighbors(&mut self, reason: PrefetchReason) -> Vec<PrefetchJob> {
        let mut requests = Vec::new();
        for index in self.carousel.prefetch_plan() {
            let Some(descriptor) = self.images.get(index) else {
                continue;
            };
            let Some(url) = resolver::resolve_display_url(
                descriptor,
                RenditionRole::Detail,
                self.tunables.detail_target_width,
            ) else {
                continue;
            };
            requests.push(PrefetchRequest {
                url: self.urls.resolve(url),
                index,
                reason,
            });
        }

        let jobs = self.scheduler.enqueue(requests);
        for job in &jobs {
            self.diagnostics
                .prefetch_started(&job.url, job.reason.as_str());
        }
        jobs
    }
}

// Only descriptors with at least one resolvable path are displayable; the
// rest never enter the session. Renditions are sorted for the resolver.
fn prepare(images: Vec<ImageDescriptor>) -> Vec<ImageDescriptor> {
    images
        .into_iter()
        .filter(ImageDescriptor::has_source)
        .map(|mut descriptor| {
            descriptor.normalize();
            descriptor
        })
        .collect()
}
