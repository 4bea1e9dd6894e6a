#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Vista - interactive multi-resolution image viewer core
//!
//! This library provides the state machinery behind a listing image viewer:
//! a carousel with throttled swipe/keyboard navigation, a directional
//! prefetch scheduler with bounded concurrency, a fullscreen zoom/pan
//! viewport with clamped bounds and on-the-fly resolution upgrades, and a
//! minimap overlay. The host UI owns rendering, real timers, and network;
//! the core owns every decision about state, geometry, and scheduling.

pub mod carousel;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod frame;
pub mod minimap;
pub mod prefetch;
pub mod resolver;
pub mod session;
pub mod urls;
pub mod viewport;

#[cfg(feature = "streaming")]
pub mod loader;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use carousel::{CarouselController, HeroLoad, SwipeDirection};
pub use config::{Millis, ViewerTunables};
pub use descriptor::{ImageDescriptor, Rendition, RenditionRole};
pub use diagnostics::Diagnostics;
pub use error::{Result, ViewerError};
pub use events::ViewerEvent;
pub use frame::FrameCoalescer;
pub use minimap::{minimap, MinimapView};
pub use prefetch::{PrefetchJob, PrefetchReason, PrefetchRequest, PrefetchScheduler};
pub use session::{HostListener, Key, SessionOptions, SubscriptionHandle, ViewerSession, ViewerState};
pub use urls::UrlResolver;
pub use viewport::{
    geometry, Point, Size, UpgradeRequest, ViewportGeometry, ZoomPanViewport, ZOOM_EPSILON,
};

/// Preferred rendition encoding
pub const PREFERRED_ENCODING: &str = "webp";

/// Maximum simultaneous prefetch loads per session generation
pub const PREFETCH_CONCURRENCY: usize = 2;

/// Target pixel width for card/grid thumbnails
pub const GRID_TARGET_WIDTH: u32 = 600;

/// Target pixel width for the primary hero image
pub const DETAIL_TARGET_WIDTH: u32 = 1200;

/// Minimum zoom level (the fitted view)
pub const MIN_ZOOM: f32 = 1.0;
