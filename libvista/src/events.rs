//! Host-facing viewer events.

use serde::Serialize;

use crate::config::Millis;

/// Externally observable session events. Index changes drive host-level UI
/// (counters, thumbnail strip); hero-loaded coordinates loading states.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewerEvent {
    IndexChanged { index: usize },
    HeroLoaded { index: usize, latency_ms: Option<Millis> },
}

#[cfg(feature = "streaming")]
pub use stream::EventStream;

#[cfg(feature = "streaming")]
mod stream {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::Stream;
    use pin_project::pin_project;
    use tokio::sync::mpsc;

    use super::ViewerEvent;

    /// Async stream of viewer events for hosts that drain them with a task
    /// instead of polling the session outbox
    #[pin_project]
    pub struct EventStream {
        rx: mpsc::UnboundedReceiver<ViewerEvent>,
    }

    impl EventStream {
        /// Creates the stream and the sender side the session feeds
        pub fn channel() -> (mpsc::UnboundedSender<ViewerEvent>, Self) {
            let (tx, rx) = mpsc::unbounded_channel();
            (tx, Self { rx })
        }
    }

    impl Stream for EventStream {
        type Item = ViewerEvent;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.project().rx.poll_recv(cx)
        }
    }
}
