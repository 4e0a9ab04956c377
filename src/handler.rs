//! Per-video handler lifecycle.
//!
//! A [`SkipHandler`] is the live bundle of state for one video id: the
//! segment fetch, the playback engine, and the overlay renderer. At most one
//! exists at a time (owned by [`crate::navigation::App`]). Destruction is a
//! single cancellation-token cancel, which makes it idempotent and makes any
//! callback that fires afterwards a no-op.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ConfigStore;
use crate::engine::Engine;
use crate::notify::Notifier;
use crate::overlay::OverlayRenderer;
use crate::page::HostPage;
use crate::segments::{sort_by_start, Category, SegmentSource};

struct HandlerShared {
    video_id: String,
    page: Arc<dyn HostPage>,
    source: Arc<dyn SegmentSource>,
    config: ConfigStore,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl Drop for HandlerShared {
    fn drop(&mut self) {
        // Last handle gone; make sure the spawned tasks die with it.
        self.cancel.cancel();
    }
}

/// Handle to the live per-video instance. Cheap to clone.
#[derive(Clone)]
pub struct SkipHandler {
    shared: Arc<HandlerShared>,
}

impl SkipHandler {
    pub fn new(
        video_id: String,
        page: Arc<dyn HostPage>,
        source: Arc<dyn SegmentSource>,
        config: ConfigStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            shared: Arc::new(HandlerShared {
                video_id,
                page,
                source,
                config,
                notifier,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.shared.video_id
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Fetch segments and spawn the engine and overlay tasks.
    ///
    /// A fetch failure is surfaced to the caller, which degrades by leaving
    /// the feature inert for this video. An empty segment list is the common
    /// case and returns quietly without spawning anything.
    pub async fn init(&self) -> Result<()> {
        let shared = &self.shared;

        let mut segments = tokio::select! {
            _ = shared.cancel.cancelled() => return Ok(()),
            fetched = shared
                .source
                .fetch_segments(&shared.video_id, &Category::ALL) =>
            {
                fetched.context("skip segment lookup failed")?
            }
        };

        if shared.cancel.is_cancelled() {
            return Ok(());
        }

        if segments.is_empty() {
            debug!(video_id = %shared.video_id, "no segments for video");
            return Ok(());
        }

        sort_by_start(&mut segments);
        info!(
            video_id = %shared.video_id,
            count = segments.len(),
            "segments loaded"
        );

        let (duration_tx, duration_rx) = watch::channel(None);

        let engine = Engine::new(
            shared.video_id.clone(),
            Arc::clone(&shared.page),
            shared.config.clone(),
            Arc::clone(&shared.notifier),
            segments.clone(),
            duration_tx,
            shared.cancel.clone(),
        );
        let renderer = OverlayRenderer::new(
            shared.video_id.clone(),
            Arc::clone(&shared.page),
            shared.config.clone(),
            segments,
            duration_rx,
            shared.cancel.clone(),
        );

        tokio::spawn(engine.run());
        tokio::spawn(renderer.run());

        Ok(())
    }

    /// Tear the instance down: cancel pending alarms and poll timers, detach
    /// listeners, remove the overlay. Safe to call any number of times.
    pub fn destroy(&self) {
        if !self.shared.cancel.is_cancelled() {
            info!(video_id = %self.shared.video_id, "destroying handler");
        }
        self.shared.cancel.cancel();
    }
}
