//! Scrubber overlay rendering.
//!
//! The renderer is a three-state machine. `Absent` until the video duration
//! is known (region geometry needs it), `Building` while polling for the
//! host's scrubber control, `Attached` once the overlay node is inserted.
//! While attached it watches the scrubber's mutations: a host-page removal of
//! the overlay is answered by immediate re-insertion, and material height
//! changes are resynchronized.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::page::{
    HostPage, OverlayId, OverlayRegion, OverlayView, PageLayout, ScrubberControl, ScrubberEvent,
};
use crate::segments::Segment;

/// Height changes at or below this are sub-pixel jitter and ignored.
const HEIGHT_TOLERANCE_PX: f64 = 0.5;
/// Scrubbers report degenerate sizes while hidden; fall back below this.
const MIN_USABLE_HEIGHT_PX: f64 = 10.0;
const FALLBACK_HEIGHT_PX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayState {
    Absent,
    Building,
    Attached,
}

/// Compute the overlay node for a segment list against a known duration.
///
/// Regions are positioned proportionally: `left = 100 * start / duration`,
/// `width = 100 * (end - start) / duration`, colored by category.
pub fn build_view(
    segments: &[Segment],
    duration: f64,
    height_px: f64,
    layout: PageLayout,
) -> OverlayView {
    let regions = segments
        .iter()
        .map(|segment| {
            let style = segment.category.style();
            OverlayRegion {
                left_pct: 100.0 * segment.start / duration,
                width_pct: 100.0 * segment.duration() / duration,
                color: style.color,
                opacity: style.opacity,
            }
        })
        .collect();

    OverlayView {
        height_px,
        layout,
        regions,
    }
}

pub(crate) struct OverlayRenderer {
    video_id: String,
    page: Arc<dyn HostPage>,
    config: ConfigStore,
    segments: Vec<Segment>,
    duration_rx: watch::Receiver<Option<f64>>,
    cancel: CancellationToken,
    state: OverlayState,
}

impl OverlayRenderer {
    pub(crate) fn new(
        video_id: String,
        page: Arc<dyn HostPage>,
        config: ConfigStore,
        segments: Vec<Segment>,
        duration_rx: watch::Receiver<Option<f64>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            video_id,
            page,
            config,
            segments,
            duration_rx,
            cancel,
            state: OverlayState::Absent,
        }
    }

    pub(crate) async fn run(mut self) {
        let Some(duration) = self.wait_for_duration().await else {
            return;
        };

        self.state = OverlayState::Building;
        let Some(scrubber) = self.wait_for_scrubber().await else {
            return;
        };

        let page_config = self.config.page();
        let height = match scrubber.height() {
            h if h > MIN_USABLE_HEIGHT_PX => h,
            _ => FALLBACK_HEIGHT_PX,
        };
        let layout = if self.page.matches(&page_config.layout_probe_selector) {
            PageLayout::Modern
        } else {
            PageLayout::Legacy
        };

        let view = build_view(&self.segments, duration, height, layout);
        let id = OverlayId::new_v4();
        scrubber.insert_overlay(id, view.clone());
        self.state = OverlayState::Attached;
        info!(
            video_id = %self.video_id,
            regions = view.regions.len(),
            height,
            ?layout,
            "segment overlay attached"
        );

        self.defend(scrubber, id, view).await;
    }

    /// Block until a positive duration is reported. `None` on destruction.
    async fn wait_for_duration(&mut self) -> Option<f64> {
        loop {
            if let Some(duration) = *self.duration_rx.borrow() {
                if duration > 0.0 {
                    return Some(duration);
                }
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                changed = self.duration_rx.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    /// Poll until the scrubber control exists. `None` on destruction.
    async fn wait_for_scrubber(&self) -> Option<Arc<dyn ScrubberControl>> {
        let page_config = self.config.page();
        let interval = Duration::from_millis(page_config.scrubber_poll_interval_ms);

        loop {
            if let Some(scrubber) = self.page.query_scrubber(&page_config.scrubber_selector) {
                return Some(scrubber);
            }
            debug!(video_id = %self.video_id, "scrubber not present yet");
            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = sleep(interval) => {}
            }
        }
    }

    /// Keep the attached overlay alive against the host page until teardown.
    async fn defend(
        &mut self,
        scrubber: Arc<dyn ScrubberControl>,
        id: OverlayId,
        mut view: OverlayView,
    ) {
        let mut events = scrubber.subscribe();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    scrubber.remove_overlay(id);
                    self.state = OverlayState::Absent;
                    debug!(video_id = %self.video_id, "overlay removed on teardown");
                    return;
                }

                event = events.recv() => match event {
                    Ok(ScrubberEvent::OverlayRemoved(removed)) if removed == id => {
                        info!(video_id = %self.video_id, "overlay evicted by host page, re-inserting");
                        scrubber.insert_overlay(id, view.clone());
                    }
                    Ok(ScrubberEvent::Resized(height)) => {
                        if (height - view.height_px).abs() > HEIGHT_TOLERANCE_PX {
                            view.height_px = height;
                            scrubber.set_overlay_height(id, height);
                            debug!(video_id = %self.video_id, height, "overlay height resynchronized");
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(video_id = %self.video_id, missed, "scrubber mutation stream lagged");
                        if !scrubber.has_overlay(id) {
                            scrubber.insert_overlay(id, view.clone());
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        self.state = OverlayState::Absent;
                        return;
                    }
                },
            }
        }
    }
}
