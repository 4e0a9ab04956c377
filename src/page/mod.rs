//! Host page abstraction.
//!
//! The engine does not own the page it decorates: the video element and the
//! scrubber control belong to a third-party web interface that creates,
//! replaces, and removes them on its own schedule. These traits are the
//! engine's only view of that page. Selectors stay configurable data
//! ([`crate::config::PageConfig`]) because the host markup is not a stable
//! contract.
//!
//! DOM event listeners and mutation observers map onto broadcast channels:
//! subscribing is attaching a listener, dropping the receiver detaches it.

pub mod sim;

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

/// Identity of an overlay node inserted into the scrubber.
pub type OverlayId = Uuid;

/// Playback event emitted by the page's video element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Play,
    Pause,
    /// Playback position moved; carries the new position in seconds.
    TimeUpdate(f64),
    /// Media duration became known or changed; seconds.
    DurationChange(f64),
}

/// Structural change observed on the scrubber control's subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubberEvent {
    /// A child overlay node was removed by the host page.
    OverlayRemoved(OverlayId),
    /// The scrubber's bounding size changed; carries the new height in px.
    Resized(f64),
}

/// Which of the two known host UI layouts is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// Older markup; the shell anchors the overlay to the scrubber's own top.
    Legacy,
    Modern,
}

/// One colored region of the segment overlay, proportional to the video.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRegion {
    /// `100 * start / duration`.
    pub left_pct: f64,
    /// `100 * (end - start) / duration`.
    pub width_pct: f64,
    pub color: &'static str,
    pub opacity: f32,
}

/// The overlay node as handed to the scrubber control for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub height_px: f64,
    pub layout: PageLayout,
    pub regions: Vec<OverlayRegion>,
}

/// Non-owning view of the page's `<video>` element.
///
/// The page may destroy or replace the element at any time; callers must
/// treat every handle as possibly stale and re-query through [`HostPage`].
pub trait VideoElement: Send + Sync {
    /// Stable for the lifetime of one underlying element; a replacement
    /// element gets a different id.
    fn element_id(&self) -> u64;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Media duration in seconds, `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;

    fn paused(&self) -> bool;

    /// Move the playhead. Fire-and-forget; the element reports the result
    /// through a subsequent [`PlayerEvent::TimeUpdate`].
    fn seek(&self, position: f64);

    /// Attach a playback listener. The sender side closes when the element
    /// is torn down.
    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent>;

    /// False once the page has detached this element from the document.
    fn is_connected(&self) -> bool;
}

/// Non-owning view of the page's progress/seek bar.
pub trait ScrubberControl: Send + Sync {
    /// Insert (or re-insert) an overlay node as a child of the scrubber.
    fn insert_overlay(&self, id: OverlayId, view: OverlayView);

    fn has_overlay(&self, id: OverlayId) -> bool;

    fn remove_overlay(&self, id: OverlayId);

    fn set_overlay_height(&self, id: OverlayId, height_px: f64);

    /// Current bounding height in px; may be degenerate while hidden.
    fn height(&self) -> f64;

    /// Observe structural mutations and resizes of the scrubber subtree.
    fn subscribe(&self) -> broadcast::Receiver<ScrubberEvent>;
}

/// The host document, queried by configurable selectors.
pub trait HostPage: Send + Sync {
    /// Resolve the page's video element, if it exists yet.
    fn query_video(&self, selector: &str) -> Option<Arc<dyn VideoElement>>;

    /// Resolve the scrubber control, if it exists yet.
    fn query_scrubber(&self, selector: &str) -> Option<Arc<dyn ScrubberControl>>;

    /// Whether any element matches `selector`; used to probe the UI layout.
    fn matches(&self, selector: &str) -> bool;
}
