//! In-memory host page.
//!
//! A deterministic stand-in for the third-party document, used by the
//! integration tests to play the hostile party: it can delay element
//! creation, replace the video mid-session, rip the overlay back out, and
//! resize the scrubber. Behavior-preserving with respect to the traits in
//! [`crate::page`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use super::{
    HostPage, OverlayId, OverlayView, PlayerEvent, ScrubberControl, ScrubberEvent, VideoElement,
};

const EVENT_CAPACITY: usize = 64;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Video element
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct VideoState {
    current_time: f64,
    duration: Option<f64>,
    paused: bool,
    connected: bool,
}

/// Simulated `<video>` element with script-controlled playback.
pub struct SimVideo {
    element_id: u64,
    state: RwLock<VideoState>,
    events: broadcast::Sender<PlayerEvent>,
    seeks: Mutex<Vec<f64>>,
}

impl SimVideo {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            element_id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(VideoState {
                current_time: 0.0,
                duration: None,
                paused: true,
                connected: true,
            }),
            events,
            seeks: Mutex::new(Vec::new()),
        })
    }

    pub fn play(&self) {
        self.state.write().paused = false;
        let _ = self.events.send(PlayerEvent::Play);
    }

    pub fn pause(&self) {
        self.state.write().paused = true;
        let _ = self.events.send(PlayerEvent::Pause);
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.write().duration = Some(duration);
        let _ = self.events.send(PlayerEvent::DurationChange(duration));
    }

    /// Move the playhead as ordinary playback progress would.
    pub fn advance_to(&self, position: f64) {
        self.state.write().current_time = position;
        let _ = self.events.send(PlayerEvent::TimeUpdate(position));
    }

    /// Seek destinations requested through [`VideoElement::seek`], in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().clone()
    }

    /// Detach the element from the document, as the page does when it swaps
    /// players. Closes the event stream.
    pub fn disconnect(&self) {
        self.state.write().connected = false;
    }
}

impl VideoElement for SimVideo {
    fn element_id(&self) -> u64 {
        self.element_id
    }

    fn current_time(&self) -> f64 {
        self.state.read().current_time
    }

    fn duration(&self) -> Option<f64> {
        self.state.read().duration
    }

    fn paused(&self) -> bool {
        self.state.read().paused
    }

    fn seek(&self, position: f64) {
        self.seeks.lock().push(position);
        self.state.write().current_time = position;
        let _ = self.events.send(PlayerEvent::TimeUpdate(position));
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.state.read().connected
    }
}

// ---------------------------------------------------------------------------
// Scrubber control
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ScrubberState {
    height: f64,
    overlays: HashMap<OverlayId, OverlayView>,
}

/// Simulated progress bar that can evict overlays and change size.
pub struct SimScrubber {
    state: RwLock<ScrubberState>,
    events: broadcast::Sender<ScrubberEvent>,
}

impl SimScrubber {
    pub fn new(height: f64) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(ScrubberState {
                height,
                overlays: HashMap::new(),
            }),
            events,
        })
    }

    /// Host-page removal of a child node, observed as a mutation.
    pub fn host_remove_overlay(&self, id: OverlayId) {
        if self.state.write().overlays.remove(&id).is_some() {
            let _ = self.events.send(ScrubberEvent::OverlayRemoved(id));
        }
    }

    pub fn set_height(&self, height: f64) {
        self.state.write().height = height;
        let _ = self.events.send(ScrubberEvent::Resized(height));
    }

    pub fn overlay(&self, id: OverlayId) -> Option<OverlayView> {
        self.state.read().overlays.get(&id).cloned()
    }

    /// All currently attached overlays, for assertions.
    pub fn overlays(&self) -> Vec<(OverlayId, OverlayView)> {
        self.state
            .read()
            .overlays
            .iter()
            .map(|(id, view)| (*id, view.clone()))
            .collect()
    }
}

impl ScrubberControl for SimScrubber {
    fn insert_overlay(&self, id: OverlayId, view: OverlayView) {
        self.state.write().overlays.insert(id, view);
    }

    fn has_overlay(&self, id: OverlayId) -> bool {
        self.state.read().overlays.contains_key(&id)
    }

    fn remove_overlay(&self, id: OverlayId) {
        self.state.write().overlays.remove(&id);
    }

    fn set_overlay_height(&self, id: OverlayId, height_px: f64) {
        if let Some(view) = self.state.write().overlays.get_mut(&id) {
            view.height_px = height_px;
        }
    }

    fn height(&self) -> f64 {
        self.state.read().height
    }

    fn subscribe(&self) -> broadcast::Receiver<ScrubberEvent> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SimPageState {
    video: Option<Arc<SimVideo>>,
    scrubber: Option<Arc<SimScrubber>>,
    present_selectors: Vec<String>,
}

/// Simulated document. Elements appear and disappear under script control.
#[derive(Clone, Default)]
pub struct SimPage {
    state: Arc<RwLock<SimPageState>>,
}

impl SimPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_video(&self, video: Arc<SimVideo>) {
        let mut state = self.state.write();
        if let Some(old) = state.video.take() {
            old.disconnect();
        }
        state.video = Some(video);
    }

    pub fn remove_video(&self) {
        if let Some(old) = self.state.write().video.take() {
            old.disconnect();
        }
    }

    pub fn set_scrubber(&self, scrubber: Arc<SimScrubber>) {
        self.state.write().scrubber = Some(scrubber);
    }

    /// Make `selector` match, for layout probing.
    pub fn add_selector(&self, selector: &str) {
        self.state.write().present_selectors.push(selector.to_string());
    }
}

impl HostPage for SimPage {
    fn query_video(&self, _selector: &str) -> Option<Arc<dyn VideoElement>> {
        let state = self.state.read();
        state
            .video
            .as_ref()
            .map(|v| Arc::clone(v) as Arc<dyn VideoElement>)
    }

    fn query_scrubber(&self, _selector: &str) -> Option<Arc<dyn ScrubberControl>> {
        let state = self.state.read();
        state
            .scrubber
            .as_ref()
            .map(|s| Arc::clone(s) as Arc<dyn ScrubberControl>)
    }

    fn matches(&self, selector: &str) -> bool {
        self.state
            .read()
            .present_selectors
            .iter()
            .any(|s| s == selector)
    }
}
