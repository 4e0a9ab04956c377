//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use couchtube::config::ConfigStore;
use couchtube::handler::SkipHandler;
use couchtube::notify::Notifier;
use couchtube::page::sim::{SimPage, SimScrubber, SimVideo};
use couchtube::segments::{Category, Segment, SegmentError, SegmentSource};

pub const SCRUBBER_HEIGHT_PX: f64 = 30.0;

pub fn segment(category: Category, start: f64, end: f64, id: &str) -> Segment {
    Segment {
        category,
        start,
        end,
        id: id.to_string(),
    }
}

/// Let spawned tasks run and timers fire under the paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

/// Notifier that records every toast for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn toasts(&self) -> Vec<(String, String)> {
        self.toasts.lock().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.toasts
            .lock()
            .iter()
            .filter(|(_, message)| message.contains(needle))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.toasts.lock().push((title.to_string(), message.to_string()));
    }
}

/// Segment source answering every lookup with a canned result.
pub struct StubSegmentSource {
    result: Mutex<Result<Vec<Segment>, SegmentError>>,
}

impl StubSegmentSource {
    pub fn new(segments: Vec<Segment>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Ok(segments)),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Err(SegmentError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ))),
        })
    }
}

#[async_trait]
impl SegmentSource for StubSegmentSource {
    async fn fetch_segments(
        &self,
        _video_id: &str,
        _categories: &[Category],
    ) -> Result<Vec<Segment>, SegmentError> {
        match &*self.result.lock() {
            Ok(segments) => Ok(segments.clone()),
            Err(SegmentError::Status(status)) => Err(SegmentError::Status(*status)),
            Err(_) => Err(SegmentError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A page with one video and one scrubber, default configuration, and a
/// recording notifier.
pub struct Harness {
    pub page: SimPage,
    pub video: Arc<SimVideo>,
    pub scrubber: Arc<SimScrubber>,
    pub config: ConfigStore,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let harness = Self::without_video();
        harness.page.set_video(Arc::clone(&harness.video));
        harness
    }

    /// Same wiring, but the video element is not yet in the document.
    pub fn without_video() -> Self {
        init_tracing();
        let page = SimPage::new();
        let scrubber = SimScrubber::new(SCRUBBER_HEIGHT_PX);
        page.set_scrubber(Arc::clone(&scrubber));
        Self {
            page,
            video: SimVideo::new(),
            scrubber,
            config: ConfigStore::default(),
            notifier: RecordingNotifier::new(),
        }
    }

    /// Build and initialize a handler for `video_id` backed by a canned
    /// segment list.
    pub async fn spawn_handler(&self, video_id: &str, segments: Vec<Segment>) -> SkipHandler {
        let handler = SkipHandler::new(
            video_id.to_string(),
            Arc::new(self.page.clone()),
            StubSegmentSource::new(segments),
            self.config.clone(),
            Arc::clone(&self.notifier) as Arc<dyn Notifier>,
        );
        handler.init().await.expect("handler init");
        handler
    }
}
