//! Navigation watching and application context.
//!
//! The host interface is a single-page application that signals route changes
//! through its location fragment. [`App`] owns the collaborators and at most
//! one live [`SkipHandler`]; every navigation signal is parsed for a video id
//! and the handler is rebuilt only when the id actually changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ConfigStore;
use crate::handler::SkipHandler;
use crate::notify::Notifier;
use crate::page::HostPage;
use crate::segments::SegmentSource;

/// Extract the video id from a location like
/// `https://host/tv#/watch?v=dQw4w9WgXcQ&resume`.
///
/// The route lives in the fragment; its query string carries the id under
/// `v`. Anything unparsable yields `None`.
pub fn parse_video_id(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let fragment = url.fragment()?;
    let route = url.join(fragment).ok()?;
    let id = route
        .query_pairs()
        .find_map(|(key, value)| (key == "v").then(|| value.into_owned()))?;
    (!id.is_empty()).then_some(id)
}

/// Application context: the one place that owns the current handler.
pub struct App {
    config: ConfigStore,
    page: Arc<dyn HostPage>,
    source: Arc<dyn SegmentSource>,
    notifier: Arc<dyn Notifier>,
    current: Option<SkipHandler>,
}

impl App {
    pub fn new(
        config: ConfigStore,
        page: Arc<dyn HostPage>,
        source: Arc<dyn SegmentSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            page,
            source,
            notifier,
            current: None,
        }
    }

    pub fn current_video_id(&self) -> Option<&str> {
        self.current.as_ref().map(|h| h.video_id())
    }

    /// React to one navigation signal from the shell.
    ///
    /// Unrelated signals for the same video are common (the host fires
    /// several per route change) and must not re-fetch or re-bind.
    pub fn handle_navigation(&mut self, location: &str) -> Option<SkipHandler> {
        let video_id = parse_video_id(location)?;

        if self.current_video_id() == Some(video_id.as_str()) {
            debug!(video_id = %video_id, "navigation within the same video");
            return None;
        }

        if let Some(previous) = self.current.take() {
            previous.destroy();
        }

        if !self.config.sponsorblock().enabled {
            info!("SponsorBlock disabled, not creating a handler");
            return None;
        }

        let handler = SkipHandler::new(
            video_id,
            Arc::clone(&self.page),
            Arc::clone(&self.source),
            self.config.clone(),
            Arc::clone(&self.notifier),
        );
        self.current = Some(handler.clone());

        // Initialization runs detached; a failure disables the feature for
        // this video but must never take the page down with it.
        let init_handle = handler.clone();
        tokio::spawn(async move {
            if let Err(error) = init_handle.init().await {
                warn!(
                    video_id = %init_handle.video_id(),
                    error = %error,
                    "handler initialization failed, feature inert for this video"
                );
            }
        });

        Some(handler)
    }

    /// Consume navigation signals until the shell closes the channel, then
    /// tear down the last handler.
    pub async fn run(mut self, mut navigations: mpsc::Receiver<String>) {
        while let Some(location) = navigations.recv().await {
            self.handle_navigation(&location);
        }
        if let Some(handler) = self.current.take() {
            handler.destroy();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(handler) = self.current.take() {
            handler.destroy();
        }
    }
}
