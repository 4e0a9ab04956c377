//! Playback binding and skip scheduling.
//!
//! One [`Engine`] task runs per live handler. It binds to the page's video
//! element (polling until it exists, rebinding when the page replaces it) and
//! drives an explicit alarm state machine: from every playback event it
//! computes the next actionable segment boundary, arms a single-shot alarm
//! for it, and on fire re-validates pause state and policy before seeking.
//! Cancellation is a token checked in every `select!` arm, so a stray wakeup
//! after the handler is destroyed is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{sleep, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::notify::Notifier;
use crate::page::{HostPage, PlayerEvent, VideoElement};
use crate::policy::CategoryPolicy;
use crate::segments::Segment;

/// Seeking closer than this to the end of the stream can stall playback.
const END_GUARD_SECS: f64 = 1.0;

/// Bookkeeping for one already-auto-skipped segment id. Cleared with the
/// handler; never persisted across videos.
#[derive(Debug, Clone)]
pub struct SkipRecord {
    pub times_skipped: u32,
    pub first_skipped_at: Instant,
    pub last_skipped_at: Instant,
    pub toast_shown: bool,
}

/// The next segment the scheduler should act on: the earliest-starting
/// segment whose boundary is still ahead of the playhead. `tolerance` looks
/// back slightly so a segment whose start just slipped past (a timeupdate
/// racing an armed alarm) still fires, at worst immediately. A segment the
/// playhead is already deep inside is left alone; re-selecting it after its
/// own skip lands at `end` would re-fire the alarm in a loop.
pub fn next_pending(segments: &[Segment], current_time: f64, tolerance: f64) -> Option<&Segment> {
    segments
        .iter()
        .filter(|s| s.start > current_time - tolerance)
        .min_by(|a, b| a.start.total_cmp(&b.start))
}

/// Seek destination for a skipped segment, guarded away from end-of-stream.
pub fn skip_destination(segment: &Segment, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d - segment.end < END_GUARD_SECS => d - END_GUARD_SECS,
        _ => segment.end,
    }
}

/// Sleep until the alarm deadline, or forever while disarmed.
async fn alarm(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => futures::future::pending().await,
    }
}

pub(crate) struct Engine {
    video_id: String,
    page: Arc<dyn HostPage>,
    config: ConfigStore,
    notifier: Arc<dyn Notifier>,
    /// Sorted by start time.
    segments: Vec<Segment>,
    duration_tx: watch::Sender<Option<f64>>,
    cancel: CancellationToken,
    records: HashMap<String, SkipRecord>,
}

impl Engine {
    pub(crate) fn new(
        video_id: String,
        page: Arc<dyn HostPage>,
        config: ConfigStore,
        notifier: Arc<dyn Notifier>,
        segments: Vec<Segment>,
        duration_tx: watch::Sender<Option<f64>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            video_id,
            page,
            config,
            notifier,
            segments,
            duration_tx,
            cancel,
            records: HashMap::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let Some(video) = self.wait_for_video().await else {
                return;
            };
            info!(
                video_id = %self.video_id,
                element = video.element_id(),
                "video element bound"
            );

            if let Some(duration) = video.duration() {
                let _ = self.duration_tx.send(Some(duration));
            }

            if !self.drive(&video).await {
                return;
            }
            debug!(video_id = %self.video_id, "video element lost, searching again");
        }
    }

    /// Poll until the page grows a video element. `None` means the handler
    /// was destroyed first; there is no other give-up condition.
    async fn wait_for_video(&self) -> Option<Arc<dyn VideoElement>> {
        let page_config = self.config.page();
        let interval = Duration::from_millis(page_config.video_poll_interval_ms);

        loop {
            if let Some(video) = self.page.query_video(&page_config.video_selector) {
                if video.is_connected() {
                    return Some(video);
                }
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = sleep(interval) => {}
            }
        }
    }

    /// Event loop against one bound element. Returns `false` when the handler
    /// was destroyed, `true` when the element went away and the binder should
    /// search again.
    async fn drive(&mut self, video: &Arc<dyn VideoElement>) -> bool {
        let mut events = video.subscribe();

        let mut liveness = tokio::time::interval(Duration::from_millis(
            self.config.page().video_poll_interval_ms,
        ));
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut deadline = self.reschedule(video.as_ref());

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,

                event = events.recv() => match event {
                    Ok(PlayerEvent::DurationChange(duration)) => {
                        let _ = self.duration_tx.send(Some(duration));
                        // Duration can move the end-of-stream guard.
                        deadline = self.reschedule(video.as_ref());
                    }
                    Ok(_) => {
                        deadline = self.reschedule(video.as_ref());
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(video_id = %self.video_id, missed, "player event stream lagged");
                        deadline = self.reschedule(video.as_ref());
                    }
                    Err(broadcast::error::RecvError::Closed) => return true,
                },

                _ = alarm(deadline) => {
                    // An aborted or suppressed skip must not re-arm for the
                    // same boundary; the next player event re-arms instead.
                    deadline = if self.fire(video.as_ref()) {
                        self.reschedule(video.as_ref())
                    } else {
                        None
                    };
                }

                _ = liveness.tick() => {
                    if !video.is_connected() {
                        return true;
                    }
                }
            }
        }
    }

    /// Compute the next alarm deadline from current playback state. Paused
    /// playback disarms the alarm entirely.
    fn reschedule(&self, video: &dyn VideoElement) -> Option<Instant> {
        if video.paused() {
            debug!(video_id = %self.video_id, "paused, alarm disarmed");
            return None;
        }

        let tolerance = self.config.sponsorblock().skip_tolerance_secs;
        let position = video.current_time();
        let segment = next_pending(&self.segments, position, tolerance)?;

        // A boundary already behind us fires on the next tick.
        let delay = (segment.start - position).max(0.0);
        debug!(
            video_id = %self.video_id,
            segment = %segment.id,
            delay_secs = delay,
            "skip alarm armed"
        );
        Some(Instant::now() + Duration::from_secs_f64(delay))
    }

    /// Alarm callback: re-validate everything that may have changed since the
    /// alarm was armed, then seek past the segment. Returns whether a seek was
    /// performed.
    fn fire(&mut self, video: &dyn VideoElement) -> bool {
        if video.paused() {
            return false;
        }

        let sponsorblock = self.config.sponsorblock();
        let position = video.current_time();
        let Some(segment) =
            next_pending(&self.segments, position, sponsorblock.skip_tolerance_secs).cloned()
        else {
            return false;
        };

        // Policy is re-derived at fire time; a flag flipped after arming
        // silently aborts the skip.
        let policy = CategoryPolicy::from_config(&sponsorblock);
        if !policy.is_skippable(segment.category) {
            debug!(
                video_id = %self.video_id,
                segment = %segment.id,
                category = ?segment.category,
                "segment no longer skippable, ignoring"
            );
            return false;
        }
        if policy.is_manual(segment.category) {
            debug!(
                video_id = %self.video_id,
                segment = %segment.id,
                "manual category, leaving skip to the user"
            );
            return false;
        }

        let label = segment.category.style().label;
        let now = Instant::now();
        let window = Duration::from_millis(sponsorblock.repeat_skip_window_ms);

        if let Some(record) = self.records.get_mut(&segment.id) {
            let since_last = now.duration_since(record.last_skipped_at);
            record.times_skipped += 1;
            record.last_skipped_at = now;

            // Immediate re-entry means the player bounced straight back into
            // the segment (seek loop or metadata bug). Stop fighting it.
            if since_last < window {
                if !record.toast_shown {
                    record.toast_shown = true;
                    self.notifier.notify(
                        "SponsorBlock",
                        &format!(
                            "Not skipping {label} (was skipped {} times)",
                            record.times_skipped
                        ),
                    );
                }
                debug!(
                    video_id = %self.video_id,
                    segment = %segment.id,
                    times_skipped = record.times_skipped,
                    "suppressing repeat skip"
                );
                return false;
            }
        } else {
            self.records.insert(
                segment.id.clone(),
                SkipRecord {
                    times_skipped: 1,
                    first_skipped_at: now,
                    last_skipped_at: now,
                    toast_shown: false,
                },
            );
        }

        let target = skip_destination(&segment, video.duration());
        info!(
            video_id = %self.video_id,
            segment = %segment.id,
            category = ?segment.category,
            from = position,
            to = target,
            "skipping segment"
        );
        video.seek(target);
        self.notifier.notify("SponsorBlock", &format!("Skipping {label}"));
        true
    }
}
