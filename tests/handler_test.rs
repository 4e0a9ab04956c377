//! End-to-end scenarios on the simulated host page under a paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use common::{segment, settle, Harness, RecordingNotifier, StubSegmentSource};
use couchtube::handler::SkipHandler;
use couchtube::navigation::App;
use couchtube::notify::Notifier;
use couchtube::page::sim::{SimScrubber, SimVideo};
use couchtube::page::PageLayout;
use couchtube::segments::Category;

// ---------------------------------------------------------------------------
// Skip scheduling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn skips_segments_in_playback_order() {
    let h = Harness::new();
    h.config
        .update_sponsorblock(|sb| sb.manual_skip_categories.clear());
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler(
            "vid",
            vec![
                segment(Category::Sponsor, 10.0, 20.0, "s"),
                segment(Category::Intro, 0.0, 5.0, "i"),
            ],
        )
        .await;
    settle().await;

    h.video.play();
    settle().await;
    assert_eq!(h.video.seeks(), vec![5.0]);

    // The sponsor boundary is five seconds past the intro's end.
    sleep(Duration::from_secs(6)).await;
    assert_eq!(h.video.seeks(), vec![5.0, 20.0]);
    assert_eq!(h.notifier.count_containing("Skipping intro"), 1);
    assert_eq!(h.notifier.count_containing("Skipping sponsored segment"), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_categories_are_left_to_the_user() {
    let h = Harness::new();
    // Default configuration marks intro as manual.
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler(
            "vid",
            vec![
                segment(Category::Intro, 0.0, 5.0, "i"),
                segment(Category::Sponsor, 10.0, 20.0, "s"),
            ],
        )
        .await;
    settle().await;

    h.video.play();
    settle().await;
    assert!(h.video.seeks().is_empty());

    h.video.advance_to(9.9);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(h.video.seeks(), vec![20.0]);
    assert_eq!(h.notifier.count_containing("Skipping intro"), 0);
}

#[tokio::test(start_paused = true)]
async fn disabled_category_is_not_skipped() {
    let h = Harness::new();
    h.config.update_sponsorblock(|sb| sb.skip_sponsor = false);
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;

    h.video.play();
    h.video.advance_to(9.9);
    sleep(Duration::from_millis(200)).await;
    assert!(h.video.seeks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn paused_playback_disarms_the_alarm() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;

    h.video.play();
    h.video.advance_to(8.0);
    settle().await;
    h.video.pause();
    sleep(Duration::from_secs(10)).await;
    assert!(h.video.seeks().is_empty());

    h.video.play();
    sleep(Duration::from_secs(3)).await;
    assert_eq!(h.video.seeks(), vec![20.0]);
}

#[tokio::test(start_paused = true)]
async fn repeated_reentry_is_damped_and_notified_once() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;

    h.video.play();
    h.video.advance_to(9.9);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(h.video.seeks(), vec![20.0]);

    // The player bounces straight back in front of the segment, twice.
    h.video.advance_to(10.1);
    settle().await;
    h.video.advance_to(10.2);
    settle().await;

    assert_eq!(h.video.seeks(), vec![20.0]);
    assert_eq!(h.notifier.count_containing("Skipping sponsored segment"), 1);
    assert_eq!(h.notifier.count_containing("Not skipping"), 1);

    // Outside the re-entry window the skip is honored again.
    sleep(Duration::from_millis(1500)).await;
    h.video.advance_to(10.1);
    settle().await;
    assert_eq!(h.video.seeks(), vec![20.0, 20.0]);
    assert_eq!(h.notifier.count_containing("Skipping sponsored segment"), 2);
}

#[tokio::test(start_paused = true)]
async fn skip_near_stream_end_backs_off_one_second() {
    let h = Harness::new();
    h.video.set_duration(60.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 59.5, "s")])
        .await;
    settle().await;

    h.video.play();
    h.video.advance_to(9.9);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(h.video.seeks(), vec![59.0]);
}

// ---------------------------------------------------------------------------
// Video element lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn binds_to_a_video_element_that_appears_late() {
    let h = Harness::without_video();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 0.0, 5.0, "s")])
        .await;
    sleep(Duration::from_millis(500)).await;
    assert!(h.scrubber.overlays().is_empty());

    h.page.set_video(Arc::clone(&h.video));
    sleep(Duration::from_millis(300)).await;
    assert_eq!(h.scrubber.overlays().len(), 1);

    h.video.play();
    settle().await;
    assert_eq!(h.video.seeks(), vec![5.0]);
}

#[tokio::test(start_paused = true)]
async fn rebinds_when_the_page_replaces_the_video() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 0.0, 5.0, "s")])
        .await;
    settle().await;

    h.video.play();
    settle().await;
    assert_eq!(h.video.seeks(), vec![5.0]);

    // Swap players, past the damping window of the first skip.
    sleep(Duration::from_millis(1500)).await;
    let replacement = SimVideo::new();
    replacement.set_duration(100.0);
    h.page.set_video(Arc::clone(&replacement));
    sleep(Duration::from_millis(300)).await;

    replacement.play();
    settle().await;
    assert_eq!(replacement.seeks(), vec![5.0]);
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn overlay_regions_are_proportional_to_duration() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler(
            "vid",
            vec![
                segment(Category::Intro, 0.0, 5.0, "i"),
                segment(Category::Sponsor, 50.0, 75.0, "s"),
            ],
        )
        .await;
    settle().await;

    let overlays = h.scrubber.overlays();
    assert_eq!(overlays.len(), 1);
    let view = &overlays[0].1;
    assert_eq!(view.height_px, common::SCRUBBER_HEIGHT_PX);
    assert_eq!(view.layout, PageLayout::Legacy);
    assert_eq!(view.regions.len(), 2);
    assert_eq!(view.regions[0].left_pct, 0.0);
    assert_eq!(view.regions[0].width_pct, 5.0);
    assert_eq!(view.regions[1].left_pct, 50.0);
    assert_eq!(view.regions[1].width_pct, 25.0);
}

#[tokio::test(start_paused = true)]
async fn overlay_waits_for_a_known_duration() {
    let h = Harness::new();

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    sleep(Duration::from_secs(2)).await;
    assert!(h.scrubber.overlays().is_empty());

    h.video.set_duration(100.0);
    settle().await;
    assert_eq!(h.scrubber.overlays().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn overlay_is_reinserted_after_host_removal() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;

    let id = h.scrubber.overlays()[0].0;
    h.scrubber.host_remove_overlay(id);
    settle().await;
    assert!(h.scrubber.overlay(id).is_some());
}

#[tokio::test(start_paused = true)]
async fn overlay_height_follows_material_scrubber_resizes() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;
    let id = h.scrubber.overlays()[0].0;

    h.scrubber.set_height(44.0);
    settle().await;
    assert_eq!(h.scrubber.overlay(id).unwrap().height_px, 44.0);

    // Sub-pixel jitter is ignored.
    h.scrubber.set_height(44.3);
    settle().await;
    assert_eq!(h.scrubber.overlay(id).unwrap().height_px, 44.0);
}

#[tokio::test(start_paused = true)]
async fn degenerate_scrubber_height_falls_back() {
    let h = Harness::new();
    h.video.set_duration(100.0);
    let hidden = SimScrubber::new(4.0);
    h.page.set_scrubber(Arc::clone(&hidden));

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;

    assert_eq!(hidden.overlays()[0].1.height_px, 20.0);
}

#[tokio::test(start_paused = true)]
async fn layout_probe_selects_the_modern_variant() {
    let h = Harness::new();
    h.video.set_duration(100.0);
    let probe = h.config.page().layout_probe_selector;
    h.page.add_selector(&probe);

    let _handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;

    assert_eq!(h.scrubber.overlays()[0].1.layout, PageLayout::Modern);
}

// ---------------------------------------------------------------------------
// Handler lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn destroy_is_idempotent_and_tears_everything_down() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let handler = h
        .spawn_handler("vid", vec![segment(Category::Sponsor, 10.0, 20.0, "s")])
        .await;
    settle().await;
    assert_eq!(h.scrubber.overlays().len(), 1);

    handler.destroy();
    handler.destroy();
    assert!(handler.is_destroyed());
    settle().await;
    assert!(h.scrubber.overlays().is_empty());

    h.video.play();
    h.video.advance_to(9.9);
    sleep(Duration::from_secs(2)).await;
    assert!(h.video.seeks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_segment_list_spawns_nothing() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let _handler = h.spawn_handler("vid", vec![]).await;
    sleep(Duration::from_secs(2)).await;

    assert!(h.scrubber.overlays().is_empty());
    assert!(h.video.seeks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_surfaces_and_leaves_the_page_untouched() {
    let h = Harness::new();
    h.video.set_duration(100.0);

    let handler = SkipHandler::new(
        "vid".to_string(),
        Arc::new(h.page.clone()),
        StubSegmentSource::failing(),
        h.config.clone(),
        Arc::clone(&h.notifier) as Arc<dyn Notifier>,
    );
    assert!(handler.init().await.is_err());
    sleep(Duration::from_secs(2)).await;

    assert!(h.scrubber.overlays().is_empty());
    assert!(h.video.seeks().is_empty());
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn navigation_swaps_handlers_only_when_the_video_changes() {
    let h = Harness::new();
    let mut app = App::new(
        h.config.clone(),
        Arc::new(h.page.clone()),
        StubSegmentSource::new(vec![]),
        RecordingNotifier::new() as Arc<dyn Notifier>,
    );

    let first = app
        .handle_navigation("https://www.youtube.com/tv#/watch?v=abc123")
        .expect("handler for first video");
    assert_eq!(app.current_video_id(), Some("abc123"));

    // The host fires several signals per route change.
    assert!(app
        .handle_navigation("https://www.youtube.com/tv#/watch?v=abc123&resume=1")
        .is_none());
    assert!(!first.is_destroyed());

    let second = app
        .handle_navigation("https://www.youtube.com/tv#/watch?v=def456")
        .expect("handler for second video");
    assert!(first.is_destroyed());
    assert!(!second.is_destroyed());
    assert_eq!(app.current_video_id(), Some("def456"));

    // Leaving the watch surface is not a video change.
    assert!(app
        .handle_navigation("https://www.youtube.com/tv#/browse")
        .is_none());
    assert_eq!(app.current_video_id(), Some("def456"));
}

#[tokio::test(start_paused = true)]
async fn disabled_feature_creates_no_handler() {
    let h = Harness::new();
    h.config.update_sponsorblock(|sb| sb.enabled = false);
    let mut app = App::new(
        h.config.clone(),
        Arc::new(h.page.clone()),
        StubSegmentSource::new(vec![]),
        RecordingNotifier::new() as Arc<dyn Notifier>,
    );

    assert!(app
        .handle_navigation("https://www.youtube.com/tv#/watch?v=abc123")
        .is_none());
    assert_eq!(app.current_video_id(), None);
}
