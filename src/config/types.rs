use serde::{Deserialize, Serialize};

use crate::segments::DEFAULT_API_BASE_URL;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sponsorblock: SponsorBlockConfig,

    #[serde(default)]
    pub adfilter: AdFilterConfig,

    #[serde(default)]
    pub page: PageConfig,
}

/// Settings for the segment-skip engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SponsorBlockConfig {
    /// Master switch. Disabling stops new handlers from being created.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_true")]
    pub skip_sponsor: bool,

    #[serde(default = "default_true")]
    pub skip_intro: bool,

    #[serde(default = "default_true")]
    pub skip_outro: bool,

    #[serde(default = "default_true")]
    pub skip_interaction: bool,

    #[serde(default = "default_true")]
    pub skip_selfpromo: bool,

    #[serde(default = "default_true")]
    pub skip_preview: bool,

    #[serde(default)]
    pub skip_filler: bool,

    #[serde(default = "default_true")]
    pub skip_music_offtopic: bool,

    /// Categories shown on the overlay but never auto-skipped, by wire name.
    /// Acts as a veto over the individual skip flags.
    #[serde(default = "default_manual_skip_categories")]
    pub manual_skip_categories: Vec<String>,

    /// Backward tolerance when selecting the next segment, absorbing races
    /// between timeupdate events and an already-fired skip.
    #[serde(default = "default_skip_tolerance_secs")]
    pub skip_tolerance_secs: f64,

    /// Re-entry window for repeat-skip damping. Tunable; the historical value
    /// is 1000ms but it has not been validated against rapid manual seeking.
    #[serde(default = "default_repeat_skip_window_ms")]
    pub repeat_skip_window_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_manual_skip_categories() -> Vec<String> {
    vec!["intro".to_string(), "outro".to_string(), "filler".to_string()]
}

fn default_skip_tolerance_secs() -> f64 {
    0.3
}

fn default_repeat_skip_window_ms() -> u64 {
    1000
}

impl Default for SponsorBlockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base_url: default_api_base_url(),
            skip_sponsor: true,
            skip_intro: true,
            skip_outro: true,
            skip_interaction: true,
            skip_selfpromo: true,
            skip_preview: true,
            skip_filler: false,
            skip_music_offtopic: true,
            manual_skip_categories: default_manual_skip_categories(),
            skip_tolerance_secs: default_skip_tolerance_secs(),
            repeat_skip_window_ms: default_repeat_skip_window_ms(),
        }
    }
}

/// Host page coupling points. The page is third-party and its markup shifts
/// between releases, so every selector is overridable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    #[serde(default = "default_video_selector")]
    pub video_selector: String,

    #[serde(default = "default_scrubber_selector")]
    pub scrubber_selector: String,

    /// Present only in the newer of the two host UI layouts.
    #[serde(default = "default_layout_probe_selector")]
    pub layout_probe_selector: String,

    /// How often to look for the video element before it exists.
    #[serde(default = "default_video_poll_interval_ms")]
    pub video_poll_interval_ms: u64,

    /// How often to look for the scrubber control while building the overlay.
    #[serde(default = "default_scrubber_poll_interval_ms")]
    pub scrubber_poll_interval_ms: u64,
}

fn default_video_selector() -> String {
    "video".to_string()
}

fn default_scrubber_selector() -> String {
    "ytlr-redux-connect-ytlr-progress-bar".to_string()
}

fn default_layout_probe_selector() -> String {
    "div[idomkey=\"Metadata-Section\"]".to_string()
}

fn default_video_poll_interval_ms() -> u64 {
    100
}

fn default_scrubber_poll_interval_ms() -> u64 {
    500
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            video_selector: default_video_selector(),
            scrubber_selector: default_scrubber_selector(),
            layout_probe_selector: default_layout_probe_selector(),
            video_poll_interval_ms: default_video_poll_interval_ms(),
            scrubber_poll_interval_ms: default_scrubber_poll_interval_ms(),
        }
    }
}

/// Settings for the ad-payload response interceptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Preferred video codec substring (e.g. "vp9"); "any" keeps all formats.
    #[serde(default = "default_preferred_video_codec")]
    pub preferred_video_codec: String,

    /// Keep the "includes paid promotion" overlay in player responses.
    #[serde(default = "default_true")]
    pub show_paid_promotion_overlay: bool,

    #[serde(default)]
    pub hide_end_screen_cards: bool,

    /// Keep the host's "are you still watching" prompts.
    #[serde(default = "default_true")]
    pub attention_checks: bool,
}

fn default_preferred_video_codec() -> String {
    "vp9".to_string()
}

impl Default for AdFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preferred_video_codec: default_preferred_video_codec(),
            show_paid_promotion_overlay: true,
            hide_end_screen_cards: false,
            attention_checks: true,
        }
    }
}
