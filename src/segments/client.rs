//! SponsorBlock segment repository client.
//!
//! Implements [`SegmentSource`] against the public `skipSegments` endpoint.
//! Lookups are pseudonymized: the request carries only a fixed-length SHA-256
//! prefix of the video id, so the response may contain records for several
//! videos and the client filters to the exact id locally.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::hash::lookup_prefix;
use crate::segments::{Category, Segment};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default public segment database.
pub const DEFAULT_API_BASE_URL: &str = "https://sponsor.ajay.app/api";

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("segment request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("segment service returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Source of skip segments for a video.
///
/// Abstracted so the handler can be exercised against canned segment lists in
/// tests without a network.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Fetch the segments tagged on `video_id` for the given categories.
    ///
    /// An empty list means the feature does nothing for this video; it is not
    /// an error.
    async fn fetch_segments(
        &self,
        video_id: &str,
        categories: &[Category],
    ) -> Result<Vec<Segment>, SegmentError>;
}

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VideoRecord {
    #[serde(rename = "videoID")]
    video_id: String,
    #[serde(default)]
    segments: Vec<WireSegment>,
}

#[derive(Debug, Deserialize)]
struct WireSegment {
    /// `[start, end]` in seconds.
    segment: [f64; 2],
    category: Category,
    #[serde(rename = "UUID")]
    uuid: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the SponsorBlock segment database.
pub struct SponsorBlockClient {
    client: reqwest::Client,
    base_url: String,
}

impl SponsorBlockClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for SponsorBlockClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[async_trait]
impl SegmentSource for SponsorBlockClient {
    async fn fetch_segments(
        &self,
        video_id: &str,
        categories: &[Category],
    ) -> Result<Vec<Segment>, SegmentError> {
        let prefix = lookup_prefix(video_id);
        let url = format!("{}/skipSegments/{prefix}", self.base_url);

        // The endpoint expects the category list as a JSON array in a single
        // query parameter.
        let names: Vec<&str> = categories.iter().map(|c| c.api_name()).collect();
        let categories_param =
            serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string());

        debug!(url = %url, prefix = %prefix, "fetching skip segments");

        let resp = self
            .client
            .get(&url)
            .query(&[("categories", categories_param.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SegmentError::Status(status));
        }

        let records: Vec<VideoRecord> = resp.json().await?;
        Ok(select_video(records, video_id))
    }
}

/// Pick the record matching `video_id` exactly and convert its segments,
/// dropping any that violate the interval invariant.
fn select_video(records: Vec<VideoRecord>, video_id: &str) -> Vec<Segment> {
    let Some(record) = records.into_iter().find(|r| r.video_id == video_id) else {
        debug!(video_id, "no segment record for video");
        return Vec::new();
    };

    record
        .segments
        .into_iter()
        .filter_map(|w| {
            let [start, end] = w.segment;
            if !(start.is_finite() && end.is_finite()) || start < 0.0 || start > end {
                warn!(
                    uuid = %w.uuid,
                    start,
                    end,
                    "discarding segment with invalid interval"
                );
                return None;
            }
            Some(Segment {
                category: w.category,
                start,
                end,
                id: w.uuid,
            })
        })
        .collect()
}
