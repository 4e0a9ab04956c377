//! Skip segment model and the segment repository client.

mod category;
mod client;

pub use category::{Category, CategoryStyle};
pub use client::{SegmentError, SegmentSource, SponsorBlockClient, DEFAULT_API_BASE_URL};

/// One community-tagged time interval within a video.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub category: Category,
    /// Start of the interval, seconds from the beginning of the video.
    pub start: f64,
    /// End of the interval, seconds. Invariant: `start <= end`.
    pub end: f64,
    /// Opaque unique id assigned by the segment database.
    pub id: String,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Order segments by start time; the service returns them unordered.
pub fn sort_by_start(segments: &mut [Segment]) {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
}
