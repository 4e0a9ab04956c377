//! couchtube - client-side enhancement engine for TV web interfaces
//!
//! The desktop shell loads a third-party television UI and routes page state
//! through this crate: navigation signals drive a per-video [`handler`] that
//! fetches community skip segments, paints them on the scrubber, and seeks
//! playback past them; JSON response bodies pass through the [`interceptor`]
//! to shed their advertising payloads.

pub mod config;
pub mod engine;
pub mod handler;
pub mod hash;
pub mod interceptor;
pub mod navigation;
pub mod notify;
pub mod overlay;
pub mod page;
pub mod policy;
pub mod segments;
