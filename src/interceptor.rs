//! Ad-payload response interceptor.
//!
//! The host interface carries its advertising inline in ordinary JSON
//! responses. Rather than patching the page's JSON parser, the shell routes
//! response bodies through [`AdFilter::intercept_json`], an explicit
//! middleware step: bodies that parse and contain something to rewrite come
//! back rewritten, everything else passes through untouched.

use serde_json::{json, Value};
use tracing::debug;

use crate::config::AdFilterConfig;

pub struct AdFilter {
    config: AdFilterConfig,
}

impl AdFilter {
    pub fn new(config: AdFilterConfig) -> Self {
        Self { config }
    }

    /// Middleware entry point. `None` means "pass the original body through";
    /// `Some` carries the rewritten body.
    pub fn intercept_json(&self, body: &str) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let mut value: Value = serde_json::from_str(body).ok()?;
        if !self.apply(&mut value) {
            return None;
        }
        serde_json::to_string(&value).ok()
    }

    /// Apply every rewrite in place; true if anything changed.
    pub fn apply(&self, value: &mut Value) -> bool {
        let mut changed = false;
        changed |= empty_ad_containers(value);
        changed |= self.strip_paid_promotion_overlay(value);
        changed |= self.prefer_video_codec(value);
        changed |= filter_browse_shelf_ads(value);
        changed |= self.strip_end_screen(value);
        changed |= self.filter_attention_checks(value);
        changed |= filter_short_form_ad_entries(value);
        if changed {
            debug!("ad payload rewritten");
        }
        changed
    }

    fn strip_paid_promotion_overlay(&self, value: &mut Value) -> bool {
        if self.config.show_paid_promotion_overlay {
            return false;
        }
        value
            .as_object_mut()
            .map_or(false, |obj| obj.remove("paidContentOverlay").is_some())
    }

    /// Keep only adaptive formats in the preferred codec (audio always
    /// survives), but only when at least one preferred format exists.
    fn prefer_video_codec(&self, value: &mut Value) -> bool {
        let codec = self.config.preferred_video_codec.as_str();
        if codec == "any" {
            return false;
        }

        let Some(formats) = value
            .get_mut("streamingData")
            .and_then(|s| s.get_mut("adaptiveFormats"))
            .and_then(Value::as_array_mut)
        else {
            return false;
        };

        let mime = |format: &Value| -> String {
            format
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        if !formats.iter().any(|f| mime(f).contains(codec)) {
            return false;
        }

        let before = formats.len();
        formats.retain(|format| {
            let mime_type = mime(format);
            mime_type.starts_with("audio/") || mime_type.contains(codec)
        });
        formats.len() != before
    }

    fn strip_end_screen(&self, value: &mut Value) -> bool {
        if !self.config.hide_end_screen_cards {
            return false;
        }
        value
            .as_object_mut()
            .map_or(false, |obj| obj.remove("endscreen").is_some())
    }

    /// Drop "are you still watching?" prompts when attention checks are off.
    fn filter_attention_checks(&self, value: &mut Value) -> bool {
        if self.config.attention_checks {
            return false;
        }
        let Some(messages) = value.get_mut("messages").and_then(Value::as_array_mut) else {
            return false;
        };
        let before = messages.len();
        messages.retain(|message| message.get("youThereRenderer").is_none());
        messages.len() != before
    }
}

/// Blank out the three top-level ad payload containers.
fn empty_ad_containers(value: &mut Value) -> bool {
    let Some(obj) = value.as_object_mut() else {
        return false;
    };
    let mut changed = false;

    if obj
        .get("adPlacements")
        .and_then(Value::as_array)
        .is_some_and(|a| !a.is_empty())
    {
        obj.insert("adPlacements".to_string(), json!([]));
        changed = true;
    }

    if obj.get("playerAds").is_some_and(|v| *v != json!(false)) {
        obj.insert("playerAds".to_string(), json!(false));
        changed = true;
    }

    if obj
        .get("adSlots")
        .and_then(Value::as_array)
        .is_some_and(|a| !a.is_empty())
    {
        obj.insert("adSlots".to_string(), json!([]));
        changed = true;
    }

    changed
}

fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    Some(current)
}

fn get_path_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    let mut current = value;
    for key in path {
        current = current.get_mut(*key)?;
    }
    Some(current)
}

/// Remove ad slots from browse-surface shelves, both at the section level and
/// inside each shelf's horizontal list.
fn filter_browse_shelf_ads(value: &mut Value) -> bool {
    let Some(contents) = get_path_mut(
        value,
        &[
            "contents",
            "tvBrowseRenderer",
            "content",
            "tvSurfaceContentRenderer",
            "content",
            "sectionListRenderer",
            "contents",
        ],
    )
    .and_then(Value::as_array_mut) else {
        return false;
    };

    let mut changed = false;

    let before = contents.len();
    contents.retain(|section| section.get("adSlotRenderer").is_none());
    changed |= contents.len() != before;

    for section in contents.iter_mut() {
        let Some(items) = get_path_mut(
            section,
            &["shelfRenderer", "content", "horizontalListRenderer", "items"],
        )
        .and_then(Value::as_array_mut) else {
            continue;
        };
        let before = items.len();
        items.retain(|item| item.get("adSlotRenderer").is_none());
        changed |= items.len() != before;
    }

    changed
}

/// Short-form feeds mark ad entries on a nested watch endpoint.
fn filter_short_form_ad_entries(value: &mut Value) -> bool {
    if value.is_array() {
        return false;
    }
    let Some(entries) = value.get_mut("entries").and_then(Value::as_array_mut) else {
        return false;
    };
    let before = entries.len();
    entries.retain(|entry| {
        get_path(
            entry,
            &["command", "reelWatchEndpoint", "adClientParams", "isAd"],
        )
        .and_then(Value::as_bool)
        != Some(true)
    });
    entries.len() != before
}
