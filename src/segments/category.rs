//! Closed enumeration of segment categories.
//!
//! The upstream service keys categories by string; we map them to a closed
//! enum so the policy and color tables are checked exhaustively at compile
//! time. Strings the service adds later land on [`Category::Unknown`] and are
//! drawn with the fallback style but never auto-skipped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sponsor,
    Intro,
    Outro,
    Interaction,
    #[serde(rename = "selfpromo")]
    SelfPromo,
    Preview,
    Filler,
    MusicOfftopic,
    /// Any category string the client does not recognize.
    #[serde(other)]
    Unknown,
}

/// Visual treatment for one category's overlay regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryStyle {
    /// CSS color of the region.
    pub color: &'static str,
    pub opacity: f32,
    /// Human-readable name used in notifications.
    pub label: &'static str,
}

const FALLBACK_STYLE: CategoryStyle = CategoryStyle {
    color: "blue",
    opacity: 0.7,
    label: "segment",
};

impl Category {
    /// Every category the client requests from the segment service.
    pub const ALL: [Category; 8] = [
        Category::Sponsor,
        Category::Intro,
        Category::Outro,
        Category::Interaction,
        Category::SelfPromo,
        Category::Preview,
        Category::Filler,
        Category::MusicOfftopic,
    ];

    /// The category string used on the wire and in user configuration.
    pub fn api_name(self) -> &'static str {
        match self {
            Category::Sponsor => "sponsor",
            Category::Intro => "intro",
            Category::Outro => "outro",
            Category::Interaction => "interaction",
            Category::SelfPromo => "selfpromo",
            Category::Preview => "preview",
            Category::Filler => "filler",
            Category::MusicOfftopic => "music_offtopic",
            Category::Unknown => "unknown",
        }
    }

    /// Parse a configuration/wire string, `None` for unrecognized names.
    pub fn from_api_name(name: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.api_name() == name)
    }

    pub fn style(self) -> CategoryStyle {
        match self {
            Category::Sponsor => CategoryStyle {
                color: "#00d400",
                opacity: 0.7,
                label: "sponsored segment",
            },
            Category::Intro => CategoryStyle {
                color: "#00ffff",
                opacity: 0.7,
                label: "intro",
            },
            Category::Outro => CategoryStyle {
                color: "#0202ed",
                opacity: 0.7,
                label: "outro",
            },
            Category::Interaction => CategoryStyle {
                color: "#cc00ff",
                opacity: 0.7,
                label: "interaction reminder",
            },
            Category::SelfPromo => CategoryStyle {
                color: "#ffff00",
                opacity: 0.7,
                label: "self-promotion",
            },
            Category::Preview => CategoryStyle {
                color: "#008fd6",
                opacity: 0.7,
                label: "recap or preview",
            },
            Category::Filler => CategoryStyle {
                color: "#7300FF",
                opacity: 0.9,
                label: "tangents",
            },
            Category::MusicOfftopic => CategoryStyle {
                color: "#ff9900",
                opacity: 0.7,
                label: "non-music part",
            },
            Category::Unknown => FALLBACK_STYLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_api_name(category.api_name()), Some(category));
        }
    }

    #[test]
    fn serde_uses_api_names() {
        let json = serde_json::to_string(&Category::MusicOfftopic).unwrap();
        assert_eq!(json, "\"music_offtopic\"");
        let parsed: Category = serde_json::from_str("\"selfpromo\"").unwrap();
        assert_eq!(parsed, Category::SelfPromo);
    }

    #[test]
    fn unrecognized_category_deserializes_to_unknown() {
        let parsed: Category = serde_json::from_str("\"exclusive_access\"").unwrap();
        assert_eq!(parsed, Category::Unknown);
        assert_eq!(parsed.style(), FALLBACK_STYLE);
    }

    #[test]
    fn from_api_name_rejects_unknown_names() {
        assert_eq!(Category::from_api_name("exclusive_access"), None);
        assert_eq!(Category::from_api_name("unknown"), None);
    }
}
