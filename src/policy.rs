//! Category skip policy derived from configuration.

use std::collections::HashSet;

use tracing::warn;

use crate::config::SponsorBlockConfig;
use crate::segments::Category;

/// Which categories may be auto-skipped and which are vetoed to manual-only.
///
/// Derived, never stored: the scheduler re-derives it from the live
/// configuration each time a skip fires, so flag changes take effect on
/// already-scheduled skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPolicy {
    skippable: HashSet<Category>,
    manual: HashSet<Category>,
}

impl CategoryPolicy {
    pub fn from_config(config: &SponsorBlockConfig) -> Self {
        let flags = [
            (Category::Sponsor, config.skip_sponsor),
            (Category::Intro, config.skip_intro),
            (Category::Outro, config.skip_outro),
            (Category::Interaction, config.skip_interaction),
            (Category::SelfPromo, config.skip_selfpromo),
            (Category::Preview, config.skip_preview),
            (Category::Filler, config.skip_filler),
            (Category::MusicOfftopic, config.skip_music_offtopic),
        ];

        let skippable = flags
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(category, _)| category)
            .collect();

        let manual = config
            .manual_skip_categories
            .iter()
            .filter_map(|name| {
                let category = Category::from_api_name(name);
                if category.is_none() {
                    warn!(name = %name, "ignoring unknown manual skip category");
                }
                category
            })
            .collect();

        Self { skippable, manual }
    }

    pub fn is_skippable(&self, category: Category) -> bool {
        self.skippable.contains(&category)
    }

    /// Manual categories are displayed but excluded from automatic seeks
    /// regardless of their individual enable flag.
    pub fn is_manual(&self, category: Category) -> bool {
        self.manual.contains(&category)
    }

    /// True when the scheduler may seek past a segment of this category.
    pub fn auto_skips(&self, category: Category) -> bool {
        self.is_skippable(category) && !self.is_manual(category)
    }
}
