//! Shared configuration service.
//!
//! A cloneable handle over the live [`Config`] with change notifications.
//! Writers go through the section-scoped `update_*` methods so subscribers
//! can filter by the section they care about.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::types::{AdFilterConfig, Config, PageConfig, SponsorBlockConfig};

const EVENT_CAPACITY: usize = 16;

/// Which configuration section changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    SponsorBlockChanged,
    AdFilterChanged,
    PageChanged,
}

#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<RwLock<Config>>,
    tx: broadcast::Sender<ConfigEvent>,
}

impl ConfigStore {
    pub fn new(config: Config) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(config)),
            tx,
        }
    }

    /// Clone of the full current configuration.
    pub fn snapshot(&self) -> Config {
        self.inner.read().clone()
    }

    pub fn sponsorblock(&self) -> SponsorBlockConfig {
        self.inner.read().sponsorblock.clone()
    }

    pub fn adfilter(&self) -> AdFilterConfig {
        self.inner.read().adfilter.clone()
    }

    pub fn page(&self) -> PageConfig {
        self.inner.read().page.clone()
    }

    pub fn update_sponsorblock(&self, f: impl FnOnce(&mut SponsorBlockConfig)) {
        f(&mut self.inner.write().sponsorblock);
        let _ = self.tx.send(ConfigEvent::SponsorBlockChanged);
    }

    pub fn update_adfilter(&self, f: impl FnOnce(&mut AdFilterConfig)) {
        f(&mut self.inner.write().adfilter);
        let _ = self.tx.send(ConfigEvent::AdFilterChanged);
    }

    pub fn update_page(&self, f: impl FnOnce(&mut PageConfig)) {
        f(&mut self.inner.write().page);
        let _ = self.tx.send(ConfigEvent::PageChanged);
    }

    /// Subscribe to change notifications. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.tx.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
