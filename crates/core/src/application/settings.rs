// Runtime settings: the loaded config plus the one runtime-mutable flag

use crate::domain::RelayConfig;
use crate::error::Result;
use crate::port::ConfigStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Shared, read-mostly view of the relay configuration.
///
/// Only `debug` changes after startup; toggling it re-persists the whole document.
pub struct RelaySettings {
    config: RelayConfig,
    debug: AtomicBool,
    store: Arc<dyn ConfigStore>,
    save_lock: Mutex<()>,
}

impl RelaySettings {
    pub fn new(config: RelayConfig, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            debug: AtomicBool::new(config.debug),
            config,
            store,
            save_lock: Mutex::new(()),
        }
    }

    /// Load the persisted config, falling back to defaults when it is missing
    /// or unreadable. The result is always written back so new fields appear
    /// in the operator's file.
    pub fn load_or_default(store: Arc<dyn ConfigStore>) -> Self {
        let config = match store.load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("No configuration found, generating defaults...");
                RelayConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "Config invalid, generating defaults...");
                RelayConfig::default()
            }
        };

        if let Err(e) = store.save(&config) {
            warn!(error = %e, "Failed to save configuration");
        }

        Self::new(config, store)
    }

    /// Config as loaded at startup (its `debug` field is the startup value; use [`Self::debug`])
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Flip the debug flag and persist the config. Returns the new value.
    pub fn toggle_debug(&self) -> Result<bool> {
        let _guard = self.save_lock.lock().unwrap_or_else(|p| p.into_inner());
        let enabled = !self.debug.load(Ordering::Relaxed);
        self.debug.store(enabled, Ordering::Relaxed);

        let mut snapshot = self.config.clone();
        snapshot.debug = enabled;
        self.store.save(&snapshot)?;

        info!(debug = enabled, "Debug mode toggled");
        Ok(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::config_store::mocks::InMemoryConfigStore;

    #[test]
    fn test_missing_config_writes_defaults() {
        let store = Arc::new(InMemoryConfigStore::new(None));
        let settings = RelaySettings::load_or_default(store.clone());

        assert_eq!(settings.config(), &RelayConfig::default());
        assert_eq!(store.stored(), Some(RelayConfig::default()));
    }

    #[test]
    fn test_corrupt_config_falls_back_to_defaults() {
        let store = Arc::new(InMemoryConfigStore::corrupt());
        let settings = RelaySettings::load_or_default(store.clone());

        assert_eq!(settings.config().poll_interval_sec, 8);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_existing_config_is_kept_and_resaved() {
        let cfg = RelayConfig {
            website_url: "https://example.com".into(),
            debug: true,
            ..Default::default()
        };
        let store = Arc::new(InMemoryConfigStore::new(Some(cfg.clone())));
        let settings = RelaySettings::load_or_default(store.clone());

        assert!(settings.debug());
        assert_eq!(settings.config().website_url, "https://example.com");
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_toggle_debug_persists_whole_config() {
        let cfg = RelayConfig {
            api_key: "k".into(),
            ..Default::default()
        };
        let store = Arc::new(InMemoryConfigStore::new(None));
        let settings = RelaySettings::new(cfg, store.clone());

        assert!(settings.toggle_debug().unwrap());
        let saved = store.stored().unwrap();
        assert!(saved.debug);
        assert_eq!(saved.api_key, "k");

        assert!(!settings.toggle_debug().unwrap());
        assert!(!store.stored().unwrap().debug);
    }
}
