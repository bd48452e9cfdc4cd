// Config Store Port

use crate::domain::RelayConfig;
use crate::error::Result;

/// Persistence for the relay configuration document
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` when no document exists yet; `Err` when it exists but is unreadable
    fn load(&self) -> Result<Option<RelayConfig>>;

    fn save(&self, config: &RelayConfig) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// Keeps the last saved document in memory
    #[derive(Default)]
    pub struct InMemoryConfigStore {
        stored: Mutex<Option<RelayConfig>>,
        corrupt: bool,
        saves: Mutex<usize>,
    }

    impl InMemoryConfigStore {
        pub fn new(initial: Option<RelayConfig>) -> Self {
            Self {
                stored: Mutex::new(initial),
                ..Default::default()
            }
        }

        /// Store whose document can never be parsed
        pub fn corrupt() -> Self {
            Self {
                corrupt: true,
                ..Default::default()
            }
        }

        pub fn stored(&self) -> Option<RelayConfig> {
            self.stored.lock().unwrap().clone()
        }

        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    impl ConfigStore for InMemoryConfigStore {
        fn load(&self) -> Result<Option<RelayConfig>> {
            if self.corrupt {
                return Err(AppError::Parse("corrupt config".to_string()));
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        fn save(&self, config: &RelayConfig) -> Result<()> {
            *self.stored.lock().unwrap() = Some(config.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }
}
