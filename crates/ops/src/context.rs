//! Operations context for dependency injection

use std::sync::Arc;

use taskmgr_errors::{Error, OpsError};
use taskmgr_gate::GateStore;
use taskmgr_platform::Platform;

/// Everything an operation needs: where gates live and how commands run
pub struct OpsCtx {
    /// Gate store selected by configuration
    pub store: Arc<dyn GateStore>,
    /// Command runner
    pub platform: Platform,
}

/// Builder for [`OpsCtx`]
#[derive(Default)]
pub struct OpsContextBuilder {
    store: Option<Arc<dyn GateStore>>,
    platform: Option<Platform>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set gate store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn GateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set platform used to run commands
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let store = self.store.ok_or_else(|| OpsError::MissingComponent {
            component: "store".to_string(),
        })?;

        let platform = self.platform.ok_or_else(|| OpsError::MissingComponent {
            component: "platform".to_string(),
        })?;

        Ok(OpsCtx { store, platform })
    }
}
