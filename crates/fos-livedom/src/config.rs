//! Live DOM configuration
//!
//! Every document owns one `LiveDomConfig`. Collections consult the config
//! of the document their root currently belongs to.

use serde::{Deserialize, Serialize};

/// Per-document tuning of the collection caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveDomConfig {
    /// Skip element-only collections when a child-list change only touched
    /// text, comment or other non-element nodes
    pub fine_grained_child_invalidation: bool,
    /// Re-walk the tree after every cached answer and assert agreement.
    ///
    /// On by default in debug builds. Each `item()` then costs a full walk
    /// of the collection's scope, so a sequential pass is quadratic; turn
    /// this off before timing anything in a debug build.
    pub verify_caches: bool,
    /// Use the document id/name hash for unambiguous named lookups
    pub named_item_fast_path: bool,
}

impl Default for LiveDomConfig {
    fn default() -> Self {
        Self {
            fine_grained_child_invalidation: false,
            verify_caches: cfg!(debug_assertions),
            named_item_fast_path: true,
        }
    }
}

impl LiveDomConfig {
    pub fn builder() -> LiveDomConfigBuilder {
        LiveDomConfigBuilder::new()
    }
}

/// Builder for [`LiveDomConfig`]
#[derive(Debug, Default)]
pub struct LiveDomConfigBuilder {
    config: LiveDomConfig,
}

impl LiveDomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: LiveDomConfig::default(),
        }
    }

    pub fn fine_grained_child_invalidation(mut self, enabled: bool) -> Self {
        self.config.fine_grained_child_invalidation = enabled;
        self
    }

    pub fn verify_caches(mut self, enabled: bool) -> Self {
        self.config.verify_caches = enabled;
        self
    }

    pub fn named_item_fast_path(mut self, enabled: bool) -> Self {
        self.config.named_item_fast_path = enabled;
        self
    }

    pub fn build(self) -> LiveDomConfig {
        self.config
    }
}
