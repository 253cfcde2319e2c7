//! Read-only view over the latest flag snapshot.

use crate::registry::{FlagSnapshot, FlagStatus};

/// What a consumer knows about service availability.
///
/// Before the first fetch completes nothing is known, and the three
/// queries disagree on purpose: redirect guards use
/// [`is_active_or_loading`](Self::is_active_or_loading) so users are not
/// bounced before data arrives, navigation uses
/// [`is_active_and_loaded`](Self::is_active_and_loaded) so links do not
/// flash in and out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceStatus {
    snapshot: Option<FlagSnapshot>,
}

impl ServiceStatus {
    /// Nothing fetched yet.
    pub fn loading() -> Self {
        Self { snapshot: None }
    }

    pub fn loaded(snapshot: FlagSnapshot) -> Self {
        Self { snapshot: Some(snapshot) }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn services(&self) -> Option<&FlagSnapshot> {
        self.snapshot.as_ref()
    }

    /// Enabled in the current snapshot; false while loading.
    pub fn is_active(&self, name: &str) -> bool {
        self.snapshot
            .as_ref()
            .and_then(|s| s.get(name))
            .is_some_and(|status| *status == FlagStatus::On)
    }

    /// False until a snapshot has loaded, then [`is_active`](Self::is_active).
    pub fn is_active_and_loaded(&self, name: &str) -> bool {
        self.is_loaded() && self.is_active(name)
    }

    /// True until a snapshot has loaded, then [`is_active`](Self::is_active).
    pub fn is_active_or_loading(&self, name: &str) -> bool {
        !self.is_loaded() || self.is_active(name)
    }
}
