//! Connectivity status.
//!
//! The form controller asks a [`NetworkStatus`] whether any network path
//! exists before it contacts a backend. Hosts plug in whatever they have
//! (an OS reachability callback, a UI toggle); the CLI uses [`AlwaysOnline`]
//! and lets the forms relay probe decide.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of truth for "is there a network path right now".
pub trait NetworkStatus: Send + Sync {
    /// Returns true if the host reports connectivity.
    fn is_online(&self) -> bool;
}

/// Reports online unconditionally.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOnline;

impl NetworkStatus for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Shared, switchable connectivity flag.
///
/// Clones share the same flag, so a host event handler can hold one clone
/// while the controller holds another.
#[derive(Clone, Debug)]
pub struct NetworkFlag(Arc<AtomicBool>);

impl NetworkFlag {
    /// Creates a flag with the given initial state.
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    /// Updates the connectivity state.
    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl Default for NetworkFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkStatus for NetworkFlag {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
