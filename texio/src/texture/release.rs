//! Scoped release of native resources backing decoded pixel data.

use std::fmt;

type ReleaseAction = Box<dyn FnOnce() + Send>;

/// Handle to the resources (file mappings, decode buffers) behind a
/// [`TextureData`](super::TextureData).
///
/// The attached action runs exactly once: on the first call to
/// [`release`](ReleaseHandle::release), or on drop if release was never
/// called. Further calls are no-ops.
#[derive(Default)]
pub struct ReleaseHandle {
    action: Option<ReleaseAction>,
}

impl ReleaseHandle {
    /// Create a handle that runs `action` on release.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Whether an action is still waiting to run.
    pub fn is_pending(&self) -> bool {
        self.action.is_some()
    }

    /// Run the action if it has not run yet.
    ///
    /// Returns `true` if this call ran it.
    pub fn release(&mut self) -> bool {
        match self.action.take() {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }
}

impl Drop for ReleaseHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("pending", &self.is_pending())
            .finish()
    }
}
