//! Listener handles returned by subscribe-style operations.

use std::fmt;

/// Detaches a listener when dropped or when [`Subscription::unsubscribe`] is called.
///
/// Keep the handle alive for as long as notifications are wanted.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Subscription that was never attached to anything.
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    pub fn is_noop(&self) -> bool {
        self.teardown.is_none()
    }

    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(f) = self.teardown.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}
