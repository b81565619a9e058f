//! Disposers returned by every subscription in the crate.

use std::fmt;

/// Handle that detaches an observer when disposed.
///
/// Disposal is synchronous: once [`Subscription::unsubscribe`] returns (or the
/// handle is dropped) the observer will not be invoked again, not even for an
/// emission that is already being delivered to other observers.
#[must_use = "dropping a Subscription detaches its observer immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `teardown` once on disposal.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Combines several subscriptions into one; they are disposed in order.
    pub fn merge(subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        let subscriptions: Vec<_> = subscriptions.into_iter().collect();
        Self::new(move || drop(subscriptions))
    }

    /// Detaches the observer.
    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    /// Returns `true` once the teardown has run, or if there never was one.
    pub fn is_closed(&self) -> bool {
        self.teardown.is_none()
    }

    fn dispose(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
