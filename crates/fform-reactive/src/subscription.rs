#![forbid(unsafe_code)]

//! RAII subscription guards.
//!
//! A [`Subscription`] owns the detach action of one listener (or of a group
//! of listeners). The action runs at most once: either when
//! [`unsubscribe`](Subscription::unsubscribe) is first called or when the
//! guard is dropped, whichever comes first.

use std::cell::RefCell;
use std::fmt;

/// Guard returned by every `subscribe` call.
///
/// Dropping the guard detaches the listener. Holders that want to keep a
/// listener alive for the lifetime of some owner store the guard in that
/// owner.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Create a guard that runs `detach` once.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: RefCell::new(Some(Box::new(detach))),
        }
    }

    /// A guard with nothing to detach.
    pub fn empty() -> Self {
        Self {
            detach: RefCell::new(None),
        }
    }

    /// Combine several guards into one. Detaching the group detaches the
    /// members in order.
    pub fn group(members: impl IntoIterator<Item = Subscription>) -> Self {
        let members: Vec<Subscription> = members.into_iter().collect();
        if members.is_empty() {
            return Self::empty();
        }
        Self::new(move || {
            for member in &members {
                member.unsubscribe();
            }
        })
    }

    /// Detach the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        // Take the action out before running it so a detach action that
        // re-enters this guard sees it already spent.
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }

    /// Whether the detach action has not run yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.detach.borrow().is_some()
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
