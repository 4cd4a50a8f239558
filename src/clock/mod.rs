//! Time sources for the scheduler.
//!
//! A [`Clock`] reports elapsed seconds on the timeline that clicks are
//! rendered against. The scheduler never measures wall time itself: it only
//! compares beat targets with `now()`, so any monotonic source works.

mod manual;
mod stream;
mod system;

use std::sync::Arc;

pub use manual::ManualClock;
pub use stream::StreamClock;
pub use system::SystemClock;

/// Monotonic, non-decreasing time source in seconds.
///
/// A clock may report itself suspended (for example when the output stream
/// backing it is paused). `resume()` is idempotent; a clock that cannot be
/// resumed simply keeps reporting the same time.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;

    fn is_suspended(&self) -> bool {
        false
    }

    fn resume(&self) {}
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }

    fn is_suspended(&self) -> bool {
        (**self).is_suspended()
    }

    fn resume(&self) {
        (**self).resume()
    }
}
