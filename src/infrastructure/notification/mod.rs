//! Notification infrastructure module

mod notify_rust;

pub use notify_rust::NotifyRustNotifier;

use crate::application::ports::{Notifier, SilentNotifier};
use crate::domain::recording::Duration;

/// Create the notifier for the session: desktop notifications when
/// `enabled`, otherwise one that shows nothing.
pub fn create_notifier(enabled: bool, expire: Duration) -> Box<dyn Notifier> {
    if enabled {
        Box::new(NotifyRustNotifier::new(expire))
    } else {
        Box::new(SilentNotifier)
    }
}
