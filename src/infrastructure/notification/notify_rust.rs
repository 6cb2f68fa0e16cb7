//! Desktop notification adapter using notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};
use crate::domain::recording::Duration;

const APP_NAME: &str = "Screencast";

/// Desktop notifier. Notifications close on their own after `expire`, the
/// same time the shell keeps a status message visible.
pub struct NotifyRustNotifier {
    app_name: String,
    expire: Duration,
}

impl NotifyRustNotifier {
    pub fn new(expire: Duration) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            expire,
        }
    }

    fn timeout(&self) -> Timeout {
        let millis = u32::try_from(self.expire.as_millis()).unwrap_or(u32::MAX);
        Timeout::Milliseconds(millis)
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new(Duration::default_message_duration())
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .icon(icon.icon_name())
            .timeout(self.timeout());

        // show() talks to the notification daemon synchronously
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_expires_with_status_message() {
        let notifier = NotifyRustNotifier::default();
        assert_eq!(notifier.app_name, "Screencast");
        assert_eq!(notifier.timeout(), Timeout::Milliseconds(2500));
    }

    #[test]
    fn custom_expiry() {
        let notifier = NotifyRustNotifier::new(Duration::from_secs(5));
        assert_eq!(notifier.timeout(), Timeout::Milliseconds(5000));
    }
}
