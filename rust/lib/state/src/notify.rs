//! User-facing notifications ("toasts").
//!
//! A notification is a transient `(title, description, variant)` tuple. The
//! channel is a single slot: a new notification replaces the visible one.

use serde::{Deserialize, Serialize};

use crate::cell::{StateCell, SubscriptionId};

/// Visual severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    /// A failure notification: title "Error", the message as description.
    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

/// Anything that can show a notification to the end user.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

/// Last-wins notification slot, observable by the UI.
#[derive(Default)]
pub struct NotificationChannel {
    current: StateCell<Option<Notification>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The notification currently shown, if any.
    pub fn current(&self) -> Option<Notification> {
        self.current.get()
    }

    /// Hide the current notification.
    pub fn dismiss(&self) {
        self.current.set(None);
    }

    /// Observe every change of the slot (including dismissals).
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Option<Notification>) + Send + Sync + 'static,
    {
        self.current.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.current.unsubscribe(id)
    }
}

impl Notifier for NotificationChannel {
    fn notify(&self, notification: Notification) {
        tracing::debug!(
            title = %notification.title,
            variant = ?notification.variant,
            "notification"
        );
        self.current.set(Some(notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn starts_empty() {
        let channel = NotificationChannel::new();
        assert!(channel.current().is_none());
    }

    #[test]
    fn last_notification_wins() {
        let channel = NotificationChannel::new();
        channel.notify(Notification::new("Bienvenido", "first"));
        channel.notify(Notification::failure("second"));

        let current = channel.current().unwrap();
        assert_eq!(current.title, "Error");
        assert_eq!(current.description, "second");
        assert!(current.is_failure());
    }

    #[test]
    fn dismiss_clears_slot() {
        let channel = NotificationChannel::new();
        channel.notify(Notification::new("t", "d"));
        channel.dismiss();
        assert!(channel.current().is_none());
    }

    #[test]
    fn subscribers_observe_notifications() {
        let channel = NotificationChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let id = channel.subscribe(move |n| {
            if let Some(n) = n {
                s.lock().unwrap().push(n.title.clone());
            }
        });

        channel.notify(Notification::new("a", ""));
        channel.notify(Notification::new("b", ""));
        channel.unsubscribe(id);
        channel.notify(Notification::new("c", ""));

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }
}
