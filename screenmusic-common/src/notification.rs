//! Business-rule notifications
//!
//! A capability operation reports rule checks as notifications instead of
//! failing outright. Negative notifications turn the whole call into a
//! rejection at the dispatcher; positive ones are informational and never
//! reach the wire.

use serde::{Deserialize, Serialize};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Positive,
    Negative,
}

/// A single business-rule message
///
/// Fields are private so a notification cannot change meaning after it has
/// been raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    message: String,
    message_type: MessageType,
}

impl Notification {
    pub fn new(message: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            message: message.into(),
            message_type,
        }
    }

    pub fn positive(message: impl Into<String>) -> Self {
        Self::new(message, MessageType::Positive)
    }

    pub fn negative(message: impl Into<String>) -> Self {
        Self::new(message, MessageType::Negative)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn is_negative(&self) -> bool {
        self.message_type == MessageType::Negative
    }
}

/// Append-only, ordered notification accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications {
    entries: Vec<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        self.entries.push(notification);
    }

    /// Append every entry of `other`, keeping its order
    pub fn extend(&mut self, other: Notifications) {
        self.entries.extend(other.entries);
    }

    /// Negative entries only, in the order they were raised
    pub fn negatives(&self) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|n| n.is_negative())
            .cloned()
            .collect()
    }

    pub fn has_negative(&self) -> bool {
        self.entries.iter().any(Notification::is_negative)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }
}

impl From<Vec<Notification>> for Notifications {
    fn from(entries: Vec<Notification>) -> Self {
        Self { entries }
    }
}

impl FromIterator<Notification> for Notifications {
    fn from_iter<I: IntoIterator<Item = Notification>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_serialization() {
        let notification = Notification::negative("not found");

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["message"], "not found");
        assert_eq!(json["messageType"], "Negative");
    }

    #[test]
    fn test_notification_deserialization() {
        let json = r#"{"message": "Artist created", "messageType": "Positive"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap();

        assert_eq!(notification.message(), "Artist created");
        assert_eq!(notification.message_type(), MessageType::Positive);
        assert!(!notification.is_negative());
    }

    #[test]
    fn test_negatives_keep_order_and_drop_positives() {
        let notifications: Notifications = vec![
            Notification::negative("first"),
            Notification::positive("ok"),
            Notification::negative("second"),
        ]
        .into();

        let negatives = notifications.negatives();
        assert_eq!(negatives.len(), 2);
        assert_eq!(negatives[0].message(), "first");
        assert_eq!(negatives[1].message(), "second");
        assert!(notifications.has_negative());
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut accumulator = Notifications::new();
        accumulator.push(Notification::positive("a"));

        let mut call = Notifications::new();
        call.push(Notification::negative("b"));
        accumulator.extend(call);

        let messages: Vec<&str> = accumulator.iter().map(Notification::message).collect();
        assert_eq!(messages, vec!["a", "b"]);
    }

    #[test]
    fn test_only_positives_has_no_negative() {
        let notifications: Notifications =
            std::iter::once(Notification::positive("saved")).collect();

        assert!(!notifications.has_negative());
        assert!(notifications.negatives().is_empty());
        assert_eq!(notifications.len(), 1);
    }
}
