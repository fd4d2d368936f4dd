//! Per-call result of a capability operation
//!
//! A [`Reply`] carries the operation outcome together with the notifications
//! raised during that call, so nothing about a call leaks into the next one
//! through service-owned state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notification::{Notification, Notifications};

/// One entry of a structured business fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Field or rule the incident refers to
    pub key: String,
    pub message: String,
}

impl Incident {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure raised by a capability operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceFault {
    /// Anticipated, client-facing failure with its incidents
    #[error("Business rule failure ({} incident(s))", .0.len())]
    Business(Vec<Incident>),

    /// Anything else; the message is returned to the client as-is
    #[error("{0}")]
    Unexpected(String),
}

impl ServiceFault {
    pub fn business(incidents: impl IntoIterator<Item = Incident>) -> Self {
        Self::Business(incidents.into_iter().collect())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<crate::Error> for ServiceFault {
    fn from(err: crate::Error) -> Self {
        Self::Unexpected(err.to_string())
    }
}

/// Outcome of one capability call plus the notifications it raised
///
/// `Ok(None)` is a call that produced no value, typically because it raised a
/// negative notification instead.
#[derive(Debug)]
pub struct Reply<T> {
    pub outcome: Result<Option<T>, ServiceFault>,
    pub notifications: Notifications,
}

impl<T> Reply<T> {
    pub fn value(value: T) -> Self {
        Self {
            outcome: Ok(Some(value)),
            notifications: Notifications::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            outcome: Ok(None),
            notifications: Notifications::new(),
        }
    }

    pub fn fault(fault: impl Into<ServiceFault>) -> Self {
        Self {
            outcome: Err(fault.into()),
            notifications: Notifications::new(),
        }
    }

    /// No value, one negative notification
    pub fn negative(message: impl Into<String>) -> Self {
        Self::empty().notify(Notification::negative(message))
    }

    /// No value, every notification collected so far
    pub fn rejected(notifications: Notifications) -> Self {
        Self {
            outcome: Ok(None),
            notifications,
        }
    }

    pub fn notify(mut self, notification: Notification) -> Self {
        self.notifications.push(notification);
        self
    }

    pub fn is_fault(&self) -> bool {
        self.outcome.is_err()
    }
}

impl<T, E> From<std::result::Result<T, E>> for Reply<T>
where
    E: Into<ServiceFault>,
{
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::value(value),
            Err(err) => Self::fault(err),
        }
    }
}
