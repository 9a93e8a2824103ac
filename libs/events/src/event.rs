//! Notification event - the record routed by the fanout router.

use serde::{Deserialize, Serialize};

use crate::{DiscriminantField, EventError};

/// A notification about something that happened in an application.
///
/// Fields are private: once built, an event is only ever read. Both
/// discriminant slots exist so one record shape serves both the
/// route-by-app and route-by-type deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    app: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    event_type: Option<String>,

    action: String,
}

impl NotificationEvent {
    /// Creates a new event builder.
    pub fn builder() -> NotificationEventBuilder {
        NotificationEventBuilder::default()
    }

    /// Assembles an event from parts that are already known to be present.
    pub fn from_parts(
        id: i64,
        app: Option<String>,
        event_type: Option<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id,
            app,
            event_type,
            action: action.into(),
        }
    }

    /// Caller-supplied identifier. Not checked for uniqueness.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Application name, if set.
    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    /// Event-type tag, if set.
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// What happened (e.g. `object.created`).
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Reads the discriminant slot selected by `field`.
    pub fn discriminant(&self, field: DiscriminantField) -> Option<&str> {
        match field {
            DiscriminantField::App => self.app(),
            DiscriminantField::Type => self.event_type(),
        }
    }

    /// Serializes the event to JSON.
    pub fn to_json(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an event from JSON.
    pub fn from_json(raw: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationEvent(id={}", self.id)?;
        if let Some(app) = &self.app {
            write!(f, ", app={app}")?;
        }
        if let Some(event_type) = &self.event_type {
            write!(f, ", type={event_type}")?;
        }
        write!(f, ", action={})", self.action)
    }
}

/// Builder for constructing notification events.
#[derive(Debug, Default)]
pub struct NotificationEventBuilder {
    id: Option<i64>,
    app: Option<String>,
    event_type: Option<String>,
    action: Option<String>,
}

impl NotificationEventBuilder {
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the slot selected by `field`.
    pub fn discriminant(self, field: DiscriminantField, value: impl Into<String>) -> Self {
        match field {
            DiscriminantField::App => self.app(value),
            DiscriminantField::Type => self.event_type(value),
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Builds the event.
    ///
    /// Fails if `id` or `action` was never set. Blank checks belong to the
    /// HTTP boundary, not here.
    pub fn build(self) -> Result<NotificationEvent, EventError> {
        let id = self
            .id
            .ok_or_else(|| EventError::InvalidPayload("id is required".to_string()))?;
        let action = self
            .action
            .ok_or_else(|| EventError::InvalidPayload("action is required".to_string()))?;

        Ok(NotificationEvent::from_parts(
            id,
            self.app,
            self.event_type,
            action,
        ))
    }
}
