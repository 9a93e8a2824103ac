//! Notification ingress endpoint.
//!
//! Validates the inbound view, converts it to a [`NotificationEvent`] and
//! hands it to the ingress producer. Routing happens downstream; a 200 here
//! only means the event is on the stream.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use fanout_events::{DiscriminantField, NotificationEvent};
use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::error::{ApiError, FieldError};
use crate::api::request_context::RequestContext;
use crate::state::AppState;

/// Inbound notification.
///
/// Both discriminant slots are accepted; the one the deployment routes on
/// is required, the other is optional but must not be blank when present.
#[derive(Debug, Deserialize, Validate)]
pub struct NotificationView {
    #[validate(required(message = "must not be null"))]
    pub id: Option<i64>,

    #[validate(custom(function = "not_blank"))]
    pub app: Option<String>,

    #[serde(rename = "type")]
    #[validate(custom(function = "not_blank"))]
    pub event_type: Option<String>,

    #[validate(required(message = "must not be null"), custom(function = "not_blank"))]
    pub action: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

impl NotificationView {
    /// Validate and convert into an event routed on `field`.
    pub fn into_event(self, field: DiscriminantField) -> Result<NotificationEvent, Vec<FieldError>> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        let discriminant = match field {
            DiscriminantField::App => self.app.as_deref(),
            DiscriminantField::Type => self.event_type.as_deref(),
        };
        if discriminant.is_none() {
            errors.push(FieldError::new(field.as_str(), "must not be blank"));
        }

        match (self.id, self.action) {
            (Some(id), Some(action)) if errors.is_empty() => Ok(NotificationEvent::from_parts(
                id,
                self.app,
                self.event_type,
                action,
            )),
            _ => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                errors.dedup();
                Err(errors)
            }
        }
    }
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = match &*field {
                "event_type" => "type".to_string(),
                other => other.to_string(),
            };
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect()
}

/// Accept a notification and emit it onto the stream.
///
/// POST /notification
/// POST /v1/notifications
pub async fn post_notification(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<NotificationView>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;

    let Json(view) = payload.map_err(|rejection| {
        ApiError::bad_request("invalid_body", rejection.body_text())
            .with_request_id(request_id.clone())
    })?;

    let field = state.field();
    let event = view.into_event(field).map_err(|details| {
        ApiError::bad_request("validation_failed", "Notification failed validation")
            .with_details(details)
            .with_request_id(request_id.clone())
    })?;

    let discriminant = event.discriminant(field).unwrap_or_default().to_string();
    let event_id = event.id();

    state.producer().produce(event).map_err(|e| {
        warn!(request_id = %request_id, event_id = event_id, error = %e, "Failed to emit event");
        ApiError::from(e).with_request_id(request_id.clone())
    })?;

    info!(request_id = %request_id, event_id = event_id, discriminant = %discriminant, "Notification accepted");

    Ok((StatusCode::OK, format!("sent to {discriminant}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(json: &str) -> NotificationView {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_app_view_converts() {
        let event = view(r#"{"id":1,"app":"app1","action":"object.created"}"#)
            .into_event(DiscriminantField::App)
            .unwrap();

        assert_eq!(event.id(), 1);
        assert_eq!(event.app(), Some("app1"));
        assert_eq!(event.action(), "object.created");
    }

    #[test]
    fn test_valid_type_view_converts() {
        let event = view(r#"{"id":2,"type":"type1","action":"login"}"#)
            .into_event(DiscriminantField::Type)
            .unwrap();

        assert_eq!(event.event_type(), Some("type1"));
        assert_eq!(event.app(), None);
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let errors = view(r#"{}"#).into_event(DiscriminantField::App).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["action", "app", "id"]);
    }

    #[test]
    fn test_blank_values_are_rejected() {
        let errors = view(r#"{"id":1,"app":"  ","action":""}"#)
            .into_event(DiscriminantField::App)
            .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["action", "app"]);
        assert!(errors.iter().all(|e| e.message == "must not be blank"));
    }

    #[test]
    fn test_configured_field_is_required() {
        let errors = view(r#"{"id":1,"app":"app1","action":"x"}"#)
            .into_event(DiscriminantField::Type)
            .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("type", "must not be blank")]);
    }

    #[test]
    fn test_blank_secondary_slot_is_rejected() {
        let errors = view(r#"{"id":1,"app":"app1","type":" ","action":"x"}"#)
            .into_event(DiscriminantField::App)
            .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("type", "must not be blank")]);
    }
}
