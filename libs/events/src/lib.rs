//! # fanout-events
//!
//! Notification event types shared by the fanout router.
//!
//! ## Design Principles
//!
//! - Events are immutable once constructed; routing only reads them
//! - A deployment routes on exactly one discriminant field (`app` or `type`)
//! - Records on the outbound stream carry a key derived from the event id
//!
//! ## Wire Shape
//!
//! ```json
//! { "id": 1, "app": "app1", "action": "object.created" }
//! { "id": 2, "type": "billing", "action": "invoice.paid" }
//! ```

mod error;
mod event;
mod record;
mod types;

pub use error::EventError;
pub use event::{NotificationEvent, NotificationEventBuilder};
pub use record::{routing_key, KeyedRecord, DEFAULT_KEY_PREFIX};
pub use types::*;
