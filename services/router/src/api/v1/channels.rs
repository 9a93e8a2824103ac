//! Channel introspection.

use axum::{extract::State, Json};
use fanout_events::DiscriminantField;
use serde::Serialize;

use crate::routing::ChannelSnapshot;
use crate::state::AppState;

/// Response for listing channels.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ChannelsResponse {
    /// Field the router classifies on.
    pub field: DiscriminantField,
    /// Channels in dispatch order, catch-all last.
    pub items: Vec<ChannelSnapshot>,
}

/// List output channels with their delivery counts.
///
/// GET /v1/channels
pub async fn list_channels(State(state): State<AppState>) -> Json<ChannelsResponse> {
    Json(ChannelsResponse {
        field: state.field(),
        items: state.stats().snapshot(),
    })
}
