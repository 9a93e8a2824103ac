//! Fanout router library.
//!
//! This crate primarily ships a `fanout-router` binary, but we expose the
//! pipeline and HTTP surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod pipeline;
pub mod producer;
pub mod routing;
pub mod sinks;
pub mod state;
