//! # gg-client
//!
//! Client-side orchestration for GeoGossip: an HTTP binding for the gossip
//! endpoints and a [`SyncController`] that keeps the map and feed views in
//! step with the server.

pub mod api;
pub mod error;
pub mod inflight;
pub mod labels;
pub mod settings;
pub mod sync;
pub mod theme;

pub use api::{GossipApi, HttpGossipApi, ListFilter};
pub use error::ClientError;
pub use inflight::{InFlight, InFlightMarkers};
pub use settings::{ClientSettings, EndpointSettings};
pub use sync::{GossipCard, GossipForm, SyncController, ViewState, ViewStatus};
pub use theme::{Palette, ThemeName};
