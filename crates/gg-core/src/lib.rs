//! geogossip/crates/gg-core/src/lib.rs
//!
//! The gossip lifecycle: domain models, the expiry policy, the store port
//! and the service that ties them together.

pub mod clock;
pub mod error;
pub mod expiry;
pub mod models;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use error::*;
pub use expiry::*;
pub use models::*;
pub use service::GossipService;
pub use traits::*;
