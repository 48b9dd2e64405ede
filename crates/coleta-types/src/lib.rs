//! Shared domain and configuration types for the coleta workspace.
//!
//! Everything here is plain data: geographic coordinates, recyclable item
//! categories, collection-point records and the environment-driven
//! configuration used by the transport layer and the CLI. The crates that
//! talk to the network or run the selection pipeline depend on this one,
//! never the other way around.

pub mod config;
pub mod geo;
pub mod item;
pub mod point;
pub mod registration;
pub mod retry;

pub use config::ColetaConfig;
pub use geo::Coordinates;
pub use item::RecyclableItem;
pub use point::{PointDetail, PointItem, PointProfile, PointSummary, SearchParams};
pub use registration::{AttachmentError, ImageAttachment, NewPoint};
pub use retry::RetryConfig;
