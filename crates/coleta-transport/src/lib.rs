//! HTTP plumbing for the coleta workspace.
//!
//! One [`Transport`] trait over a blocking HTTP agent, and the three typed
//! clients built on it:
//!
//! - [`RegistryApi`]: the collection-point registry (items, search,
//!   detail, geocoding, submission).
//! - [`DirectoryClient`]: the geographic directory of regions and
//!   localities.
//! - [`geo`]: position lookup with bounded waiting and caching.
//!
//! The [`testing`] module ships a scripted transport so downstream crates
//! can exercise whole flows without a network.

pub mod directory;
pub mod error;
pub mod geo;
pub mod http;
pub mod multipart;
pub mod registry;
pub mod testing;

pub use directory::{DirectoryClient, LocalityEntry, RegionEntry};
pub use error::TransportError;
pub use geo::{
    locate_within, position_or_default, CachingProvider, GeoError, GeoProvider, IpLookupProvider,
    StaticProvider,
};
pub use http::{HttpTransport, RequestBody, Transport};
pub use multipart::MultipartForm;
pub use registry::{fold_diacritics, RegistryApi};
