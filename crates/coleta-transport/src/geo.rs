//! Device/network position lookup with bounded waiting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use coleta_types::Coordinates;

use crate::error::TransportError;
use crate::http::Transport;

#[derive(Debug, Error)]
pub enum GeoError {
    /// No fix arrived within the allowed wait.
    #[error("position lookup timed out after {waited:?}")]
    Timeout { waited: Duration },

    /// The service answered but without usable coordinates.
    #[error("position service gave no usable fix: {0}")]
    NoFix(String),

    #[error(transparent)]
    Lookup(#[from] TransportError),
}

/// Source of the observer's current position.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

/// Position lookup through an IP-geolocation HTTP service.
///
/// Expects a JSON object with numeric `latitude` and `longitude` fields,
/// which is what `ipapi.co/json` answers.
pub struct IpLookupProvider {
    transport: Arc<dyn Transport>,
    path: String,
}

impl IpLookupProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            path: "json".to_string(),
        }
    }

    pub fn with_path(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpLookupProvider {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        let value = self.transport.get(&self.path, &[]).await?;
        let latitude = value.get("latitude").and_then(Value::as_f64);
        let longitude = value.get("longitude").and_then(Value::as_f64);
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates::new(latitude, longitude)),
            _ => Err(GeoError::NoFix(
                "reply carries no latitude/longitude pair".to_string(),
            )),
        }
    }
}

/// A provider with a fixed answer, for embedders that know where they are
/// and for tests.
pub struct StaticProvider {
    position: Coordinates,
}

impl StaticProvider {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeoProvider for StaticProvider {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(self.position)
    }
}

/// Reuses a recent fix instead of asking again.
///
/// A fix older than `max_age` is refreshed. Errors are never cached.
pub struct CachingProvider<P> {
    inner: P,
    max_age: Duration,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl<P> CachingProvider<P> {
    pub fn new(inner: P, max_age: Duration) -> Self {
        Self {
            inner,
            max_age,
            last_fix: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<P: GeoProvider> GeoProvider for CachingProvider<P> {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        if let Some((at, position)) = *self.last_fix.lock() {
            if at.elapsed() < self.max_age {
                debug!("reusing cached position fix");
                return Ok(position);
            }
        }
        let position = self.inner.current_position().await?;
        *self.last_fix.lock() = Some((Instant::now(), position));
        Ok(position)
    }
}

/// Ask `provider` for a position, waiting at most `wait`.
pub async fn locate_within(
    provider: &dyn GeoProvider,
    wait: Duration,
) -> Result<Coordinates, GeoError> {
    match tokio::time::timeout(wait, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeoError::Timeout { waited: wait }),
    }
}

/// Like [`locate_within`] but degrading to `default` instead of failing.
///
/// Position is a nicety here, not a requirement: a map centered on the
/// default city beats an error.
pub async fn position_or_default(
    provider: &dyn GeoProvider,
    wait: Duration,
    default: Coordinates,
) -> Coordinates {
    match locate_within(provider, wait).await {
        Ok(position) => position,
        Err(error) => {
            warn!(%error, "no position fix, using the default center");
            default
        }
    }
}
