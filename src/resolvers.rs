//! Stage resolvers binding the directory, registry and position services
//! to the selection pipeline.
//!
//! The locality stage's options carry qualified `UF/Name` keys so stages
//! below it can recover both halves without reaching back up the chain.
//! Labels stay plain locality names for display.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use coleta_pipeline::{Choice, PipelineState, ResolutionError, StageResolver};
use coleta_transport::{position_or_default, DirectoryClient, GeoProvider, RegistryApi};
use coleta_types::{ColetaConfig, Coordinates};

/// Stage id of the region (UF) selection.
pub const REGION_STAGE: &str = "region";
/// Stage id of the locality selection.
pub const LOCALITY_STAGE: &str = "locality";
/// Stage id of the derived map position.
pub const POSITION_STAGE: &str = "position";

/// Qualified option key for a locality, `SP/São Paulo`.
pub fn locality_key(region_code: &str, locality: &str) -> String {
    format!("{region_code}/{locality}")
}

/// Split a qualified locality key back into `(region code, locality)`.
pub fn split_locality_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('/')
}

/// Find the locality option matching `city`, by display name or by
/// qualified key.
pub(crate) fn locality_option(state: &PipelineState, city: &str) -> Option<Choice> {
    let stage = state.stage(LOCALITY_STAGE)?;
    stage
        .options
        .iter()
        .find(|option| option.label == city || option.key == city)
        .cloned()
}

/// Region options, straight from the geographic directory.
pub struct RegionResolver {
    directory: DirectoryClient,
}

impl RegionResolver {
    pub fn new(directory: DirectoryClient) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl StageResolver for RegionResolver {
    async fn resolve(&self, _input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
        let regions = self
            .directory
            .regions()
            .await
            .map_err(|error| ResolutionError::with_source(REGION_STAGE, error))?;
        Ok(regions
            .into_iter()
            .map(|entry| Choice::keyed(entry.code))
            .collect())
    }
}

/// Locality options for the selected region, with qualified keys.
pub struct LocalityResolver {
    directory: DirectoryClient,
}

impl LocalityResolver {
    pub fn new(directory: DirectoryClient) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl StageResolver for LocalityResolver {
    async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
        let region = input.ok_or_else(|| {
            ResolutionError::new(LOCALITY_STAGE, "no region selected upstream")
        })?;
        let localities = self
            .directory
            .localities(&region.key)
            .await
            .map_err(|error| ResolutionError::with_source(LOCALITY_STAGE, error))?;
        Ok(localities
            .into_iter()
            .map(|entry| Choice::new(locality_key(&region.key, &entry.name), entry.name))
            .collect())
    }
}

/// Derives the map position for the selected locality.
///
/// Geocoding the locality through the registry is the first choice. When
/// the registry cannot place it, or the lookup fails outright, the
/// resolver degrades to the observer's own position and past that to the
/// configured default center. The stage therefore always resolves to
/// exactly one option instead of failing the cascade.
pub struct PositionResolver {
    registry: RegistryApi,
    geo: Arc<dyn GeoProvider>,
    wait: Duration,
    default_center: Coordinates,
}

impl PositionResolver {
    pub fn new(
        registry: RegistryApi,
        geo: Arc<dyn GeoProvider>,
        wait: Duration,
        default_center: Coordinates,
    ) -> Self {
        Self {
            registry,
            geo,
            wait,
            default_center,
        }
    }

    pub fn from_config(
        registry: RegistryApi,
        geo: Arc<dyn GeoProvider>,
        config: &ColetaConfig,
    ) -> Self {
        Self::new(registry, geo, config.geo_wait, config.default_center)
    }

    async fn observer_position(&self) -> Coordinates {
        position_or_default(self.geo.as_ref(), self.wait, self.default_center).await
    }
}

#[async_trait]
impl StageResolver for PositionResolver {
    async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
        let locality = input.ok_or_else(|| {
            ResolutionError::new(POSITION_STAGE, "no locality selected upstream")
        })?;
        let Some((uf, city)) = split_locality_key(&locality.key) else {
            return Err(ResolutionError::new(
                POSITION_STAGE,
                format!("malformed locality key `{}`", locality.key),
            ));
        };
        let position = match self.registry.locate_city(uf, city).await {
            Ok(Some(position)) => position,
            Ok(None) => {
                debug!(uf, city, "locality not geocodable, using observer position");
                self.observer_position().await
            }
            Err(error) => {
                warn!(%error, "geocoding failed, using observer position");
                self.observer_position().await
            }
        };
        Ok(vec![Choice::keyed(position.to_string())])
    }
}
