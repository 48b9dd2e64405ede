//! The collection-point registration flow.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use coleta_pipeline::{
    CachedResolver, DependentPipeline, PipelineError, PipelineState, SelectionSet,
};
use coleta_transport::{DirectoryClient, GeoProvider, RegistryApi, TransportError};
use coleta_types::{ColetaConfig, Coordinates, ImageAttachment, NewPoint};

use crate::resolvers::{
    locality_option, LocalityResolver, PositionResolver, RegionResolver, LOCALITY_STAGE,
    POSITION_STAGE, REGION_STAGE,
};

/// Errors surfaced by the registration flow.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// One or more required fields are missing or unusable. Everything
    /// wrong is reported at once.
    #[error("submission is incomplete: {}", .missing.join(", "))]
    Incomplete { missing: Vec<String> },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("submission failed: {0}")]
    Submit(#[source] TransportError),
}

/// Drives a point registration end to end: cascading region, locality and
/// position selection, the accepted-item set, contact fields and an
/// optional storefront image, validated into a [`NewPoint`] and submitted
/// as a single multipart form.
///
/// The position stage auto-selects, so after a locality is chosen the
/// marker lands on the geocoded locality (or the observer's position, or
/// the default center). [`RegistrationFlow::pin_position`] overrides it,
/// the way dragging the marker would.
pub struct RegistrationFlow {
    pipeline: DependentPipeline,
    registry: RegistryApi,
    name: String,
    email: String,
    whatsapp: String,
    items: SelectionSet<u64>,
    image: Option<ImageAttachment>,
    pinned_position: Option<Coordinates>,
}

impl RegistrationFlow {
    const REGION: usize = 0;
    const LOCALITY: usize = 1;

    pub fn new(
        directory: DirectoryClient,
        registry: RegistryApi,
        geo: Arc<dyn GeoProvider>,
        config: &ColetaConfig,
    ) -> Self {
        let pipeline = DependentPipeline::builder()
            .stage(REGION_STAGE, RegionResolver::new(directory.clone()))
            .stage(
                LOCALITY_STAGE,
                CachedResolver::new(LocalityResolver::new(directory)),
            )
            .auto_stage(
                POSITION_STAGE,
                PositionResolver::from_config(registry.clone(), geo, config),
            )
            .spawn();
        Self {
            pipeline,
            registry,
            name: String::new(),
            email: String::new(),
            whatsapp: String::new(),
            items: SelectionSet::new(),
            image: None,
            pinned_position: None,
        }
    }

    /// Load the region options. Call once before selecting anything.
    pub async fn prime(&mut self) -> Result<(), RegisterError> {
        self.pipeline.prime().await?;
        self.pipeline.wait_settled().await?;
        Ok(())
    }

    /// Select a region by its two-letter code.
    pub async fn select_region(&mut self, code: &str) -> Result<(), RegisterError> {
        self.pipeline.select_key(Self::REGION, code).await?;
        self.pipeline.wait_settled().await?;
        Ok(())
    }

    /// Select a locality by display name (or qualified key). Settling
    /// includes the position stage, which resolves and selects on its own.
    pub async fn select_locality(&mut self, city: &str) -> Result<(), RegisterError> {
        let choice = {
            let state = self.pipeline.state();
            let stage = state
                .stage(LOCALITY_STAGE)
                .ok_or(PipelineError::StageOutOfRange(Self::LOCALITY))?;
            if !stage.is_ready() {
                return Err(PipelineError::StageNotReady(LOCALITY_STAGE.to_string()).into());
            }
            locality_option(&state, city).ok_or_else(|| PipelineError::UnknownOption {
                stage: LOCALITY_STAGE.to_string(),
                key: city.to_string(),
            })?
        };
        self.pipeline
            .set_selection(Self::LOCALITY, Some(choice))
            .await?;
        self.pipeline.wait_settled().await?;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_whatsapp(&mut self, whatsapp: impl Into<String>) {
        self.whatsapp = whatsapp.into();
    }

    /// Toggle one accepted item category.
    pub fn toggle_item(&mut self, id: u64) {
        self.items = self.items.toggle(id);
    }

    /// Attach the storefront image.
    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    /// Pin the marker somewhere other than the derived position.
    pub fn pin_position(&mut self, position: Coordinates) {
        self.pinned_position = Some(position);
    }

    /// The position that would be submitted: the pinned one if set,
    /// otherwise whatever the position stage resolved to.
    pub fn position(&self) -> Option<Coordinates> {
        if let Some(pinned) = self.pinned_position {
            return Some(pinned);
        }
        self.pipeline
            .state()
            .selected_key(POSITION_STAGE)
            .and_then(|key| key.parse().ok())
    }

    /// The latest pipeline snapshot.
    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    /// Check every field and assemble the submission.
    ///
    /// Problems are collected rather than reported one at a time, so a
    /// caller can show the whole list in one go.
    pub fn validate(&self) -> Result<NewPoint, RegisterError> {
        let state = self.pipeline.state();
        let mut missing = Vec::new();

        if self.name.trim().is_empty() {
            missing.push("name".to_string());
        }
        if !self.email.contains('@') {
            missing.push("email".to_string());
        }
        if self.whatsapp.trim().is_empty() {
            missing.push("whatsapp".to_string());
        }
        let uf = state.selected_key(REGION_STAGE).map(str::to_string);
        if uf.is_none() {
            missing.push("region".to_string());
        }
        let city = state
            .stage(LOCALITY_STAGE)
            .and_then(|stage| stage.selected.as_ref())
            .map(|choice| choice.label.clone());
        if city.is_none() {
            missing.push("locality".to_string());
        }
        let position = self.position();
        if position.is_none() {
            missing.push("position".to_string());
        }
        if self.items.is_empty() {
            missing.push("items".to_string());
        }

        match (uf, city, position) {
            (Some(uf), Some(city), Some(position)) if missing.is_empty() => Ok(NewPoint {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                whatsapp: self.whatsapp.trim().to_string(),
                position,
                city,
                uf,
                items: self.items.to_vec(),
                image: self.image.clone(),
            }),
            _ => Err(RegisterError::Incomplete { missing }),
        }
    }

    /// Validate and submit. The registry's reply comes back as-is.
    pub async fn submit(&self) -> Result<Value, RegisterError> {
        let point = self.validate()?;
        let reply = self
            .registry
            .create_point(&point)
            .await
            .map_err(RegisterError::Submit)?;
        info!(name = %point.name, city = %point.city, uf = %point.uf, "collection point registered");
        Ok(reply)
    }
}
