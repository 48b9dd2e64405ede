//! The collection-point search flow.
//!
//! Wires a region→locality pipeline, an item [`SelectionSet`] and a
//! [`QueryTrigger`] in front of the registry's search endpoint. Results
//! follow the trigger: replaced on a fire, dropped on a cleared edge, so
//! a caller always sees results matching the current inputs or none at
//! all.

use thiserror::Error;
use tracing::{debug, info};

use coleta_pipeline::{
    CachedResolver, DependentPipeline, PipelineError, PipelineState, QueryTrigger, SelectionSet,
    TriggerEvent,
};
use coleta_transport::{DirectoryClient, RegistryApi, TransportError};
use coleta_types::{PointSummary, SearchParams};

use crate::resolvers::{
    locality_option, split_locality_key, LocalityResolver, RegionResolver, LOCALITY_STAGE,
    REGION_STAGE,
};

/// Errors surfaced by the search flow.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("search request failed: {0}")]
    Search(#[source] TransportError),
}

/// Drives a point search end to end.
///
/// Every mutation settles the pipeline and then reconciles the results
/// with the trigger, so after any method returns, [`SearchFlow::results`]
/// is exactly what the current region, locality and item selections call
/// for.
pub struct SearchFlow {
    pipeline: DependentPipeline,
    registry: RegistryApi,
    selections: SelectionSet<u64>,
    trigger: QueryTrigger<u64, SearchParams>,
    results: Vec<PointSummary>,
}

impl SearchFlow {
    const REGION: usize = 0;
    const LOCALITY: usize = 1;

    pub fn new(directory: DirectoryClient, registry: RegistryApi) -> Self {
        let pipeline = DependentPipeline::builder()
            .stage(REGION_STAGE, RegionResolver::new(directory.clone()))
            .stage(
                LOCALITY_STAGE,
                CachedResolver::new(LocalityResolver::new(directory)),
            )
            .spawn();
        let trigger =
            QueryTrigger::new(|state: &PipelineState, selections: &SelectionSet<u64>| {
                let uf = state.selected_key(REGION_STAGE)?;
                let locality = state.stage(LOCALITY_STAGE)?.selected.as_ref()?;
                let (_, city) = split_locality_key(&locality.key)?;
                Some(SearchParams::new(uf, city, selections.to_vec()))
            });
        Self {
            pipeline,
            registry,
            selections: SelectionSet::new(),
            trigger,
            results: Vec::new(),
        }
    }

    /// Load the region options. Call once before selecting anything.
    pub async fn prime(&mut self) -> Result<(), QueryError> {
        self.pipeline.prime().await?;
        self.pipeline.wait_settled().await?;
        self.sync().await
    }

    /// Select a region by its two-letter code.
    pub async fn select_region(&mut self, code: &str) -> Result<(), QueryError> {
        self.pipeline.select_key(Self::REGION, code).await?;
        self.pipeline.wait_settled().await?;
        self.sync().await
    }

    /// Select a locality by display name (or qualified key).
    pub async fn select_locality(&mut self, city: &str) -> Result<(), QueryError> {
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
        self.sync().await
    }

    /// Toggle one item category and reconcile the results.
    pub async fn toggle_item(&mut self, id: u64) -> Result<(), QueryError> {
        self.selections = self.selections.toggle(id);
        self.sync().await
    }

    /// Replace the whole item selection, reconciling once.
    pub async fn set_items(&mut self, ids: impl IntoIterator<Item = u64>) -> Result<(), QueryError> {
        self.selections = ids.into_iter().collect();
        self.sync().await
    }

    /// Issue the search again for the current inputs, e.g. after a failed
    /// attempt or to pick up newly registered points.
    pub async fn refresh(&mut self) -> Result<(), QueryError> {
        self.trigger.reset();
        self.results.clear();
        self.sync().await
    }

    /// The points matching the current inputs. Empty whenever the inputs
    /// are not query-worthy.
    pub fn results(&self) -> &[PointSummary] {
        &self.results
    }

    /// The current item selections.
    pub fn selected_items(&self) -> &SelectionSet<u64> {
        &self.selections
    }

    /// The latest pipeline snapshot.
    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    async fn sync(&mut self) -> Result<(), QueryError> {
        let state = self.pipeline.state();
        match self.trigger.evaluate(&state, &self.selections) {
            Some(TriggerEvent::Fire(params)) => {
                debug!(
                    uf = %params.uf,
                    city = %params.city,
                    items = %params.items_param(),
                    "issuing point search"
                );
                match self.registry.search_points(&params).await {
                    Ok(points) => {
                        info!(count = points.len(), "search returned");
                        self.results = points;
                        Ok(())
                    }
                    Err(error) => {
                        // Disarm so the same inputs can fire again once the
                        // registry recovers.
                        self.trigger.reset();
                        self.results.clear();
                        Err(QueryError::Search(error))
                    }
                }
            }
            Some(TriggerEvent::Cleared) => {
                debug!("inputs no longer query-worthy, dropping results");
                self.results.clear();
                Ok(())
            }
            None => Ok(()),
        }
    }
}
