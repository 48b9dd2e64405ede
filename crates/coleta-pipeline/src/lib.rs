//! Dependent selection pipeline with cascade invalidation and query gating.
//!
//! This crate is the domain-independent core of the workspace: an ordered
//! chain of selection stages where each stage's options are resolved from
//! the selection above it, plus the gate that decides when a downstream
//! query is worth issuing.
//!
//! - [`SelectionSet`]: pure-toggle multi-select membership.
//! - [`StageResolver`]: async mapping from an upstream selection to options.
//! - [`DependentPipeline`]: the stage chain itself, run by a single owning
//!   task so invalidation and commits can never interleave badly.
//! - [`QueryTrigger`]: edge-triggered, fire-once query gating.
//!
//! Nothing in here knows about regions, localities or collection points,
//! the domain crates wire those in through resolvers.

pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod selection;
pub mod stage;
pub mod trigger;

pub use error::{PipelineError, ResolutionError};
pub use pipeline::{DependentPipeline, PipelineBuilder};
pub use resolver::{CachedResolver, StageResolver, StaticResolver};
pub use selection::SelectionSet;
pub use stage::{Choice, PipelineState, Stage, StageStatus};
pub use trigger::{QueryTrigger, ReadySelections, TriggerEvent};
