//! Stage snapshots published by the pipeline.

use serde::Serialize;

/// One selectable option within a stage.
///
/// `key` is the stable machine identity that travels through resolvers,
/// `label` is what a front end displays. The two are often equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub key: String,
    pub label: String,
}

impl Choice {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// A choice whose label is its key.
    pub fn keyed(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
        }
    }
}

/// Lifecycle of a stage's option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Upstream has no selection, nothing to resolve against.
    Idle,
    /// A resolution is in flight.
    Loading,
    /// Options are current and selectable.
    Ready,
    /// The last resolution failed, see [`Stage::error`].
    Failed,
}

/// Snapshot of a single stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: String,
    pub selected: Option<Choice>,
    pub options: Vec<Choice>,
    pub status: StageStatus,
    /// Message of the failed resolution, present only when `status` is
    /// [`StageStatus::Failed`].
    pub error: Option<String>,
    /// Bumped on every reset and resolution start. A completion whose tag
    /// no longer matches is stale and gets dropped.
    pub generation: u64,
}

impl Stage {
    pub(crate) fn idle(id: String) -> Self {
        Self {
            id,
            selected: None,
            options: Vec::new(),
            status: StageStatus::Idle,
            error: None,
            generation: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == StageStatus::Ready
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_ref().map(|choice| choice.key.as_str())
    }
}

/// Snapshot of the whole pipeline, cheap to clone and safe to inspect off
/// the owning task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    pub stages: Vec<Stage>,
}

impl PipelineState {
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.stages.iter().position(|stage| stage.id == id)
    }

    pub fn selected_key(&self, id: &str) -> Option<&str> {
        self.stage(id).and_then(Stage::selected_key)
    }

    /// True when every stage is ready and has a selection. Always false for
    /// an empty pipeline.
    pub fn all_selected(&self) -> bool {
        !self.stages.is_empty()
            && self
                .stages
                .iter()
                .all(|stage| stage.is_ready() && stage.selected.is_some())
    }

    /// True when no resolution is in flight.
    pub fn settled(&self) -> bool {
        self.stages
            .iter()
            .all(|stage| stage.status != StageStatus::Loading)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
