//! The dependent selection pipeline.
//!
//! A pipeline is an ordered chain of stages where each stage's options are
//! derived from the previous stage's selection. All stage data is owned by
//! a single task spawned from [`PipelineBuilder::spawn`], callers interact
//! through a cloneable [`DependentPipeline`] handle that sends commands
//! over a channel and observes [`PipelineState`] snapshots through a watch.
//! No stage data is ever shared under a lock, so there is no ordering to
//! get wrong between invalidation and commit.
//!
//! Resolutions run on spawned tasks and report back with the generation
//! tag they were started under. Changing an upstream selection bumps the
//! tags of every downstream stage, which turns any still-running
//! resolution for the old selection into a stale message that is dropped
//! on arrival.

use std::sync::Arc;

use tokio::sync::mpsc::{self, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::error::{PipelineError, ResolutionError};
use crate::resolver::StageResolver;
use crate::stage::{Choice, PipelineState, Stage, StageStatus};

struct StageConfig {
    id: String,
    resolver: Arc<dyn StageResolver>,
    auto_select: bool,
}

/// Declares the stage chain before spawning the owning task.
pub struct PipelineBuilder {
    stages: Vec<StageConfig>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage resolved by `resolver`. The first stage added becomes
    /// the root and is resolved with no input.
    pub fn stage(mut self, id: impl Into<String>, resolver: impl StageResolver + 'static) -> Self {
        self.stages.push(StageConfig {
            id: id.into(),
            resolver: Arc::new(resolver),
            auto_select: false,
        });
        self
    }

    /// Append a stage that selects its first option as soon as options
    /// arrive, continuing the cascade without caller involvement.
    pub fn auto_stage(
        mut self,
        id: impl Into<String>,
        resolver: impl StageResolver + 'static,
    ) -> Self {
        self.stages.push(StageConfig {
            id: id.into(),
            resolver: Arc::new(resolver),
            auto_select: true,
        });
        self
    }

    /// Spawn the owning task and return a handle to it.
    ///
    /// Must be called inside a tokio runtime. The task exits once every
    /// handle has been dropped.
    pub fn spawn(self) -> DependentPipeline {
        let stages: Vec<StageSlot> = self
            .stages
            .into_iter()
            .map(|config| StageSlot {
                stage: Stage::idle(config.id.clone()),
                config,
            })
            .collect();
        let initial = PipelineState {
            stages: stages.iter().map(|slot| slot.stage.clone()).collect(),
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let runner = Runner {
            stages,
            self_tx: command_tx.downgrade(),
            state_tx,
        };
        tokio::spawn(runner.run(command_rx));
        DependentPipeline {
            commands: command_tx,
            state_rx,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

enum Command {
    Prime {
        ack: oneshot::Sender<Result<(), PipelineError>>,
    },
    SetSelection {
        stage: usize,
        value: Option<Choice>,
        ack: oneshot::Sender<Result<(), PipelineError>>,
    },
    Resolved {
        stage: usize,
        generation: u64,
        outcome: Result<Vec<Choice>, ResolutionError>,
    },
}

/// Handle to a running pipeline.
///
/// Cloning is cheap, all clones talk to the same owning task.
#[derive(Clone)]
pub struct DependentPipeline {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<PipelineState>,
}

impl DependentPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Reset every stage and resolve the root stage's options.
    pub async fn prime(&self) -> Result<(), PipelineError> {
        let (ack, response) = oneshot::channel();
        self.commands
            .send(Command::Prime { ack })
            .map_err(|_| PipelineError::Closed)?;
        response.await.map_err(|_| PipelineError::Closed)?
    }

    /// Select `value` on `stage`, or clear the selection with `None`.
    ///
    /// A `Some` value must be one of the stage's current options. Selecting
    /// the value that is already selected does nothing, unless the next
    /// stage failed, in which case its resolution is reissued.
    pub async fn set_selection(
        &self,
        stage: usize,
        value: Option<Choice>,
    ) -> Result<(), PipelineError> {
        let (ack, response) = oneshot::channel();
        self.commands
            .send(Command::SetSelection { stage, value, ack })
            .map_err(|_| PipelineError::Closed)?;
        response.await.map_err(|_| PipelineError::Closed)?
    }

    /// Select the option with `key` among the stage's current options.
    pub async fn select_key(&self, stage: usize, key: &str) -> Result<(), PipelineError> {
        let choice = {
            let state = self.state_rx.borrow();
            let snapshot = state
                .stages
                .get(stage)
                .ok_or(PipelineError::StageOutOfRange(stage))?;
            snapshot
                .options
                .iter()
                .find(|option| option.key == key)
                .cloned()
                .ok_or_else(|| PipelineError::UnknownOption {
                    stage: snapshot.id.clone(),
                    key: key.to_string(),
                })?
        };
        self.set_selection(stage, Some(choice)).await
    }

    /// Clear the selection on `stage`, resetting everything downstream.
    pub async fn clear(&self, stage: usize) -> Result<(), PipelineError> {
        self.set_selection(stage, None).await
    }

    /// The latest published snapshot.
    pub fn state(&self) -> PipelineState {
        self.state_rx.borrow().clone()
    }

    /// Wait for the next snapshot after the one already seen.
    pub async fn changed(&mut self) -> Result<PipelineState, PipelineError> {
        self.state_rx
            .changed()
            .await
            .map_err(|_| PipelineError::Closed)?;
        Ok(self.state_rx.borrow_and_update().clone())
    }

    /// Wait until `predicate` holds for a snapshot and return it.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Result<PipelineState, PipelineError>
    where
        F: FnMut(&PipelineState) -> bool,
    {
        loop {
            {
                let state = self.state_rx.borrow_and_update();
                if predicate(&state) {
                    return Ok(state.clone());
                }
            }
            self.state_rx
                .changed()
                .await
                .map_err(|_| PipelineError::Closed)?;
        }
    }

    /// Wait until no resolution is in flight.
    pub async fn wait_settled(&mut self) -> Result<PipelineState, PipelineError> {
        self.wait_for(PipelineState::settled).await
    }
}

struct StageSlot {
    config: StageConfig,
    stage: Stage,
}

impl StageSlot {
    fn reset(&mut self) {
        self.stage.selected = None;
        self.stage.options.clear();
        self.stage.status = StageStatus::Idle;
        self.stage.error = None;
        self.stage.generation += 1;
    }
}

struct Runner {
    stages: Vec<StageSlot>,
    // Weak so the task exits when the last handle drops. Resolver tasks
    // hold an upgraded sender only while their resolution runs.
    self_tx: WeakUnboundedSender<Command>,
    state_tx: watch::Sender<PipelineState>,
}

impl Runner {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            // Publish before acking so a caller that saw the ack also sees
            // the state the command produced.
            let ack = match command {
                Command::Prime { ack } => Some((ack, self.prime())),
                Command::SetSelection { stage, value, ack } => {
                    Some((ack, self.set_selection(stage, value)))
                }
                Command::Resolved {
                    stage,
                    generation,
                    outcome,
                } => {
                    self.complete(stage, generation, outcome);
                    None
                }
            };
            self.publish();
            if let Some((ack, result)) = ack {
                let _ = ack.send(result);
            }
        }
        debug!("pipeline task stopped, all handles dropped");
    }

    fn publish(&self) {
        let snapshot = PipelineState {
            stages: self.stages.iter().map(|slot| slot.stage.clone()).collect(),
        };
        self.state_tx.send_if_modified(move |state| {
            if *state == snapshot {
                return false;
            }
            *state = snapshot;
            true
        });
    }

    fn prime(&mut self) -> Result<(), PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::StageOutOfRange(0));
        }
        debug!("priming pipeline");
        for slot in &mut self.stages {
            slot.reset();
        }
        self.start_resolution(0, None);
        Ok(())
    }

    fn set_selection(&mut self, index: usize, value: Option<Choice>) -> Result<(), PipelineError> {
        if index >= self.stages.len() {
            return Err(PipelineError::StageOutOfRange(index));
        }
        let canonical = match value {
            None => None,
            Some(choice) => {
                let stage = &self.stages[index].stage;
                if stage.status != StageStatus::Ready {
                    return Err(PipelineError::StageNotReady(stage.id.clone()));
                }
                let Some(option) = stage.options.iter().find(|option| option.key == choice.key)
                else {
                    return Err(PipelineError::UnknownOption {
                        stage: stage.id.clone(),
                        key: choice.key,
                    });
                };
                Some(option.clone())
            }
        };

        let unchanged = self.stages[index].stage.selected == canonical;
        let next_failed = self
            .stages
            .get(index + 1)
            .is_some_and(|slot| slot.stage.status == StageStatus::Failed);
        if unchanged && !next_failed {
            debug!(
                stage = %self.stages[index].stage.id,
                "selection unchanged, nothing to do"
            );
            return Ok(());
        }

        self.stages[index].stage.selected = canonical.clone();
        for slot in self.stages[index + 1..].iter_mut() {
            slot.reset();
        }
        if let Some(input) = canonical {
            if index + 1 < self.stages.len() {
                self.start_resolution(index + 1, Some(input));
            }
        }
        Ok(())
    }

    fn start_resolution(&mut self, index: usize, input: Option<Choice>) {
        let Some(sender) = self.self_tx.upgrade() else {
            return;
        };
        let slot = &mut self.stages[index];
        slot.stage.status = StageStatus::Loading;
        slot.stage.error = None;
        slot.stage.generation += 1;
        let generation = slot.stage.generation;
        let resolver = Arc::clone(&slot.config.resolver);
        debug!(stage = %slot.stage.id, generation, "resolving stage options");
        tokio::spawn(async move {
            let outcome = resolver.resolve(input.as_ref()).await;
            let _ = sender.send(Command::Resolved {
                stage: index,
                generation,
                outcome,
            });
        });
    }

    fn complete(
        &mut self,
        index: usize,
        generation: u64,
        outcome: Result<Vec<Choice>, ResolutionError>,
    ) {
        let Some(slot) = self.stages.get_mut(index) else {
            return;
        };
        if slot.stage.generation != generation {
            debug!(
                stage = %slot.stage.id,
                stale = generation,
                current = slot.stage.generation,
                "dropping stale resolution"
            );
            return;
        }
        match outcome {
            Ok(options) => {
                debug!(stage = %slot.stage.id, count = options.len(), "stage options ready");
                slot.stage.options = options;
                slot.stage.status = StageStatus::Ready;
                slot.stage.error = None;
                let auto_pick = slot
                    .config
                    .auto_select
                    .then(|| slot.stage.options.first().cloned())
                    .flatten();
                if let Some(choice) = auto_pick {
                    if let Err(error) = self.set_selection(index, Some(choice)) {
                        warn!(stage = index, %error, "auto-selection failed");
                    }
                }
            }
            Err(error) => {
                warn!(stage = %slot.stage.id, %error, "stage resolution failed");
                slot.stage.status = StageStatus::Failed;
                slot.stage.error = Some(error.to_string());
                slot.stage.options.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticResolver;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Derives options from the upstream key: `root` or `<key>` becomes
    /// `<prefix>-1` and `<prefix>-2`.
    struct KeyedResolver;

    #[async_trait]
    impl StageResolver for KeyedResolver {
        async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
            let prefix = input.map(|c| c.key.clone()).unwrap_or_else(|| "root".into());
            Ok(vec![
                Choice::keyed(format!("{prefix}-1")),
                Choice::keyed(format!("{prefix}-2")),
            ])
        }
    }

    struct CountingResolver {
        calls: Arc<AtomicUsize>,
    }

    impl CountingResolver {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl StageResolver for CountingResolver {
        async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            KeyedResolver.resolve(input).await
        }
    }

    struct FlakyResolver {
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl StageResolver for FlakyResolver {
        async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(ResolutionError::new("flaky", "simulated outage"));
            }
            KeyedResolver.resolve(input).await
        }
    }

    /// Blocks each resolution on a per-input gate so tests control the
    /// order in which resolutions complete.
    struct GatedResolver {
        gates: HashMap<String, Arc<Semaphore>>,
    }

    #[async_trait]
    impl StageResolver for GatedResolver {
        async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
            let key = input.map(|c| c.key.clone()).unwrap_or_else(|| "root".into());
            let gate = self.gates.get(&key).expect("gate registered for input");
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ResolutionError::new("gated", "gate closed"))?;
            permit.forget();
            Ok(vec![Choice::keyed(format!("{key}-option"))])
        }
    }

    async fn settle(pipeline: &DependentPipeline) -> PipelineState {
        let mut handle = pipeline.clone();
        handle.wait_settled().await.expect("pipeline alive")
    }

    fn keys(stage: &Stage) -> Vec<&str> {
        stage.options.iter().map(|o| o.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_prime_resolves_root_and_leaves_rest_idle() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();

        let state = settle(&pipeline).await;
        assert_eq!(state.stages[0].status, StageStatus::Ready);
        assert_eq!(keys(&state.stages[0]), vec!["root-1", "root-2"]);
        assert_eq!(state.stages[1].status, StageStatus::Idle);
        assert!(state.stages[1].options.is_empty());
    }

    #[tokio::test]
    async fn test_selection_cascades_to_the_next_stage() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;

        pipeline.select_key(0, "root-1").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.selected_key("first"), Some("root-1"));
        assert_eq!(state.stages[1].status, StageStatus::Ready);
        assert_eq!(keys(&state.stages[1]), vec!["root-1-1", "root-1-2"]);
    }

    #[tokio::test]
    async fn test_reselecting_the_same_value_does_not_re_resolve() {
        let (counting, calls) = CountingResolver::new();
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", counting)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;

        pipeline.select_key(0, "root-1").await.unwrap();
        settle(&pipeline).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        pipeline.select_key(0, "root-1").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.stages[1].status, StageStatus::Ready);
    }

    #[tokio::test]
    async fn test_changing_upstream_invalidates_everything_downstream() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", KeyedResolver)
            .stage("third", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;
        pipeline.select_key(0, "root-1").await.unwrap();
        settle(&pipeline).await;
        pipeline.select_key(1, "root-1-1").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.stages[2].status, StageStatus::Ready);

        pipeline.select_key(0, "root-2").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.selected_key("first"), Some("root-2"));
        assert_eq!(state.selected_key("second"), None);
        assert_eq!(keys(&state.stages[1]), vec!["root-2-1", "root-2-2"]);
        assert_eq!(state.stages[2].status, StageStatus::Idle);
        assert!(state.stages[2].options.is_empty());
        assert_eq!(state.stages[2].selected, None);
    }

    #[tokio::test]
    async fn test_clearing_a_selection_resets_downstream() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;
        pipeline.select_key(0, "root-1").await.unwrap();
        settle(&pipeline).await;

        pipeline.clear(0).await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.selected_key("first"), None);
        assert_eq!(state.stages[1].status, StageStatus::Idle);
    }

    #[tokio::test]
    async fn test_failed_resolution_marks_stage_and_reissue_retries() {
        let flaky = FlakyResolver {
            failures_left: AtomicUsize::new(1),
        };
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", flaky)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;

        pipeline.select_key(0, "root-1").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.stages[1].status, StageStatus::Failed);
        assert!(state.stages[1].error.as_deref().unwrap().contains("outage"));

        // Same value again: normally a no-op, but the failed next stage
        // makes it reissue the resolution.
        pipeline.select_key(0, "root-1").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.stages[1].status, StageStatus::Ready);
        assert_eq!(keys(&state.stages[1]), vec!["root-1-1", "root-1-2"]);
    }

    #[tokio::test]
    async fn test_stale_resolution_is_dropped() {
        let gates: HashMap<String, Arc<Semaphore>> = [
            ("root-1".to_string(), Arc::new(Semaphore::new(0))),
            ("root-2".to_string(), Arc::new(Semaphore::new(0))),
        ]
        .into_iter()
        .collect();
        let slow_gate = Arc::clone(&gates["root-1"]);
        let fast_gate = Arc::clone(&gates["root-2"]);
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", GatedResolver { gates })
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;

        pipeline.select_key(0, "root-1").await.unwrap();
        assert_eq!(pipeline.state().stages[1].status, StageStatus::Loading);

        pipeline.select_key(0, "root-2").await.unwrap();
        fast_gate.add_permits(1);
        let state = settle(&pipeline).await;
        assert_eq!(keys(&state.stages[1]), vec!["root-2-option"]);

        // Let the superseded resolution finish; its result must not land.
        slow_gate.add_permits(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = pipeline.state();
        assert_eq!(keys(&state.stages[1]), vec!["root-2-option"]);
        assert_eq!(state.stages[1].status, StageStatus::Ready);
    }

    #[tokio::test]
    async fn test_invalid_selections_are_rejected() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;

        let err = pipeline.select_key(0, "nope").await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownOption { .. }));

        let err = pipeline
            .set_selection(1, Some(Choice::keyed("anything")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageNotReady(_)));

        let err = pipeline.set_selection(5, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::StageOutOfRange(5)));
    }

    #[tokio::test]
    async fn test_auto_stage_selects_its_first_option() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .auto_stage("second", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;

        pipeline.select_key(0, "root-2").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.selected_key("second"), Some("root-2-1"));
    }

    #[tokio::test]
    async fn test_empty_option_list_is_ready_but_unselectable() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", StaticResolver::new(Vec::new()))
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;
        pipeline.select_key(0, "root-1").await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.stages[1].status, StageStatus::Ready);
        assert!(state.stages[1].options.is_empty());

        let err = pipeline.select_key(1, "anything").await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownOption { .. }));
    }

    #[tokio::test]
    async fn test_prime_resets_previous_selections() {
        let pipeline = DependentPipeline::builder()
            .stage("first", KeyedResolver)
            .stage("second", KeyedResolver)
            .spawn();
        pipeline.prime().await.unwrap();
        settle(&pipeline).await;
        pipeline.select_key(0, "root-1").await.unwrap();
        settle(&pipeline).await;

        pipeline.prime().await.unwrap();
        let state = settle(&pipeline).await;
        assert_eq!(state.selected_key("first"), None);
        assert_eq!(state.stages[0].status, StageStatus::Ready);
        assert_eq!(state.stages[1].status, StageStatus::Idle);
    }

    #[tokio::test]
    async fn test_priming_an_empty_pipeline_errors() {
        let pipeline = DependentPipeline::builder().spawn();
        let err = pipeline.prime().await.unwrap_err();
        assert!(matches!(err, PipelineError::StageOutOfRange(0)));
    }
}
