//! Edge-triggered query gating.
//!
//! A [`QueryTrigger`] watches (pipeline state, selection set) pairs and
//! decides when a downstream query should go out. It fires at most once
//! per distinct pair, so re-publishing an unchanged state never causes a
//! duplicate request, and it reports a single [`TriggerEvent::Cleared`]
//! when a previously query-worthy state stops being one.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::selection::SelectionSet;
use crate::stage::{Choice, PipelineState};

/// What [`QueryTrigger::evaluate`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent<Q> {
    /// The inputs became query-worthy, issue the query.
    Fire(Q),
    /// The inputs stopped being query-worthy, drop stale results.
    Cleared,
}

/// Readiness check: `Some(query)` when a query should be issued for the
/// given inputs, `None` otherwise.
pub type ReadinessFn<T, Q> =
    dyn Fn(&PipelineState, &SelectionSet<T>) -> Option<Q> + Send + Sync;

/// Fire-once gate in front of a query.
///
/// An empty selection set never fires regardless of what the readiness
/// check says. Only selected keys and the selection set enter the
/// fingerprint, so a refreshed option list with unchanged selections does
/// not retrigger.
pub struct QueryTrigger<T: Ord, Q> {
    readiness: Box<ReadinessFn<T, Q>>,
    last_fired: Option<u64>,
}

impl<T: Ord + Hash, Q> QueryTrigger<T, Q> {
    pub fn new<F>(readiness: F) -> Self
    where
        F: Fn(&PipelineState, &SelectionSet<T>) -> Option<Q> + Send + Sync + 'static,
    {
        Self {
            readiness: Box::new(readiness),
            last_fired: None,
        }
    }

    /// Evaluate the gate against the current inputs.
    pub fn evaluate(
        &mut self,
        state: &PipelineState,
        selections: &SelectionSet<T>,
    ) -> Option<TriggerEvent<Q>> {
        if selections.is_empty() {
            return self.clear_edge();
        }
        match (self.readiness)(state, selections) {
            Some(query) => {
                let fingerprint = fingerprint(state, selections);
                if self.last_fired == Some(fingerprint) {
                    return None;
                }
                self.last_fired = Some(fingerprint);
                Some(TriggerEvent::Fire(query))
            }
            None => self.clear_edge(),
        }
    }

    /// True if the last evaluation fired and nothing cleared it since.
    pub fn is_armed(&self) -> bool {
        self.last_fired.is_some()
    }

    /// Forget the last fired fingerprint without emitting a clear.
    ///
    /// For when the query issued on a fire failed downstream: the next
    /// evaluation of the same inputs fires again instead of staying silent.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    fn clear_edge(&mut self) -> Option<TriggerEvent<Q>> {
        self.last_fired.take().map(|_| TriggerEvent::Cleared)
    }
}

/// Payload produced by [`QueryTrigger::when_all_selected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySelections<T> {
    /// The selected choice of every stage, in stage order.
    pub selected: Vec<Choice>,
    /// The selection set, ascending.
    pub items: Vec<T>,
}

impl<T> QueryTrigger<T, ReadySelections<T>>
where
    T: Ord + Hash + Clone,
{
    /// The standard gate: ready once every stage has resolved and carries a
    /// selection (and, as always, the selection set is non-empty).
    pub fn when_all_selected() -> Self {
        Self::new(|state, selections| {
            state.all_selected().then(|| ReadySelections {
                selected: state
                    .stages
                    .iter()
                    .filter_map(|stage| stage.selected.clone())
                    .collect(),
                items: selections.to_vec(),
            })
        })
    }
}

fn fingerprint<T: Ord + Hash>(state: &PipelineState, selections: &SelectionSet<T>) -> u64 {
    let mut hasher = DefaultHasher::new();
    state.stages.len().hash(&mut hasher);
    for stage in &state.stages {
        stage.id.hash(&mut hasher);
        stage.selected_key().hash(&mut hasher);
    }
    selections.len().hash(&mut hasher);
    for id in selections.iter() {
        id.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Stage, StageStatus};

    fn ready_stage(id: &str, selected: Option<&str>) -> Stage {
        Stage {
            id: id.to_string(),
            selected: selected.map(Choice::keyed),
            options: vec![Choice::keyed("SP"), Choice::keyed("RJ")],
            status: StageStatus::Ready,
            error: None,
            generation: 1,
        }
    }

    fn state(region: Option<&str>, locality: Option<&str>) -> PipelineState {
        PipelineState {
            stages: vec![
                ready_stage("region", region),
                ready_stage("locality", locality),
            ],
        }
    }

    fn items(ids: &[u64]) -> SelectionSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_empty_selection_set_never_fires() {
        let mut trigger = QueryTrigger::when_all_selected();
        let everything_selected = state(Some("SP"), Some("RJ"));
        assert_eq!(trigger.evaluate(&everything_selected, &items(&[])), None);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn test_fires_once_per_distinct_tuple() {
        let mut trigger = QueryTrigger::when_all_selected();
        let ready = state(Some("SP"), Some("RJ"));
        let selections = items(&[1, 2]);

        let fired = trigger.evaluate(&ready, &selections);
        assert!(matches!(fired, Some(TriggerEvent::Fire(_))));

        // Identical inputs again: silent.
        assert_eq!(trigger.evaluate(&ready, &selections), None);
        assert!(trigger.is_armed());
    }

    #[test]
    fn test_changed_selections_fire_again() {
        let mut trigger = QueryTrigger::when_all_selected();
        let ready = state(Some("SP"), Some("RJ"));

        assert!(matches!(
            trigger.evaluate(&ready, &items(&[1])),
            Some(TriggerEvent::Fire(_))
        ));
        assert!(matches!(
            trigger.evaluate(&ready, &items(&[1, 2])),
            Some(TriggerEvent::Fire(_))
        ));

        // Back to the first tuple without a clear in between still fires,
        // the previous results were for different selections.
        assert!(matches!(
            trigger.evaluate(&ready, &items(&[1])),
            Some(TriggerEvent::Fire(_))
        ));
    }

    #[test]
    fn test_losing_readiness_clears_exactly_once() {
        let mut trigger = QueryTrigger::when_all_selected();
        let ready = state(Some("SP"), Some("RJ"));
        let incomplete = state(Some("SP"), None);
        let selections = items(&[1]);

        assert!(matches!(
            trigger.evaluate(&ready, &selections),
            Some(TriggerEvent::Fire(_))
        ));
        assert_eq!(
            trigger.evaluate(&incomplete, &selections),
            Some(TriggerEvent::Cleared)
        );
        assert_eq!(trigger.evaluate(&incomplete, &selections), None);

        // Becoming ready again refires even though the tuple repeats.
        assert!(matches!(
            trigger.evaluate(&ready, &selections),
            Some(TriggerEvent::Fire(_))
        ));
    }

    #[test]
    fn test_no_clear_before_the_first_fire() {
        let mut trigger: QueryTrigger<u64, ReadySelections<u64>> =
            QueryTrigger::when_all_selected();
        let incomplete = state(None, None);
        assert_eq!(trigger.evaluate(&incomplete, &items(&[1])), None);
        assert_eq!(trigger.evaluate(&incomplete, &items(&[])), None);
    }

    #[test]
    fn test_emptying_the_selection_set_clears() {
        let mut trigger = QueryTrigger::when_all_selected();
        let ready = state(Some("SP"), Some("RJ"));

        assert!(matches!(
            trigger.evaluate(&ready, &items(&[4])),
            Some(TriggerEvent::Fire(_))
        ));
        assert_eq!(
            trigger.evaluate(&ready, &items(&[])),
            Some(TriggerEvent::Cleared)
        );
    }

    #[test]
    fn test_reset_lets_the_same_tuple_fire_again() {
        let mut trigger = QueryTrigger::when_all_selected();
        let ready = state(Some("SP"), Some("RJ"));
        let selections = items(&[1, 2]);

        assert!(matches!(
            trigger.evaluate(&ready, &selections),
            Some(TriggerEvent::Fire(_))
        ));

        trigger.reset();
        assert!(!trigger.is_armed());

        assert!(matches!(
            trigger.evaluate(&ready, &selections),
            Some(TriggerEvent::Fire(_))
        ));
    }

    #[test]
    fn test_when_all_selected_payload_carries_choices_and_items() {
        let mut trigger = QueryTrigger::when_all_selected();
        let ready = state(Some("SP"), Some("RJ"));

        let Some(TriggerEvent::Fire(payload)) = trigger.evaluate(&ready, &items(&[9, 3])) else {
            panic!("expected a fire");
        };
        let keys: Vec<&str> = payload.selected.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["SP", "RJ"]);
        assert_eq!(payload.items, vec![3, 9]);
    }
}
