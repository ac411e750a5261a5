// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One pass of drawing participants in dependency order.

use std::collections::VecDeque;
use std::fmt;

use choreo_dag::{Dag, NodeKey};
use choreo_table::DataView;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::merge::merge_views;
use crate::participant::{DrawError, ParticipantRef};

/// Where a participant stands within a [`DrawIteration`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrawState {
    /// Waiting for its parents before it can be drawn.
    Pending,
    /// Drawn, waiting for the participant to report back.
    Drawing,
    /// Up to date.
    Ready,
    /// Failed, either itself or because something upstream failed.
    Error,
}

impl DrawState {
    /// Returns `true` for [`Ready`](Self::Ready) and [`Error`](Self::Error).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl fmt::Display for DrawState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Drawing => "drawing",
            Self::Ready => "ready",
            Self::Error => "error",
        })
    }
}

/// A participant that failed to draw.
///
/// Only direct failures are recorded; participants that ended in
/// [`DrawState::Error`] because of an upstream failure are listed in
/// [`IterationOutcome::errored`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawFailure {
    /// Key of the failed participant.
    pub participant: NodeKey,
    /// The participant's label.
    pub label: String,
    /// What went wrong.
    pub error: DrawError,
}

impl fmt::Display for DrawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.participant, self.error)
    }
}

/// Verdict of a completed draw pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IterationOutcome {
    /// Every participant that ended in [`DrawState::Error`], sorted.
    pub errored: Vec<NodeKey>,
    /// Direct failures since the pass started.
    pub failures: Vec<DrawFailure>,
}

impl IterationOutcome {
    /// Returns `true` if no participant ended in error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errored.is_empty()
    }
}

/// One pass of drawing a snapshot of the participant graph.
///
/// The iteration owns a structural copy of the graph taken when it was
/// created, so later bindings never affect a pass in flight. Every
/// participant in the snapshot starts [`Ready`](DrawState::Ready);
/// [`start`](Self::start) invalidates the given roots and everything below
/// them, so redrawing the whole graph and redrawing part of it take the same
/// path.
///
/// A participant is drawn only once all of its parents are `Ready`. Its
/// input is the merge of its parents' control outputs, with the parent
/// registered first acting as master view.
///
/// Draws are not run inline: they are queued and run one at a time by
/// [`dispatch_next`](Self::dispatch_next), or all at once by
/// [`dispatch_scheduled`](Self::dispatch_scheduled).
///
/// The iteration stays usable after it completes. A `Ready` participant that
/// changes on its own invalidates its dependants again, and the pass
/// completes a second time.
pub struct DrawIteration {
    graph: Dag<ParticipantRef>,
    states: HashMap<NodeKey, DrawState>,
    /// Parents of each participant in the order they were bound to it. The
    /// first is the master view when merging.
    parent_order: HashMap<NodeKey, Vec<NodeKey>>,
    scheduled: VecDeque<NodeKey>,
    queued: HashSet<NodeKey>,
    failures: Vec<DrawFailure>,
    completed: bool,
}

impl fmt::Debug for DrawIteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawIteration")
            .field("states", &self.states)
            .field("scheduled", &self.scheduled)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl DrawIteration {
    /// Creates an iteration over `graph`, with every participant `Ready`.
    #[must_use]
    pub fn new(graph: Dag<ParticipantRef>) -> Self {
        Self::with_parent_order(graph, HashMap::new())
    }

    /// Like [`new`](Self::new), merging each participant's inputs in the
    /// order given by `parent_order`: for every participant, its parents in
    /// the order they were bound to it.
    ///
    /// The first listed parent provides the master view. Parents missing
    /// from the list come last, ordered by key.
    #[must_use]
    pub fn with_parent_order(
        graph: Dag<ParticipantRef>,
        parent_order: HashMap<NodeKey, Vec<NodeKey>>,
    ) -> Self {
        let states = graph
            .keys()
            .map(|key| (key.clone(), DrawState::Ready))
            .collect();
        Self {
            graph,
            states,
            parent_order,
            scheduled: VecDeque::new(),
            queued: HashSet::new(),
            failures: Vec::new(),
            completed: false,
        }
    }

    /// Returns the graph snapshot.
    #[must_use]
    pub fn graph(&self) -> &Dag<ParticipantRef> {
        &self.graph
    }

    /// Returns the state of `key`, or `None` if it is not in the snapshot.
    #[must_use]
    pub fn state(&self, key: &NodeKey) -> Option<DrawState> {
        self.states.get(key).copied()
    }

    /// Returns `true` if `key` is part of the snapshot.
    #[must_use]
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.states.contains_key(key)
    }

    /// Returns the number of queued draws.
    #[must_use]
    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    /// Returns `true` if every participant is `Ready` or `Error` and no draw
    /// is queued.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.scheduled.is_empty() && self.states.values().all(|s| s.is_terminal())
    }

    /// Starts the pass from `roots`.
    ///
    /// Everything reachable from the roots, but not the roots themselves,
    /// becomes `Pending`; each root becomes `Drawing` with its draw queued.
    /// Roots missing from the snapshot are skipped. Participants already in
    /// `Error` stay there.
    ///
    /// Returns the outcome if there is nothing to draw.
    pub fn start(&mut self, roots: &[NodeKey]) -> Option<IterationOutcome> {
        self.completed = false;
        for root in roots {
            for key in self.graph.descendant_keys(root) {
                if let Some(state) = self.states.get_mut(key)
                    && *state != DrawState::Error
                {
                    *state = DrawState::Pending;
                }
            }
        }
        for root in roots {
            if self.set_state(root, DrawState::Drawing) {
                self.schedule(root);
            }
        }
        tracing::debug!(
            roots = roots.len(),
            participants = self.states.len(),
            "draw pass started"
        );
        self.check_complete()
    }

    /// Handles a `ready` or `statechange` notification from `key`.
    ///
    /// - Unknown participants, `Pending` and `Error` are ignored.
    /// - `Drawing` becomes `Ready` and any child whose parents are all
    ///   `Ready` is drawn next.
    /// - `Ready` means the participant changed on its own: everything
    ///   downstream becomes `Pending` again and is redrawn in order.
    ///
    /// Returns the outcome if this completed the pass.
    pub fn handle_participant_changed(&mut self, key: &NodeKey) -> Option<IterationOutcome> {
        let Some(state) = self.state(key) else {
            tracing::trace!(participant = %key, "notification for participant outside the pass");
            return None;
        };
        match state {
            DrawState::Pending | DrawState::Error => {
                tracing::trace!(participant = %key, %state, "notification ignored");
                return None;
            }
            DrawState::Drawing => {
                self.set_state(key, DrawState::Ready);
                tracing::debug!(participant = %key, "participant ready");
            }
            DrawState::Ready => {
                tracing::debug!(participant = %key, "participant changed, redrawing dependants");
                self.mark_dependants_pending(key);
            }
        }
        self.draw_dependants(key);
        self.check_complete()
    }

    /// Handles an error from `key`.
    ///
    /// Only a `Drawing` participant can fail. It and everything downstream of
    /// it become `Error`; unrelated branches carry on.
    ///
    /// Returns the outcome if this completed the pass.
    pub fn handle_error(&mut self, key: &NodeKey, error: DrawError) -> Option<IterationOutcome> {
        if self.state(key) != Some(DrawState::Drawing) {
            tracing::trace!(participant = %key, "error ignored, participant not drawing");
            return None;
        }
        self.fail(key, error);
        self.check_complete()
    }

    /// Runs the next queued draw.
    ///
    /// Queued participants that are no longer `Drawing` are skipped. A draw
    /// that returns `Err` is handled like an error notification.
    ///
    /// Returns the outcome if this completed the pass.
    pub fn dispatch_next(&mut self) -> Option<IterationOutcome> {
        while let Some(key) = self.scheduled.pop_front() {
            self.queued.remove(&key);
            if self.state(&key) != Some(DrawState::Drawing) {
                continue;
            }
            let Some(participant) = self.graph.get(&key).cloned() else {
                continue;
            };
            return match participant.draw() {
                Ok(()) => self.check_complete(),
                Err(error) => self.handle_error(&key, error),
            };
        }
        self.check_complete()
    }

    /// Runs the draws queued before this call.
    ///
    /// A participant is only drawn if it is still `Drawing`. A draw that
    /// returns `Err` is handled like an error notification.
    ///
    /// Returns the outcome if a failed draw completed the pass.
    pub fn dispatch_scheduled(&mut self) -> Option<IterationOutcome> {
        let batch: Vec<NodeKey> = self.scheduled.drain(..).collect();
        self.queued.clear();
        let mut outcome = None;
        for key in batch {
            if self.state(&key) != Some(DrawState::Drawing) {
                continue;
            }
            let Some(participant) = self.graph.get(&key).cloned() else {
                continue;
            };
            if let Err(error) = participant.draw() {
                outcome = self.handle_error(&key, error).or(outcome);
            }
        }
        if outcome.is_none() {
            outcome = self.check_complete();
        }
        outcome
    }

    fn schedule(&mut self, key: &NodeKey) {
        if self.queued.insert(key.clone()) {
            self.scheduled.push_back(key.clone());
        }
    }

    /// Sets the state of a participant in the snapshot. `Error` is final.
    fn set_state(&mut self, key: &NodeKey, next: DrawState) -> bool {
        match self.states.get_mut(key) {
            Some(state) if *state != DrawState::Error => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    fn mark_dependants_pending(&mut self, key: &NodeKey) {
        let mut marked = false;
        for dependant in self.graph.descendant_keys(key) {
            if let Some(state) = self.states.get_mut(dependant)
                && *state != DrawState::Error
            {
                *state = DrawState::Pending;
                marked = true;
            }
        }
        if marked {
            self.completed = false;
        }
    }

    /// Draws every `Pending` child of `key` whose parents are all `Ready`.
    fn draw_dependants(&mut self, key: &NodeKey) {
        let children: Vec<NodeKey> = self.graph.child_keys(key).cloned().collect();
        for child in children {
            if self.state(&child) != Some(DrawState::Pending) || !self.parents_ready(&child) {
                continue;
            }
            let Some(participant) = self.graph.get(&child).cloned() else {
                continue;
            };
            self.set_state(&child, DrawState::Drawing);
            match self.input_for(&child) {
                Ok(input) => {
                    participant.set_data_table(input);
                    tracing::debug!(participant = %child, "participant scheduled");
                    self.schedule(&child);
                }
                Err(error) => self.fail(&child, error),
            }
        }
    }

    fn parents_ready(&self, key: &NodeKey) -> bool {
        self.graph
            .parent_keys(key)
            .all(|parent| self.state(parent) == Some(DrawState::Ready))
    }

    /// Merges the outputs of the controls driving `key`.
    fn input_for(&self, key: &NodeKey) -> Result<DataView, DrawError> {
        let order = self.parent_order.get(key);
        let mut parents: SmallVec<[&NodeKey; 4]> = self.graph.parent_keys(key).collect();
        parents.sort_by_key(|parent| {
            let position = order
                .and_then(|order| order.iter().position(|p| p == *parent))
                .unwrap_or(usize::MAX);
            (position, *parent)
        });

        let mut outputs: SmallVec<[DataView; 4]> = SmallVec::new();
        for parent in parents {
            let participant = self
                .graph
                .get(parent)
                .ok_or_else(|| DrawError::new(format!("parent {parent} left the pass")))?;
            let control = participant.as_control().ok_or_else(|| {
                DrawError::new(format!("{} ({parent}) is not a control", participant.label()))
            })?;
            let output = control.behavior().output().map_err(|error| {
                DrawError::new(format!(
                    "{} ({parent}) failed to produce output: {error}",
                    participant.label()
                ))
            })?;
            outputs.push(output);
        }
        merge_views(&outputs).map_err(|error| DrawError::new(error.to_string()))
    }

    /// Moves `key` and everything downstream of it to `Error`.
    fn fail(&mut self, key: &NodeKey, error: DrawError) {
        let label = self
            .graph
            .get(key)
            .map_or_else(|| String::from("participant"), |p| p.label().to_owned());
        tracing::warn!(participant = %key, %label, %error, "participant failed to draw");

        self.states.insert(key.clone(), DrawState::Error);
        for dependant in self.graph.descendant_keys(key) {
            if let Some(state) = self.states.get_mut(dependant) {
                *state = DrawState::Error;
            }
        }
        self.failures.push(DrawFailure {
            participant: key.clone(),
            label,
            error,
        });
    }

    /// Reports the outcome once per completion.
    fn check_complete(&mut self) -> Option<IterationOutcome> {
        if self.completed || !self.is_complete() {
            return None;
        }
        self.completed = true;

        let mut errored: Vec<NodeKey> = self
            .states
            .iter()
            .filter(|(_, state)| **state == DrawState::Error)
            .map(|(key, _)| key.clone())
            .collect();
        errored.sort_unstable();
        let outcome = IterationOutcome {
            errored,
            failures: core::mem::take(&mut self.failures),
        };
        tracing::debug!(success = outcome.is_success(), "draw pass complete");
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{Control, ControlBehavior, Filter, Notifier, Participant};
    use choreo_dag::NodeIdentity;
    use choreo_table::{ColumnType, DataTable};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Node {
        name: &'static str,
        draws: Cell<usize>,
        fail_draw: Cell<bool>,
        input: RefCell<Option<DataView>>,
    }

    impl Participant for Node {
        fn attach(&self, _notifier: Notifier) {}

        fn set_data_table(&self, data: DataView) {
            *self.input.borrow_mut() = Some(data);
        }

        fn draw(&self) -> Result<(), DrawError> {
            self.draws.set(self.draws.get() + 1);
            if self.fail_draw.get() {
                Err(DrawError::new("boom"))
            } else {
                Ok(())
            }
        }

        fn as_control(&self) -> Option<&dyn Control> {
            Some(self)
        }

        fn label(&self) -> &str {
            self.name
        }
    }

    impl Control for Node {
        fn behavior(&self) -> ControlBehavior<'_> {
            ControlBehavior::Filter(self)
        }
    }

    impl Filter for Node {
        fn apply(&self) -> Result<DataView, DrawError> {
            self.input
                .borrow()
                .clone()
                .ok_or_else(|| DrawError::new("no input"))
        }
    }

    fn node(name: &'static str) -> Rc<Node> {
        Rc::new(Node {
            name,
            ..Node::default()
        })
    }

    fn key(node: &Rc<Node>) -> NodeKey {
        node.node_key()
    }

    fn data() -> DataView {
        let mut table = DataTable::new();
        table.add_column(ColumnType::Number, "x");
        table.add_row([1.0]).unwrap();
        DataView::from(table)
    }

    fn chain() -> (Rc<Node>, Rc<Node>, Rc<Node>, DrawIteration) {
        let (a, b, c) = (node("a"), node("b"), node("c"));
        let mut graph: Dag<ParticipantRef> = Dag::new();
        graph.add_edge(a.clone(), b.clone());
        graph.add_edge(b.clone(), c.clone());
        a.set_data_table(data());
        (a, b, c, DrawIteration::new(graph))
    }

    #[test]
    fn start_marks_descendants_pending_and_roots_drawing() {
        let (a, b, c, mut it) = chain();
        assert_eq!(it.state(&key(&a)), Some(DrawState::Ready));

        assert!(it.start(&[key(&a)]).is_none());
        assert_eq!(it.state(&key(&a)), Some(DrawState::Drawing));
        assert_eq!(it.state(&key(&b)), Some(DrawState::Pending));
        assert_eq!(it.state(&key(&c)), Some(DrawState::Pending));
        assert_eq!(it.scheduled_len(), 1);
        assert_eq!(a.draws.get(), 0);

        it.dispatch_scheduled();
        assert_eq!(a.draws.get(), 1);
    }

    #[test]
    fn ready_cascades_one_level_at_a_time() {
        let (a, b, c, mut it) = chain();
        it.start(&[key(&a)]);
        it.dispatch_scheduled();

        assert!(it.handle_participant_changed(&key(&a)).is_none());
        assert_eq!(it.state(&key(&b)), Some(DrawState::Drawing));
        assert_eq!(it.state(&key(&c)), Some(DrawState::Pending));
        assert!(b.input.borrow().is_some());

        it.dispatch_scheduled();
        it.handle_participant_changed(&key(&b));
        assert_eq!(it.state(&key(&c)), Some(DrawState::Drawing));

        it.dispatch_scheduled();
        let outcome = it.handle_participant_changed(&key(&c)).unwrap();
        assert!(outcome.is_success());
        assert_eq!(c.draws.get(), 1);
    }

    #[test]
    fn error_propagates_downstream_without_drawing() {
        let (a, b, c, mut it) = chain();
        it.start(&[key(&a)]);
        it.dispatch_scheduled();
        it.handle_participant_changed(&key(&a));
        it.dispatch_scheduled();

        let outcome = it
            .handle_error(&key(&b), DrawError::new("bad data"))
            .unwrap();
        assert_eq!(it.state(&key(&c)), Some(DrawState::Error));
        assert_eq!(c.draws.get(), 0);
        assert!(!outcome.is_success());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].label, "b");
        assert_eq!(outcome.errored.len(), 2);
    }

    #[test]
    fn error_is_only_accepted_while_drawing() {
        let (a, b, _c, mut it) = chain();
        it.start(&[key(&a)]);

        assert!(it.handle_error(&key(&b), DrawError::new("early")).is_none());
        assert_eq!(it.state(&key(&b)), Some(DrawState::Pending));
    }

    #[test]
    fn synchronous_draw_failure_becomes_error() {
        let (a, b, c, mut it) = chain();
        a.fail_draw.set(true);
        it.start(&[key(&a)]);

        let outcome = it.dispatch_scheduled().unwrap();
        assert_eq!(it.state(&key(&a)), Some(DrawState::Error));
        assert_eq!(it.state(&key(&b)), Some(DrawState::Error));
        assert_eq!(it.state(&key(&c)), Some(DrawState::Error));
        assert_eq!(outcome.failures[0].error.message(), "boom");
    }

    #[test]
    fn errors_are_final() {
        let (a, b, _c, mut it) = chain();
        it.start(&[key(&a)]);
        it.dispatch_scheduled();
        it.handle_error(&key(&a), DrawError::new("x"));

        assert!(it.handle_participant_changed(&key(&a)).is_none());
        it.start(&[key(&a)]);
        assert_eq!(it.state(&key(&a)), Some(DrawState::Error));
        assert_eq!(it.state(&key(&b)), Some(DrawState::Error));
    }

    #[test]
    fn ready_participant_change_redraws_dependants() {
        let (a, b, c, mut it) = chain();
        it.start(&[key(&a)]);
        for n in [&a, &b, &c] {
            it.dispatch_scheduled();
            it.handle_participant_changed(&key(n));
        }
        assert!(it.is_complete());

        assert!(it.handle_participant_changed(&key(&a)).is_none());
        assert_eq!(it.state(&key(&b)), Some(DrawState::Drawing));
        assert_eq!(it.state(&key(&c)), Some(DrawState::Pending));

        it.dispatch_scheduled();
        it.handle_participant_changed(&key(&b));
        it.dispatch_scheduled();
        let outcome = it.handle_participant_changed(&key(&c)).unwrap();
        assert!(outcome.is_success());
        assert_eq!(c.draws.get(), 2);
    }

    #[test]
    fn unknown_participants_are_ignored() {
        let (a, _b, _c, mut it) = chain();
        let stranger = node("stranger");
        it.start(&[key(&a)]);

        assert!(it.handle_participant_changed(&key(&stranger)).is_none());
        assert!(it.handle_error(&key(&stranger), DrawError::new("?")).is_none());
    }

    #[test]
    fn dispatch_skips_participants_no_longer_drawing() {
        let (a, _b, _c, mut it) = chain();
        it.start(&[key(&a)]);
        it.handle_error(&key(&a), DrawError::new("cancelled"));

        it.dispatch_scheduled();
        assert_eq!(a.draws.get(), 0);
    }

    #[test]
    fn dispatch_next_draws_one_sibling_at_a_time() {
        let (a, b, c) = (node("a"), node("b"), node("c"));
        let mut graph: Dag<ParticipantRef> = Dag::new();
        graph.add_edge(a.clone(), b.clone());
        graph.add_edge(a.clone(), c.clone());
        a.set_data_table(data());
        let mut it = DrawIteration::new(graph);

        it.start(&[key(&a)]);
        it.dispatch_next();
        it.handle_participant_changed(&key(&a));
        assert_eq!(it.scheduled_len(), 2);

        assert!(it.dispatch_next().is_none());
        assert_eq!(b.draws.get() + c.draws.get(), 1);
        assert_eq!(it.scheduled_len(), 1);

        it.dispatch_next();
        assert_eq!((b.draws.get(), c.draws.get()), (1, 1));
        assert_eq!(it.scheduled_len(), 0);
    }

    #[test]
    fn master_view_is_the_first_parent_bound() {
        let (first, second, shared) = (node("first"), node("second"), node("shared"));
        let mut table = DataTable::new();
        table.add_column(ColumnType::Number, "x");
        for i in 0..3 {
            table.add_row([f64::from(i)]).unwrap();
        }
        let base = DataView::from(table);
        let mut reversed = base.clone();
        reversed.set_rows([2, 1, 0]).unwrap();
        first.set_data_table(reversed);
        second.set_data_table(base);

        let mut graph: Dag<ParticipantRef> = Dag::new();
        graph.add_edge(first.clone(), shared.clone());
        graph.add_edge(second.clone(), shared.clone());
        let order = [(key(&shared), vec![key(&first), key(&second)])]
            .into_iter()
            .collect();
        let mut it = DrawIteration::with_parent_order(graph, order);

        it.start(&[key(&first), key(&second)]);
        it.dispatch_scheduled();
        it.handle_participant_changed(&key(&first));
        it.handle_participant_changed(&key(&second));

        let input = shared.input.borrow().clone().unwrap();
        assert_eq!(input.table_rows(), vec![2, 1, 0]);
    }

    #[test]
    fn empty_start_completes_immediately() {
        let (_a, _b, _c, mut it) = chain();
        let outcome = it.start(&[]).unwrap();
        assert!(outcome.is_success());
        // Reported once.
        assert!(it.dispatch_scheduled().is_none());
    }
}
