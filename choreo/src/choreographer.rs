// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding participants together and driving draw passes over them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use choreo_dag::{Dag, NodeIdentity, NodeKey};
use choreo_selection::{Selection, SelectionItem, SelectionUnion};
use choreo_table::DataView;
use hashbrown::HashMap;

use crate::config::{ChoreographerConfig, DrawDispatch, ErrorHandling};
use crate::error::ChoreographerError;
use crate::event::DashboardEvent;
use crate::iteration::{DrawIteration, DrawState, IterationOutcome};
use crate::merge::{self, MergeError};
use crate::participant::{
    ControlBehavior, DrawError, Notification, Notifier, ParticipantRef, Signal,
};

/// Wires controls to participants and redraws them in dependency order.
///
/// Bindings form a graph from controls to the participants they drive.
/// Every binding is checked when it is made: it must not close a cycle, and
/// it must not give an [`Operator`](crate::Operator)'s subgraph a second
/// entry point. A rejected binding is rolled back and reported.
///
/// [`draw`](Self::draw) feeds the data to every root and starts a
/// [`DrawIteration`] over a snapshot of the bindings. The pass then advances
/// as participants report back through their [`Notifier`]s, which the host
/// drives by calling [`tick`](Self::tick) from its event loop. A new `draw`
/// supersedes the previous pass.
///
/// Errors and pass verdicts are queued as [`DashboardEvent`]s.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use choreo::{
///     Choreographer, Control, ControlBehavior, DashboardEvent, DrawError, Filter, Notifier,
///     Participant, ParticipantRef,
/// };
/// use choreo_table::{ColumnType, DataTable, DataView};
///
/// /// Draws instantly and keeps only the first row.
/// #[derive(Default)]
/// struct FirstRow {
///     input: RefCell<Option<DataView>>,
///     notifier: RefCell<Option<Notifier>>,
/// }
///
/// impl Participant for FirstRow {
///     fn attach(&self, notifier: Notifier) {
///         *self.notifier.borrow_mut() = Some(notifier);
///     }
///     fn set_data_table(&self, data: DataView) {
///         *self.input.borrow_mut() = Some(data);
///     }
///     fn draw(&self) -> Result<(), DrawError> {
///         if let Some(notifier) = self.notifier.borrow().as_ref() {
///             notifier.ready();
///         }
///         Ok(())
///     }
///     fn as_control(&self) -> Option<&dyn Control> {
///         Some(self)
///     }
/// }
///
/// impl Control for FirstRow {
///     fn behavior(&self) -> ControlBehavior<'_> {
///         ControlBehavior::Filter(self)
///     }
/// }
///
/// impl Filter for FirstRow {
///     fn apply(&self) -> Result<DataView, DrawError> {
///         let mut view = self.input.borrow().clone().ok_or(DrawError::new("no data"))?;
///         view.set_rows([0]).map_err(|e| DrawError::new(e.to_string()))?;
///         Ok(view)
///     }
/// }
///
/// let filter: ParticipantRef = Rc::new(FirstRow::default());
/// let chart = Rc::new(FirstRow::default());
/// let chart_ref: ParticipantRef = chart.clone();
///
/// let mut choreographer = Choreographer::new();
/// choreographer.bind(&filter, &chart_ref).unwrap();
///
/// let mut table = DataTable::new();
/// table.add_column(ColumnType::Number, "x");
/// table.add_row([1.0]).unwrap();
/// table.add_row([2.0]).unwrap();
/// choreographer.draw(table);
/// choreographer.run_until_idle();
///
/// assert_eq!(choreographer.take_events(), vec![DashboardEvent::Ready]);
/// assert_eq!(chart.input.borrow().as_ref().unwrap().number_of_rows(), 1);
/// ```
pub struct Choreographer {
    config: ChoreographerConfig,
    graph: Dag<ParticipantRef>,
    /// Every participant that was ever attached. Holding them keeps their
    /// keys from being reused by a new allocation.
    registry: HashMap<NodeKey, ParticipantRef>,
    /// Parents of each participant, in binding order.
    parent_order: HashMap<NodeKey, Vec<NodeKey>>,
    iteration: Option<DrawIteration>,
    sender: Sender<Notification>,
    receiver: Receiver<Notification>,
    selection: SelectionUnion<NodeKey>,
    events: VecDeque<DashboardEvent>,
}

impl fmt::Debug for Choreographer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Choreographer")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("registered", &self.registry.len())
            .field("iteration", &self.iteration)
            .field("selection", &self.selection)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Default for Choreographer {
    fn default() -> Self {
        Self::with_config(ChoreographerConfig::default())
    }
}

impl Choreographer {
    /// Creates a choreographer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a choreographer with `config`.
    #[must_use]
    pub fn with_config(config: ChoreographerConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            config,
            graph: Dag::new(),
            registry: HashMap::new(),
            parent_order: HashMap::new(),
            iteration: None,
            sender,
            receiver,
            selection: SelectionUnion::new(),
            events: VecDeque::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ChoreographerConfig {
        &self.config
    }

    /// Returns the live binding graph.
    #[must_use]
    pub fn graph(&self) -> &Dag<ParticipantRef> {
        &self.graph
    }

    /// Returns the current draw pass, if [`draw`](Self::draw) was called.
    #[must_use]
    pub fn iteration(&self) -> Option<&DrawIteration> {
        self.iteration.as_ref()
    }

    /// Returns `true` while a draw pass is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.iteration.as_ref().is_some_and(|it| !it.is_complete())
    }

    /// Returns the state of `participant` in the current draw pass.
    #[must_use]
    pub fn draw_state(&self, participant: &ParticipantRef) -> Option<DrawState> {
        self.iteration.as_ref()?.state(&participant.node_key())
    }

    /// Binds `control` to `participant`: `participant` now draws from
    /// `control`'s output.
    ///
    /// Returns `Ok(true)` if the binding is new and `Ok(false)` if it
    /// already existed. A participant receives its [`Notifier`] the first
    /// time it takes part in a binding.
    ///
    /// # Errors
    ///
    /// The binding is refused, and the error reported, if `control` is not a
    /// control, if both sides are the same participant, if it would close a
    /// cycle, or if it would leave an operator that is not the only entry
    /// point into the participants it drives.
    ///
    /// # Panics
    ///
    /// Panics instead of returning an error under [`ErrorHandling::Panic`].
    pub fn bind(
        &mut self,
        control: &ParticipantRef,
        participant: &ParticipantRef,
    ) -> Result<bool, ChoreographerError> {
        if control.as_control().is_none() {
            return Err(self.report(ChoreographerError::NotAControl {
                participant: describe(control),
            }));
        }
        let control_key = control.node_key();
        let participant_key = participant.node_key();
        if control_key == participant_key {
            return Err(self.report(ChoreographerError::SelfBinding {
                participant: describe(control),
            }));
        }

        if !self.graph.add_edge(control.clone(), participant.clone()) {
            return Ok(false);
        }
        if let Err(source) = self.graph.topological_keys() {
            self.graph.remove_edge_key(&control_key, &participant_key);
            return Err(self.report(ChoreographerError::Cycle {
                control: describe(control),
                participant: describe(participant),
                source,
            }));
        }
        if let Some(operator) = self.non_detachable_operator() {
            self.graph.remove_edge_key(&control_key, &participant_key);
            return Err(self.report(ChoreographerError::NonDetachableOperator {
                control: describe(&operator),
            }));
        }

        self.register(control);
        self.register(participant);
        self.parent_order
            .entry(participant_key.clone())
            .or_default()
            .push(control_key.clone());
        self.update_operator_dependencies();
        tracing::debug!(control = %control_key, participant = %participant_key, "bound");
        Ok(true)
    }

    /// Binds every control in `controls` to every participant in
    /// `participants`.
    ///
    /// Refused bindings are reported and skipped; the remaining pairs are
    /// still bound. Returns the number of new bindings.
    pub fn bind_all(
        &mut self,
        controls: &[ParticipantRef],
        participants: &[ParticipantRef],
    ) -> usize {
        let mut bound = 0;
        for control in controls {
            for participant in participants {
                if let Ok(true) = self.bind(control, participant) {
                    bound += 1;
                }
            }
        }
        bound
    }

    /// Removes the binding from `control` to `participant`.
    ///
    /// Returns `Ok(true)` if it existed and `Ok(false)` otherwise. The
    /// current draw pass is not affected. A participant left without
    /// bindings drops out of the dashboard selection.
    ///
    /// # Errors
    ///
    /// The binding is kept, and the error reported, if removing it would
    /// open a second way into the participants an operator drives.
    ///
    /// # Panics
    ///
    /// Panics instead of returning an error under [`ErrorHandling::Panic`].
    pub fn unbind(
        &mut self,
        control: &ParticipantRef,
        participant: &ParticipantRef,
    ) -> Result<bool, ChoreographerError> {
        if !self.graph.remove_edge(control, participant) {
            return Ok(false);
        }
        if let Some(operator) = self.non_detachable_operator() {
            self.graph.add_edge(control.clone(), participant.clone());
            return Err(self.report(ChoreographerError::NonDetachableOperator {
                control: describe(&operator),
            }));
        }

        let control_key = control.node_key();
        let participant_key = participant.node_key();
        if let Some(order) = self.parent_order.get_mut(&participant_key) {
            order.retain(|parent| *parent != control_key);
            if order.is_empty() {
                self.parent_order.remove(&participant_key);
            }
        }
        for key in [&control_key, &participant_key] {
            if !self.graph.contains_key(key) {
                self.selection.remove_participant(key);
            }
        }
        if !self.graph.contains(control)
            && let Some(ControlBehavior::Operator(operator)) =
                control.as_control().map(|c| c.behavior())
        {
            operator.set_dependencies(&[]);
        }
        self.update_operator_dependencies();
        tracing::debug!(control = %control_key, participant = %participant_key, "unbound");
        Ok(true)
    }

    /// Removes every binding, abandons the current draw pass and clears the
    /// dashboard selection.
    ///
    /// Participants keep their notifiers: binding them again does not attach
    /// a second one.
    pub fn clear(&mut self) {
        for participant in self.registry.values() {
            if let Some(ControlBehavior::Operator(operator)) =
                participant.as_control().map(|c| c.behavior())
            {
                operator.set_dependencies(&[]);
            }
        }
        self.graph.clear();
        self.parent_order.clear();
        self.iteration = None;
        self.selection.clear();
    }

    /// Feeds `data` to every root participant and starts a new draw pass.
    ///
    /// Does nothing if there are no bindings or `data` has no columns. Any
    /// pass in progress is abandoned: its queued draws never run and late
    /// notifications from participants outside the new pass are ignored.
    pub fn draw(&mut self, data: impl Into<DataView>) {
        let data = data.into();
        if self.graph.is_empty() || data.number_of_columns() == 0 {
            tracing::debug!("nothing to draw");
            return;
        }

        let roots: Vec<NodeKey> = self.graph.root_keys().cloned().collect();
        for root in &roots {
            if let Some(participant) = self.graph.get(root) {
                participant.set_data_table(data.clone());
            }
        }

        let mut iteration =
            DrawIteration::with_parent_order(self.graph.clone(), self.parent_order.clone());
        let outcome = iteration.start(&roots);
        if self.iteration.replace(iteration).is_some() {
            tracing::debug!("previous draw pass superseded");
        }
        self.finish(outcome);
        self.pump();
    }

    /// Advances the dashboard by one step.
    ///
    /// Runs the next queued draw, then handles every notification
    /// participants have sent so far. Returns `true` if there was anything
    /// to do.
    pub fn tick(&mut self) -> bool {
        let mut worked = false;
        if let Some(iteration) = self.iteration.as_mut()
            && iteration.scheduled_len() > 0
        {
            let outcome = iteration.dispatch_next();
            self.finish(outcome);
            worked = true;
        }

        let notifications: Vec<Notification> = self.receiver.try_iter().collect();
        worked |= !notifications.is_empty();
        for notification in notifications {
            self.handle_notification(notification);
        }
        self.pump();
        worked
    }

    /// Calls [`tick`](Self::tick) until there is nothing left to do.
    ///
    /// Returns the number of productive ticks. A participant that never
    /// reports back leaves its pass open, but does not keep this looping.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ticks = 0;
        while self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// Drains the queued dashboard events.
    pub fn take_events(&mut self) -> Vec<DashboardEvent> {
        self.events.drain(..).collect()
    }

    /// Returns the union of every participant's selection.
    #[must_use]
    pub fn selection(&self) -> &Selection<SelectionItem> {
        self.selection.selection()
    }

    /// Returns the selection union with its per-item owners.
    #[must_use]
    pub fn selection_union(&self) -> &SelectionUnion<NodeKey> {
        &self.selection
    }

    /// Returns `true` if the bindings are acyclic. Reports the cycle
    /// otherwise.
    pub fn are_bindings_valid(&mut self) -> bool {
        match self.graph.topological_keys() {
            Ok(_) => true,
            Err(source) => {
                self.report(ChoreographerError::InvalidBindings(source));
                false
            }
        }
    }

    /// Returns `true` if `control` is a control that may stay bound as it
    /// is.
    ///
    /// Filters always may. An operator may only if it is the single entry
    /// point into everything it drives.
    #[must_use]
    pub fn is_valid_control(&self, control: &ParticipantRef) -> bool {
        match control.as_control().map(|c| c.behavior()) {
            None => false,
            Some(ControlBehavior::Filter(_)) => true,
            Some(ControlBehavior::Operator(_)) => self.graph.is_subgraph_detachable(control),
        }
    }

    /// Intersects the rows and columns of `views`, keeping the order of the
    /// first. See [`merge_views`](crate::merge_views).
    ///
    /// # Errors
    ///
    /// Fails on an empty slice or on views rooted at different tables.
    pub fn merge_views(views: &[DataView]) -> Result<DataView, MergeError> {
        merge::merge_views(views)
    }

    fn register(&mut self, participant: &ParticipantRef) {
        let key = participant.node_key();
        if self.registry.contains_key(&key) {
            return;
        }
        participant.attach(Notifier::new(key.clone(), self.sender.clone()));
        self.registry.insert(key, participant.clone());
    }

    fn non_detachable_operator(&self) -> Option<ParticipantRef> {
        self.graph
            .values()
            .find(|node| {
                node.as_control()
                    .is_some_and(|c| c.behavior().is_operator())
                    && !self.graph.is_subgraph_detachable(node)
            })
            .cloned()
    }

    fn update_operator_dependencies(&self) {
        for node in self.graph.values() {
            if let Some(ControlBehavior::Operator(operator)) =
                node.as_control().map(|c| c.behavior())
            {
                let children = self.graph.children(node).unwrap_or_default();
                operator.set_dependencies(&children);
            }
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        let Notification {
            participant,
            signal,
        } = notification;
        match signal {
            Signal::SelectionChanged(items) => {
                if !self.graph.contains_key(&participant) {
                    tracing::trace!(participant = %participant, "unbound participant, selection ignored");
                    return;
                }
                if self
                    .selection
                    .set_participant_selection(participant.clone(), items)
                {
                    tracing::debug!(
                        participant = %participant,
                        selected = self.selection.len(),
                        "dashboard selection changed"
                    );
                }
            }
            Signal::Ready | Signal::StateChanged => {
                let Some(iteration) = self.iteration.as_mut() else {
                    tracing::trace!(participant = %participant, "no draw pass, notification ignored");
                    return;
                };
                let outcome = iteration.handle_participant_changed(&participant);
                self.finish(outcome);
            }
            Signal::Error(message) => {
                let Some(iteration) = self.iteration.as_mut() else {
                    tracing::trace!(participant = %participant, "no draw pass, error ignored");
                    return;
                };
                let outcome = iteration.handle_error(&participant, DrawError::new(message));
                self.finish(outcome);
            }
        }
    }

    /// Runs queued draws right away under [`DrawDispatch::Immediate`].
    fn pump(&mut self) {
        if self.config.dispatch != DrawDispatch::Immediate {
            return;
        }
        loop {
            let Some(iteration) = self.iteration.as_mut() else {
                return;
            };
            if iteration.scheduled_len() == 0 {
                return;
            }
            let outcome = iteration.dispatch_scheduled();
            self.finish(outcome);
        }
    }

    fn finish(&mut self, outcome: Option<IterationOutcome>) {
        let Some(outcome) = outcome else {
            return;
        };
        if outcome.is_success() {
            self.events.push_back(DashboardEvent::Ready);
            return;
        }
        let error = ChoreographerError::DrawFailed {
            errored: outcome.errored,
            failures: outcome.failures,
        };
        tracing::warn!(%error, "draw pass failed");
        self.events.push_back(DashboardEvent::Error(error));
    }

    /// Logs and queues `error`, or panics under [`ErrorHandling::Panic`].
    fn report(&mut self, error: ChoreographerError) -> ChoreographerError {
        tracing::warn!(%error, "choreographer error");
        if self.config.error_handling == ErrorHandling::Panic {
            panic!("{error}");
        }
        self.events.push_back(DashboardEvent::Error(error.clone()));
        error
    }
}

/// Names a participant as `label (key)`.
fn describe(participant: &ParticipantRef) -> String {
    format!("{} ({})", participant.label(), participant.node_key())
}
