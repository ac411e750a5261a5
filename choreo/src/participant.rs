// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract between the choreographer and the things it draws.
//!
//! A [`Participant`] is anything that can be handed data and asked to draw
//! itself: a chart, a table, a control. Drawing is asynchronous from the
//! choreographer's point of view: [`Participant::draw`] only *starts* the
//! work, and the participant later reports the outcome through the
//! [`Notifier`] it was attached to.
//!
//! A [`Control`] is a participant whose output feeds other participants. Its
//! [`ControlBehavior`] says how:
//! - a [`Filter`] narrows its input (rows, columns) and returns a view over
//!   the same table;
//! - an [`Operator`] may restructure its input into a new table. Everything
//!   downstream of an operator must be reachable only through it.
//!
//! Participants are shared as [`ParticipantRef`] and take `&self`; keep any
//! state that changes between draws behind `Cell`/`RefCell`.

use std::rc::Rc;
use std::sync::mpsc::Sender;

use choreo_dag::NodeKey;
use choreo_selection::SelectionItem;
use choreo_table::DataView;

/// Shared handle to a participant.
///
/// The choreographer identifies participants by the allocation behind this
/// `Rc`: clones of one `Rc` are the same participant.
pub type ParticipantRef = Rc<dyn Participant>;

/// A failed draw or control application.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DrawError {
    message: String,
}

impl DrawError {
    /// Creates an error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Something the choreographer can feed data to and draw.
pub trait Participant {
    /// Hands the participant its notification channel.
    ///
    /// Called exactly once, the first time the participant is bound.
    fn attach(&self, notifier: Notifier);

    /// Sets the data for the next draw.
    fn set_data_table(&self, data: DataView);

    /// Starts drawing with the data last passed to
    /// [`set_data_table`](Self::set_data_table).
    ///
    /// Every successful call must eventually be followed by exactly one
    /// [`Notifier::ready`] or [`Notifier::error`]; until then, the draw pass
    /// this participant belongs to stays open. Returning `Err` counts as an
    /// immediate error notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the draw could not be started.
    fn draw(&self) -> Result<(), DrawError>;

    /// Returns this participant as a control, if it is one.
    fn as_control(&self) -> Option<&dyn Control> {
        None
    }

    /// Name used in logs and error messages.
    fn label(&self) -> &str {
        "participant"
    }
}

/// A participant whose output drives other participants.
pub trait Control: Participant {
    /// Returns how this control transforms its input.
    fn behavior(&self) -> ControlBehavior<'_>;
}

/// How a [`Control`] produces the data it passes downstream.
#[derive(Clone, Copy)]
pub enum ControlBehavior<'a> {
    /// Narrows its input without restructuring it.
    Filter(&'a dyn Filter),
    /// May restructure its input into a new table.
    Operator(&'a dyn Operator),
}

impl core::fmt::Debug for ControlBehavior<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Filter(_) => f.write_str("Filter"),
            Self::Operator(_) => f.write_str("Operator"),
        }
    }
}

impl ControlBehavior<'_> {
    /// Returns the control's current output.
    ///
    /// # Errors
    ///
    /// Propagates the control's failure to produce an output.
    pub fn output(&self) -> Result<DataView, DrawError> {
        match self {
            Self::Filter(filter) => filter.apply(),
            Self::Operator(operator) => operator.apply_operator(),
        }
    }

    /// Returns `true` for operators.
    #[must_use]
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Operator(_))
    }
}

/// A control that filters rows or columns of its input.
pub trait Filter {
    /// Returns the filtered view of the control's current input.
    ///
    /// The result must be rooted at the same table as the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot be applied to its input.
    fn apply(&self) -> Result<DataView, DrawError>;
}

/// A control that may restructure its input.
pub trait Operator {
    /// Returns the transformed output.
    ///
    /// Repeated calls between two draws must return views over the same
    /// table allocation, so that the outputs of the operator's descendants
    /// can be merged.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformation fails.
    fn apply_operator(&self) -> Result<DataView, DrawError>;

    /// Tells the operator which participants it currently drives.
    ///
    /// Called whenever the operator's bindings change.
    fn set_dependencies(&self, dependencies: &[ParticipantRef]);
}

/// What a participant reports through its [`Notifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    /// The last draw finished.
    Ready,
    /// The last draw failed.
    Error(String),
    /// The participant changed on its own (for example a user moved a
    /// slider) and its dependants need redrawing.
    StateChanged,
    /// The participant's selection is now exactly these items.
    SelectionChanged(Vec<SelectionItem>),
}

/// A [`Signal`] tagged with the participant that sent it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Sender.
    pub participant: NodeKey,
    /// What happened.
    pub signal: Signal,
}

/// Cloneable handle a participant uses to report back to its choreographer.
///
/// Notifications are queued and processed by the next
/// [`Choreographer::tick`](crate::Choreographer::tick), never inline.
#[derive(Clone, Debug)]
pub struct Notifier {
    participant: NodeKey,
    sender: Sender<Notification>,
}

impl Notifier {
    pub(crate) fn new(participant: NodeKey, sender: Sender<Notification>) -> Self {
        Self {
            participant,
            sender,
        }
    }

    /// Returns the key of the participant this notifier speaks for.
    #[must_use]
    pub fn participant(&self) -> &NodeKey {
        &self.participant
    }

    /// Reports that the last draw finished.
    pub fn ready(&self) {
        self.send(Signal::Ready);
    }

    /// Reports that the last draw failed.
    pub fn error(&self, message: impl Into<String>) {
        self.send(Signal::Error(message.into()));
    }

    /// Reports a change that invalidates everything downstream.
    pub fn state_changed(&self) {
        self.send(Signal::StateChanged);
    }

    /// Reports the participant's full current selection.
    pub fn selection_changed(&self, items: impl IntoIterator<Item = SelectionItem>) {
        self.send(Signal::SelectionChanged(items.into_iter().collect()));
    }

    fn send(&self, signal: Signal) {
        let notification = Notification {
            participant: self.participant.clone(),
            signal,
        };
        if self.sender.send(notification).is_err() {
            tracing::trace!(participant = %self.participant, "choreographer gone, notification dropped");
        }
    }
}
