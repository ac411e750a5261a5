// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for choreographer operations.

use choreo_dag::{DagError, NodeKey};

use crate::iteration::DrawFailure;
use crate::merge::MergeError;

/// Errors reported by a [`Choreographer`](crate::Choreographer).
///
/// Participants are named as `label (key)`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChoreographerError {
    /// Only controls can drive other participants.
    #[error("{participant} is not a control and cannot drive other participants")]
    NotAControl {
        /// The would-be control.
        participant: String,
    },

    /// A participant was bound to itself.
    #[error("{participant} cannot be bound to itself")]
    SelfBinding {
        /// The participant.
        participant: String,
    },

    /// The binding would close a cycle. It was rolled back.
    #[error("binding {control} -> {participant} would create a cycle")]
    Cycle {
        /// The control side of the binding.
        control: String,
        /// The participant side of the binding.
        participant: String,
        /// The sort failure that revealed the cycle.
        source: DagError,
    },

    /// The binding would give an operator's subgraph a second entry point.
    /// It was rolled back.
    #[error("operator {control} must be the only way into the participants it drives")]
    NonDetachableOperator {
        /// The operator control.
        control: String,
    },

    /// The current bindings contain a cycle.
    #[error("participant bindings are invalid: {0}")]
    InvalidBindings(#[source] DagError),

    /// Views could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A draw pass finished with failures.
    #[error("draw pass finished with {} participant(s) in error", errored.len())]
    DrawFailed {
        /// Every participant that ended in error.
        errored: Vec<NodeKey>,
        /// Direct failures, in the order they happened.
        failures: Vec<DrawFailure>,
    },
}
