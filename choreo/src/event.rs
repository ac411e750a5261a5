// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::error::ChoreographerError;

/// Dashboard-level notification, collected with
/// [`Choreographer::take_events`](crate::Choreographer::take_events).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardEvent {
    /// A draw pass finished and every participant is up to date.
    Ready,
    /// A structural error was reported, or a draw pass finished with
    /// failures ([`ChoreographerError::DrawFailed`]).
    Error(ChoreographerError),
}

impl DashboardEvent {
    /// Returns the error, if this is an error event.
    #[must_use]
    pub fn error(&self) -> Option<&ChoreographerError> {
        match self {
            Self::Ready => None,
            Self::Error(error) => Some(error),
        }
    }
}
