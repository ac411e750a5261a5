// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choreographer configuration.

/// What to do with structural errors (bad bindings, cycles, invalid operators).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ErrorHandling {
    /// Log the error, queue a [`DashboardEvent::Error`](crate::DashboardEvent::Error)
    /// and return it to the caller. The offending change is rolled back and
    /// later calls proceed normally.
    #[default]
    Report,
    /// Panic as soon as the error is detected.
    ///
    /// Meant for development builds, where a bad binding is a bug to fix
    /// rather than a condition to recover from.
    Panic,
}

/// When participant draws run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum DrawDispatch {
    /// Draws are queued and run by the next [`Choreographer::tick`](crate::Choreographer::tick).
    ///
    /// This gives the host a chance to run between participant draws.
    #[default]
    Deferred,
    /// Draws run before the call that scheduled them returns.
    Immediate,
}

/// Configuration for a [`Choreographer`](crate::Choreographer).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChoreographerConfig {
    /// Structural error policy.
    pub error_handling: ErrorHandling,
    /// Draw scheduling policy.
    pub dispatch: DrawDispatch,
}

impl ChoreographerConfig {
    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            error_handling: ErrorHandling::Report,
            dispatch: DrawDispatch::Deferred,
        }
    }

    /// Sets the structural error policy.
    #[must_use]
    pub const fn with_error_handling(mut self, error_handling: ErrorHandling) -> Self {
        self.error_handling = error_handling;
        self
    }

    /// Sets the draw scheduling policy.
    #[must_use]
    pub const fn with_dispatch(mut self, dispatch: DrawDispatch) -> Self {
        self.dispatch = dispatch;
        self
    }
}
