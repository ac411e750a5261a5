// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choreo: dependency-driven drawing for dashboards.
//!
//! A dashboard is a set of [`Participant`]s (charts, tables, controls) that
//! all show the same data table. Some participants are [`Control`]s: a
//! range slider, a category picker, a grouping operator. Binding a control
//! to a participant means "draw this participant from what the control
//! lets through".
//!
//! The crate is organised as:
//!
//! - **Participants** ([`Participant`], [`Control`], [`Filter`], [`Operator`]):
//!   the capabilities the choreographer relies on. Drawing is asynchronous:
//!   a participant reports `ready` or `error` later through its [`Notifier`].
//! - **Draw passes** ([`DrawIteration`]): a state machine over a snapshot of
//!   the bindings. Each participant is [`Pending`](DrawState::Pending),
//!   [`Drawing`](DrawState::Drawing), [`Ready`](DrawState::Ready) or
//!   [`Error`](DrawState::Error); a participant is drawn only once all of its
//!   parents are ready, and a failure takes everything downstream with it.
//! - **Merging** ([`merge_views`]): a participant driven by several controls
//!   sees the intersection of their outputs.
//! - **The choreographer** ([`Choreographer`]): owns the bindings, validates
//!   them, starts draw passes, turns notifications into state transitions
//!   and keeps the dashboard-wide selection.
//!
//! ## Scheduling
//!
//! Everything runs on the caller's thread. Participant draws are queued and
//! [`Choreographer::tick`] runs one per call, so the host gets control back
//! between participants; notifications travel over a channel and are handled by the
//! same call. Hosts call `tick` from their event loop, or
//! [`Choreographer::run_until_idle`] when participants report back
//! synchronously.
//!
//! A new [`Choreographer::draw`] supersedes the pass in flight. There is no
//! other cancellation.
//!
//! ## Errors
//!
//! Bad bindings are rolled back and reported as [`ChoreographerError`]s,
//! both as the return value and as a queued [`DashboardEvent::Error`]. With
//! [`ErrorHandling::Panic`] they panic instead, which is handy while wiring
//! up a dashboard. Draw failures never escape: they mark the participant and
//! its dependants as failed and show up in the pass verdict.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]: pass lifecycle at `debug`, refused
//! bindings and failed draws at `warn`, ignored notifications at `trace`. It
//! never installs a subscriber.

mod choreographer;
mod config;
mod error;
mod event;
mod iteration;
mod merge;
mod participant;

pub use choreographer::Choreographer;
pub use config::{ChoreographerConfig, DrawDispatch, ErrorHandling};
pub use error::ChoreographerError;
pub use event::DashboardEvent;
pub use iteration::{DrawFailure, DrawIteration, DrawState, IterationOutcome};
pub use merge::{MergeError, merge_views};
pub use participant::{
    Control, ControlBehavior, DrawError, Filter, Notification, Notifier, Operator, Participant,
    ParticipantRef, Signal,
};
