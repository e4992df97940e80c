//! Internal Implementation Details
//!
//! Engine pieces behind the [`Controller`](crate::Controller) façade. Types in
//! this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Sizes, timeouts and codes
//! - [`dma`]: Descriptor pool, per-ring chains and ring reconciliation
//! - [`action`]: Step translation and the action state machine
//! - [`iq`]: Interrupt-vector queue cursors with the gap check
//! - [`timeslot`]: Timeslot assignment plan
//! - [`e1`]: Interface state, signalling FIFOs and the cross-connect engine

#[macro_use]
mod fmt;

pub(crate) mod action;
pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod e1;
pub(crate) mod iq;
pub(crate) mod ring;
pub(crate) mod timeslot;
