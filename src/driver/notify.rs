//! Notifications and the sink interfaces that receive them.
//!
//! The controller never calls out while its lock is held. Completions,
//! error reports and status deltas are queued inside the controller and
//! delivered by [`Controller::dispatch`](crate::Controller::dispatch) (or
//! `SharedController::dispatch`) after the lock is released, so a sink may
//! submit new requests without recursion.

use crate::driver::error::ErrorBits;
use crate::driver::request::{RequestId, UserRequest};
use crate::driver::status::AlarmFlags;
use crate::hal::framer::FifoKind;

/// Origin of an error report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorSource {
    /// A logical channel
    Channel(u8),
    /// An E1 interface
    Interface(u8),
    /// The controller as a whole
    Controller,
}

/// One queued notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// A request finished (successfully or not)
    Completed {
        /// Handle returned by `submit`
        id: RequestId,
        /// The request with `error` and `transferred` filled in
        request: UserRequest,
    },
    /// Coalesced error bits for one source
    Error {
        /// Where the errors came from
        source: ErrorSource,
        /// Accumulated error bits
        bits: ErrorBits,
    },
    /// Coalesced alarm delta for one interface
    StatusChange {
        /// Interface number
        interface: u8,
        /// Alarm bits that changed
        delta: AlarmFlags,
    },
    /// A signalling FIFO crossed its trigger level
    FifoTrigger {
        /// Interface number
        interface: u8,
        /// Which FIFO
        kind: FifoKind,
    },
}

/// Receives request completions
pub trait RequestSink {
    /// Called exactly once per accepted request.
    fn on_complete(&mut self, id: RequestId, request: &UserRequest);
}

/// Receives error reports
pub trait ErrorSink {
    /// Called with coalesced error bits for one source.
    fn on_error(&mut self, source: ErrorSource, bits: ErrorBits);
}

/// Receives interface status changes
pub trait StatusSink {
    /// Called with the alarm bits that changed on an interface.
    fn on_status_change(&mut self, interface: u8, delta: AlarmFlags);

    /// Called when a signalling FIFO reaches its trigger level.
    fn on_fifo_trigger(&mut self, interface: u8, kind: FifoKind) {
        let _ = (interface, kind);
    }
}

/// Deliver one notification to the matching sink.
pub(crate) fn deliver<S>(sinks: &mut S, notification: Notification)
where
    S: RequestSink + ErrorSink + StatusSink,
{
    match notification {
        Notification::Completed { id, request } => sinks.on_complete(id, &request),
        Notification::Error { source, bits } => sinks.on_error(source, bits),
        Notification::StatusChange { interface, delta } => {
            sinks.on_status_change(interface, delta);
        }
        Notification::FifoTrigger { interface, kind } => sinks.on_fifo_trigger(interface, kind),
    }
}
