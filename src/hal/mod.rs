//! Hardware Abstraction Layer
//!
//! Narrow capability traits for the two kinds of silicon the controller
//! core drives, plus the bounded-poll helper used by synchronous setup.
//!
//! # Modules
//!
//! - [`pcm`]: PCM/HDLC controller chip: actions, interrupt queues, timer
//! - [`framer`]: E1 framers and cross-connect board registers
//! - [`poll`]: Bounded polling with an explicit timeout
//!
//! # Delay Integration
//!
//! All types that require delays use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL.

pub mod framer;
pub mod pcm;
pub mod poll;

// Re-export commonly used types
pub use framer::{FifoKind, IdleCodes, LineFramer, Substitution};
pub use pcm::{
    Action, AllChannelsAction, AllChannelsPhase, ChannelAction, ChannelCommand, CrossMatrix,
    Direction, IqQueue, PcmController, TimeslotTable, TimeslotWord,
};
pub use poll::{BoundedPoll, PollTimeout};
