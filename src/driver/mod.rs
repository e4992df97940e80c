//! Core driver components for the E1/HDLC adapter.
//!
//! This module contains the controller and the types its operations take and
//! return:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`request`] - Requests, handles and cancellation outcomes
//! - [`notify`] - Notifications and the sink traits that receive them
//! - [`status`] - Interface, channel and counter snapshots
//! - [`controller`] - The main controller implementation
//!
//! # Example
//!
//! ```ignore
//! use e1_hdlc_mux::driver::{ControllerConfig, InterfaceConfig};
//!
//! let config = ControllerConfig::new()
//!     .with_descriptor_base(0x2000_0000)
//!     .with_ais_persist_polls(5);
//! ctrl.configure_interface(0, InterfaceConfig::ENABLED | InterfaceConfig::CRC4, 0)?;
//! ```

// Submodules
pub mod config;
pub mod controller;
pub mod error;
mod interrupt;
mod line;
pub mod notify;
pub mod request;
mod scheduler;
pub mod status;

// Re-exports for convenience
pub use config::{ChannelConfig, ChannelMode, ControllerConfig, Framing, InterfaceConfig, State};
pub use controller::{Controller, ControllerDefault, ControllerSmall};
pub use error::{
    ActionError, ConfigError, ConfigResult, DmaError, DmaResult, Error, ErrorBits, IoError,
    IoResult, Result,
};
pub use notify::{ErrorSink, ErrorSource, Notification, RequestSink, StatusSink};
pub use request::{CancelOutcome, Command, Payload, Rejected, RequestId, UserRequest};
pub use status::{AlarmFlags, ChannelState, ChannelStats, DirectionStats, InterfaceStatus};
