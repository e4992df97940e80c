//! E1/HDLC Multiplexer Control Core
//!
//! A `no_std`, `no_alloc` control core for a multiplexed E1/HDLC line
//! adapter: one PCM/HDLC controller chip serving 32 HDLC channels over two
//! E1 interfaces, with a timeslot cross-connect in between.
//!
//! The crate owns everything the host side of such an adapter has to get
//! right and nothing that touches a bus directly:
//!
//! - a descriptor pool with 64 halt anchors and per-ring chains
//! - translation of channel commands into chip action sequences, executed
//!   one at a time with a timeout
//! - the fire loop that keeps every running ring pointed at its chain
//! - interrupt vector queue draining with overflow detection
//! - E1 alarm handling and the decalogue pass that derives routing,
//!   substitution masks and transmit alarms from line state
//!
//! # Architecture
//!
//! 1. **Driver Layer** ([`driver`]): [`Controller`], requests, notifications
//! 2. **HAL Layer** ([`hal`]): [`PcmController`] and [`LineFramer`], the two
//!    traits a board support crate implements
//! 3. **Sync Layer** (`sync`): ISR-safe `SharedController` wrapper
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting and logging
//! - `log`: Route internal logging through the `log` facade
//! - `critical-section`: Enable the ISR-safe `SharedController` wrapper
//!
//! # Example
//!
//! ```ignore
//! use e1_hdlc_mux::{Command, Controller, ControllerConfig, InterfaceConfig, UserRequest};
//!
//! let config = ControllerConfig::new().with_descriptor_base(DESC_BUS_ADDR);
//! let mut ctrl: Controller<_, _> = Controller::new(pcm, framers, config);
//! ctrl.start(&mut delay)?;
//!
//! ctrl.configure_interface(0, InterfaceConfig::ENABLED | InterfaceConfig::CRC4, 0)?;
//! ctrl.submit(UserRequest::timeslots(0, 0x0000_FFFE))?;
//! ctrl.submit(UserRequest::new(Command::START_RX | Command::START_TX, 0))?;
//! ctrl.submit(UserRequest::rx(0, rx_buf_addr, 512))?;
//!
//! // Interrupt handler
//! ctrl.handle_interrupt();
//! ctrl.dispatch(&mut sinks);
//!
//! // Every status_poll_interval_ms
//! ctrl.poll_status()?;
//! ```
//!
//! # Memory Requirements
//!
//! The descriptor pool is `DESCS * 16` bytes of chip-visible memory (4 KiB
//! with the default 256 descriptors) and must sit at the bus address given
//! by [`ControllerConfig::with_descriptor_base`].

#![no_std]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

// Internal implementation details (pub(crate) only); declared first so its
// logging macros are visible to every other module.
#[macro_use]
mod internal;

pub mod driver;
pub mod hal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{
    ChannelConfig, ChannelMode, ControllerConfig, Framing, InterfaceConfig, State,
};
pub use driver::controller::{Controller, ControllerDefault, ControllerSmall};
pub use driver::error::{
    ActionError, ConfigError, ConfigResult, DmaError, DmaResult, Error, ErrorBits, IoError,
    IoResult, Result,
};
pub use driver::notify::{ErrorSink, ErrorSource, Notification, RequestSink, StatusSink};
pub use driver::request::{CancelOutcome, Command, Payload, Rejected, RequestId, UserRequest};
pub use driver::status::{AlarmFlags, ChannelState, ChannelStats, InterfaceStatus};
pub use hal::{LineFramer, PcmController};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedController;

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // Action engine
        ACTION_TIMEOUT_FRAMES,
        // Interrupt queues
        ACTION_IQ_LEN,
        AIS_PERSIST_POLLS,
        // Substitution codes
        CAS_ALARM_CODE,
        CAS_IDLE_CODE,
        // Cross-connect
        CROSS_IDLE,
        CROSS_MATRIX_LEN,
        CROSS_REVERSE,
        DATA_ALARM_CODE,
        DATA_IDLE_CODE,
        // Pool sizes
        DEFAULT_DESCRIPTORS,
        DEFAULT_FIFO_TRIGGER,
        DEFAULT_PAUSE_FRAMES,
        DEFAULT_REQUESTS,
        DESCRIPTOR_SIZE,
        // Signalling
        FIFO_SIZE,
        FRAME_PERIOD_US,
        HALT_DESCRIPTORS,
        MAX_BUFFER_LEN,
        // Geometry
        NUM_CHANNELS,
        NUM_INTERFACES,
        NUM_PORTS,
        NUM_TIMESLOTS,
        RESET_POLL_INTERVAL_US,
        RESET_TIMEOUT_US,
        RX_IQ_LEN,
        TX_IQ_LEN,
    };
}
