//! Synchronization Support
//!
//! This module provides [`SharedController`], which shares a [`Controller`]
//! between the task side and the chip's interrupt handler. It is a
//! critical-section protected controller whose `dispatch` delivers
//! notifications with the lock released.
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//!
//! # Example
//!
//! ```ignore
//! use e1_hdlc_mux::sync::SharedController;
//!
//! static CTRL: SharedController<Pcm, Framers> =
//!     SharedController::new(Controller::new(Pcm::new(), Framers::new(), CONFIG));
//!
//! #[interrupt]
//! fn PCM_IRQ() {
//!     CTRL.handle_interrupt();
//! }
//! ```
//!
//! [`Controller`]: crate::driver::Controller

mod shared;

pub use shared::SharedController;
