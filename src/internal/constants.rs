//! Centralized Constants
//!
//! This module provides a single source of truth for all magic numbers and
//! configuration constants used throughout the controller core.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Topology**: channel, timeslot and interface counts
//! - **Pools**: default descriptor and request pool sizes
//! - **Interrupt queues**: hardware vector queue lengths
//! - **Timing**: frame period, action timeout, pause lengths, reset polling
//! - **Cross-connect**: wire encoding of the cross-matrix
//! - **E1 codes**: idle and alarm substitution codes
//!
//! # Note
//!
//! Hardware descriptor and interrupt-vector bit definitions remain in their
//! respective modules (`internal/dma/descriptor.rs`, `internal/iq.rs`) as they
//! are specific to those structures.

// =============================================================================
// Topology
// =============================================================================

/// Number of logical HDLC/transparent channels on the PCM controller
pub const NUM_CHANNELS: usize = 32;

/// Number of timeslots in one E1 frame
pub const NUM_TIMESLOTS: usize = 32;

/// Number of E1 line interfaces on the adapter
pub const NUM_INTERFACES: usize = 2;

/// Number of cross-connect ports (the controller side plus each E1 line)
pub const NUM_PORTS: usize = NUM_INTERFACES + 1;

/// Timeslot carrying the frame alignment signal on a framed line
pub const FAS_TIMESLOT: usize = 0;

/// Timeslot carrying channel-associated signalling in CAS mode
pub const CAS_TIMESLOT: usize = 16;

// =============================================================================
// Pools
// =============================================================================

/// Permanently allocated halt descriptors (one rx and one tx per channel)
pub const HALT_DESCRIPTORS: usize = 2 * NUM_CHANNELS;

/// Default descriptor pool size (halt descriptors included)
pub const DEFAULT_DESCRIPTORS: usize = 256;

/// Default internal request pool size
pub const DEFAULT_REQUESTS: usize = 64;

/// Maximum primitive steps one request can expand into
pub const MAX_STEPS: usize = 12;

/// Maximum buffer length a single descriptor can describe (13-bit field)
pub const MAX_BUFFER_LEN: u16 = 0x1FFF;

/// Size of one descriptor in controller bus memory
pub const DESCRIPTOR_SIZE: u32 = 16;

// =============================================================================
// Interrupt Queues
// =============================================================================

/// Action-complete interrupt queue length (entries)
pub const ACTION_IQ_LEN: usize = 32;

/// Transmit interrupt queue length (entries)
pub const TX_IQ_LEN: usize = 128;

/// Receive interrupt queue length (entries)
pub const RX_IQ_LEN: usize = 128;

// =============================================================================
// Timing Constants
// =============================================================================

/// Duration of one E1 frame in microseconds
pub const FRAME_PERIOD_US: u32 = 125;

/// Frames the chip needs in the worst case to pick up an action request
pub const ACTION_TIMEOUT_BASE_FRAMES: u32 = 4;

/// Empirical safety factor applied on top of the base action latency.
///
/// Not derived from link rate; revisit with hardware characterization data.
pub const ACTION_TIMEOUT_SAFETY_FACTOR: u32 = 4;

/// Hardware timeout armed for every action, in frames
pub const ACTION_TIMEOUT_FRAMES: u32 = ACTION_TIMEOUT_BASE_FRAMES * ACTION_TIMEOUT_SAFETY_FACTOR;

/// Frames to pause after an abort before touching channel configuration
pub const DEFAULT_PAUSE_FRAMES: u16 = 2;

/// Default chip reset timeout in microseconds
pub const RESET_TIMEOUT_US: u32 = 10_000;

/// Reset poll interval in microseconds
pub const RESET_POLL_INTERVAL_US: u32 = 50;

/// Consecutive status polls with LOS/LOF before auto-AIS engages
pub const AIS_PERSIST_POLLS: u8 = 3;

// =============================================================================
// Cross-Connect Encoding
// =============================================================================

/// Length of the flat cross-matrix (`timeslot + 32 * (interface + 1)`)
pub const CROSS_MATRIX_LEN: usize = NUM_TIMESLOTS * NUM_PORTS;

/// Reserved source value meaning "no source, transmit idle"
pub const CROSS_IDLE: u8 = 0xFF;

/// Route flag marking a reversed (mirrored) route
pub const CROSS_REVERSE: u8 = 0x80;

/// Source index bits of a cross-matrix entry
pub const CROSS_SOURCE_MASK: u8 = 0x7F;

/// Highest source index the wire format can carry
pub const CROSS_MAX_SOURCE: u8 = 127;

// =============================================================================
// E1 Substitution Codes
// =============================================================================

/// Default data idle code (A-law idle pattern)
pub const DATA_IDLE_CODE: u8 = 0xD5;

/// Default data alarm code (all ones, AIS-like)
pub const DATA_ALARM_CODE: u8 = 0xFF;

/// Default CAS idle nibble
pub const CAS_IDLE_CODE: u8 = 0x0D;

/// Default CAS alarm nibble (blocked)
pub const CAS_ALARM_CODE: u8 = 0x0F;

// =============================================================================
// Signalling FIFOs
// =============================================================================

/// Capacity of each CAS/FAS signalling FIFO in bytes
pub const FIFO_SIZE: usize = 64;

/// Default FIFO trigger level in bytes
pub const DEFAULT_FIFO_TRIGGER: usize = 16;

/// Largest signalling burst read from a framer in one status poll
pub const SIGNALLING_BURST: usize = 16;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_matrix_covers_all_ports() {
        assert_eq!(CROSS_MATRIX_LEN, 96);
    }

    #[test]
    fn idle_is_not_a_plain_source() {
        assert!(CROSS_IDLE & CROSS_SOURCE_MASK == CROSS_MAX_SOURCE);
        assert!((CROSS_MATRIX_LEN as u8) < CROSS_MAX_SOURCE);
    }

    #[test]
    fn halt_descriptors_fit_default_pool() {
        assert!(HALT_DESCRIPTORS < DEFAULT_DESCRIPTORS);
    }

    #[test]
    fn action_timeout_is_a_few_milliseconds() {
        let us = ACTION_TIMEOUT_FRAMES * FRAME_PERIOD_US;
        assert!(us >= 1_000 && us <= 10_000);
    }
}
