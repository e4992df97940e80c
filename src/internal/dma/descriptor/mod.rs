//! PCM controller DMA descriptor.
//!
//! One descriptor describes one buffer to send or receive. Descriptors live
//! in memory shared with the chip, so every field is accessed through
//! [`VolatileCell`].

pub mod bits;

use bits::{control, status};

use crate::driver::error::ErrorBits;
use crate::hal::pcm::Direction;

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: VolatileCell is safe to share between threads because all access
// is through volatile operations which are atomic for u32 on the target bus.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }
}

impl<T: Copy + Default> Default for VolatileCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// DMA descriptor (16 bytes, 16-byte aligned).
#[repr(C, align(16))]
pub(crate) struct Descriptor {
    /// Length and control flags
    control: VolatileCell<u32>,
    /// Bus address of the next descriptor
    next: VolatileCell<u32>,
    /// Bus address of the data buffer
    data: VolatileCell<u32>,
    /// Completion status written by the chip
    status: VolatileCell<u32>,
}

#[allow(dead_code)]
impl Descriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 16;

    /// Create a new zeroed descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            control: VolatileCell::new(0),
            next: VolatileCell::new(0),
            data: VolatileCell::new(0),
            status: VolatileCell::new(0),
        }
    }

    /// Turn this descriptor into a ring's permanent halt anchor.
    ///
    /// A halt descriptor holds the chip and points back at itself.
    pub fn setup_halt(&self, self_addr: u32) {
        self.data.set(0);
        self.next.set(self_addr);
        self.status.set(0);
        self.control.set(control::HOLD);
    }

    /// Prepare a buffer descriptor ahead of linking it into a chain.
    ///
    /// Transmit buffers close the HDLC frame; every buffer raises a vector
    /// on completion.
    pub fn prepare(&self, dir: Direction, data: u32, len: u16, next: u32) {
        let mut flags = control::HI;
        if dir == Direction::Tx {
            flags |= control::FE;
        }
        self.data.set(data);
        self.next.set(next);
        self.status.set(0);
        self.control.set(flags | (u32::from(len) & control::LEN_MASK));
    }

    /// Bus address of the next descriptor
    #[inline(always)]
    #[must_use]
    pub fn next(&self) -> u32 {
        self.next.get()
    }

    /// Relink this descriptor.
    #[inline(always)]
    pub fn set_next(&self, next: u32) {
        self.next.set(next);
    }

    /// Buffer bus address
    #[inline(always)]
    #[must_use]
    pub fn data(&self) -> u32 {
        self.data.get()
    }

    /// Programmed buffer length
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> u16 {
        (self.control.get() & control::LEN_MASK) as u16
    }

    /// Whether the chip parks on this descriptor.
    #[inline(always)]
    #[must_use]
    pub fn is_hold(&self) -> bool {
        (self.control.get() & control::HOLD) != 0
    }

    /// Whether the chip has finished with this descriptor.
    #[inline(always)]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        (self.status.get() & status::COMPLETE) != 0
    }

    /// Bytes the chip actually moved.
    #[inline(always)]
    #[must_use]
    pub fn byte_count(&self) -> u16 {
        (self.status.get() & status::COUNT_MASK) as u16
    }

    /// Raw error flags from the status word.
    #[inline(always)]
    #[must_use]
    pub fn error_flags(&self) -> u32 {
        self.status.get() & status::ALL_ERRORS
    }

    /// Translate status error flags into request error bits.
    #[must_use]
    pub fn errors(&self, dir: Direction) -> ErrorBits {
        decode_errors(self.status.get(), dir)
    }

    /// Write back a completion status (done by the chip in silicon).
    pub fn write_status(&self, value: u32) {
        self.status.set(value);
    }

    /// Raw control word.
    #[inline(always)]
    #[must_use]
    pub fn raw_control(&self) -> u32 {
        self.control.get()
    }

    /// Clear every field.
    pub fn reset(&self) {
        self.control.set(0);
        self.next.set(0);
        self.data.set(0);
        self.status.set(0);
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw status word onto request error bits.
///
/// The shared overrun/underrun flag is resolved by direction.
pub(crate) fn decode_errors(raw: u32, dir: Direction) -> ErrorBits {
    let mut bits = ErrorBits::empty();
    if raw & status::CRC != 0 {
        bits |= ErrorBits::CRC;
    }
    if raw & status::ABORT != 0 {
        bits |= ErrorBits::ABORT;
    }
    if raw & status::OVERRUN_UNDERRUN != 0 {
        bits |= match dir {
            Direction::Rx => ErrorBits::OVERRUN,
            Direction::Tx => ErrorBits::UNDERRUN,
        };
    }
    if raw & status::SHORT != 0 {
        bits |= ErrorBits::SHORT;
    }
    if raw & status::LONG != 0 {
        bits |= ErrorBits::LONG;
    }
    if raw & status::UNFIT != 0 {
        bits |= ErrorBits::UNFIT;
    }
    if raw & status::SPLIT != 0 {
        bits |= ErrorBits::SPLIT;
    }
    if raw & status::BUS_ERROR != 0 {
        bits |= ErrorBits::BUS;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_size_and_alignment() {
        assert_eq!(core::mem::size_of::<Descriptor>(), Descriptor::SIZE);
        assert_eq!(core::mem::align_of::<Descriptor>(), 16);
    }

    #[test]
    fn halt_descriptor_holds_and_loops() {
        let d = Descriptor::new();
        d.setup_halt(0x1000_0040);
        assert!(d.is_hold());
        assert_eq!(d.next(), 0x1000_0040);
        assert!(!d.is_complete());
    }

    #[test]
    fn tx_prepare_sets_frame_end() {
        let d = Descriptor::new();
        d.prepare(Direction::Tx, 0x2000_0000, 120, 0x1000_0000);
        assert_eq!(d.len(), 120);
        assert_eq!(d.data(), 0x2000_0000);
        assert_ne!(d.raw_control() & control::FE, 0);
        assert_ne!(d.raw_control() & control::HI, 0);
        assert!(!d.is_hold());
    }

    #[test]
    fn rx_prepare_has_no_frame_end() {
        let d = Descriptor::new();
        d.prepare(Direction::Rx, 0x2000_0000, 64, 0x1000_0000);
        assert_eq!(d.raw_control() & control::FE, 0);
    }

    #[test]
    fn prepare_clears_stale_status() {
        let d = Descriptor::new();
        d.write_status(status::COMPLETE | status::CRC | 10);
        d.prepare(Direction::Rx, 0x2000_0000, 64, 0);
        assert!(!d.is_complete());
        assert_eq!(d.error_flags(), 0);
    }

    #[test]
    fn completion_reports_count_and_errors() {
        let d = Descriptor::new();
        d.write_status(status::COMPLETE | status::CRC | status::OVERRUN_UNDERRUN | 42);
        assert!(d.is_complete());
        assert_eq!(d.byte_count(), 42);
        assert_eq!(d.errors(Direction::Rx), ErrorBits::CRC | ErrorBits::OVERRUN);
        assert_eq!(d.errors(Direction::Tx), ErrorBits::CRC | ErrorBits::UNDERRUN);
    }

    #[test]
    fn decode_errors_covers_every_flag() {
        let bits = decode_errors(status::ALL_ERRORS, Direction::Rx);
        assert!(bits.contains(
            ErrorBits::CRC
                | ErrorBits::ABORT
                | ErrorBits::OVERRUN
                | ErrorBits::SHORT
                | ErrorBits::LONG
                | ErrorBits::UNFIT
                | ErrorBits::SPLIT
                | ErrorBits::BUS
        ));
        assert!(decode_errors(status::COMPLETE | 7, Direction::Tx).is_empty());
    }
}
