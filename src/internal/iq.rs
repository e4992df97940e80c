//! Hardware interrupt-vector queues.
//!
//! The chip appends one 32-bit vector per event to three circular queues in
//! shared memory. Software consumes from a read cursor and zeroes each slot
//! after reading it, so a consumed slot is always empty until the chip comes
//! around again.
//!
//! Gap check: before consuming, the slot just behind the cursor (a full
//! queue length behind the next write) must be empty. If it is not, the
//! chip lapped the cursor and events were lost. The queue is wiped, the
//! cursor enters resync mode, and the caller reconciles every ring.
//!
//! A queue holding exactly `len` unread vectors looks the same as a lapped
//! one, so it is also reported as an overflow and its vectors are dropped.
//! For the data queues the ring resync recovers every completion from the
//! descriptors themselves. A dropped action vector shows up as that action's
//! timeout.

use crate::hal::pcm::{IqQueue, PcmController};

/// Vector bit fields
pub(crate) mod entry {
    /// Slot holds a vector
    pub const VALID: u32 = 1 << 31;
    /// Channel number
    pub const CHANNEL_MASK: u32 = 0x1F;
    /// Action acknowledged (action queue)
    pub const ARACK: u32 = 1 << 9;
    /// Action failed (action queue)
    pub const ARF: u32 = 1 << 10;
    /// Frame/descriptor completed (data queues)
    pub const FI: u32 = 1 << 16;
    /// Hold descriptor reached (data queues)
    pub const HI: u32 = 1 << 17;
    /// Descriptor fetch or store error (data queues)
    pub const ERR: u32 = 1 << 18;
    /// Internal FIFO overrun or underrun (data queues)
    pub const FO: u32 = 1 << 19;
}

/// Decoded interrupt vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IqEvent(u32);

#[allow(dead_code)]
impl IqEvent {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn channel(self) -> u8 {
        (self.0 & entry::CHANNEL_MASK) as u8
    }

    pub const fn action_ok(self) -> bool {
        self.0 & entry::ARACK != 0
    }

    pub const fn action_failed(self) -> bool {
        self.0 & entry::ARF != 0
    }

    pub const fn frame_done(self) -> bool {
        self.0 & entry::FI != 0
    }

    pub const fn hold(self) -> bool {
        self.0 & entry::HI != 0
    }

    pub const fn bus_error(self) -> bool {
        self.0 & entry::ERR != 0
    }

    pub const fn fifo_error(self) -> bool {
        self.0 & entry::FO != 0
    }
}

/// One item pulled from a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drained {
    Event(IqEvent),
    Overflow,
}

/// Read cursor over one hardware queue
#[derive(Debug, Clone, Copy)]
pub(crate) struct IqCursor {
    queue: IqQueue,
    pos: usize,
    resync: bool,
}

#[allow(dead_code)]
impl IqCursor {
    pub const fn new(queue: IqQueue) -> Self {
        Self {
            queue,
            pos: 0,
            resync: false,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_resyncing(&self) -> bool {
        self.resync
    }

    /// Zero every slot and restart at slot 0.
    pub fn reset<P: PcmController>(&mut self, chip: &mut P) {
        self.wipe(chip);
        self.pos = 0;
        self.resync = false;
    }

    fn wipe<P: PcmController>(&self, chip: &mut P) {
        for slot in 0..self.queue.len() {
            chip.clear_iq_entry(self.queue, slot);
        }
    }

    fn valid<P: PcmController>(&self, chip: &mut P, slot: usize) -> bool {
        chip.iq_entry(self.queue, slot) & entry::VALID != 0
    }

    /// After a wipe, find where the chip resumed writing: the first valid
    /// slot whose predecessor is empty.
    fn find_run_start<P: PcmController>(&self, chip: &mut P) -> Option<usize> {
        let len = self.queue.len();
        (0..len)
            .map(|i| (self.pos + i) % len)
            .find(|&slot| self.valid(chip, slot) && !self.valid(chip, (slot + len - 1) % len))
    }

    /// Pull the next vector, if any.
    pub fn next<P: PcmController>(&mut self, chip: &mut P) -> Option<Drained> {
        let len = self.queue.len();
        if self.resync {
            self.pos = self.find_run_start(chip)?;
            self.resync = false;
        }

        let raw = chip.iq_entry(self.queue, self.pos);
        if raw & entry::VALID == 0 {
            return None;
        }

        let behind = (self.pos + len - 1) % len;
        if self.valid(chip, behind) {
            self.wipe(chip);
            self.resync = true;
            return Some(Drained::Overflow);
        }

        chip.clear_iq_entry(self.queue, self.pos);
        self.pos = (self.pos + 1) % len;
        Some(Drained::Event(IqEvent::from_raw(raw)))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::testing::MockPcm;

    fn drain(cursor: &mut IqCursor, chip: &mut MockPcm) -> Vec<Drained> {
        core::iter::from_fn(|| cursor.next(chip)).collect()
    }

    #[test]
    fn event_field_decoding() {
        let e = IqEvent::from_raw(entry::VALID | entry::FI | entry::ERR | 21);
        assert_eq!(e.channel(), 21);
        assert!(e.frame_done());
        assert!(e.bus_error());
        assert!(!e.fifo_error());
        assert!(!e.action_ok());
    }

    #[test]
    fn drains_in_order_and_clears() {
        let mut chip = MockPcm::new(0x1000_0000);
        chip.push_iq(IqQueue::Rx, entry::FI | 1);
        chip.push_iq(IqQueue::Rx, entry::FI | 2);
        let mut cursor = IqCursor::new(IqQueue::Rx);

        let got = drain(&mut cursor, &mut chip);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], Drained::Event(IqEvent::from_raw(entry::VALID | entry::FI | 1)));
        assert_eq!(cursor.position(), 2);
        assert_eq!(chip.iq_entry(IqQueue::Rx, 0), 0);
        assert!(cursor.next(&mut chip).is_none());
    }

    #[test]
    fn wraps_around_queue_end() {
        let mut chip = MockPcm::new(0x1000_0000);
        let mut cursor = IqCursor::new(IqQueue::Action);
        let len = IqQueue::Action.len();
        for round in 0..3 {
            for _ in 0..len - 1 {
                chip.push_iq(IqQueue::Action, entry::ARACK);
            }
            let got = drain(&mut cursor, &mut chip);
            assert_eq!(got.len(), len - 1, "round {round}");
            assert!(got.iter().all(|d| matches!(d, Drained::Event(_))));
        }
    }

    #[test]
    fn exactly_full_queue_counts_as_overflow() {
        let mut chip = MockPcm::new(0x1000_0000);
        let mut cursor = IqCursor::new(IqQueue::Rx);
        for ch in 0..IqQueue::Rx.len() {
            chip.push_iq(IqQueue::Rx, entry::FI | (ch as u32 % 32));
        }

        assert_eq!(cursor.next(&mut chip), Some(Drained::Overflow));
        assert!(cursor.is_resyncing());
        assert_eq!(chip.iq_entry(IqQueue::Rx, 0), 0);
        assert!(cursor.next(&mut chip).is_none());
    }

    #[test]
    fn lapped_queue_reports_overflow_then_resyncs() {
        let mut chip = MockPcm::new(0x1000_0000);
        let mut cursor = IqCursor::new(IqQueue::Tx);
        let len = IqQueue::Tx.len();
        for ch in 0..len + 3 {
            chip.push_iq(IqQueue::Tx, entry::FI | (ch as u32 % 32));
        }

        assert_eq!(cursor.next(&mut chip), Some(Drained::Overflow));
        assert!(cursor.is_resyncing());
        assert!(cursor.next(&mut chip).is_none());

        // Chip keeps writing from its own position.
        chip.push_iq(IqQueue::Tx, entry::FI | 7);
        chip.push_iq(IqQueue::Tx, entry::FI | 8);
        let got = drain(&mut cursor, &mut chip);
        assert_eq!(
            got,
            [
                Drained::Event(IqEvent::from_raw(entry::VALID | entry::FI | 7)),
                Drained::Event(IqEvent::from_raw(entry::VALID | entry::FI | 8)),
            ]
        );
        assert!(!cursor.is_resyncing());
    }
}
