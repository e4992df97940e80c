//! Interrupt processing for the controller.
//!
//! This module extends [`Controller`] with [`handle_interrupt`], which
//! drains the chip's three interrupt vector queues, reaps completed
//! descriptors and lets the scheduler issue whatever the new state needs.
//!
//! Each queue is consumed through a cursor that checks the slot behind it
//! first: a valid entry there means the chip lapped the queue. That is
//! reported as `IQ_OVERFLOW` and every ring is re-reconciled instead of
//! trying to recover the lost entries one by one.
//!
//! [`handle_interrupt`]: Controller::handle_interrupt

use super::config::State;
use super::controller::Controller;
use super::error::ErrorBits;
use super::notify::ErrorSource;
use crate::hal::framer::LineFramer;
use crate::hal::pcm::{Direction, IqQueue, PcmController};
use crate::internal::action::Event;
use crate::internal::constants::NUM_CHANNELS;
use crate::internal::iq::Drained;

// =============================================================================
// Interrupt Handling
// =============================================================================

impl<P, F, const DESCS: usize, const REQS: usize> Controller<P, F, DESCS, REQS>
where
    P: PcmController,
    F: LineFramer,
{
    /// Process a chip interrupt.
    ///
    /// Call whenever the chip's interrupt line is asserted. Returns `false`
    /// without touching anything if the controller is not running or the
    /// chip has nothing pending, so spurious calls are harmless.
    pub fn handle_interrupt(&mut self) -> bool {
        if self.state != State::Running || !self.chip.interrupt_pending() {
            return false;
        }
        self.chip.acknowledge_interrupt();

        self.drain_action_queue();
        self.drain_data_queue(Direction::Tx);
        self.drain_data_queue(Direction::Rx);

        if self.chip.timer_expired() && self.machine.on_timer() == Event::Settled {
            trace!("action timer expired");
        }

        self.process_outcome();
        self.reap_dirty();
        self.schedule();
        true
    }

    fn drain_action_queue(&mut self) {
        let queue = IqQueue::Action;
        let mut cursor = self.cursors[queue.index()];
        while let Some(item) = cursor.next(&mut self.chip) {
            match item {
                Drained::Event(event) => {
                    let ok = event.action_ok() && !event.action_failed();
                    if self.machine.on_ack(ok) == Event::Settled {
                        self.chip.cancel_timer();
                    } else {
                        trace!("stray action vector {}", event.raw());
                    }
                }
                Drained::Overflow => self.on_queue_overflow(queue),
            }
        }
        self.cursors[queue.index()] = cursor;
    }

    fn drain_data_queue(&mut self, dir: Direction) {
        let queue = IqQueue::for_direction(dir);
        let mut cursor = self.cursors[queue.index()];
        while let Some(item) = cursor.next(&mut self.chip) {
            let event = match item {
                Drained::Event(event) => event,
                Drained::Overflow => {
                    self.on_queue_overflow(queue);
                    continue;
                }
            };
            let ch = event.channel();
            if (ch as usize) >= NUM_CHANNELS {
                continue;
            }
            self.rings[dir.index()][ch as usize].dirty = true;
            if event.bus_error() {
                self.report(ErrorSource::Channel(ch), ErrorBits::BUS);
            }
            if event.fifo_error() {
                let bits = match dir {
                    Direction::Rx => ErrorBits::OVERRUN,
                    Direction::Tx => ErrorBits::UNDERRUN,
                };
                self.report(ErrorSource::Channel(ch), bits);
            }
        }
        self.cursors[queue.index()] = cursor;
    }

    fn on_queue_overflow(&mut self, queue: IqQueue) {
        warn!("interrupt queue {} overflow, resynchronizing", queue.index());
        self.report(ErrorSource::Controller, ErrorBits::IQ_OVERFLOW);
        for ring in self.rings.iter_mut().flatten() {
            ring.dirty = true;
        }
    }

    // =========================================================================
    // Reaping
    // =========================================================================

    fn reap_dirty(&mut self) {
        for dir in Direction::ALL {
            for ch in 0..NUM_CHANNELS as u8 {
                if self.rings[dir.index()][ch as usize].dirty {
                    self.reap(dir, ch);
                }
            }
        }
    }

    /// Complete every finished descriptor at the head of a ring.
    ///
    /// The chip finishes descriptors in chain order, so reaping stops at
    /// the first one it has not released.
    pub(super) fn reap(&mut self, dir: Direction, channel: u8) {
        let (d, c) = (dir.index(), channel as usize);
        loop {
            let Some(head) = self.rings[d][c].chain.head() else {
                break;
            };
            let desc = self.pool.desc(head);
            if !desc.is_complete() {
                break;
            }
            let bytes = desc.byte_count();
            let errors = desc.errors(dir);
            let handle = self.pool.handle(head);
            let owner = self.pool.owner(head);

            self.rings[d][c].chain.pop_head(&self.pool);
            self.release_descriptor(handle);
            self.stats[c].dir_mut(dir).record(bytes, errors);
            if errors.intersects(ErrorBits::PROTOCOL | ErrorBits::BUS) {
                self.report(ErrorSource::Channel(channel), errors);
            }

            if let Some(slot) = owner {
                let slot = usize::from(slot);
                let mut bits = errors;
                if self.slots[slot].cancelled {
                    bits |= ErrorBits::CANCELLED;
                }
                self.complete(slot, bits, bytes);
            }
        }
    }
}
