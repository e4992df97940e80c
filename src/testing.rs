//! Testing utilities and mock implementations
//!
//! Host-side stand-ins for the PCM controller chip, the E1 framers and the
//! delay provider, plus a sink that records every notification.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::vec;
use std::vec::Vec;

use crate::driver::config::InterfaceConfig;
use crate::driver::error::ErrorBits;
use crate::driver::notify::{ErrorSink, ErrorSource, RequestSink, StatusSink};
use crate::driver::request::{RequestId, UserRequest};
use crate::driver::status::AlarmFlags;
use crate::hal::framer::{FifoKind, IdleCodes, LineFramer, Substitution};
use crate::hal::pcm::{
    Action, AllChannelsPhase, ChannelCommand, Direction, IqQueue, PcmController,
};
use crate::internal::constants::{NUM_CHANNELS, NUM_INTERFACES, NUM_PORTS};
use crate::internal::dma::pool::halt_address;
use crate::internal::iq::entry;

// =============================================================================
// Mock PCM Controller
// =============================================================================

/// Scripted PCM/HDLC controller chip
///
/// Records every action, keeps the three interrupt queues in plain memory
/// and a current-descriptor register per ring. Acknowledging an action
/// applies its effect on those registers the way the silicon would.
#[derive(Debug)]
pub struct MockPcm {
    /// Every action issued, in order
    pub actions: Vec<Action>,
    /// Action waiting for `ack_action`
    pub outstanding: Option<Action>,
    bus_base: u32,
    cur: [[u32; NUM_CHANNELS]; 2],
    iq: [Vec<u32>; 3],
    write_pos: [usize; 3],
    /// Frames the timer was last armed with
    pub timer: Option<u32>,
    expired: bool,
    irq: bool,
    /// `reset_done` polls that report "still resetting"
    pub reset_delay: u32,
    /// Soft resets requested
    pub resets: u32,
}

impl MockPcm {
    /// Chip whose descriptor pool lives at `bus_base`, every ring parked on
    /// its halt descriptor.
    pub fn new(bus_base: u32) -> Self {
        let mut cur = [[0; NUM_CHANNELS]; 2];
        for dir in Direction::ALL {
            for ch in 0..NUM_CHANNELS {
                cur[dir.index()][ch] = halt_address(bus_base, dir, ch as u8);
            }
        }
        Self {
            actions: Vec::new(),
            outstanding: None,
            bus_base,
            cur,
            iq: IqQueue::ALL.map(|q| vec![0; q.len()]),
            write_pos: [0; 3],
            timer: None,
            expired: false,
            irq: false,
            reset_delay: 0,
            resets: 0,
        }
    }

    /// Append a vector at the chip's own write position (VALID is added).
    pub fn push_iq(&mut self, queue: IqQueue, bits: u32) {
        let q = queue.index();
        let pos = self.write_pos[q];
        self.iq[q][pos] = entry::VALID | bits;
        self.write_pos[q] = (pos + 1) % queue.len();
        self.irq = true;
    }

    /// Current-descriptor register of a ring
    pub fn cur(&self, dir: Direction, channel: u8) -> u32 {
        self.cur[dir.index()][channel as usize]
    }

    /// Move a ring's current-descriptor register.
    pub fn set_cur(&mut self, dir: Direction, channel: u8, addr: u32) {
        self.cur[dir.index()][channel as usize] = addr;
    }

    fn halt(&self, dir: Direction, channel: u8) -> u32 {
        halt_address(self.bus_base, dir, channel)
    }

    fn apply_command(&mut self, dir: Direction, channel: u8, cmd: ChannelCommand, start: u32) {
        match cmd {
            ChannelCommand::Init => self.set_cur(dir, channel, start),
            ChannelCommand::Abort | ChannelCommand::Off | ChannelCommand::Clear => {
                let halt = self.halt(dir, channel);
                self.set_cur(dir, channel, halt);
            }
            ChannelCommand::Unchanged => {}
        }
    }

    fn apply(&mut self, action: &Action) {
        match *action {
            Action::Channel(a) => {
                self.apply_command(Direction::Rx, a.channel, a.rx, a.rx_start);
                self.apply_command(Direction::Tx, a.channel, a.tx, a.tx_start);
            }
            Action::AllChannels(a) => {
                for ch in 0..NUM_CHANNELS as u8 {
                    for (dir, mask, start) in [
                        (Direction::Rx, a.rx_mask, a.rx_start[ch as usize]),
                        (Direction::Tx, a.tx_mask, a.tx_start[ch as usize]),
                    ] {
                        if mask & (1 << ch) == 0 {
                            continue;
                        }
                        match a.phase {
                            AllChannelsPhase::Abort => {
                                let halt = self.halt(dir, ch);
                                self.set_cur(dir, ch, halt);
                            }
                            AllChannelsPhase::Restore => self.set_cur(dir, ch, start),
                            AllChannelsPhase::Clear | AllChannelsPhase::Load => {}
                        }
                    }
                }
            }
            Action::Jump {
                dir,
                channel,
                address,
            } => self.set_cur(dir, channel, address),
            Action::FastAbort { dir, channel } => {
                let halt = self.halt(dir, channel);
                self.set_cur(dir, channel, halt);
            }
            Action::Timeslots(_) | Action::CrossConnect(_) => {}
        }
    }

    /// Answer the outstanding action through the action queue.
    ///
    /// Returns the action that was answered.
    pub fn ack_action(&mut self, ok: bool) -> Option<Action> {
        let action = self.outstanding.take()?;
        if ok {
            self.apply(&action);
        }
        let channel = match action {
            Action::Channel(a) => u32::from(a.channel),
            Action::Jump { channel, .. } | Action::FastAbort { channel, .. } => u32::from(channel),
            _ => 0,
        };
        let bits = if ok { entry::ARACK } else { entry::ARF };
        self.push_iq(IqQueue::Action, bits | channel);
        Some(action)
    }

    /// Let the armed timer run out.
    pub fn expire_timer(&mut self) {
        if self.timer.take().is_some() {
            self.expired = true;
            self.irq = true;
        }
    }

    /// Issued actions matching a predicate
    pub fn count_actions(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }

    /// Jumps issued for one ring
    pub fn jumps(&self, dir: Direction, channel: u8) -> usize {
        self.count_actions(|a| {
            matches!(a, Action::Jump { dir: d, channel: c, .. } if *d == dir && *c == channel)
        })
    }
}

impl PcmController for MockPcm {
    fn issue_action(&mut self, action: &Action) {
        assert!(self.outstanding.is_none(), "second action issued while one is outstanding");
        self.actions.push(*action);
        self.outstanding = Some(*action);
    }

    fn current_descriptor(&mut self, dir: Direction, channel: u8) -> u32 {
        self.cur(dir, channel)
    }

    fn iq_entry(&mut self, queue: IqQueue, slot: usize) -> u32 {
        self.iq[queue.index()][slot]
    }

    fn clear_iq_entry(&mut self, queue: IqQueue, slot: usize) {
        self.iq[queue.index()][slot] = 0;
    }

    fn interrupt_pending(&mut self) -> bool {
        self.irq
    }

    fn acknowledge_interrupt(&mut self) {
        self.irq = false;
    }

    fn arm_timer(&mut self, frames: u32) {
        self.timer = Some(frames);
        self.expired = false;
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }

    fn timer_expired(&mut self) -> bool {
        core::mem::take(&mut self.expired)
    }

    fn soft_reset(&mut self) {
        self.resets += 1;
        self.outstanding = None;
        self.timer = None;
        self.expired = false;
    }

    fn reset_done(&mut self) -> bool {
        if self.reset_delay == 0 {
            true
        } else {
            self.reset_delay -= 1;
            false
        }
    }
}

// =============================================================================
// Mock Line Framer
// =============================================================================

/// Recording E1 framer
#[derive(Debug, Default)]
pub struct MockFramer {
    /// Raw status byte returned per interface
    pub status: [u8; NUM_INTERFACES],
    /// Signalling bytes waiting to be read, per interface and kind
    pub signalling: [[Vec<u8>; 2]; NUM_INTERFACES],
    /// `configure` calls
    pub configured: Vec<(u8, InterfaceConfig, u32)>,
    /// `write_substitution` calls
    pub substitutions: Vec<(u8, Substitution)>,
    /// `set_transmit_ais` calls
    pub ais: Vec<(u8, bool)>,
    /// `set_remote_alarms` calls
    pub remote: Vec<(u8, bool, bool)>,
    /// Last codes loaded
    pub idle_codes: Option<IdleCodes>,
}

impl MockFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register writes made by the alarm engine
    pub fn writes(&self) -> usize {
        self.substitutions.len() + self.ais.len() + self.remote.len()
    }

    /// Most recent substitution written to a port
    pub fn substitution(&self, port: usize) -> Substitution {
        assert!(port < NUM_PORTS);
        self.substitutions
            .iter()
            .rev()
            .find(|(p, _)| *p as usize == port)
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    /// Most recent transmit AIS state of an interface
    pub fn transmit_ais(&self, interface: u8) -> bool {
        self.ais
            .iter()
            .rev()
            .find(|(i, _)| *i == interface)
            .is_some_and(|(_, on)| *on)
    }
}

impl LineFramer for MockFramer {
    fn configure(&mut self, interface: u8, config: InterfaceConfig, unframed_mask: u32) {
        self.configured.push((interface, config, unframed_mask));
    }

    fn read_status(&mut self, interface: u8) -> u8 {
        self.status[interface as usize]
    }

    fn read_signalling(&mut self, interface: u8, kind: FifoKind, buf: &mut [u8]) -> usize {
        let pending = &mut self.signalling[interface as usize][kind.index()];
        let n = buf.len().min(pending.len());
        for (dst, src) in buf.iter_mut().zip(pending.drain(..n)) {
            *dst = src;
        }
        n
    }

    fn write_substitution(&mut self, port: u8, subst: &Substitution) {
        self.substitutions.push((port, *subst));
    }

    fn set_transmit_ais(&mut self, interface: u8, on: bool) {
        self.ais.push((interface, on));
    }

    fn set_remote_alarms(&mut self, interface: u8, ra: bool, rma: bool) {
        self.remote.push((interface, ra, rma));
    }

    fn set_idle_codes(&mut self, codes: &IdleCodes) {
        self.idle_codes = Some(*codes);
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

// =============================================================================
// Recording Sinks
// =============================================================================

/// Sink that records every notification it receives
#[derive(Debug, Default)]
pub struct RecordingSinks {
    pub completions: Vec<(RequestId, UserRequest)>,
    pub errors: Vec<(ErrorSource, ErrorBits)>,
    pub status: Vec<(u8, AlarmFlags)>,
    pub fifo: Vec<(u8, FifoKind)>,
}

impl RecordingSinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions delivered for one request
    pub fn completions_of(&self, id: RequestId) -> usize {
        self.completions.iter().filter(|(i, _)| *i == id).count()
    }

    /// Error bits reported for a source, merged
    pub fn errors_of(&self, source: ErrorSource) -> ErrorBits {
        self.errors
            .iter()
            .filter(|(s, _)| *s == source)
            .fold(ErrorBits::empty(), |acc, (_, bits)| acc | *bits)
    }
}

impl RequestSink for RecordingSinks {
    fn on_complete(&mut self, id: RequestId, request: &UserRequest) {
        self.completions.push((id, *request));
    }
}

impl ErrorSink for RecordingSinks {
    fn on_error(&mut self, source: ErrorSource, bits: ErrorBits) {
        self.errors.push((source, bits));
    }
}

impl StatusSink for RecordingSinks {
    fn on_status_change(&mut self, interface: u8, delta: AlarmFlags) {
        self.status.push((interface, delta));
    }

    fn on_fifo_trigger(&mut self, interface: u8, kind: FifoKind) {
        self.fifo.push((interface, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_pcm_parks_rings_on_halt() {
        let chip = MockPcm::new(0x1000_0000);
        assert_eq!(chip.cur(Direction::Rx, 0), 0x1000_0000);
        assert_eq!(chip.cur(Direction::Tx, 0), 0x1000_0000 + 32 * 16);
    }

    #[test]
    fn mock_pcm_jump_applies_on_ack() {
        let mut chip = MockPcm::new(0x1000_0000);
        chip.issue_action(&Action::Jump {
            dir: Direction::Tx,
            channel: 3,
            address: 0x1000_1000,
        });
        assert_eq!(chip.cur(Direction::Tx, 3), chip.halt(Direction::Tx, 3));
        chip.ack_action(true);
        assert_eq!(chip.cur(Direction::Tx, 3), 0x1000_1000);
        assert!(chip.interrupt_pending());
        assert_ne!(chip.iq_entry(IqQueue::Action, 0) & entry::ARACK, 0);
    }

    #[test]
    fn mock_pcm_timer_expiry_is_read_once() {
        let mut chip = MockPcm::new(0);
        chip.arm_timer(4);
        chip.expire_timer();
        assert!(chip.timer_expired());
        assert!(!chip.timer_expired());
    }
}
