//! PCM/HDLC Controller Chip Interface
//!
//! The multiplexed controller moves data between 32 logical channels and the
//! 32 timeslots of the PCM highway using DMA descriptor chains. Software
//! drives it through *actions*: one primitive directive at a time, answered
//! through the action interrupt queue.
//!
//! [`PcmController`] is the narrow register-access seam. Everything above it
//! works with the typed [`Action`], [`TimeslotTable`] and [`CrossMatrix`]
//! values defined here, never with raw register offsets.

use crate::internal::constants::{
    ACTION_IQ_LEN, CROSS_IDLE, CROSS_MATRIX_LEN, NUM_TIMESLOTS, RX_IQ_LEN, TX_IQ_LEN,
};

// =============================================================================
// Directions and queues
// =============================================================================

/// Data direction of a channel ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Line to host
    Rx,
    /// Host to line
    Tx,
}

impl Direction {
    /// Both directions, receive first
    pub const ALL: [Direction; 2] = [Direction::Rx, Direction::Tx];

    /// Dense index (rx = 0, tx = 1)
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Direction::Rx => 0,
            Direction::Tx => 1,
        }
    }
}

/// One of the three hardware interrupt-vector queues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IqQueue {
    /// Action-complete vectors
    Action,
    /// Transmit vectors
    Tx,
    /// Receive vectors
    Rx,
}

impl IqQueue {
    /// All queues in drain order
    pub const ALL: [IqQueue; 3] = [IqQueue::Action, IqQueue::Tx, IqQueue::Rx];

    /// Number of entries in the hardware queue
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            IqQueue::Action => ACTION_IQ_LEN,
            IqQueue::Tx => TX_IQ_LEN,
            IqQueue::Rx => RX_IQ_LEN,
        }
    }

    /// Dense index
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            IqQueue::Action => 0,
            IqQueue::Tx => 1,
            IqQueue::Rx => 2,
        }
    }

    /// Data queue serving a direction
    #[must_use]
    pub const fn for_direction(dir: Direction) -> Self {
        match dir {
            Direction::Rx => IqQueue::Rx,
            Direction::Tx => IqQueue::Tx,
        }
    }
}

// =============================================================================
// Timeslot table
// =============================================================================

/// One timeslot assignment word as loaded into the chip.
///
/// | Bits  | Field       |
/// |-------|-------------|
/// | 0-7   | tx fill mask |
/// | 8-12  | tx channel  |
/// | 13    | tx inhibit  |
/// | 16-23 | rx fill mask |
/// | 24-28 | rx channel  |
/// | 29    | rx inhibit  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeslotWord(pub u32);

impl TimeslotWord {
    const TX_FILL_MASK: u32 = 0xFF;
    const TX_CHANNEL_SHIFT: u32 = 8;
    const TX_INHIBIT: u32 = 1 << 13;
    const RX_FILL_SHIFT: u32 = 16;
    const RX_CHANNEL_SHIFT: u32 = 24;
    const RX_INHIBIT: u32 = 1 << 29;
    const CHANNEL_MASK: u32 = 0x1F;

    /// Unassigned timeslot: both directions inhibited
    pub const IDLE: Self = Self(Self::TX_INHIBIT | Self::RX_INHIBIT);

    /// Assign both directions of a timeslot to one channel
    #[must_use]
    pub const fn assigned(channel: u8, rx_fill: u8, tx_fill: u8) -> Self {
        let ch = (channel as u32) & Self::CHANNEL_MASK;
        Self(
            (tx_fill as u32)
                | (ch << Self::TX_CHANNEL_SHIFT)
                | ((rx_fill as u32) << Self::RX_FILL_SHIFT)
                | (ch << Self::RX_CHANNEL_SHIFT),
        )
    }

    /// Transmit fill mask
    #[must_use]
    pub const fn tx_fill(self) -> u8 {
        (self.0 & Self::TX_FILL_MASK) as u8
    }

    /// Channel feeding this timeslot, if not inhibited
    #[must_use]
    pub const fn tx_channel(self) -> Option<u8> {
        if self.0 & Self::TX_INHIBIT != 0 {
            None
        } else {
            Some(((self.0 >> Self::TX_CHANNEL_SHIFT) & Self::CHANNEL_MASK) as u8)
        }
    }

    /// Receive fill mask
    #[must_use]
    pub const fn rx_fill(self) -> u8 {
        ((self.0 >> Self::RX_FILL_SHIFT) & 0xFF) as u8
    }

    /// Channel receiving this timeslot, if not inhibited
    #[must_use]
    pub const fn rx_channel(self) -> Option<u8> {
        if self.0 & Self::RX_INHIBIT != 0 {
            None
        } else {
            Some(((self.0 >> Self::RX_CHANNEL_SHIFT) & Self::CHANNEL_MASK) as u8)
        }
    }

    /// Whether either direction belongs to `channel`
    #[must_use]
    pub fn belongs_to(self, channel: u8) -> bool {
        self.tx_channel() == Some(channel) || self.rx_channel() == Some(channel)
    }
}

impl Default for TimeslotWord {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Full 32-entry timeslot assignment table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeslotTable(pub [TimeslotWord; NUM_TIMESLOTS]);

impl TimeslotTable {
    /// Every timeslot unassigned
    pub const IDLE: Self = Self([TimeslotWord::IDLE; NUM_TIMESLOTS]);

    /// Word for one timeslot
    #[must_use]
    pub fn get(&self, ts: usize) -> TimeslotWord {
        self.0[ts]
    }

    /// Mask of timeslots with either direction owned by `channel`
    #[must_use]
    pub fn mask_of(&self, channel: u8) -> u32 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, w)| w.belongs_to(channel))
            .fold(0, |mask, (ts, _)| mask | (1 << ts))
    }
}

impl Default for TimeslotTable {
    fn default() -> Self {
        Self::IDLE
    }
}

// =============================================================================
// Cross-connect matrix
// =============================================================================

/// Flat cross-connect matrix, the wire contract with the caller.
///
/// Indexed `timeslot + 32 * port` where port 0 is the controller side and
/// port `interface + 1` is an E1 line. Each byte is a source index or
/// [`CROSS_IDLE`]; bit 7 of a non-idle entry marks a reversed route.
///
/// Source indexes `0..32` are controller transmit timeslots and
/// `32 + 32 * interface + ts` are line receive timeslots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CrossMatrix(pub [u8; CROSS_MATRIX_LEN]);

impl CrossMatrix {
    /// Every output idle
    pub const IDLE: Self = Self([CROSS_IDLE; CROSS_MATRIX_LEN]);

    /// Flat index of an output slot
    #[inline(always)]
    #[must_use]
    pub const fn index(port: usize, ts: usize) -> usize {
        ts + NUM_TIMESLOTS * port
    }

    /// Raw entry for an output slot
    #[must_use]
    pub fn get(&self, port: usize, ts: usize) -> u8 {
        self.0[Self::index(port, ts)]
    }

    /// Set the raw entry for an output slot
    pub fn set(&mut self, port: usize, ts: usize, value: u8) {
        self.0[Self::index(port, ts)] = value;
    }

    /// Raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CROSS_MATRIX_LEN] {
        &self.0
    }
}

impl Default for CrossMatrix {
    fn default() -> Self {
        Self::IDLE
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CrossMatrix {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "CrossMatrix({=[u8]:x})", &self.0[..]);
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Per-direction command carried by a channel action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelCommand {
    /// Leave this direction alone
    #[default]
    Unchanged,
    /// Start at the action's start address
    Init,
    /// Stop after the current frame
    Off,
    /// Stop immediately
    Abort,
    /// Drop the channel configuration
    Clear,
}

/// Single-channel action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelAction {
    /// Target channel
    pub channel: u8,
    /// Receive command
    pub rx: ChannelCommand,
    /// Transmit command
    pub tx: ChannelCommand,
    /// Channel specification word to (re)load, if any
    pub spec: Option<u32>,
    /// Descriptor address the receive side starts from
    pub rx_start: u32,
    /// Descriptor address the transmit side starts from
    pub tx_start: u32,
}

/// Phase of a coalesced all-channel sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllChannelsPhase {
    /// Abort every masked channel
    Abort,
    /// Clear configuration of every masked channel
    Clear,
    /// Load a new timeslot table and per-channel specifications
    Load,
    /// Restart every masked channel from its halt descriptor
    Restore,
}

/// Coalesced action touching many channels at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AllChannelsAction {
    /// Sequence phase
    pub phase: AllChannelsPhase,
    /// Receive channels affected
    pub rx_mask: u32,
    /// Transmit channels affected
    pub tx_mask: u32,
    /// Specification words, indexed by channel (load phase)
    pub specs: [u32; NUM_TIMESLOTS],
    /// Timeslot table to install (load phase)
    pub table: TimeslotTable,
    /// Halt addresses each receive side restarts from (restore phase)
    pub rx_start: [u32; NUM_TIMESLOTS],
    /// Halt addresses each transmit side restarts from (restore phase)
    pub tx_start: [u32; NUM_TIMESLOTS],
}

/// One primitive directive for the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Command one channel
    Channel(ChannelAction),
    /// Command many channels in one shot
    AllChannels(AllChannelsAction),
    /// Install a timeslot table without touching channels
    Timeslots(TimeslotTable),
    /// Swap in a new cross-connect matrix
    CrossConnect(CrossMatrix),
    /// Point a parked ring at a new descriptor
    Jump {
        /// Ring direction
        dir: Direction,
        /// Ring channel
        channel: u8,
        /// Bus address of the new head descriptor
        address: u32,
    },
    /// Abandon a ring's chain and park on its halt descriptor
    FastAbort {
        /// Ring direction
        dir: Direction,
        /// Ring channel
        channel: u8,
    },
}

// =============================================================================
// Controller trait
// =============================================================================

/// Register-level access to the PCM/HDLC controller chip
///
/// Implementations wrap the board's bus access. All methods are called with
/// the controller lock held and must not block.
pub trait PcmController {
    /// Post one action to the chip's action request register.
    fn issue_action(&mut self, action: &Action);

    /// Bus address of the descriptor the chip is currently on for a ring.
    fn current_descriptor(&mut self, dir: Direction, channel: u8) -> u32;

    /// Raw entry of an interrupt queue slot (zero when empty).
    fn iq_entry(&mut self, queue: IqQueue, slot: usize) -> u32;

    /// Zero an interrupt queue slot after consuming it.
    fn clear_iq_entry(&mut self, queue: IqQueue, slot: usize);

    /// Whether the chip's pending-interrupt status bit is set.
    fn interrupt_pending(&mut self) -> bool;

    /// Clear the pending-interrupt status bit.
    fn acknowledge_interrupt(&mut self);

    /// Arm the one-shot hardware timer for `frames` E1 frame periods.
    fn arm_timer(&mut self, frames: u32);

    /// Disarm the hardware timer.
    fn cancel_timer(&mut self);

    /// Whether the timer expired; reading clears the flag.
    fn timer_expired(&mut self) -> bool;

    /// Begin a chip soft reset.
    fn soft_reset(&mut self);

    /// Whether the soft reset has completed.
    fn reset_done(&mut self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timeslot_inhibits_both_directions() {
        let w = TimeslotWord::IDLE;
        assert_eq!(w.tx_channel(), None);
        assert_eq!(w.rx_channel(), None);
        assert!(!w.belongs_to(0));
    }

    #[test]
    fn assigned_timeslot_fields() {
        let w = TimeslotWord::assigned(17, 0xFE, 0x7F);
        assert_eq!(w.tx_channel(), Some(17));
        assert_eq!(w.rx_channel(), Some(17));
        assert_eq!(w.tx_fill(), 0x7F);
        assert_eq!(w.rx_fill(), 0xFE);
        assert!(w.belongs_to(17));
        assert!(!w.belongs_to(16));
    }

    #[test]
    fn table_mask_of_channel() {
        let mut table = TimeslotTable::IDLE;
        table.0[1] = TimeslotWord::assigned(3, 0xFF, 0xFF);
        table.0[30] = TimeslotWord::assigned(3, 0xFF, 0xFF);
        table.0[2] = TimeslotWord::assigned(4, 0xFF, 0xFF);
        assert_eq!(table.mask_of(3), (1 << 1) | (1 << 30));
        assert_eq!(table.mask_of(4), 1 << 2);
        assert_eq!(table.mask_of(5), 0);
    }

    #[test]
    fn cross_matrix_indexing() {
        let mut m = CrossMatrix::IDLE;
        m.set(2, 5, 40);
        assert_eq!(CrossMatrix::index(2, 5), 69);
        assert_eq!(m.get(2, 5), 40);
        assert_eq!(m.as_bytes()[69], 40);
        assert_eq!(m.get(0, 5), CROSS_IDLE);
    }

    #[test]
    fn queue_lengths() {
        assert_eq!(IqQueue::Action.len(), ACTION_IQ_LEN);
        assert_eq!(IqQueue::for_direction(Direction::Rx), IqQueue::Rx);
        assert_eq!(IqQueue::for_direction(Direction::Tx), IqQueue::Tx);
    }
}
