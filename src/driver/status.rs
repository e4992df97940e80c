//! Read-only status snapshots: interface alarms, channel state, counters.

use bitflags::bitflags;

use crate::driver::config::{Framing, InterfaceConfig};
use crate::driver::error::ErrorBits;
use crate::hal::pcm::Direction;

bitflags! {
    /// E1 receive alarm flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AlarmFlags: u8 {
        /// Loss of signal
        const LOS = 1 << 0;
        /// Alarm indication signal (all ones) received
        const AIS = 1 << 1;
        /// Loss of frame alignment
        const LOF = 1 << 2;
        /// Loss of CAS multiframe alignment
        const LOMF = 1 << 3;
        /// Remote alarm indication received
        const RA = 1 << 4;
        /// Remote multiframe alarm received
        const RMA = 1 << 5;
        /// Positive frame slip
        const SLIP_POS = 1 << 6;
        /// Negative frame slip
        const SLIP_NEG = 1 << 7;

        /// Conditions that make the received data unusable
        const FAIL = Self::LOS.bits() | Self::LOF.bits() | Self::AIS.bits();
        /// Conditions that count as loss for auto-AIS
        const LOSS = Self::LOS.bits() | Self::LOF.bits();
        /// Slip events
        const SLIPS = Self::SLIP_POS.bits() | Self::SLIP_NEG.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmFlags {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "AlarmFlags({=u8:#x})", self.bits());
    }
}

impl AlarmFlags {
    /// Whether received data must be replaced with the alarm code
    #[must_use]
    pub fn is_failed(self) -> bool {
        self.intersects(Self::FAIL)
    }
}

/// Snapshot of one E1 interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceStatus {
    /// Current configuration bits
    pub config: InterfaceConfig,
    /// Unframed timeslot claim
    pub unframed_mask: u32,
    /// Framing mode derived from `config`
    pub framing: Framing,
    /// Alarms seen on the last status poll
    pub alarms: AlarmFlags,
    /// Alarms seen since the last `take_accumulated_alarms`
    pub accumulated: AlarmFlags,
    /// Positive slips since start
    pub slips_pos: u32,
    /// Negative slips since start
    pub slips_neg: u32,
    /// Transmitting AIS
    pub tx_ais: bool,
}

/// Snapshot of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    /// Receive side running on the chip
    pub rx_running: bool,
    /// Transmit side running on the chip
    pub tx_running: bool,
    /// Receive side requested by the caller
    pub rx_enabled: bool,
    /// Transmit side requested by the caller
    pub tx_enabled: bool,
    /// Timeslots assigned (as loaded on the chip)
    pub timeslots: u32,
    /// Receive buffers queued on the chip
    pub rx_queued: u16,
    /// Transmit buffers queued on the chip
    pub tx_queued: u16,
}

/// Per-direction counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirectionStats {
    /// Bytes moved by successful buffers
    pub bytes: u64,
    /// Buffers completed without error
    pub frames: u32,
    /// Buffers completed with any error
    pub errors: u32,
    /// CRC failures
    pub crc: u32,
    /// Aborted frames
    pub aborts: u32,
    /// Overruns (rx) or underruns (tx)
    pub overflows: u32,
    /// Short, long, split or unfit frames
    pub length: u32,
    /// DMA bus errors
    pub bus: u32,
}

impl DirectionStats {
    pub(crate) const ZERO: Self = Self {
        bytes: 0,
        frames: 0,
        errors: 0,
        crc: 0,
        aborts: 0,
        overflows: 0,
        length: 0,
        bus: 0,
    };

    /// Account one completed buffer.
    pub(crate) fn record(&mut self, bytes: u16, errors: ErrorBits) {
        if errors.is_empty() {
            self.bytes += u64::from(bytes);
            self.frames += 1;
            return;
        }
        self.errors += 1;
        if errors.contains(ErrorBits::CRC) {
            self.crc += 1;
        }
        if errors.contains(ErrorBits::ABORT) {
            self.aborts += 1;
        }
        if errors.intersects(ErrorBits::OVERRUN | ErrorBits::UNDERRUN) {
            self.overflows += 1;
        }
        if errors.intersects(ErrorBits::SHORT | ErrorBits::LONG | ErrorBits::SPLIT | ErrorBits::UNFIT)
        {
            self.length += 1;
        }
        if errors.contains(ErrorBits::BUS) {
            self.bus += 1;
        }
    }
}

/// Per-channel counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStats {
    /// Receive counters
    pub rx: DirectionStats,
    /// Transmit counters
    pub tx: DirectionStats,
}

impl ChannelStats {
    pub(crate) const ZERO: Self = Self {
        rx: DirectionStats::ZERO,
        tx: DirectionStats::ZERO,
    };

    /// Counters for one direction
    pub(crate) fn dir_mut(&mut self, dir: Direction) -> &mut DirectionStats {
        match dir {
            Direction::Rx => &mut self.rx,
            Direction::Tx => &mut self.tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_covers_los_lof_ais_only() {
        assert!(AlarmFlags::LOS.is_failed());
        assert!(AlarmFlags::LOF.is_failed());
        assert!(AlarmFlags::AIS.is_failed());
        assert!(!AlarmFlags::RA.is_failed());
        assert!(!(AlarmFlags::LOMF | AlarmFlags::SLIP_POS).is_failed());
    }

    #[test]
    fn stats_record_success_and_errors() {
        let mut stats = DirectionStats::default();
        stats.record(100, ErrorBits::empty());
        stats.record(50, ErrorBits::CRC | ErrorBits::LONG);
        stats.record(0, ErrorBits::BUS);
        assert_eq!(stats.bytes, 100);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.crc, 1);
        assert_eq!(stats.length, 1);
        assert_eq!(stats.bus, 1);
        assert_eq!(stats.aborts, 0);
    }
}
