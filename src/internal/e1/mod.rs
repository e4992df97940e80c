//! E1 interface state and the cross-connect engine.

pub(crate) mod cross;
pub(crate) mod fifo;
pub(crate) mod status;

pub(crate) use cross::{CrossEngine, CrossInputs, decalogue};
pub(crate) use fifo::Fifo;

use crate::driver::config::InterfaceConfig;
use crate::driver::status::{AlarmFlags, InterfaceStatus};
use crate::hal::framer::FifoKind;

/// Software view of one E1 interface
#[derive(Debug, Clone, Copy)]
pub(crate) struct InterfaceState {
    pub config: InterfaceConfig,
    pub unframed_mask: u32,
    pub alarms: AlarmFlags,
    pub accumulated: AlarmFlags,
    pub slips_pos: u32,
    pub slips_neg: u32,
    /// Consecutive polls with loss of signal or frame
    pub loss_polls: u8,
    pub tx_ais: bool,
    fifos: [Fifo; 2],
}

impl InterfaceState {
    pub const fn new() -> Self {
        Self {
            config: InterfaceConfig::empty(),
            unframed_mask: 0,
            alarms: AlarmFlags::empty(),
            accumulated: AlarmFlags::empty(),
            slips_pos: 0,
            slips_neg: 0,
            loss_polls: 0,
            tx_ais: false,
            fifos: [Fifo::new(), Fifo::new()],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.contains(InterfaceConfig::ENABLED)
    }

    /// Apply a new configuration; signalling and alarm history restart.
    pub fn reconfigure(&mut self, config: InterfaceConfig, unframed_mask: u32) {
        self.config = config;
        self.unframed_mask = if config.contains(InterfaceConfig::UNFRAMED) {
            unframed_mask
        } else {
            0
        };
        self.alarms = AlarmFlags::empty();
        self.loss_polls = 0;
        for fifo in &mut self.fifos {
            fifo.clear();
        }
    }

    /// Take one decoded sample; returns the bits that changed plus any
    /// slip events.
    pub fn sample(&mut self, flags: AlarmFlags) -> AlarmFlags {
        let level = flags - AlarmFlags::SLIPS;
        let slips = flags & AlarmFlags::SLIPS;
        let delta = ((self.alarms - AlarmFlags::SLIPS) ^ level) | slips;

        self.alarms = flags;
        self.accumulated |= flags;
        if slips.contains(AlarmFlags::SLIP_POS) {
            self.slips_pos = self.slips_pos.wrapping_add(1);
        }
        if slips.contains(AlarmFlags::SLIP_NEG) {
            self.slips_neg = self.slips_neg.wrapping_add(1);
        }
        if flags.intersects(AlarmFlags::LOSS) {
            self.loss_polls = self.loss_polls.saturating_add(1);
        } else {
            self.loss_polls = 0;
        }
        delta
    }

    pub fn take_accumulated(&mut self) -> AlarmFlags {
        core::mem::take(&mut self.accumulated)
    }

    pub fn fifo(&self, kind: FifoKind) -> &Fifo {
        &self.fifos[kind.index()]
    }

    pub fn fifo_mut(&mut self, kind: FifoKind) -> &mut Fifo {
        &mut self.fifos[kind.index()]
    }

    /// Timeslots this interface claims in unframed mode (an empty mask
    /// claims all of them)
    pub fn unframed_claim(&self) -> u32 {
        if !self.is_enabled() || !self.config.contains(InterfaceConfig::UNFRAMED) {
            return 0;
        }
        if self.unframed_mask == 0 {
            u32::MAX
        } else {
            self.unframed_mask
        }
    }

    /// Whether a signalling kind is carried in the current framing mode
    pub fn carries(&self, kind: FifoKind) -> bool {
        if !self.is_enabled() || self.config.contains(InterfaceConfig::UNFRAMED) {
            return false;
        }
        match kind {
            FifoKind::Fas => true,
            FifoKind::Cas => self.config.contains(InterfaceConfig::CAS),
        }
    }

    pub fn snapshot(&self) -> InterfaceStatus {
        InterfaceStatus {
            config: self.config,
            unframed_mask: self.unframed_mask,
            framing: self.config.framing(),
            alarms: self.alarms,
            accumulated: self.accumulated,
            slips_pos: self.slips_pos,
            slips_neg: self.slips_neg,
            tx_ais: self.tx_ais,
        }
    }
}

impl Default for InterfaceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_reports_level_changes_and_slips() {
        let mut iface = InterfaceState::new();
        let delta = iface.sample(AlarmFlags::LOS);
        assert_eq!(delta, AlarmFlags::LOS);
        // Unchanged level: no delta.
        assert!(iface.sample(AlarmFlags::LOS).is_empty());
        // Clearing reports the bit again.
        assert_eq!(iface.sample(AlarmFlags::empty()), AlarmFlags::LOS);
        // Slips are events: they show up every time.
        assert_eq!(iface.sample(AlarmFlags::SLIP_POS), AlarmFlags::SLIP_POS);
        assert_eq!(iface.sample(AlarmFlags::SLIP_POS), AlarmFlags::SLIP_POS);
        assert_eq!(iface.slips_pos, 2);
        assert_eq!(iface.slips_neg, 0);
    }

    #[test]
    fn loss_polls_count_consecutive_samples() {
        let mut iface = InterfaceState::new();
        iface.sample(AlarmFlags::LOS);
        iface.sample(AlarmFlags::LOF);
        assert_eq!(iface.loss_polls, 2);
        iface.sample(AlarmFlags::AIS);
        assert_eq!(iface.loss_polls, 0);
    }

    #[test]
    fn accumulated_is_sticky_until_taken() {
        let mut iface = InterfaceState::new();
        iface.sample(AlarmFlags::RA);
        iface.sample(AlarmFlags::empty());
        assert_eq!(iface.take_accumulated(), AlarmFlags::RA);
        assert!(iface.take_accumulated().is_empty());
    }

    #[test]
    fn reconfigure_clears_fifos_and_drops_unframed_claim_when_framed() {
        let mut iface = InterfaceState::new();
        iface.fifo_mut(FifoKind::Cas).push(&[1, 2, 3]);
        iface.reconfigure(InterfaceConfig::ENABLED, 0xFFFF);
        assert!(iface.fifo(FifoKind::Cas).is_empty());
        assert_eq!(iface.unframed_mask, 0);

        iface.reconfigure(InterfaceConfig::ENABLED | InterfaceConfig::UNFRAMED, 0xF0);
        assert_eq!(iface.unframed_mask, 0xF0);
        assert!(!iface.carries(FifoKind::Fas));
    }
}
