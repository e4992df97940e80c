//! E1 Line Framer Interface
//!
//! Access to the E1 framer chips and the cross-connect board registers that
//! hold substitution masks, idle codes and transmit alarm controls.

use crate::driver::config::InterfaceConfig;

/// Signalling FIFO selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoKind {
    /// Channel-associated signalling (timeslot 16 multiframe)
    Cas,
    /// Frame-alignment signalling (timeslot 0 spare bits)
    Fas,
}

impl FifoKind {
    /// Both kinds
    pub const ALL: [FifoKind; 2] = [FifoKind::Cas, FifoKind::Fas];

    /// Dense index
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            FifoKind::Cas => 0,
            FifoKind::Fas => 1,
        }
    }
}

/// Per-port substitution masks, one bit per timeslot
///
/// A set bit replaces the routed data with the corresponding code from
/// [`IdleCodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Substitution {
    /// Timeslots overwritten with the data idle code
    pub idle: u32,
    /// Timeslots overwritten with the data alarm code
    pub alarm: u32,
    /// Timeslots whose CAS nibble is overwritten with the CAS idle code
    pub cas_idle: u32,
    /// Timeslots whose CAS nibble is overwritten with the CAS alarm code
    pub cas_alarm: u32,
}

impl Substitution {
    /// Whether any timeslot is substituted
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.idle == 0 && self.alarm == 0 && self.cas_idle == 0 && self.cas_alarm == 0
    }
}

/// Codes written into substituted timeslots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdleCodes {
    /// Data idle code
    pub data_idle: u8,
    /// Data alarm code
    pub data_alarm: u8,
    /// CAS idle nibble
    pub cas_idle: u8,
    /// CAS alarm nibble
    pub cas_alarm: u8,
}

/// E1 framer and cross-connect board register access
///
/// Interfaces are numbered from 0. Cross-connect ports are numbered with the
/// controller side as port 0 and interface `n` as port `n + 1`.
pub trait LineFramer {
    /// Program framing mode, line options and the unframed timeslot claim.
    fn configure(&mut self, interface: u8, config: InterfaceConfig, unframed_mask: u32);

    /// Read the raw receive status register.
    fn read_status(&mut self, interface: u8) -> u8;

    /// Read pending signalling bytes into `buf`, returning how many were read.
    fn read_signalling(&mut self, interface: u8, kind: FifoKind, buf: &mut [u8]) -> usize;

    /// Write the substitution masks of one cross-connect port.
    fn write_substitution(&mut self, port: u8, subst: &Substitution);

    /// Force AIS (all ones) on an interface's transmit side.
    fn set_transmit_ais(&mut self, interface: u8, on: bool);

    /// Drive the remote alarm (A bit) and remote multiframe alarm (Y bit).
    fn set_remote_alarms(&mut self, interface: u8, ra: bool, rma: bool);

    /// Load the codes used for substituted timeslots.
    fn set_idle_codes(&mut self, codes: &IdleCodes);
}
