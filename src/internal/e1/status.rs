//! Framer status decoding.

use crate::driver::config::{Framing, InterfaceConfig};
use crate::driver::status::AlarmFlags;

/// Receive status register bits
pub(crate) mod raw {
    pub const LOS: u8 = 1 << 0;
    pub const AIS: u8 = 1 << 1;
    pub const LFA: u8 = 1 << 2;
    pub const LMFA: u8 = 1 << 3;
    pub const RRA: u8 = 1 << 4;
    pub const RMA: u8 = 1 << 5;
    pub const SLIP_POS: u8 = 1 << 6;
    pub const SLIP_NEG: u8 = 1 << 7;
}

const MAP: [(u8, AlarmFlags); 8] = [
    (raw::LOS, AlarmFlags::LOS),
    (raw::AIS, AlarmFlags::AIS),
    (raw::LFA, AlarmFlags::LOF),
    (raw::LMFA, AlarmFlags::LOMF),
    (raw::RRA, AlarmFlags::RA),
    (raw::RMA, AlarmFlags::RMA),
    (raw::SLIP_POS, AlarmFlags::SLIP_POS),
    (raw::SLIP_NEG, AlarmFlags::SLIP_NEG),
];

/// Decode a raw status byte, dropping bits that have no meaning in the
/// interface's framing mode.
pub(crate) fn decode(status: u8, config: InterfaceConfig) -> AlarmFlags {
    if !config.contains(InterfaceConfig::ENABLED) {
        return AlarmFlags::empty();
    }
    let flags = MAP
        .iter()
        .filter(|(bit, _)| status & bit != 0)
        .fold(AlarmFlags::empty(), |acc, (_, flag)| acc | *flag);

    match config.framing() {
        Framing::Unframed => {
            flags - (AlarmFlags::LOF | AlarmFlags::LOMF | AlarmFlags::RA | AlarmFlags::RMA)
        }
        Framing::Framed => flags - (AlarmFlags::LOMF | AlarmFlags::RMA),
        Framing::FramedCas => flags,
    }
}
