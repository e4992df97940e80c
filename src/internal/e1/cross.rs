//! Decalogue pass and the cross-matrix commit engine.
//!
//! The decalogue pass is a pure function of the requested routing, the
//! loaded timeslot table, the running channels and the interface state. It
//! yields the matrix the chip should run plus everything written straight to
//! framer registers (substitution masks, transmit AIS, remote alarms).
//!
//! Routing changes go through [`CrossEngine`], which keeps the three matrix
//! copies and allows a single swap in flight.

use crate::driver::config::{Framing, InterfaceConfig};
use crate::driver::status::AlarmFlags;
use crate::hal::framer::{LineFramer, Substitution};
use crate::hal::pcm::{CrossMatrix, TimeslotTable};
use crate::internal::constants::{
    CAS_TIMESLOT, CROSS_IDLE, CROSS_SOURCE_MASK, FAS_TIMESLOT, NUM_INTERFACES, NUM_PORTS,
    NUM_TIMESLOTS,
};

use super::InterfaceState;

/// Everything a decalogue pass reads
#[derive(Clone, Copy)]
pub(crate) struct CrossInputs<'a> {
    /// Routing asked for by the caller
    pub requested: &'a CrossMatrix,
    /// Timeslot table the chip runs
    pub table: &'a TimeslotTable,
    /// Channels whose transmit side is running
    pub tx_running: u32,
    pub interfaces: &'a [InterfaceState; NUM_INTERFACES],
    pub ais_persist_polls: u8,
}

/// Result of a decalogue pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decalogue {
    pub matrix: CrossMatrix,
    pub subst: [Substitution; NUM_PORTS],
    pub tx_ais: [bool; NUM_INTERFACES],
    /// Remote alarm and remote multiframe alarm per interface
    pub remote: [(bool, bool); NUM_INTERFACES],
}

/// Why a routed timeslot cannot carry its source's data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Pass,
    Idle,
    Alarm,
}

/// Whether a line timeslot carries framing or signalling rather than data
fn reserved_slot(iface: &InterfaceState, ts: usize) -> bool {
    if iface.config.contains(InterfaceConfig::UNFRAMED) {
        return false;
    }
    ts == FAS_TIMESLOT || (ts == CAS_TIMESLOT && iface.config.contains(InterfaceConfig::CAS))
}

/// Controller side source index for a timeslot
const fn controller_source(ts: usize) -> u8 {
    ts as u8
}

/// Line receive source index for an interface timeslot
const fn line_source(interface: usize, ts: usize) -> u8 {
    (NUM_TIMESLOTS * (interface + 1) + ts) as u8
}

/// Forced route of an unframed claim, if `(port, ts)` is one
fn forced_route(claims: &[u32; NUM_INTERFACES], port: usize, ts: usize) -> Option<u8> {
    let bit = 1u32 << ts;
    if port == 0 {
        (0..NUM_INTERFACES)
            .find(|&i| claims[i] & bit != 0)
            .map(|i| line_source(i, ts))
    } else {
        (claims[port - 1] & bit != 0).then_some(controller_source(ts))
    }
}

/// Whether a source is held by an unframed claim
fn claimed_source(claims: &[u32; NUM_INTERFACES], src: usize) -> bool {
    if src < NUM_TIMESLOTS {
        claims.iter().any(|c| c & (1 << src) != 0)
    } else {
        let i = src / NUM_TIMESLOTS - 1;
        let ts = src % NUM_TIMESLOTS;
        claims.get(i).is_some_and(|c| c & (1 << ts) != 0)
    }
}

fn judge(
    inputs: &CrossInputs<'_>,
    claims: &[u32; NUM_INTERFACES],
    entry: u8,
    forced: bool,
) -> Verdict {
    if entry == CROSS_IDLE {
        return Verdict::Idle;
    }
    let src = (entry & CROSS_SOURCE_MASK) as usize;
    if !forced && claimed_source(claims, src) {
        return Verdict::Idle;
    }
    if src < NUM_TIMESLOTS {
        return match inputs.table.get(src).tx_channel() {
            Some(ch) if inputs.tx_running & (1 << ch) != 0 => Verdict::Pass,
            _ => Verdict::Idle,
        };
    }
    let i = src / NUM_TIMESLOTS - 1;
    if i >= NUM_INTERFACES {
        return Verdict::Idle;
    }
    let iface = &inputs.interfaces[i];
    if !iface.is_enabled() || reserved_slot(iface, src % NUM_TIMESLOTS) {
        return Verdict::Idle;
    }
    if iface.alarms.is_failed() {
        return Verdict::Alarm;
    }
    Verdict::Pass
}

/// Whether the signalling a source carries is unusable
fn cas_broken(inputs: &CrossInputs<'_>, entry: u8) -> bool {
    let src = (entry & CROSS_SOURCE_MASK) as usize;
    if entry == CROSS_IDLE || src < NUM_TIMESLOTS {
        return false;
    }
    let i = src / NUM_TIMESLOTS - 1;
    i < NUM_INTERFACES && inputs.interfaces[i].alarms.contains(AlarmFlags::LOMF)
}

/// Recompute routing, substitution and transmit alarms.
pub(crate) fn decalogue(inputs: &CrossInputs<'_>) -> Decalogue {
    let mut out = Decalogue {
        matrix: CrossMatrix::IDLE,
        subst: [Substitution::default(); NUM_PORTS],
        tx_ais: [false; NUM_INTERFACES],
        remote: [(false, false); NUM_INTERFACES],
    };

    let mut claims = [0u32; NUM_INTERFACES];
    for (claim, iface) in claims.iter_mut().zip(inputs.interfaces) {
        *claim = iface.unframed_claim();
    }

    for port in 0..NUM_PORTS {
        let line = port.checked_sub(1).map(|i| &inputs.interfaces[i]);
        let subst = &mut out.subst[port];

        if let Some(iface) = line {
            if !iface.is_enabled() {
                subst.idle = u32::MAX;
                continue;
            }
        }
        let cas_line = line.is_some_and(|l| l.config.framing() == Framing::FramedCas);

        for ts in 0..NUM_TIMESLOTS {
            if line.is_some_and(|l| reserved_slot(l, ts)) {
                continue;
            }
            let forced = forced_route(&claims, port, ts);
            let entry = forced.unwrap_or_else(|| inputs.requested.get(port, ts));
            out.matrix.set(port, ts, entry);

            let bit = 1u32 << ts;
            let verdict = judge(inputs, &claims, entry, forced.is_some());
            match verdict {
                Verdict::Pass => {}
                Verdict::Idle => subst.idle |= bit,
                Verdict::Alarm => subst.alarm |= bit,
            }

            if cas_line {
                match verdict {
                    Verdict::Idle => subst.cas_idle |= bit,
                    Verdict::Alarm => subst.cas_alarm |= bit,
                    Verdict::Pass if cas_broken(inputs, entry) => subst.cas_alarm |= bit,
                    Verdict::Pass => {}
                }
            }
        }
    }

    for (i, iface) in inputs.interfaces.iter().enumerate() {
        let config = iface.config;
        let enabled = iface.is_enabled();
        out.tx_ais[i] = enabled
            && (config.contains(InterfaceConfig::TX_AIS)
                || (config.contains(InterfaceConfig::AUTO_AIS)
                    && iface.loss_polls >= inputs.ais_persist_polls));

        out.remote[i] = if !enabled || config.contains(InterfaceConfig::UNFRAMED) {
            (false, false)
        } else if config.contains(InterfaceConfig::MANUAL_RA) {
            (
                config.contains(InterfaceConfig::TX_RA),
                config.contains(InterfaceConfig::TX_RMA),
            )
        } else {
            (
                iface.alarms.is_failed(),
                config.contains(InterfaceConfig::CAS) && iface.alarms.contains(AlarmFlags::LOMF),
            )
        };
    }

    out
}

// =============================================================================
// Commit engine
// =============================================================================

/// Cross-matrix update state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CrossState {
    /// Active matches the last computed matrix
    #[default]
    Idle,
    /// A new matrix is waiting for the action machine
    Staged,
    /// The swap action is in flight
    Committing,
    /// Swap in flight and a newer matrix is already computed
    Waiting,
}

pub(crate) struct CrossEngine {
    requested: CrossMatrix,
    active: CrossMatrix,
    shadow: CrossMatrix,
    pending: CrossMatrix,
    state: CrossState,
    last_subst: [Option<Substitution>; NUM_PORTS],
    last_ais: [Option<bool>; NUM_INTERFACES],
    last_remote: [Option<(bool, bool)>; NUM_INTERFACES],
}

#[allow(dead_code)]
impl CrossEngine {
    pub const fn new() -> Self {
        Self {
            requested: Self::default_routing(),
            active: CrossMatrix::IDLE,
            shadow: CrossMatrix::IDLE,
            pending: CrossMatrix::IDLE,
            state: CrossState::Idle,
            last_subst: [None; NUM_PORTS],
            last_ais: [None; NUM_INTERFACES],
            last_remote: [None; NUM_INTERFACES],
        }
    }

    /// Controller timeslots loop through the first interface.
    pub const fn default_routing() -> CrossMatrix {
        let mut m = CrossMatrix::IDLE;
        let mut ts = 0;
        while ts < NUM_TIMESLOTS {
            m.0[CrossMatrix::index(0, ts)] = line_source(0, ts);
            m.0[CrossMatrix::index(1, ts)] = controller_source(ts);
            ts += 1;
        }
        m
    }

    pub fn state(&self) -> CrossState {
        self.state
    }

    pub fn requested(&self) -> &CrossMatrix {
        &self.requested
    }

    pub fn set_requested(&mut self, matrix: CrossMatrix) {
        self.requested = matrix;
    }

    pub fn active(&self) -> &CrossMatrix {
        &self.active
    }

    pub fn pending(&self) -> &CrossMatrix {
        &self.pending
    }

    /// Whether a swap is staged or in flight
    pub fn is_busy(&self) -> bool {
        self.state != CrossState::Idle
    }

    /// Offer a freshly computed matrix.
    pub fn stage(&mut self, desired: &CrossMatrix) {
        self.pending = *desired;
        self.state = match self.state {
            CrossState::Idle | CrossState::Staged => {
                if self.pending == self.active {
                    CrossState::Idle
                } else {
                    CrossState::Staged
                }
            }
            CrossState::Committing | CrossState::Waiting => {
                if self.pending == self.shadow {
                    CrossState::Committing
                } else {
                    CrossState::Waiting
                }
            }
        };
    }

    /// Matrix to swap in, moving `Staged` to `Committing`.
    pub fn take_commit(&mut self) -> Option<CrossMatrix> {
        if self.state != CrossState::Staged {
            return None;
        }
        self.shadow = self.pending;
        self.state = CrossState::Committing;
        Some(self.shadow)
    }

    /// The swap action finished.
    pub fn on_commit(&mut self, ok: bool) {
        if ok {
            self.active = self.shadow;
        }
        let waiting = self.state == CrossState::Waiting;
        self.state = CrossState::Idle;
        if waiting {
            let pending = self.pending;
            self.stage(&pending);
        }
    }

    /// Write register-level results that changed since the last pass.
    ///
    /// Returns the number of register writes issued.
    pub fn apply_registers<F: LineFramer>(&mut self, framer: &mut F, pass: &Decalogue) -> usize {
        let mut writes = 0;
        for (port, subst) in pass.subst.iter().enumerate() {
            if self.last_subst[port] != Some(*subst) {
                framer.write_substitution(port as u8, subst);
                self.last_subst[port] = Some(*subst);
                writes += 1;
            }
        }
        for i in 0..NUM_INTERFACES {
            if self.last_ais[i] != Some(pass.tx_ais[i]) {
                framer.set_transmit_ais(i as u8, pass.tx_ais[i]);
                self.last_ais[i] = Some(pass.tx_ais[i]);
                writes += 1;
            }
            let (ra, rma) = pass.remote[i];
            if self.last_remote[i] != Some((ra, rma)) {
                framer.set_remote_alarms(i as u8, ra, rma);
                self.last_remote[i] = Some((ra, rma));
                writes += 1;
            }
        }
        writes
    }

    /// Forget chip state after a reset; requested routing is kept.
    pub fn reset(&mut self) {
        let requested = self.requested;
        *self = Self::new();
        self.requested = requested;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::pcm::TimeslotWord;
    use crate::internal::constants::CROSS_REVERSE;
    use crate::testing::MockFramer;

    struct World {
        requested: CrossMatrix,
        table: TimeslotTable,
        tx_running: u32,
        interfaces: [InterfaceState; NUM_INTERFACES],
    }

    impl World {
        fn new() -> Self {
            let mut interfaces = [InterfaceState::new(); NUM_INTERFACES];
            for iface in &mut interfaces {
                iface.reconfigure(InterfaceConfig::ENABLED, 0);
            }
            Self {
                requested: CrossEngine::default_routing(),
                table: TimeslotTable::IDLE,
                tx_running: 0,
                interfaces,
            }
        }

        fn run(&self) -> Decalogue {
            decalogue(&CrossInputs {
                requested: &self.requested,
                table: &self.table,
                tx_running: self.tx_running,
                interfaces: &self.interfaces,
                ais_persist_polls: 3,
            })
        }

        fn assign(&mut self, ch: u8, ts: usize) {
            self.table.0[ts] = TimeslotWord::assigned(ch, 0xFF, 0xFF);
            self.tx_running |= 1 << ch;
        }
    }

    #[test]
    fn default_routing_loops_controller_through_first_line() {
        let m = CrossEngine::default_routing();
        assert_eq!(m.get(0, 3), 35);
        assert_eq!(m.get(1, 3), 3);
        assert_eq!(m.get(2, 3), CROSS_IDLE);
    }

    #[test]
    fn framed_line_skips_fas_and_unused_sources_idle() {
        let mut w = World::new();
        w.assign(0, 1);
        let pass = w.run();
        assert_eq!(pass.matrix.get(1, 0), CROSS_IDLE);
        assert_eq!(pass.subst[1].idle & 1, 0);
        // ts1 carries channel 0; every other line-1 timeslot is idle.
        assert_eq!(pass.subst[1].idle & (1 << 1), 0);
        assert_ne!(pass.subst[1].idle & (1 << 2), 0);
        assert_eq!(pass.subst[1].alarm, 0);
    }

    #[test]
    fn stopped_channel_is_idle_substituted() {
        let mut w = World::new();
        w.assign(4, 9);
        w.tx_running = 0;
        assert_ne!(w.run().subst[1].idle & (1 << 9), 0);
    }

    #[test]
    fn failed_source_interface_gets_alarm_code() {
        let mut w = World::new();
        // Controller ts5 from line A ts5, ts6 from line B ts6.
        w.requested.set(0, 6, line_source(1, 6));
        w.interfaces[0].alarms = AlarmFlags::LOS;
        let pass = w.run();
        assert_ne!(pass.subst[0].alarm & (1 << 5), 0);
        assert_eq!(pass.subst[0].alarm & (1 << 6), 0);
        assert_eq!(pass.subst[0].idle & (1 << 6), 0);
    }

    #[test]
    fn disabled_line_is_fully_idle() {
        let mut w = World::new();
        w.interfaces[1].reconfigure(InterfaceConfig::empty(), 0);
        let pass = w.run();
        assert_eq!(pass.subst[2].idle, u32::MAX);
        assert!(!pass.tx_ais[1]);
        assert_eq!(pass.remote[1], (false, false));
    }

    #[test]
    fn cas_line_mirrors_reasons_into_cas_masks() {
        let mut w = World::new();
        w.interfaces[0].reconfigure(InterfaceConfig::ENABLED | InterfaceConfig::CAS, 0);
        w.interfaces[1].alarms = AlarmFlags::AIS;
        w.requested.set(1, 3, line_source(1, 3));
        let pass = w.run();
        assert_eq!(pass.matrix.get(1, CAS_TIMESLOT), CROSS_IDLE);
        assert_ne!(pass.subst[1].cas_alarm & (1 << 3), 0);
        assert_ne!(pass.subst[1].cas_idle & (1 << 4), 0);
        assert_eq!(pass.subst[1].cas_idle & (1 << CAS_TIMESLOT), 0);
    }

    #[test]
    fn unframed_claim_forces_routes_and_blocks_others() {
        let mut w = World::new();
        w.interfaces[1].reconfigure(InterfaceConfig::ENABLED | InterfaceConfig::UNFRAMED, 0b1100);
        w.assign(2, 2);
        w.assign(3, 3);
        // Line A also asks for controller ts2; the claim wins.
        let pass = w.run();
        assert_eq!(pass.matrix.get(2, 2), 2);
        assert_eq!(pass.matrix.get(0, 3), line_source(1, 3));
        assert_ne!(pass.subst[1].idle & (1 << 2), 0);
        assert_eq!(pass.subst[2].idle & (1 << 2), 0);
        // Unframed lines use every slot, including ts0.
        assert_eq!(pass.matrix.get(2, 0), CROSS_IDLE);
        assert_ne!(pass.subst[2].idle & 1, 0);
    }

    #[test]
    fn reverse_bit_is_kept() {
        let mut w = World::new();
        w.requested.set(0, 7, line_source(0, 7) | CROSS_REVERSE);
        let pass = w.run();
        assert_eq!(pass.matrix.get(0, 7), line_source(0, 7) | CROSS_REVERSE);
        assert_eq!(pass.subst[0].idle & (1 << 7), 0);
    }

    #[test]
    fn auto_ais_waits_for_persistence() {
        let mut w = World::new();
        w.interfaces[0].config |= InterfaceConfig::AUTO_AIS;
        w.interfaces[0].alarms = AlarmFlags::LOS;
        w.interfaces[0].loss_polls = 2;
        assert!(!w.run().tx_ais[0]);
        w.interfaces[0].loss_polls = 3;
        assert!(w.run().tx_ais[0]);
        assert!(!w.run().tx_ais[1]);
    }

    #[test]
    fn remote_alarms_follow_receive_state_unless_manual() {
        let mut w = World::new();
        w.interfaces[0].reconfigure(InterfaceConfig::ENABLED | InterfaceConfig::CAS, 0);
        w.interfaces[0].alarms = AlarmFlags::LOF | AlarmFlags::LOMF;
        assert_eq!(w.run().remote[0], (true, true));

        w.interfaces[0].config |= InterfaceConfig::MANUAL_RA | InterfaceConfig::TX_RMA;
        assert_eq!(w.run().remote[0], (false, true));
    }

    #[test]
    fn commit_cycle() {
        let mut engine = CrossEngine::new();
        let a = CrossEngine::default_routing();
        engine.stage(&a);
        assert_eq!(engine.state(), CrossState::Staged);
        assert_eq!(engine.take_commit(), Some(a));
        assert_eq!(engine.state(), CrossState::Committing);
        assert_eq!(engine.take_commit(), None);
        engine.on_commit(true);
        assert_eq!(engine.active(), &a);
        assert!(!engine.is_busy());

        // Same matrix again: nothing to do.
        engine.stage(&a);
        assert_eq!(engine.state(), CrossState::Idle);
    }

    #[test]
    fn second_update_waits_for_the_first() {
        let mut engine = CrossEngine::new();
        let a = CrossEngine::default_routing();
        let mut b = a;
        b.set(2, 1, 1);

        engine.stage(&a);
        engine.take_commit();
        engine.stage(&b);
        assert_eq!(engine.state(), CrossState::Waiting);
        engine.on_commit(true);
        assert_eq!(engine.state(), CrossState::Staged);
        assert_eq!(engine.take_commit(), Some(b));
        engine.on_commit(true);
        assert_eq!(engine.active(), &b);
    }

    #[test]
    fn failed_commit_keeps_old_matrix() {
        let mut engine = CrossEngine::new();
        let a = CrossEngine::default_routing();
        engine.stage(&a);
        engine.take_commit();
        engine.on_commit(false);
        assert_eq!(engine.active(), &CrossMatrix::IDLE);
        assert_eq!(engine.state(), CrossState::Idle);
        engine.stage(&a);
        assert_eq!(engine.state(), CrossState::Staged);
    }

    #[test]
    fn registers_written_only_on_change() {
        let w = World::new();
        let mut engine = CrossEngine::new();
        let mut framer = MockFramer::new();
        let pass = w.run();
        assert_eq!(engine.apply_registers(&mut framer, &pass), NUM_PORTS + 2 * NUM_INTERFACES);
        assert_eq!(engine.apply_registers(&mut framer, &pass), 0);
        engine.reset();
        assert_eq!(engine.apply_registers(&mut framer, &pass), NUM_PORTS + 2 * NUM_INTERFACES);
    }
}
