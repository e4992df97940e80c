//! E1 line handling for the controller.
//!
//! This module extends [`Controller`] with everything on the line side of
//! the adapter:
//!
//! - interface configuration
//! - periodic status polling (alarms, slips, signalling FIFOs)
//! - the requested cross-connect matrix
//!
//! Every change that can affect routing ends in a decalogue pass. Its
//! register-level results (substitution masks, transmit AIS, remote alarms)
//! are written to the framers directly; a routing change is staged and
//! committed through the action engine like any other command.

use super::config::{InterfaceConfig, State, check_interface};
use super::controller::Controller;
use super::error::{ConfigError, ConfigResult, ErrorBits, IoError, Result};
use super::notify::ErrorSource;
use super::status::{AlarmFlags, InterfaceStatus};
use crate::hal::framer::{FifoKind, LineFramer};
use crate::hal::pcm::{CrossMatrix, PcmController};
use crate::internal::constants::{
    CROSS_IDLE, CROSS_MATRIX_LEN, CROSS_SOURCE_MASK, NUM_INTERFACES, SIGNALLING_BURST,
};
use crate::internal::e1::status::decode;
use crate::internal::e1::{CrossInputs, decalogue};

impl<P, F, const DESCS: usize, const REQS: usize> Controller<P, F, DESCS, REQS>
where
    P: PcmController,
    F: LineFramer,
{
    // =========================================================================
    // Interfaces
    // =========================================================================

    /// Configure an E1 interface.
    ///
    /// `unframed_mask` selects the timeslots an unframed interface carries
    /// (zero means all 32) and is ignored for framed modes. Alarm history and
    /// signalling FIFOs restart. Routing is re-evaluated at once if the
    /// controller is running.
    ///
    /// # Errors
    ///
    /// - `InvalidInterface` for an interface number out of range
    /// - `InvalidInterfaceConfig` for contradictory bits
    /// - `InvalidTimeslots` if an unframed claim overlaps the other
    ///   interface's claim
    pub fn configure_interface(
        &mut self,
        interface: u8,
        config: InterfaceConfig,
        unframed_mask: u32,
    ) -> ConfigResult<()> {
        let i = check_interface(interface)?;
        config.validate()?;

        if config.contains(InterfaceConfig::ENABLED | InterfaceConfig::UNFRAMED) {
            let claim = if unframed_mask == 0 {
                u32::MAX
            } else {
                unframed_mask
            };
            let overlaps = self
                .interfaces
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.unframed_claim() & claim != 0);
            if overlaps {
                return Err(ConfigError::InvalidTimeslots);
            }
        }

        let iface = &mut self.interfaces[i];
        iface.reconfigure(config, unframed_mask);
        self.fifo_triggered[i] = [false; 2];
        self.framer.configure(interface, config, iface.unframed_mask);
        info!("interface {} configured: {}", interface, config.bits());

        if self.state == State::Running {
            self.refresh_cross();
            self.schedule();
        }
        Ok(())
    }

    /// Snapshot of one interface
    pub fn interface_status(&self, interface: u8) -> ConfigResult<InterfaceStatus> {
        let i = check_interface(interface)?;
        Ok(self.interfaces[i].snapshot())
    }

    /// Take the alarms accumulated since the last call
    pub fn take_accumulated_alarms(&mut self, interface: u8) -> ConfigResult<AlarmFlags> {
        let i = check_interface(interface)?;
        Ok(self.interfaces[i].take_accumulated())
    }

    // =========================================================================
    // Status Polling
    // =========================================================================

    /// Sample the framers.
    ///
    /// Call every [`status_poll_interval_ms`]. Updates alarm state and slip
    /// counters, queues a status change for every interface whose alarms
    /// moved, moves received signalling into the FIFOs and runs a
    /// decalogue pass.
    ///
    /// [`status_poll_interval_ms`]: super::config::ControllerConfig::status_poll_interval_ms
    pub fn poll_status(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Err(IoError::InvalidState.into());
        }

        for i in 0..NUM_INTERFACES {
            if !self.interfaces[i].is_enabled() {
                continue;
            }
            let interface = i as u8;
            let flags = decode(self.framer.read_status(interface), self.interfaces[i].config);
            let delta = self.interfaces[i].sample(flags);
            if !delta.is_empty() {
                info!(
                    "interface {} alarms {} (changed {})",
                    interface,
                    flags.bits(),
                    delta.bits()
                );
                self.status_delta[i] |= delta;
            }

            for kind in FifoKind::ALL {
                if self.interfaces[i].carries(kind) {
                    self.ingest_signalling(interface, kind);
                }
            }
        }

        self.refresh_cross();
        self.schedule();
        Ok(())
    }

    fn ingest_signalling(&mut self, interface: u8, kind: FifoKind) {
        let i = interface as usize;
        let mut buf = [0u8; SIGNALLING_BURST];
        let n = self
            .framer
            .read_signalling(interface, kind, &mut buf)
            .min(buf.len());
        if n == 0 {
            return;
        }

        let fill = self.interfaces[i].fifo_mut(kind).push(&buf[..n]);
        if fill.triggered {
            self.fifo_triggered[i][kind.index()] = true;
        }
        if fill.dropped > 0 {
            warn!("interface {} signalling fifo dropped {} bytes", interface, fill.dropped);
            self.report(ErrorSource::Interface(interface), ErrorBits::FIFO_OVERFLOW);
        }
    }

    // =========================================================================
    // Signalling FIFOs
    // =========================================================================

    /// Read received signalling bytes; returns the number copied
    pub fn read_fifo(&mut self, interface: u8, kind: FifoKind, buf: &mut [u8]) -> ConfigResult<usize> {
        let i = check_interface(interface)?;
        Ok(self.interfaces[i].fifo_mut(kind).read(buf))
    }

    /// Set the fill level that raises a FIFO trigger notification
    pub fn set_fifo_trigger(&mut self, interface: u8, kind: FifoKind, level: usize) -> ConfigResult<()> {
        let i = check_interface(interface)?;
        self.interfaces[i].fifo_mut(kind).set_trigger(level)
    }

    // =========================================================================
    // Cross-Connect
    // =========================================================================

    /// Install the requested routing.
    ///
    /// The matrix is indexed `timeslot + 32 * port`, port 0 being the
    /// controller side and ports 1 and 2 the E1 interfaces. Each entry is
    /// [`CROSS_IDLE`] or a source index below 96, optionally with the
    /// reverse bit set.
    ///
    /// The 7-bit source field can encode 0-127, but only the 96 slots of the
    /// three ports exist. Sources 96-127 are rejected rather than idled.
    ///
    /// # Errors
    ///
    /// `InvalidCrossConnect` if any entry names a source that does not exist.
    pub fn set_cross_matrix(&mut self, matrix: &[u8; CROSS_MATRIX_LEN]) -> ConfigResult<()> {
        let valid = matrix
            .iter()
            .all(|&b| b == CROSS_IDLE || usize::from(b & CROSS_SOURCE_MASK) < CROSS_MATRIX_LEN);
        if !valid {
            return Err(ConfigError::InvalidCrossConnect);
        }
        self.cross.set_requested(CrossMatrix(*matrix));

        if self.state == State::Running {
            self.refresh_cross();
            self.schedule();
        }
        Ok(())
    }

    /// Routing the caller asked for
    pub fn requested_cross_matrix(&self) -> &[u8; CROSS_MATRIX_LEN] {
        self.cross.requested().as_bytes()
    }

    /// Routing the chip currently runs
    pub fn active_cross_matrix(&self) -> &[u8; CROSS_MATRIX_LEN] {
        self.cross.active().as_bytes()
    }

    /// Run a decalogue pass: write changed registers, stage the matrix.
    pub(super) fn refresh_cross(&mut self) {
        let (_, tx_running) = self.running_masks();
        let pass = decalogue(&CrossInputs {
            requested: self.cross.requested(),
            table: self.plan.loaded(),
            tx_running,
            interfaces: &self.interfaces,
            ais_persist_polls: self.config.ais_persist_polls,
        });

        for (iface, on) in self.interfaces.iter_mut().zip(pass.tx_ais) {
            iface.tx_ais = on;
        }
        let writes = self.cross.apply_registers(&mut self.framer, &pass);
        if writes > 0 {
            trace!("decalogue wrote {} registers", writes);
        }
        self.cross.stage(&pass.matrix);
    }
}
