//! The multiplexed E1/HDLC controller.
//!
//! This module contains the [`Controller`] structure and its core operations:
//!
//! - Construction, start and stop
//! - Request submission and cancellation
//! - Read-only state accessors
//! - Notification queueing and dispatch
//!
//! Action sequencing lives in [`scheduler`](super::scheduler), interrupt
//! processing in [`interrupt`](super::interrupt), and everything touching the
//! E1 lines (status polling, signalling FIFOs, cross-connect) in
//! [`line`](super::line).

use embedded_hal::delay::DelayNs;

use super::config::{ChannelConfig, ControllerConfig, State};
use super::error::{ConfigError, ConfigResult, DmaError, Error, ErrorBits, IoError, Result};
use super::notify::{ErrorSink, ErrorSource, Notification, RequestSink, StatusSink, deliver};
use super::request::{
    CancelOutcome, Command, Payload, Rejected, RequestId, UserRequest, check_channel,
};
use super::status::{AlarmFlags, ChannelState, ChannelStats};
use crate::hal::framer::{FifoKind, LineFramer};
use crate::hal::pcm::{Direction, IqQueue, PcmController};
use crate::hal::poll::BoundedPoll;
use crate::internal::action::{ActionMachine, ChannelIntent, Sides, StepList};
use crate::internal::constants::{
    DEFAULT_DESCRIPTORS, DEFAULT_REQUESTS, NUM_CHANNELS, NUM_INTERFACES,
};
use crate::internal::dma::{Chain, DescHandle, DescriptorPool, Fix};
use crate::internal::e1::{CrossEngine, InterfaceState};
use crate::internal::iq::IqCursor;
use crate::internal::ring::IndexRing;
use crate::internal::timeslot::TimeslotPlan;

// =============================================================================
// Helper Types
// =============================================================================

/// Lifecycle of a request slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SlotState {
    Free,
    /// Waiting in the command queue
    Queued,
    /// Command whose steps are executing
    Active,
    /// Buffer linked into a ring
    InChain,
    /// Completion queued, not yet delivered
    Done,
}

/// One accepted request and its engine bookkeeping
#[derive(Debug, Clone, Copy)]
pub(super) struct RequestSlot {
    pub request: UserRequest,
    pub generation: u16,
    pub state: SlotState,
    /// Engine reference plus one per queued completion
    pub refs: u8,
    /// Cancelled while the chip held its descriptor
    pub cancelled: bool,
    pub desc: Option<DescHandle>,
    pub steps: StepList,
}

impl RequestSlot {
    const EMPTY: Self = Self {
        request: UserRequest::new(Command::empty(), 0),
        generation: 0,
        state: SlotState::Free,
        refs: 0,
        cancelled: false,
        desc: None,
        steps: StepList::new(),
    };
}

/// Software side of one DMA ring
#[derive(Debug, Clone, Copy)]
pub(super) struct Ring {
    pub chain: Chain,
    /// Correction issued and not yet answered
    pub fix: Option<Fix>,
    /// Break the running transfer on the next reconciliation
    pub force_abort: bool,
    /// Needs reaping and reconciliation
    pub dirty: bool,
}

impl Ring {
    pub(super) const NEW: Self = Self {
        chain: Chain::new(),
        fix: None,
        force_abort: false,
        dirty: false,
    };
}

// =============================================================================
// Controller
// =============================================================================

/// Multiplexed E1/HDLC adapter controller
///
/// Owns the chip, the line framers, the descriptor pool and every queue of
/// the engine. All mutation happens through `&mut self`; wrap the controller
/// in [`SharedController`](crate::sync::SharedController) to share it with
/// an interrupt handler.
///
/// # Type Parameters
/// * `P` - The PCM/HDLC chip
/// * `F` - The E1 framers and cross-connect registers
/// * `DESCS` - Descriptor pool size, the 64 halt anchors included
/// * `REQS` - Maximum number of requests alive at once
///
/// # Example
/// ```ignore
/// let mut ctrl: Controller<_, _> = Controller::new(chip, framer, ControllerConfig::new()
///     .with_descriptor_base(DESC_BUS_ADDR));
/// ctrl.start(&mut delay)?;
///
/// ctrl.submit(UserRequest::timeslots(0, 0b1110))?;
/// ctrl.submit(UserRequest::new(Command::START_RX | Command::START_TX, 0))?;
/// ctrl.submit(UserRequest::rx(0, buf_addr, 256))?;
///
/// // From the interrupt handler
/// ctrl.handle_interrupt();
/// ctrl.dispatch(&mut sinks);
/// ```
///
/// # Module Organization
///
/// The controller is split across several modules for clarity:
/// - Core operations (this module): lifecycle, submit/cancel, accessors
/// - [`scheduler`](super::scheduler): step execution and ring corrections
/// - [`interrupt`](super::interrupt): interrupt queue draining and reaping
/// - [`line`](super::line): E1 interfaces, FIFOs and the cross-connect
pub struct Controller<
    P: PcmController,
    F: LineFramer,
    const DESCS: usize = { DEFAULT_DESCRIPTORS },
    const REQS: usize = { DEFAULT_REQUESTS },
> {
    /// PCM/HDLC chip
    pub(super) chip: P,
    /// Line framers
    pub(super) framer: F,
    /// Current configuration
    pub(super) config: ControllerConfig,
    /// Current state
    pub(super) state: State,
    /// Descriptor arena shared by all rings
    pub(super) pool: DescriptorPool<DESCS>,
    /// Rings indexed by direction, then channel
    pub(super) rings: [[Ring; NUM_CHANNELS]; 2],
    /// Request arena
    pub(super) slots: [RequestSlot; REQS],
    /// Where the next free-slot scan starts
    next_slot: usize,
    /// Command requests waiting for the action engine
    pub(super) commands: IndexRing<REQS>,
    /// Command currently executing
    pub(super) current: Option<u16>,
    /// Completed requests waiting for dispatch
    completed: IndexRing<REQS>,
    pub(super) channel_errors: [ErrorBits; NUM_CHANNELS],
    pub(super) interface_errors: [ErrorBits; NUM_INTERFACES],
    pub(super) controller_errors: ErrorBits,
    pub(super) status_delta: [AlarmFlags; NUM_INTERFACES],
    pub(super) fifo_triggered: [[bool; 2]; NUM_INTERFACES],
    /// Action state machine
    pub(super) machine: ActionMachine,
    /// Sides the chip runs, as confirmed by acknowledged actions
    pub(super) running: [Sides; NUM_CHANNELS],
    /// Sides the caller asked for
    pub(super) enabled: [Sides; NUM_CHANNELS],
    pub(super) channel_configs: [ChannelConfig; NUM_CHANNELS],
    pub(super) plan: TimeslotPlan,
    /// Interrupt queue cursors, indexed like [`IqQueue::ALL`]
    pub(super) cursors: [IqCursor; 3],
    pub(super) interfaces: [InterfaceState; NUM_INTERFACES],
    pub(super) cross: CrossEngine,
    pub(super) stats: [ChannelStats; NUM_CHANNELS],
}

impl<P, F, const DESCS: usize, const REQS: usize> Controller<P, F, DESCS, REQS>
where
    P: PcmController,
    F: LineFramer,
{
    /// Create a new controller
    ///
    /// This is a const function suitable for static initialization.
    /// The controller is created in the `Uninitialized` state; nothing is
    /// written to the hardware until [`start`](Self::start).
    pub const fn new(chip: P, framer: F, config: ControllerConfig) -> Self {
        Self {
            chip,
            framer,
            config,
            state: State::Uninitialized,
            pool: DescriptorPool::new(),
            rings: [[Ring::NEW; NUM_CHANNELS]; 2],
            slots: [RequestSlot::EMPTY; REQS],
            next_slot: 0,
            commands: IndexRing::new(),
            current: None,
            completed: IndexRing::new(),
            channel_errors: [ErrorBits::empty(); NUM_CHANNELS],
            interface_errors: [ErrorBits::empty(); NUM_INTERFACES],
            controller_errors: ErrorBits::empty(),
            status_delta: [AlarmFlags::empty(); NUM_INTERFACES],
            fifo_triggered: [[false; 2]; NUM_INTERFACES],
            machine: ActionMachine::new(),
            running: [Sides::NONE; NUM_CHANNELS],
            enabled: [Sides::NONE; NUM_CHANNELS],
            channel_configs: [ChannelConfig::new(); NUM_CHANNELS],
            plan: TimeslotPlan::new(),
            cursors: [
                IqCursor::new(IqQueue::Action),
                IqCursor::new(IqQueue::Tx),
                IqCursor::new(IqQueue::Rx),
            ],
            interfaces: [InterfaceState::new(); NUM_INTERFACES],
            cross: CrossEngine::new(),
            stats: [ChannelStats::ZERO; NUM_CHANNELS],
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Get the current state
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Get the current configuration
    #[inline(always)]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Borrow the chip
    pub fn chip(&self) -> &P {
        &self.chip
    }

    /// Mutably borrow the chip, for board-level register access
    pub fn chip_mut(&mut self) -> &mut P {
        &mut self.chip
    }

    /// Borrow the line framers
    pub fn framer(&self) -> &F {
        &self.framer
    }

    /// Descriptors currently free
    pub fn free_descriptors(&self) -> usize {
        self.pool.available()
    }

    /// Running, enabled and queued state of one channel
    pub fn channel_state(&self, channel: u8) -> ConfigResult<ChannelState> {
        let ch = check_channel(channel)?;
        let running = self.running[ch];
        let enabled = self.enabled[ch];
        Ok(ChannelState {
            rx_running: running.rx,
            tx_running: running.tx,
            rx_enabled: enabled.rx,
            tx_enabled: enabled.tx,
            timeslots: self.plan.loaded().mask_of(channel),
            rx_queued: self.rings[Direction::Rx.index()][ch].chain.len() as u16,
            tx_queued: self.rings[Direction::Tx.index()][ch].chain.len() as u16,
        })
    }

    /// Counters of one channel
    pub fn stats(&self, channel: u8) -> ConfigResult<ChannelStats> {
        let ch = check_channel(channel)?;
        Ok(self.stats[ch])
    }

    /// Reset the counters of one channel
    pub fn clear_stats(&mut self, channel: u8) -> ConfigResult<()> {
        let ch = check_channel(channel)?;
        self.stats[ch] = ChannelStats::ZERO;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reset the chip and bring the engine up.
    ///
    /// Soft-resets the chip and polls for completion within the configured
    /// budget, anchors all 64 rings on their halt descriptors, loads the idle
    /// codes and stages the initial cross-connect. Any request state left
    /// from a previous run has already been completed by [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// - `AlreadyStarted` if the controller is running
    /// - a configuration error if the config does not validate
    /// - `ResetFailed` if the chip does not come out of reset in time
    pub fn start<D: DelayNs>(&mut self, delay: D) -> Result<()> {
        if self.state == State::Running {
            return Err(ConfigError::AlreadyStarted.into());
        }
        self.config.validate()?;

        self.chip.soft_reset();
        let chip = &mut self.chip;
        BoundedPoll::with_timeout(delay, self.config.reset_timeout)
            .until(|| chip.reset_done())
            .map_err(|_| ConfigError::ResetFailed)?;

        self.pool.init(self.config.descriptor_base);
        self.rings = [[Ring::NEW; NUM_CHANNELS]; 2];
        for cursor in &mut self.cursors {
            cursor.reset(&mut self.chip);
        }
        self.machine.reset();
        self.current = None;
        self.running = [Sides::NONE; NUM_CHANNELS];
        self.enabled = [Sides::NONE; NUM_CHANNELS];
        self.plan.reset();
        self.cross.reset();
        self.framer.set_idle_codes(&self.config.idle_codes);

        self.state = State::Running;
        info!("controller started, {} descriptors", self.pool.capacity());

        self.refresh_cross();
        self.schedule();
        Ok(())
    }

    /// Stop the engine.
    ///
    /// Every request still alive is completed with `CANCELLED`, exactly
    /// once, and the chip is reset so it no longer touches any descriptor.
    pub fn stop(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Err(IoError::InvalidState.into());
        }

        self.chip.cancel_timer();
        self.chip.soft_reset();
        self.machine.reset();
        self.current = None;
        self.commands.clear();

        for slot in 0..REQS {
            let s = self.slots[slot];
            if !matches!(s.state, SlotState::Queued | SlotState::Active | SlotState::InChain) {
                continue;
            }
            if let Some(handle) = s.desc {
                self.release_descriptor(handle);
            }
            self.complete(slot, ErrorBits::CANCELLED, 0);
        }

        self.rings = [[Ring::NEW; NUM_CHANNELS]; 2];
        self.running = [Sides::NONE; NUM_CHANNELS];
        self.enabled = [Sides::NONE; NUM_CHANNELS];
        self.state = State::Stopped;
        info!("controller stopped");
        Ok(())
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Submit a request.
    ///
    /// Accepted requests complete exactly once through the notification
    /// queue; a buffer that cannot get a descriptor is accepted and
    /// completes with `ALLOC`.
    ///
    /// # Errors
    ///
    /// The request is handed back with the reason when it is malformed, the
    /// controller is not running, or every request slot is in use.
    pub fn submit(&mut self, request: UserRequest) -> core::result::Result<RequestId, Rejected> {
        let reject = |error: Error| Rejected { request, error };
        if self.state != State::Running {
            return Err(reject(IoError::InvalidState.into()));
        }
        request.validate().map_err(reject)?;
        let Some(slot) = self.alloc_slot() else {
            return Err(reject(DmaError::NoRequestsAvailable.into()));
        };

        let s = &mut self.slots[slot];
        s.request = request;
        s.request.error = ErrorBits::empty();
        s.request.transferred = 0;
        s.state = SlotState::Queued;
        s.refs = 1;
        s.cancelled = false;
        s.desc = None;
        s.steps = StepList::new();
        let id = RequestId {
            index: slot as u16,
            generation: s.generation,
        };

        match request.data_direction() {
            Some(dir) => self.queue_buffer(slot, dir),
            None => {
                let ch = request.channel as usize;
                self.enabled[ch] = apply_intent(self.enabled[ch], request.command);
                self.commands.push_back(slot as u16);
            }
        }

        self.schedule();
        Ok(id)
    }

    /// Cancel a request.
    ///
    /// A request the chip has not claimed is removed at once. One whose
    /// descriptor the chip is working on stays alive, marked cancelled, and
    /// completes from its interrupt; with `break_if_running` the transfer is
    /// broken with a fast-abort first. A command whose steps are executing
    /// always runs to completion.
    pub fn cancel(&mut self, id: RequestId, break_if_running: bool) -> CancelOutcome {
        let Some(slot) = self.lookup(id) else {
            return CancelOutcome::NotFound;
        };
        match self.slots[slot].state {
            SlotState::Queued => {
                self.commands.remove(slot as u16);
                self.complete(slot, ErrorBits::CANCELLED, 0);
                let ch = self.slots[slot].request.channel;
                self.recompute_enabled(ch);
                // Buffers queued behind a start that will no longer happen.
                for dir in Direction::ALL {
                    let c = ch as usize;
                    if !self.running[c].get(dir) && !self.enabled[c].get(dir) {
                        self.flush_ring(dir, ch);
                    }
                }
                self.schedule();
                CancelOutcome::Cancelled
            }
            SlotState::Active => CancelOutcome::Deferred,
            SlotState::InChain => self.cancel_buffer(slot, break_if_running),
            SlotState::Free | SlotState::Done => CancelOutcome::NotFound,
        }
    }

    fn cancel_buffer(&mut self, slot: usize, break_if_running: bool) -> CancelOutcome {
        let request = self.slots[slot].request;
        let Some(dir) = request.data_direction() else {
            return CancelOutcome::NotFound;
        };
        let ch = request.channel;
        let (d, c) = (dir.index(), ch as usize);

        // Anything the chip already finished completes normally.
        self.reap(dir, ch);
        if self.slots[slot].state != SlotState::InChain {
            return CancelOutcome::NotFound;
        }
        let Some(handle) = self.slots[slot].desc else {
            return CancelOutcome::NotFound;
        };
        let Ok(idx) = self.pool.resolve(handle) else {
            return CancelOutcome::NotFound;
        };

        let current = self.chip.current_descriptor(dir, ch);
        let claimed = self.running[c].get(dir) && self.pool.index_of(current) == Some(idx);
        if claimed {
            self.slots[slot].cancelled = true;
            if break_if_running {
                let ring = &mut self.rings[d][c];
                ring.force_abort = true;
                ring.dirty = true;
                self.schedule();
            }
            return CancelOutcome::Deferred;
        }

        self.rings[d][c].chain.unlink(&self.pool, idx);
        self.release_descriptor(handle);
        self.complete(slot, ErrorBits::CANCELLED, 0);
        self.rings[d][c].dirty = true;
        self.schedule();
        CancelOutcome::Cancelled
    }

    /// Link a buffer request into its ring.
    fn queue_buffer(&mut self, slot: usize, dir: Direction) {
        let request = self.slots[slot].request;
        let ch = request.channel;
        let c = ch as usize;
        let Payload::Buffer { addr, len } = request.payload else {
            self.complete(slot, ErrorBits::CANCELLED, 0);
            return;
        };
        if !self.running[c].get(dir) && !self.enabled[c].get(dir) {
            self.complete(slot, ErrorBits::CANCELLED, 0);
            return;
        }

        let handle = match self.pool.allocate(slot as u16) {
            Ok(handle) => handle,
            Err(_) => {
                warn!("descriptor pool exhausted, channel {}", ch);
                self.complete(slot, ErrorBits::ALLOC, 0);
                return;
            }
        };
        let idx = usize::from(handle.index);
        let halt = self.pool.halt_addr(dir, ch);
        self.pool.desc(idx).prepare(dir, addr, len, halt);

        let ring = &mut self.rings[dir.index()][c];
        ring.chain.append(&mut self.pool, idx, halt);
        ring.dirty = true;

        let s = &mut self.slots[slot];
        s.desc = Some(handle);
        s.state = SlotState::InChain;
    }

    /// Return a descriptor to the pool.
    pub(super) fn release_descriptor(&mut self, handle: DescHandle) {
        if let Err(e) = self.pool.free(handle) {
            warn!("descriptor {} not freed: {}", handle.index, e.as_str());
        }
    }

    /// Recompute a channel's enabled sides from what runs plus the intents
    /// still waiting in the command queue.
    pub(super) fn recompute_enabled(&mut self, channel: u8) {
        let ch = channel as usize;
        let mut enabled = self.running[ch];
        for i in 0..self.commands.len() {
            let Some(slot) = self.commands.get(i) else {
                break;
            };
            let request = self.slots[usize::from(slot)].request;
            if request.channel == channel {
                enabled = apply_intent(enabled, request.command);
            }
        }
        self.enabled[ch] = enabled;
    }

    // =========================================================================
    // Request Slots
    // =========================================================================

    fn alloc_slot(&mut self) -> Option<usize> {
        for i in 0..REQS {
            let slot = (self.next_slot + i) % REQS;
            if self.slots[slot].state == SlotState::Free {
                self.next_slot = (slot + 1) % REQS;
                return Some(slot);
            }
        }
        None
    }

    fn lookup(&self, id: RequestId) -> Option<usize> {
        let slot = usize::from(id.index);
        let s = self.slots.get(slot)?;
        (s.generation == id.generation && !matches!(s.state, SlotState::Free | SlotState::Done))
            .then_some(slot)
    }

    /// Finish a request and queue its completion.
    ///
    /// A slot that already completed is left alone, so racing paths (a
    /// cancel against a reap, a stop against an outcome) complete once.
    pub(super) fn complete(&mut self, slot: usize, error: ErrorBits, transferred: u16) {
        let s = &mut self.slots[slot];
        if matches!(s.state, SlotState::Free | SlotState::Done) {
            return;
        }
        s.request.error = error;
        s.request.transferred = transferred;
        s.state = SlotState::Done;
        s.desc = None;
        s.refs += 1;
        self.completed.push_back(slot as u16);
        self.release(slot);
    }

    fn release(&mut self, slot: usize) {
        let s = &mut self.slots[slot];
        s.refs = s.refs.saturating_sub(1);
        if s.refs == 0 {
            s.state = SlotState::Free;
            s.cancelled = false;
            s.generation = s.generation.wrapping_add(1);
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Coalesce error bits for a source.
    pub(super) fn report(&mut self, source: ErrorSource, bits: ErrorBits) {
        match source {
            ErrorSource::Channel(ch) => {
                if let Some(e) = self.channel_errors.get_mut(ch as usize) {
                    *e |= bits;
                }
            }
            ErrorSource::Interface(i) => {
                if let Some(e) = self.interface_errors.get_mut(i as usize) {
                    *e |= bits;
                }
            }
            ErrorSource::Controller => self.controller_errors |= bits,
        }
    }

    /// Whether any notification is waiting
    pub fn has_notifications(&self) -> bool {
        !self.completed.is_empty()
            || self.channel_errors.iter().any(|b| !b.is_empty())
            || self.interface_errors.iter().any(|b| !b.is_empty())
            || !self.controller_errors.is_empty()
            || self.status_delta.iter().any(|d| !d.is_empty())
            || self.fifo_triggered.iter().flatten().any(|&t| t)
    }

    /// Pop the next notification.
    ///
    /// Completions come first, in completion order; error and status
    /// reports are coalesced per source.
    pub fn next_notification(&mut self) -> Option<Notification> {
        if let Some(slot) = self.completed.pop_front() {
            let slot = usize::from(slot);
            let s = &self.slots[slot];
            let notification = Notification::Completed {
                id: RequestId {
                    index: slot as u16,
                    generation: s.generation,
                },
                request: s.request,
            };
            self.release(slot);
            return Some(notification);
        }

        if let Some(ch) = self.channel_errors.iter().position(|b| !b.is_empty()) {
            let bits = core::mem::take(&mut self.channel_errors[ch]);
            return Some(Notification::Error {
                source: ErrorSource::Channel(ch as u8),
                bits,
            });
        }
        if let Some(i) = self.interface_errors.iter().position(|b| !b.is_empty()) {
            let bits = core::mem::take(&mut self.interface_errors[i]);
            return Some(Notification::Error {
                source: ErrorSource::Interface(i as u8),
                bits,
            });
        }
        if !self.controller_errors.is_empty() {
            return Some(Notification::Error {
                source: ErrorSource::Controller,
                bits: core::mem::take(&mut self.controller_errors),
            });
        }

        if let Some(i) = self.status_delta.iter().position(|d| !d.is_empty()) {
            let delta = core::mem::take(&mut self.status_delta[i]);
            return Some(Notification::StatusChange {
                interface: i as u8,
                delta,
            });
        }
        for (i, flags) in self.fifo_triggered.iter_mut().enumerate() {
            for kind in FifoKind::ALL {
                if core::mem::take(&mut flags[kind.index()]) {
                    return Some(Notification::FifoTrigger {
                        interface: i as u8,
                        kind,
                    });
                }
            }
        }
        None
    }

    /// Deliver every queued notification to `sinks`.
    ///
    /// Returns the number delivered. Sinks may call back into the controller
    /// through their own handle; with [`SharedController`] use its
    /// `dispatch` instead, which releases the lock around each call.
    ///
    /// [`SharedController`]: crate::sync::SharedController
    pub fn dispatch<S>(&mut self, sinks: &mut S) -> usize
    where
        S: RequestSink + ErrorSink + StatusSink,
    {
        let mut count = 0;
        while let Some(notification) = self.next_notification() {
            deliver(sinks, notification);
            count += 1;
        }
        count
    }
}

/// Apply a command's run-control bits to a side pair.
pub(super) fn apply_intent(sides: Sides, command: Command) -> Sides {
    let intent = intent_of(command);
    sides.minus(intent.stop).union(intent.start)
}

/// Run-control intent carried by a command
pub(super) fn intent_of(command: Command) -> ChannelIntent {
    ChannelIntent {
        start: Sides::new(
            command.contains(Command::START_RX),
            command.contains(Command::START_TX),
        ),
        stop: Sides::new(
            command.contains(Command::STOP_RX),
            command.contains(Command::STOP_TX),
        ),
        configure: command.contains(Command::CONFIGURE),
    }
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Controller with the default pool sizes (256 descriptors, 64 requests)
pub type ControllerDefault<P, F> = Controller<P, F>;

/// Controller sized for a few lightly loaded channels
pub type ControllerSmall<P, F> = Controller<P, F, 128, 32>;

// =============================================================================
// Unit Tests
// =============================================================================
