//! Action sequencing for the controller.
//!
//! This module extends [`Controller`] with the loop that feeds the chip one
//! action at a time. Whenever the action state machine is idle the next
//! action is picked in this order:
//!
//! 1. the next step of the command being executed
//! 2. a ring correction (jump or fast-abort), only between commands
//! 3. a staged cross-connect commit
//! 4. the first step of the next queued command
//!
//! Outcomes come back through [`Controller::handle_interrupt`] and are
//! resolved here.

use super::config::State;
use super::controller::{Controller, SlotState, intent_of};
use super::error::{ActionError, ErrorBits};
use super::notify::ErrorSource;
use super::request::{Command, Payload, resolve_fill};
use crate::hal::framer::LineFramer;
use crate::hal::pcm::{
    Action, AllChannelsAction, AllChannelsPhase, ChannelAction, ChannelCommand, Direction,
    PcmController,
};
use crate::internal::action::{
    Outcome, Owner, Sides, Step, StepList, StepOp, translate_channel, translate_timeslots,
};
use crate::internal::constants::NUM_CHANNELS;
use crate::internal::dma::{Fix, Reconcile, classify, halt_index};

// =============================================================================
// Scheduling
// =============================================================================

impl<P, F, const DESCS: usize, const REQS: usize> Controller<P, F, DESCS, REQS>
where
    P: PcmController,
    F: LineFramer,
{
    /// Issue actions until one is outstanding or nothing is left to do.
    pub(super) fn schedule(&mut self) {
        if self.state != State::Running {
            return;
        }
        while self.machine.is_void() {
            if let Some(slot) = self.current {
                let slot = usize::from(slot);
                match self.slots[slot].steps.current() {
                    Some(step) => self.issue_step(slot, step),
                    None => self.finish_command(slot, ErrorBits::empty()),
                }
                continue;
            }
            if self.fire_corrections() {
                break;
            }
            if let Some(matrix) = self.cross.take_commit() {
                debug!("committing cross matrix");
                self.issue(Owner::Cross, &Action::CrossConnect(matrix));
                break;
            }
            let Some(next) = self.commands.pop_front() else {
                break;
            };
            self.begin_command(usize::from(next));
        }
    }

    /// Send an action to the chip under the action timeout.
    fn issue(&mut self, owner: Owner, action: &Action) {
        self.chip.issue_action(action);
        self.chip.arm_timer(self.config.action_timeout_frames);
        self.machine.begin_action(owner);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Translate a command against the current running state.
    fn begin_command(&mut self, slot: usize) {
        let request = self.slots[slot].request;
        let ch = request.channel as usize;
        self.slots[slot].state = SlotState::Active;
        self.current = Some(slot as u16);

        if let Some(config) = request.config() {
            self.channel_configs[ch] = config;
        }

        let mut steps = StepList::new();
        if let Payload::Timeslots {
            mask,
            rx_fill,
            tx_fill,
        } = request.payload
        {
            let default = self.channel_configs[ch].fill_mask;
            self.plan.assign(
                request.channel,
                mask,
                resolve_fill(rx_fill, default),
                resolve_fill(tx_fill, default),
            );
            if self.plan.is_dirty() {
                let changed = self.plan.changed_channels();
                let (rx, tx) = self.running_masks();
                steps = translate_timeslots(rx & changed, tx & changed, self.config.pause_frames);
            }
        }
        if request.command.intersects(Command::RUN_CONTROL | Command::CONFIGURE) {
            let more = translate_channel(
                request.channel,
                self.running[ch],
                intent_of(request.command),
                self.config.pause_frames,
            );
            for step in more.iter() {
                steps.push(step.channel, step.op);
            }
        }

        debug!(
            "command {} on channel {}: {} steps",
            request.command.bits(),
            request.channel,
            steps.len()
        );
        self.slots[slot].steps = steps;
    }

    fn issue_step(&mut self, slot: usize, step: Step) {
        let owner = Owner::Request(slot as u16);
        match self.action_for(step) {
            Some(action) => {
                trace!("step on channel {}", step.channel);
                self.issue(owner, &action);
            }
            None => {
                let frames = match step.op {
                    StepOp::Pause(frames) => frames,
                    _ => 0,
                };
                self.chip.arm_timer(u32::from(frames));
                self.machine.begin_pause(owner);
            }
        }
    }

    /// Hardware action for a step; `None` for a pause.
    fn action_for(&self, step: Step) -> Option<Action> {
        let ch = step.channel;
        let channel = |rx, tx, spec| {
            Action::Channel(ChannelAction {
                channel: ch,
                rx,
                tx,
                spec,
                rx_start: self.pool.halt_addr(Direction::Rx, ch),
                tx_start: self.pool.halt_addr(Direction::Tx, ch),
            })
        };
        let pick = |on: bool, command| if on { command } else { ChannelCommand::Unchanged };
        let spec = self.channel_configs[ch as usize].spec_word();

        let action = match step.op {
            StepOp::Pause(_) => return None,
            StepOp::Init(s) => channel(
                pick(s.rx, ChannelCommand::Init),
                pick(s.tx, ChannelCommand::Init),
                None,
            ),
            StepOp::Abort(s) => channel(
                pick(s.rx, ChannelCommand::Abort),
                pick(s.tx, ChannelCommand::Abort),
                None,
            ),
            StepOp::ConfigClear => channel(ChannelCommand::Clear, ChannelCommand::Clear, None),
            StepOp::ConfigNew(s) => channel(
                pick(s.rx, ChannelCommand::Init),
                pick(s.tx, ChannelCommand::Init),
                Some(spec),
            ),
            StepOp::AbortAll { rx, tx } => self.all_channels(AllChannelsPhase::Abort, rx, tx),
            StepOp::ClearAll(mask) => self.all_channels(AllChannelsPhase::Clear, mask, mask),
            StepOp::LoadAll(mask) => self.all_channels(AllChannelsPhase::Load, mask, mask),
            StepOp::RestoreAll { rx, tx } => {
                self.all_channels(AllChannelsPhase::Restore, rx, tx)
            }
            StepOp::Timeslots => Action::Timeslots(*self.plan.target()),
        };
        Some(action)
    }

    fn all_channels(&self, phase: AllChannelsPhase, rx_mask: u32, tx_mask: u32) -> Action {
        let mut specs = [0u32; NUM_CHANNELS];
        let mut rx_start = [0u32; NUM_CHANNELS];
        let mut tx_start = [0u32; NUM_CHANNELS];
        for ch in 0..NUM_CHANNELS {
            specs[ch] = self.channel_configs[ch].spec_word();
            rx_start[ch] = self.pool.halt_addr(Direction::Rx, ch as u8);
            tx_start[ch] = self.pool.halt_addr(Direction::Tx, ch as u8);
        }
        Action::AllChannels(AllChannelsAction {
            phase,
            rx_mask,
            tx_mask,
            specs,
            table: *self.plan.target(),
            rx_start,
            tx_start,
        })
    }

    /// Receive and transmit masks of running sides
    pub(super) fn running_masks(&self) -> (u32, u32) {
        self.running
            .iter()
            .enumerate()
            .fold((0, 0), |(rx, tx), (ch, sides)| {
                (rx | (u32::from(sides.rx) << ch), tx | (u32::from(sides.tx) << ch))
            })
    }

    /// Record what an acknowledged step changed on the chip.
    fn apply_step(&mut self, step: Step) {
        let ch = step.channel as usize;
        match step.op {
            StepOp::Init(s) | StepOp::ConfigNew(s) => self.running[ch] = self.running[ch].union(s),
            StepOp::Abort(s) => self.running[ch] = self.running[ch].minus(s),
            StepOp::AbortAll { rx, tx } => {
                for (c, sides) in self.running.iter_mut().enumerate() {
                    *sides = sides.minus(Sides::new(rx & (1 << c) != 0, tx & (1 << c) != 0));
                }
            }
            StepOp::RestoreAll { rx, tx } => {
                for (c, sides) in self.running.iter_mut().enumerate() {
                    *sides = sides.union(Sides::new(rx & (1 << c) != 0, tx & (1 << c) != 0));
                }
            }
            StepOp::Timeslots | StepOp::LoadAll(_) => self.plan.commit(),
            StepOp::Pause(_) | StepOp::ConfigClear | StepOp::ClearAll(_) => {}
        }
    }

    /// Complete the current command and bring rings and routing in line
    /// with the new running state.
    fn finish_command(&mut self, slot: usize, error: ErrorBits) {
        self.current = None;
        if !error.is_empty() {
            if self.plan.is_dirty() {
                self.plan.revert();
            }
            for ch in 0..NUM_CHANNELS as u8 {
                self.recompute_enabled(ch);
            }
        }
        self.complete(slot, error, 0);
        self.settle_rings();
        self.refresh_cross();
    }

    /// Mark running rings for reconciliation and cancel buffers on sides
    /// that are neither running nor wanted.
    fn settle_rings(&mut self) {
        for dir in Direction::ALL {
            for ch in 0..NUM_CHANNELS as u8 {
                let c = ch as usize;
                if self.running[c].get(dir) {
                    self.rings[dir.index()][c].dirty = true;
                } else if !self.enabled[c].get(dir) {
                    self.flush_ring(dir, ch);
                }
            }
        }
    }

    // =========================================================================
    // Ring Corrections
    // =========================================================================

    /// Reconcile dirty rings; issues at most one correction.
    ///
    /// Returns `true` if an action was issued.
    fn fire_corrections(&mut self) -> bool {
        for dir in Direction::ALL {
            for ch in 0..NUM_CHANNELS as u8 {
                let (d, c) = (dir.index(), ch as usize);
                if !self.rings[d][c].dirty {
                    continue;
                }
                self.reap(dir, ch);

                let ring = self.rings[d][c];
                if ring.fix.is_some() {
                    continue;
                }
                if !self.running[c].get(dir) {
                    self.rings[d][c].dirty = false;
                    continue;
                }

                let verdict = if ring.force_abort {
                    Reconcile::Correct(Fix::FastAbort)
                } else {
                    let current = self.chip.current_descriptor(dir, ch);
                    classify(&self.pool, &ring.chain, halt_index(dir, ch), current)
                };

                let ring = &mut self.rings[d][c];
                ring.dirty = false;
                ring.force_abort = false;
                let Reconcile::Correct(fix) = verdict else {
                    continue;
                };
                ring.fix = Some(fix);

                let action = match fix {
                    Fix::Jump(address) => {
                        trace!("jump channel {} to {}", ch, address);
                        Action::Jump {
                            dir,
                            channel: ch,
                            address,
                        }
                    }
                    Fix::FastAbort => {
                        debug!("fast-abort channel {}", ch);
                        Action::FastAbort { dir, channel: ch }
                    }
                };
                self.issue(Owner::Ring(dir, ch), &action);
                return true;
            }
        }
        false
    }

    /// Complete every buffer of a ring with `CANCELLED`.
    pub(super) fn flush_ring(&mut self, dir: Direction, channel: u8) {
        self.reap(dir, channel);
        let (d, c) = (dir.index(), channel as usize);
        while let Some(idx) = self.rings[d][c].chain.pop_head(&self.pool) {
            let handle = self.pool.handle(idx);
            let owner = self.pool.owner(idx);
            self.release_descriptor(handle);
            if let Some(slot) = owner {
                self.complete(usize::from(slot), ErrorBits::CANCELLED, 0);
            }
        }
        self.rings[d][c].force_abort = false;
    }

    /// Drop buffers that were cancelled while claimed, once the chip let go
    /// of them.
    fn flush_cancelled(&mut self, dir: Direction, channel: u8) {
        let (d, c) = (dir.index(), channel as usize);
        loop {
            let found = self.rings[d][c].chain.iter(&self.pool).find(|&idx| {
                self.pool
                    .owner(idx)
                    .is_some_and(|slot| self.slots[usize::from(slot)].cancelled)
            });
            let Some(idx) = found else {
                break;
            };
            let handle = self.pool.handle(idx);
            let owner = self.pool.owner(idx);
            self.rings[d][c].chain.unlink(&self.pool, idx);
            self.release_descriptor(handle);
            if let Some(slot) = owner {
                self.complete(usize::from(slot), ErrorBits::CANCELLED, 0);
            }
        }
    }

    // =========================================================================
    // Outcomes
    // =========================================================================

    /// Resolve the settled action, if any.
    pub(super) fn process_outcome(&mut self) {
        let Some((owner, outcome)) = self.machine.take_outcome() else {
            return;
        };
        match owner {
            Owner::Request(slot) => self.on_step_outcome(usize::from(slot), outcome),
            Owner::Ring(dir, ch) => self.on_fix_outcome(dir, ch, outcome),
            Owner::Cross => self.on_cross_outcome(outcome),
        }
    }

    fn on_step_outcome(&mut self, slot: usize, outcome: Outcome) {
        if self.current != Some(slot as u16) {
            return;
        }
        let Some(step) = self.slots[slot].steps.current() else {
            return;
        };
        let error = match outcome {
            Outcome::Ok => {
                self.apply_step(step);
                self.slots[slot].steps.advance();
                return;
            }
            Outcome::Fail => ActionError::Failed,
            Outcome::Timeout => ActionError::Timeout,
        };

        warn!("action on channel {}: {}", step.channel, error.as_str());
        self.slots[slot].steps.abandon();
        self.report(ErrorSource::Channel(step.channel), error.status_bit());
        self.finish_command(slot, error.status_bit());
    }

    fn on_fix_outcome(&mut self, dir: Direction, channel: u8, outcome: Outcome) {
        let (d, c) = (dir.index(), channel as usize);
        let Some(fix) = self.rings[d][c].fix.take() else {
            return;
        };
        self.rings[d][c].dirty = true;
        match outcome {
            Outcome::Ok => {
                if fix == Fix::FastAbort {
                    self.flush_cancelled(dir, channel);
                }
            }
            Outcome::Fail | Outcome::Timeout => {
                let error = if outcome == Outcome::Fail {
                    ActionError::Failed
                } else {
                    ActionError::Timeout
                };
                warn!("ring correction on channel {}: {}", channel, error.as_str());
                self.report(ErrorSource::Channel(channel), error.status_bit());
            }
        }
    }

    fn on_cross_outcome(&mut self, outcome: Outcome) {
        if outcome == Outcome::Ok {
            debug!("cross matrix committed");
            self.cross.on_commit(true);
            return;
        }
        let error = if outcome == Outcome::Fail {
            ActionError::Failed
        } else {
            ActionError::Timeout
        };
        warn!("cross matrix commit: {}", error.as_str());
        self.report(ErrorSource::Controller, error.status_bit());
        self.cross.on_commit(false);
    }
}
