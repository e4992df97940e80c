//! Step translation.
//!
//! A command request expands into an ordered list of primitive steps, given
//! the channel's *actual* running state at the moment the request reaches
//! the head of the command queue.

use crate::hal::pcm::Direction;
use crate::internal::constants::MAX_STEPS;

/// Pair of per-direction flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Sides {
    pub rx: bool,
    pub tx: bool,
}

impl Sides {
    pub const NONE: Self = Self { rx: false, tx: false };
    pub const BOTH: Self = Self { rx: true, tx: true };

    pub const fn new(rx: bool, tx: bool) -> Self {
        Self { rx, tx }
    }

    pub const fn any(self) -> bool {
        self.rx || self.tx
    }

    pub const fn get(self, dir: Direction) -> bool {
        match dir {
            Direction::Rx => self.rx,
            Direction::Tx => self.tx,
        }
    }

    pub fn set(&mut self, dir: Direction, value: bool) {
        match dir {
            Direction::Rx => self.rx = value,
            Direction::Tx => self.tx = value,
        }
    }

    pub const fn union(self, other: Self) -> Self {
        Self::new(self.rx || other.rx, self.tx || other.tx)
    }

    pub const fn minus(self, other: Self) -> Self {
        Self::new(self.rx && !other.rx, self.tx && !other.tx)
    }

    pub const fn intersect(self, other: Self) -> Self {
        Self::new(self.rx && other.rx, self.tx && other.tx)
    }
}

/// Primitive hardware directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOp {
    /// Start sides from halt, configuration already loaded
    Init(Sides),
    /// Stop sides immediately
    Abort(Sides),
    /// Wait this many frames
    Pause(u16),
    /// Drop the channel configuration
    ConfigClear,
    /// Load configuration and start sides (possibly none)
    ConfigNew(Sides),
    /// Abort many channels (rx mask, tx mask)
    AbortAll { rx: u32, tx: u32 },
    /// Clear configuration of many channels
    ClearAll(u32),
    /// Install the timeslot table and configuration of many channels
    LoadAll(u32),
    /// Restart many channels (rx mask, tx mask)
    RestoreAll { rx: u32, tx: u32 },
    /// Install the timeslot table only
    Timeslots,
}

/// One step bound to its target channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Step {
    pub channel: u8,
    pub op: StepOp,
}

/// Fixed-capacity ordered step list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepList {
    steps: [Step; MAX_STEPS],
    len: u8,
    pos: u8,
}

#[allow(dead_code)]
impl StepList {
    const FILLER: Step = Step {
        channel: 0,
        op: StepOp::ConfigClear,
    };

    pub const fn new() -> Self {
        Self {
            steps: [Self::FILLER; MAX_STEPS],
            len: 0,
            pos: 0,
        }
    }

    pub fn push(&mut self, channel: u8, op: StepOp) {
        debug_assert!((self.len as usize) < MAX_STEPS, "step list overflow");
        if (self.len as usize) < MAX_STEPS {
            self.steps[self.len as usize] = Step { channel, op };
            self.len += 1;
        }
    }

    /// Step currently being executed (or next to issue)
    pub fn current(&self) -> Option<Step> {
        (self.pos < self.len).then(|| self.steps[self.pos as usize])
    }

    /// Move past the current step
    pub fn advance(&mut self) {
        if self.pos < self.len {
            self.pos += 1;
        }
    }

    /// Drop the remaining steps
    pub fn abandon(&mut self) {
        self.pos = self.len;
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.len
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Step> + '_ {
        self.steps[..self.len as usize].iter().copied()
    }
}

impl Default for StepList {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Translation
// =============================================================================

/// Run-control intent of one channel command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ChannelIntent {
    pub start: Sides,
    pub stop: Sides,
    pub configure: bool,
}

/// Translate a channel command against the channel's running sides.
///
/// - reconfiguring a running channel: abort what runs, pause, clear, then
///   load the new configuration and restart what should run
/// - stopping a side that leaves the other running: abort and pause only
/// - stopping the last running side: abort, pause and clear
/// - starting a side while the other is off: load configuration first
/// - starting a side while the other runs: change-only init
pub(crate) fn translate_channel(
    channel: u8,
    running: Sides,
    intent: ChannelIntent,
    pause: u16,
) -> StepList {
    let mut steps = StepList::new();
    let stop = intent.stop.intersect(running);
    let remaining = running.minus(stop);
    let start = intent.start.minus(remaining);

    if intent.configure && running.any() {
        let want = remaining.union(start);
        steps.push(channel, StepOp::Abort(running));
        steps.push(channel, StepOp::Pause(pause));
        steps.push(channel, StepOp::ConfigClear);
        if want.any() {
            steps.push(channel, StepOp::ConfigNew(want));
        }
        return steps;
    }

    if stop.any() {
        steps.push(channel, StepOp::Abort(stop));
        steps.push(channel, StepOp::Pause(pause));
        if !remaining.any() {
            steps.push(channel, StepOp::ConfigClear);
        }
    }

    if start.any() {
        if remaining.any() {
            steps.push(channel, StepOp::Init(start));
        } else {
            steps.push(channel, StepOp::ConfigNew(start));
        }
    }

    steps
}

/// Translate a timeslot table change.
///
/// `affected_rx`/`affected_tx` are the running sides of channels whose
/// timeslots change. One affected channel takes a cheap per-channel
/// sequence; several are coalesced into a single configure-all sequence.
pub(crate) fn translate_timeslots(affected_rx: u32, affected_tx: u32, pause: u16) -> StepList {
    let mut steps = StepList::new();
    let affected = affected_rx | affected_tx;

    match affected.count_ones() {
        0 => steps.push(0, StepOp::Timeslots),
        1 => {
            let channel = affected.trailing_zeros() as u8;
            let sides = Sides::new(affected_rx & affected != 0, affected_tx & affected != 0);
            steps.push(channel, StepOp::Abort(sides));
            steps.push(channel, StepOp::Pause(pause));
            steps.push(channel, StepOp::ConfigClear);
            steps.push(channel, StepOp::Timeslots);
            steps.push(channel, StepOp::ConfigNew(sides));
        }
        _ => {
            steps.push(0, StepOp::AbortAll {
                rx: affected_rx,
                tx: affected_tx,
            });
            steps.push(0, StepOp::Pause(pause));
            steps.push(0, StepOp::ClearAll(affected));
            steps.push(0, StepOp::LoadAll(affected));
            steps.push(0, StepOp::RestoreAll {
                rx: affected_rx,
                tx: affected_tx,
            });
        }
    }

    steps
}
