//! Action state machine.
//!
//! Exactly one primitive directive is outstanding at a time. Every
//! directive arms the hardware timer: an action with the action timeout,
//! a pause with its own length. The outcome is latched until the scheduler
//! consumes it and returns the machine to `Void`.

use crate::hal::pcm::Direction;

/// Who issued the outstanding directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    /// A step of the command request in this slot
    Request(u16),
    /// A jump or fast-abort correcting a ring
    Ring(Direction, u8),
    /// A cross-matrix commit
    Cross,
}

/// Latched result of a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ok,
    Fail,
    Timeout,
}

/// Five-state action machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ActionState {
    /// Idle, nothing in flight
    #[default]
    Void,
    /// Action posted, waiting for its acknowledgement vector
    ActionPending(Owner),
    /// Pause timer running
    PausePending(Owner),
    /// Directive succeeded
    Ok(Owner),
    /// Chip reported failure
    Fail(Owner),
    /// Timer expired before the acknowledgement
    Timeout(Owner),
}

/// What an event did to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    /// The event moved the machine to an outcome
    Settled,
    /// The event did not match the current state
    Ignored,
}

#[derive(Debug, Default)]
pub(crate) struct ActionMachine {
    state: ActionState,
}

#[allow(dead_code)]
impl ActionMachine {
    pub const fn new() -> Self {
        Self {
            state: ActionState::Void,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Whether a new directive may be issued
    pub fn is_void(&self) -> bool {
        self.state == ActionState::Void
    }

    /// Whether a directive is in flight
    pub fn is_pending(&self) -> bool {
        matches!(
            self.state,
            ActionState::ActionPending(_) | ActionState::PausePending(_)
        )
    }

    /// Record that an action was posted.
    pub fn begin_action(&mut self, owner: Owner) {
        debug_assert!(self.is_void(), "action issued while another is outstanding");
        self.state = ActionState::ActionPending(owner);
    }

    /// Record that a pause was started.
    pub fn begin_pause(&mut self, owner: Owner) {
        debug_assert!(self.is_void(), "pause started while another is outstanding");
        self.state = ActionState::PausePending(owner);
    }

    /// Apply an acknowledgement vector from the action queue.
    pub fn on_ack(&mut self, ok: bool) -> Event {
        match self.state {
            ActionState::ActionPending(owner) => {
                self.state = if ok {
                    ActionState::Ok(owner)
                } else {
                    ActionState::Fail(owner)
                };
                Event::Settled
            }
            _ => Event::Ignored,
        }
    }

    /// Apply a timer expiry.
    pub fn on_timer(&mut self) -> Event {
        match self.state {
            ActionState::ActionPending(owner) => {
                self.state = ActionState::Timeout(owner);
                Event::Settled
            }
            ActionState::PausePending(owner) => {
                self.state = ActionState::Ok(owner);
                Event::Settled
            }
            _ => Event::Ignored,
        }
    }

    /// Consume a latched outcome, returning the machine to `Void`.
    pub fn take_outcome(&mut self) -> Option<(Owner, Outcome)> {
        let result = match self.state {
            ActionState::Ok(o) => (o, Outcome::Ok),
            ActionState::Fail(o) => (o, Outcome::Fail),
            ActionState::Timeout(o) => (o, Outcome::Timeout),
            _ => return None,
        };
        self.state = ActionState::Void;
        Some(result)
    }

    /// Forget everything (controller stop or reset).
    pub fn reset(&mut self) {
        self.state = ActionState::Void;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_ok_path() {
        let mut m = ActionMachine::new();
        m.begin_action(Owner::Request(4));
        assert!(m.is_pending());
        assert_eq!(m.on_ack(true), Event::Settled);
        assert_eq!(m.state(), ActionState::Ok(Owner::Request(4)));
        assert_eq!(m.take_outcome(), Some((Owner::Request(4), Outcome::Ok)));
        assert!(m.is_void());
    }

    #[test]
    fn ack_fail_path() {
        let mut m = ActionMachine::new();
        m.begin_action(Owner::Cross);
        m.on_ack(false);
        assert_eq!(m.take_outcome(), Some((Owner::Cross, Outcome::Fail)));
    }

    #[test]
    fn timer_times_out_action() {
        let mut m = ActionMachine::new();
        m.begin_action(Owner::Ring(Direction::Tx, 9));
        assert_eq!(m.on_timer(), Event::Settled);
        assert_eq!(
            m.take_outcome(),
            Some((Owner::Ring(Direction::Tx, 9), Outcome::Timeout))
        );
    }

    #[test]
    fn timer_completes_pause() {
        let mut m = ActionMachine::new();
        m.begin_pause(Owner::Request(1));
        assert_eq!(m.on_ack(true), Event::Ignored);
        assert_eq!(m.on_timer(), Event::Settled);
        assert_eq!(m.take_outcome(), Some((Owner::Request(1), Outcome::Ok)));
    }

    #[test]
    fn late_ack_after_timeout_is_ignored() {
        let mut m = ActionMachine::new();
        m.begin_action(Owner::Request(2));
        m.on_timer();
        assert_eq!(m.on_ack(true), Event::Ignored);
        assert_eq!(m.take_outcome(), Some((Owner::Request(2), Outcome::Timeout)));
        assert_eq!(m.on_ack(true), Event::Ignored);
        assert_eq!(m.take_outcome(), None);
    }
}
