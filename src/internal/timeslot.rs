//! Timeslot assignment plan.
//!
//! `target` is rebuilt from per-channel assignment requests; `loaded` is the
//! copy the chip currently runs. A difference between the two is what a
//! timeslot request has to commit.

use crate::hal::pcm::{TimeslotTable, TimeslotWord};
use crate::internal::constants::NUM_TIMESLOTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TimeslotPlan {
    target: TimeslotTable,
    loaded: TimeslotTable,
}

impl TimeslotPlan {
    pub const fn new() -> Self {
        Self {
            target: TimeslotTable::IDLE,
            loaded: TimeslotTable::IDLE,
        }
    }

    /// Give `channel` exactly the timeslots in `mask`.
    ///
    /// Slots in `mask` are taken from any previous owner; slots the channel
    /// held outside `mask` are released.
    pub fn assign(&mut self, channel: u8, mask: u32, rx_fill: u8, tx_fill: u8) {
        for ts in 0..NUM_TIMESLOTS {
            let word = &mut self.target.0[ts];
            if mask & (1 << ts) != 0 {
                *word = TimeslotWord::assigned(channel, rx_fill, tx_fill);
            } else if word.belongs_to(channel) {
                *word = TimeslotWord::IDLE;
            }
        }
    }

    /// Whether the target differs from what the chip runs
    pub fn is_dirty(&self) -> bool {
        self.target != self.loaded
    }

    /// Channels that gain, lose or change any timeslot
    pub fn changed_channels(&self) -> u32 {
        let mut mask = 0u32;
        for ts in 0..NUM_TIMESLOTS {
            let (old, new) = (self.loaded.0[ts], self.target.0[ts]);
            if old == new {
                continue;
            }
            for word in [old, new] {
                for ch in [word.rx_channel(), word.tx_channel()].into_iter().flatten() {
                    mask |= 1 << ch;
                }
            }
        }
        mask
    }

    /// The chip accepted the target
    pub fn commit(&mut self) {
        self.loaded = self.target;
    }

    /// Drop the uncommitted target
    pub fn revert(&mut self) {
        self.target = self.loaded;
    }

    pub fn target(&self) -> &TimeslotTable {
        &self.target
    }

    pub fn loaded(&self) -> &TimeslotTable {
        &self.loaded
    }

    /// Forget everything (controller restart)
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_then_commit_is_clean() {
        let mut plan = TimeslotPlan::new();
        plan.assign(0, 0b1110, 0xFF, 0xFF);
        assert!(plan.is_dirty());
        assert_eq!(plan.changed_channels(), 1);
        assert_eq!(plan.target().mask_of(0), 0b1110);
        plan.commit();
        assert!(!plan.is_dirty());
        assert_eq!(plan.loaded().mask_of(0), 0b1110);
    }

    #[test]
    fn repeated_assignment_is_idempotent() {
        let mut plan = TimeslotPlan::new();
        plan.assign(4, 0b110000, 0xFF, 0xFF);
        plan.commit();
        plan.assign(4, 0b110000, 0xFF, 0xFF);
        assert!(!plan.is_dirty());
        assert_eq!(plan.changed_channels(), 0);
    }

    #[test]
    fn later_assignment_wins_and_affects_both_owners() {
        let mut plan = TimeslotPlan::new();
        plan.assign(1, 0b0110, 0xFF, 0xFF);
        plan.commit();
        plan.assign(2, 0b0100, 0xFF, 0xFF);
        assert_eq!(plan.target().mask_of(1), 0b0010);
        assert_eq!(plan.target().mask_of(2), 0b0100);
        assert_eq!(plan.changed_channels(), 0b0110);
    }

    #[test]
    fn shrinking_releases_slots() {
        let mut plan = TimeslotPlan::new();
        plan.assign(3, 0xF0, 0xFF, 0xFF);
        plan.commit();
        plan.assign(3, 0x30, 0xFF, 0xFF);
        assert_eq!(plan.target().get(7), TimeslotWord::IDLE);
        assert_eq!(plan.changed_channels(), 1 << 3);
    }

    #[test]
    fn revert_restores_loaded() {
        let mut plan = TimeslotPlan::new();
        plan.assign(3, 0xF0, 0xFF, 0xFF);
        plan.revert();
        assert!(!plan.is_dirty());
        assert_eq!(plan.target().mask_of(3), 0);
    }

    #[test]
    fn fill_change_marks_channel() {
        let mut plan = TimeslotPlan::new();
        plan.assign(5, 1 << 9, 0xFF, 0xFF);
        plan.commit();
        plan.assign(5, 1 << 9, 0xFE, 0xFF);
        assert_eq!(plan.changed_channels(), 1 << 5);
    }
}
