//! Step translator and action state machine.

pub(crate) mod machine;
pub(crate) mod step;

pub(crate) use machine::{ActionMachine, Event, Outcome, Owner};
pub(crate) use step::{
    ChannelIntent, Sides, Step, StepList, StepOp, translate_channel, translate_timeslots,
};
