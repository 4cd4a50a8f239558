//! Periodic triggering and the look-ahead drain loop.

pub mod lookahead;
pub mod trigger;

pub use lookahead::{LookaheadScheduler, Transport};
pub use trigger::{
    IntervalTrigger, ManualTrigger, ManualTriggerHandle, TriggerCallback, TriggerSource,
};
