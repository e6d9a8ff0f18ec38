// Concurrency sweep over task execution intervals
//
// Objective: for every instant of the observed range, how many tasks were
// executing at once; when the peak happened; how often each level occurred;
// and which windows stayed at or above an operator threshold.
//
// Each finished task contributes a Start and an End event. Events sharing a
// timestamp form one group and are applied as a single state transition;
// no level is ever observed between two events of the same group.

mod event;
mod sweep;

pub use event::{build_events, group_events, Event, EventGroup, EventKind};
pub use sweep::{
    analyze_concurrency, ConcurrencyReport, ConcurrencySnapshot, HighConcurrencyInterval,
    IntervalClose, LevelShare, DEFAULT_THRESHOLD,
};
