// Start/End event generation and time grouping

use crate::task_record::{TaskId, TaskRecord};
use chrono::{DateTime, Utc};

/// Whether an event opens or closes a task's execution interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    End,
}

/// A Start or End marker at a specific instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub kind: EventKind,
    pub task_id: TaskId,
}

/// All events sharing one timestamp
#[derive(Debug, Clone, Copy)]
pub struct EventGroup<'a> {
    pub time: DateTime<Utc>,
    pub events: &'a [Event],
}

impl EventGroup<'_> {
    /// Number of (Start, End) events in the group
    pub fn counts(&self) -> (usize, usize) {
        self.events
            .iter()
            .fold((0, 0), |(starts, ends), event| match event.kind {
                EventKind::Start => (starts + 1, ends),
                EventKind::End => (starts, ends + 1),
            })
    }

    /// Apply the group to a running count
    ///
    /// Starts are added before Ends are subtracted, so a task that starts
    /// and ends inside the group never drives the count below zero.
    pub fn apply(&self, current: usize) -> usize {
        let (starts, ends) = self.counts();
        current + starts - ends
    }
}

/// Generate two events per record, sorted by time
///
/// The sort is stable: inside a timestamp, events keep the order in which
/// records were supplied. Grouping makes that order irrelevant to the
/// result.
pub fn build_events(records: &[TaskRecord]) -> Vec<Event> {
    let mut events = Vec::with_capacity(records.len() * 2);

    for record in records {
        events.push(Event {
            time: record.started_at,
            kind: EventKind::Start,
            task_id: record.id.clone(),
        });
        events.push(Event {
            time: record.ended_at,
            kind: EventKind::End,
            task_id: record.id.clone(),
        });
    }

    events.sort_by_key(|event| event.time);
    events
}

/// Split time-sorted events into groups of identical timestamps
pub fn group_events(events: &[Event]) -> impl Iterator<Item = EventGroup<'_>> {
    events
        .chunk_by(|a, b| a.time == b.time)
        .map(|chunk| EventGroup {
            time: chunk[0].time,
            events: chunk,
        })
}
