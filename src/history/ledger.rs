use std::collections::VecDeque;

use crate::codec::Snapshot;

use super::{Direction, HistoryEntry, HistoryError};

/// Default number of snapshots kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 50;

/// An undo or redo that has been started but not yet confirmed by the
/// document.
#[derive(Debug, Clone)]
pub struct Transition {
    ticket: u64,
    direction: Direction,
    from: usize,
    to: usize,
    snapshot: Snapshot,
}

impl Transition {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Cursor before the transition.
    pub fn from(&self) -> usize {
        self.from
    }

    /// Cursor once the transition commits.
    pub fn to(&self) -> usize {
        self.to
    }

    /// The entry the document must be rebuilt from.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    direction: Direction,
    to: usize,
}

/// What happened to a recorded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub cursor: usize,
    /// Redo-able entries thrown away.
    pub discarded: usize,
    /// Oldest entries evicted by the capacity cap.
    pub evicted: usize,
}

/// Bounded, cursor-addressed sequence of snapshots.
///
/// `record` appends after the cursor (dropping anything redo-able),
/// `begin_undo`/`begin_redo` start a two-phase move that only lands on
/// `commit`. While a move is in flight the entries never change and
/// `record` is refused, since the document is about to be replaced.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    entries: VecDeque<Snapshot>,
    cursor: Option<usize>,
    capacity: usize,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    evicted_total: u64,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryLedger {
    /// Create an empty ledger. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        HistoryLedger {
            entries: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
            in_flight: None,
            next_ticket: 1,
            evicted_total: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry matching the live document; None when empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn can_undo(&self) -> bool {
        self.in_flight.is_none() && matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.in_flight.is_none() && matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Record a new snapshot as the current state.
    ///
    /// Fails with `TransitionPending` while an undo/redo is in flight.
    pub fn record(&mut self, snapshot: Snapshot) -> Result<RecordOutcome, HistoryError> {
        self.ensure_idle()?;
        let keep = self.cursor.map_or(0, |c| c + 1);
        let discarded = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot);

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        self.evicted_total += evicted as u64;

        let cursor = self.entries.len() - 1;
        self.cursor = Some(cursor);
        Ok(RecordOutcome {
            cursor,
            discarded,
            evicted,
        })
    }

    /// Start moving one step back. `Ok(None)` when there is nothing to undo.
    pub fn begin_undo(&mut self) -> Result<Option<Transition>, HistoryError> {
        self.begin(Direction::Undo)
    }

    /// Start moving one step forward. `Ok(None)` when there is nothing to redo.
    pub fn begin_redo(&mut self) -> Result<Option<Transition>, HistoryError> {
        self.begin(Direction::Redo)
    }

    pub fn begin(&mut self, direction: Direction) -> Result<Option<Transition>, HistoryError> {
        if self.in_flight.is_some() {
            return Err(HistoryError::TransitionPending { direction });
        }
        let Some(from) = self.cursor else {
            return Ok(None);
        };
        let to = match direction {
            Direction::Undo if from > 0 => from - 1,
            Direction::Redo if from + 1 < self.entries.len() => from + 1,
            _ => return Ok(None),
        };
        let Some(snapshot) = self.entries.get(to).cloned() else {
            return Ok(None);
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(InFlight {
            ticket,
            direction,
            to,
        });
        Ok(Some(Transition {
            ticket,
            direction,
            from,
            to,
            snapshot,
        }))
    }

    /// Land the in-flight transition once the document has confirmed it.
    /// Returns the new cursor.
    pub fn commit(&mut self, ticket: u64) -> Result<usize, HistoryError> {
        let in_flight = self.take_in_flight(ticket)?;
        self.cursor = Some(in_flight.to);
        Ok(in_flight.to)
    }

    /// Drop the in-flight transition, leaving the cursor where it was.
    pub fn abort(&mut self, ticket: u64) -> Result<(), HistoryError> {
        self.take_in_flight(ticket)?;
        Ok(())
    }

    fn take_in_flight(&mut self, ticket: u64) -> Result<InFlight, HistoryError> {
        match self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket => {
                self.in_flight = None;
                Ok(in_flight)
            }
            _ => Err(HistoryError::StaleTransition { ticket }),
        }
    }

    /// Fails with `TransitionPending` while an undo/redo is in flight.
    pub fn ensure_idle(&self) -> Result<(), HistoryError> {
        match self.in_flight {
            Some(in_flight) => Err(HistoryError::TransitionPending {
                direction: in_flight.direction,
            }),
            None => Ok(()),
        }
    }

    /// Start over from a single snapshot (opening another project).
    pub fn reset(&mut self, snapshot: Snapshot) -> Result<(), HistoryError> {
        self.ensure_idle()?;
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.cursor = Some(0);
        self.evicted_total = 0;
        Ok(())
    }

    /// Listing for a history panel: one row per entry.
    pub fn view(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, _)| {
                let absolute = self.evicted_total + index as u64;
                HistoryEntry {
                    index,
                    label: if absolute == 0 {
                        "Initial state".to_string()
                    } else {
                        format!("Edit {}", absolute)
                    },
                    current: self.cursor == Some(index),
                    redoable: self.cursor.map_or(true, |c| index > c),
                }
            })
            .collect()
    }
}
