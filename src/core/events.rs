//! Audit records emitted by state transitions
//!
//! Every accepted `submit`, `confirm`, `execute` and `verify` appends one
//! immutable [`Event`] to the owning component's [`EventLog`]. Events are
//! for external observers and are never read back by the protocol itself.
//!
//! Logs of one deployment share an [`EventClock`], so every event carries a
//! deployment-wide `stamp` and logs can be merged without trusting wall time.

use super::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What happened
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A transaction was proposed to the multisig
    Submitted {
        index: u64,
        submitter: Address,
        target: Address,
        #[serde(with = "super::hex_bytes")]
        payload: Vec<u8>,
        value: u128,
    },
    /// A committee member confirmed a transaction
    Confirmed { index: u64, signer: Address },
    /// A transaction was consumed; `success` reports the forwarded call
    Executed {
        index: u64,
        executor: Address,
        success: bool,
        error: Option<String>,
    },
    /// A co-signed action passed signer recovery and consumed a nonce
    Verified {
        participants: Vec<Address>,
        nonce: u64,
        submitter: Address,
    },
    /// Outcome of forwarding a verified action to the ledger
    Finalized {
        participants: Vec<Address>,
        nonce: u64,
        success: bool,
        error: Option<String>,
    },
}

/// A single log entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Position in the log, starting at 0
    pub seq: u64,
    /// Deployment-wide order of recording
    #[serde(default)]
    pub stamp: u64,
    /// Component that emitted the event
    pub source: Address,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

/// Monotonic counter handing out event stamps
#[derive(Clone, Debug, Default)]
pub struct EventClock(Arc<AtomicU64>);

impl EventClock {
    /// A clock whose next stamp is `next`
    pub fn starting_at(next: u64) -> Self {
        Self(Arc::new(AtomicU64::new(next)))
    }

    /// Take the next stamp
    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    /// The stamp the next `tick` will return
    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Make every log in `logs` stamp from one clock, continuing after the
    /// highest stamp any of them already holds
    pub fn link(logs: &mut [&mut EventLog]) -> EventClock {
        let next = logs.iter().map(|l| l.next_stamp()).max().unwrap_or(0);
        let clock = EventClock::starting_at(next);
        for log in logs.iter_mut() {
            log.clock = clock.clone();
        }
        clock
    }
}

/// Events as stored in a snapshot
#[derive(Deserialize)]
struct StoredLog {
    events: Vec<Event>,
}

/// Append-only event log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "StoredLog")]
pub struct EventLog {
    events: Vec<Event>,
    #[serde(skip)]
    clock: EventClock,
}

impl From<StoredLog> for EventLog {
    fn from(stored: StoredLog) -> Self {
        let mut log = EventLog {
            events: stored.events,
            clock: EventClock::default(),
        };
        log.clock = EventClock::starting_at(log.next_stamp());
        log
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number
    pub fn record(&mut self, source: Address, kind: EventKind) -> u64 {
        let seq = self.events.len() as u64;
        let stamp = self.clock.tick();
        log::debug!("event #{} (stamp {}) from {}: {:?}", seq, stamp, source.short(), kind);
        self.events.push(Event {
            seq,
            stamp,
            source,
            kind,
            timestamp: Utc::now(),
        });
        seq
    }

    /// One past the highest stamp held
    pub fn next_stamp(&self) -> u64 {
        self.events.iter().map(|e| e.stamp + 1).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Events with `seq >= from`
    pub fn since(&self, from: u64) -> &[Event] {
        let start = (from as usize).min(self.events.len());
        &self.events[start..]
    }

    /// Events correlated with a multisig transaction index
    pub fn for_transaction(&self, index: u64) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| match &e.kind {
                EventKind::Submitted { index: i, .. }
                | EventKind::Confirmed { index: i, .. }
                | EventKind::Executed { index: i, .. } => *i == index,
                _ => false,
            })
            .collect()
    }

    /// Events correlated with a participant set (order-insensitive)
    pub fn for_participants(&self, participants: &[Address]) -> Vec<&Event> {
        let mut wanted = participants.to_vec();
        wanted.sort();
        self.events
            .iter()
            .filter(|e| match &e.kind {
                EventKind::Verified { participants: p, .. }
                | EventKind::Finalized { participants: p, .. } => {
                    let mut got = p.clone();
                    got.sort();
                    got == wanted
                }
                _ => false,
            })
            .collect()
    }

    /// Combine logs sharing a clock into one stamp-ordered log, renumbered from 0
    pub fn merged(logs: &[&EventLog]) -> EventLog {
        let mut events: Vec<Event> = logs.iter().flat_map(|l| l.events.iter().cloned()).collect();
        events.sort_by_key(|e| e.stamp);
        for (seq, event) in events.iter_mut().enumerate() {
            event.seq = seq as u64;
        }
        let mut merged = EventLog {
            events,
            clock: EventClock::default(),
        };
        merged.clock = EventClock::starting_at(merged.next_stamp());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_record_and_filter() {
        let mut log = EventLog::new();
        log.record(addr(9), EventKind::Confirmed { index: 0, signer: addr(1) });
        log.record(addr(9), EventKind::Confirmed { index: 1, signer: addr(1) });
        log.record(
            addr(9),
            EventKind::Verified {
                participants: vec![addr(2), addr(1)],
                nonce: 0,
                submitter: addr(3),
            },
        );

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_transaction(1).len(), 1);
        assert_eq!(log.for_participants(&[addr(1), addr(2)]).len(), 1);
        assert_eq!(log.since(2).len(), 1);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut log = EventLog::new();
        log.record(
            addr(9),
            EventKind::Submitted {
                index: 0,
                submitter: addr(1),
                target: addr(2),
                payload: vec![0xde, 0xad],
                value: 0,
            },
        );

        let json = serde_json::to_value(log.last().unwrap()).unwrap();
        assert_eq!(json["kind"]["submitted"]["payload"], "0xdead");
        assert_eq!(json["seq"], 0);
    }

    #[test]
    fn test_merge_follows_stamps_not_wall_clock() {
        let mut multisig = EventLog::new();
        let mut verifier = EventLog::new();
        EventClock::link(&mut [&mut multisig, &mut verifier]);

        multisig.record(addr(1), EventKind::Confirmed { index: 0, signer: addr(5) });
        verifier.record(
            addr(2),
            EventKind::Verified {
                participants: vec![addr(7), addr(8)],
                nonce: 0,
                submitter: addr(7),
            },
        );
        multisig.record(addr(1), EventKind::Confirmed { index: 1, signer: addr(5) });

        // A clock step backwards between records must not reorder them
        let later = multisig.events[0].timestamp;
        verifier.events[0].timestamp = later - chrono::Duration::hours(1);
        multisig.events[1].timestamp = later - chrono::Duration::hours(2);

        let merged = EventLog::merged(&[&multisig, &verifier]);
        let order: Vec<(u64, u64, Address)> = merged.iter().map(|e| (e.seq, e.stamp, e.source)).collect();
        assert_eq!(order, vec![(0, 0, addr(1)), (1, 1, addr(2)), (2, 2, addr(1))]);
    }

    #[test]
    fn test_clock_resumes_after_reload() {
        let mut multisig = EventLog::new();
        let mut verifier = EventLog::new();
        EventClock::link(&mut [&mut multisig, &mut verifier]);
        multisig.record(addr(1), EventKind::Confirmed { index: 0, signer: addr(5) });
        multisig.record(addr(1), EventKind::Confirmed { index: 0, signer: addr(6) });
        verifier.record(
            addr(2),
            EventKind::Verified {
                participants: vec![addr(7), addr(8)],
                nonce: 0,
                submitter: addr(7),
            },
        );

        let mut multisig: EventLog =
            serde_json::from_str(&serde_json::to_string(&multisig).unwrap()).unwrap();
        let mut verifier: EventLog =
            serde_json::from_str(&serde_json::to_string(&verifier).unwrap()).unwrap();
        let clock = EventClock::link(&mut [&mut multisig, &mut verifier]);
        assert_eq!(clock.peek(), 3);

        multisig.record(addr(1), EventKind::Confirmed { index: 1, signer: addr(5) });
        assert_eq!(multisig.last().unwrap().stamp, 3);
        verifier.record(
            addr(2),
            EventKind::Finalized {
                participants: vec![addr(7), addr(8)],
                nonce: 0,
                success: true,
                error: None,
            },
        );
        assert_eq!(verifier.last().unwrap().stamp, 4);
        assert_eq!(verifier.last().unwrap().seq, 1);
    }
}
