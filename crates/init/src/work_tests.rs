// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

fn at(base: Instant, ms: u64) -> Instant {
    base + Duration::from_millis(ms)
}

#[test]
fn due_items_fire_in_deadline_order() {
    let now = Instant::now();
    let mut queue = WorkQueue::new();
    queue.schedule(WorkId::Finalize, Duration::from_millis(50), now);
    queue.schedule(WorkId::Crank, Duration::from_millis(10), now);
    queue.schedule(WorkId::Bootstrap, Duration::from_millis(100), now);

    let due = queue.take_due(at(now, 60));
    assert_eq!(due, vec![WorkId::Crank, WorkId::Finalize]);
    assert!(queue.is_pending(&WorkId::Bootstrap));
}

#[test]
fn equal_deadlines_fire_fifo() {
    let now = Instant::now();
    let mut queue = WorkQueue::new();
    queue.schedule(WorkId::Bootstrap, Duration::from_millis(10), now);
    queue.schedule(WorkId::Crank, Duration::from_millis(10), now);

    let due = queue.take_due(at(now, 10));
    assert_eq!(due, vec![WorkId::Bootstrap, WorkId::Crank]);
}

#[test]
fn reschedule_is_idempotent() {
    let now = Instant::now();
    let mut queue = WorkQueue::new();
    queue.schedule(WorkId::Crank, Duration::from_millis(10), now);
    // A second schedule while pending must not move the deadline.
    queue.schedule(WorkId::Crank, Duration::from_millis(500), at(now, 5));

    assert_eq!(queue.len(), 1);
    let due = queue.take_due(at(now, 20));
    assert_eq!(due, vec![WorkId::Crank]);
}

#[test]
fn fired_items_can_be_rescheduled() {
    let now = Instant::now();
    let mut queue = WorkQueue::new();
    queue.schedule(WorkId::Bootstrap, Duration::from_millis(10), now);
    assert_eq!(queue.take_due(at(now, 10)), vec![WorkId::Bootstrap]);

    queue.schedule(WorkId::Bootstrap, Duration::from_millis(10), at(now, 10));
    assert_eq!(queue.take_due(at(now, 20)), vec![WorkId::Bootstrap]);
}

#[test]
fn cancel_prevents_firing() {
    let now = Instant::now();
    let mut queue = WorkQueue::new();
    let stop = WorkId::StopTimeout { name: "sshd".to_string(), instance: 0 };
    queue.schedule(stop.clone(), Duration::from_millis(10), now);

    assert!(queue.cancel(&stop));
    assert!(!queue.cancel(&stop));
    assert!(queue.take_due(at(now, 100)).is_empty());
}

#[test]
fn next_deadline_tracks_earliest() {
    let now = Instant::now();
    let mut queue = WorkQueue::new();
    assert!(queue.next_deadline().is_none());

    queue.schedule(WorkId::Finalize, Duration::from_millis(50), now);
    queue.schedule(WorkId::Crank, Duration::from_millis(10), now);
    assert_eq!(queue.next_deadline(), Some(at(now, 10)));
}
