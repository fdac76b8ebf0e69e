//! Test assertion helpers - waiting on asynchronous effects and checking sent traffic
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::future::Future;
use std::time::Duration;

use huddle::{ClientMessage, RoomEvent};

use super::setup::TestSetup;

const WAIT_LIMIT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

// ============================================================================
// Waiting Helpers
// ============================================================================

impl TestSetup {
    /// Polls `condition` until it holds, failing the test after a bounded wait
    pub async fn wait_until<F, Fut>(&self, condition: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = bool>,
    {
        let waited = tokio::time::timeout(WAIT_LIMIT, async {
            while !condition().await {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "condition not reached in time");
    }

    pub async fn wait_for_sent_count(&self, kind: &str, count: usize) {
        let waited = tokio::time::timeout(WAIT_LIMIT, async {
            while self.count_sent(kind) < count {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "expected {} {} message(s), client sent {:?}",
            count,
            kind,
            self.server.received_kinds()
        );
    }

    pub async fn wait_for_event<P>(&self, predicate: P) -> RoomEvent
    where
        P: Fn(&RoomEvent) -> bool,
    {
        let found = tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                if let Some(event) = self.events().into_iter().find(|e| predicate(e)) {
                    return event;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;
        found.unwrap_or_else(|_| panic!("event not emitted, saw {:?}", self.events()))
    }

    pub fn events(&self) -> Vec<RoomEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_events(&self, predicate: impl Fn(&RoomEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn count_sent(&self, kind: &str) -> usize {
        self.server
            .received_kinds()
            .iter()
            .filter(|k| **k == kind)
            .count()
    }

    /// Client messages of one kind, in send order
    pub fn sent_of_kind(&self, kind: &str) -> Vec<ClientMessage> {
        self.server
            .received()
            .into_iter()
            .filter(|m| m.kind() == kind)
            .collect()
    }
}

// ============================================================================
// Ordering Assertions
// ============================================================================

/// Asserts `expected` appears in `actual` as an in-order subsequence
pub fn assert_in_order<T: AsRef<str> + std::fmt::Debug>(actual: &[T], expected: &[&str]) {
    let mut remaining = expected.iter().peekable();
    for item in actual {
        if remaining.peek().is_some_and(|next| **next == item.as_ref()) {
            remaining.next();
        }
    }
    assert!(
        remaining.peek().is_none(),
        "expected {:?} in order within {:?}",
        expected,
        actual
    );
}

/// Position of the first `kind` at or after `from`
pub fn index_of(kinds: &[&'static str], kind: &str, from: usize) -> Option<usize> {
    kinds
        .iter()
        .skip(from)
        .position(|k| *k == kind)
        .map(|i| i + from)
}
