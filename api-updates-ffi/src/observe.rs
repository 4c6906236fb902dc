//! What each callee saw.
//!
//! Every exported entry point records the values it actually received, so a
//! caller can check that an old-shape call and a new-shape call arrive
//! identically. The log is per thread and keeps only the most recent
//! [`CAPACITY`] entries.

use std::cell::RefCell;
use std::collections::VecDeque;

/// Observations retained per thread; older ones are discarded.
pub const CAPACITY: usize = 256;

/// A value observed by a callee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Init { name: String, age: i32 },
    Foo { arg: i32 },
    Mode { mode: crate::v0::Mode },
    UseValues { a: i32, b: i32, combined: i32 },
}

thread_local! {
    static LOG: RefCell<VecDeque<Observation>> = const { RefCell::new(VecDeque::new()) };
}

pub(crate) fn record(observation: Observation) {
    LOG.with(|log| {
        let mut log = log.borrow_mut();
        if log.len() == CAPACITY {
            log.pop_front();
        }
        log.push_back(observation);
    });
}

/// Drain this thread's log, oldest first.
pub fn take() -> Vec<Observation> {
    LOG.with(|log| log.borrow_mut().drain(..).collect())
}

/// Most recent observation on this thread.
pub fn last() -> Option<Observation> {
    LOG.with(|log| log.borrow().back().cloned())
}
