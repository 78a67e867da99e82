//! The "now" collaborator.
//!
//! Every rule that compares against the current time takes it from a [`Clock`]
//! so tests can pin it.

use std::cell::Cell;

use chrono::{Duration, Utc};

use crate::model::Instant;

pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Reads the OS clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<Instant>,
}

impl FixedClock {
    pub fn new(now: Instant) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: Instant) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
