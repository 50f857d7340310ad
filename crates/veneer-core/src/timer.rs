//! Timer service.
//!
//! Single-threaded, pump-driven: the host calls [`Timers::fire_due`] from its
//! event loop and every due callback runs synchronously on that thread.
//! Tokens are cancellable; a canceled token never fires (the canceled flag is
//! re-checked immediately before each invocation, so canceling from another
//! callback in the same pump is honored), and canceling a token that already
//! fired is a no-op.
//!
//! Time is read through an injectable [`Clock`] so tests can drive it
//! deterministically.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use web_time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests; cloned handles share the same time.
#[derive(Clone)]
pub struct TestClock {
    t: Rc<Cell<Instant>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            t: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.t.set(self.t.get() + d);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

new_key_type! {
    pub struct TimerToken;
}

struct TimerEntry {
    due: Instant,
    period: Option<Duration>,
    callback: Rc<dyn Fn()>,
    canceled: Rc<Cell<bool>>,
}

struct TimersInner {
    clock: Rc<dyn Clock>,
    entries: RefCell<SlotMap<TimerToken, TimerEntry>>,
}

#[derive(Clone)]
pub struct Timers {
    inner: Rc<TimersInner>,
}

impl Timers {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(TimersInner {
                clock,
                entries: RefCell::new(SlotMap::with_key()),
            }),
        }
    }

    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    pub fn once(&self, delay: Duration, callback: impl Fn() + 'static) -> TimerToken {
        self.insert(delay, None, Rc::new(callback))
    }

    pub fn recurring(
        &self,
        delay: Duration,
        period: Duration,
        callback: impl Fn() + 'static,
    ) -> TimerToken {
        self.insert(delay, Some(period), Rc::new(callback))
    }

    fn insert(
        &self,
        delay: Duration,
        period: Option<Duration>,
        callback: Rc<dyn Fn()>,
    ) -> TimerToken {
        let due = self.now() + delay;
        self.inner.entries.borrow_mut().insert(TimerEntry {
            due,
            period,
            callback,
            canceled: Rc::new(Cell::new(false)),
        })
    }

    /// No-op when the token already fired (one-shot) or was canceled before.
    pub fn cancel(&self, token: TimerToken) {
        if let Some(entry) = self.inner.entries.borrow_mut().remove(token) {
            entry.canceled.set(true);
        }
    }

    pub fn is_scheduled(&self, token: TimerToken) -> bool {
        self.inner.entries.borrow().contains_key(token)
    }

    /// Runs every callback whose due time has arrived; returns how many ran.
    ///
    /// Recurring entries are re-armed relative to the current time rather
    /// than their nominal due time, so a long stall does not produce a burst
    /// of catch-up ticks.
    pub fn fire_due(&self) -> usize {
        let now = self.now();
        let due: Vec<(TimerToken, Rc<dyn Fn()>, Rc<Cell<bool>>, bool)> = {
            let mut entries = self.inner.entries.borrow_mut();
            let keys: Vec<TimerToken> = entries
                .iter()
                .filter(|(_, e)| e.due <= now)
                .map(|(k, _)| k)
                .collect();
            keys.into_iter()
                .map(|k| {
                    let one_shot = entries[k].period.is_none();
                    if let Some(period) = entries[k].period {
                        entries[k].due = now + period;
                    }
                    let e = &entries[k];
                    (k, e.callback.clone(), e.canceled.clone(), one_shot)
                })
                .collect()
        };

        let mut fired = 0;
        for (token, callback, canceled, one_shot) in due {
            if canceled.get() {
                continue;
            }
            if one_shot {
                // retire before invoking so a self-cancel inside the
                // callback stays a no-op
                self.inner.entries.borrow_mut().remove(token);
            }
            callback();
            fired += 1;
        }
        fired
    }
}
