//! Pointer interaction building blocks shared by every skin.
//!
//! [`HoverPress`] is the per-widget press/hover/drag state machine; capture
//! drags go through [`DisplayHub::begin_drag`](crate::DisplayHub::begin_drag)
//! and auto-repeat scrolling through [`start_auto_repeat`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::Duration;

use crate::{DisplayHub, TimerToken, Timers, Vec2};

/// Initial delay before an auto-repeat session starts ticking.
pub const REPEAT_DELAY: Duration = Duration::from_millis(400);
/// Tick period once an auto-repeat session is running.
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(30);

/// How far the pointer may wander from the press anchor before a press
/// becomes a drag.
pub const DRAG_THRESHOLD: f32 = 3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerState {
    #[default]
    Idle,
    Hovering,
    Pressed,
    Dragging,
}

/// Press/hover/drag bookkeeping for one widget.
///
/// Leave events clear hover/press visuals only; an in-progress capture drag
/// is unaffected because its events no longer flow through the widget at
/// all (they go to the display grab).
#[derive(Debug, Default)]
pub struct HoverPress {
    state: PointerState,
    anchor: Option<Vec2>,
}

impl HoverPress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn is_hovering(&self) -> bool {
        self.state == PointerState::Hovering
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, PointerState::Pressed | PointerState::Dragging)
    }

    pub fn on_enter(&mut self) {
        if self.state == PointerState::Idle {
            self.state = PointerState::Hovering;
        }
    }

    pub fn on_leave(&mut self) {
        self.state = PointerState::Idle;
        self.anchor = None;
    }

    pub fn on_press(&mut self, at: Vec2) {
        self.state = PointerState::Pressed;
        self.anchor = Some(at);
    }

    /// Returns true on the move that crosses the drag threshold.
    pub fn on_move(&mut self, at: Vec2) -> bool {
        match self.state {
            PointerState::Idle => {
                self.state = PointerState::Hovering;
                false
            }
            PointerState::Pressed => {
                let anchor = self.anchor.unwrap_or(at);
                let dx = at.x - anchor.x;
                let dy = at.y - anchor.y;
                if (dx * dx + dy * dy).sqrt() > DRAG_THRESHOLD {
                    self.state = PointerState::Dragging;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Returns true when a press or drag actually ended.
    pub fn on_release(&mut self) -> bool {
        let was_active = self.is_pressed();
        self.state = PointerState::Idle;
        self.anchor = None;
        was_active
    }
}

/// Whether an auto-repeat tick wants to keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatControl {
    Continue,
    Stop,
}

struct RepeatInner {
    hub: DisplayHub,
    timers: Timers,
    token: Cell<Option<TimerToken>>,
    stopped: Cell<bool>,
}

impl RepeatInner {
    fn finish(&self) {
        if self.stopped.replace(true) {
            return;
        }
        if let Some(token) = self.token.take() {
            self.timers.cancel(token);
        }
        self.hub.release_repeat();
        log::trace!("auto-repeat session finished");
    }
}

/// Handle to a running auto-repeat session. Dropping it stops the session;
/// the session also stops itself when a tick returns [`RepeatControl::Stop`].
pub struct RepeatHandle {
    inner: Rc<RepeatInner>,
}

impl RepeatHandle {
    pub fn stop(&self) {
        self.inner.finish();
    }

    pub fn is_active(&self) -> bool {
        !self.inner.stopped.get()
    }
}

impl Drop for RepeatHandle {
    fn drop(&mut self) {
        self.inner.finish();
    }
}

/// Starts the two-phase auto-repeat used by scroll arrows and track block
/// scrolling: one tick after [`REPEAT_DELAY`], then one every
/// [`REPEAT_INTERVAL`] until `tick` reports [`RepeatControl::Stop`].
///
/// The press itself usually applies the first increment directly; the
/// session only covers the holds.
///
/// # Panics
/// Panics if an auto-repeat session is already live on this hub.
pub fn start_auto_repeat(
    hub: &DisplayHub,
    timers: &Timers,
    tick: impl FnMut() -> RepeatControl + 'static,
) -> RepeatHandle {
    hub.acquire_repeat();
    let inner = Rc::new(RepeatInner {
        hub: hub.clone(),
        timers: timers.clone(),
        token: Cell::new(None),
        stopped: Cell::new(false),
    });
    let tick = Rc::new(RefCell::new(tick));

    let delay_inner = inner.clone();
    let delay_tick = tick.clone();
    let first = timers.once(REPEAT_DELAY, move || {
        if delay_inner.stopped.get() {
            return;
        }
        if (delay_tick.borrow_mut())() == RepeatControl::Stop {
            delay_inner.finish();
            return;
        }
        let run_inner = delay_inner.clone();
        let run_tick = delay_tick.clone();
        let recurring = delay_inner
            .timers
            .recurring(REPEAT_INTERVAL, REPEAT_INTERVAL, move || {
                if run_inner.stopped.get() {
                    return;
                }
                if (run_tick.borrow_mut())() == RepeatControl::Stop {
                    run_inner.finish();
                }
            });
        delay_inner.token.set(Some(recurring));
    });
    inner.token.set(Some(first));
    log::trace!("auto-repeat session started");

    RepeatHandle { inner }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rect, TestClock};

    fn setup() -> (DisplayHub, Timers, TestClock) {
        let clock = TestClock::new();
        (
            DisplayHub::new(Rect::new(0.0, 0.0, 640.0, 480.0)),
            Timers::new(Rc::new(clock.clone())),
            clock,
        )
    }

    #[test]
    fn press_move_release_cycle() {
        let mut hp = HoverPress::new();
        hp.on_enter();
        assert!(hp.is_hovering());
        hp.on_press(Vec2::new(10.0, 10.0));
        assert!(hp.is_pressed());
        assert!(!hp.on_move(Vec2::new(11.0, 10.0)));
        assert!(hp.on_move(Vec2::new(20.0, 10.0)));
        assert_eq!(hp.state(), PointerState::Dragging);
        assert!(hp.on_release());
        assert_eq!(hp.state(), PointerState::Idle);
    }

    #[test]
    fn leave_clears_press_visuals() {
        let mut hp = HoverPress::new();
        hp.on_press(Vec2::ZERO);
        hp.on_leave();
        assert_eq!(hp.state(), PointerState::Idle);
        assert!(!hp.on_release());
    }

    #[test]
    fn repeat_runs_after_delay_then_at_interval() {
        let (hub, timers, clock) = setup();
        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        let handle = start_auto_repeat(&hub, &timers, move || {
            t.set(t.get() + 1);
            RepeatControl::Continue
        });

        clock.advance(Duration::from_millis(200));
        timers.fire_due();
        assert_eq!(ticks.get(), 0);

        clock.advance(Duration::from_millis(200));
        timers.fire_due();
        assert_eq!(ticks.get(), 1);

        for _ in 0..5 {
            clock.advance(REPEAT_INTERVAL);
            timers.fire_due();
        }
        assert_eq!(ticks.get(), 6);

        handle.stop();
        clock.advance(REPEAT_INTERVAL);
        timers.fire_due();
        assert_eq!(ticks.get(), 6);
        assert!(!hub.repeat_active());
    }

    #[test]
    fn repeat_self_stops_and_frees_slot() {
        let (hub, timers, clock) = setup();
        let remaining = Rc::new(Cell::new(3));
        let b = remaining.clone();
        let handle = start_auto_repeat(&hub, &timers, move || {
            b.set(b.get() - 1);
            if b.get() == 0 {
                RepeatControl::Stop
            } else {
                RepeatControl::Continue
            }
        });

        clock.advance(REPEAT_DELAY);
        timers.fire_due();
        clock.advance(REPEAT_INTERVAL);
        timers.fire_due();
        clock.advance(REPEAT_INTERVAL);
        timers.fire_due();
        assert_eq!(remaining.get(), 0);
        assert!(!handle.is_active());
        assert!(!hub.repeat_active());

        // slot is free again
        let h2 = start_auto_repeat(&hub, &timers, || RepeatControl::Stop);
        drop(h2);
    }

    #[test]
    #[should_panic(expected = "auto-repeat session already active")]
    fn concurrent_repeat_is_fatal() {
        let (hub, timers, _clock) = setup();
        let _a = start_auto_repeat(&hub, &timers, || RepeatControl::Continue);
        let _b = start_auto_repeat(&hub, &timers, || RepeatControl::Continue);
    }

    #[test]
    fn dropping_handle_cancels_pending_delay() {
        let (hub, timers, clock) = setup();
        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        let handle = start_auto_repeat(&hub, &timers, move || {
            t.set(t.get() + 1);
            RepeatControl::Continue
        });
        drop(handle);
        clock.advance(REPEAT_DELAY);
        timers.fire_due();
        assert_eq!(ticks.get(), 0);
        assert!(!hub.repeat_active());
    }
}
