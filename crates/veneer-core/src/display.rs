//! Display-level pointer routing.
//!
//! The hub owns two things widgets cannot do alone:
//!
//! - a registry of display-wide pointer listeners (returned as RAII
//!   [`PointerGrab`] handles, so deregistration happens on every exit path),
//! - the single live capture drag and the single live auto-repeat session.
//!
//! While a drag is captured, every pointer event is routed to the drag
//! listener only, regardless of where the pointer is, with its position
//! clamped to the display bounds. Starting a second drag (or a second
//! auto-repeat) while one is live is a programming error and panics.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::{PointerEvent, Rect, Vec2};

new_key_type! {
    struct ListenerKey;
}

/// Returned by a capture drag listener after each event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabControl {
    Keep,
    Release,
}

type DragListener = Rc<dyn Fn(&PointerEvent) -> GrabControl>;

struct ActiveDrag {
    id: u64,
    listener: DragListener,
}

struct HubInner {
    bounds: Cell<Rect>,
    listeners: RefCell<SlotMap<ListenerKey, Rc<dyn Fn(&PointerEvent)>>>,
    drag: RefCell<Option<ActiveDrag>>,
    drag_seq: Cell<u64>,
    repeat_busy: Cell<bool>,
}

#[derive(Clone)]
pub struct DisplayHub {
    inner: Rc<HubInner>,
}

impl DisplayHub {
    pub fn new(bounds: Rect) -> Self {
        Self {
            inner: Rc::new(HubInner {
                bounds: Cell::new(bounds),
                listeners: RefCell::new(SlotMap::with_key()),
                drag: RefCell::new(None),
                drag_seq: Cell::new(0),
                repeat_busy: Cell::new(false),
            }),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.inner.bounds.get()
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.inner.bounds.set(bounds);
    }

    /// Registers a passive display-wide pointer listener. Dropping the
    /// returned grab deregisters it.
    pub fn subscribe(&self, f: impl Fn(&PointerEvent) + 'static) -> PointerGrab {
        let key = self.inner.listeners.borrow_mut().insert(Rc::new(f));
        PointerGrab {
            hub: Rc::downgrade(&self.inner),
            key,
        }
    }

    /// Begins a capture drag. The listener receives every subsequent pointer
    /// event (position clamped to display bounds) until it returns
    /// [`GrabControl::Release`] or the handle is dropped.
    ///
    /// # Panics
    /// Panics if a capture drag is already live.
    pub fn begin_drag(
        &self,
        listener: impl Fn(&PointerEvent) -> GrabControl + 'static,
    ) -> DragHandle {
        let mut drag = self.inner.drag.borrow_mut();
        assert!(
            drag.is_none(),
            "capture drag already in progress; one pointer drives one drag"
        );
        let id = self.inner.drag_seq.get() + 1;
        self.inner.drag_seq.set(id);
        *drag = Some(ActiveDrag {
            id,
            listener: Rc::new(listener),
        });
        log::debug!("capture drag #{id} started");
        DragHandle {
            hub: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn drag_active(&self) -> bool {
        self.inner.drag.borrow().is_some()
    }

    /// Routes one pointer event: to the capture drag listener when a drag is
    /// live, otherwise to every subscribed listener.
    pub fn dispatch(&self, ev: &PointerEvent) {
        let captured = self.inner.drag.borrow().as_ref().map(|d| (d.id, d.listener.clone()));
        if let Some((id, listener)) = captured {
            let clamped = ev.at(clamp_to(self.bounds(), ev.position));
            if listener(&clamped) == GrabControl::Release {
                let mut drag = self.inner.drag.borrow_mut();
                if drag.as_ref().is_some_and(|d| d.id == id) {
                    *drag = None;
                    log::debug!("capture drag #{id} released");
                }
            }
            return;
        }

        let snapshot: Vec<Rc<dyn Fn(&PointerEvent)>> =
            self.inner.listeners.borrow().values().cloned().collect();
        for l in snapshot {
            l(ev);
        }
    }

    /// Claims the process-wide auto-repeat slot.
    ///
    /// # Panics
    /// Panics if an auto-repeat session is already live.
    pub(crate) fn acquire_repeat(&self) {
        assert!(
            !self.inner.repeat_busy.get(),
            "auto-repeat session already active; one pointer drives one repeat"
        );
        self.inner.repeat_busy.set(true);
    }

    pub(crate) fn release_repeat(&self) {
        self.inner.repeat_busy.set(false);
    }

    pub fn repeat_active(&self) -> bool {
        self.inner.repeat_busy.get()
    }
}

fn clamp_to(bounds: Rect, p: Vec2) -> Vec2 {
    Vec2 {
        x: p.x.clamp(bounds.x, bounds.right()),
        y: p.y.clamp(bounds.y, bounds.bottom()),
    }
}

/// RAII handle for a passive display listener.
pub struct PointerGrab {
    hub: Weak<HubInner>,
    key: ListenerKey,
}

impl Drop for PointerGrab {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.listeners.borrow_mut().remove(self.key);
        }
    }
}

/// RAII handle for a capture drag; dropping it cancels the drag if it is
/// still the live one.
pub struct DragHandle {
    hub: Weak<HubInner>,
    id: u64,
}

impl DragHandle {
    pub fn is_live(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.drag.borrow().as_ref().is_some_and(|d| d.id == self.id))
    }
}

impl Drop for DragHandle {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            let mut drag = hub.drag.borrow_mut();
            if drag.as_ref().is_some_and(|d| d.id == self.id) {
                *drag = None;
                log::debug!("capture drag #{} canceled", self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PointerButton, PointerPhase};

    fn hub() -> DisplayHub {
        DisplayHub::new(Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    fn move_to(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(PointerPhase::Move, Vec2::new(x, y))
    }

    #[test]
    fn subscribe_is_raii() {
        let hub = hub();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let grab = hub.subscribe(move |_| c.set(c.get() + 1));
        hub.dispatch(&move_to(1.0, 1.0));
        drop(grab);
        hub.dispatch(&move_to(2.0, 2.0));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drag_captures_and_clamps() {
        let hub = hub();
        let passive = Rc::new(Cell::new(0));
        let p = passive.clone();
        let _watch = hub.subscribe(move |_| p.set(p.get() + 1));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let handle = hub.begin_drag(move |ev| {
            s.borrow_mut().push(ev.position);
            match ev.phase {
                PointerPhase::Up(_) => GrabControl::Release,
                _ => GrabControl::Keep,
            }
        });

        // pointer far outside the display still reaches the drag, clamped
        hub.dispatch(&move_to(-50.0, 9000.0));
        assert_eq!(seen.borrow()[0], Vec2::new(0.0, 600.0));
        assert_eq!(passive.get(), 0);

        hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(10.0, 10.0),
        ));
        assert!(!handle.is_live());
        assert!(!hub.drag_active());

        // capture gone: passive listeners see events again
        hub.dispatch(&move_to(3.0, 3.0));
        assert_eq!(passive.get(), 1);
    }

    #[test]
    #[should_panic(expected = "capture drag already in progress")]
    fn second_drag_is_fatal() {
        let hub = hub();
        let _a = hub.begin_drag(|_| GrabControl::Keep);
        let _b = hub.begin_drag(|_| GrabControl::Keep);
    }

    #[test]
    fn dropping_handle_cancels_drag() {
        let hub = hub();
        let handle = hub.begin_drag(|_| GrabControl::Keep);
        assert!(hub.drag_active());
        drop(handle);
        assert!(!hub.drag_active());
        // a fresh drag may start now
        let _next = hub.begin_drag(|_| GrabControl::Keep);
    }
}
