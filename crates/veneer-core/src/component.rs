//! Retained component handles.
//!
//! The component tree itself lives in the host application; skins only see a
//! [`Component`]: bounds, enabled/focused/visible flags with change
//! notification, and the repaint/relayout channel back to the host's
//! scheduler. Repaint requests are not deduplicated here; the scheduler is
//! expected to coalesce overlapping regions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Rect, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentId(pub u64);

/// Host-side scheduler the skins report dirt to.
pub trait RepaintScheduler {
    /// Request a repaint of the component, or of a region in its local space.
    fn repaint(&self, component: ComponentId, region: Option<Rect>);
    /// Request a re-layout of the component and its ancestors.
    fn relayout(&self, component: ComponentId);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlagChange {
    Enabled(bool),
    Focused(bool),
    Visible(bool),
    Resized(Size),
}

struct ComponentInner {
    id: ComponentId,
    bounds: Cell<Rect>,
    enabled: Cell<bool>,
    focused: Cell<bool>,
    visible: Cell<bool>,
    scheduler: Rc<dyn RepaintScheduler>,
    listeners: RefCell<Vec<Rc<dyn Fn(FlagChange)>>>,
}

#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    pub fn new(id: ComponentId, scheduler: Rc<dyn RepaintScheduler>) -> Self {
        Self {
            inner: Rc::new(ComponentInner {
                id,
                bounds: Cell::new(Rect::default()),
                enabled: Cell::new(true),
                focused: Cell::new(false),
                visible: Cell::new(true),
                scheduler,
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    pub fn bounds(&self) -> Rect {
        self.inner.bounds.get()
    }

    pub fn width(&self) -> f32 {
        self.bounds().w
    }

    pub fn height(&self) -> f32 {
        self.bounds().h
    }

    pub fn set_bounds(&self, bounds: Rect) {
        let old = self.inner.bounds.replace(bounds);
        if old.size() != bounds.size() {
            self.notify(FlagChange::Resized(bounds.size()));
        }
        if old != bounds {
            self.repaint();
        }
    }

    pub fn set_location(&self, x: f32, y: f32) {
        let b = self.bounds();
        self.set_bounds(Rect::new(x, y, b.w, b.h));
    }

    pub fn set_size(&self, size: Size) {
        let b = self.bounds();
        self.set_bounds(Rect::new(b.x, b.y, size.width, size.height));
    }

    pub fn enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    pub fn focused(&self) -> bool {
        self.inner.focused.get()
    }

    pub fn visible(&self) -> bool {
        self.inner.visible.get()
    }

    pub fn set_enabled(&self, v: bool) {
        if self.inner.enabled.replace(v) != v {
            self.notify(FlagChange::Enabled(v));
            self.repaint();
        }
    }

    pub fn set_focused(&self, v: bool) {
        if self.inner.focused.replace(v) != v {
            self.notify(FlagChange::Focused(v));
            self.repaint();
        }
    }

    pub fn set_visible(&self, v: bool) {
        if self.inner.visible.replace(v) != v {
            self.notify(FlagChange::Visible(v));
            self.repaint();
        }
    }

    pub fn on_flag_change(&self, f: impl Fn(FlagChange) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(f));
    }

    fn notify(&self, change: FlagChange) {
        let snapshot: Vec<_> = self.inner.listeners.borrow().clone();
        for l in snapshot {
            l(change);
        }
    }

    pub fn repaint(&self) {
        self.inner.scheduler.repaint(self.inner.id, None);
    }

    /// `region` is in the component's local coordinate space.
    pub fn repaint_region(&self, region: Rect) {
        self.inner.scheduler.repaint(self.inner.id, Some(region));
    }

    pub fn invalidate(&self) {
        self.inner.scheduler.relayout(self.inner.id);
        self.inner.scheduler.repaint(self.inner.id, None);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchedulerRequest {
    Repaint(ComponentId, Option<Rect>),
    Relayout(ComponentId),
}

/// Scheduler double that records every request, for tests.
#[derive(Default)]
pub struct RecordingScheduler {
    pub requests: RefCell<Vec<SchedulerRequest>>,
}

impl RecordingScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn take(&self) -> Vec<SchedulerRequest> {
        self.requests.take()
    }

    pub fn repaint_count(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| matches!(r, SchedulerRequest::Repaint(..)))
            .count()
    }

    pub fn relayout_count(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| matches!(r, SchedulerRequest::Relayout(..)))
            .count()
    }
}

impl RepaintScheduler for RecordingScheduler {
    fn repaint(&self, component: ComponentId, region: Option<Rect>) {
        self.requests
            .borrow_mut()
            .push(SchedulerRequest::Repaint(component, region));
    }

    fn relayout(&self, component: ComponentId) {
        self.requests
            .borrow_mut()
            .push(SchedulerRequest::Relayout(component));
    }
}
