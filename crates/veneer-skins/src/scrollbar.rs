//! Scrollbar skin.
//!
//! Three interaction surfaces: the arrow buttons (unit scroll with
//! auto-repeat), the track (block scroll toward the press point, with the
//! stop value fixed at press time), and the handle (capture drag through
//! the display hub, so the pointer may leave the bar mid-drag). When the
//! proportional handle cannot fit the track it is hidden and the track goes
//! inert until the range shrinks again.

use std::cell::Cell;
use std::rc::Rc;

use veneer_core::{
    Affects, Canvas, Color, ColorRole, Component, DragHandle, GrabControl, Measure, PointerEvent,
    PointerPhase, Rect, RepeatControl, RepeatHandle, StyleDefault, StyleKey, StyleStore, Vec2,
    start_auto_repeat,
};

use crate::track::{BlockScroll, ScrollRange, Track};
use crate::{Skin, SkinCtx, bind_component, require_installed};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBarPart {
    DecArrow,
    IncArrow,
    Track,
    Handle,
}

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::scalar("breadth", Affects::Layout, 16.0),
    StyleKey::scalar("min_handle", Affects::Paint, 16.0),
    StyleKey::color(
        "track_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ScrollTrack),
    ),
    StyleKey::color(
        "handle_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ScrollHandle),
    ),
    StyleKey::color(
        "handle_hover_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ScrollHandleHover),
    ),
    StyleKey::color(
        "handle_pressed_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ScrollHandlePressed),
    ),
    StyleKey::color(
        "button_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ButtonBg),
    ),
    StyleKey::color(
        "button_hover_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ButtonBgHover),
    ),
    StyleKey::color(
        "button_pressed_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ButtonBgPressed),
    ),
    StyleKey::color(
        "arrow_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
    StyleKey::color(
        "border_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Outline),
    ),
];

/// Everything a timer tick or drag listener needs to move the value without
/// borrowing the skin.
#[derive(Clone)]
struct ValueDriver {
    value: Rc<Cell<i32>>,
    range: ScrollRange,
    on_value: Option<Rc<dyn Fn(i32)>>,
    component: Component,
}

impl ValueDriver {
    fn apply(&self, v: i32) -> bool {
        let clamped = self.range.clamp(v);
        if clamped == self.value.get() {
            return false;
        }
        self.value.set(clamped);
        if let Some(cb) = &self.on_value {
            cb(clamped);
        }
        self.component.repaint();
        true
    }
}

pub struct ScrollBarSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    orientation: Orientation,
    range: ScrollRange,
    value: Rc<Cell<i32>>,
    unit_increment: i32,
    block_increment: i32,
    on_value: Option<Rc<dyn Fn(i32)>>,
    hover: Option<ScrollBarPart>,
    pressed: Rc<Cell<Option<ScrollBarPart>>>,
    repeat: Option<RepeatHandle>,
    drag: Option<DragHandle>,
}

impl ScrollBarSkin {
    pub fn new(ctx: &SkinCtx, orientation: Orientation) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            orientation,
            range: ScrollRange::new(0, 100, 10),
            value: Rc::new(Cell::new(0)),
            unit_increment: 1,
            block_increment: 10,
            on_value: None,
            hover: None,
            pressed: Rc::new(Cell::new(None)),
            repeat: None,
            drag: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn range(&self) -> ScrollRange {
        self.range
    }

    pub fn value(&self) -> i32 {
        self.value.get()
    }

    /// Programmatic value change: clamps and repaints, does not re-fire the
    /// change callback.
    pub fn set_value(&mut self, v: i32) {
        let clamped = self.range.clamp(v);
        if self.value.replace(clamped) != clamped
            && let Some(c) = &self.component
        {
            c.repaint();
        }
    }

    pub fn set_range(&mut self, range: ScrollRange) {
        self.range = range;
        self.value.set(range.clamp(self.value.get()));
        if let Some(c) = &self.component {
            c.repaint();
        }
    }

    pub fn set_increments(&mut self, unit: i32, block: i32) {
        assert!(unit > 0 && block > 0, "scroll increments must be positive");
        self.unit_increment = unit;
        self.block_increment = block;
    }

    pub fn on_value(&mut self, cb: impl Fn(i32) + 'static) {
        self.on_value = Some(Rc::new(cb));
    }

    fn driver(&self) -> ValueDriver {
        ValueDriver {
            value: self.value.clone(),
            range: self.range,
            on_value: self.on_value.clone(),
            component: require_installed(&self.component, "scrollbar").clone(),
        }
    }

    fn breadth(&self) -> f32 {
        self.styles.scalar("breadth")
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_size(require_installed(&self.component, "scrollbar").bounds().size())
    }

    fn along(&self, p: Vec2) -> f32 {
        match self.orientation {
            Orientation::Vertical => p.y,
            Orientation::Horizontal => p.x,
        }
    }

    fn axis_len(&self, b: Rect) -> f32 {
        match self.orientation {
            Orientation::Vertical => b.h,
            Orientation::Horizontal => b.w,
        }
    }

    /// Rect spanning `from..from+len` on the scroll axis, full breadth on
    /// the other.
    fn span_rect(&self, b: Rect, from: f32, len: f32) -> Rect {
        match self.orientation {
            Orientation::Vertical => Rect::new(b.x, b.y + from, b.w, len),
            Orientation::Horizontal => Rect::new(b.x + from, b.y, len, b.h),
        }
    }

    fn track_metrics(&self) -> Track {
        let b = self.local_bounds();
        let arrow = self.breadth();
        Track {
            origin: arrow,
            length: (self.axis_len(b) - 2.0 * arrow).max(0.0),
            min_handle: self.styles.scalar("min_handle"),
        }
    }

    fn dec_arrow_rect(&self) -> Rect {
        self.span_rect(self.local_bounds(), 0.0, self.breadth())
    }

    fn inc_arrow_rect(&self) -> Rect {
        let b = self.local_bounds();
        let arrow = self.breadth();
        self.span_rect(b, self.axis_len(b) - arrow, arrow)
    }

    fn handle_rect(&self) -> Option<Rect> {
        let track = self.track_metrics();
        let len = track.handle_length(self.range)?;
        let leading = track.pixel_for_value(self.range, self.value.get())?;
        Some(self.span_rect(self.local_bounds(), leading, len))
    }

    fn part_at(&self, p: Vec2) -> Option<ScrollBarPart> {
        let b = self.local_bounds();
        if !b.contains(p) {
            return None;
        }
        if self.dec_arrow_rect().contains(p) {
            return Some(ScrollBarPart::DecArrow);
        }
        if self.inc_arrow_rect().contains(p) {
            return Some(ScrollBarPart::IncArrow);
        }
        if self.handle_rect().is_some_and(|r| r.contains(p)) {
            return Some(ScrollBarPart::Handle);
        }
        Some(ScrollBarPart::Track)
    }

    fn start_unit_repeat(&mut self, direction: i32) {
        let d = self.driver();
        let step = self.unit_increment * direction;
        self.repeat = Some(start_auto_repeat(&self.ctx.hub, &self.ctx.timers, move || {
            if d.apply(d.value.get() + step) {
                RepeatControl::Continue
            } else {
                RepeatControl::Stop
            }
        }));
    }

    fn block_step(d: &ValueDriver, block: BlockScroll, increment: i32) -> RepeatControl {
        let cur = d.value.get();
        let next = if block.direction < 0 {
            (cur - increment).max(block.stop)
        } else {
            (cur + increment).min(block.stop)
        };
        if next == cur || !d.apply(next) {
            return RepeatControl::Stop;
        }
        if next == block.stop {
            RepeatControl::Stop
        } else {
            RepeatControl::Continue
        }
    }

    fn press_track(&mut self, at: Vec2) {
        let track = self.track_metrics();
        let Some(block) = track.block_target(self.range, self.value.get(), self.along(at)) else {
            return;
        };
        let d = self.driver();
        let increment = self.block_increment;
        if Self::block_step(&d, block, increment) == RepeatControl::Continue {
            self.repeat = Some(start_auto_repeat(&self.ctx.hub, &self.ctx.timers, move || {
                Self::block_step(&d, block, increment)
            }));
        }
    }

    fn press_handle(&mut self, at: Vec2) {
        let track = self.track_metrics();
        let range = self.range;
        let Some(leading) = track.pixel_for_value(range, self.value.get()) else {
            return;
        };
        let grab_offset = self.along(at) - leading;
        let d = self.driver();
        let orientation = self.orientation;
        let pressed = self.pressed.clone();
        self.drag = None; // drop any stale handle before starting a new session
        self.drag = Some(self.ctx.hub.begin_drag(move |ev| {
            match ev.phase {
                PointerPhase::Move => {
                    // capture events arrive in display space
                    let origin = d.component.bounds().origin();
                    let local = Vec2::new(ev.position.x - origin.x, ev.position.y - origin.y);
                    let p = match orientation {
                        Orientation::Vertical => local.y,
                        Orientation::Horizontal => local.x,
                    };
                    if let Some(v) = track.value_for_pixel(range, p - grab_offset) {
                        d.apply(v);
                    }
                    GrabControl::Keep
                }
                PointerPhase::Up(_) => {
                    pressed.set(None);
                    d.component.repaint();
                    GrabControl::Release
                }
                _ => GrabControl::Keep,
            }
        }));
    }

    fn stop_repeat(&mut self) {
        self.repeat = None; // RAII: dropping cancels timers and frees the slot
    }

    fn set_hover(&mut self, part: Option<ScrollBarPart>) {
        if self.hover != part {
            self.hover = part;
            if let Some(c) = &self.component {
                c.repaint();
            }
        }
    }

    fn arrow_points(&self, rect: Rect, toward_start: bool) -> (Vec2, Vec2, Vec2) {
        let inset_x = rect.w * 0.3;
        let inset_y = rect.h * 0.3;
        let (l, r, t, b) = (
            rect.x + inset_x,
            rect.right() - inset_x,
            rect.y + inset_y,
            rect.bottom() - inset_y,
        );
        let cx = rect.x + rect.w / 2.0;
        let cy = rect.y + rect.h / 2.0;
        match (self.orientation, toward_start) {
            (Orientation::Vertical, true) => (Vec2::new(cx, t), Vec2::new(l, b), Vec2::new(r, b)),
            (Orientation::Vertical, false) => (Vec2::new(cx, b), Vec2::new(l, t), Vec2::new(r, t)),
            (Orientation::Horizontal, true) => (Vec2::new(l, cy), Vec2::new(r, t), Vec2::new(r, b)),
            (Orientation::Horizontal, false) => (Vec2::new(r, cy), Vec2::new(l, t), Vec2::new(l, b)),
        }
    }

    fn paint_arrow(&self, canvas: &mut Canvas, rect: Rect, part: ScrollBarPart) {
        let bg = if self.pressed.get() == Some(part) {
            self.styles.color("button_pressed_color")
        } else if self.hover == Some(part) {
            self.styles.color("button_hover_color")
        } else {
            self.styles.color("button_color")
        };
        canvas.fill_rect(rect, bg);
        canvas.stroke_rect(rect, self.styles.color("border_color"), 1.0);
        let (a, b, c) = self.arrow_points(rect, part == ScrollBarPart::DecArrow);
        canvas.fill_triangle(a, b, c, self.styles.color("arrow_color"));
    }

    fn handle_color(&self) -> Color {
        if self.pressed.get() == Some(ScrollBarPart::Handle) {
            self.styles.color("handle_pressed_color")
        } else if self.hover == Some(ScrollBarPart::Handle) {
            self.styles.color("handle_hover_color")
        } else {
            self.styles.color("handle_color")
        }
    }
}

impl Measure for ScrollBarSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "scrollbar");
        let _ = given_height;
        match self.orientation {
            Orientation::Vertical => self.breadth(),
            // two arrows plus room for the smallest handle
            Orientation::Horizontal => {
                2.0 * self.breadth() + self.styles.scalar("min_handle") + 2.0
            }
        }
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "scrollbar");
        let _ = given_width;
        match self.orientation {
            Orientation::Vertical => 2.0 * self.breadth() + self.styles.scalar("min_handle") + 2.0,
            Orientation::Horizontal => self.breadth(),
        }
    }
}

impl Skin for ScrollBarSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "scrollbar");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        self.stop_repeat();
        self.drag = None;
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("scrollbar skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "scrollbar")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = self.local_bounds();
        canvas.fill_rect(b, self.styles.color("track_color"));
        self.paint_arrow(canvas, self.dec_arrow_rect(), ScrollBarPart::DecArrow);
        self.paint_arrow(canvas, self.inc_arrow_rect(), ScrollBarPart::IncArrow);
        if let Some(handle) = self.handle_rect() {
            canvas.fill_rect(handle, self.handle_color());
        }
        canvas.stroke_rect(b, self.styles.color("border_color"), 1.0);
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !require_installed(&self.component, "scrollbar").enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                self.set_hover(self.part_at(ev.position));
            }
            PointerPhase::Down(veneer_core::PointerButton::Primary) => {
                let Some(part) = self.part_at(ev.position) else {
                    return;
                };
                self.pressed.set(Some(part));
                self.component().repaint();
                match part {
                    ScrollBarPart::DecArrow => {
                        self.driver().apply(self.value.get() - self.unit_increment);
                        self.start_unit_repeat(-1);
                    }
                    ScrollBarPart::IncArrow => {
                        self.driver().apply(self.value.get() + self.unit_increment);
                        self.start_unit_repeat(1);
                    }
                    ScrollBarPart::Track => self.press_track(ev.position),
                    ScrollBarPart::Handle => self.press_handle(ev.position),
                }
            }
            PointerPhase::Up(veneer_core::PointerButton::Primary) => {
                self.stop_repeat();
                if self.pressed.replace(None).is_some() {
                    self.component().repaint();
                }
            }
            PointerPhase::Leave => {
                // non-capturing sessions (arrows, block scroll) end here;
                // a handle drag keeps its display grab
                self.stop_repeat();
                self.pressed.set(None);
                self.set_hover(None);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use veneer_core::{PointerButton, StyleValue};
    use web_time::Duration;

    fn skin(fx: &Fixture) -> ScrollBarSkin {
        let mut s = ScrollBarSkin::new(&fx.ctx, Orientation::Vertical);
        // 16px arrows + 200px track
        s.install(fx.component(Rect::new(100.0, 50.0, 16.0, 232.0)));
        s
    }

    fn press(s: &mut ScrollBarSkin, at: Vec2) {
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            at,
        ));
    }

    fn release(s: &mut ScrollBarSkin, at: Vec2) {
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            at,
        ));
    }

    #[test]
    fn arrow_press_steps_and_repeats_until_bound() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_range(ScrollRange::new(0, 20, 10));
        s.set_value(8);

        press(&mut s, Vec2::new(8.0, 228.0)); // inc arrow
        assert_eq!(s.value(), 9);

        fx.clock.advance(Duration::from_millis(400));
        fx.ctx.timers.fire_due();
        assert_eq!(s.value(), 10); // range max: 20 - 10

        // further ticks stop changing the value and free the repeat slot
        fx.clock.advance(Duration::from_millis(30));
        fx.ctx.timers.fire_due();
        assert_eq!(s.value(), 10);
        assert!(!fx.ctx.hub.repeat_active());
        release(&mut s, Vec2::new(8.0, 228.0));
    }

    #[test]
    fn block_scroll_terminates_at_press_time_stop_value() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_range(ScrollRange::new(0, 100, 10));
        s.set_increments(1, 5);

        let start = s.value();
        let press_at = Vec2::new(8.0, 200.0); // well below the handle
        press(&mut s, press_at);
        let first = s.value();
        assert!(first > start);

        fx.clock.advance(Duration::from_millis(400));
        fx.ctx.timers.fire_due();
        let mut ticks = 1usize;
        let mut last = s.value();
        loop {
            fx.clock.advance(Duration::from_millis(30));
            fx.ctx.timers.fire_due();
            if s.value() == last {
                break;
            }
            last = s.value();
            ticks += 1;
            assert!(ticks < 100, "block scroll failed to terminate");
        }
        // bounded by ceil(|start - stop| / block)
        let stop = s.value();
        let bound = ((stop - start).unsigned_abs() as usize).div_ceil(5);
        assert!(ticks <= bound, "took {ticks} ticks for bound {bound}");
        assert!(!fx.ctx.hub.repeat_active());
        release(&mut s, press_at);
    }

    #[test]
    fn handle_drag_tracks_pointer_through_display_space() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_range(ScrollRange::new(0, 100, 10));
        let seen = Rc::new(Cell::new(-1));
        let seen2 = seen.clone();
        s.on_value(move |v| seen2.set(v));

        // handle sits at the track top (value 0); grab its middle
        let handle = s.handle_rect().unwrap();
        let grab_local = Vec2::new(8.0, handle.y + handle.h / 2.0);
        press(&mut s, grab_local);
        assert!(fx.ctx.hub.drag_active());

        // drag 60px down, in display coordinates (component origin 100,50)
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(300.0, 50.0 + grab_local.y + 60.0),
        ));
        let dragged = s.value();
        assert!(dragged > 0, "value should follow the handle");
        assert_eq!(seen.get(), dragged);

        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(300.0, 400.0),
        ));
        assert!(!fx.ctx.hub.drag_active());
    }

    #[test]
    fn hidden_handle_disables_track_interaction() {
        let fx = Fixture::new();
        let mut s = ScrollBarSkin::new(&fx.ctx, Orientation::Vertical);
        // 8px of track, 16px minimum handle: the handle cannot fit
        s.install(fx.component(Rect::new(0.0, 0.0, 16.0, 40.0)));
        s.set_range(ScrollRange::new(0, 100, 10));
        assert_eq!(s.handle_rect(), None);
        press(&mut s, Vec2::new(8.0, 20.0));
        assert_eq!(s.value(), 0);
        assert!(!fx.ctx.hub.repeat_active());
        assert!(!fx.ctx.hub.drag_active());
    }

    #[test]
    fn geometry_is_consistent_across_random_styles() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let breadth = rng.random_range(8.0..40.0_f32).round();
            s.styles_mut()
                .put("breadth", StyleValue::Scalar(breadth))
                .unwrap();
            let size = s.preferred_size();
            assert_eq!(size.width, s.preferred_width(None));
            assert_eq!(size.height, s.preferred_height(None));
            let h = s.preferred_height(None);
            assert_eq!(s.preferred_width(Some(h)), s.preferred_width(None));
        }
    }

    #[test]
    #[should_panic(expected = "scrollbar skin is not installed")]
    fn geometry_before_install_is_fatal() {
        let fx = Fixture::new();
        let s = ScrollBarSkin::new(&fx.ctx, Orientation::Vertical);
        s.preferred_size();
    }

    #[test]
    fn programmatic_set_value_clamps() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_range(ScrollRange::new(0, 100, 10));
        s.set_value(500);
        assert_eq!(s.value(), 90);
        s.set_value(-5);
        assert_eq!(s.value(), 0);
    }
}
