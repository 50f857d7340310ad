//! Window frame skin: title bar with close/maximize/minimize buttons,
//! beveled border with resize hot-zones on every edge and corner, and the
//! content placement inside the chrome.
//!
//! Moving (title-bar drag) and resizing (edge drag) run as capture drags on
//! the display hub; the pointer routinely leaves the frame mid-drag.
//! Button actions fire on release over the same button, never on press.

use std::cell::Cell;
use std::rc::Rc;

use veneer_core::{
    Affects, Canvas, ColorRole, Component, DragHandle, FontRole, GrabControl, LinearGradient,
    Measure, PointerButton, PointerEvent, PointerPhase, Rect, Size, StyleDefault, StyleKey,
    StyleStore, Vec2,
};

use crate::{Skin, SkinCtx, bind_component, require_installed};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePart {
    TitleBar,
    CloseButton,
    MaximizeButton,
    MinimizeButton,
    Edge(ResizeEdge),
}

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::scalar("border_width", Affects::Layout, 4.0),
    StyleKey::scalar("title_padding", Affects::Layout, 4.0),
    StyleKey::scalar("button_size", Affects::Layout, 14.0),
    StyleKey::font("title_font", Affects::Layout, FontRole::Title),
    StyleKey::color(
        "title_active_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::TitleActive),
    ),
    StyleKey::color(
        "title_active_fade_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::TitleActiveFade),
    ),
    StyleKey::color(
        "title_inactive_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::TitleInactive),
    ),
    StyleKey::color(
        "title_text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::TitleText),
    ),
    StyleKey::color(
        "border_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Outline),
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
        "glyph_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::TitleText),
    ),
];

pub struct FrameSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    title: String,
    resizable: bool,
    min_size: Size,
    on_close: Option<Rc<dyn Fn()>>,
    on_maximize: Option<Rc<dyn Fn()>>,
    on_minimize: Option<Rc<dyn Fn()>>,
    hover: Option<FramePart>,
    pressed: Rc<Cell<Option<FramePart>>>,
    drag: Option<DragHandle>,
}

impl FrameSkin {
    pub fn new(ctx: &SkinCtx, title: impl Into<String>) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            title: title.into(),
            resizable: true,
            min_size: Size::new(120.0, 60.0),
            on_close: None,
            on_maximize: None,
            on_minimize: None,
            hover: None,
            pressed: Rc::new(Cell::new(None)),
            drag: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if let Some(c) = &self.component {
            c.repaint();
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.resizable = resizable;
    }

    pub fn set_min_size(&mut self, min: Size) {
        self.min_size = min;
    }

    pub fn on_close(&mut self, cb: impl Fn() + 'static) {
        self.on_close = Some(Rc::new(cb));
    }

    pub fn on_maximize(&mut self, cb: impl Fn() + 'static) {
        self.on_maximize = Some(Rc::new(cb));
    }

    pub fn on_minimize(&mut self, cb: impl Fn() + 'static) {
        self.on_minimize = Some(Rc::new(cb));
    }

    fn border(&self) -> f32 {
        self.styles.scalar("border_width")
    }

    fn title_height(&self) -> f32 {
        let font = self.styles.font("title_font");
        self.ctx.ruler.line_height(&font) + 2.0 * self.styles.scalar("title_padding")
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_size(require_installed(&self.component, "frame").bounds().size())
    }

    fn title_bar_rect(&self) -> Rect {
        let b = self.local_bounds();
        let border = self.border();
        Rect::new(
            border,
            border,
            (b.w - 2.0 * border).max(0.0),
            self.title_height(),
        )
    }

    /// Where the hosted content goes, in frame-local coordinates.
    pub fn content_bounds(&self) -> Rect {
        let b = self.local_bounds();
        let border = self.border();
        let top = border + self.title_height();
        Rect::new(
            border,
            top,
            (b.w - 2.0 * border).max(0.0),
            (b.h - top - border).max(0.0),
        )
    }

    /// Buttons right-to-left: close, maximize, minimize.
    fn button_rect(&self, part: FramePart) -> Rect {
        let title = self.title_bar_rect();
        let size = self.styles.scalar("button_size");
        let gap = 2.0;
        let y = title.y + (title.h - size) / 2.0;
        let slot = match part {
            FramePart::CloseButton => 0.0,
            FramePart::MaximizeButton => 1.0,
            FramePart::MinimizeButton => 2.0,
            _ => panic!("not a frame button: {part:?}"),
        };
        Rect::new(
            title.right() - gap - size - slot * (size + gap),
            y,
            size,
            size,
        )
    }

    fn edge_at(&self, p: Vec2) -> Option<ResizeEdge> {
        if !self.resizable {
            return None;
        }
        let b = self.local_bounds();
        let grip = self.border().max(4.0);
        let corner = 3.0 * grip;
        let west = p.x <= b.x + grip;
        let east = p.x >= b.right() - grip;
        let north = p.y <= b.y + grip;
        let south = p.y >= b.bottom() - grip;
        if !(west || east || north || south) {
            return None;
        }
        // widen corners so diagonals are reachable at thin borders
        let near_left = p.x <= b.x + corner;
        let near_right = p.x >= b.right() - corner;
        let near_top = p.y <= b.y + corner;
        let near_bottom = p.y >= b.bottom() - corner;
        Some(match (north, south, west, east) {
            (true, _, _, _) if near_left => ResizeEdge::NorthWest,
            (true, _, _, _) if near_right => ResizeEdge::NorthEast,
            (true, _, _, _) => ResizeEdge::North,
            (_, true, _, _) if near_left => ResizeEdge::SouthWest,
            (_, true, _, _) if near_right => ResizeEdge::SouthEast,
            (_, true, _, _) => ResizeEdge::South,
            (_, _, true, _) if near_top => ResizeEdge::NorthWest,
            (_, _, true, _) if near_bottom => ResizeEdge::SouthWest,
            (_, _, true, _) => ResizeEdge::West,
            (_, _, _, true) if near_top => ResizeEdge::NorthEast,
            (_, _, _, true) if near_bottom => ResizeEdge::SouthEast,
            _ => ResizeEdge::East,
        })
    }

    pub fn part_at(&self, p: Vec2) -> Option<FramePart> {
        if !self.local_bounds().contains(p) {
            return None;
        }
        if let Some(edge) = self.edge_at(p) {
            return Some(FramePart::Edge(edge));
        }
        for part in [
            FramePart::CloseButton,
            FramePart::MaximizeButton,
            FramePart::MinimizeButton,
        ] {
            if self.button_rect(part).contains(p) {
                return Some(part);
            }
        }
        if self.title_bar_rect().contains(p) {
            return Some(FramePart::TitleBar);
        }
        None
    }

    fn begin_move(&mut self, press_local: Vec2) {
        let component = self.component().clone();
        let bounds0 = component.bounds();
        let press_display = Vec2::new(press_local.x + bounds0.x, press_local.y + bounds0.y);
        let pressed = self.pressed.clone();
        self.drag = None;
        self.drag = Some(self.ctx.hub.begin_drag(move |ev| match ev.phase {
            PointerPhase::Move => {
                component.set_location(
                    bounds0.x + ev.position.x - press_display.x,
                    bounds0.y + ev.position.y - press_display.y,
                );
                GrabControl::Keep
            }
            PointerPhase::Up(_) => {
                pressed.set(None);
                component.repaint();
                GrabControl::Release
            }
            _ => GrabControl::Keep,
        }));
    }

    fn begin_resize(&mut self, edge: ResizeEdge) {
        let component = self.component().clone();
        let bounds0 = component.bounds();
        let min = self.min_size;
        let pressed = self.pressed.clone();
        self.drag = None;
        self.drag = Some(self.ctx.hub.begin_drag(move |ev| match ev.phase {
            PointerPhase::Move => {
                component.set_bounds(resized(bounds0, edge, ev.position, min));
                GrabControl::Keep
            }
            PointerPhase::Up(_) => {
                pressed.set(None);
                component.repaint();
                GrabControl::Release
            }
            _ => GrabControl::Keep,
        }));
    }

    fn fire(&self, part: FramePart) {
        let cb = match part {
            FramePart::CloseButton => &self.on_close,
            FramePart::MaximizeButton => &self.on_maximize,
            FramePart::MinimizeButton => &self.on_minimize,
            _ => return,
        };
        if let Some(cb) = cb {
            cb();
        }
    }

    fn paint_button(&self, canvas: &mut Canvas, part: FramePart) {
        let rect = self.button_rect(part);
        let bg = if self.pressed.get() == Some(part) {
            self.styles.color("button_pressed_color")
        } else if self.hover == Some(part) {
            self.styles.color("button_hover_color")
        } else {
            self.styles.color("button_color")
        };
        canvas.fill_rect(rect, bg);
        canvas.stroke_rect(rect, self.styles.color("border_color"), 1.0);

        let glyph = self.styles.color("glyph_color");
        let pad = rect.w * 0.28;
        let (l, r, t, b) = (
            rect.x + pad,
            rect.right() - pad,
            rect.y + pad,
            rect.bottom() - pad,
        );
        match part {
            FramePart::CloseButton => {
                canvas.line(Vec2::new(l, t), Vec2::new(r, b), glyph, 1.0);
                canvas.line(Vec2::new(l, b), Vec2::new(r, t), glyph, 1.0);
            }
            FramePart::MaximizeButton => {
                canvas.stroke_rect(Rect::new(l, t, r - l, b - t), glyph, 1.0);
            }
            FramePart::MinimizeButton => {
                canvas.line(Vec2::new(l, b), Vec2::new(r, b), glyph, 1.0);
            }
            _ => {}
        }
    }
}

fn resized(bounds0: Rect, edge: ResizeEdge, pointer: Vec2, min: Size) -> Rect {
    use ResizeEdge::*;
    let mut r = bounds0;
    let grows_east = matches!(edge, East | NorthEast | SouthEast);
    let grows_west = matches!(edge, West | NorthWest | SouthWest);
    let grows_south = matches!(edge, South | SouthEast | SouthWest);
    let grows_north = matches!(edge, North | NorthEast | NorthWest);

    if grows_east {
        r.w = (pointer.x - r.x).max(min.width);
    }
    if grows_west {
        let right = bounds0.right();
        r.x = pointer.x.min(right - min.width);
        r.w = right - r.x;
    }
    if grows_south {
        r.h = (pointer.y - r.y).max(min.height);
    }
    if grows_north {
        let bottom = bounds0.bottom();
        r.y = pointer.y.min(bottom - min.height);
        r.h = bottom - r.y;
    }
    r
}

impl Measure for FrameSkin {
    // The frame measures its own chrome; the host adds the content size.

    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "frame");
        let _ = given_height;
        let font = self.styles.font("title_font");
        let text = self.ctx.ruler.advance(&self.title, &font);
        let buttons = 3.0 * (self.styles.scalar("button_size") + 2.0) + 2.0;
        2.0 * self.border() + text + buttons + 2.0 * self.styles.scalar("title_padding")
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "frame");
        let _ = given_width;
        2.0 * self.border() + self.title_height()
    }
}

impl Skin for FrameSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "frame");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        self.drag = None;
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("frame skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "frame")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = self.local_bounds();
        let border_color = self.styles.color("border_color");
        canvas.fill_rect(b, self.styles.color("title_inactive_color"));
        canvas.stroke_rect(b, border_color, self.border());

        let title = self.title_bar_rect();
        let focused = self.component().focused();
        if focused {
            canvas.fill_rect(
                title,
                LinearGradient::vertical(
                    self.styles.color("title_active_color"),
                    self.styles.color("title_active_fade_color"),
                ),
            );
        } else {
            canvas.fill_rect(title, self.styles.color("title_inactive_color"));
        }

        let font = self.styles.font("title_font");
        let pad = self.styles.scalar("title_padding");
        canvas.push_clip(title);
        canvas.text(
            Vec2::new(title.x + pad, title.y + pad),
            self.title.clone(),
            &font,
            self.styles.color("title_text_color"),
        );
        canvas.pop_clip();

        for part in [
            FramePart::CloseButton,
            FramePart::MaximizeButton,
            FramePart::MinimizeButton,
        ] {
            self.paint_button(canvas, part);
        }
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                let part = self.part_at(ev.position);
                if self.hover != part {
                    self.hover = part;
                    self.component().repaint();
                }
            }
            PointerPhase::Down(PointerButton::Primary) => {
                let Some(part) = self.part_at(ev.position) else {
                    return;
                };
                self.pressed.set(Some(part));
                self.component().repaint();
                match part {
                    FramePart::TitleBar => self.begin_move(ev.position),
                    FramePart::Edge(edge) => self.begin_resize(edge),
                    _ => {} // buttons act on release
                }
            }
            PointerPhase::Up(PointerButton::Primary) => {
                if let Some(part) = self.pressed.replace(None) {
                    self.component().repaint();
                    // fire only when released over the same button
                    if self.part_at(ev.position) == Some(part) {
                        self.fire(part);
                    }
                }
            }
            PointerPhase::Leave => {
                self.hover = None;
                self.pressed.set(None);
                self.component().repaint();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;

    fn skin(fx: &Fixture) -> FrameSkin {
        let mut s = FrameSkin::new(&fx.ctx, "Console");
        s.install(fx.component(Rect::new(200.0, 100.0, 400.0, 300.0)));
        s
    }

    fn down(s: &mut FrameSkin, at: Vec2) {
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            at,
        ));
    }

    fn up(s: &mut FrameSkin, at: Vec2) {
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            at,
        ));
    }

    #[test]
    fn parts_classify_chrome_regions() {
        let fx = Fixture::new();
        let s = skin(&fx);
        assert_eq!(s.part_at(Vec2::new(1.0, 150.0)), Some(FramePart::Edge(ResizeEdge::West)));
        assert_eq!(
            s.part_at(Vec2::new(399.0, 299.0)),
            Some(FramePart::Edge(ResizeEdge::SouthEast))
        );
        assert_eq!(s.part_at(Vec2::new(150.0, 12.0)), Some(FramePart::TitleBar));
        let close = s.button_rect(FramePart::CloseButton);
        assert_eq!(
            s.part_at(Vec2::new(close.x + 2.0, close.y + 2.0)),
            Some(FramePart::CloseButton)
        );
        // inside the content area: not the frame's business
        assert_eq!(s.part_at(Vec2::new(200.0, 150.0)), None);
    }

    #[test]
    fn title_drag_moves_the_frame() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        down(&mut s, Vec2::new(150.0, 12.0));
        assert!(fx.ctx.hub.drag_active());

        // 30 right, 20 down in display space (press was at 350, 112)
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(380.0, 132.0),
        ));
        let b = s.component().bounds();
        assert_eq!((b.x, b.y), (230.0, 120.0));
        assert_eq!((b.w, b.h), (400.0, 300.0));

        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(380.0, 132.0),
        ));
        assert!(!fx.ctx.hub.drag_active());
    }

    #[test]
    fn edge_drag_resizes_with_minimum() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_min_size(Size::new(120.0, 60.0));
        down(&mut s, Vec2::new(399.0, 299.0)); // south-east corner

        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(700.0, 500.0),
        ));
        let b = s.component().bounds();
        assert_eq!((b.w, b.h), (500.0, 400.0));
        assert_eq!((b.x, b.y), (200.0, 100.0));

        // collapse far past the minimum: clamped
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(0.0, 0.0),
        ));
        let b = s.component().bounds();
        assert_eq!((b.w, b.h), (120.0, 60.0));

        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(0.0, 0.0),
        ));
    }

    #[test]
    fn west_resize_keeps_right_edge_fixed() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        down(&mut s, Vec2::new(1.0, 150.0));
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(150.0, 250.0),
        ));
        let b = s.component().bounds();
        assert_eq!(b.right(), 600.0);
        assert_eq!(b.x, 150.0);
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(150.0, 250.0),
        ));
    }

    #[test]
    fn close_fires_on_release_over_the_button_only() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        s.on_close(move || f.set(f.get() + 1));

        let close = s.button_rect(FramePart::CloseButton);
        let inside = Vec2::new(close.x + 3.0, close.y + 3.0);
        down(&mut s, inside);
        up(&mut s, inside);
        assert_eq!(fired.get(), 1);

        // press then slide off before release: no action
        down(&mut s, inside);
        up(&mut s, Vec2::new(150.0, 12.0));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn chrome_geometry_tracks_title_font_and_border() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let h0 = s.preferred_height(None);
        s.styles_mut()
            .put("border_width", veneer_core::StyleValue::Scalar(8.0))
            .unwrap();
        assert_eq!(s.preferred_height(None), h0 + 8.0);
        assert_eq!(s.preferred_size().height, s.preferred_height(None));

        let content = s.content_bounds();
        assert_eq!(content.x, 8.0);
        assert!(content.y > 8.0);
    }
}
