//! Tab pane skin: the tab strip across the top, the selected-tab indicator,
//! and the content placement below. When the tabs outgrow the strip, scroll
//! arrows appear at both ends and reuse the auto-repeat driver for
//! press-and-hold scrolling.

use std::cell::Cell;
use std::rc::Rc;

use veneer_core::{
    Affects, Canvas, ColorRole, Component, FontRole, Key, KeyEvent, Measure, PointerButton,
    PointerEvent, PointerPhase, Rect, RepeatControl, RepeatHandle, StyleDefault, StyleKey,
    StyleStore, Vec2, start_auto_repeat,
};

use crate::{Skin, SkinCtx, bind_component, require_installed};

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::scalar("tab_padding", Affects::Layout, 6.0),
    StyleKey::scalar("indicator_thickness", Affects::Layout, 2.0),
    StyleKey::font("tab_font", Affects::Layout, FontRole::Base),
    StyleKey::color(
        "strip_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::HeaderBg),
    ),
    StyleKey::color(
        "tab_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Surface),
    ),
    StyleKey::color(
        "tab_hover_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::HoverBg),
    ),
    StyleKey::color(
        "tab_selected_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::WindowBackground),
    ),
    StyleKey::color(
        "tab_text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
    StyleKey::color(
        "indicator_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Primary),
    ),
    StyleKey::color(
        "border_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Outline),
    ),
    StyleKey::color(
        "arrow_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
];

const OVERFLOW_SCROLL_STEP: f32 = 24.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StripHit {
    Tab(usize),
    LeftArrow,
    RightArrow,
}

pub struct TabPaneSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    tabs: Vec<String>,
    selected: usize,
    hover: Option<usize>,
    scroll: Rc<Cell<f32>>,
    on_select: Option<Rc<dyn Fn(usize)>>,
    repeat: Option<RepeatHandle>,
}

impl TabPaneSkin {
    pub fn new(ctx: &SkinCtx, tabs: Vec<String>) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            tabs,
            selected: 0,
            hover: None,
            scroll: Rc::new(Cell::new(0.0)),
            on_select: None,
            repeat: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn tabs(&self) -> &[String] {
        &self.tabs
    }

    pub fn set_tabs(&mut self, tabs: Vec<String>) {
        self.tabs = tabs;
        self.selected = self.selected.min(self.tabs.len().saturating_sub(1));
        self.scroll.set(0.0);
        if let Some(c) = &self.component {
            c.invalidate();
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn on_select(&mut self, cb: impl Fn(usize) + 'static) {
        self.on_select = Some(Rc::new(cb));
    }

    /// Selects a tab, scrolls it into view, and fires the callback.
    ///
    /// # Panics
    /// Panics when the index is out of range.
    pub fn select(&mut self, index: usize) {
        assert!(
            index < self.tabs.len(),
            "tab index {index} out of bounds ({} tabs)",
            self.tabs.len()
        );
        if self.selected != index {
            self.selected = index;
            self.scroll_tab_into_view(index);
            if let Some(cb) = &self.on_select {
                cb(index);
            }
            self.component().repaint();
        }
    }

    fn font_height(&self) -> f32 {
        let font = self.styles.font("tab_font");
        self.ctx.ruler.line_height(&font)
    }

    pub fn strip_height(&self) -> f32 {
        self.font_height()
            + 2.0 * self.styles.scalar("tab_padding")
            + self.styles.scalar("indicator_thickness")
    }

    fn tab_width(&self, index: usize) -> f32 {
        let font = self.styles.font("tab_font");
        let text = self.ctx.ruler.advance(&self.tabs[index], &font);
        (text + 2.0 * self.styles.scalar("tab_padding")).ceil()
    }

    fn tabs_total_width(&self) -> f32 {
        (0..self.tabs.len()).map(|i| self.tab_width(i)).sum()
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_size(require_installed(&self.component, "tab pane").bounds().size())
    }

    fn strip_rect(&self) -> Rect {
        let b = self.local_bounds();
        Rect::new(b.x, b.y, b.w, self.strip_height())
    }

    /// Where the selected tab's content goes.
    pub fn content_bounds(&self) -> Rect {
        let b = self.local_bounds();
        let top = self.strip_height();
        Rect::new(b.x, top, b.w, (b.h - top).max(0.0))
    }

    fn overflowing(&self) -> bool {
        self.tabs_total_width() > self.strip_rect().w
    }

    /// Visible run of the strip once overflow arrows take their slice.
    fn tab_viewport(&self) -> Rect {
        let strip = self.strip_rect();
        if !self.overflowing() {
            return strip;
        }
        let arrow = strip.h;
        Rect::new(
            strip.x + arrow,
            strip.y,
            (strip.w - 2.0 * arrow).max(0.0),
            strip.h,
        )
    }

    fn max_scroll(&self) -> f32 {
        (self.tabs_total_width() - self.tab_viewport().w).max(0.0)
    }

    fn tab_rect(&self, index: usize) -> Rect {
        let viewport = self.tab_viewport();
        let mut x = viewport.x - self.scroll.get();
        for i in 0..index {
            x += self.tab_width(i);
        }
        Rect::new(x, viewport.y, self.tab_width(index), viewport.h)
    }

    fn hit(&self, p: Vec2) -> Option<StripHit> {
        let strip = self.strip_rect();
        if !strip.contains(p) {
            return None;
        }
        if self.overflowing() {
            let arrow = strip.h;
            if p.x < strip.x + arrow {
                return Some(StripHit::LeftArrow);
            }
            if p.x > strip.right() - arrow {
                return Some(StripHit::RightArrow);
            }
        }
        (0..self.tabs.len())
            .find(|&i| self.tab_rect(i).contains(p))
            .map(StripHit::Tab)
    }

    fn scroll_tab_into_view(&self, index: usize) {
        let viewport = self.tab_viewport();
        let rect = self.tab_rect(index);
        let scroll = self.scroll.get();
        if rect.x < viewport.x {
            self.scroll.set((scroll - (viewport.x - rect.x)).max(0.0));
        } else if rect.right() > viewport.right() {
            let over = rect.right() - viewport.right();
            self.scroll.set((scroll + over).min(self.max_scroll()));
        }
    }

    fn scroll_step(&self, direction: f32) -> bool {
        let max = self.max_scroll();
        let before = self.scroll.get();
        let next = (before + direction * OVERFLOW_SCROLL_STEP).clamp(0.0, max);
        if next == before {
            return false;
        }
        self.scroll.set(next);
        self.component().repaint();
        true
    }

    fn start_scroll_repeat(&mut self, direction: f32) {
        let scroll = self.scroll.clone();
        let component = self.component().clone();
        let max = self.max_scroll();
        self.repeat = Some(start_auto_repeat(&self.ctx.hub, &self.ctx.timers, move || {
            let before = scroll.get();
            let next = (before + direction * OVERFLOW_SCROLL_STEP).clamp(0.0, max);
            if next == before {
                RepeatControl::Stop
            } else {
                scroll.set(next);
                component.repaint();
                RepeatControl::Continue
            }
        }));
    }
}

impl Measure for TabPaneSkin {
    // Chrome-only measurement; the host folds in the content's size.

    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "tab pane");
        let _ = given_height;
        self.tabs_total_width()
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "tab pane");
        let _ = given_width;
        self.strip_height()
    }
}

impl Skin for TabPaneSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "tab pane");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        self.repeat = None;
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("tab pane skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "tab pane")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let strip = self.strip_rect();
        let border = self.styles.color("border_color");
        canvas.fill_rect(strip, self.styles.color("strip_color"));

        let viewport = self.tab_viewport();
        let font = self.styles.font("tab_font");
        let pad = self.styles.scalar("tab_padding");
        let indicator = self.styles.scalar("indicator_thickness");

        canvas.push_clip(viewport);
        for i in 0..self.tabs.len() {
            let rect = self.tab_rect(i);
            if !rect.intersects(canvas.clip_bounds()) {
                continue;
            }
            let bg = if i == self.selected {
                self.styles.color("tab_selected_color")
            } else if self.hover == Some(i) {
                self.styles.color("tab_hover_color")
            } else {
                self.styles.color("tab_color")
            };
            canvas.fill_rect(rect, bg);
            canvas.text(
                Vec2::new(rect.x + pad, rect.y + pad),
                self.tabs[i].clone(),
                &font,
                self.styles.color("tab_text_color"),
            );
            if i == self.selected {
                canvas.fill_rect(
                    Rect::new(rect.x, rect.bottom() - indicator, rect.w, indicator),
                    self.styles.color("indicator_color"),
                );
            }
        }
        canvas.pop_clip();

        if self.overflowing() {
            let arrow_color = self.styles.color("arrow_color");
            let a = strip.h;
            let left = Rect::new(strip.x, strip.y, a, a);
            let right = Rect::new(strip.right() - a, strip.y, a, a);
            for (rect, toward_start) in [(left, true), (right, false)] {
                canvas.stroke_rect(rect, border, 1.0);
                let cy = rect.y + rect.h / 2.0;
                let (near, far) = if toward_start {
                    (rect.x + rect.w * 0.3, rect.right() - rect.w * 0.3)
                } else {
                    (rect.right() - rect.w * 0.3, rect.x + rect.w * 0.3)
                };
                canvas.fill_triangle(
                    Vec2::new(near, cy),
                    Vec2::new(far, rect.y + rect.h * 0.3),
                    Vec2::new(far, rect.bottom() - rect.h * 0.3),
                    arrow_color,
                );
            }
        }

        // separator between strip and content
        canvas.line(
            Vec2::new(strip.x, strip.bottom()),
            Vec2::new(strip.right(), strip.bottom()),
            border,
            1.0,
        );
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                let hover = match self.hit(ev.position) {
                    Some(StripHit::Tab(i)) => Some(i),
                    _ => None,
                };
                if self.hover != hover {
                    self.hover = hover;
                    self.component().repaint();
                }
            }
            PointerPhase::Down(PointerButton::Primary) => match self.hit(ev.position) {
                Some(StripHit::Tab(i)) => self.select(i),
                Some(StripHit::LeftArrow) => {
                    if self.scroll_step(-1.0) {
                        self.start_scroll_repeat(-1.0);
                    }
                }
                Some(StripHit::RightArrow) => {
                    if self.scroll_step(1.0) {
                        self.start_scroll_repeat(1.0);
                    }
                }
                None => {}
            },
            PointerPhase::Up(PointerButton::Primary) | PointerPhase::Leave => {
                self.repeat = None;
                if ev.phase == PointerPhase::Leave && self.hover.take().is_some() {
                    self.component().repaint();
                }
            }
            _ => {}
        }
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        if self.tabs.is_empty() {
            return;
        }
        match ev.key {
            Key::ArrowLeft if self.selected > 0 => self.select(self.selected - 1),
            Key::ArrowRight if self.selected + 1 < self.tabs.len() => {
                self.select(self.selected + 1)
            }
            Key::Home => self.select(0),
            Key::End => self.select(self.tabs.len() - 1),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use web_time::Duration;

    fn tabs() -> Vec<String> {
        vec!["alpha".into(), "beta".into(), "gamma".into()]
    }

    fn skin(fx: &Fixture, width: f32) -> TabPaneSkin {
        let mut s = TabPaneSkin::new(&fx.ctx, tabs());
        s.install(fx.component(Rect::new(0.0, 0.0, width, 200.0)));
        s
    }

    #[test]
    fn preferred_width_sums_tab_labels() {
        let fx = Fixture::new();
        let mut s = skin(&fx, 400.0);
        let per_tab: f32 = (0..3).map(|i| s.tab_width(i)).sum();
        assert_eq!(s.preferred_width(None), per_tab);
        assert_eq!(s.preferred_size().height, s.strip_height());

        // longer labels widen the pane; "beta" is the narrowest tab
        assert!(s.tab_width(1) < s.tab_width(0));
        let before = s.preferred_width(None);
        s.set_tabs(vec!["alpha".into(), "beta but longer".into(), "gamma".into()]);
        assert!(s.preferred_width(None) > before);
    }

    #[test]
    fn pointer_and_keyboard_selection() {
        let fx = Fixture::new();
        let mut s = skin(&fx, 400.0);
        let seen = Rc::new(Cell::new(usize::MAX));
        let seen2 = seen.clone();
        s.on_select(move |i| seen2.set(i));

        let second = s.tab_rect(1);
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(second.x + 2.0, second.y + 2.0),
        ));
        assert_eq!(s.selected(), 1);
        assert_eq!(seen.get(), 1);

        s.on_key(&KeyEvent::new(Key::ArrowRight));
        assert_eq!(s.selected(), 2);
        s.on_key(&KeyEvent::new(Key::ArrowRight)); // already last
        assert_eq!(s.selected(), 2);
        s.on_key(&KeyEvent::new(Key::Home));
        assert_eq!(s.selected(), 0);
    }

    #[test]
    fn overflow_arrows_scroll_with_auto_repeat() {
        let fx = Fixture::new();
        let mut s = skin(&fx, 80.0); // too narrow for three tabs
        assert!(s.overflowing());

        let strip_h = s.strip_height();
        let right_arrow = Vec2::new(80.0 - strip_h / 2.0, strip_h / 2.0);
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            right_arrow,
        ));
        let after_press = s.scroll.get();
        assert!(after_press > 0.0);

        fx.clock.advance(Duration::from_millis(400));
        fx.ctx.timers.fire_due();
        assert!(s.scroll.get() > after_press);

        // holding long enough pins the scroll at max and stops the repeat
        for _ in 0..50 {
            fx.clock.advance(Duration::from_millis(30));
            fx.ctx.timers.fire_due();
        }
        assert_eq!(s.scroll.get(), s.max_scroll());
        assert!(!fx.ctx.hub.repeat_active());

        s.on_pointer(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            right_arrow,
        ));
    }

    #[test]
    fn selecting_scrolls_the_tab_into_view() {
        let fx = Fixture::new();
        let mut s = skin(&fx, 120.0);
        s.select(2);
        let viewport = s.tab_viewport();
        let rect = s.tab_rect(2);
        assert!(rect.x >= viewport.x - 0.5);
        assert!(rect.right() <= viewport.right() + 0.5);
    }

    #[test]
    fn content_sits_below_the_strip() {
        let fx = Fixture::new();
        let s = skin(&fx, 400.0);
        let content = s.content_bounds();
        assert_eq!(content.y, s.strip_height());
        assert_eq!(content.h, 200.0 - s.strip_height());
    }
}
