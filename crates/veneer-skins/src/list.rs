//! Flat list view skin: uniform rows, hover highlight that fades in, single
//! selection. Also serves as the popup body of the list button, which is
//! why the style store sits behind a shared handle: the button delegates
//! its `list_*` keys here.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::{Duration, Instant};

use veneer_core::{
    Affects, Canvas, ColorRole, Component, Easing, FontRole, Key, KeyEvent, Measure,
    PointerButton, PointerEvent, PointerPhase, Rect, StyleDefault, StyleKey, StyleStore, Vec2,
};

use crate::{Skin, SkinCtx, bind_component, require_installed};

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::font("list_font", Affects::Layout, FontRole::Base),
    StyleKey::scalar("list_padding", Affects::Layout, 3.0),
    StyleKey::color(
        "list_background_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Surface),
    ),
    StyleKey::color(
        "list_text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
    StyleKey::color(
        "list_selection_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::SelectionBg),
    ),
    StyleKey::color(
        "list_selection_text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::SelectionFg),
    ),
    StyleKey::color(
        "list_highlight_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::HoverBg),
    ),
];

/// Key names a wrapping widget (the list button) forwards to its owned
/// list view's store.
pub static DELEGATED_STYLE_KEYS: &[&str] = &[
    "list_font",
    "list_padding",
    "list_background_color",
    "list_text_color",
    "list_selection_color",
    "list_selection_text_color",
    "list_highlight_color",
];

const HOVER_FADE: Duration = Duration::from_millis(150);

pub struct ListViewSkin {
    ctx: SkinCtx,
    styles: Rc<RefCell<StyleStore>>,
    component: Option<Component>,
    items: Vec<String>,
    selected: Option<usize>,
    hover: Option<usize>,
    hover_since: Option<Instant>,
    on_select: Option<Rc<dyn Fn(usize)>>,
}

impl ListViewSkin {
    pub fn new(ctx: &SkinCtx, items: Vec<String>) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: Rc::new(RefCell::new(StyleStore::new(STYLE_KEYS, &ctx.theme))),
            component: None,
            items,
            selected: None,
            hover: None,
            hover_since: None,
            on_select: None,
        }
    }

    /// Shared store handle, for style delegation by a wrapping widget.
    pub fn styles_handle(&self) -> Rc<RefCell<StyleStore>> {
        self.styles.clone()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
        self.selected = None;
        self.hover = None;
        if let Some(c) = &self.component {
            c.invalidate();
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_selected(&mut self, index: Option<usize>) {
        if let Some(i) = index {
            assert!(
                i < self.items.len(),
                "list index {i} out of bounds ({} items)",
                self.items.len()
            );
        }
        if self.selected != index {
            self.selected = index;
            if let Some(c) = &self.component {
                c.repaint();
            }
        }
    }

    pub fn on_select(&mut self, cb: impl Fn(usize) + 'static) {
        self.on_select = Some(Rc::new(cb));
    }

    pub fn row_height(&self) -> f32 {
        let styles = self.styles.borrow();
        let font = styles.font("list_font");
        self.ctx.ruler.line_height(&font) + 2.0 * styles.scalar("list_padding")
    }

    fn row_at(&self, p: Vec2) -> Option<usize> {
        if p.y < 0.0 {
            return None;
        }
        let row = (p.y / self.row_height()) as usize;
        (row < self.items.len()).then_some(row)
    }

    fn pick(&mut self, index: usize) {
        self.selected = Some(index);
        if let Some(cb) = &self.on_select {
            cb(index);
        }
        if let Some(c) = &self.component {
            c.repaint();
        }
    }

    /// Hover fade-in factor in `[0, 1]`, eased over elapsed hover time.
    fn hover_strength(&self) -> f32 {
        let Some(since) = self.hover_since else {
            return 1.0;
        };
        let elapsed = self.ctx.timers.now().saturating_duration_since(since);
        let t = elapsed.as_secs_f32() / HOVER_FADE.as_secs_f32();
        Easing::EaseOut.interpolate(t)
    }
}

impl Measure for ListViewSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "list view");
        let _ = given_height;
        let styles = self.styles.borrow();
        let font = styles.font("list_font");
        let pad = styles.scalar("list_padding");
        self.items
            .iter()
            .map(|item| self.ctx.ruler.advance(item, &font) + 2.0 * pad)
            .fold(0.0, f32::max)
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "list view");
        let _ = given_width;
        self.row_height() * self.items.len() as f32
    }
}

impl Skin for ListViewSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "list view");
        let component = self.component.clone().expect("just installed");
        self.styles.borrow_mut().attach(&component);
    }

    fn uninstall(&mut self) {
        self.styles.borrow_mut().detach();
        self.hover = None;
        self.hover_since = None;
        if self.component.take().is_some() {
            log::debug!("list view skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "list view")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = Rect::from_size(self.component().bounds().size());
        let styles = self.styles.borrow();
        canvas.fill_rect(b, styles.color("list_background_color"));

        let row_h = self.row_height();
        if row_h <= 0.0 {
            return;
        }
        let font = styles.font("list_font");
        let pad = styles.scalar("list_padding");
        let clip = canvas.clip_bounds().intersect(b);
        let first = (clip.y / row_h).floor().max(0.0) as usize;
        let last = ((clip.bottom() / row_h).ceil() as usize).min(self.items.len());

        for i in first..last {
            let y = i as f32 * row_h;
            let strip = Rect::new(0.0, y, b.w, row_h);
            let mut fg = styles.color("list_text_color");
            if self.selected == Some(i) {
                canvas.fill_rect(strip, styles.color("list_selection_color"));
                fg = styles.color("list_selection_text_color");
            } else if self.hover == Some(i) {
                let base = styles.color("list_highlight_color");
                let alpha = (base.3 as f32 * self.hover_strength()) as u8;
                canvas.fill_rect(strip, base.with_alpha(alpha));
            }
            canvas.text(Vec2::new(pad, y + pad), self.items[i].clone(), &font, fg);
        }
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                let hover = self.row_at(ev.position);
                if self.hover != hover {
                    self.hover = hover;
                    self.hover_since = hover.map(|_| self.ctx.timers.now());
                    self.component().repaint();
                }
            }
            PointerPhase::Leave => {
                if self.hover.take().is_some() {
                    self.hover_since = None;
                    self.component().repaint();
                }
            }
            PointerPhase::Down(PointerButton::Primary) => {
                if let Some(row) = self.row_at(ev.position) {
                    self.pick(row);
                }
            }
            _ => {}
        }
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        match ev.key {
            Key::ArrowUp => self.pick(self.selected.map_or(0, |s| s.saturating_sub(1))),
            Key::ArrowDown => self.pick(self.selected.map_or(0, |s| (s + 1).min(last))),
            Key::Home => self.pick(0),
            Key::End => self.pick(last),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use std::cell::Cell;

    fn items() -> Vec<String> {
        vec!["ares".into(), "boreas".into(), "calypso".into()]
    }

    fn skin(fx: &Fixture) -> ListViewSkin {
        let mut s = ListViewSkin::new(&fx.ctx, items());
        s.install(fx.component(Rect::new(0.0, 0.0, 120.0, 200.0)));
        s
    }

    #[test]
    fn click_selects_and_fires() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let seen = Rc::new(Cell::new(usize::MAX));
        let seen2 = seen.clone();
        s.on_select(move |i| seen2.set(i));

        let row_h = s.row_height();
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(10.0, 1.5 * row_h),
        ));
        assert_eq!(s.selected(), Some(1));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn hover_fades_in_over_time() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let row_h = s.row_height();
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(10.0, 0.5 * row_h),
        ));
        let early = s.hover_strength();
        fx.clock.advance(Duration::from_millis(75));
        let mid = s.hover_strength();
        fx.clock.advance(Duration::from_millis(200));
        let late = s.hover_strength();
        assert!(early < mid && mid < late);
        assert_eq!(late, 1.0);
    }

    #[test]
    fn keyboard_walks_the_list() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.on_key(&KeyEvent::new(Key::ArrowDown));
        assert_eq!(s.selected(), Some(0));
        s.on_key(&KeyEvent::new(Key::ArrowDown));
        assert_eq!(s.selected(), Some(1));
        s.on_key(&KeyEvent::new(Key::End));
        assert_eq!(s.selected(), Some(2));
        s.on_key(&KeyEvent::new(Key::ArrowDown)); // pinned at the end
        assert_eq!(s.selected(), Some(2));
    }

    #[test]
    fn preferred_width_is_the_widest_item() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let w = s.preferred_width(None);
        s.set_items(vec!["a".into(), "a much much longer entry".into()]);
        assert!(s.preferred_width(None) > w);
        assert_eq!(s.preferred_height(None), 2.0 * s.row_height());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn selecting_past_the_end_is_fatal() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_selected(Some(9));
    }
}
