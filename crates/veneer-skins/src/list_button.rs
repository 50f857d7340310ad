//! List button (drop-down) skin: a closed button showing the current
//! choice, owning a [`ListViewSkin`] that becomes the popup body.
//!
//! The button's style store delegates every `list_*` key to the owned
//! list's store, so one `put` on the button restyles the popup too, and
//! the delegated names stay out of the button's own key listing.
//!
//! The popup itself is a host-owned component: the skin asks for one via
//! `on_popup_request(true)`, the host creates it with [`popup_bounds`] and
//! hands it to [`open_popup`], then routes the popup's pointer events into
//! [`popup_pointer`].
//!
//! [`popup_bounds`]: ListButtonSkin::popup_bounds
//! [`open_popup`]: ListButtonSkin::open_popup
//! [`popup_pointer`]: ListButtonSkin::popup_pointer

use std::cell::Cell;
use std::rc::Rc;

use veneer_core::{
    Affects, Canvas, ColorRole, Component, FontRole, HoverPress, Key, KeyEvent, Measure,
    PointerButton, PointerEvent, PointerPhase, Rect, StyleDefault, StyleKey, StyleStore, Vec2,
};

use crate::list::{DELEGATED_STYLE_KEYS, ListViewSkin};
use crate::{Skin, SkinCtx, bind_component, require_installed};

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::font("button_font", Affects::Layout, FontRole::Base),
    StyleKey::scalar("button_padding", Affects::Layout, 4.0),
    StyleKey::scalar("arrow_box", Affects::Layout, 16.0),
    StyleKey::scalar("popup_max_height", Affects::Paint, 200.0),
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
        "text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
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

pub struct ListButtonSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    list: ListViewSkin,
    pick: Rc<Cell<Option<usize>>>,
    open: bool,
    tracker: HoverPress,
    on_change: Option<Rc<dyn Fn(usize)>>,
    on_popup_request: Option<Rc<dyn Fn(bool)>>,
}

impl ListButtonSkin {
    pub fn new(ctx: &SkinCtx, items: Vec<String>) -> Self {
        let mut list = ListViewSkin::new(ctx, items);
        let pick = Rc::new(Cell::new(None));
        let p = pick.clone();
        list.on_select(move |i| p.set(Some(i)));

        let mut styles = StyleStore::new(STYLE_KEYS, &ctx.theme);
        styles.add_delegate(DELEGATED_STYLE_KEYS, list.styles_handle());

        Self {
            ctx: ctx.clone(),
            styles,
            component: None,
            list,
            pick,
            open: false,
            tracker: HoverPress::new(),
            on_change: None,
            on_popup_request: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn list(&self) -> &ListViewSkin {
        &self.list
    }

    pub fn selected(&self) -> Option<usize> {
        self.list.selected()
    }

    pub fn set_selected(&mut self, index: Option<usize>) {
        self.list.set_selected(index);
        if let Some(c) = &self.component {
            c.repaint();
        }
    }

    pub fn on_change(&mut self, cb: impl Fn(usize) + 'static) {
        self.on_change = Some(Rc::new(cb));
    }

    /// `true` asks the host to create the popup component (then call
    /// [`ListButtonSkin::open_popup`]); `false` tells it the popup closed.
    pub fn on_popup_request(&mut self, cb: impl Fn(bool) + 'static) {
        self.on_popup_request = Some(Rc::new(cb));
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Popup placement in display space: below the button, clamped to the
    /// display, sized by the list's preferred extent.
    pub fn popup_bounds(&self) -> Rect {
        let button = require_installed(&self.component, "list button").bounds();
        let row_h = self.list.row_height();
        let height = (row_h * self.list.items().len() as f32)
            .min(self.styles.scalar("popup_max_height"));
        let display = self.ctx.hub.bounds();
        let below = display.bottom() - button.bottom();
        let y = if height <= below {
            button.bottom()
        } else {
            (button.y - height).max(display.y)
        };
        Rect::new(button.x, y, button.w, height.min(display.h))
    }

    pub fn open_popup(&mut self, popup: Component) {
        assert!(!self.open, "list button popup is already open");
        self.pick.set(None);
        self.list.install(popup);
        self.open = true;
        self.component().repaint();
        log::debug!("list button popup opened");
    }

    pub fn close_popup(&mut self) {
        if !self.open {
            return;
        }
        self.list.uninstall();
        self.open = false;
        if let Some(cb) = &self.on_popup_request {
            cb(false);
        }
        if let Some(c) = &self.component {
            c.repaint();
        }
        log::debug!("list button popup closed");
    }

    /// Pointer events on the popup component, in popup-local coordinates.
    /// A pick inside the list closes the popup and fires the change
    /// callback.
    pub fn popup_pointer(&mut self, ev: &PointerEvent) {
        if !self.open {
            return;
        }
        self.list.on_pointer(ev);
        if let Some(index) = self.pick.take() {
            self.close_popup();
            if let Some(cb) = &self.on_change {
                cb(index);
            }
        }
    }

    fn request_open(&self) {
        if let Some(cb) = &self.on_popup_request {
            cb(true);
        }
    }

    fn label(&self) -> &str {
        self.list
            .selected()
            .and_then(|i| self.list.items().get(i))
            .map_or("", |s| s.as_str())
    }

    fn commit(&mut self, index: usize) {
        self.list.set_selected(Some(index));
        if let Some(cb) = &self.on_change {
            cb(index);
        }
        if let Some(c) = &self.component {
            c.repaint();
        }
    }
}

impl Measure for ListButtonSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "list button");
        let _ = given_height;
        let font = self.styles.font("button_font");
        let pad = self.styles.scalar("button_padding");
        let widest = self
            .list
            .items()
            .iter()
            .map(|item| self.ctx.ruler.advance(item, &font))
            .fold(0.0, f32::max);
        widest + 2.0 * pad + self.styles.scalar("arrow_box")
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "list button");
        let _ = given_width;
        let font = self.styles.font("button_font");
        self.ctx.ruler.line_height(&font) + 2.0 * self.styles.scalar("button_padding")
    }
}

impl Skin for ListButtonSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "list button");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        if self.open {
            self.close_popup();
        }
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("list button skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "list button")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = Rect::from_size(self.component().bounds().size());
        let bg = if self.tracker.is_pressed() || self.open {
            self.styles.color("button_pressed_color")
        } else if self.tracker.is_hovering() {
            self.styles.color("button_hover_color")
        } else {
            self.styles.color("button_color")
        };
        canvas.fill_rect(b, bg);
        canvas.stroke_rect(b, self.styles.color("border_color"), 1.0);

        let font = self.styles.font("button_font");
        let pad = self.styles.scalar("button_padding");
        let arrow_box = self.styles.scalar("arrow_box");
        let text_area = Rect::new(b.x, b.y, (b.w - arrow_box).max(0.0), b.h);
        canvas.push_clip(text_area);
        canvas.text(
            Vec2::new(pad, pad),
            self.label().to_string(),
            &font,
            self.styles.color("text_color"),
        );
        canvas.pop_clip();

        // down arrow in its box on the right
        let cx = b.right() - arrow_box / 2.0;
        let cy = b.y + b.h / 2.0;
        let half = arrow_box * 0.2;
        canvas.fill_triangle(
            Vec2::new(cx - half, cy - half / 2.0),
            Vec2::new(cx + half, cy - half / 2.0),
            Vec2::new(cx, cy + half),
            self.styles.color("arrow_color"),
        );
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter => {
                self.tracker.on_enter();
                self.component().repaint();
            }
            PointerPhase::Move => {
                self.tracker.on_move(ev.position);
            }
            PointerPhase::Leave => {
                self.tracker.on_leave();
                self.component().repaint();
            }
            PointerPhase::Down(PointerButton::Primary) => {
                self.tracker.on_press(ev.position);
                self.component().repaint();
                if self.open {
                    self.close_popup();
                } else {
                    self.request_open();
                }
            }
            PointerPhase::Up(PointerButton::Primary) => {
                if self.tracker.on_release() {
                    self.component().repaint();
                }
            }
            _ => {}
        }
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        let count = self.list.items().len();
        if count == 0 {
            return;
        }
        match ev.key {
            Key::ArrowDown => {
                let next = self.list.selected().map_or(0, |s| (s + 1).min(count - 1));
                self.commit(next);
            }
            Key::ArrowUp => {
                let next = self.list.selected().map_or(0, |s| s.saturating_sub(1));
                self.commit(next);
            }
            Key::Enter if !self.open => self.request_open(),
            Key::Escape if self.open => self.close_popup(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use veneer_core::StyleValue;

    fn items() -> Vec<String> {
        vec!["north".into(), "south".into(), "east".into(), "west".into()]
    }

    fn skin(fx: &Fixture) -> ListButtonSkin {
        let mut s = ListButtonSkin::new(&fx.ctx, items());
        s.install(fx.component(Rect::new(100.0, 100.0, 120.0, 24.0)));
        s
    }

    #[test]
    fn delegated_keys_restyle_the_owned_list() {
        let fx = Fixture::new();
        let mut s = skin(&fx);

        assert!(s.styles().contains("list_font"));
        assert!(s.styles().contains("button_font"));
        // delegated names stay out of the local key listing
        assert!(!s.styles().keys().iter().any(|k| k.name.starts_with("list_")));

        s.styles_mut()
            .put("list_padding", StyleValue::Scalar(8.0))
            .unwrap();
        assert_eq!(
            s.list().styles_handle().borrow().scalar("list_padding"),
            8.0
        );
        // and reads come back through the delegation too
        assert_eq!(s.styles().scalar("list_padding"), 8.0);
    }

    #[test]
    fn popup_cycle_selects_and_fires_change() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let requested = Rc::new(Cell::new(None));
        let changed = Rc::new(Cell::new(None));
        let rq = requested.clone();
        s.on_popup_request(move |open| rq.set(Some(open)));
        let ch = changed.clone();
        s.on_change(move |i| ch.set(Some(i)));

        // click the button: the skin asks the host for a popup
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(10.0, 10.0),
        ));
        assert_eq!(requested.get(), Some(true));
        assert!(!s.is_open());

        let bounds = s.popup_bounds();
        assert_eq!(bounds.y, 124.0); // directly below the button
        assert_eq!(bounds.w, 120.0);
        s.open_popup(fx.component(bounds));
        assert!(s.is_open());

        // pick the second row inside the popup
        let row_h = s.list().row_height();
        s.popup_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(10.0, 1.5 * row_h),
        ));
        assert!(!s.is_open());
        assert_eq!(changed.get(), Some(1));
        assert_eq!(s.selected(), Some(1));
        assert_eq!(requested.get(), Some(false)); // close was reported
    }

    #[test]
    fn popup_flips_above_when_no_room_below() {
        let fx = Fixture::new();
        let mut s = ListButtonSkin::new(&fx.ctx, items());
        // sit the button at the bottom edge of the 768-tall display
        s.install(fx.component(Rect::new(100.0, 750.0, 120.0, 18.0)));
        let bounds = s.popup_bounds();
        assert!(bounds.bottom() <= 768.0);
        assert!(bounds.y < 750.0);
    }

    #[test]
    fn keyboard_changes_selection_without_a_popup() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let changed = Rc::new(Cell::new(None));
        let ch = changed.clone();
        s.on_change(move |i| ch.set(Some(i)));

        s.on_key(&KeyEvent::new(Key::ArrowDown));
        assert_eq!(s.selected(), Some(0));
        s.on_key(&KeyEvent::new(Key::ArrowDown));
        assert_eq!(s.selected(), Some(1));
        assert_eq!(changed.get(), Some(1));
        s.on_key(&KeyEvent::new(Key::ArrowUp));
        assert_eq!(s.selected(), Some(0));
    }

    #[test]
    fn uninstall_tears_down_an_open_popup() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let bounds = s.popup_bounds();
        s.open_popup(fx.component(bounds));
        assert!(s.is_open());
        s.uninstall();
        assert!(!s.is_open());
    }
}
