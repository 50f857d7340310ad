//! Single-line text input skin.
//!
//! Caret motion and deletion are grapheme-correct; selection extends by
//! keyboard (shift+arrows, ctrl for word jumps) or by a capture drag that
//! keeps selecting while the pointer is outside the field, auto-scrolling
//! the content on the recurring timer. The caret blinks on its own
//! recurring timer and every edit resets the blink phase.
//!
//! Capacity is a character limit: an insert or paste that would exceed it
//! is simply not performed and the reject callback (the host's bell) fires
//! instead.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use unicode_segmentation::UnicodeSegmentation;
use web_time::Duration;

use veneer_core::{
    Affects, Canvas, ColorRole, Component, DragHandle, FontRole, FontSpec, GrabControl, Key,
    KeyEvent, Measure, Modifiers, PointerButton, PointerEvent, PointerPhase, Rect, RepeatControl,
    RepeatHandle, StyleDefault, StyleKey, StyleStore, TextRuler, TimerToken, Vec2, grapheme_offsets,
    start_auto_repeat,
};

use crate::{Skin, SkinCtx, bind_component, require_installed};

const BLINK_PERIOD: Duration = Duration::from_millis(500);
const DRAG_SCROLL_STEP: f32 = 8.0;

/// Host clipboard seam.
pub trait ClipboardProxy {
    fn get(&self) -> Option<String>;
    fn set(&self, text: String);
}

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::font("text_font", Affects::Layout, FontRole::Base),
    StyleKey::scalar("text_padding", Affects::Layout, 4.0),
    StyleKey::scalar("preferred_columns", Affects::Layout, 12.0),
    StyleKey::color(
        "background_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Surface),
    ),
    StyleKey::color(
        "text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
    StyleKey::color(
        "selection_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::SelectionBg),
    ),
    StyleKey::color(
        "selection_text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::SelectionFg),
    ),
    StyleKey::color(
        "caret_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Caret),
    ),
    StyleKey::color(
        "border_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Outline),
    ),
    StyleKey::color(
        "focus_border_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Focus),
    ),
];

fn prev_grapheme_boundary(text: &str, byte: usize) -> usize {
    let mut last = 0;
    for (i, _) in text.grapheme_indices(true) {
        if i >= byte {
            break;
        }
        last = i;
    }
    last
}

fn next_grapheme_boundary(text: &str, byte: usize) -> usize {
    for (i, _) in text.grapheme_indices(true) {
        if i > byte {
            return i;
        }
    }
    text.len()
}

fn prev_word_boundary(text: &str, byte: usize) -> usize {
    let mut last = 0;
    for (i, word) in text.split_word_bound_indices() {
        if i >= byte {
            break;
        }
        if !word.trim().is_empty() {
            last = i;
        }
    }
    last
}

fn next_word_boundary(text: &str, byte: usize) -> usize {
    text.split_word_bound_indices()
        .find(|(i, word)| *i > byte && !word.trim().is_empty())
        .map_or(text.len(), |(i, _)| i)
}

/// Selection is `anchor..caret` (unordered); the caret end is the one that
/// moves and blinks.
struct EditState {
    text: String,
    anchor: usize,
    caret: usize,
    scroll: f32,
}

impl EditState {
    fn selection(&self) -> (usize, usize) {
        (self.anchor.min(self.caret), self.anchor.max(self.caret))
    }

    fn has_selection(&self) -> bool {
        self.anchor != self.caret
    }

    fn place_caret(&mut self, byte: usize, extend: bool) {
        self.caret = byte.min(self.text.len());
        if !extend {
            self.anchor = self.caret;
        }
    }
}

pub struct TextInputSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    state: Rc<RefCell<EditState>>,
    max_length: Option<usize>,
    clipboard: Option<Rc<dyn ClipboardProxy>>,
    caret_on: Rc<Cell<bool>>,
    blink: Option<TimerToken>,
    drag: Option<DragHandle>,
    drag_repeat: Rc<RefCell<Option<RepeatHandle>>>,
    on_change: Option<Rc<dyn Fn(&str)>>,
    on_submit: Option<Rc<dyn Fn(&str)>>,
    on_reject: Option<Rc<dyn Fn()>>,
}

impl TextInputSkin {
    pub fn new(ctx: &SkinCtx) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            state: Rc::new(RefCell::new(EditState {
                text: String::new(),
                anchor: 0,
                caret: 0,
                scroll: 0.0,
            })),
            max_length: None,
            clipboard: None,
            caret_on: Rc::new(Cell::new(true)),
            blink: None,
            drag: None,
            drag_repeat: Rc::new(RefCell::new(None)),
            on_change: None,
            on_submit: None,
            on_reject: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        {
            let mut st = self.state.borrow_mut();
            st.text = text.into();
            st.anchor = st.text.len();
            st.caret = st.text.len();
            st.scroll = 0.0;
        }
        self.after_edit();
    }

    /// Byte range of the selection, normalized.
    pub fn selection(&self) -> (usize, usize) {
        self.state.borrow().selection()
    }

    pub fn select_all(&mut self) {
        {
            let mut st = self.state.borrow_mut();
            st.anchor = 0;
            st.caret = st.text.len();
        }
        self.reset_blink();
        self.repaint();
    }

    /// Character capacity; `None` is unbounded.
    pub fn set_max_length(&mut self, max: Option<usize>) {
        self.max_length = max;
    }

    pub fn set_clipboard(&mut self, clipboard: Rc<dyn ClipboardProxy>) {
        self.clipboard = Some(clipboard);
    }

    pub fn on_change(&mut self, cb: impl Fn(&str) + 'static) {
        self.on_change = Some(Rc::new(cb));
    }

    pub fn on_submit(&mut self, cb: impl Fn(&str) + 'static) {
        self.on_submit = Some(Rc::new(cb));
    }

    /// The "audible bell": fires when an edit is refused for capacity.
    pub fn on_reject(&mut self, cb: impl Fn() + 'static) {
        self.on_reject = Some(Rc::new(cb));
    }

    fn font(&self) -> FontSpec {
        self.styles.font("text_font")
    }

    fn pad(&self) -> f32 {
        self.styles.scalar("text_padding")
    }

    fn inner_rect(&self) -> Rect {
        let b = Rect::from_size(require_installed(&self.component, "text input").bounds().size());
        let pad = self.pad();
        Rect::new(
            pad,
            pad,
            (b.w - 2.0 * pad).max(0.0),
            (b.h - 2.0 * pad).max(0.0),
        )
    }

    fn repaint(&self) {
        if let Some(c) = &self.component {
            c.repaint();
        }
    }

    fn reject(&self) {
        if let Some(cb) = &self.on_reject {
            cb();
        }
        log::debug!("text input rejected an edit at capacity");
    }

    fn reset_blink(&mut self) {
        self.caret_on.set(true);
        if let Some(token) = self.blink.take() {
            self.ctx.timers.cancel(token);
        }
        if self.component.is_some() {
            let caret_on = self.caret_on.clone();
            let component = self.component.clone().expect("checked above");
            self.blink = Some(self.ctx.timers.recurring(BLINK_PERIOD, BLINK_PERIOD, move || {
                caret_on.set(!caret_on.get());
                component.repaint();
            }));
        }
    }

    fn after_edit(&mut self) {
        self.scroll_caret_into_view();
        self.reset_blink();
        self.repaint();
        if let Some(cb) = &self.on_change {
            let text = self.state.borrow().text.clone();
            cb(&text);
        }
    }

    fn caret_x(&self) -> f32 {
        let st = self.state.borrow();
        byte_to_x(&st.text, st.caret, &self.font(), &*self.ctx.ruler)
    }

    fn scroll_caret_into_view(&mut self) {
        let inner = self.inner_rect();
        let caret_x = self.caret_x();
        let mut st = self.state.borrow_mut();
        let inset = 2.0;
        if caret_x < st.scroll + inset {
            st.scroll = (caret_x - inset).max(0.0);
        } else if caret_x > st.scroll + inner.w - inset {
            st.scroll = caret_x - inner.w + inset;
        }
    }

    /// Character count an insert must fit under, counting the selection it
    /// replaces as freed.
    fn fits(&self, insert: &str) -> bool {
        let Some(max) = self.max_length else {
            return true;
        };
        let st = self.state.borrow();
        let (a, b) = st.selection();
        let kept = st.text.chars().count() - st.text[a..b].chars().count();
        kept + insert.chars().count() <= max
    }

    /// Inserts over the selection; refused (with the bell) at capacity.
    pub fn insert(&mut self, text: &str) {
        if !self.fits(text) {
            self.reject();
            return;
        }
        {
            let mut st = self.state.borrow_mut();
            let (a, b) = st.selection();
            st.text.replace_range(a..b, text);
            let caret = a + text.len();
            st.anchor = caret;
            st.caret = caret;
        }
        self.after_edit();
    }

    fn delete_backward(&mut self) {
        {
            let mut st = self.state.borrow_mut();
            if st.has_selection() {
                let (a, b) = st.selection();
                st.text.replace_range(a..b, "");
                st.anchor = a;
                st.caret = a;
            } else if st.caret > 0 {
                let prev = prev_grapheme_boundary(&st.text, st.caret);
                let caret = st.caret;
                st.text.replace_range(prev..caret, "");
                st.anchor = prev;
                st.caret = prev;
            } else {
                return;
            }
        }
        self.after_edit();
    }

    fn delete_forward(&mut self) {
        {
            let mut st = self.state.borrow_mut();
            if st.has_selection() {
                let (a, b) = st.selection();
                st.text.replace_range(a..b, "");
                st.anchor = a;
                st.caret = a;
            } else if st.caret < st.text.len() {
                let next = next_grapheme_boundary(&st.text, st.caret);
                let caret = st.caret;
                st.text.replace_range(caret..next, "");
            } else {
                return;
            }
        }
        self.after_edit();
    }

    fn move_caret(&mut self, forward: bool, word: bool, extend: bool) {
        {
            let mut st = self.state.borrow_mut();
            let target = match (forward, word) {
                (false, false) => prev_grapheme_boundary(&st.text, st.caret),
                (true, false) => next_grapheme_boundary(&st.text, st.caret),
                (false, true) => prev_word_boundary(&st.text, st.caret),
                (true, true) => next_word_boundary(&st.text, st.caret),
            };
            // collapsing a selection without shift jumps to its edge
            let target = if !extend && st.has_selection() && !word {
                let (a, b) = st.selection();
                if forward { b } else { a }
            } else {
                target
            };
            st.place_caret(target, extend);
        }
        self.scroll_caret_into_view();
        self.reset_blink();
        self.repaint();
    }

    fn copy_selection(&self, cut: bool) -> bool {
        let Some(clipboard) = self.clipboard.clone() else {
            return false;
        };
        let selected = {
            let st = self.state.borrow();
            let (a, b) = st.selection();
            st.text[a..b].to_string()
        };
        if selected.is_empty() {
            return false;
        }
        clipboard.set(selected);
        cut
    }

    fn paste(&mut self) {
        let Some(text) = self.clipboard.as_ref().and_then(|c| c.get()) else {
            return;
        };
        // single-line field: strip line breaks from pasted content
        let text: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        self.insert(&text);
    }

    fn byte_at_local_x(&self, local_x: f32) -> usize {
        let st = self.state.borrow();
        let content_x = local_x - self.inner_rect().x + st.scroll;
        x_to_byte(&st.text, content_x, &self.font(), &*self.ctx.ruler)
    }

    fn begin_selection_drag(&mut self, press_local: Vec2, extend: bool) {
        let byte = self.byte_at_local_x(press_local.x);
        self.state.borrow_mut().place_caret(byte, extend);
        self.reset_blink();
        self.repaint();

        let state = self.state.clone();
        let component = self.component().clone();
        let font = self.font();
        let ruler = self.ctx.ruler.clone();
        let inner = self.inner_rect();
        let hub = self.ctx.hub.clone();
        let timers = self.ctx.timers.clone();
        let drag_repeat = self.drag_repeat.clone();
        // -1 left of the field, +1 right of it, 0 inside
        let outside = Rc::new(Cell::new(0.0f32));

        self.drag = None;
        self.drag = Some(self.ctx.hub.begin_drag(move |ev| match ev.phase {
            PointerPhase::Move => {
                let origin = component.bounds().origin();
                let local_x = ev.position.x - origin.x;
                let dir = if local_x < inner.x {
                    -1.0
                } else if local_x > inner.x + inner.w {
                    1.0
                } else {
                    0.0
                };
                outside.set(dir);

                if dir == 0.0 {
                    let mut st = state.borrow_mut();
                    let content_x = local_x - inner.x + st.scroll;
                    let byte = x_to_byte(&st.text, content_x, &font, &*ruler);
                    st.place_caret(byte, true);
                    component.repaint();
                } else if drag_repeat.borrow().is_none() {
                    // pointer left the field: auto-scroll on the timer
                    let state = state.clone();
                    let component = component.clone();
                    let font = font.clone();
                    let ruler = ruler.clone();
                    let outside = outside.clone();
                    let handle = start_auto_repeat(&hub, &timers, move || {
                        let dir = outside.get();
                        if dir != 0.0 {
                            let mut st = state.borrow_mut();
                            let max_scroll =
                                (ruler.advance(&st.text, &font) - inner.w).max(0.0);
                            st.scroll = (st.scroll + dir * DRAG_SCROLL_STEP)
                                .clamp(0.0, max_scroll);
                            let edge_x = if dir < 0.0 { st.scroll } else { st.scroll + inner.w };
                            let byte = x_to_byte(&st.text, edge_x, &font, &*ruler);
                            st.place_caret(byte, true);
                            component.repaint();
                        }
                        RepeatControl::Continue
                    });
                    *drag_repeat.borrow_mut() = Some(handle);
                }
                GrabControl::Keep
            }
            PointerPhase::Up(_) => {
                drag_repeat.borrow_mut().take();
                component.repaint();
                GrabControl::Release
            }
            _ => GrabControl::Keep,
        }));
    }
}

fn byte_to_x(text: &str, byte: usize, font: &FontSpec, ruler: &dyn TextRuler) -> f32 {
    let offsets = grapheme_offsets(text);
    let positions = ruler.positions(text, font);
    let idx = match offsets.binary_search(&byte) {
        Ok(i) | Err(i) => i.min(positions.len() - 1),
    };
    positions[idx]
}

fn x_to_byte(text: &str, x: f32, font: &FontSpec, ruler: &dyn TextRuler) -> usize {
    let offsets = grapheme_offsets(text);
    let positions = ruler.positions(text, font);
    let mut best = 0;
    let mut best_d = f32::INFINITY;
    for (i, &px) in positions.iter().enumerate() {
        let d = (px - x).abs();
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    offsets[best]
}

impl Measure for TextInputSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "text input");
        let _ = given_height;
        let font = self.font();
        let column = self.ctx.ruler.advance("M", &font);
        self.styles.scalar("preferred_columns") * column + 2.0 * self.pad()
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "text input");
        let _ = given_width;
        self.ctx.ruler.line_height(&self.font()) + 2.0 * self.pad()
    }
}

impl Skin for TextInputSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "text input");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
        self.reset_blink();
    }

    fn uninstall(&mut self) {
        if let Some(token) = self.blink.take() {
            self.ctx.timers.cancel(token);
        }
        self.drag_repeat.borrow_mut().take();
        self.drag = None;
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("text input skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "text input")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = Rect::from_size(self.component().bounds().size());
        canvas.fill_rect(b, self.styles.color("background_color"));
        let border = if self.component().focused() {
            self.styles.color("focus_border_color")
        } else {
            self.styles.color("border_color")
        };
        canvas.stroke_rect(b, border, 1.0);

        let inner = self.inner_rect();
        let font = self.font();
        let st = self.state.borrow();
        let positions = self.ctx.ruler.positions(&st.text, &font);
        let offsets = grapheme_offsets(&st.text);

        canvas.push_clip(inner);
        canvas.push_translate(Vec2::new(inner.x - st.scroll, inner.y));

        if st.has_selection() {
            let (a, b2) = st.selection();
            let ax = positions[offsets.binary_search(&a).unwrap_or_else(|i| i)];
            let bx = positions[offsets.binary_search(&b2).unwrap_or_else(|i| i)];
            canvas.fill_rect(
                Rect::new(ax, 0.0, bx - ax, inner.h),
                self.styles.color("selection_color"),
            );
        }

        canvas.text(
            Vec2::ZERO,
            st.text.clone(),
            &font,
            self.styles.color("text_color"),
        );

        if self.component().focused() && self.caret_on.get() {
            let caret_x = positions[match offsets.binary_search(&st.caret) {
                Ok(i) | Err(i) => i.min(positions.len() - 1),
            }];
            canvas.line(
                Vec2::new(caret_x, 0.0),
                Vec2::new(caret_x, inner.h),
                self.styles.color("caret_color"),
                1.0,
            );
        }

        canvas.pop_translate();
        canvas.pop_clip();
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        if let PointerPhase::Down(PointerButton::Primary) = ev.phase {
            let extend = ev.modifiers.contains(Modifiers::SHIFT);
            self.begin_selection_drag(ev.position, extend);
        }
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        if !self.component().enabled() {
            return;
        }
        let extend = ev.modifiers.contains(Modifiers::SHIFT);
        let word = ev.modifiers.contains(Modifiers::CTRL);
        match &ev.key {
            Key::Character(c) if ev.modifiers.contains(Modifiers::CTRL) => match *c {
                'a' => self.select_all(),
                'c' => {
                    self.copy_selection(false);
                }
                'x' => {
                    if self.copy_selection(true) {
                        let mut st = self.state.borrow_mut();
                        let (a, b) = st.selection();
                        st.text.replace_range(a..b, "");
                        st.anchor = a;
                        st.caret = a;
                        drop(st);
                        self.after_edit();
                    }
                }
                'v' => self.paste(),
                _ => {}
            },
            Key::Character(c) if !c.is_control() => {
                self.insert(&c.to_string());
            }
            Key::Backspace => self.delete_backward(),
            Key::Delete => self.delete_forward(),
            Key::ArrowLeft => self.move_caret(false, word, extend),
            Key::ArrowRight => self.move_caret(true, word, extend),
            Key::Home => {
                self.state.borrow_mut().place_caret(0, extend);
                self.scroll_caret_into_view();
                self.reset_blink();
                self.repaint();
            }
            Key::End => {
                let len = self.state.borrow().text.len();
                self.state.borrow_mut().place_caret(len, extend);
                self.scroll_caret_into_view();
                self.reset_blink();
                self.repaint();
            }
            Key::Enter => {
                if let Some(cb) = &self.on_submit {
                    let text = self.state.borrow().text.clone();
                    cb(&text);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;

    fn skin(fx: &Fixture) -> TextInputSkin {
        let mut s = TextInputSkin::new(&fx.ctx);
        let c = fx.component(Rect::new(50.0, 50.0, 120.0, 26.0));
        c.set_focused(true);
        s.install(c);
        s
    }

    fn type_char(s: &mut TextInputSkin, c: char) {
        s.on_key(&KeyEvent::new(Key::Character(c)));
    }

    fn key(s: &mut TextInputSkin, k: Key, m: Modifiers) {
        s.on_key(&KeyEvent::new(k).with_modifiers(m));
    }

    #[test]
    fn typing_and_grapheme_deletion() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        for c in "ab".chars() {
            type_char(&mut s, c);
        }
        s.insert("\u{1F44D}\u{1F3FD}"); // one grapheme, two scalars
        type_char(&mut s, 'c');
        assert_eq!(s.text(), "ab\u{1F44D}\u{1F3FD}c");

        s.on_key(&KeyEvent::new(Key::Backspace)); // 'c'
        s.on_key(&KeyEvent::new(Key::Backspace)); // the whole emoji cluster
        assert_eq!(s.text(), "ab");
    }

    #[test]
    fn selection_replacement_and_arrows() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_text("hello world");
        key(&mut s, Key::Home, Modifiers::empty());
        for _ in 0..5 {
            key(&mut s, Key::ArrowRight, Modifiers::SHIFT);
        }
        assert_eq!(s.selection(), (0, 5));
        s.insert("goodbye");
        assert_eq!(s.text(), "goodbye world");
        assert_eq!(s.selection(), (7, 7));

        // ctrl+left jumps back a word
        key(&mut s, Key::ArrowLeft, Modifiers::CTRL);
        assert_eq!(s.selection(), (0, 0));
        key(&mut s, Key::ArrowRight, Modifiers::CTRL);
        assert_eq!(s.selection().0, 8); // start of "world"
    }

    #[test]
    fn capacity_rejects_with_the_bell() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let bells = Rc::new(Cell::new(0));
        let b = bells.clone();
        s.on_reject(move || b.set(b.get() + 1));
        s.set_max_length(Some(5));

        s.insert("12345");
        assert_eq!(s.text(), "12345");
        type_char(&mut s, '6');
        assert_eq!(s.text(), "12345"); // unchanged
        assert_eq!(bells.get(), 1);

        // replacing a selection frees its characters first
        s.select_all();
        s.insert("abcde");
        assert_eq!(s.text(), "abcde");
        assert_eq!(bells.get(), 1);
    }

    #[test]
    fn clipboard_cut_copy_paste() {
        struct FakeClipboard(RefCell<Option<String>>);
        impl ClipboardProxy for FakeClipboard {
            fn get(&self) -> Option<String> {
                self.0.borrow().clone()
            }
            fn set(&self, text: String) {
                *self.0.borrow_mut() = Some(text);
            }
        }

        let fx = Fixture::new();
        let mut s = skin(&fx);
        let clip = Rc::new(FakeClipboard(RefCell::new(None)));
        s.set_clipboard(clip.clone());
        s.set_text("cut me");

        key(&mut s, Key::Character('a'), Modifiers::CTRL);
        key(&mut s, Key::Character('x'), Modifiers::CTRL);
        assert_eq!(s.text(), "");
        assert_eq!(clip.get().as_deref(), Some("cut me"));

        // paste strips line breaks
        clip.set("one\ntwo".into());
        key(&mut s, Key::Character('v'), Modifiers::CTRL);
        assert_eq!(s.text(), "onetwo");
    }

    #[test]
    fn caret_blinks_and_edits_reset_the_phase() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        assert!(s.caret_on.get());
        fx.clock.advance(BLINK_PERIOD);
        fx.ctx.timers.fire_due();
        assert!(!s.caret_on.get());

        // an edit snaps the caret back on
        type_char(&mut s, 'x');
        assert!(s.caret_on.get());

        fx.clock.advance(BLINK_PERIOD);
        fx.ctx.timers.fire_due();
        assert!(!s.caret_on.get());
    }

    #[test]
    fn drag_selects_and_autoscrolls_outside() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        // ~47 chars at 7.8px: far wider than the 112px inner width
        s.set_text("the quick brown fox jumps over the lazy dog again");
        key(&mut s, Key::Home, Modifiers::empty());
        assert_eq!(s.state.borrow().scroll, 0.0);

        // press inside, near the left
        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(6.0, 13.0),
        ));
        assert!(fx.ctx.hub.drag_active());

        // move within the field: plain selection, no auto-scroll session
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(50.0 + 60.0, 63.0),
        ));
        let (a, b) = s.selection();
        assert!(b > a);
        assert!(!fx.ctx.hub.repeat_active());

        // move far right of the field: the timer session starts scrolling
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(400.0, 63.0),
        ));
        assert!(fx.ctx.hub.repeat_active());
        fx.clock.advance(Duration::from_millis(400));
        fx.ctx.timers.fire_due();
        let scroll_1 = s.state.borrow().scroll;
        assert!(scroll_1 > 0.0);
        fx.clock.advance(Duration::from_millis(30));
        fx.ctx.timers.fire_due();
        assert!(s.state.borrow().scroll > scroll_1);
        let (_, end) = s.selection();
        assert!(end > b);

        // release tears the whole session down
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(400.0, 63.0),
        ));
        assert!(!fx.ctx.hub.drag_active());
        assert!(!fx.ctx.hub.repeat_active());
    }

    #[test]
    fn caret_stays_visible_as_it_moves() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.set_text("abcdefghijklmnopqrstuvwxyz");
        // End put the caret at the end; the field scrolled to show it
        assert!(s.state.borrow().scroll > 0.0);
        key(&mut s, Key::Home, Modifiers::empty());
        assert_eq!(s.state.borrow().scroll, 0.0);
    }

    #[test]
    fn geometry_consistent_across_random_styles() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use veneer_core::StyleValue;

        let fx = Fixture::new();
        let mut s = skin(&fx);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let pad = rng.random_range(0.0..12.0_f32).round();
            let size = rng.random_range(9.0..24.0_f32).round();
            s.styles_mut()
                .put("text_padding", StyleValue::Scalar(pad))
                .unwrap();
            s.styles_mut()
                .put("text_font", StyleValue::Font(FontSpec::new("Sans", size)))
                .unwrap();
            let sz = s.preferred_size();
            assert_eq!(sz.width, s.preferred_width(None));
            assert_eq!(sz.height, s.preferred_height(None));
            // width and height are independent for a single-line field
            assert_eq!(s.preferred_width(Some(sz.height)), sz.width);
            assert_eq!(s.preferred_height(Some(sz.width)), sz.height);
        }
    }

    #[test]
    fn submit_passes_the_text() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let seen = Rc::new(RefCell::new(String::new()));
        let seen2 = seen.clone();
        s.on_submit(move |t| *seen2.borrow_mut() = t.to_string());
        s.set_text("launch");
        s.on_key(&KeyEvent::new(Key::Enter));
        assert_eq!(&*seen.borrow(), "launch");
    }
}
