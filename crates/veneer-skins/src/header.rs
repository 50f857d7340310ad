//! Table header skin: column captions, click-to-sort with a direction
//! triangle, and drag-to-resize at the separator hot-zones.
//!
//! The header shares its [`ColumnModel`](crate::table::ColumnModel) with
//! the table skin; a resize drag overwrites the dragged column's width with
//! a fixed pixel width and reports the change so the host can re-lay both
//! components out.

use std::cell::Cell;
use std::rc::Rc;

use veneer_core::{
    Affects, Canvas, ColorRole, Component, DragHandle, FontRole, GrabControl, Measure,
    PointerButton, PointerEvent, PointerPhase, Rect, StyleDefault, StyleKey, StyleStore, Vec2,
};

use crate::table::{Column, ColumnModel, ColumnWidth, column_layout, column_offsets};
use crate::{Skin, SkinCtx, bind_component, require_installed};

/// Half-width of the resize hot-zone straddling each separator.
const RESIZE_GRIP: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::font("header_font", Affects::Layout, FontRole::Header),
    StyleKey::scalar("header_padding", Affects::Layout, 4.0),
    StyleKey::scalar("min_column_width", Affects::Layout, 20.0),
    StyleKey::color(
        "background_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::HeaderBg),
    ),
    StyleKey::color(
        "text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
    StyleKey::color(
        "hover_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::HoverBg),
    ),
    StyleKey::color(
        "pressed_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::ButtonBgPressed),
    ),
    StyleKey::color(
        "separator_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Separator),
    ),
    StyleKey::color(
        "sort_arrow_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Primary),
    ),
];

pub struct TableHeaderSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    columns: ColumnModel,
    sort: Option<(usize, SortDirection)>,
    hover: Option<usize>,
    pressed: Rc<Cell<Option<usize>>>,
    drag: Option<DragHandle>,
    on_sort: Option<Rc<dyn Fn(usize, SortDirection)>>,
    on_columns_changed: Option<Rc<dyn Fn()>>,
}

impl TableHeaderSkin {
    pub fn new(ctx: &SkinCtx, columns: ColumnModel) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            columns,
            sort: None,
            hover: None,
            pressed: Rc::new(Cell::new(None)),
            drag: None,
            on_sort: None,
            on_columns_changed: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn sort(&self) -> Option<(usize, SortDirection)> {
        self.sort
    }

    pub fn on_sort(&mut self, cb: impl Fn(usize, SortDirection) + 'static) {
        self.on_sort = Some(Rc::new(cb));
    }

    /// Fires whenever a resize drag rewrites a column width.
    pub fn on_columns_changed(&mut self, cb: impl Fn() + 'static) {
        self.on_columns_changed = Some(Rc::new(cb));
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_size(
            require_installed(&self.component, "table header")
                .bounds()
                .size(),
        )
    }

    fn layout(&self) -> (Vec<f32>, Vec<f32>) {
        let columns = self.columns.borrow();
        let widths = column_layout(&columns, self.local_bounds().w);
        let offsets = column_offsets(&widths);
        (widths.to_vec(), offsets.to_vec())
    }

    /// Separator index whose hot-zone contains `x`, if any. Separator `i`
    /// sits between columns `i` and `i + 1`.
    pub fn separator_at(&self, x: f32) -> Option<usize> {
        let (widths, offsets) = self.layout();
        (0..widths.len().saturating_sub(1)).find(|&i| {
            let sep_x = offsets[i] + widths[i];
            (x - sep_x).abs() <= RESIZE_GRIP
        })
    }

    fn column_at(&self, x: f32) -> Option<usize> {
        let (widths, offsets) = self.layout();
        (0..widths.len()).find(|&i| x >= offsets[i] && x < offsets[i] + widths[i])
    }

    /// Hosts use this for cursor feedback over the resize zones.
    pub fn wants_resize_cursor(&self, p: Vec2) -> bool {
        self.local_bounds().contains(p) && self.separator_at(p.x).is_some()
    }

    fn begin_resize(&mut self, column: usize) {
        let component = self.component().clone();
        let columns = self.columns.clone();
        let min_width = self.styles.scalar("min_column_width");
        let (_, offsets) = self.layout();
        let column_start = offsets[column];
        let pressed = self.pressed.clone();
        let changed = self.on_columns_changed.clone();
        self.drag = None;
        self.drag = Some(self.ctx.hub.begin_drag(move |ev| match ev.phase {
            PointerPhase::Move => {
                let local_x = ev.position.x - component.bounds().x;
                let width = (local_x - column_start).max(min_width);
                columns.borrow_mut()[column].width = ColumnWidth::Fixed(width);
                if let Some(cb) = &changed {
                    cb();
                }
                component.invalidate();
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

    fn toggle_sort(&mut self, column: usize) {
        let direction = match self.sort {
            Some((c, SortDirection::Ascending)) if c == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.sort = Some((column, direction));
        if let Some(cb) = &self.on_sort {
            cb(column, direction);
        }
        self.component().repaint();
    }

    pub fn header_height(&self) -> f32 {
        let font = self.styles.font("header_font");
        self.ctx.ruler.line_height(&font) + 2.0 * self.styles.scalar("header_padding")
    }
}

impl Measure for TableHeaderSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "table header");
        let _ = given_height;
        // captions at face width, plus padding and separators
        let font = self.styles.font("header_font");
        let pad = self.styles.scalar("header_padding");
        let columns = self.columns.borrow();
        let captions: f32 = columns
            .iter()
            .map(|c: &Column| self.ctx.ruler.advance(&c.title, &font) + 2.0 * pad)
            .sum();
        captions + columns.len().saturating_sub(1) as f32
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "table header");
        let _ = given_width;
        self.header_height()
    }
}

impl Skin for TableHeaderSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "table header");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        self.drag = None;
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("table header skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "table header")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = self.local_bounds();
        canvas.fill_rect(b, self.styles.color("background_color"));

        let (widths, offsets) = self.layout();
        let font = self.styles.font("header_font");
        let pad = self.styles.scalar("header_padding");
        let text_color = self.styles.color("text_color");
        let separator = self.styles.color("separator_color");

        let columns = self.columns.borrow();
        for i in 0..columns.len() {
            let rect = Rect::new(offsets[i], 0.0, widths[i], b.h);
            if self.pressed.get() == Some(i) {
                canvas.fill_rect(rect, self.styles.color("pressed_color"));
            } else if self.hover == Some(i) {
                canvas.fill_rect(rect, self.styles.color("hover_color"));
            }
            canvas.push_clip(rect);
            canvas.text(
                Vec2::new(rect.x + pad, rect.y + pad),
                columns[i].title.clone(),
                &font,
                text_color,
            );
            canvas.pop_clip();

            if let Some((sort_col, direction)) = self.sort
                && sort_col == i
            {
                let size = 4.0;
                let cx = rect.right() - pad - size;
                let cy = rect.y + rect.h / 2.0;
                let color = self.styles.color("sort_arrow_color");
                let (tip, base) = match direction {
                    SortDirection::Ascending => (cy - size / 2.0, cy + size / 2.0),
                    SortDirection::Descending => (cy + size / 2.0, cy - size / 2.0),
                };
                canvas.fill_triangle(
                    Vec2::new(cx, tip),
                    Vec2::new(cx - size, base),
                    Vec2::new(cx + size, base),
                    color,
                );
            }

            if i + 1 < columns.len() {
                let sep_x = offsets[i] + widths[i];
                canvas.fill_rect(Rect::new(sep_x, 0.0, 1.0, b.h), separator);
            }
        }
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                let hover = if self.separator_at(ev.position.x).is_some() {
                    None
                } else {
                    self.column_at(ev.position.x)
                };
                if self.hover != hover {
                    self.hover = hover;
                    self.component().repaint();
                }
            }
            PointerPhase::Down(PointerButton::Primary) => {
                if let Some(sep) = self.separator_at(ev.position.x) {
                    self.begin_resize(sep);
                } else if let Some(col) = self.column_at(ev.position.x) {
                    self.pressed.set(Some(col));
                    self.component().repaint();
                }
            }
            PointerPhase::Up(PointerButton::Primary) => {
                if let Some(col) = self.pressed.replace(None) {
                    self.component().repaint();
                    if self.column_at(ev.position.x) == Some(col) {
                        self.toggle_sort(col);
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
    use crate::table::Column;
    use crate::testutil::Fixture;
    use std::cell::RefCell;

    fn columns() -> ColumnModel {
        Rc::new(RefCell::new(vec![
            Column::fixed("id", 50.0),
            Column::relative("name", 1.0),
            Column::relative("path", 2.0),
        ]))
    }

    fn skin(fx: &Fixture) -> (TableHeaderSkin, ColumnModel) {
        let cols = columns();
        let mut s = TableHeaderSkin::new(&fx.ctx, cols.clone());
        s.install(fx.component(Rect::new(50.0, 0.0, 200.0, 24.0)));
        (s, cols)
    }

    #[test]
    fn separator_hot_zones() {
        let fx = Fixture::new();
        let (s, _) = skin(&fx);
        // widths 50, 49, 99 → separators at x = 50 and x = 100
        assert_eq!(s.separator_at(50.0), Some(0));
        assert_eq!(s.separator_at(52.5), Some(0));
        assert_eq!(s.separator_at(55.0), None);
        assert_eq!(s.separator_at(99.0), Some(1));
        assert!(s.wants_resize_cursor(Vec2::new(50.0, 10.0)));
        assert!(!s.wants_resize_cursor(Vec2::new(70.0, 10.0)));
    }

    #[test]
    fn resize_drag_rewrites_the_column_as_fixed() {
        let fx = Fixture::new();
        let (mut s, cols) = skin(&fx);
        let changed = Rc::new(Cell::new(0));
        let ch = changed.clone();
        s.on_columns_changed(move || ch.set(ch.get() + 1));

        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(50.0, 10.0),
        ));
        assert!(fx.ctx.hub.drag_active());

        // display x = 130 → local x = 80 → column 0 becomes 80 px wide
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(130.0, 10.0),
        ));
        assert_eq!(cols.borrow()[0].width, ColumnWidth::Fixed(80.0));
        assert_eq!(changed.get(), 1);

        // dragging past the left edge clamps at the minimum width
        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Move,
            Vec2::new(0.0, 10.0),
        ));
        assert_eq!(cols.borrow()[0].width, ColumnWidth::Fixed(20.0));

        fx.ctx.hub.dispatch(&PointerEvent::new(
            PointerPhase::Up(PointerButton::Primary),
            Vec2::new(0.0, 10.0),
        ));
        assert!(!fx.ctx.hub.drag_active());
    }

    #[test]
    fn click_toggles_sort_direction() {
        let fx = Fixture::new();
        let (mut s, _) = skin(&fx);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        s.on_sort(move |c, d| seen2.borrow_mut().push((c, d)));

        let click = |s: &mut TableHeaderSkin, x: f32| {
            s.on_pointer(&PointerEvent::new(
                PointerPhase::Down(PointerButton::Primary),
                Vec2::new(x, 10.0),
            ));
            s.on_pointer(&PointerEvent::new(
                PointerPhase::Up(PointerButton::Primary),
                Vec2::new(x, 10.0),
            ));
        };

        click(&mut s, 70.0); // "name" column
        assert_eq!(s.sort(), Some((1, SortDirection::Ascending)));
        click(&mut s, 70.0);
        assert_eq!(s.sort(), Some((1, SortDirection::Descending)));
        click(&mut s, 70.0);
        assert_eq!(s.sort(), Some((1, SortDirection::Ascending)));
        click(&mut s, 120.0); // other column resets to ascending
        assert_eq!(s.sort(), Some((2, SortDirection::Ascending)));
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn header_height_follows_font_and_padding() {
        let fx = Fixture::new();
        let (mut s, _) = skin(&fx);
        let h0 = s.preferred_height(None);
        s.styles_mut()
            .put("header_padding", veneer_core::StyleValue::Scalar(8.0))
            .unwrap();
        assert_eq!(s.preferred_height(None), h0 + 8.0);
        assert_eq!(s.preferred_size().height, s.preferred_height(None));
    }
}
