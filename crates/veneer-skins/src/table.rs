//! Table view skin.
//!
//! Columns are fixed-width or relative-weighted; the available width minus
//! one 1 px separator per internal gap is distributed with each relative
//! column rounded independently. The rounding remainders are deliberately
//! not redistributed, so the summed widths may drift ±1 px from the
//! available width. Long-standing behavior, kept and documented in the
//! tests rather than silently corrected.
//!
//! Row height is one global value: the max preferred height over the column
//! renderers, fixed for the whole table. Rows pass through a filtered
//! projection so hidden rows cost nothing; paint culls against the canvas
//! clip bounds.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use smallvec::{SmallVec, smallvec};
use veneer_core::{
    Affects, Canvas, Color, ColorRole, Component, FontRole, FontSpec, Key, KeyEvent, Measure,
    Modifiers, Patches, PointerButton, PointerEvent, PointerPhase, Rect, RowPatch, StyleDefault,
    StyleKey, StyleStore, TextRuler, Vec2,
};

use crate::{Skin, SkinCtx, bind_component, require_installed};

pub const SEPARATOR_WIDTH: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnWidth {
    Fixed(f32),
    Relative(f32),
}

#[derive(Clone, Debug)]
pub struct Column {
    pub title: String,
    pub width: ColumnWidth,
}

impl Column {
    pub fn fixed(title: impl Into<String>, width: f32) -> Self {
        Self {
            title: title.into(),
            width: ColumnWidth::Fixed(width),
        }
    }

    pub fn relative(title: impl Into<String>, weight: f32) -> Self {
        Self {
            title: title.into(),
            width: ColumnWidth::Relative(weight),
        }
    }
}

/// Shared by the table and its header so a resize drag in one shows up in
/// the other.
pub type ColumnModel = Rc<RefCell<Vec<Column>>>;

/// Distributes `avail` pixels: fixed columns first, 1 px per internal
/// separator, the remainder split by weight with independent rounding.
pub fn column_layout(columns: &[Column], avail: f32) -> SmallVec<[f32; 8]> {
    let separators = columns.len().saturating_sub(1) as f32 * SEPARATOR_WIDTH;
    let fixed: f32 = columns
        .iter()
        .filter_map(|c| match c.width {
            ColumnWidth::Fixed(w) => Some(w),
            ColumnWidth::Relative(_) => None,
        })
        .sum();
    let weight_total: f32 = columns
        .iter()
        .filter_map(|c| match c.width {
            ColumnWidth::Relative(w) => Some(w),
            ColumnWidth::Fixed(_) => None,
        })
        .sum();
    let remaining = (avail - separators - fixed).max(0.0);
    columns
        .iter()
        .map(|c| match c.width {
            ColumnWidth::Fixed(w) => w,
            ColumnWidth::Relative(weight) => {
                if weight_total > 0.0 {
                    (remaining * weight / weight_total).round()
                } else {
                    0.0
                }
            }
        })
        .collect()
}

/// Left edge of each column given the layout widths.
pub fn column_offsets(widths: &[f32]) -> SmallVec<[f32; 8]> {
    let mut out = SmallVec::new();
    let mut x = 0.0;
    for w in widths {
        out.push(x);
        x += w + SEPARATOR_WIDTH;
    }
    out
}

/// Flat read adapter over tabular data.
pub trait TableModel {
    fn row_count(&self) -> usize;
    fn cell(&self, row: usize, column: usize) -> String;
}

/// In-memory table model for fixtures and small tables.
pub struct VecTableModel {
    rows: RefCell<Vec<Vec<String>>>,
}

impl VecTableModel {
    pub fn new(rows: Vec<Vec<String>>) -> Rc<Self> {
        Rc::new(Self {
            rows: RefCell::new(rows),
        })
    }

    pub fn insert_row(&self, at: usize, row: Vec<String>) {
        self.rows.borrow_mut().insert(at, row);
    }

    pub fn remove_rows(&self, at: usize, count: usize) {
        self.rows.borrow_mut().drain(at..at + count);
    }

    pub fn set_cell(&self, row: usize, column: usize, value: impl Into<String>) {
        self.rows.borrow_mut()[row][column] = value.into();
    }
}

impl TableModel for VecTableModel {
    fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    fn cell(&self, row: usize, column: usize) -> String {
        self.rows.borrow()[row][column].clone()
    }
}

/// Ascending model-row indices that pass the filter; the table's flat
/// analogue of the tree projection, patched incrementally per edit.
struct FilteredRows {
    visible: Vec<usize>,
}

impl FilteredRows {
    fn rebuild(&mut self, row_count: usize, pass: &dyn Fn(usize) -> bool) {
        self.visible = (0..row_count).filter(|&r| pass(r)).collect();
    }

    fn view_index(&self, model_row: usize) -> Result<usize, usize> {
        self.visible.binary_search(&model_row)
    }

    fn inserted(&mut self, model_row: usize, passes: bool) -> Patches {
        let at = match self.view_index(model_row) {
            Ok(i) | Err(i) => i,
        };
        for r in &mut self.visible[at..] {
            *r += 1;
        }
        if !passes {
            return Patches::new();
        }
        self.visible.insert(at, model_row);
        smallvec![RowPatch::Inserted { row: at, len: 1 }]
    }

    fn removed(&mut self, model_row: usize, count: usize) -> Patches {
        let start = match self.view_index(model_row) {
            Ok(i) | Err(i) => i,
        };
        let end = match self.view_index(model_row + count) {
            Ok(i) | Err(i) => i,
        };
        self.visible.drain(start..end);
        for r in &mut self.visible[start..] {
            *r -= count;
        }
        if end == start {
            Patches::new()
        } else {
            smallvec![RowPatch::Removed {
                row: start,
                len: end - start,
            }]
        }
    }

    fn updated(&mut self, model_row: usize, passes: bool) -> Patches {
        match (self.view_index(model_row), passes) {
            (Ok(i), true) => smallvec![RowPatch::Updated { row: i }],
            (Ok(i), false) => {
                self.visible.remove(i);
                smallvec![RowPatch::Removed { row: i, len: 1 }]
            }
            (Err(i), true) => {
                self.visible.insert(i, model_row);
                smallvec![RowPatch::Inserted { row: i, len: 1 }]
            }
            (Err(_), false) => Patches::new(),
        }
    }
}

/// Paints one cell kind; the table's row height is the max preferred height
/// across its renderers.
pub trait CellRenderer {
    fn preferred_height(&self, font: &FontSpec, ruler: &dyn TextRuler) -> f32;
    fn paint(
        &self,
        canvas: &mut Canvas,
        rect: Rect,
        text: &str,
        font: &FontSpec,
        color: Color,
    );
}

pub struct TextCellRenderer {
    pub padding: f32,
}

impl Default for TextCellRenderer {
    fn default() -> Self {
        Self { padding: 3.0 }
    }
}

impl CellRenderer for TextCellRenderer {
    fn preferred_height(&self, font: &FontSpec, ruler: &dyn TextRuler) -> f32 {
        ruler.line_height(font) + 2.0 * self.padding
    }

    fn paint(
        &self,
        canvas: &mut Canvas,
        rect: Rect,
        text: &str,
        font: &FontSpec,
        color: Color,
    ) {
        canvas.push_clip(rect);
        canvas.text(
            Vec2::new(rect.x + self.padding, rect.y + self.padding),
            text,
            font,
            color,
        );
        canvas.pop_clip();
    }
}

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::font("cell_font", Affects::Layout, FontRole::Base),
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
        "separator_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::Separator),
    ),
];

pub struct TableSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    model: Rc<dyn TableModel>,
    columns: ColumnModel,
    renderers: Vec<Rc<dyn CellRenderer>>,
    filtered: FilteredRows,
    filter: Option<Rc<dyn Fn(usize) -> bool>>,
    selection: BTreeSet<usize>,
    anchor: Option<usize>,
    on_selection: Option<Rc<dyn Fn(&[usize])>>,
}

impl TableSkin {
    pub fn new(ctx: &SkinCtx, model: Rc<dyn TableModel>, columns: ColumnModel) -> Self {
        let column_count = columns.borrow().len();
        let renderers: Vec<Rc<dyn CellRenderer>> = (0..column_count)
            .map(|_| Rc::new(TextCellRenderer::default()) as Rc<dyn CellRenderer>)
            .collect();
        let mut filtered = FilteredRows {
            visible: Vec::new(),
        };
        filtered.rebuild(model.row_count(), &|_| true);
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            model,
            columns,
            renderers,
            filtered,
            filter: None,
            selection: BTreeSet::new(),
            anchor: None,
            on_selection: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn columns(&self) -> ColumnModel {
        self.columns.clone()
    }

    pub fn set_renderer(&mut self, column: usize, renderer: Rc<dyn CellRenderer>) {
        self.renderers[column] = renderer;
        if let Some(c) = &self.component {
            c.invalidate();
        }
    }

    pub fn on_selection(&mut self, cb: impl Fn(&[usize]) + 'static) {
        self.on_selection = Some(Rc::new(cb));
    }

    /// Selected model rows, ascending.
    pub fn selection(&self) -> Vec<usize> {
        self.selection.iter().copied().collect()
    }

    pub fn visible_len(&self) -> usize {
        self.filtered.visible.len()
    }

    pub fn model_row(&self, view_row: usize) -> usize {
        self.filtered.visible[view_row]
    }

    fn pass(&self, row: usize) -> bool {
        self.filter.as_ref().is_none_or(|f| f(row))
    }

    /// Replaces the filter and rebuilds the projection wholesale.
    pub fn set_filter(&mut self, filter: Option<Rc<dyn Fn(usize) -> bool>>) -> Patches {
        self.filter = filter;
        let pass = self.filter.clone();
        self.filtered.rebuild(self.model.row_count(), &|r| {
            pass.as_ref().is_none_or(|f| f(r))
        });
        self.selection.retain(|&r| {
            self.filter.as_ref().is_none_or(|f| f(r))
        });
        self.repaint_all();
        smallvec![RowPatch::Reset]
    }

    // Model edit notifications; call after mutating the model.

    pub fn rows_inserted(&mut self, at: usize) -> Patches {
        let passes = self.pass(at);
        let patches = self.filtered.inserted(at, passes);
        self.selection = self
            .selection
            .iter()
            .map(|&r| if r >= at { r + 1 } else { r })
            .collect();
        self.repaint_patches(&patches);
        patches
    }

    pub fn rows_removed(&mut self, at: usize, count: usize) -> Patches {
        let patches = self.filtered.removed(at, count);
        self.selection = self
            .selection
            .iter()
            .filter(|&&r| !(at..at + count).contains(&r))
            .map(|&r| if r >= at + count { r - count } else { r })
            .collect();
        self.repaint_patches(&patches);
        patches
    }

    pub fn row_updated(&mut self, at: usize) -> Patches {
        let passes = self.pass(at);
        let patches = self.filtered.updated(at, passes);
        self.repaint_patches(&patches);
        patches
    }

    pub fn row_height(&self) -> f32 {
        let font = self.styles.font("cell_font");
        self.renderers
            .iter()
            .map(|r| r.preferred_height(&font, &*self.ctx.ruler))
            .fold(0.0, f32::max)
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_size(require_installed(&self.component, "table").bounds().size())
    }

    fn repaint_all(&self) {
        if let Some(c) = &self.component {
            c.repaint();
        }
    }

    /// Converts row patches into repaint regions. Inserts and removals
    /// shift everything below them, so they dirty from the first affected
    /// row down; updates dirty their row only.
    fn repaint_patches(&self, patches: &Patches) {
        let Some(component) = &self.component else {
            return;
        };
        let b = self.local_bounds();
        let row_h = self.row_height();
        for patch in patches {
            let region = match *patch {
                RowPatch::Updated { row } => {
                    Rect::new(0.0, row as f32 * row_h, b.w, row_h)
                }
                RowPatch::Inserted { row, .. } | RowPatch::Removed { row, .. } => {
                    let y = row as f32 * row_h;
                    Rect::new(0.0, y, b.w, (b.h - y).max(0.0))
                }
                RowPatch::Reset => b,
            };
            component.repaint_region(region);
        }
    }

    fn view_row_at(&self, p: Vec2) -> Option<usize> {
        let row_h = self.row_height();
        if p.y < 0.0 || row_h <= 0.0 {
            return None;
        }
        let row = (p.y / row_h) as usize;
        (row < self.filtered.visible.len()).then_some(row)
    }

    fn fire_selection(&self) {
        if let Some(cb) = &self.on_selection {
            let rows = self.selection();
            cb(&rows);
        }
    }

    fn select_single(&mut self, model_row: usize) {
        self.selection.clear();
        self.selection.insert(model_row);
        self.anchor = Some(model_row);
        self.fire_selection();
        self.repaint_all();
    }

    fn select_click(&mut self, view_row: usize, modifiers: Modifiers) {
        let model_row = self.filtered.visible[view_row];
        if modifiers.contains(Modifiers::CTRL) {
            if !self.selection.remove(&model_row) {
                self.selection.insert(model_row);
            }
            self.anchor = Some(model_row);
        } else if modifiers.contains(Modifiers::SHIFT) {
            let anchor = self.anchor.unwrap_or(model_row);
            self.selection.clear();
            // the range covers view rows between the two ends
            let a = self.filtered.view_index(anchor).unwrap_or_else(|i| i);
            let b = view_row;
            for v in a.min(b)..=a.max(b).min(self.filtered.visible.len() - 1) {
                self.selection.insert(self.filtered.visible[v]);
            }
        } else {
            self.selection.clear();
            self.selection.insert(model_row);
            self.anchor = Some(model_row);
        }
        self.fire_selection();
        self.repaint_all();
    }

    fn lead_view_row(&self) -> Option<usize> {
        let anchor = self.anchor?;
        self.filtered.view_index(anchor).ok()
    }
}

impl Measure for TableSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "table");
        let _ = given_height;
        // fixed columns at face value, relative ones at 80 px per weight
        let columns = self.columns.borrow();
        let separators = columns.len().saturating_sub(1) as f32 * SEPARATOR_WIDTH;
        columns
            .iter()
            .map(|c| match c.width {
                ColumnWidth::Fixed(w) => w,
                ColumnWidth::Relative(weight) => 80.0 * weight,
            })
            .sum::<f32>()
            + separators
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "table");
        let _ = given_width;
        self.row_height() * self.filtered.visible.len() as f32
    }
}

impl Skin for TableSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "table");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("table skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "table")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = self.local_bounds();
        canvas.fill_rect(b, self.styles.color("background_color"));

        let columns = self.columns.borrow();
        let widths = column_layout(&columns, b.w);
        let offsets = column_offsets(&widths);
        drop(columns);

        let row_h = self.row_height();
        if widths.is_empty() || row_h <= 0.0 {
            return;
        }
        let font = self.styles.font("cell_font");
        let text_color = self.styles.color("text_color");
        let selection_color = self.styles.color("selection_color");
        let selection_text = self.styles.color("selection_text_color");
        let separator = self.styles.color("separator_color");

        // cull to the clip: only rows that can show get painted
        let clip = canvas.clip_bounds().intersect(b);
        let first = (clip.y / row_h).floor().max(0.0) as usize;
        let last = ((clip.bottom() / row_h).ceil() as usize).min(self.filtered.visible.len());

        for view_row in first..last {
            let model_row = self.filtered.visible[view_row];
            let y = view_row as f32 * row_h;
            let selected = self.selection.contains(&model_row);
            if selected {
                canvas.fill_rect(Rect::new(0.0, y, b.w, row_h), selection_color);
            }
            let fg = if selected { selection_text } else { text_color };
            for (col, (&x, &w)) in offsets.iter().zip(widths.iter()).enumerate() {
                let rect = Rect::new(x, y, w, row_h);
                let text = self.model.cell(model_row, col);
                self.renderers[col].paint(canvas, rect, &text, &font, fg);
            }
        }

        // vertical separators across the painted band
        for (&x, &w) in offsets.iter().zip(widths.iter()).take(widths.len() - 1) {
            let sep_x = x + w;
            canvas.fill_rect(
                Rect::new(sep_x, clip.y, SEPARATOR_WIDTH, clip.h),
                separator,
            );
        }
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        if let PointerPhase::Down(PointerButton::Primary) = ev.phase
            && let Some(view_row) = self.view_row_at(ev.position)
        {
            self.select_click(view_row, ev.modifiers);
        }
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        if self.filtered.visible.is_empty() {
            return;
        }
        let last = self.filtered.visible.len() - 1;
        let lead = self.lead_view_row();
        let next = match ev.key {
            Key::ArrowUp => Some(lead.map_or(0, |v| v.saturating_sub(1))),
            Key::ArrowDown => Some(lead.map_or(0, |v| (v + 1).min(last))),
            Key::Home => Some(0),
            Key::End => Some(last),
            _ => None,
        };
        if let Some(view_row) = next {
            self.select_single(self.filtered.visible[view_row]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use std::cell::Cell;

    fn columns() -> ColumnModel {
        Rc::new(RefCell::new(vec![
            Column::fixed("id", 50.0),
            Column::relative("name", 1.0),
            Column::relative("path", 2.0),
        ]))
    }

    fn model() -> Rc<VecTableModel> {
        VecTableModel::new(
            (0..8)
                .map(|i| vec![format!("{i}"), format!("row {i}"), format!("/tmp/{i}")])
                .collect(),
        )
    }

    fn skin(fx: &Fixture) -> TableSkin {
        let mut s = TableSkin::new(&fx.ctx, model(), columns());
        s.install(fx.component(Rect::new(0.0, 0.0, 200.0, 300.0)));
        s
    }

    #[test]
    fn column_distribution_spec_case() {
        let cols = columns();
        let widths = column_layout(&cols.borrow(), 200.0);
        // 50 fixed + 2 separators leave 148 to split 1:2
        assert_eq!(widths.as_slice(), &[50.0, 49.0, 99.0]);
        let total: f32 = widths.iter().sum::<f32>() + 2.0 * SEPARATOR_WIDTH;
        assert!((total - 200.0).abs() <= 1.0);
    }

    #[test]
    fn rounding_drift_stays_within_one_pixel() {
        // three equal weights over 100 px: 33.33 rounds to 33 thrice, and
        // the lost pixel is not redistributed
        let cols = vec![
            Column::relative("a", 1.0),
            Column::relative("b", 1.0),
            Column::relative("c", 1.0),
        ];
        let widths = column_layout(&cols, 102.0);
        assert_eq!(widths.as_slice(), &[33.0, 33.0, 33.0]);
        let total: f32 = widths.iter().sum::<f32>() + 2.0 * SEPARATOR_WIDTH;
        assert_eq!(total, 101.0); // one short of 102: the documented drift
    }

    #[test]
    fn row_height_is_global_max_of_renderers() {
        struct Tall;
        impl CellRenderer for Tall {
            fn preferred_height(&self, _font: &FontSpec, _ruler: &dyn TextRuler) -> f32 {
                40.0
            }
            fn paint(
                &self,
                _canvas: &mut Canvas,
                _rect: Rect,
                _text: &str,
                _font: &FontSpec,
                _color: Color,
            ) {
            }
        }
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let base = s.row_height();
        s.set_renderer(1, Rc::new(Tall));
        assert_eq!(s.row_height(), 40.0);
        assert!(base < 40.0);
        assert_eq!(s.preferred_height(None), 40.0 * 8.0);
    }

    #[test]
    fn click_selection_modes() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let row_h = s.row_height();
        let at = |row: usize| Vec2::new(10.0, (row as f32 + 0.5) * row_h);
        let click = |s: &mut TableSkin, row: usize, m: Modifiers| {
            s.on_pointer(
                &PointerEvent::new(PointerPhase::Down(PointerButton::Primary), at(row))
                    .with_modifiers(m),
            );
        };

        click(&mut s, 2, Modifiers::empty());
        assert_eq!(s.selection(), vec![2]);

        click(&mut s, 5, Modifiers::SHIFT);
        assert_eq!(s.selection(), vec![2, 3, 4, 5]);

        click(&mut s, 3, Modifiers::CTRL); // toggle off
        assert_eq!(s.selection(), vec![2, 4, 5]);

        click(&mut s, 3, Modifiers::CTRL); // toggle back on
        assert_eq!(s.selection(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn filter_and_edits_patch_the_projection() {
        let fx = Fixture::new();
        let m = model();
        let mut s = TableSkin::new(&fx.ctx, m.clone(), columns());
        s.install(fx.component(Rect::new(0.0, 0.0, 200.0, 300.0)));

        // content filter: anything named "hidden" disappears
        let mc = m.clone();
        s.set_filter(Some(Rc::new(move |r| mc.cell(r, 1) != "hidden")));
        assert_eq!(s.visible_len(), 8);

        // an update can flip a row's visibility either way
        m.set_cell(3, 1, "hidden");
        let patches = s.row_updated(3);
        assert_eq!(patches.as_slice(), &[RowPatch::Removed { row: 3, len: 1 }]);
        assert_eq!(s.visible_len(), 7);

        m.set_cell(3, 1, "row 3 again");
        let patches = s.row_updated(3);
        assert_eq!(patches.as_slice(), &[RowPatch::Inserted { row: 3, len: 1 }]);

        // plain content edit on a visible row: one-row patch
        m.set_cell(5, 1, "renamed");
        let patches = s.row_updated(5);
        assert_eq!(patches.as_slice(), &[RowPatch::Updated { row: 5 }]);

        // structural edits shift the projection
        m.insert_row(2, vec!["x".into(), "x".into(), "x".into()]);
        let patches = s.rows_inserted(2);
        assert_eq!(patches.as_slice(), &[RowPatch::Inserted { row: 2, len: 1 }]);
        assert_eq!(s.visible_len(), 9);

        m.remove_rows(2, 1);
        let patches = s.rows_removed(2, 1);
        assert_eq!(patches.as_slice(), &[RowPatch::Removed { row: 2, len: 1 }]);
        assert_eq!(s.visible_len(), 8);
    }

    #[test]
    fn selection_follows_model_edits() {
        let fx = Fixture::new();
        let m = model();
        let mut s = TableSkin::new(&fx.ctx, m.clone(), columns());
        s.install(fx.component(Rect::new(0.0, 0.0, 200.0, 300.0)));

        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        s.on_selection(move |_| f.set(f.get() + 1));

        s.on_pointer(&PointerEvent::new(
            PointerPhase::Down(PointerButton::Primary),
            Vec2::new(10.0, s.row_height() * 4.5),
        ));
        assert_eq!(s.selection(), vec![4]);
        assert_eq!(fired.get(), 1);

        m.insert_row(0, vec!["new".into(), "new".into(), "new".into()]);
        s.rows_inserted(0);
        assert_eq!(s.selection(), vec![5]);

        m.remove_rows(5, 1);
        s.rows_removed(5, 1);
        assert_eq!(s.selection(), Vec::<usize>::new());
    }

    #[test]
    fn paint_culls_to_clip_bounds() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        let row_h = s.row_height();
        let mut canvas = Canvas::new(veneer_core::Size::new(200.0, 300.0));
        // clip to rows 2..4 only
        canvas.push_clip(Rect::new(0.0, row_h * 2.0, 200.0, row_h * 2.0));
        s.paint(&mut canvas);
        canvas.pop_clip();

        let texts: Vec<String> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                veneer_core::PaintOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"row 2".to_string()));
        assert!(texts.contains(&"row 3".to_string()));
        assert!(!texts.contains(&"row 6".to_string()));
    }

    #[test]
    fn keyboard_moves_the_selection() {
        let fx = Fixture::new();
        let mut s = skin(&fx);
        s.on_key(&KeyEvent::new(Key::ArrowDown));
        assert_eq!(s.selection(), vec![0]);
        s.on_key(&KeyEvent::new(Key::ArrowDown));
        assert_eq!(s.selection(), vec![1]);
        s.on_key(&KeyEvent::new(Key::End));
        assert_eq!(s.selection(), vec![7]);
        s.on_key(&KeyEvent::new(Key::ArrowUp));
        assert_eq!(s.selection(), vec![6]);
    }
}
