//! Tree view skin.
//!
//! Rendering and hit-testing go through the visible-row projection: the
//! skin never walks the model itself. Model edits are reported through the
//! `model_*` methods, which forward to the projection and turn the returned
//! patches into repaint regions: an updated row repaints one row strip, a
//! structural edit repaints from the first shifted row down.

use std::rc::Rc;

use veneer_core::{
    Affects, Canvas, ColorRole, Component, FontRole, Key, KeyEvent, Measure, NodeFlags, Patches,
    PointerButton, PointerEvent, PointerPhase, Rect, RowPatch, StyleDefault, StyleKey, StyleStore,
    TreeModel, Vec2, VisibleRows,
};

use crate::{Skin, SkinCtx, bind_component, require_installed};

static STYLE_KEYS: &[StyleKey] = &[
    StyleKey::font("row_font", Affects::Layout, FontRole::Base),
    StyleKey::scalar("row_padding", Affects::Layout, 2.0),
    StyleKey::scalar("indent", Affects::Layout, 16.0),
    StyleKey::scalar("toggle_size", Affects::Layout, 9.0),
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
        "disabled_text_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::DisabledFg),
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
        "highlight_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::HoverBg),
    ),
    StyleKey::color(
        "toggle_color",
        Affects::Paint,
        StyleDefault::ThemeColor(ColorRole::OnSurface),
    ),
];

pub struct TreeSkin {
    ctx: SkinCtx,
    styles: StyleStore,
    component: Option<Component>,
    rows: VisibleRows,
    on_select: Option<Rc<dyn Fn(usize)>>,
}

impl TreeSkin {
    pub fn new(ctx: &SkinCtx, model: Rc<dyn TreeModel>) -> Self {
        Self {
            ctx: ctx.clone(),
            styles: StyleStore::new(STYLE_KEYS, &ctx.theme),
            component: None,
            rows: VisibleRows::new(model),
            on_select: None,
        }
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleStore {
        &mut self.styles
    }

    pub fn rows(&self) -> &VisibleRows {
        &self.rows
    }

    pub fn on_select(&mut self, cb: impl Fn(usize) + 'static) {
        self.on_select = Some(Rc::new(cb));
    }

    pub fn row_height(&self) -> f32 {
        let font = self.styles.font("row_font");
        self.ctx.ruler.line_height(&font) + 2.0 * self.styles.scalar("row_padding")
    }

    // Model edit notifications; call after mutating the model.

    pub fn model_reset(&mut self, model: Rc<dyn TreeModel>) {
        let patches = self.rows.set_root(model);
        self.repaint_patches(&patches);
    }

    pub fn model_child_inserted(&mut self, parent_path: &[usize], index: usize) {
        let patches = self.rows.insert_child(parent_path, index);
        self.repaint_patches(&patches);
    }

    pub fn model_children_removed(&mut self, parent_path: &[usize], index: usize, count: usize) {
        let patches = self.rows.remove_children(parent_path, index, count);
        self.repaint_patches(&patches);
    }

    pub fn model_child_updated(&mut self, parent_path: &[usize], index: usize) {
        let patches = self.rows.update_child(parent_path, index);
        self.repaint_patches(&patches);
    }

    pub fn expand(&mut self, path: &[usize]) {
        let patches = self.rows.expand(path);
        self.repaint_patches(&patches);
    }

    pub fn collapse(&mut self, path: &[usize]) {
        let patches = self.rows.collapse(path);
        self.repaint_patches(&patches);
    }

    fn toggle_row(&mut self, row: usize) {
        let patches = self.rows.toggle(row);
        self.repaint_patches(&patches);
    }

    fn repaint_patches(&self, patches: &Patches) {
        let Some(component) = &self.component else {
            return;
        };
        let b = Rect::from_size(component.bounds().size());
        let row_h = self.row_height();
        for patch in patches {
            let region = match *patch {
                RowPatch::Updated { row } => Rect::new(0.0, row as f32 * row_h, b.w, row_h),
                RowPatch::Inserted { row, .. } | RowPatch::Removed { row, .. } => {
                    let y = row as f32 * row_h;
                    Rect::new(0.0, y, b.w, (b.h - y).max(0.0))
                }
                RowPatch::Reset => b,
            };
            component.repaint_region(region);
        }
    }

    pub fn selected_row(&self) -> Option<usize> {
        (0..self.rows.len()).find(|&i| self.rows.row(i).flags.contains(NodeFlags::SELECTED))
    }

    fn highlighted_row(&self) -> Option<usize> {
        (0..self.rows.len()).find(|&i| self.rows.row(i).flags.contains(NodeFlags::HIGHLIGHTED))
    }

    /// Single selection: clears the old row's flag, sets the new one, and
    /// fires the callback.
    pub fn select_row(&mut self, row: usize) {
        let old = self.selected_row();
        if old == Some(row) {
            return;
        }
        let mut patches = Patches::new();
        if let Some(old) = old {
            patches.extend(self.rows.set_row_flags(old, NodeFlags::SELECTED, false));
        }
        patches.extend(self.rows.set_row_flags(row, NodeFlags::SELECTED, true));
        self.repaint_patches(&patches);
        if let Some(cb) = &self.on_select {
            cb(row);
        }
    }

    fn set_highlight(&mut self, row: Option<usize>) {
        let old = self.highlighted_row();
        if old == row {
            return;
        }
        let mut patches = Patches::new();
        if let Some(old) = old {
            patches.extend(self.rows.set_row_flags(old, NodeFlags::HIGHLIGHTED, false));
        }
        if let Some(row) = row {
            patches.extend(self.rows.set_row_flags(row, NodeFlags::HIGHLIGHTED, true));
        }
        self.repaint_patches(&patches);
    }

    fn row_at(&self, p: Vec2) -> Option<usize> {
        if p.y < 0.0 {
            return None;
        }
        let row = (p.y / self.row_height()) as usize;
        (row < self.rows.len()).then_some(row)
    }

    fn indent_of(&self, row: usize) -> f32 {
        let depth = self.rows.row(row).depth;
        (depth.saturating_sub(1)) as f32 * self.styles.scalar("indent")
    }

    fn toggle_rect(&self, row: usize) -> Rect {
        let size = self.styles.scalar("toggle_size");
        let row_h = self.row_height();
        Rect::new(
            self.indent_of(row),
            row as f32 * row_h + (row_h - size) / 2.0,
            size,
            size,
        )
    }

    fn text_x(&self, row: usize) -> f32 {
        self.indent_of(row) + self.styles.scalar("toggle_size") + 4.0
    }
}

impl Measure for TreeSkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        require_installed(&self.component, "tree");
        let _ = given_height;
        let font = self.styles.font("row_font");
        let mut widest: f32 = 0.0;
        for row in 0..self.rows.len() {
            let text = &self.rows.row(row).item.text;
            let w = self.text_x(row) + self.ctx.ruler.advance(text, &font) + 4.0;
            widest = widest.max(w);
        }
        widest
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        require_installed(&self.component, "tree");
        let _ = given_width;
        self.row_height() * self.rows.len() as f32
    }
}

impl Skin for TreeSkin {
    fn install(&mut self, component: Component) {
        bind_component(&mut self.component, component, "tree");
        let component = self.component.clone().expect("just installed");
        self.styles.attach(&component);
    }

    fn uninstall(&mut self) {
        self.styles.detach();
        if self.component.take().is_some() {
            log::debug!("tree skin uninstalled");
        }
    }

    fn component(&self) -> &Component {
        require_installed(&self.component, "tree")
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        let b = Rect::from_size(self.component().bounds().size());
        canvas.fill_rect(b, self.styles.color("background_color"));

        let row_h = self.row_height();
        if row_h <= 0.0 {
            return;
        }
        let font = self.styles.font("row_font");
        let clip = canvas.clip_bounds().intersect(b);
        let first = (clip.y / row_h).floor().max(0.0) as usize;
        let last = ((clip.bottom() / row_h).ceil() as usize).min(self.rows.len());

        for i in first..last {
            let row = self.rows.row(i);
            let y = i as f32 * row_h;
            let strip = Rect::new(0.0, y, b.w, row_h);
            if row.flags.contains(NodeFlags::SELECTED) {
                canvas.fill_rect(strip, self.styles.color("selection_color"));
            } else if row.flags.contains(NodeFlags::HIGHLIGHTED) {
                canvas.fill_rect(strip, self.styles.color("highlight_color"));
            }

            if row.is_branch() {
                let t = self.toggle_rect(i);
                let color = self.styles.color("toggle_color");
                if row.is_expanded() {
                    canvas.fill_triangle(
                        Vec2::new(t.x, t.y + t.h * 0.25),
                        Vec2::new(t.right(), t.y + t.h * 0.25),
                        Vec2::new(t.x + t.w / 2.0, t.bottom()),
                        color,
                    );
                } else {
                    canvas.fill_triangle(
                        Vec2::new(t.x + t.w * 0.25, t.y),
                        Vec2::new(t.x + t.w * 0.25, t.bottom()),
                        Vec2::new(t.right(), t.y + t.h / 2.0),
                        color,
                    );
                }
            }

            let fg = if row.flags.contains(NodeFlags::DISABLED) {
                self.styles.color("disabled_text_color")
            } else if row.flags.contains(NodeFlags::SELECTED) {
                self.styles.color("selection_text_color")
            } else {
                self.styles.color("text_color")
            };
            canvas.text(
                Vec2::new(self.text_x(i), y + self.styles.scalar("row_padding")),
                row.item.text.clone(),
                &font,
                fg,
            );
        }
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        if !self.component().enabled() {
            return;
        }
        match ev.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                self.set_highlight(self.row_at(ev.position));
            }
            PointerPhase::Leave => self.set_highlight(None),
            PointerPhase::Down(PointerButton::Primary) => {
                let Some(row) = self.row_at(ev.position) else {
                    return;
                };
                if self.rows.row(row).flags.contains(NodeFlags::DISABLED) {
                    return;
                }
                if self.rows.row(row).is_branch() && self.toggle_rect(row).contains(ev.position) {
                    self.toggle_row(row);
                } else {
                    self.select_row(row);
                }
            }
            _ => {}
        }
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        match ev.key {
            Key::ArrowUp => {
                let next = self.selected_row().map_or(0, |r| r.saturating_sub(1));
                self.select_row(next);
            }
            Key::ArrowDown => {
                let next = self.selected_row().map_or(0, |r| (r + 1).min(last));
                self.select_row(next);
            }
            Key::ArrowRight => {
                if let Some(row) = self.selected_row()
                    && self.rows.row(row).is_branch()
                    && !self.rows.row(row).is_expanded()
                {
                    self.toggle_row(row);
                }
            }
            Key::ArrowLeft => {
                if let Some(row) = self.selected_row()
                    && self.rows.row(row).is_branch()
                    && self.rows.row(row).is_expanded()
                {
                    self.toggle_row(row);
                }
            }
            Key::Enter => {
                if let Some(row) = self.selected_row()
                    && self.rows.row(row).is_branch()
                {
                    self.toggle_row(row);
                }
            }
            Key::Home => self.select_row(0),
            Key::End => self.select_row(last),
            _ => {}
        }
    }
}
