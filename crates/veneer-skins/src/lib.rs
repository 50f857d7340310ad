//! # Veneer skins
//!
//! One module per widget type, each exporting a `*Skin`: the object that
//! paints a component, answers its geometry queries, and turns raw pointer
//! and key events into semantic state changes (selection, scrolling,
//! resizing, expansion). Skins are selected per widget type through the
//! [`AnySkin`] variant rather than an inheritance tree; the shared behavior
//! lives in `veneer-core` (style stores, interaction sessions, row
//! projection) and in the [`Skin`] trait below.
//!
//! A skin is inert until [`Skin::install`] binds it to a [`Component`];
//! installing twice, or asking for geometry before installing, is a
//! programming error and panics. Uninstalling tears down every live
//! session (grabs, timers) through RAII handles.

use std::rc::Rc;

use veneer_core::{
    Canvas, Component, KeyEvent, Measure, MonospaceRuler, PointerEvent, TextRuler, Theme, Timers,
};

pub mod frame;
pub mod header;
pub mod list;
pub mod list_button;
pub mod scrollbar;
pub mod table;
pub mod tabs;
pub mod text_input;
pub mod track;
pub mod tree;

pub use frame::FrameSkin;
pub use header::TableHeaderSkin;
pub use list::ListViewSkin;
pub use list_button::ListButtonSkin;
pub use scrollbar::ScrollBarSkin;
pub use table::TableSkin;
pub use tabs::TabPaneSkin;
pub use text_input::TextInputSkin;
pub use tree::TreeSkin;

/// Shared collaborators handed to every skin at construction.
#[derive(Clone)]
pub struct SkinCtx {
    pub hub: veneer_core::DisplayHub,
    pub timers: Timers,
    pub theme: Rc<Theme>,
    pub ruler: Rc<dyn TextRuler>,
}

impl SkinCtx {
    pub fn new(
        hub: veneer_core::DisplayHub,
        timers: Timers,
        theme: Rc<Theme>,
        ruler: Rc<dyn TextRuler>,
    ) -> Self {
        Self {
            hub,
            timers,
            theme,
            ruler,
        }
    }

    /// Context with default theme and the fixed-advance ruler; what tests
    /// and headless tools use.
    pub fn plain(hub: veneer_core::DisplayHub, timers: Timers) -> Self {
        Self {
            hub,
            timers,
            theme: Rc::new(Theme::default()),
            ruler: Rc::new(MonospaceRuler::default()),
        }
    }
}

/// The paint/layout/event strategy bound to one component.
pub trait Skin: Measure {
    /// Binds the skin to its component and subscribes its listeners.
    ///
    /// # Panics
    /// Panics when the skin is already installed.
    fn install(&mut self, component: Component);

    /// Releases the component and every live session. Safe to call when not
    /// installed.
    fn uninstall(&mut self);

    /// # Panics
    /// Panics when the skin is not installed.
    fn component(&self) -> &Component;

    fn paint(&mut self, canvas: &mut Canvas);

    /// Pointer events in the component's local coordinate space.
    fn on_pointer(&mut self, ev: &PointerEvent) {
        let _ = ev;
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        let _ = ev;
    }
}

/// Widget-type dispatch for hosts that store skins uniformly.
pub enum AnySkin {
    Frame(FrameSkin),
    ScrollBar(ScrollBarSkin),
    TabPane(TabPaneSkin),
    Table(TableSkin),
    TableHeader(TableHeaderSkin),
    Tree(TreeSkin),
    ListView(ListViewSkin),
    ListButton(ListButtonSkin),
    TextInput(TextInputSkin),
}

macro_rules! each_skin {
    ($self:ident, $skin:ident => $body:expr) => {
        match $self {
            AnySkin::Frame($skin) => $body,
            AnySkin::ScrollBar($skin) => $body,
            AnySkin::TabPane($skin) => $body,
            AnySkin::Table($skin) => $body,
            AnySkin::TableHeader($skin) => $body,
            AnySkin::Tree($skin) => $body,
            AnySkin::ListView($skin) => $body,
            AnySkin::ListButton($skin) => $body,
            AnySkin::TextInput($skin) => $body,
        }
    };
}

impl Measure for AnySkin {
    fn preferred_width(&self, given_height: Option<f32>) -> f32 {
        each_skin!(self, s => s.preferred_width(given_height))
    }

    fn preferred_height(&self, given_width: Option<f32>) -> f32 {
        each_skin!(self, s => s.preferred_height(given_width))
    }

    fn preferred_size(&self) -> veneer_core::Size {
        each_skin!(self, s => s.preferred_size())
    }
}

impl Skin for AnySkin {
    fn install(&mut self, component: Component) {
        each_skin!(self, s => s.install(component))
    }

    fn uninstall(&mut self) {
        each_skin!(self, s => s.uninstall())
    }

    fn component(&self) -> &Component {
        each_skin!(self, s => s.component())
    }

    fn paint(&mut self, canvas: &mut Canvas) {
        each_skin!(self, s => s.paint(canvas))
    }

    fn on_pointer(&mut self, ev: &PointerEvent) {
        each_skin!(self, s => s.on_pointer(ev))
    }

    fn on_key(&mut self, ev: &KeyEvent) {
        each_skin!(self, s => s.on_key(ev))
    }
}

/// Install/uninstall boilerplate shared by the skin modules.
pub(crate) fn bind_component(
    slot: &mut Option<Component>,
    component: Component,
    what: &'static str,
) {
    assert!(slot.is_none(), "{what} skin is already installed");
    log::debug!("{what} skin installed on component {:?}", component.id());
    *slot = Some(component);
}

pub(crate) fn require_installed<'a>(
    slot: &'a Option<Component>,
    what: &'static str,
) -> &'a Component {
    slot.as_ref()
        .unwrap_or_else(|| panic!("{what} skin is not installed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrollbar::Orientation;
    use crate::testutil::Fixture;
    use veneer_core::Rect;

    #[test]
    fn any_skin_dispatches_by_variant() {
        let fx = Fixture::new();
        let mut skin = AnySkin::ScrollBar(ScrollBarSkin::new(&fx.ctx, Orientation::Vertical));
        skin.install(fx.component(Rect::new(0.0, 0.0, 16.0, 232.0)));
        assert_eq!(skin.preferred_width(None), 16.0);
        let mut canvas = Canvas::new(veneer_core::Size::new(16.0, 232.0));
        skin.paint(&mut canvas);
        assert!(!canvas.ops().is_empty());
        skin.uninstall();
    }

    #[test]
    #[should_panic(expected = "already installed")]
    fn double_install_is_fatal() {
        let fx = Fixture::new();
        let mut skin = ScrollBarSkin::new(&fx.ctx, Orientation::Vertical);
        skin.install(fx.component(Rect::new(0.0, 0.0, 16.0, 100.0)));
        skin.install(fx.component(Rect::new(0.0, 0.0, 16.0, 100.0)));
    }
}
