//! Typed style stores.
//!
//! Every skin declares a static table of [`StyleKey`]s: name, value kind,
//! whether the key affects measured geometry or appearance only, and a
//! default (constant or theme role). The table is the skin's whole style
//! vocabulary: it is validated when the store is built, `get` never fails
//! for a recognized key, and `remove` resets to the default rather than
//! leaving a hole. The `&str`-keyed surface exists for style sheets and
//! scripting; everything inside the crate goes through the typed accessors.
//!
//! Side-effect policy: a `put` that changes a geometry-affecting key
//! invalidates the attached component (re-layout + repaint); a change to an
//! appearance-only key repaints. Equal-value puts signal nothing.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Color, ColorRole, Component, FontRole, FontSpec, Insets, StyleError, Theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleKind {
    Color,
    Scalar,
    Flag,
    Insets,
    Font,
    Text,
}

/// Which part of the pipeline a key feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affects {
    Layout,
    Paint,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    Color(Color),
    Scalar(f32),
    Flag(bool),
    Insets(Insets),
    Font(FontSpec),
    Text(String),
}

impl StyleValue {
    pub fn kind(&self) -> StyleKind {
        match self {
            StyleValue::Color(_) => StyleKind::Color,
            StyleValue::Scalar(_) => StyleKind::Scalar,
            StyleValue::Flag(_) => StyleKind::Flag,
            StyleValue::Insets(_) => StyleKind::Insets,
            StyleValue::Font(_) => StyleKind::Font,
            StyleValue::Text(_) => StyleKind::Text,
        }
    }
}

/// Default source for a key; theme-role defaults resolve when the store is
/// built so a store never needs the theme again afterwards.
#[derive(Clone, Copy, Debug)]
pub enum StyleDefault {
    Color(Color),
    Scalar(f32),
    Flag(bool),
    Insets(Insets),
    Text(&'static str),
    ThemeColor(ColorRole),
    ThemeFont(FontRole),
}

#[derive(Clone, Copy, Debug)]
pub struct StyleKey {
    pub name: &'static str,
    pub kind: StyleKind,
    pub affects: Affects,
    pub default: StyleDefault,
}

impl StyleKey {
    pub const fn color(name: &'static str, affects: Affects, default: StyleDefault) -> Self {
        Self {
            name,
            kind: StyleKind::Color,
            affects,
            default,
        }
    }

    pub const fn scalar(name: &'static str, affects: Affects, default: f32) -> Self {
        Self {
            name,
            kind: StyleKind::Scalar,
            affects,
            default: StyleDefault::Scalar(default),
        }
    }

    pub const fn flag(name: &'static str, affects: Affects, default: bool) -> Self {
        Self {
            name,
            kind: StyleKind::Flag,
            affects,
            default: StyleDefault::Flag(default),
        }
    }

    pub const fn insets(name: &'static str, affects: Affects, default: Insets) -> Self {
        Self {
            name,
            kind: StyleKind::Insets,
            affects,
            default: StyleDefault::Insets(default),
        }
    }

    pub const fn font(name: &'static str, affects: Affects, role: FontRole) -> Self {
        Self {
            name,
            kind: StyleKind::Font,
            affects,
            default: StyleDefault::ThemeFont(role),
        }
    }

    pub const fn text(name: &'static str, affects: Affects, default: &'static str) -> Self {
        Self {
            name,
            kind: StyleKind::Text,
            affects,
            default: StyleDefault::Text(default),
        }
    }
}

fn resolve_default(default: StyleDefault, theme: &Theme) -> StyleValue {
    match default {
        StyleDefault::Color(c) => StyleValue::Color(c),
        StyleDefault::Scalar(v) => StyleValue::Scalar(v),
        StyleDefault::Flag(v) => StyleValue::Flag(v),
        StyleDefault::Insets(v) => StyleValue::Insets(v),
        StyleDefault::Text(v) => StyleValue::Text(v.to_string()),
        StyleDefault::ThemeColor(role) => StyleValue::Color(theme.color(role)),
        StyleDefault::ThemeFont(role) => StyleValue::Font(theme.font(role)),
    }
}

struct Delegate {
    names: &'static [&'static str],
    target: Rc<RefCell<StyleStore>>,
}

pub struct StyleStore {
    keys: &'static [StyleKey],
    values: HashMap<&'static str, StyleValue>,
    defaults: HashMap<&'static str, StyleValue>,
    component: Option<Component>,
    delegates: Vec<Delegate>,
}

impl StyleStore {
    /// Builds a store over a static key table, seeding every key with its
    /// default resolved against the theme.
    ///
    /// # Panics
    /// Panics when the table is malformed: duplicate names, or a default
    /// whose resolved kind contradicts the key's declared kind.
    pub fn new(keys: &'static [StyleKey], theme: &Theme) -> Self {
        let mut defaults = HashMap::with_capacity(keys.len());
        for key in keys {
            let resolved = resolve_default(key.default, theme);
            assert!(
                resolved.kind() == key.kind,
                "style key `{}` declares {:?} but its default is {:?}",
                key.name,
                key.kind,
                resolved.kind()
            );
            let clash = defaults.insert(key.name, resolved);
            assert!(clash.is_none(), "duplicate style key `{}`", key.name);
        }
        Self {
            keys,
            values: defaults.clone(),
            defaults,
            component: None,
            delegates: Vec::new(),
        }
    }

    pub fn attach(&mut self, component: &Component) {
        self.component = Some(component.clone());
    }

    pub fn detach(&mut self) {
        self.component = None;
    }

    /// Forwards the given key names to another store (one owned by a
    /// sub-skin). Delegated names must not shadow local keys.
    pub fn add_delegate(
        &mut self,
        names: &'static [&'static str],
        target: Rc<RefCell<StyleStore>>,
    ) {
        for name in names {
            assert!(
                !self.keys.iter().any(|k| k.name == *name),
                "delegated style key `{name}` shadows a local key"
            );
        }
        self.delegates.push(Delegate { names, target });
    }

    fn delegate_for(&self, name: &str) -> Option<&Delegate> {
        self.delegates
            .iter()
            .find(|d| d.names.iter().any(|n| *n == name))
    }

    fn lookup(&self, name: &str) -> Option<&StyleKey> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// The local key table; delegated keys are deliberately absent.
    pub fn keys(&self) -> &'static [StyleKey] {
        self.keys
    }

    /// True for every recognized key (explicitly set or not) and for
    /// every delegated key.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some() || self.delegate_for(name).is_some()
    }

    /// # Panics
    /// Panics on an unrecognized key; asking for a key outside the widget's
    /// vocabulary is a programming error.
    pub fn get(&self, name: &str) -> StyleValue {
        if let Some(delegate) = self.delegate_for(name) {
            return delegate.target.borrow().get(name);
        }
        let key = self
            .lookup(name)
            .unwrap_or_else(|| panic!("unknown style key `{name}`"));
        self.values
            .get(key.name)
            .cloned()
            .expect("every recognized key is seeded")
    }

    /// Sets a key, returning the previous value. A [`StyleValue::Text`] is
    /// decoded when the key expects a color, insets, font, scalar, or flag.
    /// On error the store is left untouched.
    pub fn put(&mut self, name: &str, value: StyleValue) -> Result<StyleValue, StyleError> {
        if let Some(delegate) = self.delegate_for(name) {
            return delegate.target.borrow_mut().put(name, value);
        }
        let key = *self
            .lookup(name)
            .ok_or_else(|| StyleError::UnknownKey(name.to_string()))?;
        let coerced = coerce(&key, value)?;
        let previous = self
            .values
            .insert(key.name, coerced.clone())
            .expect("every recognized key is seeded");
        if previous != coerced {
            self.signal(key.affects);
        }
        Ok(previous)
    }

    /// Resets a key to its default, returning the previous value. Recognized
    /// keys are never left undefined.
    ///
    /// # Panics
    /// Panics on an unrecognized key.
    pub fn remove(&mut self, name: &str) -> StyleValue {
        if let Some(delegate) = self.delegate_for(name) {
            return delegate.target.borrow_mut().remove(name);
        }
        let key = *self
            .lookup(name)
            .unwrap_or_else(|| panic!("unknown style key `{name}`"));
        let default = self
            .defaults
            .get(key.name)
            .cloned()
            .expect("every recognized key has a default");
        self.put(name, default)
            .expect("a key's own default always passes its kind check")
    }

    fn signal(&self, affects: Affects) {
        if let Some(component) = &self.component {
            match affects {
                Affects::Layout => component.invalidate(),
                Affects::Paint => component.repaint(),
            }
        }
    }

    // Typed accessors. Kind mismatches panic: the key tables are static, so
    // a mismatch can only be a coding error in the skin itself.

    pub fn color(&self, name: &str) -> Color {
        match self.get(name) {
            StyleValue::Color(c) => c,
            other => panic!("style key `{name}` is not a color (found {:?})", other.kind()),
        }
    }

    pub fn scalar(&self, name: &str) -> f32 {
        match self.get(name) {
            StyleValue::Scalar(v) => v,
            other => panic!("style key `{name}` is not a scalar (found {:?})", other.kind()),
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        match self.get(name) {
            StyleValue::Flag(v) => v,
            other => panic!("style key `{name}` is not a flag (found {:?})", other.kind()),
        }
    }

    pub fn insets(&self, name: &str) -> Insets {
        match self.get(name) {
            StyleValue::Insets(v) => v,
            other => panic!("style key `{name}` is not insets (found {:?})", other.kind()),
        }
    }

    pub fn font(&self, name: &str) -> FontSpec {
        match self.get(name) {
            StyleValue::Font(v) => v,
            other => panic!("style key `{name}` is not a font (found {:?})", other.kind()),
        }
    }

    pub fn text(&self, name: &str) -> String {
        match self.get(name) {
            StyleValue::Text(v) => v,
            other => panic!("style key `{name}` is not text (found {:?})", other.kind()),
        }
    }
}

fn coerce(key: &StyleKey, value: StyleValue) -> Result<StyleValue, StyleError> {
    if value.kind() == key.kind {
        return Ok(value);
    }
    let StyleValue::Text(text) = value else {
        return Err(StyleError::TypeMismatch {
            key: key.name,
            expected: key.kind,
            got: value.kind(),
        });
    };
    let decode_err = || StyleError::Decode {
        key: key.name,
        expected: key.kind,
        text: text.clone(),
    };
    match key.kind {
        StyleKind::Color => Color::parse(&text)
            .map(StyleValue::Color)
            .ok_or_else(decode_err),
        StyleKind::Insets => Insets::parse(&text)
            .map(StyleValue::Insets)
            .ok_or_else(decode_err),
        StyleKind::Font => FontSpec::parse(&text)
            .map(StyleValue::Font)
            .ok_or_else(decode_err),
        StyleKind::Scalar => text
            .trim()
            .parse::<f32>()
            .ok()
            .map(StyleValue::Scalar)
            .ok_or_else(decode_err),
        StyleKind::Flag => match text.trim() {
            "true" => Ok(StyleValue::Flag(true)),
            "false" => Ok(StyleValue::Flag(false)),
            _ => Err(decode_err()),
        },
        StyleKind::Text => unreachable!("equal kinds handled above"),
    }
}

/// Applies a string-keyed sheet (the serialization/scripting boundary).
/// Good entries apply even when others fail; failures come back per key.
pub fn apply_sheet(
    store: &mut StyleStore,
    sheet: &HashMap<String, String>,
) -> Result<usize, crate::SheetError> {
    let mut applied = 0;
    let mut errors = Vec::new();
    for (name, text) in sheet {
        match store.put(name, StyleValue::Text(text.clone())) {
            Ok(_) => applied += 1,
            Err(e) => errors.push((name.clone(), e)),
        }
    }
    if errors.is_empty() {
        Ok(applied)
    } else {
        errors.sort_by(|a, b| a.0.cmp(&b.0));
        Err(crate::SheetError { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentId, RecordingScheduler};

    static TEST_KEYS: &[StyleKey] = &[
        StyleKey::color(
            "handle_color",
            Affects::Paint,
            StyleDefault::ThemeColor(ColorRole::ScrollHandle),
        ),
        StyleKey::scalar("breadth", Affects::Layout, 16.0),
        StyleKey::flag("show_arrows", Affects::Layout, true),
        StyleKey::insets("padding", Affects::Layout, Insets::NONE),
        StyleKey::font("label_font", Affects::Layout, FontRole::Base),
        StyleKey::text("tooltip", Affects::Paint, ""),
    ];

    fn store() -> StyleStore {
        StyleStore::new(TEST_KEYS, &Theme::default())
    }

    #[test]
    fn every_key_round_trips_through_put_and_remove() {
        let theme = Theme::default();
        let mut s = store();
        for key in s.keys() {
            let default = s.get(key.name);
            // defaults match the declared source
            match key.default {
                StyleDefault::ThemeColor(role) => {
                    assert_eq!(default, StyleValue::Color(theme.color(role)));
                }
                StyleDefault::ThemeFont(role) => {
                    assert_eq!(default, StyleValue::Font(theme.font(role)));
                }
                _ => {}
            }
            let replacement = match key.kind {
                StyleKind::Color => StyleValue::Color(Color(1, 2, 3, 4)),
                StyleKind::Scalar => StyleValue::Scalar(42.0),
                StyleKind::Flag => StyleValue::Flag(false),
                StyleKind::Insets => StyleValue::Insets(Insets::uniform(3.0)),
                StyleKind::Font => StyleValue::Font(FontSpec::new("Serif", 9.0)),
                StyleKind::Text => StyleValue::Text("tip".into()),
            };
            let prev = s.put(key.name, replacement.clone()).unwrap();
            assert_eq!(prev, default);
            assert_eq!(s.get(key.name), replacement);
            let prev = s.remove(key.name);
            assert_eq!(prev, replacement);
            assert_eq!(s.get(key.name), default);
        }
    }

    #[test]
    fn string_values_decode_to_the_declared_kind() {
        let mut s = store();
        s.put("handle_color", StyleValue::Text("#010203".into()))
            .unwrap();
        assert_eq!(s.color("handle_color"), Color(1, 2, 3, 255));
        s.put("padding", StyleValue::Text("1,2,3,4".into())).unwrap();
        assert_eq!(s.insets("padding"), Insets::new(1.0, 2.0, 3.0, 4.0));
        s.put("label_font", StyleValue::Text("Serif 11 bold".into()))
            .unwrap();
        assert_eq!(s.font("label_font"), FontSpec::new("Serif", 11.0).bold());
        s.put("breadth", StyleValue::Text("20".into())).unwrap();
        assert_eq!(s.scalar("breadth"), 20.0);
        s.put("show_arrows", StyleValue::Text("false".into())).unwrap();
        assert!(!s.flag("show_arrows"));
    }

    #[test]
    fn bad_put_reports_and_leaves_store_untouched() {
        let mut s = store();
        let before = s.get("breadth");
        let err = s.put("breadth", StyleValue::Flag(true)).unwrap_err();
        assert_eq!(
            err,
            StyleError::TypeMismatch {
                key: "breadth",
                expected: StyleKind::Scalar,
                got: StyleKind::Flag,
            }
        );
        let err = s
            .put("handle_color", StyleValue::Text("not-a-color".into()))
            .unwrap_err();
        assert!(matches!(err, StyleError::Decode { key: "handle_color", .. }));
        assert_eq!(s.get("breadth"), before);
        assert!(matches!(
            s.put("bogus", StyleValue::Scalar(1.0)),
            Err(StyleError::UnknownKey(_))
        ));
    }

    #[test]
    #[should_panic(expected = "unknown style key `bogus`")]
    fn get_of_unknown_key_is_fatal() {
        store().get("bogus");
    }

    #[test]
    fn layout_keys_invalidate_paint_keys_repaint() {
        let sched = RecordingScheduler::new();
        let component = Component::new(ComponentId(9), sched.clone());
        let mut s = store();
        s.attach(&component);

        s.put("handle_color", StyleValue::Color(Color(9, 9, 9, 255)))
            .unwrap();
        assert_eq!(sched.repaint_count(), 1);
        assert_eq!(sched.relayout_count(), 0);

        s.put("breadth", StyleValue::Scalar(24.0)).unwrap();
        assert_eq!(sched.relayout_count(), 1);

        // equal value: no signal
        sched.take();
        s.put("breadth", StyleValue::Scalar(24.0)).unwrap();
        assert_eq!(sched.take(), vec![]);
    }

    #[test]
    fn delegated_keys_forward_and_stay_out_of_local_listing() {
        static INNER_KEYS: &[StyleKey] = &[StyleKey::scalar("list_row_height", Affects::Layout, 18.0)];
        let inner = Rc::new(RefCell::new(StyleStore::new(INNER_KEYS, &Theme::default())));
        let mut outer = store();
        outer.add_delegate(&["list_row_height"], inner.clone());

        assert!(outer.contains("list_row_height"));
        assert!(!outer.keys().iter().any(|k| k.name == "list_row_height"));

        outer.put("list_row_height", StyleValue::Scalar(22.0)).unwrap();
        assert_eq!(inner.borrow().scalar("list_row_height"), 22.0);
        assert_eq!(outer.scalar("list_row_height"), 22.0);
        assert_eq!(outer.remove("list_row_height"), StyleValue::Scalar(22.0));
        assert_eq!(inner.borrow().scalar("list_row_height"), 18.0);
    }

    #[test]
    fn sheet_applies_good_entries_and_reports_bad_ones() {
        let mut s = store();
        let mut sheet = HashMap::new();
        sheet.insert("breadth".to_string(), "18".to_string());
        sheet.insert("handle_color".to_string(), "#445566".to_string());
        sheet.insert("unknown".to_string(), "1".to_string());
        sheet.insert("show_arrows".to_string(), "maybe".to_string());

        let err = apply_sheet(&mut s, &sheet).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(s.scalar("breadth"), 18.0);
        assert_eq!(s.color("handle_color"), Color::from_hex("#445566"));
    }
}
