//! Theme and text-measurement collaborators.
//!
//! The theme is a role-indexed palette and font set; skins never hard-code
//! colors, they resolve a [`ColorRole`] / [`FontRole`] when their style
//! store seeds its defaults. Real text shaping lives outside this crate;
//! [`TextRuler`] is the seam, with [`MonospaceRuler`] as the deterministic
//! stand-in used by tests.

use unicode_segmentation::UnicodeSegmentation;

use crate::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorRole {
    WindowBackground,
    Surface,
    OnSurface,
    Primary,
    OnPrimary,
    Outline,
    Focus,
    ButtonBg,
    ButtonBgHover,
    ButtonBgPressed,
    ScrollTrack,
    ScrollHandle,
    ScrollHandleHover,
    ScrollHandlePressed,
    TitleActive,
    TitleActiveFade,
    TitleInactive,
    TitleText,
    SelectionBg,
    SelectionFg,
    HoverBg,
    DisabledFg,
    Separator,
    HeaderBg,
    Caret,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    Base,
    Title,
    Header,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Parses `"family size"` or `"family size bold"`.
    pub fn parse(text: &str) -> Option<FontSpec> {
        let mut parts = text.split_whitespace().rev();
        let mut tail = parts.next()?;
        let bold = tail.eq_ignore_ascii_case("bold");
        if bold {
            tail = parts.next()?;
        }
        let size: f32 = tail.parse().ok()?;
        if size <= 0.0 {
            return None;
        }
        let family: Vec<&str> = parts.rev().collect();
        if family.is_empty() {
            return None;
        }
        Some(FontSpec {
            family: family.join(" "),
            size,
            bold,
        })
    }
}

/// Role-indexed colors and fonts. Field set follows what the stock skins
/// need; hosts swap the whole theme rather than individual entries.
#[derive(Clone, Debug)]
pub struct Theme {
    pub window_background: Color,
    pub surface: Color,
    pub on_surface: Color,
    pub primary: Color,
    pub on_primary: Color,
    pub outline: Color,
    pub focus: Color,
    pub button_bg: Color,
    pub button_bg_hover: Color,
    pub button_bg_pressed: Color,
    pub scroll_track: Color,
    pub scroll_handle: Color,
    pub scroll_handle_hover: Color,
    pub scroll_handle_pressed: Color,
    pub title_active: Color,
    pub title_active_fade: Color,
    pub title_inactive: Color,
    pub title_text: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub hover_bg: Color,
    pub disabled_fg: Color,
    pub separator: Color,
    pub header_bg: Color,
    pub caret: Color,

    pub base_font: FontSpec,
    pub title_font: FontSpec,
    pub header_font: FontSpec,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            window_background: Color::from_hex("#121212"),
            surface: Color::from_hex("#1E1E1E"),
            on_surface: Color::from_hex("#DDDDDD"),
            primary: Color::from_hex("#34AF82"),
            on_primary: Color::WHITE,
            outline: Color::from_hex("#555555"),
            focus: Color::from_hex("#88CCFF"),
            button_bg: Color::from_hex("#2D2D2D"),
            button_bg_hover: Color::from_hex("#3A3A3A"),
            button_bg_pressed: Color::from_hex("#484848"),
            scroll_track: Color(0xDD, 0xDD, 0xDD, 32),
            scroll_handle: Color(0xDD, 0xDD, 0xDD, 140),
            scroll_handle_hover: Color(0xDD, 0xDD, 0xDD, 180),
            scroll_handle_pressed: Color(0xDD, 0xDD, 0xDD, 220),
            title_active: Color::from_hex("#2B4A6F"),
            title_active_fade: Color::from_hex("#1A2C44"),
            title_inactive: Color::from_hex("#2A2A2A"),
            title_text: Color::from_hex("#EEEEEE"),
            selection_bg: Color::from_hex("#34AF82"),
            selection_fg: Color::WHITE,
            hover_bg: Color::from_hex("#2E3B36"),
            disabled_fg: Color::from_hex("#777777"),
            separator: Color::from_hex("#3C3C3C"),
            header_bg: Color::from_hex("#262626"),
            caret: Color::from_hex("#DDDDDD"),
            base_font: FontSpec::new("Sans", 13.0),
            title_font: FontSpec::new("Sans", 13.0).bold(),
            header_font: FontSpec::new("Sans", 12.0).bold(),
        }
    }
}

impl Theme {
    pub fn color(&self, role: ColorRole) -> Color {
        match role {
            ColorRole::WindowBackground => self.window_background,
            ColorRole::Surface => self.surface,
            ColorRole::OnSurface => self.on_surface,
            ColorRole::Primary => self.primary,
            ColorRole::OnPrimary => self.on_primary,
            ColorRole::Outline => self.outline,
            ColorRole::Focus => self.focus,
            ColorRole::ButtonBg => self.button_bg,
            ColorRole::ButtonBgHover => self.button_bg_hover,
            ColorRole::ButtonBgPressed => self.button_bg_pressed,
            ColorRole::ScrollTrack => self.scroll_track,
            ColorRole::ScrollHandle => self.scroll_handle,
            ColorRole::ScrollHandleHover => self.scroll_handle_hover,
            ColorRole::ScrollHandlePressed => self.scroll_handle_pressed,
            ColorRole::TitleActive => self.title_active,
            ColorRole::TitleActiveFade => self.title_active_fade,
            ColorRole::TitleInactive => self.title_inactive,
            ColorRole::TitleText => self.title_text,
            ColorRole::SelectionBg => self.selection_bg,
            ColorRole::SelectionFg => self.selection_fg,
            ColorRole::HoverBg => self.hover_bg,
            ColorRole::DisabledFg => self.disabled_fg,
            ColorRole::Separator => self.separator,
            ColorRole::HeaderBg => self.header_bg,
            ColorRole::Caret => self.caret,
        }
    }

    pub fn font(&self, role: FontRole) -> FontSpec {
        match role {
            FontRole::Base => self.base_font.clone(),
            FontRole::Title => self.title_font.clone(),
            FontRole::Header => self.header_font.clone(),
        }
    }
}

/// Text measurement seam. `positions` returns the cumulative advance at each
/// grapheme boundary: `positions.len() == graphemes + 1`, `positions[0] == 0`
/// and the last entry is the full advance.
pub trait TextRuler {
    fn positions(&self, text: &str, font: &FontSpec) -> Vec<f32>;
    fn line_height(&self, font: &FontSpec) -> f32;

    fn advance(&self, text: &str, font: &FontSpec) -> f32 {
        *self
            .positions(text, font)
            .last()
            .expect("positions always contains at least the origin")
    }
}

/// Fixed-advance ruler: every grapheme is `aspect * font.size` wide.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceRuler {
    pub aspect: f32,
}

impl Default for MonospaceRuler {
    fn default() -> Self {
        Self { aspect: 0.6 }
    }
}

impl TextRuler for MonospaceRuler {
    fn positions(&self, text: &str, font: &FontSpec) -> Vec<f32> {
        let step = self.aspect * font.size;
        let mut out = Vec::with_capacity(text.len() + 1);
        out.push(0.0);
        let mut x = 0.0;
        for _ in text.graphemes(true) {
            x += step;
            out.push(x);
        }
        out
    }

    fn line_height(&self, font: &FontSpec) -> f32 {
        (font.size * 1.4).ceil()
    }
}

/// Byte offsets of each grapheme boundary; parallel to
/// [`TextRuler::positions`] (last entry is `text.len()`).
pub fn grapheme_offsets(text: &str) -> Vec<usize> {
    let mut out: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
    out.push(text.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_parse() {
        assert_eq!(
            FontSpec::parse("Sans 13"),
            Some(FontSpec::new("Sans", 13.0))
        );
        assert_eq!(
            FontSpec::parse("DejaVu Sans 12 bold"),
            Some(FontSpec::new("DejaVu Sans", 12.0).bold())
        );
        assert_eq!(FontSpec::parse("13"), None);
        assert_eq!(FontSpec::parse("Sans zero"), None);
        assert_eq!(FontSpec::parse("Sans -4"), None);
    }

    #[test]
    fn monospace_positions_count_graphemes() {
        let ruler = MonospaceRuler::default();
        let font = FontSpec::new("Mono", 10.0);
        // thumbs-up + skin tone is one grapheme
        let text = "A\u{1F44D}\u{1F3FD}B";
        let pos = ruler.positions(text, &font);
        assert_eq!(pos.len(), 4);
        assert_eq!(pos[0], 0.0);
        assert_eq!(ruler.advance(text, &font), 18.0);

        let offs = grapheme_offsets(text);
        assert_eq!(offs.len(), 4);
        assert_eq!(*offs.last().unwrap(), text.len());
    }
}
