#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: size.width,
            h: size.height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.w,
            height: self.h,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            w: self.w,
            h: self.h,
        }
    }

    /// Intersection; degenerates to an empty rect when the two do not overlap.
    pub fn intersect(&self, other: Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        Rect {
            x,
            y,
            w: (r - x).max(0.0),
            h: (b - y).max(0.0),
        }
    }

    pub fn intersects(&self, other: Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rect covering both. An empty rect is treated as a hole.
    pub fn union(&self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Padding/border thickness around a content box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Insets {
    pub const NONE: Insets = Insets {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    pub fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            left: v,
            bottom: v,
            right: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn shrink(&self, r: Rect) -> Rect {
        Rect {
            x: r.x + self.left,
            y: r.y + self.top,
            w: (r.w - self.horizontal()).max(0.0),
            h: (r.h - self.vertical()).max(0.0),
        }
    }

    pub fn grow(&self, s: Size) -> Size {
        Size {
            width: s.width + self.horizontal(),
            height: s.height + self.vertical(),
        }
    }

    /// Parses `"top,left,bottom,right"` (whitespace tolerated).
    pub fn parse(text: &str) -> Option<Insets> {
        let mut parts = text.split(',').map(|p| p.trim().parse::<f32>());
        let top = parts.next()?.ok()?;
        let left = parts.next()?.ok()?;
        let bottom = parts.next()?.ok()?;
        let right = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Insets::new(top, left, bottom, right))
    }
}

/// Preferred-size contract every skin answers.
///
/// `preferred_width(Some(h))` is the width the widget wants when it is known
/// to be exactly `h` tall; `None` asks for the natural, unconstrained width.
/// `preferred_size` must agree with the two unconstrained queries whenever
/// width and height are independent. Widgets whose dimensions depend on each
/// other (wrapped text) may instead return a fixed point obtained by
/// evaluating both queries and re-deriving once, and must say so in their
/// docs. Insets are additive constants and must affect all three queries
/// identically.
pub trait Measure {
    fn preferred_width(&self, given_height: Option<f32>) -> f32;
    fn preferred_height(&self, given_width: Option<f32>) -> f32;

    fn preferred_size(&self) -> Size {
        Size {
            width: self.preferred_width(None),
            height: self.preferred_height(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_and_edges() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains(Vec2::new(50.0, 30.0)));
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(110.0, 60.0)));
        assert!(!r.contains(Vec2::new(5.0, 30.0)));
        assert!(!r.contains(Vec2::new(50.0, 70.0)));
    }

    #[test]
    fn rect_intersect_disjoint_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert!(a.intersect(b).is_empty());
        assert!(!a.intersects(b));
    }

    #[test]
    fn rect_union_ignores_empty() {
        let a = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(Rect::default().union(a), a);
        assert_eq!(a.union(Rect::default()), a);
        let b = Rect::new(0.0, 0.0, 2.0, 2.0);
        let u = a.union(b);
        assert_eq!(u, Rect::new(0.0, 0.0, 15.0, 15.0));
    }

    #[test]
    fn insets_shrink_grow_are_symmetric() {
        let ins = Insets::new(2.0, 4.0, 6.0, 8.0);
        let r = Rect::new(0.0, 0.0, 100.0, 60.0);
        let inner = ins.shrink(r);
        assert_eq!(inner, Rect::new(4.0, 2.0, 88.0, 52.0));
        assert_eq!(ins.grow(inner.size()), r.size());
    }

    #[test]
    fn insets_parse() {
        assert_eq!(
            Insets::parse("1, 2, 3, 4"),
            Some(Insets::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(Insets::parse("1,2,3"), None);
        assert_eq!(Insets::parse("1,2,3,4,5"), None);
        assert_eq!(Insets::parse("a,b,c,d"), None);
    }
}
