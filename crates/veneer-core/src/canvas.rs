//! Display-list canvas.
//!
//! Skins paint by appending ops to a [`Canvas`]; a rendering backend replays
//! the list against whatever 2D surface the host uses. Coordinates are
//! resolved at record time: `push_translate` shifts subsequent ops,
//! `push_clip` narrows the clip, and [`Canvas::clip_bounds`] reports the
//! current clip in local coordinates so skins can cull rows that cannot be
//! visible.

use crate::{Brush, Color, FontSpec, Rect, Size, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    FillRect {
        rect: Rect,
        brush: Brush,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    FillTriangle {
        a: Vec2,
        b: Vec2,
        c: Vec2,
        color: Color,
    },
    Text {
        pos: Vec2,
        text: String,
        font: FontSpec,
        color: Color,
    },
    PushClip {
        rect: Rect,
    },
    PopClip,
}

pub struct Canvas {
    ops: Vec<PaintOp>,
    offset: Vec2,
    offset_stack: Vec<Vec2>,
    clip_stack: Vec<Rect>,
}

impl Canvas {
    pub fn new(surface: Size) -> Self {
        Self {
            ops: Vec::new(),
            offset: Vec2::ZERO,
            offset_stack: Vec::new(),
            clip_stack: vec![Rect::from_size(surface)],
        }
    }

    fn to_abs(&self, r: Rect) -> Rect {
        r.translate(self.offset.x, self.offset.y)
    }

    fn abs_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x + self.offset.x, p.y + self.offset.y)
    }

    fn clip(&self) -> Rect {
        *self.clip_stack.last().expect("canvas clip stack underflow")
    }

    /// Current clip, expressed in the local (translated) coordinate space.
    /// Empty when everything drawn here would be clipped away.
    pub fn clip_bounds(&self) -> Rect {
        self.clip().translate(-self.offset.x, -self.offset.y)
    }

    pub fn fill_rect(&mut self, rect: Rect, brush: impl Into<Brush>) {
        let abs = self.to_abs(rect);
        if abs.intersects(self.clip()) {
            self.ops.push(PaintOp::FillRect {
                rect: abs,
                brush: brush.into(),
            });
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        let abs = self.to_abs(rect);
        if abs.intersects(self.clip()) {
            self.ops.push(PaintOp::StrokeRect {
                rect: abs,
                color,
                width,
            });
        }
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.ops.push(PaintOp::Line {
            from: self.abs_point(from),
            to: self.abs_point(to),
            color,
            width,
        });
    }

    pub fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        self.ops.push(PaintOp::FillTriangle {
            a: self.abs_point(a),
            b: self.abs_point(b),
            c: self.abs_point(c),
            color,
        });
    }

    pub fn text(&mut self, pos: Vec2, text: impl Into<String>, font: &FontSpec, color: Color) {
        self.ops.push(PaintOp::Text {
            pos: self.abs_point(pos),
            text: text.into(),
            font: font.clone(),
            color,
        });
    }

    pub fn push_clip(&mut self, rect: Rect) {
        let abs = self.to_abs(rect).intersect(self.clip());
        self.clip_stack.push(abs);
        self.ops.push(PaintOp::PushClip { rect: abs });
    }

    pub fn pop_clip(&mut self) {
        assert!(self.clip_stack.len() > 1, "pop_clip without push_clip");
        self.clip_stack.pop();
        self.ops.push(PaintOp::PopClip);
    }

    pub fn push_translate(&mut self, d: Vec2) {
        self.offset_stack.push(self.offset);
        self.offset = Vec2::new(self.offset.x + d.x, self.offset.y + d.y);
    }

    pub fn pop_translate(&mut self) {
        self.offset = self
            .offset_stack
            .pop()
            .expect("pop_translate without push_translate");
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<PaintOp> {
        self.ops
    }
}

/// Seam to the host's actual 2D rasterizer.
pub trait RenderBackend {
    fn submit(&mut self, canvas: &Canvas);
}
