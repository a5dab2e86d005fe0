//! Overlay content: the footer line and the diagonal watermark.
//!
//! Each builder returns a self-contained operation sequence wrapped in
//! `q`/`Q`, drawn relative to a page frame. For rotated pages the frame
//! is the upright view, mapped back to page space by [`upright`].

use std::f32::consts::FRAC_1_SQRT_2;

use lopdf::content::Operation;
use lopdf::Object;

use crate::font::text_width;

/// Resource name of the overlay font on every stamped page.
pub(crate) const FONT_RESOURCE: &str = "GumstampHelv";
/// Resource name of the footer's graphics state.
pub(crate) const FOOTER_STATE: &str = "GumstampFooterGs";
/// Resource name of the watermark's graphics state.
pub(crate) const DIAGONAL_STATE: &str = "GumstampDiagonalGs";

pub const FOOTER_FONT_SIZE: f32 = 9.0;
pub const FOOTER_OPACITY: f32 = 0.8;
pub const FOOTER_MARGIN: f32 = 24.0;

pub const DIAGONAL_FONT_SIZE: f32 = 36.0;
pub const DIAGONAL_GRAY: f32 = 0.2;
pub const DIAGONAL_OPACITY: f32 = 0.15;

/// US Letter, used when a page has no usable MediaBox.
pub const LETTER: PageBox = PageBox {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// A normalized page rectangle in default user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    /// Build from two opposite corners in any order. Returns `None` for a
    /// degenerate rectangle.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Option<Self> {
        let b = Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        };
        (b.width() > 0.0 && b.height() > 0.0 && b.width().is_finite() && b.height().is_finite())
            .then_some(b)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    fn center(&self) -> (f32, f32) {
        (self.llx + self.width() / 2.0, self.lly + self.height() / 2.0)
    }
}

/// The page as a viewer displays it after `/Rotate`, and the matrix that
/// maps that upright frame back to default user space.
///
/// Unrotated pages (and rotations that are not a multiple of 90) keep the
/// MediaBox as the frame and need no matrix.
pub fn upright(page: &PageBox, rotate: i64) -> (PageBox, Option<[f32; 6]>) {
    let (w, h) = (page.width(), page.height());
    let (size, matrix) = match rotate.rem_euclid(360) {
        90 => ((h, w), [0.0, 1.0, -1.0, 0.0, page.urx, page.lly]),
        180 => ((w, h), [-1.0, 0.0, 0.0, -1.0, page.urx, page.ury]),
        270 => ((h, w), [0.0, -1.0, 1.0, 0.0, page.llx, page.ury]),
        _ => return (*page, None),
    };
    let frame = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: size.0,
        ury: size.1,
    };
    (frame, Some(matrix))
}

/// Wrap overlay operations in the upright matrix, when there is one.
pub fn place(matrix: Option<[f32; 6]>, ops: Vec<Operation>) -> Vec<Operation> {
    let Some(m) = matrix else {
        return ops;
    };
    let mut placed = Vec::with_capacity(ops.len() + 3);
    placed.push(Operation::new("q", vec![]));
    placed.push(Operation::new("cm", m.iter().copied().map(real).collect()));
    placed.extend(ops);
    placed.push(Operation::new("Q", vec![]));
    placed
}

/// Right-aligned footer near the bottom-right corner.
pub fn footer(page: &PageBox, text: &str) -> Vec<Operation> {
    let width = text_width(text, FOOTER_FONT_SIZE);
    let x = page.urx - FOOTER_MARGIN - width;
    let y = page.lly + FOOTER_MARGIN;

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![name(FOOTER_STATE)]),
        Operation::new("g", vec![real(0.0)]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name(FONT_RESOURCE), real(FOOTER_FONT_SIZE)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Watermark centred on the page, rotated 45 degrees about the centre.
pub fn diagonal(page: &PageBox, text: &str) -> Vec<Operation> {
    let width = text_width(text, DIAGONAL_FONT_SIZE);
    let (cx, cy) = page.center();
    let (cos, sin) = (FRAC_1_SQRT_2, FRAC_1_SQRT_2);

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![name(DIAGONAL_STATE)]),
        Operation::new("g", vec![real(DIAGONAL_GRAY)]),
        Operation::new(
            "cm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(cx), real(cy)],
        ),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name(FONT_RESOURCE), real(DIAGONAL_FONT_SIZE)]),
        Operation::new("Td", vec![real(-width / 2.0), real(0.0)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn real(value: f32) -> Object {
    Object::Real(value)
}
