use crate::mask::model::{LabelIndex, PixelRange, Point, TipShape, EMPTY_LABEL};
use std::collections::BTreeSet;
use std::f32::consts::FRAC_1_SQRT_2;
use std::fmt;

/// Mutable view of a label buffer bound to the label a painter writes.
pub struct PixelWriter<'a> {
    pixels: &'a mut [LabelIndex],
    label: LabelIndex,
    overwritten: &'a mut BTreeSet<LabelIndex>,
}

impl<'a> PixelWriter<'a> {
    pub fn new(
        pixels: &'a mut [LabelIndex],
        label: LabelIndex,
        overwritten: &'a mut BTreeSet<LabelIndex>,
    ) -> Self {
        Self {
            pixels,
            label,
            overwritten,
        }
    }
}

type WritePixel = fn(&mut PixelWriter<'_>, usize);
type CoversPixel = fn(Point, f32, i32, i32) -> bool;
type FootprintRange = fn(Point, f32) -> PixelRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMethodKind {
    RoundBrush,
    RoundEraser,
    SquareBrush,
    SquareEraser,
}

/// Per-pixel strategy chosen once per painter so the inner loops never
/// branch on tip shape or mode.
#[derive(Clone, Copy)]
pub struct DrawMethod {
    kind: DrawMethodKind,
    write: WritePixel,
    covers: CoversPixel,
    footprint: FootprintRange,
}

impl DrawMethod {
    pub const ROUND_BRUSH: Self = Self {
        kind: DrawMethodKind::RoundBrush,
        write: paint_pixel,
        covers: inside_circle,
        footprint: round_footprint_range,
    };

    pub const ROUND_ERASER: Self = Self {
        kind: DrawMethodKind::RoundEraser,
        write: erase_pixel,
        covers: inside_circle,
        footprint: round_footprint_range,
    };

    pub const SQUARE_BRUSH: Self = Self {
        kind: DrawMethodKind::SquareBrush,
        write: paint_pixel,
        covers: whole_footprint,
        footprint: square_footprint_range,
    };

    pub const SQUARE_ERASER: Self = Self {
        kind: DrawMethodKind::SquareEraser,
        write: erase_pixel,
        covers: whole_footprint,
        footprint: square_footprint_range,
    };

    pub fn select(shape: TipShape, is_eraser: bool) -> Self {
        match (shape, is_eraser) {
            (TipShape::Round, false) => Self::ROUND_BRUSH,
            (TipShape::Round, true) => Self::ROUND_ERASER,
            (TipShape::Square, false) => Self::SQUARE_BRUSH,
            (TipShape::Square, true) => Self::SQUARE_ERASER,
        }
    }

    pub fn kind(&self) -> DrawMethodKind {
        self.kind
    }

    /// Unclipped pixel range of one tip application.
    pub fn footprint_range(&self, center: Point, radius: f32) -> PixelRange {
        (self.footprint)(center, radius)
    }

    /// Applies the tip at `center` to every covered pixel of `range`, which
    /// must already be clipped to the buffer.
    pub fn apply_footprint(
        &self,
        writer: &mut PixelWriter<'_>,
        width: u32,
        range: PixelRange,
        center: Point,
        radius: f32,
    ) {
        if range.is_empty() {
            return;
        }
        let stride = width as usize;
        for y in range.min_y..=range.max_y {
            let row = y as usize * stride;
            for x in range.min_x..=range.max_x {
                if (self.covers)(center, radius, x, y) {
                    (self.write)(writer, row + x as usize);
                }
            }
        }
    }

    pub fn apply_pixels(&self, writer: &mut PixelWriter<'_>, indices: &[usize]) {
        for &index in indices {
            (self.write)(writer, index);
        }
    }
}

impl fmt::Debug for DrawMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DrawMethod").field(&self.kind).finish()
    }
}

fn paint_pixel(writer: &mut PixelWriter<'_>, index: usize) {
    let current = writer.pixels[index];
    if current == writer.label {
        return;
    }
    if current != EMPTY_LABEL {
        writer.overwritten.insert(current);
    }
    writer.pixels[index] = writer.label;
}

fn erase_pixel(writer: &mut PixelWriter<'_>, index: usize) {
    if writer.pixels[index] == writer.label {
        writer.pixels[index] = EMPTY_LABEL;
    }
}

fn inside_circle(center: Point, radius: f32, x: i32, y: i32) -> bool {
    let dx = x as f32 + 0.5 - center.x;
    let dy = y as f32 + 0.5 - center.y;
    dx * dx + dy * dy < radius * radius
}

fn whole_footprint(_center: Point, _radius: f32, _x: i32, _y: i32) -> bool {
    true
}

/// Pixels whose centers can fall strictly inside the circle.
pub fn round_footprint_range(center: Point, radius: f32) -> PixelRange {
    centered_range(center, radius)
}

/// Pixels whose centers lie inside the square whose half-diagonal is
/// `radius`.
pub fn square_footprint_range(center: Point, radius: f32) -> PixelRange {
    centered_range(center, radius * FRAC_1_SQRT_2)
}

fn centered_range(center: Point, half_extent: f32) -> PixelRange {
    PixelRange::new(
        (center.x - half_extent - 0.5).ceil() as i32,
        (center.y - half_extent - 0.5).ceil() as i32,
        (center.x + half_extent - 0.5).floor() as i32,
        (center.y + half_extent - 0.5).floor() as i32,
    )
}
