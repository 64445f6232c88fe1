use crate::mask::model::{PixelRange, Point};

/// Spans narrower than this come from flat or collinear input.
const MIN_SPAN_WIDTH: f32 = 1e-4;

/// Axis-aligned extent of a polygon in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl PolygonBounds {
    pub const EMPTY: Self = Self {
        min_x: f32::INFINITY,
        min_y: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        max_y: f32::NEG_INFINITY,
    };

    pub fn of(points: &[Point]) -> Self {
        points.iter().fold(Self::EMPTY, |bounds, p| PolygonBounds {
            min_x: bounds.min_x.min(p.x),
            min_y: bounds.min_y.min(p.y),
            max_x: bounds.max_x.max(p.x),
            max_y: bounds.max_y.max(p.y),
        })
    }

    pub fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    /// Pixels whose centers can fall inside these bounds.
    pub fn pixel_range(&self) -> PixelRange {
        if self.is_empty() {
            return PixelRange::EMPTY;
        }
        PixelRange::new(
            (self.min_x - 0.5).ceil() as i32,
            (self.min_y - 0.5).ceil() as i32,
            (self.max_x - 0.5).floor() as i32,
            (self.max_y - 0.5).floor() as i32,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConversion {
    /// Buffer indices (`y * width + x`) of every covered pixel, row by row.
    pub pixels: Vec<usize>,
    pub bounds: PolygonBounds,
}

/// Scan-converts a closed polygon with the even-odd rule, sampling each
/// pixel at its center. Pixels outside the `width` x `height` surface are
/// never reported. Flat polygons produce no pixels; self-intersecting ones
/// are filled lobe by lobe.
pub fn polygon_to_raster(points: &[Point], width: u32, height: u32) -> ScanConversion {
    let bounds = PolygonBounds::of(points);
    let mut pixels = Vec::new();

    if points.len() < 3 {
        return ScanConversion { pixels, bounds };
    }
    let rows = bounds.pixel_range().clamp(width, height);
    if rows.is_empty() {
        return ScanConversion { pixels, bounds };
    }

    let row_stride = width as usize;
    let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
    for y in rows.min_y..=rows.max_y {
        let sample_y = y as f32 + 0.5;
        crossings.clear();
        for (a, b) in edges(points) {
            // Half-open test so a vertex lying on the sample line counts once.
            if (a.y <= sample_y) != (b.y <= sample_y) {
                let t = (sample_y - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        let row_start = y as usize * row_stride;
        for span in crossings.chunks_exact(2) {
            if span[1] - span[0] <= MIN_SPAN_WIDTH {
                continue;
            }
            let first = ((span[0] - 0.5).ceil() as i32).max(rows.min_x);
            let last = ((span[1] - 0.5).ceil() as i32 - 1).min(rows.max_x);
            if first > last {
                continue;
            }
            pixels.extend((first..=last).map(|x| row_start + x as usize));
        }
    }

    ScanConversion { pixels, bounds }
}

fn edges(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    points
        .iter()
        .copied()
        .zip(points.iter().copied().cycle().skip(1))
}
