mod properties;
mod scenarios;

use futures::executor::block_on;
use mask_painter::mask::{
    BrushPainter, ClassId, LabelIndex, MemoryAnnotationStore, Point, Raster, RasterId,
    StrokeCommit, TipShape, ViewId,
};

pub fn raster(width: u32, height: u32) -> Raster {
    Raster::new(RasterId(1), ViewId(1), width, height).unwrap()
}

pub fn count(raster: &Raster, label: LabelIndex) -> usize {
    raster.label_pixel_count(label)
}

/// Paints one complete stroke through `points` and commits it.
pub fn paint(
    raster: &mut Raster,
    store: &mut MemoryAnnotationStore,
    class_id: u32,
    shape: TipShape,
    is_eraser: bool,
    radius: f32,
    points: &[(f32, f32)],
) -> StrokeCommit {
    let mut painter =
        BrushPainter::new(raster, store, ClassId(class_id), shape, is_eraser).unwrap();
    for &(x, y) in points {
        painter.stroke(raster, Point::new(x, y), radius);
    }
    block_on(painter.end_stroke(raster, store)).unwrap()
}
