pub mod draw_method;
pub mod interpolate;
pub mod model;
pub mod painter;
pub mod raster;
pub mod scan;
pub mod store;
pub mod surface;

pub use model::{
    Annotation, AnnotationData, AnnotationId, BoundingBox, ClassId, LabelIndex, MaskData,
    PixelRange, Point, RasterId, StrokeData, TipShape, ViewId,
};
pub use painter::{BrushPainter, CommitOutcome, StrokeCommit};
pub use raster::{DirtyRect, Raster};
pub use scan::polygon_to_raster;
pub use store::{AnnotationStore, MemoryAnnotationStore};
pub use surface::SurfaceRasters;
