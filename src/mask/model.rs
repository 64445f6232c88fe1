use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-pixel owner of a raster cell. `0` means the pixel is unowned.
pub type LabelIndex = u16;

pub const EMPTY_LABEL: LabelIndex = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RasterId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipShape {
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// One brush sample, already expressed in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeData {
    pub point: Point,
    pub radius: f32,
}

/// Inclusive pixel bounds. The empty range uses inverted sentinels so that
/// the first inclusion establishes real bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRange {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelRange {
    pub const EMPTY: Self = Self {
        min_x: i32::MAX,
        min_y: i32::MAX,
        max_x: i32::MIN,
        max_y: i32::MIN,
    };

    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include(&mut self, other: PixelRange) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn contains(&self, other: &PixelRange) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && self.min_x <= other.min_x
                && self.min_y <= other.min_y
                && self.max_x >= other.max_x
                && self.max_y >= other.max_y)
    }

    /// Restricts the range to a `width` x `height` surface. Ranges that end up
    /// outside the surface collapse to `EMPTY`.
    pub fn clamp(self, width: u32, height: u32) -> PixelRange {
        if self.is_empty() || width == 0 || height == 0 {
            return PixelRange::EMPTY;
        }
        let max_w = width.min(i32::MAX as u32) as i32 - 1;
        let max_h = height.min(i32::MAX as u32) as i32 - 1;
        let clamped = PixelRange {
            min_x: self.min_x.max(0),
            min_y: self.min_y.max(0),
            max_x: self.max_x.min(max_w),
            max_y: self.max_y.min(max_h),
        };
        if clamped.is_empty() {
            PixelRange::EMPTY
        } else {
            clamped
        }
    }

    pub fn pixel_count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let w = (self.max_x as i64 - self.min_x as i64 + 1) as u64;
        let h = (self.max_y as i64 - self.min_y as i64 + 1) as u64;
        w * h
    }

    pub fn to_bounding_box(self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        Some(BoundingBox {
            x: self.min_x,
            y: self.min_y,
            width: (self.max_x - self.min_x + 1) as u32,
            height: (self.max_y - self.min_y + 1) as u32,
        })
    }
}

impl Default for PixelRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Persisted mask extent, `x`/`y` being the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn to_pixel_range(self) -> PixelRange {
        if self.width == 0 || self.height == 0 {
            return PixelRange::EMPTY;
        }
        PixelRange::new(
            self.x,
            self.y,
            self.x + self.width as i32 - 1,
            self.y + self.height as i32 - 1,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaskData {
    pub raster_id: Option<RasterId>,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationData {
    Mask(MaskData),
    Polygon { points: Vec<Point> },
    Keypoints { points: Vec<Point> },
}

impl AnnotationData {
    pub fn as_mask(&self) -> Option<&MaskData> {
        match self {
            AnnotationData::Mask(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn as_mask_mut(&mut self) -> Option<&mut MaskData> {
        match self {
            AnnotationData::Mask(mask) => Some(mask),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub class_id: ClassId,
    pub view: ViewId,
    pub data: AnnotationData,
}

impl Annotation {
    /// Transient mask record used while a brand-new mask is being painted.
    pub fn provisional_mask(class_id: ClassId, view: ViewId, raster_id: RasterId) -> Self {
        Self {
            id: AnnotationId::new(),
            class_id,
            view,
            data: AnnotationData::Mask(MaskData {
                raster_id: Some(raster_id),
                bounding_box: None,
            }),
        }
    }

    pub fn is_mask(&self) -> bool {
        matches!(self.data, AnnotationData::Mask(_))
    }

    pub fn mask_bounding_box(&self) -> Option<BoundingBox> {
        self.data.as_mask().and_then(|mask| mask.bounding_box)
    }
}
