use crate::mask::model::{
    Annotation, AnnotationId, ClassId, LabelIndex, PixelRange, RasterId, ViewId, EMPTY_LABEL,
};
use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Rectangle reported to the renderer as needing a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_range(range: PixelRange) -> Option<Self> {
        if range.is_empty() {
            return None;
        }
        Some(Self {
            x: range.min_x,
            y: range.min_y,
            width: range.max_x - range.min_x + 1,
            height: range.max_y - range.min_y + 1,
        })
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn contains_pixel(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Indexed label buffer for one visual surface. Every mask annotation that
/// lives on the surface is multiplexed into the buffer through its label.
#[derive(Debug, Clone)]
pub struct Raster {
    id: RasterId,
    view: ViewId,
    width: u32,
    height: u32,
    buffer: Vec<LabelIndex>,
    label_to_annotation: BTreeMap<LabelIndex, AnnotationId>,
    annotation_to_label: HashMap<AnnotationId, LabelIndex>,
    in_progress: BTreeMap<ClassId, Annotation>,
    dirty: Vec<DirtyRect>,
}

impl Raster {
    pub fn new(id: RasterId, view: ViewId, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("raster {id:?} must have a non-zero size, got {width}x{height}");
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            bail!("raster {id:?} is too large: {width}x{height}");
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("raster {id:?} pixel count overflows: {width}x{height}"))?;
        tracing::debug!(raster = ?id, view = ?view, width, height, "created raster");
        Ok(Self {
            id,
            view,
            width,
            height,
            buffer: vec![EMPTY_LABEL; len],
            label_to_annotation: BTreeMap::new(),
            annotation_to_label: HashMap::new(),
            in_progress: BTreeMap::new(),
            dirty: Vec::new(),
        })
    }

    pub fn id(&self) -> RasterId {
        self.id
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[LabelIndex] {
        &self.buffer
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [LabelIndex] {
        &mut self.buffer
    }

    pub fn label_at(&self, x: i32, y: i32) -> Option<LabelIndex> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.buffer[y as usize * self.width as usize + x as usize])
    }

    /// Smallest positive label that has no annotation mapped to it.
    pub fn next_available_label_index(&self) -> Result<LabelIndex> {
        let mut candidate: LabelIndex = 1;
        for &label in self.label_to_annotation.keys() {
            if label != candidate {
                break;
            }
            candidate = candidate
                .checked_add(1)
                .ok_or_else(|| anyhow!("raster {:?} has no free label index", self.id))?;
        }
        Ok(candidate)
    }

    /// Maps `label` to `annotation`, replacing whatever either side was
    /// previously paired with.
    ///
    /// # Panics
    ///
    /// Panics when `label` is the reserved empty label.
    pub fn set_annotation_mapping(&mut self, label: LabelIndex, annotation: AnnotationId) {
        assert_ne!(label, EMPTY_LABEL, "label 0 is reserved for empty pixels");
        if let Some(previous_label) = self.annotation_to_label.insert(annotation, label) {
            if previous_label != label {
                self.label_to_annotation.remove(&previous_label);
            }
        }
        if let Some(previous) = self.label_to_annotation.insert(label, annotation) {
            if previous != annotation {
                self.annotation_to_label.remove(&previous);
            }
        }
        tracing::trace!(raster = ?self.id, label, %annotation, "mapped label");
    }

    /// Forgets the annotation bound to `label`. Pixels still carrying the
    /// label are left for the caller to clear.
    pub fn delete_annotation_mapping(&mut self, label: LabelIndex) -> Option<AnnotationId> {
        let annotation = self.label_to_annotation.remove(&label)?;
        self.annotation_to_label.remove(&annotation);
        tracing::trace!(raster = ?self.id, label, %annotation, "released label");
        Some(annotation)
    }

    pub fn label_index_for_annotation_id(&self, annotation: AnnotationId) -> Option<LabelIndex> {
        self.annotation_to_label.get(&annotation).copied()
    }

    pub fn annotation_id_for_label(&self, label: LabelIndex) -> Option<AnnotationId> {
        self.label_to_annotation.get(&label).copied()
    }

    pub fn mapped_labels(&self) -> impl Iterator<Item = (LabelIndex, AnnotationId)> + '_ {
        self.label_to_annotation
            .iter()
            .map(|(label, annotation)| (*label, *annotation))
    }

    /// Holds an uncommitted mask until it is durably created. Each class
    /// keeps at most one; a newer record for the same class replaces it.
    pub fn set_in_progress_annotation(&mut self, annotation: Annotation) -> Option<Annotation> {
        self.in_progress.insert(annotation.class_id, annotation)
    }

    pub fn clear_in_progress_annotation(&mut self, class_id: ClassId) -> Option<Annotation> {
        self.in_progress.remove(&class_id)
    }

    /// Drops every uncommitted mask record. Labels and pixels are untouched.
    pub fn clear_in_progress_annotations(&mut self) -> Vec<Annotation> {
        std::mem::take(&mut self.in_progress).into_values().collect()
    }

    pub fn in_progress_annotation(&self, class_id: ClassId) -> Option<&Annotation> {
        self.in_progress.get(&class_id)
    }

    pub fn in_progress_annotations(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.in_progress.values()
    }

    pub(crate) fn in_progress_annotation_mut(
        &mut self,
        class_id: ClassId,
    ) -> Option<&mut Annotation> {
        self.in_progress.get_mut(&class_id)
    }

    /// Records that the inclusive region changed. Regions are clipped to the
    /// surface; regions that miss it entirely are dropped.
    pub fn invalidate(&mut self, min_x: i32, max_x: i32, min_y: i32, max_y: i32) {
        self.invalidate_range(PixelRange::new(min_x, min_y, max_x, max_y));
    }

    pub fn invalidate_range(&mut self, range: PixelRange) {
        if let Some(rect) = DirtyRect::from_range(range.clamp(self.width, self.height)) {
            self.dirty.push(rect);
        }
    }

    pub fn take_dirty_regions(&mut self) -> Vec<DirtyRect> {
        std::mem::take(&mut self.dirty)
    }

    pub fn pending_dirty_bounds(&self) -> Option<DirtyRect> {
        self.dirty.iter().copied().reduce(DirtyRect::union)
    }

    pub fn label_pixel_count(&self, label: LabelIndex) -> usize {
        self.buffer.iter().filter(|&&px| px == label).count()
    }

    pub fn has_label_pixels(&self, label: LabelIndex) -> bool {
        self.buffer.contains(&label)
    }

    /// Candidates with no pixel left in the buffer, in the given order.
    pub fn empty_labels(&self, candidates: &[LabelIndex]) -> Vec<LabelIndex> {
        let mut remaining: BTreeSet<LabelIndex> = candidates
            .iter()
            .copied()
            .filter(|&label| label != EMPTY_LABEL)
            .collect();
        for px in &self.buffer {
            if remaining.is_empty() {
                break;
            }
            remaining.remove(px);
        }
        candidates
            .iter()
            .copied()
            .filter(|label| remaining.contains(label))
            .collect()
    }

    /// Tight bounds of every pixel carrying `label`.
    pub fn label_bounds(&self, label: LabelIndex) -> PixelRange {
        let width = self.width as usize;
        let mut bounds = PixelRange::EMPTY;
        for (row_index, row) in self.buffer.chunks_exact(width).enumerate() {
            let Some(first) = row.iter().position(|&px| px == label) else {
                continue;
            };
            let last = row.iter().rposition(|&px| px == label).unwrap_or(first);
            let y = row_index as i32;
            bounds.include(PixelRange::new(first as i32, y, last as i32, y));
        }
        bounds
    }

    /// Zeroes every pixel of `label` and invalidates the area it covered.
    pub fn clear_label(&mut self, label: LabelIndex) -> PixelRange {
        if label == EMPTY_LABEL {
            return PixelRange::EMPTY;
        }
        let bounds = self.label_bounds(label);
        if bounds.is_empty() {
            return bounds;
        }
        let width = self.width as usize;
        for y in bounds.min_y..=bounds.max_y {
            let row = y as usize * width;
            for px in &mut self.buffer[row + bounds.min_x as usize..=row + bounds.max_x as usize] {
                if *px == label {
                    *px = EMPTY_LABEL;
                }
            }
        }
        self.invalidate_range(bounds);
        bounds
    }

    /// Clears the label's pixels and drops its mapping so the index can be
    /// handed out again.
    pub fn release_label(&mut self, label: LabelIndex) -> Option<AnnotationId> {
        self.clear_label(label);
        self.delete_annotation_mapping(label)
    }
}
