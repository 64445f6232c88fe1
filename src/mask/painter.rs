use crate::mask::draw_method::{DrawMethod, PixelWriter};
use crate::mask::interpolate::interpolation_quad;
use crate::mask::model::{
    Annotation, AnnotationId, BoundingBox, ClassId, LabelIndex, PixelRange, Point, RasterId,
    StrokeData, TipShape,
};
use crate::mask::raster::Raster;
use crate::mask::scan::polygon_to_raster;
use crate::mask::store::{AnnotationStore, MaskUpdate};
use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeSet;

/// Minimum movement, in pixels along either axis, before two samples are
/// bridged with an interpolation quad.
pub const DEFAULT_INTERPOLATION_THRESHOLD: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum StrokeProgress {
    NotStarted,
    Continuing(StrokeData),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// A new mask ended with no pixels; its provisional record and label
    /// were dropped.
    Discarded,
    Created(Annotation),
    Updated(AnnotationId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeCommit {
    pub outcome: CommitOutcome,
    pub bounding_box: Option<BoundingBox>,
    /// Masks deleted because the stroke left them without pixels.
    pub removed: Vec<AnnotationId>,
}

/// Paints one brush or eraser gesture into a raster.
///
/// A painter is created on pointer-down, receives one [`BrushPainter::stroke`]
/// per pointer sample and is consumed by [`BrushPainter::end_stroke`]. It is
/// bound to a single label for its whole life and must not outlive the
/// stroke, since labels are recycled once their mask is deleted.
#[derive(Debug)]
pub struct BrushPainter {
    raster_id: RasterId,
    class_id: ClassId,
    label_index: LabelIndex,
    annotation: Annotation,
    tip_shape: TipShape,
    is_eraser: bool,
    is_new_mask_annotation: bool,
    draw_method: DrawMethod,
    labels_being_overwritten: BTreeSet<LabelIndex>,
    progress: StrokeProgress,
    edit_range: PixelRange,
    interpolation_threshold: f32,
}

impl BrushPainter {
    /// Binds a painter to the mask of `class_id` on `raster`, creating a
    /// provisional mask when the class has none yet.
    ///
    /// Fails when the class resolves to an annotation that is not a mask of
    /// this raster, when that mask has no label on the raster, or when the
    /// raster has run out of labels.
    pub fn new<S: AnnotationStore>(
        raster: &mut Raster,
        store: &S,
        class_id: ClassId,
        tip_shape: TipShape,
        is_eraser: bool,
    ) -> Result<Self> {
        let (annotation, label_index, is_new_mask_annotation) =
            match store.find_mask_annotation_for_class(raster, class_id) {
                Some(annotation) => {
                    let label = existing_mask_label(raster, &annotation)?;
                    (annotation, label, false)
                }
                None => match resumable_in_progress(raster, class_id) {
                    Some((annotation, label)) => {
                        tracing::debug!(
                            label,
                            annotation = %annotation.id,
                            "resuming uncommitted mask"
                        );
                        (annotation, label, true)
                    }
                    None => {
                        let (annotation, label) = start_provisional_mask(raster, class_id)?;
                        (annotation, label, true)
                    }
                },
            };

        let edit_range = annotation
            .mask_bounding_box()
            .map(BoundingBox::to_pixel_range)
            .unwrap_or(PixelRange::EMPTY);

        let mut labels_being_overwritten = BTreeSet::new();
        if is_eraser {
            labels_being_overwritten.insert(label_index);
        }

        tracing::trace!(
            raster = ?raster.id(),
            ?class_id,
            label = label_index,
            is_eraser,
            is_new = is_new_mask_annotation,
            "stroke started"
        );

        Ok(Self {
            raster_id: raster.id(),
            class_id,
            label_index,
            annotation,
            tip_shape,
            is_eraser,
            is_new_mask_annotation,
            draw_method: DrawMethod::select(tip_shape, is_eraser),
            labels_being_overwritten,
            progress: StrokeProgress::NotStarted,
            edit_range,
            interpolation_threshold: DEFAULT_INTERPOLATION_THRESHOLD,
        })
    }

    pub fn with_interpolation_threshold(mut self, threshold: f32) -> Self {
        self.interpolation_threshold = threshold;
        self
    }

    pub fn label_index(&self) -> LabelIndex {
        self.label_index
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn annotation_id(&self) -> AnnotationId {
        self.annotation.id
    }

    pub fn tip_shape(&self) -> TipShape {
        self.tip_shape
    }

    pub fn is_eraser(&self) -> bool {
        self.is_eraser
    }

    pub fn is_new_mask_annotation(&self) -> bool {
        self.is_new_mask_annotation
    }

    pub fn edit_range(&self) -> PixelRange {
        self.edit_range
    }

    pub fn labels_being_overwritten(&self) -> &BTreeSet<LabelIndex> {
        &self.labels_being_overwritten
    }

    pub fn previous_stroke(&self) -> Option<StrokeData> {
        match self.progress {
            StrokeProgress::NotStarted => None,
            StrokeProgress::Continuing(previous) => Some(previous),
        }
    }

    /// Applies the tip at `point` and bridges the gap from the previous
    /// sample. Returns the pixel range that was touched and invalidated.
    ///
    /// # Panics
    ///
    /// Panics if `point` is not finite, if `radius` is not a positive finite
    /// number, or if `raster` is not the raster the painter was created for.
    pub fn stroke(&mut self, raster: &mut Raster, point: Point, radius: f32) -> PixelRange {
        assert!(
            point.x.is_finite() && point.y.is_finite(),
            "brush point must be finite, got ({}, {})",
            point.x,
            point.y
        );
        assert!(
            radius.is_finite() && radius > 0.0,
            "brush radius must be positive, got {radius}"
        );
        assert_eq!(
            raster.id(),
            self.raster_id,
            "painter used with a different raster"
        );

        let current = StrokeData { point, radius };
        let (width, height) = (raster.width(), raster.height());
        let method = self.draw_method;
        let footprint = method.footprint_range(point, radius).clamp(width, height);
        let bridge = match self.progress {
            StrokeProgress::Continuing(previous) if self.moved_enough(previous, current) => {
                interpolation_quad(previous, current, self.tip_shape)
            }
            _ => None,
        };

        let mut touched = footprint;
        {
            let mut writer = PixelWriter::new(
                raster.pixels_mut(),
                self.label_index,
                &mut self.labels_being_overwritten,
            );
            method.apply_footprint(&mut writer, width, footprint, point, radius);
            if let Some(quad) = bridge {
                let covered = polygon_to_raster(&quad, width, height);
                method.apply_pixels(&mut writer, &covered.pixels);
                touched.include(covered.bounds.pixel_range().clamp(width, height));
            }
        }

        self.edit_range.include(touched);
        if !touched.is_empty() {
            raster.invalidate(touched.min_x, touched.max_x, touched.min_y, touched.max_y);
        }
        self.progress = StrokeProgress::Continuing(current);
        touched
    }

    fn moved_enough(&self, previous: StrokeData, current: StrokeData) -> bool {
        let dx = (current.point.x - previous.point.x).abs();
        let dy = (current.point.y - previous.point.y).abs();
        dx > self.interpolation_threshold || dy > self.interpolation_threshold
    }

    /// Commits the stroke: creates, updates or discards the bound mask, then
    /// deletes masks the stroke emptied.
    ///
    /// Painted pixels are never rolled back. When persistence fails the error
    /// is returned and the raster keeps its local state; a failed creation
    /// leaves the mask in progress so the next stroke of the class retries.
    pub async fn end_stroke<S: AnnotationStore>(
        self,
        raster: &mut Raster,
        store: &mut S,
    ) -> Result<StrokeCommit> {
        assert_eq!(
            raster.id(),
            self.raster_id,
            "painter committed to a different raster"
        );
        let bounding_box = self.edit_range.to_bounding_box();

        // A new mask is only created when its label still owns a pixel.
        let committed = match (self.is_new_mask_annotation, bounding_box) {
            (true, Some(bbox)) if raster.has_label_pixels(self.label_index) => {
                self.create_mask(raster, store, bbox).await
            }
            (true, _) => Ok(self.discard_provisional(raster)),
            (false, _) => self.update_mask(raster, store, bounding_box).await,
        };

        let candidates: Vec<LabelIndex> = self.labels_being_overwritten.iter().copied().collect();
        let cleanup = store
            .check_and_remove_empty_masks(raster, &candidates)
            .await
            .context("remove masks emptied by stroke");

        match (committed, cleanup) {
            (Ok(outcome), Ok(removed)) => {
                tracing::debug!(
                    ?outcome,
                    ?bounding_box,
                    removed = removed.len(),
                    "stroke committed"
                );
                Ok(StrokeCommit {
                    outcome,
                    bounding_box,
                    removed,
                })
            }
            (Err(err), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    tracing::warn!(
                        error = %format!("{cleanup_err:#}"),
                        "empty mask cleanup failed"
                    );
                }
                Err(err)
            }
            (Ok(_), Err(err)) => Err(err),
        }
    }

    fn discard_provisional(&self, raster: &mut Raster) -> CommitOutcome {
        let pending = raster
            .in_progress_annotation(self.class_id)
            .is_some_and(|pending| pending.id == self.annotation.id);
        if pending {
            raster.clear_in_progress_annotation(self.class_id);
        }
        raster.release_label(self.label_index);
        tracing::debug!(label = self.label_index, "discarded provisional mask");
        CommitOutcome::Discarded
    }

    async fn create_mask<S: AnnotationStore>(
        &self,
        raster: &mut Raster,
        store: &mut S,
        bounding_box: BoundingBox,
    ) -> Result<CommitOutcome> {
        let created = store
            .create_mask_annotation(
                raster.view(),
                raster,
                self.class_id,
                bounding_box,
                self.label_index,
            )
            .await;

        match created {
            Ok(annotation) => {
                raster.clear_in_progress_annotation(self.class_id);
                if annotation.id != self.annotation.id {
                    raster.set_annotation_mapping(self.label_index, annotation.id);
                }
                Ok(CommitOutcome::Created(annotation))
            }
            Err(err) => {
                if let Some(pending) = raster.in_progress_annotation_mut(self.class_id) {
                    if pending.id == self.annotation.id {
                        if let Some(mask) = pending.data.as_mask_mut() {
                            mask.bounding_box = Some(bounding_box);
                        }
                    }
                }
                tracing::warn!(
                    label = self.label_index,
                    class_id = ?self.class_id,
                    error = %format!("{err:#}"),
                    "mask creation failed; keeping local pixels"
                );
                Err(err.context(format!("create mask for class {:?}", self.class_id)))
            }
        }
    }

    async fn update_mask<S: AnnotationStore>(
        &self,
        raster: &Raster,
        store: &mut S,
        bounding_box: Option<BoundingBox>,
    ) -> Result<CommitOutcome> {
        let mut annotation = self.annotation.clone();
        store.update_annotation_data(
            &mut annotation,
            MaskUpdate {
                bounding_box,
                raster_id: raster.id(),
            },
        )?;
        if let Err(err) = store.update_annotation(&annotation).await {
            tracing::warn!(
                annotation = %annotation.id,
                error = %format!("{err:#}"),
                "mask update failed; keeping local pixels"
            );
            return Err(err.context(format!("update mask {}", annotation.id)));
        }
        Ok(CommitOutcome::Updated(annotation.id))
    }
}

fn existing_mask_label(raster: &Raster, annotation: &Annotation) -> Result<LabelIndex> {
    let Some(mask) = annotation.data.as_mask() else {
        bail!(
            "annotation {} for class {:?} is not a mask annotation",
            annotation.id,
            annotation.class_id
        );
    };
    if let Some(raster_id) = mask.raster_id {
        if raster_id != raster.id() {
            bail!(
                "mask {} belongs to raster {raster_id:?}, not {:?}",
                annotation.id,
                raster.id()
            );
        }
    }
    raster
        .label_index_for_annotation_id(annotation.id)
        .ok_or_else(|| {
            anyhow!(
                "mask {} has no label on raster {:?}",
                annotation.id,
                raster.id()
            )
        })
}

fn resumable_in_progress(raster: &Raster, class_id: ClassId) -> Option<(Annotation, LabelIndex)> {
    let pending = raster.in_progress_annotation(class_id)?;
    let label = raster.label_index_for_annotation_id(pending.id)?;
    Some((pending.clone(), label))
}

fn start_provisional_mask(
    raster: &mut Raster,
    class_id: ClassId,
) -> Result<(Annotation, LabelIndex)> {
    let label = raster
        .next_available_label_index()
        .with_context(|| format!("allocate label for class {class_id:?}"))?;
    let annotation = Annotation::provisional_mask(class_id, raster.view(), raster.id());
    if let Some(stale) = raster.set_in_progress_annotation(annotation.clone()) {
        // Only reachable when the stale record lost its label.
        tracing::warn!(
            annotation = %stale.id,
            ?class_id,
            "replacing unlabelled uncommitted mask"
        );
    }
    raster.set_annotation_mapping(label, annotation.id);
    Ok((annotation, label))
}
