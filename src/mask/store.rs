use crate::mask::model::{
    Annotation, AnnotationData, AnnotationId, BoundingBox, ClassId, LabelIndex, MaskData,
    RasterId, ViewId,
};
use crate::mask::raster::Raster;
use anyhow::{anyhow, bail, Context, Result};

/// Fields a finished stroke writes back onto a mask annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskUpdate {
    pub bounding_box: Option<BoundingBox>,
    pub raster_id: RasterId,
}

/// Owner of annotation records. Painting only reaches the store through
/// this trait; persistence may be asynchronous and may fail.
#[allow(async_fn_in_trait)]
pub trait AnnotationStore {
    /// Mask annotation already painted for `class_id` on the raster's view.
    fn find_mask_annotation_for_class(
        &self,
        raster: &Raster,
        class_id: ClassId,
    ) -> Option<Annotation>;

    async fn create_mask_annotation(
        &mut self,
        view: ViewId,
        raster: &Raster,
        class_id: ClassId,
        bounding_box: BoundingBox,
        label: LabelIndex,
    ) -> Result<Annotation>;

    fn update_annotation_data(
        &mut self,
        annotation: &mut Annotation,
        update: MaskUpdate,
    ) -> Result<()> {
        let mask = annotation
            .data
            .as_mask_mut()
            .ok_or_else(|| anyhow!("annotation {} is not a mask annotation", annotation.id))?;
        mask.bounding_box = update.bounding_box;
        mask.raster_id = Some(update.raster_id);
        Ok(())
    }

    async fn update_annotation(&mut self, annotation: &Annotation) -> Result<()>;

    async fn delete_annotation(&mut self, annotation: AnnotationId) -> Result<()>;

    /// Deletes the mask annotation of every candidate label that no longer
    /// owns any pixel and frees the label. Returns the deleted annotations.
    async fn check_and_remove_empty_masks(
        &mut self,
        raster: &mut Raster,
        candidates: &[LabelIndex],
    ) -> Result<Vec<AnnotationId>> {
        let mut removed = Vec::new();
        for label in raster.empty_labels(candidates) {
            let Some(annotation) = raster.annotation_id_for_label(label) else {
                continue;
            };
            let pending_class = raster
                .in_progress_annotations()
                .find(|pending| pending.id == annotation)
                .map(|pending| pending.class_id);
            if let Some(class_id) = pending_class {
                raster.clear_in_progress_annotation(class_id);
            } else {
                self.delete_annotation(annotation)
                    .await
                    .with_context(|| format!("delete emptied mask {annotation} (label {label})"))?;
                removed.push(annotation);
            }
            raster.delete_annotation_mapping(label);
            tracing::debug!(label, %annotation, view = ?raster.view(), "removed empty mask");
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Created(AnnotationId),
    Updated(AnnotationId),
    Deleted(AnnotationId),
}

/// In-memory annotation store. Records keep insertion order, which doubles
/// as z-order.
#[derive(Debug, Default)]
pub struct MemoryAnnotationStore {
    annotations: Vec<Annotation>,
    operations: Vec<StoreOperation>,
    pending_failure: Option<String>,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, annotation: Annotation) {
        self.annotations.retain(|existing| existing.id != annotation.id);
        self.annotations.push(annotation);
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn operations(&self) -> &[StoreOperation] {
        &self.operations
    }

    /// Makes the next persisting call fail with `message`.
    pub fn fail_next_call(&mut self, message: impl Into<String>) {
        self.pending_failure = Some(message.into());
    }

    /// Deletes a mask from outside a stroke, clearing its pixels and label.
    pub fn remove_mask(&mut self, raster: &mut Raster, id: AnnotationId) -> Result<()> {
        let index = self
            .annotations
            .iter()
            .position(|annotation| annotation.id == id)
            .ok_or_else(|| anyhow!("annotation {id} does not exist"))?;
        if !self.annotations[index].is_mask() {
            bail!("annotation {id} is not a mask annotation");
        }
        self.annotations.remove(index);
        self.operations.push(StoreOperation::Deleted(id));
        if let Some(label) = raster.label_index_for_annotation_id(id) {
            raster.release_label(label);
        }
        Ok(())
    }

    fn take_failure(&mut self) -> Result<()> {
        match self.pending_failure.take() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

impl AnnotationStore for MemoryAnnotationStore {
    /// Classes are single-typed, so a record of another type is returned as
    /// is and rejected by the painter.
    fn find_mask_annotation_for_class(
        &self,
        raster: &Raster,
        class_id: ClassId,
    ) -> Option<Annotation> {
        self.annotations
            .iter()
            .find(|annotation| {
                annotation.view == raster.view()
                    && annotation.class_id == class_id
                    && annotation
                        .data
                        .as_mask()
                        .map_or(true, |mask| mask.raster_id == Some(raster.id()))
            })
            .cloned()
    }

    async fn create_mask_annotation(
        &mut self,
        view: ViewId,
        raster: &Raster,
        class_id: ClassId,
        bounding_box: BoundingBox,
        label: LabelIndex,
    ) -> Result<Annotation> {
        self.take_failure()
            .with_context(|| format!("create mask for class {class_id:?}"))?;
        let annotation = Annotation {
            id: AnnotationId::new(),
            class_id,
            view,
            data: AnnotationData::Mask(MaskData {
                raster_id: Some(raster.id()),
                bounding_box: Some(bounding_box),
            }),
        };
        tracing::debug!(
            annotation = %annotation.id,
            label,
            ?bounding_box,
            "stored mask annotation"
        );
        self.annotations.push(annotation.clone());
        self.operations.push(StoreOperation::Created(annotation.id));
        Ok(annotation)
    }

    async fn update_annotation(&mut self, annotation: &Annotation) -> Result<()> {
        self.take_failure()
            .with_context(|| format!("update annotation {}", annotation.id))?;
        let stored = self
            .annotations
            .iter_mut()
            .find(|stored| stored.id == annotation.id)
            .ok_or_else(|| anyhow!("annotation {} does not exist", annotation.id))?;
        *stored = annotation.clone();
        self.operations.push(StoreOperation::Updated(annotation.id));
        Ok(())
    }

    async fn delete_annotation(&mut self, annotation: AnnotationId) -> Result<()> {
        self.take_failure()
            .with_context(|| format!("delete annotation {annotation}"))?;
        let before = self.annotations.len();
        self.annotations.retain(|stored| stored.id != annotation);
        if self.annotations.len() == before {
            bail!("annotation {annotation} does not exist");
        }
        self.operations.push(StoreOperation::Deleted(annotation));
        Ok(())
    }
}
