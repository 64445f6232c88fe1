use super::{count, paint, raster};
use futures::executor::block_on;
use mask_painter::mask::{
    AnnotationStore, BoundingBox, BrushPainter, ClassId, CommitOutcome, MemoryAnnotationStore,
    Point, TipShape,
};

#[test]
fn new_round_stroke_creates_one_mask_with_connecting_band() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    let commit = paint(
        &mut raster,
        &mut store,
        7,
        TipShape::Round,
        false,
        5.0,
        &[(10.0, 10.0), (10.0, 40.0)],
    );

    let CommitOutcome::Created(created) = &commit.outcome else {
        panic!("expected a created mask, got {:?}", commit.outcome);
    };
    let expected = BoundingBox {
        x: 5,
        y: 5,
        width: 10,
        height: 40,
    };
    assert_eq!(commit.bounding_box, Some(expected));
    assert_eq!(created.mask_bounding_box(), Some(expected));
    assert_eq!(store.len(), 1);
    assert!(raster.in_progress_annotation(ClassId(7)).is_none());

    let label = raster.label_index_for_annotation_id(created.id).unwrap();
    for y in 15..35 {
        for x in 5..15 {
            assert_eq!(raster.label_at(x, y), Some(label), "gap at ({x}, {y})");
        }
    }
    assert_eq!(raster.label_at(4, 25), Some(0));
    assert_eq!(raster.label_at(15, 25), Some(0));
}

#[test]
fn eraser_on_fresh_mask_creates_nothing_and_frees_label() {
    let mut raster = raster(32, 32);
    let mut store = MemoryAnnotationStore::new();

    let mut painter =
        BrushPainter::new(&mut raster, &store, ClassId(3), TipShape::Round, true).unwrap();
    let label = painter.label_index();
    assert!(painter.is_new_mask_annotation());
    assert!(raster.annotation_id_for_label(label).is_some());

    painter.stroke(&mut raster, Point::new(8.0, 8.0), 4.0);
    painter.stroke(&mut raster, Point::new(20.0, 8.0), 4.0);
    let commit = block_on(painter.end_stroke(&mut raster, &mut store)).unwrap();

    assert_eq!(commit.outcome, CommitOutcome::Discarded);
    assert!(commit.removed.is_empty());
    assert!(store.is_empty());
    assert!(store.operations().is_empty());
    assert!(raster.in_progress_annotation(ClassId(3)).is_none());
    assert_eq!(raster.annotation_id_for_label(label), None);
    assert_eq!(raster.next_available_label_index().unwrap(), label);
}

#[test]
fn square_brush_covering_foreign_mask_deletes_it() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    let small = paint(
        &mut raster,
        &mut store,
        1,
        TipShape::Round,
        false,
        3.0,
        &[(20.0, 20.0)],
    );
    let CommitOutcome::Created(small) = small.outcome else {
        panic!("first mask was not created");
    };
    let small_label = raster.label_index_for_annotation_id(small.id).unwrap();
    assert!(count(&raster, small_label) > 0);

    let mut painter =
        BrushPainter::new(&mut raster, &store, ClassId(2), TipShape::Square, false).unwrap();
    painter.stroke(&mut raster, Point::new(20.0, 20.0), 20.0);
    assert!(painter.labels_being_overwritten().contains(&small_label));
    let cover_label = painter.label_index();

    let commit = block_on(painter.end_stroke(&mut raster, &mut store)).unwrap();
    assert!(matches!(commit.outcome, CommitOutcome::Created(_)));
    assert_eq!(commit.removed, vec![small.id]);
    assert_eq!(count(&raster, small_label), 0);
    assert_eq!(raster.annotation_id_for_label(small_label), None);
    assert!(store.get(small.id).is_none());
    assert_eq!(store.len(), 1);
    assert!(store
        .find_mask_annotation_for_class(&raster, ClassId(1))
        .is_none());
    assert!(count(&raster, cover_label) > 0);
}

#[test]
fn partially_overwritten_mask_survives() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    let first = paint(
        &mut raster,
        &mut store,
        1,
        TipShape::Round,
        false,
        6.0,
        &[(10.0, 30.0), (40.0, 30.0)],
    );
    let CommitOutcome::Created(first) = first.outcome else {
        panic!("first mask was not created");
    };

    let commit = paint(
        &mut raster,
        &mut store,
        2,
        TipShape::Square,
        false,
        4.0,
        &[(25.0, 30.0)],
    );
    assert!(commit.removed.is_empty());
    assert!(store.get(first.id).is_some());
}
