use super::{count, paint, raster};
use futures::executor::block_on;
use mask_painter::mask::{
    BrushPainter, ClassId, CommitOutcome, MemoryAnnotationStore, Point, TipShape,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn repeating_a_sample_changes_nothing() {
    let mut once = raster(48, 48);
    let mut twice = raster(48, 48);
    let mut store_once = MemoryAnnotationStore::new();
    let mut store_twice = MemoryAnnotationStore::new();

    for shape in [TipShape::Round, TipShape::Square] {
        paint(&mut once, &mut store_once, 1, shape, false, 6.0, &[(20.0, 20.0)]);
        paint(
            &mut twice,
            &mut store_twice,
            1,
            shape,
            false,
            6.0,
            &[(20.0, 20.0), (20.0, 20.0)],
        );
        assert_eq!(once.pixels(), twice.pixels());
    }
}

#[test]
fn erasing_a_whole_mask_restores_empty_pixels_and_deletes_it() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();
    let stroke = [(15.0, 15.0), (40.0, 30.0)];

    let created = paint(&mut raster, &mut store, 1, TipShape::Round, false, 5.0, &stroke);
    let CommitOutcome::Created(mask) = created.outcome else {
        panic!("mask was not created");
    };

    let erased = paint(&mut raster, &mut store, 1, TipShape::Round, true, 8.0, &stroke);
    assert_eq!(erased.outcome, CommitOutcome::Updated(mask.id));
    assert_eq!(erased.removed, vec![mask.id]);
    assert!(raster.pixels().iter().all(|&px| px == 0));
    assert!(store.is_empty());
    assert_eq!(raster.mapped_labels().count(), 0);
}

#[test]
fn eraser_leaves_other_masks_alone() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    paint(&mut raster, &mut store, 1, TipShape::Round, false, 5.0, &[(20.0, 20.0)]);
    let second = paint(&mut raster, &mut store, 2, TipShape::Round, false, 5.0, &[(26.0, 20.0)]);
    let CommitOutcome::Created(second) = second.outcome else {
        panic!("second mask was not created");
    };
    let second_label = raster.label_index_for_annotation_id(second.id).unwrap();
    let before = count(&raster, second_label);

    paint(&mut raster, &mut store, 1, TipShape::Square, true, 30.0, &[(20.0, 20.0)]);
    assert_eq!(count(&raster, second_label), before);
    assert_eq!(count(&raster, 1), 0);
    assert!(store.get(second.id).is_some());
}

#[test]
fn edit_range_only_grows_and_covers_every_touched_range() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut raster = raster(96, 72);
    let store = MemoryAnnotationStore::new();

    for (shape, is_eraser) in [
        (TipShape::Round, false),
        (TipShape::Square, false),
        (TipShape::Round, true),
    ] {
        let mut painter =
            BrushPainter::new(&mut raster, &store, ClassId(1), shape, is_eraser).unwrap();
        let mut previous = painter.edit_range();
        for _ in 0..64 {
            let point = Point::new(rng.gen_range(-20.0..116.0), rng.gen_range(-20.0..92.0));
            let radius = rng.gen_range(0.5..12.0);
            let touched = painter.stroke(&mut raster, point, radius);
            let range = painter.edit_range();
            assert!(range.contains(&touched), "{range:?} misses {touched:?}");
            assert!(range.contains(&previous), "{range:?} shrank from {previous:?}");
            previous = range;
        }
    }
}

#[test]
fn labels_are_recycled_after_a_mask_is_removed() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    let first = paint(&mut raster, &mut store, 1, TipShape::Round, false, 4.0, &[(10.0, 10.0)]);
    paint(&mut raster, &mut store, 2, TipShape::Round, false, 4.0, &[(40.0, 40.0)]);
    let CommitOutcome::Created(first) = first.outcome else {
        panic!("first mask was not created");
    };
    assert_eq!(raster.label_index_for_annotation_id(first.id), Some(1));

    store.remove_mask(&mut raster, first.id).unwrap();
    assert_eq!(count(&raster, 1), 0);
    assert_eq!(raster.next_available_label_index().unwrap(), 1);

    let third = paint(&mut raster, &mut store, 3, TipShape::Square, false, 4.0, &[(10.0, 40.0)]);
    let CommitOutcome::Created(third) = third.outcome else {
        panic!("third mask was not created");
    };
    assert_eq!(raster.label_index_for_annotation_id(third.id), Some(1));
}

#[test]
fn fast_round_strokes_leave_no_gaps() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    paint(
        &mut raster,
        &mut store,
        1,
        TipShape::Round,
        false,
        4.0,
        &[(10.0, 30.0), (50.0, 30.0)],
    );
    for y in 27..=32 {
        for x in 10..=49 {
            assert_eq!(raster.label_at(x, y), Some(1), "gap at ({x}, {y})");
        }
    }

    paint(
        &mut raster,
        &mut store,
        2,
        TipShape::Round,
        false,
        4.0,
        &[(10.0, 5.0), (20.0, 15.0)],
    );
    for i in 10..=20 {
        assert_eq!(raster.label_at(i, i - 5), Some(2), "gap at ({i}, {})", i - 5);
    }
    for i in 12..=18 {
        assert_eq!(raster.label_at(i + 2, i - 7), Some(2));
        assert_eq!(raster.label_at(i - 2, i - 3), Some(2));
    }
}

#[test]
fn fast_square_strokes_leave_no_gaps() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    let commit = paint(
        &mut raster,
        &mut store,
        1,
        TipShape::Square,
        false,
        6.0,
        &[(10.0, 30.0), (50.0, 30.0)],
    );
    assert!(matches!(commit.outcome, CommitOutcome::Created(_)));
    for y in 26..=33 {
        for x in 10..=49 {
            assert_eq!(raster.label_at(x, y), Some(1), "gap at ({x}, {y})");
        }
    }
    assert_eq!(raster.label_at(30, 24), Some(0));
    assert_eq!(raster.label_at(30, 35), Some(0));
}

#[test]
fn vertical_square_strokes_leave_no_gaps() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    paint(
        &mut raster,
        &mut store,
        1,
        TipShape::Square,
        false,
        6.0,
        &[(30.0, 10.0), (30.0, 50.0)],
    );
    for y in 6..=53 {
        for x in 26..=33 {
            assert_eq!(raster.label_at(x, y), Some(1), "gap at ({x}, {y})");
        }
        assert_eq!(raster.label_at(25, y), Some(0));
        assert_eq!(raster.label_at(34, y), Some(0));
    }
}

#[test]
fn diagonal_square_strokes_leave_no_gaps() {
    let mut raster = raster(64, 64);
    let mut store = MemoryAnnotationStore::new();

    paint(
        &mut raster,
        &mut store,
        1,
        TipShape::Square,
        false,
        6.0,
        &[(10.0, 10.0), (40.0, 40.0)],
    );
    for i in 10..=40 {
        assert_eq!(raster.label_at(i, i), Some(1), "gap at ({i}, {i})");
    }
    for i in 12..=38 {
        assert_eq!(raster.label_at(i + 2, i - 2), Some(1), "gap at ({}, {})", i + 2, i - 2);
        assert_eq!(raster.label_at(i - 2, i + 2), Some(1), "gap at ({}, {})", i - 2, i + 2);
    }
    assert_eq!(raster.label_at(30, 10), Some(0));
    assert_eq!(raster.label_at(10, 30), Some(0));
}

#[test]
fn painter_can_be_dropped_after_committing_nothing() {
    let mut raster = raster(16, 16);
    let mut store = MemoryAnnotationStore::new();
    let painter =
        BrushPainter::new(&mut raster, &store, ClassId(9), TipShape::Round, false).unwrap();
    let commit = block_on(painter.end_stroke(&mut raster, &mut store)).unwrap();
    assert_eq!(commit.outcome, CommitOutcome::Discarded);
    assert_eq!(commit.bounding_box, None);
    assert!(raster.in_progress_annotation(ClassId(9)).is_none());
}
