//! End-to-end behaviour of the jaw hit detector

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use collkit_core::{drift, InteractionTable, InteractionType, LocalParticle, Particle};
use collkit_geometry::{
    first_crossing, hit_jaws_check_and_transform, hit_jaws_transform_back, track_batch,
    track_collimator, BlackAbsorber, CollimatorGeometry, HitOutcome, Jaw, JawCorners, JawSide,
    SkewAngles, Transparent,
};
use proptest::prelude::*;

const EPS: f64 = 1e-12;

fn skewed_tilted() -> CollimatorGeometry {
    CollimatorGeometry::from_jaws(
        1.0,
        JawSide::Both,
        1.0e-3,
        -1.0e-3,
        SkewAngles {
            left: 0.1,
            right: 0.35,
        },
        2.0e-4,
        -1.0e-4,
    )
    .unwrap()
}

fn assert_same_coordinates(actual: &Particle, expected: &Particle) {
    assert_abs_diff_eq!(actual.x, expected.x, epsilon = EPS);
    assert_abs_diff_eq!(actual.px, expected.px, epsilon = EPS);
    assert_abs_diff_eq!(actual.y, expected.y, epsilon = EPS);
    assert_abs_diff_eq!(actual.py, expected.py, epsilon = EPS);
    assert_abs_diff_eq!(actual.s, expected.s, epsilon = EPS);
    assert_abs_diff_eq!(actual.zeta, expected.zeta, epsilon = EPS);
}

/// Run check, optional physics, and transform back; return the outcome.
fn pass<F: FnMut(&mut Particle, Jaw)>(
    p: &mut Particle,
    g: &CollimatorGeometry,
    mut physics: F,
) -> HitOutcome {
    let outcome = hit_jaws_check_and_transform(p, g);
    if let Some(jaw) = outcome.jaw() {
        physics(p, jaw);
    }
    hit_jaws_transform_back(outcome, p, g);
    outcome
}

#[test]
fn test_pure_pass_through() {
    let g = CollimatorGeometry::new(
        1.0,
        JawSide::Both,
        JawCorners::new(2.0e-3, 2.0e-3),
        JawCorners::new(-2.0e-3, -2.0e-3),
        SkewAngles::parallel(0.3),
    )
    .unwrap();
    let start = Particle::new(1)
        .with_x(1.0e-4, 1.0e-4)
        .with_y(2.0e-4, -1.0e-4);

    let mut p = start;
    let outcome = hit_jaws_check_and_transform(&mut p, &g);
    assert_eq!(outcome, HitOutcome::NoHit);

    assert_abs_diff_eq!(p.x, 1.0e-4 + 1.0e-4 * 1.0, epsilon = EPS);
    assert_abs_diff_eq!(p.y, 2.0e-4 - 1.0e-4 * 1.0, epsilon = EPS);
    assert_abs_diff_eq!(p.px, start.px, epsilon = EPS);
    assert_abs_diff_eq!(p.py, start.py, epsilon = EPS);
    assert_abs_diff_eq!(p.s, 1.0, epsilon = EPS);

    // Transform back is a no-op after a miss
    let after_check = p;
    hit_jaws_transform_back(outcome, &mut p, &g);
    assert_eq!(p, after_check);
}

#[test]
fn test_left_hit_at_analytic_distance() {
    let g = CollimatorGeometry::new(
        2.0,
        JawSide::LeftOnly,
        JawCorners::new(1.0e-3, 1.0e-3),
        JawCorners::new(0.0, 0.0),
        SkewAngles::default(),
    )
    .unwrap();
    // x(s) = -2e-4 + 8e-4 s reaches 1e-3 at s = 1.5
    let mut p = Particle::new(0).with_x(-2.0e-4, 8.0e-4);

    let outcome = hit_jaws_check_and_transform(&mut p, &g);
    assert_eq!(outcome, HitOutcome::HitLeft);
    assert_abs_diff_eq!(p.s, 1.5, epsilon = EPS);
    assert_abs_diff_eq!(p.x, 0.0, epsilon = EPS);
    assert_abs_diff_eq!(p.px, 8.0e-4, epsilon = EPS);
}

#[test]
fn test_right_jaw_mirrors_left_jaw() {
    let left = CollimatorGeometry::new(
        1.0,
        JawSide::LeftOnly,
        JawCorners::new(1.0e-3, 1.4e-3),
        JawCorners::new(0.0, 0.0),
        SkewAngles {
            left: 0.25,
            right: 0.0,
        },
    )
    .unwrap();
    let right = CollimatorGeometry::new(
        1.0,
        JawSide::RightOnly,
        JawCorners::new(0.0, 0.0),
        JawCorners::new(-1.0e-3, -1.4e-3),
        SkewAngles {
            left: 0.0,
            right: -0.25,
        },
    )
    .unwrap();

    let mut p_left = Particle::new(0).with_x(0.0, 2.0e-3).with_y(1.0e-4, 1.0e-5);
    let mut p_right = Particle::new(0).with_x(0.0, -2.0e-3).with_y(1.0e-4, 1.0e-5);

    assert_eq!(
        hit_jaws_check_and_transform(&mut p_left, &left),
        HitOutcome::HitLeft
    );
    assert_eq!(
        hit_jaws_check_and_transform(&mut p_right, &right),
        HitOutcome::HitRight
    );

    assert_abs_diff_eq!(p_right.x, p_left.x, epsilon = EPS);
    assert_abs_diff_eq!(p_right.px, p_left.px, epsilon = EPS);
    assert_abs_diff_eq!(p_right.y, p_left.y, epsilon = EPS);
    assert_abs_diff_eq!(p_right.py, p_left.py, epsilon = EPS);
    assert_abs_diff_eq!(p_right.s, p_left.s, epsilon = EPS);
}

#[test]
fn test_round_trip_matches_plain_drift() {
    let g = skewed_tilted();
    let cases = [
        (Particle::new(0).with_x(0.0, 1.0e-4), HitOutcome::NoHit),
        (
            Particle::new(1).with_x(0.0, 3.0e-3).with_y(1.0e-4, 0.0),
            HitOutcome::HitLeft,
        ),
        (
            Particle::new(2).with_x(0.0, -3.0e-3).with_y(-1.0e-4, 2.0e-5),
            HitOutcome::HitRight,
        ),
    ];

    for (start, expected) in cases {
        let mut p = start;
        let outcome = pass(&mut p, &g, |_, _| {});
        assert_eq!(outcome, expected);

        let mut reference = start;
        drift(&mut reference, g.length());
        assert_same_coordinates(&p, &reference);
    }
}

#[test]
fn test_tie_goes_to_left_jaw() {
    let g = CollimatorGeometry::new(
        1.0,
        JawSide::Both,
        JawCorners::new(0.0, 0.0),
        JawCorners::new(0.0, 0.0),
        SkewAngles::default(),
    )
    .unwrap();
    // Both jaws are reached at s = 0
    let mut p = Particle::new(0);
    assert_eq!(
        hit_jaws_check_and_transform(&mut p, &g),
        HitOutcome::HitLeft
    );
    assert_abs_diff_eq!(p.s, 0.0, epsilon = EPS);
}

#[test]
fn test_parallel_fast_path_matches_full_rotation() {
    let fast = CollimatorGeometry::from_jaws(
        1.0,
        JawSide::Both,
        1.0e-3,
        -1.2e-3,
        SkewAngles::parallel(0.3),
        1.0e-4,
        -2.0e-4,
    )
    .unwrap();
    let slow = fast.clone().without_parallel_fast_path();
    assert!(fast.jaws_parallel());
    assert!(!slow.jaws_parallel());

    let starts = [
        Particle::new(0).with_x(0.0, 1.0e-5),
        Particle::new(1).with_x(1.0e-4, 2.5e-3).with_y(3.0e-4, -1.0e-4),
        Particle::new(2).with_x(-1.0e-4, -2.5e-3).with_y(-3.0e-4, 1.0e-4),
        Particle::new(3).with_x(5.0e-3, 0.0),
        Particle::new(4).with_x(-5.0e-3, 0.0),
    ];

    for start in starts {
        let mut a = start;
        let mut b = start;
        let outcome_a = hit_jaws_check_and_transform(&mut a, &fast);
        let outcome_b = hit_jaws_check_and_transform(&mut b, &slow);
        assert_eq!(outcome_a, outcome_b);
        assert_same_coordinates(&a, &b);

        hit_jaws_transform_back(outcome_a, &mut a, &fast);
        hit_jaws_transform_back(outcome_b, &mut b, &slow);
        assert_same_coordinates(&a, &b);
    }
}

#[test]
fn test_lost_particle_stays_at_impact() {
    let g = CollimatorGeometry::from_jaws(
        1.0,
        JawSide::LeftOnly,
        1.0e-3,
        0.0,
        SkewAngles::default(),
        5.0e-4,
        0.0,
    )
    .unwrap();
    let slope = 3.0e-3;
    let s_hit = first_crossing(
        0.0,
        slope,
        &g.face(Jaw::Left),
        g.tilt_left().tan,
        Jaw::Left,
    )
    .unwrap();
    assert!(s_hit > 0.0 && s_hit < g.length());

    let mut lost = Particle::new(0).with_x(0.0, slope);
    let outcome = pass(&mut lost, &g, |p, _| p.absorb());
    assert_eq!(outcome, HitOutcome::HitLeft);
    assert!(!lost.is_alive());
    assert_abs_diff_eq!(lost.s, s_hit, epsilon = EPS);
    assert_abs_diff_eq!(lost.x, slope * s_hit, epsilon = EPS);

    let mut survivor = Particle::new(1).with_x(0.0, slope);
    pass(&mut survivor, &g, |_, _| {});
    assert_abs_diff_eq!(survivor.s, g.length(), epsilon = EPS);
}

#[test]
fn test_touches_are_recorded() {
    let table = Arc::new(InteractionTable::new(16));
    let g = CollimatorGeometry::new(
        1.0,
        JawSide::Both,
        JawCorners::new(1.0e-3, 1.0e-3),
        JawCorners::new(-1.0e-3, -1.0e-3),
        SkewAngles::default(),
    )
    .unwrap()
    .with_record(table.clone());
    assert!(g.is_recording());

    let mut particles = vec![
        Particle::new(10).with_x(0.0, 2.0e-3),
        Particle::new(11).with_x(0.0, -2.0e-3),
        Particle::new(12),
    ];
    let summary = track_batch(&mut particles, &g, &mut BlackAbsorber);
    assert_eq!(summary.hits(), 2);
    assert_eq!(summary.no_hit, 1);

    let records = table.records();
    assert_eq!(records.len(), 4);

    let entered_left = table.records_of(InteractionType::EnterJawLeft);
    assert_eq!(entered_left.len(), 1);
    assert_eq!(entered_left[0].particle.particle_id, 10);
    assert_abs_diff_eq!(entered_left[0].particle.x, 0.0, epsilon = EPS);
    assert_abs_diff_eq!(entered_left[0].particle.s, 0.5, epsilon = EPS);

    let entered_right = table.records_of(InteractionType::EnterJawRight);
    assert_eq!(entered_right.len(), 1);
    assert_eq!(entered_right[0].particle.particle_id, 11);

    assert_eq!(table.records_of(InteractionType::Absorbed).len(), 2);
}

#[test]
fn test_recording_can_be_switched_off() {
    let table = Arc::new(InteractionTable::new(16));
    let g = CollimatorGeometry::new(
        1.0,
        JawSide::Both,
        JawCorners::new(1.0e-3, 1.0e-3),
        JawCorners::new(-1.0e-3, -1.0e-3),
        SkewAngles::default(),
    )
    .unwrap()
    .with_record(table.clone())
    .record_touches(false);

    let mut p = Particle::new(0).with_x(0.0, 2.0e-3);
    track_collimator(&mut p, &g, &mut BlackAbsorber);
    assert!(table.is_empty());
}

#[test]
fn test_geometry_shared_across_threads() {
    let g = skewed_tilted();
    let results: Vec<HitOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = [3.0e-3, -3.0e-3, 1.0e-5]
            .into_iter()
            .map(|px| {
                let g = &g;
                scope.spawn(move || {
                    let mut p = Particle::new(0).with_x(0.0, px);
                    track_collimator(&mut p, g, &mut Transparent).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(
        results,
        vec![HitOutcome::HitLeft, HitOutcome::HitRight, HitOutcome::NoHit]
    );
}

proptest! {
    #[test]
    fn prop_round_trip_with_transparent_jaws(
        x in -5.0e-4f64..5.0e-4,
        px in -5.0e-3f64..5.0e-3,
        y in -5.0e-4f64..5.0e-4,
        py in -5.0e-3f64..5.0e-3,
    ) {
        let g = skewed_tilted();
        let start = Particle::new(0).with_x(x, px).with_y(y, py);

        let mut p = start;
        let outcome = pass(&mut p, &g, |_, _| {});

        let mut reference = start;
        drift(&mut reference, g.length());

        prop_assert!((p.x - reference.x).abs() < 1e-12, "{:?}: x", outcome);
        prop_assert!((p.px - reference.px).abs() < 1e-12, "{:?}: px", outcome);
        prop_assert!((p.y - reference.y).abs() < 1e-12, "{:?}: y", outcome);
        prop_assert!((p.py - reference.py).abs() < 1e-12, "{:?}: py", outcome);
        prop_assert!((p.s - reference.s).abs() < 1e-12, "{:?}: s", outcome);
        prop_assert!(p.is_alive());
    }

    #[test]
    fn prop_hit_lands_on_jaw_face(
        x in -5.0e-4f64..5.0e-4,
        px in -5.0e-3f64..5.0e-3,
    ) {
        let g = skewed_tilted();
        let mut p = Particle::new(0).with_x(x, px);
        let outcome = hit_jaws_check_and_transform(&mut p, &g);
        if outcome != HitOutcome::NoHit {
            // Jaw frame: face at x = 0, within the face length
            prop_assert!(p.x.abs() < 1e-12);
            prop_assert!(p.s > -1e-12 && p.s <= g.length() + 1e-12);
        }
    }
}
