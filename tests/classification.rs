// Integration tests for box classification against every surface family,
// including a recursive decomposition driven by the classifier.

use approx::assert_relative_eq;
use quadric_box::{
    BoundingBox, Classifier, Config, Containment, Point, Sense, SplitDirection, SubdivCode,
    Surface, Transformation,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn unit_cube() -> BoundingBox {
    BoundingBox::new(
        Point::zeros(),
        Point::x(),
        Point::y(),
        Point::z(),
        2.0,
        2.0,
        2.0,
    )
    .unwrap()
}

#[test]
fn test_reference_scenario() {
    init_logging();
    let bbox = unit_cube();
    assert_eq!(bbox.dims, [1.0, 1.0, 1.0]);

    let plane = Surface::new_plane(Point::x(), -2.0, 1, None);
    assert_eq!(plane.test_box(&bbox), Sense::Negative);
    assert_eq!(plane.test_box(&bbox).as_i32(), -1);

    let small = Surface::new_sphere(Point::zeros(), 0.5, 2, None);
    assert_eq!(small.test_box(&bbox).as_i32(), 0);

    let large = Surface::new_sphere(Point::zeros(), 10.0, 3, None);
    assert_eq!(large.test_box(&bbox).as_i32(), -1);
}

#[test]
fn test_sphere_round_trip_values() {
    let center = Point::new(1.0, -2.0, 0.5);
    let sphere = Surface::new_sphere(center, 3.0, 1, None);
    assert_relative_eq!(sphere.value(&center), -9.0);
    for direction in [
        Point::new(1.0, 0.0, 0.0),
        Point::new(0.0, -1.0, 0.0),
        Point::new(1.0, 1.0, 1.0).normalize(),
        Point::new(-2.0, 0.5, 3.0).normalize(),
    ] {
        assert_relative_eq!(sphere.value(&(center + direction * 3.0)), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_surface_point_signs() {
    let sphere = Surface::sphere_at_origin(1.0, 1, None);
    let points = [
        Point::zeros(),
        Point::new(2.0, 0.0, 0.0),
        Point::new(0.0, 0.5, 0.5),
        Point::new(0.0, 0.0, -1.5),
    ];
    assert_eq!(sphere.test_points(&points), vec![-1, 1, -1, 1]);
}

#[test]
fn test_mnemonic_surfaces_against_cube() {
    init_logging();
    let bbox = unit_cube();
    let cases: Vec<(&str, Vec<f64>, Sense)> = vec![
        ("PX", vec![2.0], Sense::Negative),
        ("PY", vec![0.0], Sense::Crossing),
        ("P", vec![0.0, 0.0, 1.0, -3.0], Sense::Positive),
        ("SO", vec![0.5], Sense::Crossing),
        ("SO", vec![5.0], Sense::Negative),
        ("S", vec![4.0, 0.0, 0.0, 1.0], Sense::Positive),
        ("SX", vec![1.5, 0.75], Sense::Crossing),
        ("CZ", vec![0.25], Sense::Crossing),
        ("CZ", vec![3.0], Sense::Negative),
        ("C/X", vec![5.0, 5.0, 1.0], Sense::Positive),
        ("KZ", vec![0.0, 1.0], Sense::Crossing),
        ("KZ", vec![2.0, 1.0], Sense::Crossing),
        ("KZ", vec![2.0, 1.0, 1.0], Sense::Positive),
        ("K/Y", vec![5.0, 5.0, 0.0, 0.01], Sense::Positive),
        ("TZ", vec![0.0, 0.0, 0.0, 5.0, 1.0, 1.0], Sense::Positive),
        ("TZ", vec![0.0, 0.0, 0.0, 0.5, 0.25, 0.25], Sense::Crossing),
        ("GQ", vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.25], Sense::Crossing),
        ("SQ", vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, -100.0, 0.0, 0.0, 0.0], Sense::Negative),
        ("Z", vec![-5.0, 0.5, 5.0, 0.5], Sense::Crossing),
    ];
    for (name, (kind, params, expected)) in cases.iter().enumerate() {
        let surface = Surface::from_mnemonic(kind, params, name as u32 + 1, None).unwrap();
        assert_eq!(
            surface.test_box(&bbox),
            *expected,
            "{} {:?} classified wrongly",
            kind,
            params
        );
    }
}

#[test]
fn test_classifier_from_json_config() {
    let path = std::env::temp_dir().join("quadric_box_classifier_config.json");
    std::fs::write(&path, r#"{ "max_evaluations": 500, "sign_tolerance": 1e-12 }"#).unwrap();
    let config = Config::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(config.max_evaluations, 500);

    let classifier = Classifier::new(config);
    let sphere = Surface::sphere_at_origin(0.5, 1, None);
    assert_eq!(classifier.classify(&sphere, &unit_cube()), Sense::Crossing);
    assert_eq!(classifier.config().max_evaluations, 500);
}

#[test]
fn test_transformed_surfaces_against_moved_box() {
    let tr = Transformation::from_euler_angles(0.5, -0.3, 1.2, Point::new(4.0, -1.0, 2.0));
    let bbox = unit_cube();
    let moved = BoundingBox::new(
        tr.apply_point(&bbox.center),
        tr.apply_vector(&bbox.ex),
        tr.apply_vector(&bbox.ey),
        tr.apply_vector(&bbox.ez),
        2.0,
        2.0,
        2.0,
    )
    .unwrap();
    let surfaces = vec![
        Surface::new_plane(Point::new(1.0, 1.0, 0.0), 2.5, 1, None),
        Surface::sphere_at_origin(0.5, 2, None),
        Surface::sphere_at_origin(5.0, 3, None),
        Surface::z_cylinder(3.0, 0.0, 1.0, 4, None),
        Surface::from_mnemonic("KZ", &[2.0, 1.0, 1.0], 5, None).unwrap(),
        Surface::from_mnemonic("GQ", &[1.0, 2.0, 1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, -0.2], 6, None)
            .unwrap(),
    ];
    for surface in surfaces.iter() {
        let expected = surface.test_box(&bbox);
        assert_eq!(surface.transform(&tr).test_box(&moved), expected, "surface {}", surface.name);
    }

    // Moving the sphere alone takes it out of the cube
    let shifted = Surface::sphere_at_origin(0.5, 7, None)
        .transform(&Transformation::from_translation(Point::new(5.0, 0.0, 0.0)));
    assert_eq!(shifted.test_box(&bbox), Sense::Positive);
}

fn decompose(
    classifier: &Classifier,
    surface: &Surface,
    bbox: BoundingBox,
    max_depth: u32,
    resolved: &mut Vec<(BoundingBox, Sense)>,
    unresolved: &mut Vec<BoundingBox>,
) {
    let sense = classifier.classify(surface, &bbox);
    if sense != Sense::Crossing {
        resolved.push((bbox, sense));
    } else if bbox.subdiv.depth() >= max_depth {
        unresolved.push(bbox);
    } else {
        let (low, high) = bbox.split(SplitDirection::Auto, 0.5).unwrap();
        decompose(classifier, surface, low, max_depth, resolved, unresolved);
        decompose(classifier, surface, high, max_depth, resolved, unresolved);
    }
}

#[test]
fn test_recursive_decomposition_of_sphere() {
    init_logging();
    let surface = Surface::new_sphere(Point::new(0.1, 0.2, -0.1), 1.3, 1, None);
    let root = BoundingBox::from_bounds([-2.0, -2.0, -2.0], [2.0, 2.0, 2.0]).unwrap();
    let root_volume = root.volume;
    let classifier: Classifier = Classifier::default();

    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    decompose(&classifier, &surface, root, 6, &mut resolved, &mut unresolved);

    assert!(resolved.iter().any(|(_, s)| *s == Sense::Negative));
    assert!(resolved.iter().any(|(_, s)| *s == Sense::Positive));
    assert!(!unresolved.is_empty());

    let total: f64 = resolved.iter().map(|(b, _)| b.volume).sum::<f64>()
        + unresolved.iter().map(|b| b.volume).sum::<f64>();
    assert_relative_eq!(total, root_volume, max_relative = 1e-12);

    for (bbox, sense) in resolved.iter_mut() {
        assert_eq!(bbox.is_in(SubdivCode::ROOT), Containment::Inside);
        let points = bbox.generate_random_points(25);
        assert!(bbox.test_points(&points).iter().all(|&inside| inside));
        for s in surface.test_points(&points) {
            assert_eq!(s, sense.as_i32(), "box {} holds a point of the wrong sign", bbox.subdiv);
        }
    }
}

#[test]
fn test_recursive_decomposition_of_rotated_cylinder() {
    init_logging();
    let axis = Point::new(1.0, 1.0, 0.5);
    let surface = Surface::new_cylinder(Point::zeros(), axis, 0.6, 7, None);
    let angle = 0.3_f64;
    let (s, c) = angle.sin_cos();
    let root = BoundingBox::new(
        Point::new(0.2, 0.0, 0.0),
        Point::new(c, s, 0.0),
        Point::new(-s, c, 0.0),
        Point::z(),
        3.0,
        2.0,
        2.5,
    )
    .unwrap();
    let classifier: Classifier = Classifier::default();

    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    decompose(&classifier, &surface, root, 5, &mut resolved, &mut unresolved);
    assert!(!resolved.is_empty());

    for (bbox, sense) in resolved.iter_mut() {
        let points = bbox.generate_random_points(25);
        assert!(surface.test_points(&points).iter().all(|&s| s == sense.as_i32()));
    }
}

#[test]
fn test_parallel_classification_matches_serial() {
    let root = BoundingBox::from_bounds([-2.0, -2.0, -2.0], [2.0, 2.0, 2.0]).unwrap();
    let (a, b) = root.split(SplitDirection::X, 0.5).unwrap();
    let (aa, ab) = a.split(SplitDirection::Y, 0.5).unwrap();
    let (ba, bb) = b.split(SplitDirection::Y, 0.5).unwrap();
    let boxes = vec![aa, ab, ba, bb];

    let surfaces = vec![
        Surface::sphere_at_origin(1.0, 1, None),
        Surface::new_plane(Point::new(1.0, 1.0, 0.0), -5.0, 2, None),
        Surface::z_cylinder(1.0, 1.0, 0.5, 3, None),
    ];
    let classifier: Classifier = Classifier::default();
    for surface in surfaces.iter() {
        let parallel = classifier.test_boxes(surface, &boxes);
        let serial: Vec<Sense> = boxes.iter().map(|b| classifier.classify(surface, b)).collect();
        assert_eq!(parallel, serial);
    }
    for bbox in boxes.iter() {
        let parallel = classifier.classify_surfaces(&surfaces, bbox);
        let serial: Vec<Sense> = surfaces.iter().map(|s| s.test_box(bbox)).collect();
        assert_eq!(parallel, serial);
    }
}
