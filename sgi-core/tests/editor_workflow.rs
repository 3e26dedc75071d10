use approx::assert_relative_eq;
use nalgebra::Vector3;
use sgi_core::{
    Color, CurveMode, DrawItem, Editor, EditorConfig, LineClipper, ObjectKind, Point2D, Point3D, Primitive2D,
    ProjectionMode, Rotation3D, RotationAxis, RotationReference, SceneObject, SgiError,
};

fn patch(offset: f64) -> [[Point3D; 4]; 4] {
    std::array::from_fn(|i| {
        std::array::from_fn(|j| Point3D::new(offset + i as f64 * 10.0, j as f64 * 10.0, ((i + j) % 2) as f64 * 5.0))
    })
}

fn grid(rows: usize, cols: usize) -> Vec<Vec<Point3D>> {
    (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| Point3D::new(i as f64 * 8.0, j as f64 * 8.0, (i as f64 - j as f64).abs()))
                .collect()
        })
        .collect()
}

fn populated() -> Editor {
    let mut editor = Editor::default();
    editor.add_point(Point2D::new(5.0, 5.0)).unwrap();
    editor
        .add_line(Point2D::new(-10.0, 0.0), Point2D::new(10.0, 20.0))
        .unwrap();
    editor
        .add_wireframe(
            vec![Point2D::new(0.0, 0.0), Point2D::new(30.0, 0.0), Point2D::new(15.0, 25.0)],
            true,
        )
        .unwrap();
    editor
        .add_curve(vec![
            Point2D::new(-50.0, 0.0),
            Point2D::new(-40.0, 30.0),
            Point2D::new(-20.0, 30.0),
            Point2D::new(-10.0, 0.0),
        ])
        .unwrap();
    editor.add_cube(Point3D::new(0.0, 0.0, 50.0), 20.0).unwrap();
    editor.add_bezier_surface(&[patch(0.0), patch(30.0)]).unwrap();
    editor.add_bspline_surface(grid(4, 4)).unwrap();
    editor
}

#[test]
fn created_objects_are_listed_in_order() {
    let editor = populated();
    let listing: Vec<(String, ObjectKind)> = editor.listing().into_iter().map(|s| (s.name, s.kind)).collect();
    assert_eq!(
        listing,
        [
            ("Point_1".to_string(), ObjectKind::Flat(Primitive2D::Point)),
            ("Line_2".to_string(), ObjectKind::Flat(Primitive2D::Line)),
            ("Wireframe_3".to_string(), ObjectKind::Flat(Primitive2D::Wireframe)),
            ("Curve_4".to_string(), ObjectKind::Flat(Primitive2D::Curve)),
            ("Object3D_5".to_string(), ObjectKind::Object3D),
            ("BezierSurface_6".to_string(), ObjectKind::BezierSurface),
            ("BSplineSurface_7".to_string(), ObjectKind::BSplineSurface),
        ]
    );
}

#[test]
fn save_load_save_is_idempotent() {
    let built = populated();
    let first = built.save_scene();

    let mut reloaded = Editor::default();
    let skipped = reloaded.load_scene(&first);
    assert!(skipped.is_empty(), "{skipped:?}");
    assert_eq!(reloaded.listing(), built.listing());
    assert_eq!(reloaded.save_scene(), first);

    for (index, (before, after)) in built.display().iter().zip(reloaded.display()).enumerate() {
        match (before, after) {
            (SceneObject::Flat(a), SceneObject::Flat(b)) => {
                assert_eq!(a.primitive(), b.primitive());
                for (p, q) in a.coordinates().iter().zip(b.coordinates()) {
                    assert_relative_eq!(*p, *q, epsilon = 1e-9);
                }
            }
            _ => {
                let a = built.centroid(Some(index)).unwrap();
                let b = reloaded.centroid(Some(index)).unwrap();
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn scene_files_round_trip_on_disk() {
    let path = std::env::temp_dir().join(format!("sgi-editor-{}.obj", std::process::id()));
    let built = populated();
    built.save_file(&path).unwrap();

    let mut reloaded = Editor::default();
    let skipped = reloaded.load_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(skipped.is_empty());
    assert_eq!(reloaded.display().len(), built.display().len());
}

#[test]
fn loading_appends_to_the_scene() {
    let mut editor = populated();
    let skipped = editor.load_scene("o Extra\nv 0 0\nv 1 1\nl 1 2\nl 1 9\n");
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].line, 5);
    assert_eq!(editor.display().len(), 8);
    assert_eq!(editor.listing()[7].name, "Extra");
}

#[test]
fn edits_require_a_selection() {
    let mut editor = populated();
    let count = editor.display().len();
    assert!(matches!(editor.delete(None), Err(SgiError::NoSelection)));
    assert!(matches!(editor.recolor(None, Color::WHITE), Err(SgiError::NoSelection)));
    assert!(matches!(
        editor.scale(None, Vector3::new(2.0, 2.0, 2.0), None),
        Err(SgiError::NoSelection)
    ));
    assert_eq!(editor.display().len(), count);

    let removed = editor.delete(Some(0)).unwrap();
    assert_eq!(removed.name(), "Point_1");
    assert_eq!(editor.listing()[0].name, "Line_2");
}

#[test]
fn surfaces_transform_through_their_arena() {
    let mut editor = populated();
    let surface = Some(6);
    let before = editor.centroid(surface).unwrap();
    editor.translate(surface, Vector3::new(0.0, 0.0, -10.0)).unwrap();
    editor
        .scale(surface, Vector3::new(2.0, 2.0, 2.0), None)
        .unwrap();
    let turn = Rotation3D::new(
        RotationReference::ObjectCentroid,
        RotationAxis::Direction(Vector3::new(1.0, 1.0, 0.0)),
        45.0,
    );
    editor.rotate(surface, &turn).unwrap();
    assert_relative_eq!(
        editor.centroid(surface).unwrap(),
        before + Vector3::new(0.0, 0.0, -10.0),
        epsilon = 1e-9
    );

    let zero_axis = Rotation3D::new(RotationReference::World, RotationAxis::Direction(Vector3::zeros()), 10.0);
    assert!(matches!(editor.rotate(surface, &zero_axis), Err(SgiError::InvalidAxis)));
}

#[test]
fn bspline_grids_are_validated() {
    let mut editor = Editor::default();
    assert!(matches!(
        editor.add_bspline_surface(grid(3, 6)),
        Err(SgiError::InvalidGrid { rows: 3, cols: 6, .. })
    ));
    assert!(matches!(
        editor.add_bspline_surface(grid(21, 4)),
        Err(SgiError::InvalidGrid { .. })
    ));
    assert!(editor.add_bspline_surface(grid(6, 5)).is_ok());
    assert!(editor.display().len() == 1);
}

#[test]
fn draw_list_follows_view_settings() {
    let mut editor = Editor::new(EditorConfig::default()).unwrap();
    editor.resize(450.0, 440.0);
    editor
        .add_line(Point2D::new(-150.0, 0.0), Point2D::new(150.0, 0.0))
        .unwrap();

    for clipper in [LineClipper::CohenSutherland, LineClipper::LiangBarsky] {
        editor.set_clipper(clipper);
        let items = editor.draw_list();
        let DrawItem::Segment { from, to, .. } = items[1] else {
            panic!("expected a segment");
        };
        assert_relative_eq!(from, Point2D::new(10.0, 210.0), epsilon = 1e-9);
        assert_relative_eq!(to, Point2D::new(410.0, 210.0), epsilon = 1e-9);
    }

    // panning the window off the line leaves only the frame
    editor.pan(0.0, 500.0);
    assert_eq!(editor.draw_list().len(), 1);
}

#[test]
fn projection_mode_changes_solid_output() {
    let mut editor = Editor::default();
    editor.resize(450.0, 440.0);
    editor.add_cube(Point3D::new(0.0, 0.0, 0.0), 100.0).unwrap();
    editor.set_projection(ProjectionMode::Parallel);
    let parallel = editor.draw_list();
    editor.set_projection(ProjectionMode::Perspective);
    let perspective = editor.draw_list();
    assert_eq!(parallel.len(), perspective.len());
    assert_ne!(parallel, perspective);
}

#[test]
fn curve_mode_is_captured_at_creation() {
    let mut editor = Editor::default();
    let points = vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(10.0, 10.0),
        Point2D::new(20.0, 0.0),
        Point2D::new(30.0, 10.0),
    ];
    editor.add_curve(points.clone()).unwrap();
    editor.set_curve_mode(CurveMode::BSpline);
    editor.add_curve(points).unwrap();
    let modes: Vec<CurveMode> = editor
        .display()
        .iter()
        .filter_map(|o| match o {
            SceneObject::Flat(flat) => Some(flat.curve_mode()),
            _ => None,
        })
        .collect();
    assert_eq!(modes, [CurveMode::G0, CurveMode::BSpline]);
}
