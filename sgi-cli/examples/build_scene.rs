/// Example: build a small scene through the editor API and print it
///
/// Usage: cargo run --example build_scene > scene.obj
use anyhow::Result;
use nalgebra::Vector3;
use sgi_core::{CurveMode, Editor, Point2D, Point3D, Rotation3D, RotationAxis, RotationReference};

fn main() -> Result<()> {
    let mut editor = Editor::default();

    editor.add_point(Point2D::new(0.0, 0.0))?;
    editor.add_line(Point2D::new(-80.0, -80.0), Point2D::new(80.0, 80.0))?;
    editor.add_wireframe(
        vec![Point2D::new(-40.0, 20.0), Point2D::new(-10.0, 60.0), Point2D::new(-60.0, 50.0)],
        true,
    )?;

    editor.set_curve_mode(CurveMode::BSpline);
    editor.add_curve(vec![
        Point2D::new(-90.0, -20.0),
        Point2D::new(-50.0, 30.0),
        Point2D::new(0.0, -30.0),
        Point2D::new(50.0, 30.0),
        Point2D::new(90.0, -20.0),
    ])?;

    let cube = Some(editor.add_cube(Point3D::new(0.0, 0.0, 100.0), 40.0)?);
    let tilt = Rotation3D::new(RotationReference::ObjectCentroid, RotationAxis::Y, 30.0);
    editor.rotate(cube, &tilt)?;
    editor.translate(cube, Vector3::new(20.0, 0.0, 0.0))?;

    editor.resize(800.0, 600.0);
    eprintln!("{} draw items", editor.draw_list().len());
    print!("{}", editor.save_scene());
    Ok(())
}
