/// Plain-text output of draw lists and object listings
use sgi_core::{DrawItem, ObjectSummary, Point2D, SkippedLine};
use std::io::Write;

fn point(p: &Point2D) -> String {
    format!("{:.2} {:.2}", p.x, p.y)
}

/// One line per draw item, in drawing order
pub fn draw<W: Write>(items: &[DrawItem], writer: &mut W) -> std::io::Result<()> {
    for item in items {
        match item {
            DrawItem::Frame { min, max } => writeln!(writer, "frame {} {}", point(min), point(max))?,
            DrawItem::Dot { at, color } => writeln!(writer, "dot {color} {}", point(at))?,
            DrawItem::Segment { from, to, color } => {
                writeln!(writer, "segment {color} {} {}", point(from), point(to))?
            }
            DrawItem::Polygon { points, stroke, fill } => {
                let fill = fill.map_or_else(|| "-".to_string(), |c| c.to_string());
                write!(writer, "polygon {stroke} {fill}")?;
                for p in points {
                    write!(writer, " {}", point(p))?;
                }
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}

/// `index  name  kind`, one object per line
pub fn listing<W: Write>(objects: &[ObjectSummary], writer: &mut W) -> std::io::Result<()> {
    let width = objects.iter().map(|o| o.name.len()).max().unwrap_or(0);
    for (i, object) in objects.iter().enumerate() {
        writeln!(writer, "{i:>3}  {:<width$}  {}", object.name, object.kind)?;
    }
    Ok(())
}

pub fn skipped<W: Write>(lines: &[SkippedLine], writer: &mut W) -> std::io::Result<()> {
    for line in lines {
        writeln!(writer, "skipped {line}")?;
    }
    Ok(())
}
