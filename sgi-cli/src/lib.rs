/// Headless front end for the SGI editor core
///
/// Each command opens a scene into an [`Editor`], runs one query against it
/// and writes plain text to any writer, so the commands are testable without
/// a terminal.
use anyhow::{Context, Result};
use sgi_core::{Editor, EditorConfig, LineClipper, ProjectionMode, SkippedLine};
use std::io::Write;
use std::path::Path;

pub mod report;

/// Parse a `dx,dy` window offset
pub fn parse_pan(text: &str) -> std::result::Result<(f64, f64), String> {
    let (dx, dy) = text
        .split_once(',')
        .ok_or_else(|| format!("expected dx,dy, got {text:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid offset {v:?}"))
    };
    Ok((parse(dx)?, parse(dy)?))
}

/// Canvas and view overrides for `render`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub clipper: Option<LineClipper>,
    pub projection: Option<ProjectionMode>,
    /// Window pan applied before drawing
    pub pan: (f64, f64),
    pub zoom: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            clipper: None,
            projection: None,
            pan: (0.0, 0.0),
            zoom: None,
        }
    }
}

/// A scene file opened into a fresh editor
pub struct Session {
    pub editor: Editor,
    pub skipped: Vec<SkippedLine>,
}

impl Session {
    pub fn from_text(config: EditorConfig, text: &str) -> Result<Self> {
        let mut editor = Editor::new(config).context("invalid editor configuration")?;
        let skipped = editor.load_scene(text);
        Ok(Self { editor, skipped })
    }

    pub fn open(config: EditorConfig, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_text(config, &text)
    }

    /// Object listing
    pub fn list<W: Write>(&self, out: &mut W) -> Result<()> {
        report::listing(&self.editor.listing(), out)?;
        Ok(())
    }

    /// Clipped device-space draw list for the requested canvas
    pub fn render<W: Write>(&mut self, options: &RenderOptions, out: &mut W) -> Result<()> {
        let editor = &mut self.editor;
        editor.resize(options.width, options.height);
        if let Some(clipper) = options.clipper {
            editor.set_clipper(clipper);
        }
        if let Some(mode) = options.projection {
            editor.set_projection(mode);
        }
        let (dx, dy) = options.pan;
        editor.pan(dx, dy);
        if let Some(factor) = options.zoom {
            editor.zoom(factor)?;
        }
        report::draw(&editor.draw_list(), out)?;
        Ok(())
    }

    /// Report skipped records; true when the file imported cleanly
    pub fn check<W: Write>(&self, out: &mut W) -> Result<bool> {
        report::skipped(&self.skipped, out)?;
        writeln!(
            out,
            "{} objects, {} skipped lines",
            self.editor.display().len(),
            self.skipped.len()
        )?;
        Ok(self.skipped.is_empty())
    }

    /// The scene re-serialised in canonical form
    pub fn convert(&self) -> String {
        self.editor.save_scene()
    }
}
