//! Drawing backends and plot layout.
//!
//! Geoms draw through the [`Backend`] trait in pixel space. The
//! [`RecordingBackend`] keeps every primitive as a [`DrawCommand`];
//! [`PlottersBackend`] rasterises to PNG or writes SVG.

mod layout;
mod plotters_backend;

pub use layout::{render_plot, PlotLayout};
pub use plotters_backend::{PlottersBackend, PlottersTarget};

use anyhow::Result;
use serde::Serialize;

/// Axis-aligned pixel rectangle, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Area {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Area {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Area {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Shrink by `margin` on every side.
    pub fn inset(&self, margin: f64) -> Area {
        Area::new(
            self.left + margin,
            self.top + margin,
            self.right - margin,
            self.bottom - margin,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    pub alpha: f64,
    pub width: f64,
    pub linetype: String,
}

impl Stroke {
    pub fn solid(color: &str, width: f64) -> Self {
        Stroke {
            color: color.to_string(),
            alpha: 1.0,
            width,
            linetype: "solid".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub color: String,
    pub alpha: f64,
}

/// Symbol drawn by point-like geoms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub shape: String,
    /// Radius in pixels.
    pub size: f64,
    pub stroke: Stroke,
    pub fill: Option<Fill>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: String,
    pub alpha: f64,
    /// Font size in pixels.
    pub size: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// 0 = left, 0.5 = centre, 1 = right.
    pub hjust: f64,
    /// 0 = bottom, 0.5 = middle, 1 = top.
    pub vjust: f64,
}

impl TextStyle {
    pub fn plain(size: f64) -> Self {
        TextStyle {
            color: "black".to_string(),
            alpha: 1.0,
            size,
            angle: 0.0,
            hjust: 0.5,
            vjust: 0.5,
        }
    }

    pub fn aligned(mut self, hjust: f64, vjust: f64) -> Self {
        self.hjust = hjust;
        self.vjust = vjust;
        self
    }
}

/// Pixel-space drawing primitives.
pub trait Backend {
    fn points(&mut self, points: &[(f64, f64)], marker: &Marker) -> Result<()>;

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) -> Result<()>;

    fn polygon(&mut self, points: &[(f64, f64)], fill: &Fill, stroke: Option<&Stroke>) -> Result<()>;

    fn rect(&mut self, area: Area, fill: Option<&Fill>, stroke: Option<&Stroke>) -> Result<()>;

    fn text(&mut self, at: (f64, f64), text: &str, style: &TextStyle) -> Result<()>;

    fn segment(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke) -> Result<()> {
        self.polyline(&[from, to], stroke)
    }
}

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "primitive", rename_all = "snake_case")]
pub enum DrawCommand {
    Points {
        points: Vec<(f64, f64)>,
        marker: Marker,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: Fill,
        stroke: Option<Stroke>,
    },
    Rect {
        area: Area,
        fill: Option<Fill>,
        stroke: Option<Stroke>,
    },
    Text {
        at: (f64, f64),
        text: String,
        style: TextStyle,
    },
    Segment {
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
}

/// Backend that keeps the scene graph instead of drawing it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingBackend {
    pub commands: Vec<DrawCommand>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Backend for RecordingBackend {
    fn points(&mut self, points: &[(f64, f64)], marker: &Marker) -> Result<()> {
        self.commands.push(DrawCommand::Points {
            points: points.to_vec(),
            marker: marker.clone(),
        });
        Ok(())
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) -> Result<()> {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            stroke: stroke.clone(),
        });
        Ok(())
    }

    fn polygon(&mut self, points: &[(f64, f64)], fill: &Fill, stroke: Option<&Stroke>) -> Result<()> {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            fill: fill.clone(),
            stroke: stroke.cloned(),
        });
        Ok(())
    }

    fn rect(&mut self, area: Area, fill: Option<&Fill>, stroke: Option<&Stroke>) -> Result<()> {
        self.commands.push(DrawCommand::Rect {
            area,
            fill: fill.cloned(),
            stroke: stroke.cloned(),
        });
        Ok(())
    }

    fn text(&mut self, at: (f64, f64), text: &str, style: &TextStyle) -> Result<()> {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            style: style.clone(),
        });
        Ok(())
    }

    fn segment(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke) -> Result<()> {
        self.commands.push(DrawCommand::Segment {
            from,
            to,
            stroke: stroke.clone(),
        });
        Ok(())
    }
}
