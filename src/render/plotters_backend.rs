use super::{render_plot, Area, Backend, Fill, Marker, Stroke, TextStyle};
use crate::ir::BuiltPlot;
use crate::palette::parse_color;
use crate::plot::Plot;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, Cross, PathElement, Polygon, Rectangle, Text, TriangleMarker};
use plotters::prelude::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color, FontTransform, IntoFont, RGBAColor, RGBColor, ShapeStyle, WHITE};
use tracing::warn;

/// Output format of [`PlottersTarget::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlottersTarget {
    Png,
    Svg,
}

impl PlottersTarget {
    /// Render a built plot to encoded bytes: a PNG file or UTF-8 SVG text.
    pub fn render(self, built: &BuiltPlot, plot: &Plot, width: u32, height: u32) -> Result<Vec<u8>> {
        match self {
            PlottersTarget::Png => {
                let mut buffer = vec![0u8; width as usize * height as usize * 3];
                {
                    let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                    let mut backend = PlottersBackend::new(root)?;
                    render_plot(built, plot, &mut backend, width as f64, height as f64)?;
                    backend.present()?;
                }
                let mut png_bytes = Vec::new();
                {
                    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
                    encoder
                        .write_image(&buffer, width, height, image::ColorType::Rgb8)
                        .context("Failed to encode PNG")?;
                }
                Ok(png_bytes)
            }
            PlottersTarget::Svg => {
                let mut svg = String::new();
                {
                    let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                    let mut backend = PlottersBackend::new(root)?;
                    render_plot(built, plot, &mut backend, width as f64, height as f64)?;
                    backend.present()?;
                }
                Ok(svg.into_bytes())
            }
        }
    }
}

/// [`Backend`] drawing onto a plotters drawing area in pixel coordinates.
pub struct PlottersBackend<DB: DrawingBackend> {
    area: DrawingArea<DB, Shift>,
    text_failed: bool,
}

impl<DB> PlottersBackend<DB>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    /// Wrap `area`, clearing it to white.
    pub fn new(area: DrawingArea<DB, Shift>) -> Result<Self> {
        area.fill(&WHITE).context("Failed to fill background")?;
        Ok(PlottersBackend {
            area,
            text_failed: false,
        })
    }

    pub fn present(&self) -> Result<()> {
        self.area.present().context("Failed to present drawing")
    }

    fn stroke_paths(&self, points: &[(f64, f64)], stroke: &Stroke) -> Result<()> {
        let Some(style) = stroke_style(stroke) else {
            return Ok(());
        };
        let paths = match dash_pattern(&stroke.linetype) {
            Some(pattern) => dashed(points, pattern, stroke.width.max(1.0)),
            None => vec![points.to_vec()],
        };
        for path in paths {
            self.area
                .draw(&PathElement::new(pixels(&path), style))
                .context("Failed to draw path")?;
        }
        Ok(())
    }
}

impl<DB> Backend for PlottersBackend<DB>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    fn points(&mut self, points: &[(f64, f64)], marker: &Marker) -> Result<()> {
        let radius = marker.size.max(1.0);
        let r = radius.round() as i32;
        let fill = marker.fill.as_ref().and_then(|f| rgba(&f.color, f.alpha));
        let outline = stroke_style(&marker.stroke);
        // Solid shapes use the stroke colour unless a separate fill is given
        let solid = fill.or_else(|| rgba(&marker.stroke.color, marker.stroke.alpha));

        for &(x, y) in points {
            let at = pixel((x, y));
            match marker.shape.as_str() {
                "square" => {
                    let corners = [(at.0 - r, at.1 - r), (at.0 + r, at.1 + r)];
                    if let Some(c) = solid {
                        self.area
                            .draw(&Rectangle::new(corners, c.filled()))
                            .context("Failed to draw marker")?;
                    }
                    if let (Some(_), Some(s)) = (fill, outline) {
                        self.area
                            .draw(&Rectangle::new(corners, s))
                            .context("Failed to draw marker")?;
                    }
                }
                "triangle" => {
                    if let Some(c) = solid {
                        self.area
                            .draw(&TriangleMarker::new(at, r, c.filled()))
                            .context("Failed to draw marker")?;
                    }
                }
                "diamond" => {
                    let corners = vec![(at.0, at.1 - r), (at.0 + r, at.1), (at.0, at.1 + r), (at.0 - r, at.1)];
                    if let Some(c) = solid {
                        self.area
                            .draw(&Polygon::new(corners.clone(), c.filled()))
                            .context("Failed to draw marker")?;
                    }
                    if let (Some(_), Some(s)) = (fill, outline) {
                        let mut ring = corners;
                        ring.push(ring[0]);
                        self.area
                            .draw(&PathElement::new(ring, s))
                            .context("Failed to draw marker")?;
                    }
                }
                "cross" | "star" => {
                    if let Some(s) = outline {
                        self.area
                            .draw(&Cross::new(at, r, s))
                            .context("Failed to draw marker")?;
                    }
                    if marker.shape == "star" {
                        self.stroke_paths(&[(x - radius, y), (x + radius, y)], &marker.stroke)?;
                        self.stroke_paths(&[(x, y - radius), (x, y + radius)], &marker.stroke)?;
                    }
                }
                _ => {
                    if let Some(c) = solid {
                        self.area
                            .draw(&Circle::new(at, r, c.filled()))
                            .context("Failed to draw marker")?;
                    }
                    if let (Some(_), Some(s)) = (fill, outline) {
                        self.area
                            .draw(&Circle::new(at, r, s))
                            .context("Failed to draw marker")?;
                    }
                }
            }
        }
        Ok(())
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) -> Result<()> {
        if points.len() < 2 {
            return Ok(());
        }
        self.stroke_paths(points, stroke)
    }

    fn polygon(&mut self, points: &[(f64, f64)], fill: &Fill, stroke: Option<&Stroke>) -> Result<()> {
        if points.len() < 3 {
            return Ok(());
        }
        if let Some(c) = rgba(&fill.color, fill.alpha) {
            self.area
                .draw(&Polygon::new(pixels(points), c.filled()))
                .context("Failed to draw polygon")?;
        }
        if let Some(stroke) = stroke {
            let mut ring = points.to_vec();
            ring.push(points[0]);
            self.stroke_paths(&ring, stroke)?;
        }
        Ok(())
    }

    fn rect(&mut self, area: Area, fill: Option<&Fill>, stroke: Option<&Stroke>) -> Result<()> {
        let corners = [pixel((area.left, area.top)), pixel((area.right, area.bottom))];
        if let Some(c) = fill.and_then(|f| rgba(&f.color, f.alpha)) {
            self.area
                .draw(&Rectangle::new(corners, c.filled()))
                .context("Failed to draw rectangle")?;
        }
        if let Some(stroke) = stroke {
            let ring = [
                (area.left, area.top),
                (area.right, area.top),
                (area.right, area.bottom),
                (area.left, area.bottom),
                (area.left, area.top),
            ];
            self.stroke_paths(&ring, stroke)?;
        }
        Ok(())
    }

    fn text(&mut self, at: (f64, f64), text: &str, style: &TextStyle) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let Some(color) = rgba(&style.color, style.alpha) else {
            return Ok(());
        };
        let font = ("sans-serif", style.size).into_font().transform(rotation(style.angle));
        let text_style = font.color(&color).pos(anchor(style.hjust, style.vjust));
        // Missing system fonts should not lose the rest of the picture
        if let Err(e) = self.area.draw(&Text::new(text.to_string(), pixel(at), text_style)) {
            if !self.text_failed {
                warn!(error = %e, "text could not be drawn, labels omitted");
                self.text_failed = true;
            }
        }
        Ok(())
    }
}

fn rgba(color: &str, alpha: f64) -> Option<RGBAColor> {
    let (r, g, b) = parse_color(color)?;
    Some(RGBColor(r, g, b).mix(alpha.clamp(0.0, 1.0)))
}

fn stroke_style(stroke: &Stroke) -> Option<ShapeStyle> {
    let width = stroke.width.round().max(1.0) as u32;
    rgba(&stroke.color, stroke.alpha).map(|c| c.stroke_width(width))
}

fn pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn pixels(points: &[(f64, f64)]) -> Vec<(i32, i32)> {
    points.iter().copied().map(pixel).collect()
}

fn rotation(angle: f64) -> FontTransform {
    match (angle.rem_euclid(360.0) / 90.0).round() as i32 {
        1 => FontTransform::Rotate270,
        2 => FontTransform::Rotate180,
        3 => FontTransform::Rotate90,
        _ => FontTransform::None,
    }
}

fn anchor(hjust: f64, vjust: f64) -> Pos {
    let h = if hjust < 0.25 {
        HPos::Left
    } else if hjust > 0.75 {
        HPos::Right
    } else {
        HPos::Center
    };
    let v = if vjust < 0.25 {
        VPos::Bottom
    } else if vjust > 0.75 {
        VPos::Top
    } else {
        VPos::Center
    };
    Pos::new(h, v)
}

/// On/off run lengths of a line type, in multiples of the line width.
fn dash_pattern(linetype: &str) -> Option<&'static [f64]> {
    const DASHED: &[f64] = &[4.0, 4.0];
    const DOTTED: &[f64] = &[1.0, 3.0];
    const DOTDASH: &[f64] = &[1.0, 3.0, 4.0, 3.0];
    const LONGDASH: &[f64] = &[8.0, 4.0];
    const TWODASH: &[f64] = &[2.0, 2.0, 6.0, 2.0];
    match linetype {
        "dashed" => Some(DASHED),
        "dotted" => Some(DOTTED),
        "dotdash" => Some(DOTDASH),
        "longdash" => Some(LONGDASH),
        "twodash" => Some(TWODASH),
        _ => None,
    }
}

/// Split a polyline into the visible dashes of `pattern`.
fn dashed(points: &[(f64, f64)], pattern: &[f64], scale: f64) -> Vec<Vec<(f64, f64)>> {
    let runs: Vec<f64> = pattern.iter().map(|r| (r * scale).max(1.0)).collect();
    let mut dashes = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut run = 0;
    let mut left = runs[0];

    for pair in points.windows(2) {
        let (mut from, to) = (pair[0], pair[1]);
        let mut length = ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt();
        while length > 0.0 {
            let on = run % 2 == 0;
            if on && current.is_empty() {
                current.push(from);
            }
            let step = left.min(length);
            let t = step / length;
            let next = (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
            if on {
                current.push(next);
            }
            left -= step;
            length -= step;
            from = next;
            if left <= 0.0 {
                if on {
                    dashes.push(std::mem::take(&mut current));
                }
                run = (run + 1) % runs.len();
                left = runs[run];
            }
        }
    }
    if current.len() > 1 {
        dashes.push(current);
    }
    dashes
}
