use super::{Area, Backend, Fill, Stroke, TextStyle};
use crate::coord::{Coord, PanelParams};
use crate::geom::key_table;
use crate::ir::{BuiltPlot, Legend, Panel};
use crate::legend::layer_key;
use crate::plot::Plot;
use crate::scale::Break;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

const MARGIN: f64 = 10.0;
const TITLE_HEIGHT: f64 = 30.0;
const AXIS_TITLE: f64 = 20.0;
const X_TICK_LABELS: f64 = 20.0;
const Y_TICK_LABELS: f64 = 45.0;
const STRIP_HEIGHT: f64 = 18.0;
const PANEL_SPACING: f64 = 8.0;
const LEGEND_WIDTH: f64 = 140.0;
const KEY_SIZE: f64 = 18.0;
const TICK_LENGTH: f64 = 4.0;

const PANEL_BACKGROUND: &str = "#EBEBEB";
const GRID_COLOR: &str = "white";
const AXIS_TEXT: &str = "#4D4D4D";
const STRIP_BACKGROUND: &str = "#D9D9D9";

/// Where each part of the plot ended up, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotLayout {
    pub title: Option<Area>,
    /// `(panel id, panel area)` in panel order.
    pub panels: Vec<(usize, Area)>,
    pub legend: Option<Area>,
}

/// Draw a built plot into `backend`.
pub fn render_plot(
    built: &BuiltPlot,
    plot: &Plot,
    backend: &mut dyn Backend,
    width: f64,
    height: f64,
) -> Result<PlotLayout> {
    let coord = plot.coord_ref();
    let mut region = Area::new(MARGIN, MARGIN, width - MARGIN, height - MARGIN);

    let title = match &built.labels.title {
        Some(text) => {
            let area = Area::new(region.left, region.top, region.right, region.top + TITLE_HEIGHT);
            backend.text(area.center(), text, &TextStyle::plain(16.0))?;
            region.top = area.bottom;
            Some(area)
        }
        None => None,
    };

    let legend = if built.legend.is_empty() {
        None
    } else {
        let area = Area::new(region.right - LEGEND_WIDTH, region.top, region.right, region.bottom);
        region.right = area.left - MARGIN;
        Some(area)
    };

    // Axis titles, swapped when the coordinate system flips
    let (horizontal_title, vertical_title) = if coord.is_flipped() {
        (&built.labels.y, &built.labels.x)
    } else {
        (&built.labels.x, &built.labels.y)
    };
    let bottom_title = Area::new(region.left, region.bottom - AXIS_TITLE, region.right, region.bottom);
    backend.text(bottom_title.center(), horizontal_title, &TextStyle::plain(12.0))?;
    let left_title = Area::new(region.left, region.top, region.left + AXIS_TITLE, region.bottom);
    let mut rotated = TextStyle::plain(12.0);
    rotated.angle = 90.0;
    backend.text(left_title.center(), vertical_title, &rotated)?;

    let grid = Area::new(
        region.left + AXIS_TITLE + Y_TICK_LABELS,
        region.top,
        region.right,
        region.bottom - AXIS_TITLE - X_TICK_LABELS,
    );
    let (nrow, ncol) = (built.layout.nrow.max(1) as f64, built.layout.ncol.max(1) as f64);
    let cell_w = (grid.width() - PANEL_SPACING * (ncol - 1.0)) / ncol;
    let cell_h = (grid.height() - PANEL_SPACING * (nrow - 1.0)) / nrow;
    let last_row_by_col = |col: usize| {
        built
            .panels
            .iter()
            .filter(|p| p.col == col)
            .map(|p| p.row)
            .max()
            .unwrap_or(0)
    };

    let mut panels = Vec::with_capacity(built.panels.len());
    for panel in &built.panels {
        let left = grid.left + (panel.col - 1) as f64 * (cell_w + PANEL_SPACING);
        let top = grid.top + (panel.row - 1) as f64 * (cell_h + PANEL_SPACING);
        let mut area = Area::new(left, top, left + cell_w, top + cell_h);
        if let Some(label) = panel.strip_label() {
            let strip = Area::new(area.left, area.top, area.right, area.top + STRIP_HEIGHT);
            backend.rect(strip, Some(&solid_fill(STRIP_BACKGROUND)), None)?;
            backend.text(strip.center(), &label, &TextStyle::plain(10.0))?;
            area.top = strip.bottom;
        }
        let params = PanelParams {
            x_range: panel.x_range,
            y_range: panel.y_range,
            area,
        };
        draw_panel(built, plot, panel, &params, backend)
            .with_context(|| format!("Failed to draw panel {}", panel.id))?;

        let x_labels = panel.row == last_row_by_col(panel.col);
        let y_labels = panel.col == 1;
        draw_axes(coord, panel, &params, backend, x_labels, y_labels)?;
        panels.push((panel.id, area));
    }

    if let Some(area) = legend {
        draw_legend(&built.legend, plot, area, backend).context("Failed to draw legend")?;
    }
    debug!(panels = panels.len(), legend = legend.is_some(), "plot rendered");
    Ok(PlotLayout { title, panels, legend })
}

fn solid_fill(color: &str) -> Fill {
    Fill {
        color: color.to_string(),
        alpha: 1.0,
    }
}

fn break_positions(breaks: &[Break]) -> impl Iterator<Item = (f64, &str)> {
    breaks
        .iter()
        .filter_map(|b| b.mapped.as_f64().map(|v| (v, b.label.as_str())))
}

/// Background, grid lines, then every draw record of the panel.
fn draw_panel(
    built: &BuiltPlot,
    plot: &Plot,
    panel: &Panel,
    params: &PanelParams,
    backend: &mut dyn Backend,
) -> Result<()> {
    let coord = plot.coord_ref();
    let area = params.area;
    backend.rect(area, Some(&solid_fill(PANEL_BACKGROUND)), None)?;
    let grid = Stroke::solid(GRID_COLOR, 1.0);
    for (v, _) in break_positions(&panel.x_breaks) {
        let p = coord.map_x(v, params);
        let (from, to) = axis_line(coord, p, area, true);
        backend.segment(from, to, &grid)?;
    }
    for (v, _) in break_positions(&panel.y_breaks) {
        let p = coord.map_y(v, params);
        let (from, to) = axis_line(coord, p, area, false);
        backend.segment(from, to, &grid)?;
    }

    for record in built.records_for(panel.id) {
        let layer = plot
            .layers()
            .get(record.layer)
            .with_context(|| format!("No layer {} in plot", record.layer))?;
        layer
            .geom()
            .draw_group(&record.data, params, coord, backend, &layer.geom_params())
            .with_context(|| format!("geom_{} failed on group {}", layer.geom().name(), record.group))?;
    }
    Ok(())
}

/// Grid line across the panel at pixel `p` of the x (or y) aesthetic axis.
fn axis_line(coord: &dyn Coord, p: f64, area: Area, x_family: bool) -> ((f64, f64), (f64, f64)) {
    let vertical = x_family != coord.is_flipped();
    if vertical {
        ((p, area.top), (p, area.bottom))
    } else {
        ((area.left, p), (area.right, p))
    }
}

fn draw_axes(
    coord: &dyn Coord,
    panel: &Panel,
    params: &PanelParams,
    backend: &mut dyn Backend,
    bottom_labels: bool,
    left_labels: bool,
) -> Result<()> {
    let area = params.area;
    let tick = Stroke::solid(AXIS_TEXT, 1.0);
    let mut label = TextStyle::plain(10.0);
    label.color = AXIS_TEXT.to_string();

    let (horizontal, vertical) = if coord.is_flipped() {
        (&panel.y_breaks, &panel.x_breaks)
    } else {
        (&panel.x_breaks, &panel.y_breaks)
    };
    let to_h = |v: f64| if coord.is_flipped() { coord.map_y(v, params) } else { coord.map_x(v, params) };
    let to_v = |v: f64| if coord.is_flipped() { coord.map_x(v, params) } else { coord.map_y(v, params) };

    for (v, text) in break_positions(horizontal) {
        let x = to_h(v);
        backend.segment((x, area.bottom), (x, area.bottom + TICK_LENGTH), &tick)?;
        if bottom_labels {
            let style = label.clone().aligned(0.5, 1.0);
            backend.text((x, area.bottom + TICK_LENGTH + 2.0), text, &style)?;
        }
    }
    for (v, text) in break_positions(vertical) {
        let y = to_v(v);
        backend.segment((area.left - TICK_LENGTH, y), (area.left, y), &tick)?;
        if left_labels {
            let style = label.clone().aligned(1.0, 0.5);
            backend.text((area.left - TICK_LENGTH - 2.0, y), text, &style)?;
        }
    }
    Ok(())
}

/// Legend blocks stacked top to bottom: a title, then one row per key with
/// the glyph of every contributing layer drawn over the same square.
fn draw_legend(legend: &Legend, plot: &Plot, area: Area, backend: &mut dyn Backend) -> Result<()> {
    let mut y = area.top;
    for block in &legend.blocks {
        let title = TextStyle::plain(12.0).aligned(0.0, 0.5);
        backend.text((area.left, y + KEY_SIZE / 2.0), &block.title, &title)?;
        y += KEY_SIZE + 4.0;
        for key in &block.keys {
            let square = Area::new(area.left, y, area.left + KEY_SIZE, y + KEY_SIZE);
            backend.rect(square, Some(&solid_fill(PANEL_BACKGROUND)), None)?;
            for &index in &block.layers {
                let Some(layer) = plot.layers().get(index) else { continue };
                let values = layer_key(layer, key);
                let table = key_table(&values)?;
                layer
                    .geom()
                    .draw_legend(&table, square, &layer.geom_params(), backend)?;
            }
            let style = TextStyle::plain(10.0).aligned(0.0, 0.5);
            backend.text((square.right + 6.0, y + KEY_SIZE / 2.0), &key.label, &style)?;
            y += KEY_SIZE + 2.0;
        }
        y += MARGIN;
    }
    Ok(())
}
