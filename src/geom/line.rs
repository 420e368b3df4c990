use super::{fill_at, stroke_at, Geom};
use crate::coord::{Coord, PanelParams};
use crate::data::{DataTable, Value, GROUP, PANEL};
use crate::error::Result;
use crate::params::Params;
use crate::render::{Area, Backend};

/// Connects observations in data order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomPath;

/// Connects observations in order of x.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomLine;

/// Fitted line with its confidence ribbon.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomSmooth;

fn line_defaults(color: &str, linewidth: f64) -> Vec<(&'static str, Value)> {
    vec![
        ("color", Value::Str(color.to_string())),
        ("linewidth", Value::Num(linewidth)),
        ("linetype", Value::Str("solid".into())),
        ("alpha", Value::Num(1.0)),
    ]
}

const LINE_AES: &[&str] = &["x", "y", "color", "linewidth", "linetype", "alpha"];

/// Runs of consecutive finite points; a missing value breaks the line.
fn finite_runs(data: &DataTable, coord: &dyn Coord, x: &str, y: &str) -> Vec<Vec<(f64, f64)>> {
    let (xs, ys) = match (data.numeric(x), data.numeric(y)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Vec::new(),
    };
    let mut runs = vec![Vec::new()];
    for (a, b) in xs.iter().zip(ys) {
        if a.is_finite() && b.is_finite() {
            if let Some(run) = runs.last_mut() {
                run.push(coord.to_screen(*a, *b));
            }
        } else if runs.last().map_or(false, |r| !r.is_empty()) {
            runs.push(Vec::new());
        }
    }
    runs.retain(|r| r.len() > 1);
    runs
}

fn draw_path(
    data: &DataTable,
    panel: &PanelParams,
    coord: &dyn Coord,
    backend: &mut dyn Backend,
) -> anyhow::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let data = coord.transform(data, panel)?;
    let stroke = match stroke_at(&data, 0) {
        Some(s) => s,
        None => return Ok(()),
    };
    for run in finite_runs(&data, coord, "x", "y") {
        backend.polyline(&run, &stroke)?;
    }
    Ok(())
}

fn draw_line_key(key: &DataTable, area: Area, backend: &mut dyn Backend) -> anyhow::Result<()> {
    if let Some(stroke) = stroke_at(key, 0) {
        let (_, cy) = area.center();
        backend.segment((area.left, cy), (area.right, cy), &stroke)?;
    }
    Ok(())
}

/// Sort rows by panel, group and x.
fn sort_by_x(data: DataTable) -> DataTable {
    let key = |name: &str, i: usize| data.column(name).map(|c| c.f64_at(i)).unwrap_or(0.0);
    let mut order: Vec<usize> = (0..data.nrow()).collect();
    order.sort_by(|&a, &b| {
        key(PANEL, a)
            .total_cmp(&key(PANEL, b))
            .then(key(GROUP, a).total_cmp(&key(GROUP, b)))
            .then(key("x", a).total_cmp(&key("x", b)))
    });
    data.take(&order)
}

impl Geom for GeomPath {
    fn name(&self) -> &'static str {
        "path"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        line_defaults("black", 0.5)
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        LINE_AES
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        _params: &Params,
    ) -> anyhow::Result<()> {
        draw_path(data, panel, coord, backend)
    }

    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        _params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area> {
        draw_line_key(key, area, backend)?;
        Ok(area)
    }
}

impl Geom for GeomLine {
    fn name(&self) -> &'static str {
        "line"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        line_defaults("black", 0.5)
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        LINE_AES
    }

    fn setup_data(&self, data: DataTable, _params: &Params) -> Result<DataTable> {
        Ok(sort_by_x(data))
    }

    fn reparameterise(&self, data: DataTable, _params: &Params) -> Result<DataTable> {
        Ok(sort_by_x(data))
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        _params: &Params,
    ) -> anyhow::Result<()> {
        draw_path(data, panel, coord, backend)
    }

    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        _params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area> {
        draw_line_key(key, area, backend)?;
        Ok(area)
    }
}

impl Geom for GeomSmooth {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("color", Value::Str("#3366FF".into())),
            ("fill", Value::Str("#999999".into())),
            ("linewidth", Value::Num(1.0)),
            ("linetype", Value::Str("solid".into())),
            ("alpha", Value::Num(0.4)),
        ]
    }

    fn default_params(&self) -> Params {
        Params::new().with("se", true)
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "color", "fill", "linewidth", "linetype", "alpha"]
    }

    fn default_stat(&self) -> &'static str {
        "smooth"
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        params: &Params,
    ) -> anyhow::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let pixels = coord.transform(data, panel)?;
        let with_ribbon = params.get_bool("se").unwrap_or(true) && pixels.has("ymin") && pixels.has("ymax");
        if with_ribbon {
            if let Some(fill) = fill_at(&pixels, 0) {
                let mut outline: Vec<(f64, f64)> = Vec::new();
                for run in finite_runs(&pixels, coord, "x", "ymax") {
                    outline.extend(run);
                }
                let mut lower: Vec<(f64, f64)> = Vec::new();
                for run in finite_runs(&pixels, coord, "x", "ymin") {
                    lower.extend(run);
                }
                outline.extend(lower.into_iter().rev());
                if outline.len() > 2 {
                    backend.polygon(&outline, &fill, None)?;
                }
            }
        }
        // The ribbon alpha does not apply to the line itself
        if let Some(mut stroke) = stroke_at(&pixels, 0) {
            stroke.alpha = 1.0;
            for run in finite_runs(&pixels, coord, "x", "y") {
                backend.polyline(&run, &stroke)?;
            }
        }
        Ok(())
    }

    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area> {
        if params.get_bool("se").unwrap_or(true) {
            if let Some(fill) = fill_at(key, 0) {
                backend.rect(area, Some(&fill), None)?;
            }
        }
        if let Some(mut stroke) = stroke_at(key, 0) {
            stroke.alpha = 1.0;
            let (_, cy) = area.center();
            backend.segment((area.left, cy), (area.right, cy), &stroke)?;
        }
        Ok(area)
    }
}
