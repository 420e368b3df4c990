use super::{fill_at, screen_rect, stroke_at, Geom};
use crate::coord::{Coord, PanelParams};
use crate::data::{Column, DataTable, Value};
use crate::error::Result;
use crate::params::Params;
use crate::position::resolution;
use crate::render::{Area, Backend};

/// Rectangles from zero to `y`. Shared by `bar` (counts), `col` (values
/// as given) and `histogram` (binned counts).
#[derive(Debug, Clone, Copy)]
pub struct GeomBar {
    name: &'static str,
    stat: &'static str,
}

impl GeomBar {
    pub fn bar() -> Self {
        GeomBar {
            name: "bar",
            stat: "count",
        }
    }

    pub fn col() -> Self {
        GeomBar {
            name: "col",
            stat: "identity",
        }
    }

    pub fn histogram() -> Self {
        GeomBar {
            name: "histogram",
            stat: "bin",
        }
    }
}

/// Add `xmin`/`xmax` from a width column, a `width` parameter or 90% of the
/// x resolution, and `ymin`/`ymax` spanning zero and `y`.
pub(crate) fn bar_extents(data: DataTable, params: &Params) -> Result<DataTable> {
    let xs = match data.numeric("x") {
        Some(x) => x.to_vec(),
        None => return Ok(data),
    };
    let mut data = data;
    if !(data.has("xmin") && data.has("xmax")) {
        let fallback = params.get_f64("width").unwrap_or_else(|| 0.9 * resolution(&xs));
        let widths: Vec<f64> = match data.numeric("width") {
            Some(w) => w.to_vec(),
            None => vec![fallback; xs.len()],
        };
        let xmin = xs.iter().zip(&widths).map(|(x, w)| x - w / 2.0).collect();
        let xmax = xs.iter().zip(&widths).map(|(x, w)| x + w / 2.0).collect();
        data = data
            .with_column("xmin", Column::Numeric(xmin))?
            .with_column("xmax", Column::Numeric(xmax))?;
    }
    if let Some(ys) = data.numeric("y").map(<[f64]>::to_vec) {
        data = data
            .with_column("ymin", Column::Numeric(ys.iter().map(|y| y.min(0.0)).collect()))?
            .with_column("ymax", Column::Numeric(ys.iter().map(|y| y.max(0.0)).collect()))?;
    }
    Ok(data)
}

pub(crate) fn draw_rects(
    data: &DataTable,
    panel: &PanelParams,
    coord: &dyn Coord,
    backend: &mut dyn Backend,
) -> anyhow::Result<()> {
    let pixels = coord.transform(data, panel)?;
    let cols = ["xmin", "xmax", "ymin", "ymax"].map(|c| pixels.numeric(c));
    let [Some(x0), Some(x1), Some(y0), Some(y1)] = cols else {
        return Ok(());
    };
    for i in 0..pixels.nrow() {
        if ![x0[i], x1[i], y0[i], y1[i]].iter().all(|v| v.is_finite()) {
            continue;
        }
        let area = screen_rect(coord, x0[i], x1[i], y0[i], y1[i]);
        backend.rect(area, fill_at(&pixels, i).as_ref(), stroke_at(&pixels, i).as_ref())?;
    }
    Ok(())
}

pub(crate) fn draw_rect_key(key: &DataTable, area: Area, backend: &mut dyn Backend) -> anyhow::Result<Area> {
    let inner = area.inset(1.0);
    backend.rect(inner, fill_at(key, 0).as_ref(), stroke_at(key, 0).as_ref())?;
    Ok(inner)
}

impl Geom for GeomBar {
    fn name(&self) -> &'static str {
        self.name
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("fill", Value::Str("#595959".into())),
            ("color", Value::Str("NA".into())),
            ("linewidth", Value::Num(0.5)),
            ("linetype", Value::Str("solid".into())),
            ("alpha", Value::Num(1.0)),
        ]
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "fill", "color", "linewidth", "linetype", "alpha"]
    }

    fn default_stat(&self) -> &'static str {
        self.stat
    }

    fn default_position(&self) -> &'static str {
        "stack"
    }

    fn reparameterise(&self, data: DataTable, params: &Params) -> Result<DataTable> {
        bar_extents(data, params)
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        _params: &Params,
    ) -> anyhow::Result<()> {
        draw_rects(data, panel, coord, backend)
    }

    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        _params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area> {
        draw_rect_key(key, area, backend)
    }
}
